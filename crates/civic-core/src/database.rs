//! The [`Database`] aggregate: the unit of persistence and replication.
//!
//! Every mutation rewrites the whole aggregate and every replication message
//! carries the whole aggregate. There is no per-entity versioning; concurrent
//! writers on two instances overwrite each other at whole-store granularity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  announcement::{Announcement, AnnouncementCategory},
  audit::AuditLogEntry,
  geo::GeoPoint,
  report::DetailedReport,
  sos::SosAlert,
  staff::{DataflowItem, TeamMember},
  user::{Role, User, UserLocation},
};

/// Version written into every blob produced by this crate. Blobs that predate
/// versioning deserialise with version `0`.
pub const SCHEMA_VERSION: u32 = 1;

// ─── Aggregate ───────────────────────────────────────────────────────────────

/// All domain collections. Missing collections deserialise as empty so that
/// older or partial blobs load best-effort without validation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
  #[serde(default)]
  pub schema_version: u32,
  #[serde(default)]
  pub users:          Vec<User>,
  /// Newest first.
  #[serde(default)]
  pub reports:        Vec<DetailedReport>,
  /// Newest first.
  #[serde(default)]
  pub sos:            Vec<SosAlert>,
  #[serde(default)]
  pub announcements:  Vec<Announcement>,
  #[serde(default)]
  pub dataflow:       Vec<DataflowItem>,
  #[serde(default)]
  pub team:           Vec<TeamMember>,
  #[serde(default)]
  pub audit_logs:     Vec<AuditLogEntry>,
}

impl Database {
  /// The store used on a cold start: empty collections, one announcement,
  /// one team member and the official accounts.
  pub fn seeded(now: DateTime<Utc>) -> Self {
    let mut db = Self {
      schema_version: SCHEMA_VERSION,
      announcements: vec![Announcement {
        id:         "ann-welcome".to_owned(),
        title:      "Civic Connect is live".to_owned(),
        content:    "Report civic issues and raise SOS alerts directly to your \
                     municipal operations centre."
          .to_owned(),
        department: "Municipal Corporation".to_owned(),
        timestamp:  now,
        category:   AnnouncementCategory::Informational,
      }],
      team: vec![TeamMember {
        id:         "tm-control-room".to_owned(),
        name:       "Control Room Lead".to_owned(),
        role:       "Duty Officer".to_owned(),
        department: "Emergency Operations".to_owned(),
        status:     "On Duty".to_owned(),
        avatar:     None,
      }],
      ..Self::default()
    };
    db.ensure_official_accounts();
    db
  }

  /// Parse a stored or replicated snapshot.
  pub fn from_json(s: &str) -> crate::Result<Self> { Ok(serde_json::from_str(s)?) }

  pub fn to_json(&self) -> crate::Result<String> { Ok(serde_json::to_string(self)?) }

  /// Upsert the reserved official accounts, keyed by email.
  ///
  /// Returns `true` if any account had to be inserted.
  pub fn ensure_official_accounts(&mut self) -> bool {
    let mut inserted = false;
    for official in official_accounts() {
      if !self.users.iter().any(|u| u.email == official.email) {
        self.users.push(official);
        inserted = true;
      }
    }
    inserted
  }

  pub fn report_mut(&mut self, id: i64) -> Option<&mut DetailedReport> {
    self.reports.iter_mut().find(|r| r.id == id)
  }

  pub fn sos_mut(&mut self, id: i64) -> Option<&mut SosAlert> {
    self.sos.iter_mut().find(|a| a.id == id)
  }
}

// ─── Seed accounts ───────────────────────────────────────────────────────────

/// The two operator accounts guaranteed to exist after every load.
pub fn official_accounts() -> [User; 2] {
  let hq = UserLocation {
    country:     "India".to_owned(),
    state:       "Maharashtra".to_owned(),
    district:    "Pune".to_owned(),
    coordinates: GeoPoint::new(18.5204, 73.8567),
  };
  [
    User {
      name:        "Municipal Commissioner".to_owned(),
      email:       "admin@civicconnect.gov".to_owned(),
      phone:       "1800000001".to_owned(),
      national_id: "GOV-ADMIN-001".to_owned(),
      password:    "admin123".to_owned(),
      avatar:      None,
      role:        Role::Official,
      location:    hq.clone(),
    },
    User {
      name:        "Operations Officer".to_owned(),
      email:       "ops@civicconnect.gov".to_owned(),
      phone:       "1800000002".to_owned(),
      national_id: "GOV-OPS-002".to_owned(),
      password:    "ops123".to_owned(),
      avatar:      None,
      role:        Role::Official,
      location:    hq,
    },
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn seeded_store_shape() {
    let db = Database::seeded(DateTime::<Utc>::UNIX_EPOCH);
    assert_eq!(db.schema_version, SCHEMA_VERSION);
    assert!(db.reports.is_empty());
    assert!(db.sos.is_empty());
    assert_eq!(db.announcements.len(), 1);
    assert_eq!(db.team.len(), 1);
    assert_eq!(db.users.iter().filter(|u| u.role == Role::Official).count(), 2);
  }

  #[test]
  fn official_upsert_is_idempotent() {
    let mut db = Database::default();
    assert!(db.ensure_official_accounts());
    assert!(!db.ensure_official_accounts());
    assert_eq!(db.users.len(), 2);
  }

  #[test]
  fn legacy_blob_without_version_loads() {
    let db = Database::from_json(r#"{"reports":[],"users":[]}"#).unwrap();
    assert_eq!(db.schema_version, 0);
    assert!(db.announcements.is_empty());
  }

  #[test]
  fn collections_use_camel_case_keys() {
    let json = serde_json::to_value(Database::seeded(DateTime::<Utc>::UNIX_EPOCH)).unwrap();
    assert!(json.get("auditLogs").is_some());
    assert!(json.get("schemaVersion").is_some());
  }
}
