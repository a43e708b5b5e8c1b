//! Citizen-submitted civic issue reports.
//!
//! A report's `updates` history is append-only: it is seeded with a single
//! "logged" entry on creation and grows by one entry per status change.
//! Entries are never edited or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

// ─── Enumerations ────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
pub enum ReportStatus {
  #[default]
  #[serde(rename = "Under Review")]
  #[strum(serialize = "Under Review")]
  UnderReview,
  Resolved,
  Emergency,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
pub enum Priority {
  Low,
  #[default]
  Medium,
  High,
  Critical,
}

// ─── History ─────────────────────────────────────────────────────────────────

/// One timestamped entry in a report's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
  pub timestamp: DateTime<Utc>,
  pub message:   String,
  pub by:        String,
}

impl StatusUpdate {
  /// Author recorded on entries the store writes on its own behalf.
  pub const SYSTEM_ACTOR: &'static str = "System";

  /// The entry every report starts with.
  pub fn logged(at: DateTime<Utc>) -> Self {
    Self {
      timestamp: at,
      message:   "Report logged".to_owned(),
      by:        Self::SYSTEM_ACTOR.to_owned(),
    }
  }

  /// The entry appended when `actor` moves a report to `status`.
  pub fn status_changed(at: DateTime<Utc>, status: ReportStatus, actor: &str) -> Self {
    Self {
      timestamp: at,
      message:   format!("Status changed to {status}"),
      by:        actor.to_owned(),
    }
  }
}

// ─── Report ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedReport {
  /// Time-based identifier (milliseconds since the epoch at creation).
  pub id:           i64,
  pub title:        String,
  pub category:     String,
  pub description:  String,
  pub status:       ReportStatus,
  pub coordinates:  GeoPoint,
  /// Free-text location as typed by the citizen.
  pub location:     String,
  #[serde(default)]
  pub image:        Option<String>,
  #[serde(default)]
  pub video:        Option<String>,
  #[serde(default)]
  pub priority:     Priority,
  #[serde(default)]
  pub assigned_to:  Option<String>,
  #[serde(default)]
  pub sla_deadline: Option<DateTime<Utc>>,
  pub reported_by:  String,
  pub created_at:   DateTime<Utc>,
  #[serde(default)]
  pub updates:      Vec<StatusUpdate>,
}

/// Form data for a new report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
  pub title:       String,
  pub category:    String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub coordinates: GeoPoint,
  #[serde(default)]
  pub location:    String,
  #[serde(default)]
  pub image:       Option<String>,
  #[serde(default)]
  pub video:       Option<String>,
  #[serde(default)]
  pub status:      Option<ReportStatus>,
  #[serde(default)]
  pub priority:    Option<Priority>,
}

impl NewReport {
  /// Materialise the report with its seeded history.
  pub fn into_report(self, id: i64, reported_by: &str, now: DateTime<Utc>) -> DetailedReport {
    DetailedReport {
      id,
      title: self.title,
      category: self.category,
      description: self.description,
      status: self.status.unwrap_or_default(),
      coordinates: self.coordinates,
      location: self.location,
      image: self.image,
      video: self.video,
      priority: self.priority.unwrap_or_default(),
      assigned_to: None,
      sla_deadline: None,
      reported_by: reported_by.to_owned(),
      created_at: now,
      updates: vec![StatusUpdate::logged(now)],
    }
  }
}

/// A partial update to a report. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPatch {
  #[serde(default)]
  pub title:        Option<String>,
  #[serde(default)]
  pub category:     Option<String>,
  #[serde(default)]
  pub description:  Option<String>,
  #[serde(default)]
  pub status:       Option<ReportStatus>,
  #[serde(default)]
  pub priority:     Option<Priority>,
  #[serde(default)]
  pub assigned_to:  Option<String>,
  #[serde(default)]
  pub sla_deadline: Option<DateTime<Utc>>,
  #[serde(default)]
  pub location:     Option<String>,
}

impl DetailedReport {
  /// Merge `patch` over this report. A patch carrying a status appends one
  /// history entry attributed to `actor`.
  pub fn apply(&mut self, patch: ReportPatch, actor: &str, now: DateTime<Utc>) {
    if let Some(title) = patch.title {
      self.title = title;
    }
    if let Some(category) = patch.category {
      self.category = category;
    }
    if let Some(description) = patch.description {
      self.description = description;
    }
    if let Some(priority) = patch.priority {
      self.priority = priority;
    }
    if let Some(assigned_to) = patch.assigned_to {
      self.assigned_to = Some(assigned_to);
    }
    if let Some(deadline) = patch.sla_deadline {
      self.sla_deadline = Some(deadline);
    }
    if let Some(location) = patch.location {
      self.location = location;
    }
    if let Some(status) = patch.status {
      self.status = status;
      self.updates.push(StatusUpdate::status_changed(now, status, actor));
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  fn pothole() -> DetailedReport {
    NewReport {
      title: "Pothole".into(),
      category: "Roads".into(),
      ..NewReport::default()
    }
    .into_report(1000, "Alice", at(1))
  }

  #[test]
  fn new_report_gets_defaults_and_logged_entry() {
    let r = pothole();
    assert_eq!(r.status, ReportStatus::UnderReview);
    assert_eq!(r.priority, Priority::Medium);
    assert_eq!(r.updates.len(), 1);
    assert_eq!(r.updates[0].by, "System");
  }

  #[test]
  fn explicit_status_and_priority_are_kept() {
    let r = NewReport {
      status: Some(ReportStatus::Emergency),
      priority: Some(Priority::Critical),
      ..NewReport::default()
    }
    .into_report(1, "Bob", at(0));
    assert_eq!(r.status, ReportStatus::Emergency);
    assert_eq!(r.priority, Priority::Critical);
  }

  #[test]
  fn status_patch_appends_history() {
    let mut r = pothole();
    r.apply(
      ReportPatch { status: Some(ReportStatus::Resolved), ..ReportPatch::default() },
      "Officer Rao",
      at(2),
    );
    assert_eq!(r.status, ReportStatus::Resolved);
    assert_eq!(r.updates.len(), 2);
    let last = r.updates.last().unwrap();
    assert!(last.message.contains("Resolved"));
    assert_eq!(last.by, "Officer Rao");
  }

  #[test]
  fn non_status_patch_leaves_history_alone() {
    let mut r = pothole();
    r.apply(
      ReportPatch {
        assigned_to: Some("Roads Dept".into()),
        priority: Some(Priority::High),
        ..ReportPatch::default()
      },
      "Officer Rao",
      at(2),
    );
    assert_eq!(r.assigned_to.as_deref(), Some("Roads Dept"));
    assert_eq!(r.priority, Priority::High);
    assert_eq!(r.updates.len(), 1);
  }

  #[test]
  fn status_uses_display_strings_on_the_wire() {
    let json = serde_json::to_string(&ReportStatus::UnderReview).unwrap();
    assert_eq!(json, "\"Under Review\"");
    assert_eq!(ReportStatus::UnderReview.to_string(), "Under Review");
  }
}
