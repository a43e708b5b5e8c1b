//! Safety emergency (SOS) alerts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{geo::GeoPoint, user::User};

/// Alert lifecycle. Intended to move forward only:
/// `Active` → `Acknowledged` → `Resolved`.
///
/// The store itself only ever writes `Active` and `Resolved`; acknowledgement
/// is tracked by the operator dashboard and never persisted here.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display,
)]
pub enum SosStatus {
  #[default]
  Active,
  Acknowledged,
  Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosAlert {
  pub id:          i64,
  // Identity is copied at creation and does not follow later profile edits.
  pub user_name:   String,
  pub user_phone:  String,
  #[serde(default)]
  pub user_avatar: Option<String>,
  pub timestamp:   DateTime<Utc>,
  pub location:    GeoPoint,
  pub status:      SosStatus,
  #[serde(default)]
  pub video:       Option<String>,
}

impl SosAlert {
  /// Raise an alert for `user` at their current coordinate.
  pub fn raise(id: i64, user: &User, video: Option<String>, now: DateTime<Utc>) -> Self {
    Self {
      id,
      user_name: user.name.clone(),
      user_phone: user.phone.clone(),
      user_avatar: user.avatar.clone(),
      timestamp: now,
      location: user.location.coordinates,
      status: SosStatus::Active,
      video,
    }
  }
}
