//! Append-only audit trail entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Actions recorded by the command layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
  RegisterUser,
  CreateReport,
  UpdateReport,
  CreateSos,
  ResolveSos,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
  pub timestamp: DateTime<Utc>,
  pub action:    String,
  pub actor:     String,
  pub target_id: String,
}

impl AuditLogEntry {
  pub fn new(
    timestamp: DateTime<Utc>,
    action: AuditAction,
    actor: &str,
    target_id: impl ToString,
  ) -> Self {
    Self {
      timestamp,
      action: action.to_string(),
      actor: actor.to_owned(),
      target_id: target_id.to_string(),
    }
  }
}
