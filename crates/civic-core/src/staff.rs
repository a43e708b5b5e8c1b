//! Auxiliary records backing operator dashboard panels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A step in an inter-department data exchange shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataflowItem {
  pub id:          String,
  pub source:      String,
  pub destination: String,
  #[serde(default)]
  pub status:      String,
  pub timestamp:   DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
  pub id:         String,
  pub name:       String,
  pub role:       String,
  pub department: String,
  #[serde(default)]
  pub status:     String,
  #[serde(default)]
  pub avatar:     Option<String>,
}
