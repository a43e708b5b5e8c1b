//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for a [`CivicService`](crate::CivicService). Every field has a
/// default, so an empty config table deserialises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
  /// Key under which the whole snapshot is persisted.
  pub storage_key:        String,
  /// Name of the same-device broadcast channel.
  pub tab_channel:        String,
  /// Stable overlay identity advertised by an official (hub) instance.
  pub hub_id:             String,
  /// Pause between a peer link opening and the hub's `FULL_SYNC` push.
  pub bootstrap_delay_ms: u64,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      storage_key:        "civic_connect_db".to_owned(),
      tab_channel:        "civic_connect_sync".to_owned(),
      hub_id:             "civic-connect-hub".to_owned(),
      bootstrap_delay_ms: 1000,
    }
  }
}

impl SyncConfig {
  pub fn bootstrap_delay(&self) -> Duration { Duration::from_millis(self.bootstrap_delay_ms) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_table_uses_defaults() {
    let cfg: SyncConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(cfg, SyncConfig::default());
  }

  #[test]
  fn partial_override() {
    let cfg: SyncConfig = serde_json::from_str(r#"{"bootstrap_delay_ms": 50}"#).unwrap();
    assert_eq!(cfg.bootstrap_delay(), Duration::from_millis(50));
    assert_eq!(cfg.hub_id, "civic-connect-hub");
  }
}
