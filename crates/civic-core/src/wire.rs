//! Replication message envelopes.
//!
//! Both envelopes always carry the entire store. `PARTIAL_UPDATE` is a
//! historical name kept for compatibility with deployed clients; receivers
//! treat it exactly like `FULL_SYNC`.

use serde::{Deserialize, Serialize};

use crate::database::Database;

/// Message posted on the same-device channel after every local mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TabMessage {
  RemoteUpdate(Database),
}

/// Message exchanged over a peer overlay connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeerMessage {
  /// Hub bootstrap sent to a newly joined peer.
  FullSync(Database),
  /// Pushed after every local mutation.
  PartialUpdate(Database),
}

impl TabMessage {
  pub fn into_snapshot(self) -> Database {
    match self {
      Self::RemoteUpdate(db) => db,
    }
  }
}

impl PeerMessage {
  pub fn kind(&self) -> &'static str {
    match self {
      Self::FullSync(_) => "FULL_SYNC",
      Self::PartialUpdate(_) => "PARTIAL_UPDATE",
    }
  }

  pub fn into_snapshot(self) -> Database {
    match self {
      Self::FullSync(db) | Self::PartialUpdate(db) => db,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn envelopes_use_type_and_payload_keys() {
    let json = serde_json::to_value(PeerMessage::PartialUpdate(Database::default())).unwrap();
    assert_eq!(json["type"], "PARTIAL_UPDATE");
    assert!(json["payload"].is_object());

    let json = serde_json::to_value(TabMessage::RemoteUpdate(Database::default())).unwrap();
    assert_eq!(json["type"], "REMOTE_UPDATE");
  }

  #[test]
  fn parses_browser_frame() {
    let msg: PeerMessage =
      serde_json::from_str(r#"{"type":"FULL_SYNC","payload":{"reports":[]}}"#).unwrap();
    assert_eq!(msg.kind(), "FULL_SYNC");
    assert_eq!(msg.into_snapshot(), Database::default());
  }
}
