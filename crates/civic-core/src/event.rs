//! Events fanned out to local subscribers.

use serde::Serialize;

use crate::{database::Database, report::DetailedReport, sos::SosAlert};

/// A semantic notification emitted after a command or an inbound replication.
///
/// Serialises as `{"event": "<NAME>", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, strum::IntoStaticStr)]
#[serde(tag = "event", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreEvent {
  NewIssue(DetailedReport),
  IssueUpdated(DetailedReport),
  SosAlert(SosAlert),
  /// Carries only the id of the resolved alert.
  SosResolved(i64),
  /// The whole store was replaced by a replicated snapshot.
  CloudSync(Box<Database>),
  /// The local overlay identity is established; carries the cloud id.
  CloudOnline(String),
  /// A peer link reached the open state; carries the remote identity.
  PeerConnected(String),
}

impl StoreEvent {
  /// The wire name, e.g. `"NEW_ISSUE"`.
  pub fn name(&self) -> &'static str { self.into() }
}
