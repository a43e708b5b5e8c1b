//! Peer replication overlay.
//!
//! Instances advertise an overlay identity through a [`Signaling`]
//! implementation and dial each other's identities to form links. Once a
//! link is open, both ends can push snapshots; nothing is queued for links
//! that are not open.

mod local;
mod tcp;

use std::{
  future::Future,
  sync::{Arc, Mutex},
};

use civic_core::wire::PeerMessage;
use tokio::sync::{mpsc, watch};

pub use local::LocalRendezvous;
pub use tcp::TcpSignaling;

use crate::Result;

// ─── Links ───────────────────────────────────────────────────────────────────

/// A full-duplex message pipe to one remote instance, as handed over by the
/// signaling layer.
#[derive(Debug)]
pub struct PeerLink {
  pub remote_id: String,
  pub outbound:  mpsc::UnboundedSender<PeerMessage>,
  pub inbound:   mpsc::UnboundedReceiver<PeerMessage>,
}

impl PeerLink {
  /// Two connected in-process ends: the first belongs to `a`, the second
  /// to `b`.
  pub fn pair(a: &str, b: &str) -> (Self, Self) {
    let (a_tx, a_rx) = mpsc::unbounded_channel();
    let (b_tx, b_rx) = mpsc::unbounded_channel();
    (
      Self { remote_id: b.to_owned(), outbound: a_tx, inbound: b_rx },
      Self { remote_id: a.to_owned(), outbound: b_tx, inbound: a_rx },
    )
  }
}

/// An identity being advertised, plus the links other instances open to it.
pub struct Advertisement {
  /// The identity others should dial. May differ from the one requested,
  /// e.g. a socket address for network transports.
  pub cloud_id: String,
  pub incoming: mpsc::UnboundedReceiver<PeerLink>,
}

/// Rendezvous between instances. Only link establishment goes through here;
/// data flows directly over the resulting [`PeerLink`]s.
pub trait Signaling: Send + Sync {
  fn advertise<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Advertisement>> + Send + 'a;

  fn dial<'a>(
    &'a self,
    local_id: &'a str,
    target: &'a str,
  ) -> impl Future<Output = Result<PeerLink>> + Send + 'a;
}

// ─── Connections ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
  Connecting,
  Open,
  Closed,
}

/// The local end of one overlay connection.
#[derive(Debug)]
pub struct PeerConnection {
  remote_id: String,
  state:     watch::Sender<ConnectionState>,
  outbound:  Mutex<Option<mpsc::UnboundedSender<PeerMessage>>>,
}

impl PeerConnection {
  pub fn connecting(remote_id: impl Into<String>) -> Arc<Self> {
    Arc::new(Self {
      remote_id: remote_id.into(),
      state:     watch::Sender::new(ConnectionState::Connecting),
      outbound:  Mutex::new(None),
    })
  }

  pub fn remote_id(&self) -> &str { &self.remote_id }

  pub fn state(&self) -> ConnectionState { *self.state.borrow() }

  pub fn is_open(&self) -> bool { self.state() == ConnectionState::Open }

  /// Observe state transitions.
  pub fn watch(&self) -> watch::Receiver<ConnectionState> { self.state.subscribe() }

  pub(crate) fn open(&self, outbound: mpsc::UnboundedSender<PeerMessage>) {
    *self.outbound.lock().unwrap_or_else(|e| e.into_inner()) = Some(outbound);
    self.state.send_replace(ConnectionState::Open);
  }

  /// Close the connection. Dropping the outbound sender lets the transport
  /// shut its side down.
  pub fn close(&self) {
    self.outbound.lock().unwrap_or_else(|e| e.into_inner()).take();
    self.state.send_replace(ConnectionState::Closed);
  }

  /// Push `message` if the connection is open. Returns whether it was handed
  /// to the transport; anything else is silently dropped.
  pub fn send(&self, message: PeerMessage) -> bool {
    if !self.is_open() {
      return false;
    }
    match self.outbound.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
      Some(tx) => tx.send(message).is_ok(),
      None => false,
    }
  }
}

#[cfg(test)]
mod tests {
  use civic_core::database::Database;

  use super::*;

  #[test]
  fn send_is_a_no_op_until_open_and_after_close() {
    let (ours, mut theirs) = PeerLink::pair("a", "b");
    let conn = PeerConnection::connecting("b");
    assert_eq!(conn.state(), ConnectionState::Connecting);
    assert!(!conn.send(PeerMessage::PartialUpdate(Database::default())));

    conn.open(ours.outbound);
    assert!(conn.send(PeerMessage::PartialUpdate(Database::default())));
    assert!(theirs.inbound.try_recv().is_ok());

    conn.close();
    assert_eq!(conn.state(), ConnectionState::Closed);
    assert!(!conn.send(PeerMessage::PartialUpdate(Database::default())));
    assert!(theirs.inbound.try_recv().is_err());
  }

  #[test]
  fn paired_links_cross_over() {
    let (a, b) = PeerLink::pair("a", "b");
    assert_eq!(a.remote_id, "b");
    assert_eq!(b.remote_id, "a");
    a.outbound.send(PeerMessage::FullSync(Database::default())).unwrap();
    let mut b_in = b.inbound;
    assert_eq!(b_in.try_recv().unwrap().kind(), "FULL_SYNC");
  }
}
