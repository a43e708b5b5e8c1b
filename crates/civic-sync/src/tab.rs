//! Same-device replication channel.
//!
//! An [`Origin`] stands in for a browser origin: every [`TabChannel`] opened
//! from it under the same name shares one broadcast bus. A posted message is
//! delivered to every other channel on the bus, never back to the poster.

use std::{
  collections::HashMap,
  sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
  },
};

use civic_core::wire::TabMessage;
use tokio::sync::broadcast;
use tracing::warn;

const CHANNEL_CAPACITY: usize = 64;

static NEXT_TAB_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone)]
struct TabFrame {
  from:    u64,
  message: TabMessage,
}

/// A registry of named broadcast buses scoped to one origin.
#[derive(Clone, Default)]
pub struct Origin {
  buses: Arc<Mutex<HashMap<String, broadcast::Sender<TabFrame>>>>,
}

impl Origin {
  pub fn new() -> Self { Self::default() }

  /// Join the bus called `name`, creating it on first use.
  pub fn channel(&self, name: &str) -> TabChannel {
    let sender = self
      .buses
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .entry(name.to_owned())
      .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
      .clone();
    TabChannel {
      id: NEXT_TAB_ID.fetch_add(1, Ordering::Relaxed),
      name: name.to_owned(),
      sender,
    }
  }
}

/// One instance's endpoint on a same-device bus.
#[derive(Clone)]
pub struct TabChannel {
  id:     u64,
  name:   String,
  sender: broadcast::Sender<TabFrame>,
}

impl TabChannel {
  pub fn name(&self) -> &str { &self.name }

  /// Post `message` to every other endpoint. Having no listeners is fine.
  pub fn post(&self, message: TabMessage) {
    let _ = self.sender.send(TabFrame { from: self.id, message });
  }

  /// Start receiving messages posted by other endpoints from now on.
  pub fn subscribe(&self) -> TabReceiver {
    TabReceiver { id: self.id, rx: self.sender.subscribe() }
  }
}

pub struct TabReceiver {
  id: u64,
  rx: broadcast::Receiver<TabFrame>,
}

impl TabReceiver {
  /// Next message from another endpoint; `None` once the bus is gone.
  ///
  /// If this receiver fell behind, the skipped messages are lost and the
  /// next retained one is returned.
  pub async fn recv(&mut self) -> Option<TabMessage> {
    loop {
      match self.rx.recv().await {
        Ok(frame) if frame.from == self.id => continue,
        Ok(frame) => return Some(frame.message),
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
          warn!(skipped, "same-device receiver lagged");
        }
        Err(broadcast::error::RecvError::Closed) => return None,
      }
    }
  }
}
