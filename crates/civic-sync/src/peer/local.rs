//! In-process signaling, for instances that share an address space.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
};

use tokio::sync::mpsc;
use tracing::debug;

use super::{Advertisement, PeerLink, Signaling};
use crate::{Error, Result};

/// A shared directory of advertised identities.
#[derive(Clone, Default)]
pub struct LocalRendezvous {
  listeners: Arc<Mutex<HashMap<String, mpsc::UnboundedSender<PeerLink>>>>,
}

impl LocalRendezvous {
  pub fn new() -> Self { Self::default() }

  /// Stop advertising `id`. Existing links are unaffected.
  pub fn withdraw(&self, id: &str) {
    self.listeners.lock().unwrap_or_else(|e| e.into_inner()).remove(id);
  }
}

impl Signaling for LocalRendezvous {
  async fn advertise(&self, id: &str) -> Result<Advertisement> {
    let (tx, incoming) = mpsc::unbounded_channel();
    // Re-advertising an identity takes it over from the previous holder.
    self
      .listeners
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .insert(id.to_owned(), tx);
    debug!(id, "advertised");
    Ok(Advertisement { cloud_id: id.to_owned(), incoming })
  }

  async fn dial(&self, local_id: &str, target: &str) -> Result<PeerLink> {
    let listener = self
      .listeners
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .get(target)
      .cloned()
      .ok_or_else(|| Error::PeerUnavailable(target.to_owned()))?;

    let (ours, theirs) = PeerLink::pair(local_id, target);
    listener
      .send(theirs)
      .map_err(|_| Error::PeerUnavailable(target.to_owned()))?;
    Ok(ours)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn dial_reaches_advertiser() {
    let rdv = LocalRendezvous::new();
    let mut ad = rdv.advertise("hub").await.unwrap();
    let link = rdv.dial("joiner", "hub").await.unwrap();
    assert_eq!(link.remote_id, "hub");
    let accepted = ad.incoming.recv().await.unwrap();
    assert_eq!(accepted.remote_id, "joiner");
  }

  #[tokio::test]
  async fn dialing_unknown_identity_fails() {
    let rdv = LocalRendezvous::new();
    assert!(matches!(
      rdv.dial("joiner", "nobody").await,
      Err(Error::PeerUnavailable(id)) if id == "nobody"
    ));
  }

  #[tokio::test]
  async fn withdrawn_identity_is_unreachable() {
    let rdv = LocalRendezvous::new();
    let _ad = rdv.advertise("hub").await.unwrap();
    rdv.withdraw("hub");
    assert!(rdv.dial("joiner", "hub").await.is_err());
  }
}
