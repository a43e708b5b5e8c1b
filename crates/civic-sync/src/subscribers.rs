//! In-process fan-out of [`StoreEvent`]s to registered callbacks.

use std::{
  collections::BTreeMap,
  sync::{Arc, Mutex, MutexGuard, Weak},
};

use civic_core::event::StoreEvent;

type Listener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
  next:      u64,
  // Keys are allocated monotonically, so iteration is registration order.
  listeners: BTreeMap<u64, Listener>,
}

/// A set of callbacks notified synchronously, in registration order.
#[derive(Clone, Default)]
pub struct Subscribers {
  registry: Arc<Mutex<Registry>>,
}

impl Subscribers {
  pub fn new() -> Self { Self::default() }

  fn lock(&self) -> MutexGuard<'_, Registry> {
    self.registry.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Register `callback`. It stays registered until the returned
  /// [`Subscription`] is explicitly unsubscribed.
  pub fn subscribe(&self, callback: impl Fn(&StoreEvent) + Send + Sync + 'static) -> Subscription {
    let mut registry = self.lock();
    let key = registry.next;
    registry.next += 1;
    registry.listeners.insert(key, Arc::new(callback));
    Subscription { key, registry: Arc::downgrade(&self.registry) }
  }

  /// Call every listener with `event`.
  ///
  /// The listener list is copied before iterating, so callbacks may subscribe
  /// or unsubscribe (themselves or others) without affecting this round.
  pub fn emit(&self, event: &StoreEvent) {
    let listeners: Vec<Listener> = self.lock().listeners.values().cloned().collect();
    tracing::trace!(event = event.name(), listeners = listeners.len(), "emit");
    for listener in listeners {
      listener(event);
    }
  }

  pub fn len(&self) -> usize { self.lock().listeners.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Handle returned by [`Subscribers::subscribe`].
#[derive(Debug, Clone)]
pub struct Subscription {
  key:      u64,
  registry: Weak<Mutex<Registry>>,
}

impl Subscription {
  /// Remove the callback. Calling this more than once is harmless.
  pub fn unsubscribe(&self) {
    if let Some(registry) = self.registry.upgrade() {
      registry
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .listeners
        .remove(&self.key);
    }
  }
}
