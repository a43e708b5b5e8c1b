//! An in-process [`KeyValueStore`], shared by clones.
//!
//! Two services built on clones of the same `MemoryKv` behave like two tabs
//! sharing one origin's storage.

use std::{
  collections::HashMap,
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
  },
};

use civic_core::ports::KeyValueStore;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("storage write rejected")]
pub struct WriteRejected;

#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
  entries:     Arc<Mutex<HashMap<String, String>>>,
  fail_writes: Arc<AtomicBool>,
}

impl MemoryKv {
  pub fn new() -> Self { Self::default() }

  /// Make every subsequent `set` fail, as a full quota would.
  pub fn reject_writes(&self, reject: bool) { self.fail_writes.store(reject, Ordering::SeqCst); }

  /// Read a value without going through the async port.
  pub fn peek(&self, key: &str) -> Option<String> {
    self.entries.lock().unwrap_or_else(|e| e.into_inner()).get(key).cloned()
  }

  /// Write a value without going through the async port.
  pub fn insert(&self, key: &str, value: impl Into<String>) {
    self
      .entries
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .insert(key.to_owned(), value.into());
  }
}

impl KeyValueStore for MemoryKv {
  type Error = WriteRejected;

  async fn get(&self, key: &str) -> Result<Option<String>, WriteRejected> { Ok(self.peek(key)) }

  async fn set(&self, key: &str, value: String) -> Result<(), WriteRejected> {
    if self.fail_writes.load(Ordering::SeqCst) {
      return Err(WriteRejected);
    }
    self.insert(key, value);
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<(), WriteRejected> {
    self.entries.lock().unwrap_or_else(|e| e.into_inner()).remove(key);
    Ok(())
  }
}
