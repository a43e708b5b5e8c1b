//! Ports the sync engine is built against.
//!
//! Storage, time, identifier allocation and the snapshot merge step are all
//! injected so that tests can substitute deterministic doubles and a future
//! merge strategy can replace whole-store overwrite without touching the
//! transports.

use std::{
  future::Future,
  sync::{
    Mutex,
    atomic::{AtomicI64, Ordering},
  },
};

use chrono::{DateTime, Utc};

use crate::database::Database;

// ─── Key-value storage ───────────────────────────────────────────────────────

/// An origin-scoped string key-value store (the browser's `localStorage`
/// equivalent). Implemented by storage backends such as `civic-store-sqlite`.
pub trait KeyValueStore: Send + Sync + 'static {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the value stored under `key`, if any.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Overwrite the value stored under `key`.
  fn set<'a>(
    &'a self,
    key: &'a str,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Delete `key`. Deleting a missing key is not an error.
  fn remove<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Time ────────────────────────────────────────────────────────────────────

pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }
}

/// A clock frozen at one instant, settable by tests.
#[derive(Debug)]
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
  pub fn new(at: DateTime<Utc>) -> Self { Self(Mutex::new(at)) }

  pub fn set(&self, at: DateTime<Utc>) {
    *self.0.lock().unwrap_or_else(|e| e.into_inner()) = at;
  }
}

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> { *self.0.lock().unwrap_or_else(|e| e.into_inner()) }
}

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Allocates numeric identifiers for reports and SOS alerts.
pub trait IdGenerator: Send + Sync {
  fn next_id(&self) -> i64;
}

/// Millisecond timestamps, bumped by one when two allocations land in the
/// same millisecond so ids stay unique within an instance.
#[derive(Debug, Default)]
pub struct TimestampIds {
  last: AtomicI64,
}

impl TimestampIds {
  pub fn new() -> Self { Self::default() }

  fn allocate(&self, now_ms: i64) -> i64 {
    let mut prev = self.last.load(Ordering::Relaxed);
    loop {
      let next = now_ms.max(prev + 1);
      match self
        .last
        .compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed)
      {
        Ok(_) => return next,
        Err(actual) => prev = actual,
      }
    }
  }
}

impl IdGenerator for TimestampIds {
  fn next_id(&self) -> i64 { self.allocate(Utc::now().timestamp_millis()) }
}

/// Hands out `start`, `start + step`, `start + 2 * step`, … in order.
#[derive(Debug)]
pub struct SequenceIds {
  next: AtomicI64,
  step: i64,
}

impl SequenceIds {
  pub fn new(start: i64, step: i64) -> Self {
    Self { next: AtomicI64::new(start), step }
  }
}

impl IdGenerator for SequenceIds {
  fn next_id(&self) -> i64 { self.next.fetch_add(self.step, Ordering::Relaxed) }
}

// ─── Merge ───────────────────────────────────────────────────────────────────

/// Combines the local store with an inbound replicated snapshot.
pub trait MergeStrategy: Send + Sync {
  fn merge(&self, local: &Database, incoming: Database) -> Database;
}

/// Whole-store last-writer-wins: the inbound snapshot replaces everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceAll;

impl MergeStrategy for ReplaceAll {
  fn merge(&self, _local: &Database, incoming: Database) -> Database { incoming }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamp_ids_never_repeat_within_a_millisecond() {
    let ids = TimestampIds::new();
    let a = ids.allocate(5_000);
    let b = ids.allocate(5_000);
    let c = ids.allocate(4_000);
    assert_eq!(a, 5_000);
    assert_eq!(b, 5_001);
    assert_eq!(c, 5_002);
    assert_eq!(ids.allocate(9_000), 9_000);
  }

  #[test]
  fn sequence_ids_step() {
    let ids = SequenceIds::new(1000, 1000);
    assert_eq!(ids.next_id(), 1000);
    assert_eq!(ids.next_id(), 2000);
  }

  #[test]
  fn replace_all_discards_local() {
    let mut local = Database::default();
    local.ensure_official_accounts();
    let merged = ReplaceAll.merge(&local, Database::default());
    assert!(merged.users.is_empty());
  }
}
