//! Replication engine for the Civic Connect store.
//!
//! A [`CivicService`] owns the only writable copy of the [`Database`]
//! aggregate. Every command mutates it, persists the whole snapshot, posts the
//! snapshot to sibling instances on the same device and pushes it to every
//! open peer connection, then notifies local subscribers.
//!
//! Inbound snapshots replace the local store wholesale (through the injected
//! [`MergeStrategy`]) and are never re-broadcast. There is no ordering
//! guarantee across instances: the last snapshot applied wins.
//!
//! [`Database`]: civic_core::database::Database
//! [`MergeStrategy`]: civic_core::ports::MergeStrategy

pub mod config;
pub mod error;
pub mod memory;
pub mod peer;
pub mod persistence;
pub mod service;
pub mod subscribers;
pub mod tab;

pub use config::SyncConfig;
pub use error::{Error, Result};
pub use service::{CivicService, ReplicationSource, ServiceBuilder};
