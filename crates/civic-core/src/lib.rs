//! Core types and port definitions for the Civic Connect data store.
//!
//! This crate is deliberately free of storage and transport dependencies.
//! It defines the aggregate that is persisted and replicated as a whole, the
//! wire envelopes, the events fanned out to subscribers, and the ports the
//! sync engine is built against.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod announcement;
pub mod audit;
pub mod database;
pub mod error;
pub mod event;
pub mod geo;
pub mod ports;
pub mod report;
pub mod sos;
pub mod staff;
pub mod user;
pub mod wire;

pub use error::{Error, Result};
