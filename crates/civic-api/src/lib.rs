//! JSON REST API for the Civic Connect store.
//!
//! Exposes an axum [`Router`] over a [`CivicService`]. Every mutating route
//! goes through the service's command pipeline, so HTTP clients replicate
//! exactly like any other caller. Auth, TLS, and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", civic_api::api_router(service.clone()))
//! ```

pub mod error;
pub mod feed;
pub mod reports;
pub mod sos;
pub mod users;

use axum::{
  Router,
  routing::{get, patch, post},
};
use civic_core::ports::KeyValueStore;
use civic_sync::CivicService;

pub use error::ApiError;

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<K: KeyValueStore>(service: CivicService<K>) -> Router<()> {
  Router::new()
    // Identity
    .route("/login", post(users::login::<K>))
    .route("/users", post(users::register::<K>))
    // Reports
    .route("/reports", get(reports::list::<K>).post(reports::create::<K>))
    .route("/reports/{id}", patch(reports::update::<K>))
    // SOS
    .route("/sos", get(sos::list::<K>).post(sos::raise::<K>))
    .route("/sos/{id}/resolve", post(sos::resolve::<K>))
    // Feed
    .route("/announcements", get(feed::announcements::<K>))
    .route("/cloud", get(feed::cloud::<K>))
    .with_state(service)
}
