//! Handlers for sign-in and registration.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/login` | 401 on any mismatch |
//! | `POST` | `/users` | Registers a citizen; duplicates are accepted |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use civic_core::{
  ports::KeyValueStore,
  user::{NewUser, Role, User},
};
use civic_sync::CivicService;
use serde::Deserialize;

use crate::error::ApiError;

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  /// Email, phone number or national id.
  pub identifier: String,
  pub password:   String,
  #[serde(default)]
  pub role:       Role,
}

/// `POST /login`
pub async fn login<K: KeyValueStore>(
  State(service): State<CivicService<K>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<User>, ApiError> {
  service
    .login(&body.identifier, &body.password, body.role)
    .map(Json)
    .ok_or(ApiError::Unauthorized)
}

// ─── Register ────────────────────────────────────────────────────────────────

/// `POST /users`
pub async fn register<K: KeyValueStore>(
  State(service): State<CivicService<K>>,
  Json(body): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
  let user = service.register(body).await?;
  Ok((StatusCode::CREATED, Json(user)))
}
