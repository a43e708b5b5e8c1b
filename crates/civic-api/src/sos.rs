//! Handlers for `/sos` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/sos` | Newest first |
//! | `POST` | `/sos` | Body: `{"user": {..}, "video": ".."}` |
//! | `POST` | `/sos/{id}/resolve` | 204 whether or not the alert exists |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use civic_core::{ports::KeyValueStore, sos::SosAlert, user::User};
use civic_sync::CivicService;
use serde::Deserialize;

use crate::error::ApiError;

/// `GET /sos`
pub async fn list<K: KeyValueStore>(State(service): State<CivicService<K>>) -> Json<Vec<SosAlert>> {
  Json(service.sos_alerts())
}

#[derive(Debug, Deserialize)]
pub struct RaiseBody {
  pub user:  User,
  #[serde(default)]
  pub video: Option<String>,
}

/// `POST /sos`
pub async fn raise<K: KeyValueStore>(
  State(service): State<CivicService<K>>,
  Json(body): Json<RaiseBody>,
) -> Result<impl IntoResponse, ApiError> {
  let alert = service.create_sos_alert(&body.user, body.video).await?;
  Ok((StatusCode::CREATED, Json(alert)))
}

#[derive(Debug, Deserialize)]
pub struct ResolveBody {
  pub actor: String,
}

/// `POST /sos/{id}/resolve`
pub async fn resolve<K: KeyValueStore>(
  State(service): State<CivicService<K>>,
  Path(id): Path<i64>,
  Json(body): Json<ResolveBody>,
) -> Result<StatusCode, ApiError> {
  service.resolve_sos_alert(id, &body.actor).await?;
  Ok(StatusCode::NO_CONTENT)
}
