//! Handlers for `/reports` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/reports` | Newest first |
//! | `POST`  | `/reports` | Body: `{"report": {..}, "submitter": {..}}` |
//! | `PATCH` | `/reports/{id}` | Body: `{"patch": {..}, "actor": ".."}`; 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use civic_core::{
  ports::KeyValueStore,
  report::{DetailedReport, NewReport, ReportPatch},
  user::User,
};
use civic_sync::CivicService;
use serde::Deserialize;

use crate::error::ApiError;

/// `GET /reports`
pub async fn list<K: KeyValueStore>(
  State(service): State<CivicService<K>>,
) -> Json<Vec<DetailedReport>> {
  Json(service.reports())
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub report:    NewReport,
  pub submitter: User,
}

/// `POST /reports`
pub async fn create<K: KeyValueStore>(
  State(service): State<CivicService<K>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let report = service.create_report(body.report, &body.submitter).await?;
  Ok((StatusCode::CREATED, Json(report)))
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  #[serde(default)]
  pub patch: ReportPatch,
  pub actor: String,
}

/// `PATCH /reports/{id}`
pub async fn update<K: KeyValueStore>(
  State(service): State<CivicService<K>>,
  Path(id): Path<i64>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<DetailedReport>, ApiError> {
  let report = service
    .update_report(id, body.patch, &body.actor)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("report {id} not found")))?;
  Ok(Json(report))
}
