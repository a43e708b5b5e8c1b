//! Read-only views: announcements and the overlay identity.

use axum::{Json, extract::State};
use civic_core::{announcement::Announcement, ports::KeyValueStore};
use civic_sync::CivicService;
use serde::Serialize;

/// `GET /announcements`
pub async fn announcements<K: KeyValueStore>(
  State(service): State<CivicService<K>>,
) -> Json<Vec<Announcement>> {
  Json(service.announcements())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudStatus {
  pub cloud_id: Option<String>,
  pub peers:    usize,
}

/// `GET /cloud`. `cloudId` is `null` until the overlay is joined.
pub async fn cloud<K: KeyValueStore>(State(service): State<CivicService<K>>) -> Json<CloudStatus> {
  Json(CloudStatus {
    cloud_id: service.cloud_id(),
    peers:    service.peers().iter().filter(|p| p.is_open()).count(),
  })
}
