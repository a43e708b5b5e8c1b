//! Geographic primitives shared by users, reports and SOS alerts.

use serde::{Deserialize, Serialize};

/// A WGS-84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
  pub lat: f64,
  pub lng: f64,
}

impl GeoPoint {
  pub fn new(lat: f64, lng: f64) -> Self { Self { lat, lng } }
}
