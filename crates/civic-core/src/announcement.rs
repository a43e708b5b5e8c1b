//! Operator-authored broadcast notices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether an announcement is routine information or an emergency notice.
///
/// Stored blobs encode this with report-status strings under a `status` key,
/// so `Informational` is written as `"Under Review"`. `"Resolved"` is also
/// read as informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnnouncementCategory {
  #[default]
  #[serde(rename = "Under Review", alias = "Resolved")]
  Informational,
  Emergency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
  pub id:         String,
  pub title:      String,
  pub content:    String,
  pub department: String,
  pub timestamp:  DateTime<Utc>,
  #[serde(rename = "status", default)]
  pub category:   AnnouncementCategory,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn legacy_status_strings_map_to_categories() {
    let read = |s: &str| serde_json::from_str::<AnnouncementCategory>(s).unwrap();
    assert_eq!(read("\"Under Review\""), AnnouncementCategory::Informational);
    assert_eq!(read("\"Resolved\""), AnnouncementCategory::Informational);
    assert_eq!(read("\"Emergency\""), AnnouncementCategory::Emergency);
  }

  #[test]
  fn category_is_written_under_status_key() {
    let a = Announcement {
      id:         "a1".into(),
      title:      "Water cut".into(),
      content:    "Ward 4, 10:00-14:00".into(),
      department: "Water Board".into(),
      timestamp:  chrono::DateTime::<Utc>::UNIX_EPOCH,
      category:   AnnouncementCategory::Emergency,
    };
    let json = serde_json::to_value(&a).unwrap();
    assert_eq!(json["status"], "Emergency");
    assert!(json.get("category").is_none());
  }
}
