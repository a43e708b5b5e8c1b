//! Whole-snapshot persistence over a [`KeyValueStore`].

use chrono::{DateTime, Utc};
use civic_core::{database::Database, ports::KeyValueStore};
use tracing::{info, warn};

use crate::{Error, Result};

/// Reads and writes the entire store as one JSON blob under a fixed key.
pub struct SnapshotStore<K> {
  kv:  K,
  key: String,
}

impl<K: KeyValueStore> SnapshotStore<K> {
  pub fn new(kv: K, key: impl Into<String>) -> Self { Self { kv, key: key.into() } }

  pub fn kv(&self) -> &K { &self.kv }

  /// Load the stored snapshot, or seed and persist a fresh one.
  ///
  /// A stored blob is used as-is, whatever its schema version; only the
  /// official accounts are re-inserted if missing. A blob that is not valid
  /// JSON is replaced by the seeded default.
  pub async fn load_or_seed(&self, now: DateTime<Utc>) -> Result<Database> {
    let raw = self.kv.get(&self.key).await.map_err(Error::storage)?;

    let mut db = match raw.as_deref().map(Database::from_json) {
      Some(Ok(db)) => db,
      Some(Err(e)) => {
        warn!(key = %self.key, error = %e, "stored snapshot is unreadable; reseeding");
        return self.seed(now).await;
      }
      None => {
        info!(key = %self.key, "no stored snapshot; seeding");
        return self.seed(now).await;
      }
    };

    if db.ensure_official_accounts() {
      info!("restored missing official accounts");
      self.save(&db).await?;
    }
    Ok(db)
  }

  async fn seed(&self, now: DateTime<Utc>) -> Result<Database> {
    let db = Database::seeded(now);
    self.save(&db).await?;
    Ok(db)
  }

  /// Overwrite the stored blob with `db`.
  pub async fn save(&self, db: &Database) -> Result<()> {
    let json = db.to_json()?;
    self.kv.set(&self.key, json).await.map_err(Error::storage)
  }
}

#[cfg(test)]
mod tests {
  use civic_core::{database::SCHEMA_VERSION, user::Role};

  use super::*;
  use crate::memory::MemoryKv;

  const KEY: &str = "db";

  fn epoch() -> DateTime<Utc> { DateTime::<Utc>::UNIX_EPOCH }

  #[tokio::test]
  async fn cold_start_seeds_and_persists() {
    let kv = MemoryKv::new();
    let store = SnapshotStore::new(kv.clone(), KEY);
    let db = store.load_or_seed(epoch()).await.unwrap();
    assert_eq!(db, Database::seeded(epoch()));
    assert!(kv.peek(KEY).is_some());
  }

  #[tokio::test]
  async fn warm_start_keeps_legacy_blob_and_restores_officials() {
    let kv = MemoryKv::new();
    kv.insert(KEY, r#"{"users":[],"reports":[]}"#);
    let store = SnapshotStore::new(kv.clone(), KEY);

    let db = store.load_or_seed(epoch()).await.unwrap();
    assert_eq!(db.schema_version, 0);
    assert!(db.announcements.is_empty());
    assert_eq!(db.users.iter().filter(|u| u.role == Role::Official).count(), 2);

    let persisted = Database::from_json(&kv.peek(KEY).unwrap()).unwrap();
    assert_eq!(persisted.users.len(), 2);
  }

  #[tokio::test]
  async fn garbage_blob_is_reseeded() {
    let kv = MemoryKv::new();
    kv.insert(KEY, "{not json");
    let store = SnapshotStore::new(kv, KEY);
    let db = store.load_or_seed(epoch()).await.unwrap();
    assert_eq!(db.schema_version, SCHEMA_VERSION);
    assert_eq!(db.announcements.len(), 1);
  }

  #[tokio::test]
  async fn save_failure_surfaces() {
    let kv = MemoryKv::new();
    kv.reject_writes(true);
    let store = SnapshotStore::new(kv, KEY);
    assert!(matches!(
      store.load_or_seed(epoch()).await,
      Err(Error::Storage(_))
    ));
  }
}
