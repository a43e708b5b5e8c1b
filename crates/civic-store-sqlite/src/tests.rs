//! Integration tests for `SqliteKv` against an in-memory database.

use chrono::{DateTime, Utc};
use civic_core::{database::Database, ports::KeyValueStore};

use crate::SqliteKv;

async fn store() -> SqliteKv {
  SqliteKv::open_in_memory()
    .await
    .expect("in-memory store")
}

#[tokio::test]
async fn missing_key_reads_none() {
  let s = store().await;
  assert!(s.get("civic_connect_db").await.unwrap().is_none());
}

#[tokio::test]
async fn set_then_get() {
  let s = store().await;
  s.set("k", "v1".to_owned()).await.unwrap();
  assert_eq!(s.get("k").await.unwrap().as_deref(), Some("v1"));
}

#[tokio::test]
async fn set_overwrites_single_row() {
  let s = store().await;
  s.set("k", "v1".to_owned()).await.unwrap();
  s.set("k", "v2".to_owned()).await.unwrap();
  assert_eq!(s.get("k").await.unwrap().as_deref(), Some("v2"));
  assert_eq!(s.keys().await.unwrap(), vec!["k".to_owned()]);
}

#[tokio::test]
async fn remove_is_idempotent() {
  let s = store().await;
  s.set("k", "v".to_owned()).await.unwrap();
  s.remove("k").await.unwrap();
  s.remove("k").await.unwrap();
  assert!(s.get("k").await.unwrap().is_none());
}

#[tokio::test]
async fn keys_are_isolated() {
  let s = store().await;
  s.set("a", "1".to_owned()).await.unwrap();
  s.set("b", "2".to_owned()).await.unwrap();
  assert_eq!(s.get("a").await.unwrap().as_deref(), Some("1"));
  assert_eq!(s.keys().await.unwrap(), vec!["a".to_owned(), "b".to_owned()]);
}

#[tokio::test]
async fn stores_a_full_snapshot_blob() {
  let s = store().await;
  let db = Database::seeded(DateTime::<Utc>::UNIX_EPOCH);
  s.set("civic_connect_db", db.to_json().unwrap()).await.unwrap();

  let raw = s.get("civic_connect_db").await.unwrap().unwrap();
  assert_eq!(Database::from_json(&raw).unwrap(), db);
}

#[tokio::test]
async fn persists_across_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("store.db");

  {
    let s = SqliteKv::open(&path).await.unwrap();
    s.set("k", "durable".to_owned()).await.unwrap();
  }
  let s = SqliteKv::open(&path).await.unwrap();
  assert_eq!(s.get("k").await.unwrap().as_deref(), Some("durable"));
}
