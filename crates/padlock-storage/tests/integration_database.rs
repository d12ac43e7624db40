//! Integration tests for the SQLite record backend
//!
//! These tests use in-memory and on-disk SQLite databases to check
//! migrations, persistence across reopen, and concurrent record access.
//!
//! Run with: cargo test --package padlock-storage --test integration_database

use padlock_core::{
    AccessKey,
    constants::{AUTO_CLOSE_RECORD_ID, KEY_RECORD_ID},
};
use padlock_storage::{
    Database, DatabaseConfig, KeyStore, RecordStore, SqliteRecordStore, StoreError,
};
use tempfile::TempDir;

fn file_config(dir: &TempDir) -> DatabaseConfig {
    let path = dir.path().join("padlock.db");
    DatabaseConfig::new(path.to_string_lossy().into_owned())
}

#[tokio::test]
async fn test_in_memory_database() {
    let db = Database::in_memory().await.unwrap();
    db.health_check().await.unwrap();
    db.close().await;
}

#[tokio::test]
async fn test_migration_idempotency() {
    let db = Database::in_memory().await.unwrap();

    db.migrate().await.unwrap();
    db.migrate().await.unwrap();

    let result: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='records'")
            .fetch_one(db.pool())
            .await
            .unwrap();

    assert_eq!(result.0, 1);

    db.close().await;
}

#[tokio::test]
async fn test_key_store_first_boot_on_sqlite() {
    let db = Database::in_memory().await.unwrap();
    let records = SqliteRecordStore::from_database(&db);

    let store = KeyStore::open(records.clone()).await.unwrap();

    assert_eq!(store.get_key(), AccessKey::default());
    assert!(!store.get_auto_close());
    assert_eq!(
        records.read(KEY_RECORD_ID).await.unwrap(),
        Some(vec![1, 2, 3, 4, 1, 2])
    );
    assert_eq!(
        records.read(AUTO_CLOSE_RECORD_ID).await.unwrap(),
        Some(vec![0])
    );
}

#[tokio::test]
async fn test_key_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let new_key = AccessKey::new([2, 2, 4, 4, 1, 3]);

    {
        let db = Database::new(file_config(&dir)).await.unwrap();
        let mut store = KeyStore::open(SqliteRecordStore::from_database(&db))
            .await
            .unwrap();
        store.set_key(new_key).await.unwrap();
        store.set_auto_close(true).await.unwrap();
        db.close().await;
    }

    let db = Database::new(file_config(&dir)).await.unwrap();
    let store = KeyStore::open(SqliteRecordStore::from_database(&db))
        .await
        .unwrap();

    assert_eq!(store.get_key(), new_key);
    assert!(store.get_auto_close());
    assert!(store.boot_faults().is_empty());
    db.close().await;
}

#[tokio::test]
async fn test_truncated_key_record_is_repaired() {
    let db = Database::in_memory().await.unwrap();
    let records = SqliteRecordStore::from_database(&db);
    records.write(KEY_RECORD_ID, &[1, 2, 3, 4]).await.unwrap();

    let store = KeyStore::open(records.clone()).await.unwrap();

    assert_eq!(store.get_key(), AccessKey::default());
    assert!(matches!(
        store.boot_faults(),
        [StoreError::Corrupt { record_id: 1, .. }]
    ));
    assert_eq!(
        records.read(KEY_RECORD_ID).await.unwrap(),
        Some(vec![1, 2, 3, 4, 1, 2])
    );
}

#[tokio::test]
async fn test_concurrent_writes_leave_one_whole_value() {
    let dir = TempDir::new().unwrap();
    let db = Database::new(file_config(&dir).max_connections(4))
        .await
        .unwrap();

    let keys: Vec<[u8; 6]> = (0..8u8).map(|i| [i; 6]).collect();
    let handles: Vec<_> = keys
        .iter()
        .map(|&key| {
            let records = SqliteRecordStore::from_database(&db);
            tokio::spawn(async move { records.write(KEY_RECORD_ID, &key).await })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    let stored = SqliteRecordStore::from_database(&db)
        .read(KEY_RECORD_ID)
        .await
        .unwrap()
        .unwrap();
    assert!(keys.iter().any(|k| k.as_slice() == stored.as_slice()));

    db.close().await;
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_connecting() {
    let result = Database::new(DatabaseConfig::new("x.db").max_connections(0)).await;
    assert!(matches!(result, Err(StoreError::Configuration(_))));
}
