#![allow(async_fn_in_trait)]

use crate::connection::Database;
use crate::error::{StoreError, StoreResult};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Identifier of a persisted record.
pub type RecordId = u16;

/// Durable key-value store of small device records.
///
/// A write replaces the whole record atomically: after it returns, a reader
/// sees either the complete old value or the complete new value.
///
/// # Implementation Note
///
/// This trait uses native async trait methods (Edition 2024 feature).
pub trait RecordStore: Send + Sync {
    /// Read a record, `None` when it was never written.
    async fn read(&self, id: RecordId) -> StoreResult<Option<Vec<u8>>>;

    /// Replace a record.
    async fn write(&self, id: RecordId, value: &[u8]) -> StoreResult<()>;
}

/// SQLite implementation of RecordStore
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Create a new SQLite record store
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn from_database(db: &Database) -> Self {
        Self::new(db.pool().clone())
    }
}

impl RecordStore for SqliteRecordStore {
    async fn read(&self, id: RecordId) -> StoreResult<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as("SELECT value FROM records WHERE id = ?")
            .bind(i64::from(id))
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    async fn write(&self, id: RecordId, value: &[u8]) -> StoreResult<()> {
        // Single statement: SQLite applies it atomically.
        sqlx::query(
            r#"
            INSERT INTO records (id, value)
            VALUES (?, ?)
            ON CONFLICT(id) DO UPDATE SET
                value = excluded.value,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            "#,
        )
        .bind(i64::from(id))
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    records: Mutex<HashMap<RecordId, Vec<u8>>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

/// In-memory RecordStore for tests and volatile deployments.
///
/// Clones share the same records, so a test can keep one clone to inspect
/// what the firmware wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    state: Arc<MemoryState>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record without counting it as a write.
    pub fn with_record(self, id: RecordId, value: &[u8]) -> Self {
        self.records().insert(id, value.to_vec());
        self
    }

    /// Snapshot of a record.
    pub fn get(&self, id: RecordId) -> Option<Vec<u8>> {
        self.records().get(&id).cloned()
    }

    /// Reject every write until cleared.
    pub fn fail_writes(&self, fail: bool) {
        self.state.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.state.writes.load(Ordering::SeqCst)
    }

    fn records(&self) -> MutexGuard<'_, HashMap<RecordId, Vec<u8>>> {
        self.state
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordStore for MemoryRecordStore {
    async fn read(&self, id: RecordId) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.get(id))
    }

    async fn write(&self, id: RecordId, value: &[u8]) -> StoreResult<()> {
        if self.state.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::write_rejected(id, "writes disabled"));
        }
        self.records().insert(id, value.to_vec());
        self.state.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_read_write() {
        let store = MemoryRecordStore::new();
        assert_eq!(store.read(1).await.unwrap(), None);

        store.write(1, &[1, 2, 3]).await.unwrap();
        assert_eq!(store.read(1).await.unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_rejects_writes_when_failing() {
        let store = MemoryRecordStore::new().with_record(2, &[0]);
        store.fail_writes(true);

        let err = store.write(2, &[1]).await.unwrap_err();
        assert!(matches!(err, StoreError::WriteRejected { record_id: 2, .. }));
        assert_eq!(store.get(2), Some(vec![0]));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_memory_store_clones_share_records() {
        let store = MemoryRecordStore::new();
        let observer = store.clone();

        store.write(7, &[0xAB]).await.unwrap();
        assert_eq!(observer.get(7), Some(vec![0xAB]));
    }

    #[tokio::test]
    async fn test_sqlite_store_upsert() {
        let db = Database::in_memory().await.unwrap();
        let store = SqliteRecordStore::from_database(&db);

        assert_eq!(store.read(1).await.unwrap(), None);

        store.write(1, &[1, 2, 3, 4, 1, 2]).await.unwrap();
        store.write(1, &[6, 5, 4, 3, 2, 1]).await.unwrap();

        assert_eq!(store.read(1).await.unwrap(), Some(vec![6, 5, 4, 3, 2, 1]));

        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM records")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }
}
