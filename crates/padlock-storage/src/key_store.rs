//! Cached access key and auto-close flag over a [`RecordStore`].

use crate::error::{StoreError, StoreResult};
use crate::record::RecordStore;
use padlock_core::{
    AccessKey,
    constants::{AUTO_CLOSE_RECORD_ID, DEFAULT_AUTO_CLOSE, KEY_LENGTH, KEY_RECORD_ID},
};
use tracing::{debug, info, warn};

/// Persisted secret and auto-close flag, cached in memory.
///
/// Reads never touch the backend. Writes go to the backend first and update
/// the cache only once the backend accepted them, so a failed write leaves
/// the previous value in effect.
///
/// # Examples
///
/// ```
/// use padlock_core::AccessKey;
/// use padlock_storage::{KeyStore, MemoryRecordStore};
///
/// # async fn example() -> padlock_storage::StoreResult<()> {
/// let mut store = KeyStore::open(MemoryRecordStore::new()).await?;
/// assert_eq!(store.get_key(), AccessKey::default());
///
/// store.set_key(AccessKey::new([4, 4, 3, 3, 2, 2])).await?;
/// assert_eq!(store.get_key(), AccessKey::new([4, 4, 3, 3, 2, 2]));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct KeyStore<R> {
    records: R,
    key: AccessKey,
    auto_close: bool,
    boot_faults: Vec<StoreError>,
}

impl<R: RecordStore> KeyStore<R> {
    /// Load both records, writing defaults back for missing ones.
    ///
    /// A record that does not decode is recorded as
    /// [`StoreError::Corrupt`] in [`boot_faults`](Self::boot_faults) and
    /// replaced by the default. A failed default write-back is recorded the
    /// same way; the default stays in effect for this session.
    ///
    /// # Errors
    ///
    /// Returns an error if a record could not be read at all.
    pub async fn open(records: R) -> StoreResult<Self> {
        let mut boot_faults = Vec::new();

        let key = match records.read(KEY_RECORD_ID).await? {
            Some(bytes) => decode_key(&bytes)
                .map_err(|e| {
                    warn!("{}; restoring default key", e);
                    boot_faults.push(e);
                })
                .ok(),
            None => None,
        };
        let key = match key {
            Some(key) => key,
            None => {
                let key = AccessKey::default();
                write_default(&records, KEY_RECORD_ID, key.as_bytes(), &mut boot_faults).await;
                key
            }
        };

        let auto_close = match records.read(AUTO_CLOSE_RECORD_ID).await? {
            Some(bytes) => decode_flag(&bytes)
                .map_err(|e| {
                    warn!("{}; restoring default auto-close flag", e);
                    boot_faults.push(e);
                })
                .ok(),
            None => None,
        };
        let auto_close = match auto_close {
            Some(flag) => flag,
            None => {
                write_default(
                    &records,
                    AUTO_CLOSE_RECORD_ID,
                    &[u8::from(DEFAULT_AUTO_CLOSE)],
                    &mut boot_faults,
                )
                .await;
                DEFAULT_AUTO_CLOSE
            }
        };

        info!("Key store loaded (auto-close: {})", auto_close);
        Ok(Self {
            records,
            key,
            auto_close,
            boot_faults,
        })
    }

    pub fn get_key(&self) -> AccessKey {
        self.key
    }

    pub fn get_auto_close(&self) -> bool {
        self.auto_close
    }

    /// Replace the access key.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the cached key is unchanged.
    pub async fn set_key(&mut self, key: AccessKey) -> StoreResult<()> {
        self.records.write(KEY_RECORD_ID, key.as_bytes()).await?;
        self.key = key;
        info!("Access key updated");
        Ok(())
    }

    /// Replace the auto-close flag.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the cached flag is unchanged.
    pub async fn set_auto_close(&mut self, enabled: bool) -> StoreResult<()> {
        self.records
            .write(AUTO_CLOSE_RECORD_ID, &[u8::from(enabled)])
            .await?;
        self.auto_close = enabled;
        info!("Auto-close set to {}", enabled);
        Ok(())
    }

    /// Problems found and repaired while opening the store.
    pub fn boot_faults(&self) -> &[StoreError] {
        &self.boot_faults
    }

    pub fn records(&self) -> &R {
        &self.records
    }
}

fn decode_key(bytes: &[u8]) -> StoreResult<AccessKey> {
    AccessKey::from_slice(bytes).map_err(|_| {
        StoreError::corrupt(
            KEY_RECORD_ID,
            format!("expected {} bytes, got {}", KEY_LENGTH, bytes.len()),
        )
    })
}

fn decode_flag(bytes: &[u8]) -> StoreResult<bool> {
    match bytes {
        [0] => Ok(false),
        [1] => Ok(true),
        [other] => Err(StoreError::corrupt(
            AUTO_CLOSE_RECORD_ID,
            format!("invalid flag value {:#04x}", other),
        )),
        _ => Err(StoreError::corrupt(
            AUTO_CLOSE_RECORD_ID,
            format!("expected 1 byte, got {}", bytes.len()),
        )),
    }
}

async fn write_default<R: RecordStore>(
    records: &R,
    id: u16,
    value: &[u8],
    faults: &mut Vec<StoreError>,
) {
    match records.write(id, value).await {
        Ok(()) => debug!("Wrote default for record {}", id),
        Err(e) => {
            warn!("Failed to write default for record {}: {}", id, e);
            faults.push(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MemoryRecordStore;
    use rstest::rstest;

    #[tokio::test]
    async fn test_first_boot_writes_defaults() {
        let records = MemoryRecordStore::new();
        let store = KeyStore::open(records.clone()).await.unwrap();

        assert_eq!(store.get_key(), AccessKey::default());
        assert!(!store.get_auto_close());
        assert!(store.boot_faults().is_empty());

        assert_eq!(records.get(KEY_RECORD_ID), Some(vec![1, 2, 3, 4, 1, 2]));
        assert_eq!(records.get(AUTO_CLOSE_RECORD_ID), Some(vec![0]));
        assert_eq!(records.write_count(), 2);
    }

    #[tokio::test]
    async fn test_existing_records_are_loaded_without_writes() {
        let records = MemoryRecordStore::new()
            .with_record(KEY_RECORD_ID, &[9, 8, 7, 6, 5, 4])
            .with_record(AUTO_CLOSE_RECORD_ID, &[1]);

        let store = KeyStore::open(records.clone()).await.unwrap();

        assert_eq!(store.get_key(), AccessKey::new([9, 8, 7, 6, 5, 4]));
        assert!(store.get_auto_close());
        assert_eq!(records.write_count(), 0);
    }

    #[rstest]
    #[case(&[1, 2, 3])]
    #[case(&[1, 2, 3, 4, 5, 6, 7])]
    #[case(&[])]
    #[tokio::test]
    async fn test_corrupt_key_is_replaced_by_default(#[case] stored: &[u8]) {
        let records = MemoryRecordStore::new()
            .with_record(KEY_RECORD_ID, stored)
            .with_record(AUTO_CLOSE_RECORD_ID, &[0]);

        let store = KeyStore::open(records.clone()).await.unwrap();

        assert_eq!(store.get_key(), AccessKey::default());
        assert!(matches!(
            store.boot_faults(),
            [StoreError::Corrupt {
                record_id: KEY_RECORD_ID,
                ..
            }]
        ));
        assert_eq!(records.get(KEY_RECORD_ID), Some(vec![1, 2, 3, 4, 1, 2]));
    }

    #[rstest]
    #[case(&[2])]
    #[case(&[0, 0])]
    #[tokio::test]
    async fn test_corrupt_flag_is_replaced_by_default(#[case] stored: &[u8]) {
        let records = MemoryRecordStore::new().with_record(AUTO_CLOSE_RECORD_ID, stored);

        let store = KeyStore::open(records.clone()).await.unwrap();

        assert!(!store.get_auto_close());
        assert_eq!(store.boot_faults().len(), 1);
        assert_eq!(records.get(AUTO_CLOSE_RECORD_ID), Some(vec![0]));
    }

    #[tokio::test]
    async fn test_failed_default_write_is_reported() {
        let records = MemoryRecordStore::new();
        records.fail_writes(true);

        let store = KeyStore::open(records).await.unwrap();

        assert_eq!(store.get_key(), AccessKey::default());
        assert_eq!(store.boot_faults().len(), 2);
    }

    #[tokio::test]
    async fn test_set_key_writes_through() {
        let records = MemoryRecordStore::new();
        let mut store = KeyStore::open(records.clone()).await.unwrap();

        let key = AccessKey::new([4, 3, 2, 1, 4, 3]);
        store.set_key(key).await.unwrap();

        assert_eq!(store.get_key(), key);
        assert_eq!(records.get(KEY_RECORD_ID), Some(key.as_bytes().to_vec()));
    }

    #[tokio::test]
    async fn test_failed_set_key_keeps_cached_key() {
        let records = MemoryRecordStore::new();
        let mut store = KeyStore::open(records.clone()).await.unwrap();
        records.fail_writes(true);

        let result = store.set_key(AccessKey::new([0; 6])).await;

        assert!(matches!(result, Err(StoreError::WriteRejected { .. })));
        assert_eq!(store.get_key(), AccessKey::default());
        assert_eq!(records.get(KEY_RECORD_ID), Some(vec![1, 2, 3, 4, 1, 2]));
    }

    #[tokio::test]
    async fn test_set_auto_close_write_through_and_failure() {
        let records = MemoryRecordStore::new();
        let mut store = KeyStore::open(records.clone()).await.unwrap();

        store.set_auto_close(true).await.unwrap();
        assert!(store.get_auto_close());
        assert_eq!(records.get(AUTO_CLOSE_RECORD_ID), Some(vec![1]));

        records.fail_writes(true);
        assert!(store.set_auto_close(false).await.is_err());
        assert!(store.get_auto_close());
    }
}
