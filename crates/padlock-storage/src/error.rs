use padlock_core::constants::{AUTO_CLOSE_RECORD_ID, KEY_RECORD_ID};
use thiserror::Error;

/// Storage-specific error types for the padlock record store.
///
/// These errors represent failures to read or write the persisted device
/// records and integrity problems found in them at boot.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Stored record does not decode
    #[error("Corrupt record {} ({record_id}): {detail}", record_name(*record_id))]
    Corrupt { record_id: u16, detail: String },

    /// Backend refused the write
    #[error("Write to record {record_id} rejected: {reason}")]
    WriteRejected { record_id: u16, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    pub fn corrupt(record_id: u16, detail: impl Into<String>) -> Self {
        Self::Corrupt {
            record_id,
            detail: detail.into(),
        }
    }

    pub fn write_rejected(record_id: u16, reason: impl Into<String>) -> Self {
        Self::WriteRejected {
            record_id,
            reason: reason.into(),
        }
    }
}

fn record_name(record_id: u16) -> &'static str {
    match record_id {
        KEY_RECORD_ID => "access key",
        AUTO_CLOSE_RECORD_ID => "auto-close flag",
        _ => "unknown",
    }
}

/// Specialized result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
