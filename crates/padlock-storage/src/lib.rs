//! Persistence for the padlock firmware.
//!
//! The device persists two small records: the 6-byte access key (record 1)
//! and the 1-byte auto-close flag (record 2). [`KeyStore`] caches both and
//! writes through to any [`RecordStore`] backend.
//!
//! # Backends
//!
//! - [`SqliteRecordStore`] - SQLite table upserted one record per statement,
//!   over a [`Database`] pool with automatic migrations
//! - [`MemoryRecordStore`] - volatile map with write fault injection, for tests
//!
//! # Examples
//!
//! ```no_run
//! use padlock_storage::{Database, DatabaseConfig, KeyStore, SqliteRecordStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("padlock.db")).await?;
//! let store = KeyStore::open(SqliteRecordStore::from_database(&db)).await?;
//!
//! for fault in store.boot_faults() {
//!     eprintln!("repaired at boot: {fault}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Atomicity
//!
//! Each record write is a single SQL statement, so a reader never observes a
//! partially written key. `synchronous = FULL` makes a completed write
//! durable before it returns.

pub mod connection;
pub mod error;
pub mod key_store;
pub mod record;

pub use connection::{Database, DatabaseConfig};
pub use error::{StoreError, StoreResult};
pub use key_store::KeyStore;
pub use record::{MemoryRecordStore, RecordId, RecordStore, SqliteRecordStore};
