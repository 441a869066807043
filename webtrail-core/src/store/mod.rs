mod sqlite;

pub use sqlite::SqliteStore;

use crate::ingest::NormalizedRecord;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to create data directory: {0}")]
    DataDir(#[from] std::io::Error),
}

/// Durable row storage for decoded records.
///
/// Delivery is at-least-once: the scan offset is saved after, not atomically
/// with, batch inserts, so a crash in between can re-deliver up to one batch
/// on restart. Implementations must tolerate duplicate rows.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn batch_insert(
        &self,
        site_id: &str,
        records: &[NormalizedRecord],
    ) -> Result<(), StoreError>;

    /// Delete rows past the retention window. Returns the number removed.
    async fn cleanup_expired(&self) -> Result<u64, StoreError>;
}
