use crate::ingest::NormalizedRecord;
use crate::store::{RecordStore, StoreError};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS access_logs (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id           TEXT    NOT NULL,
    ip                TEXT    NOT NULL,
    is_pageview       INTEGER NOT NULL,
    timestamp         TEXT    NOT NULL,
    method            TEXT    NOT NULL,
    path              TEXT    NOT NULL,
    status            INTEGER NOT NULL,
    bytes_sent        INTEGER NOT NULL,
    referer           TEXT    NOT NULL,
    browser           TEXT    NOT NULL,
    os                TEXT    NOT NULL,
    device            TEXT    NOT NULL,
    domestic_location TEXT    NOT NULL,
    global_location   TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_access_logs_site_ts ON access_logs (site_id, timestamp);
"#;

const INSERT: &str = "INSERT INTO access_logs \
    (site_id, ip, is_pageview, timestamp, method, path, status, bytes_sent, \
     referer, browser, os, device, domestic_location, global_location) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// SQLite-backed [`RecordStore`]. Rows are plain inserts with no
/// deduplication, matching the at-least-once contract.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    retention_days: u32,
}

impl SqliteStore {
    /// Open or create the database at the given path and ensure the schema.
    pub async fn open(path: impl AsRef<Path>, retention_days: u32) -> Result<Self, StoreError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let url = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        sqlx::raw_sql(SCHEMA).execute(&pool).await?;

        info!(path = %path.display(), "access log store opened");

        Ok(Self {
            pool,
            retention_days,
        })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn batch_insert(
        &self,
        site_id: &str,
        records: &[NormalizedRecord],
    ) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(INSERT)
                .bind(site_id)
                .bind(&record.ip)
                .bind(record.is_pageview)
                .bind(record.timestamp)
                .bind(&record.method)
                .bind(&record.path)
                .bind(record.status as i64)
                .bind(record.bytes_sent as i64)
                .bind(&record.referer)
                .bind(&record.browser)
                .bind(&record.os)
                .bind(&record.device)
                .bind(&record.domestic_location)
                .bind(&record.global_location)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64, StoreError> {
        let cutoff = Utc::now() - Duration::days(i64::from(self.retention_days));
        let result = sqlx::query("DELETE FROM access_logs WHERE timestamp < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
