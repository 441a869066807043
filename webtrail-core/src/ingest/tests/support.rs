use crate::config::LogFormat;
use crate::enrichment::{Enricher, GeoLabels, UaLabels};
use crate::ingest::NormalizedRecord;
use crate::ingest::decode::LineDecoder;
use crate::store::{RecordStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

/// Capturing store double: remembers every submitted batch size and record.
#[derive(Default)]
pub struct MemoryStore {
    pub batch_sizes: Mutex<Vec<usize>>,
    pub records: Mutex<Vec<NormalizedRecord>>,
    pub cleanup_calls: Mutex<usize>,
    pub fail_inserts: bool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn total_records(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn batch_insert(
        &self,
        _site_id: &str,
        records: &[NormalizedRecord],
    ) -> Result<(), StoreError> {
        if self.fail_inserts {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        self.batch_sizes.lock().unwrap().push(records.len());
        self.records.lock().unwrap().extend_from_slice(records);
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64, StoreError> {
        *self.cleanup_calls.lock().unwrap() += 1;
        Ok(0)
    }
}

/// Fixed-label enricher so decoder tests assert exact values.
pub struct StubEnricher;

impl Enricher for StubEnricher {
    fn is_pageview(&self, status: u16, _path: &str, _ip: &str) -> bool {
        status == 200
    }

    fn locate(&self, _ip: &str) -> GeoLabels {
        GeoLabels {
            domestic: "Testshire".to_string(),
            global: "Testland".to_string(),
        }
    }

    fn user_agent(&self, _ua: &str) -> UaLabels {
        UaLabels {
            browser: "TestBrowser".to_string(),
            os: "TestOS".to_string(),
            device: "desktop".to_string(),
        }
    }
}

pub fn combined_decoder() -> LineDecoder {
    LineDecoder::for_format(LogFormat::Nginx, Arc::new(StubEnricher))
}

pub fn structured_decoder() -> LineDecoder {
    LineDecoder::for_format(LogFormat::Json, Arc::new(StubEnricher))
}

/// A well-formed combined-format line with the given timestamp and status.
pub fn combined_line(timestamp: DateTime<Utc>, path: &str, status: u16) -> String {
    format!(
        "93.184.216.34 - - [{}] \"GET {} HTTP/1.1\" {} 512 \"-\" \"Mozilla/5.0\"",
        timestamp.format("%d/%b/%Y:%H:%M:%S %z"),
        path,
        status,
    )
}
