use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use webtrail_core::config::{LogFormat, SiteConfig};
use webtrail_core::enrichment::{Enricher, GeoLabels, UaLabels};
use webtrail_core::ingest::NormalizedRecord;
use webtrail_core::store::{RecordStore, StoreError};

/// In-memory store capturing every inserted record.
#[derive(Default)]
pub struct CapturingStore {
    pub records: Mutex<Vec<(String, NormalizedRecord)>>,
}

impl CapturingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordStore for CapturingStore {
    async fn batch_insert(
        &self,
        site_id: &str,
        records: &[NormalizedRecord],
    ) -> Result<(), StoreError> {
        let mut held = self.records.lock().unwrap();
        for record in records {
            held.push((site_id.to_string(), record.clone()));
        }
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64, StoreError> {
        Ok(0)
    }
}

/// Enricher with fixed labels; pageviews are successful requests.
pub struct FixedEnricher;

impl Enricher for FixedEnricher {
    fn is_pageview(&self, status: u16, _path: &str, _ip: &str) -> bool {
        status == 200
    }

    fn locate(&self, _ip: &str) -> GeoLabels {
        GeoLabels {
            domestic: String::new(),
            global: "Testland".to_string(),
        }
    }

    fn user_agent(&self, _ua: &str) -> UaLabels {
        UaLabels {
            browser: "Firefox".to_string(),
            os: "Linux".to_string(),
            device: "desktop".to_string(),
        }
    }
}

pub fn nginx_site(id: &str, log_path: &str) -> SiteConfig {
    SiteConfig {
        id: id.to_string(),
        name: id.to_string(),
        log_path: log_path.to_string(),
        format: LogFormat::Nginx,
    }
}

pub fn combined_line(timestamp: DateTime<Utc>, path: &str, status: u16) -> String {
    format!(
        "198.51.100.7 - - [{}] \"GET {} HTTP/1.1\" {} 1024 \"-\" \"Mozilla/5.0 (X11; Linux x86_64) Firefox/121.0\"\n",
        timestamp.format("%d/%b/%Y:%H:%M:%S %z"),
        path,
        status,
    )
}
