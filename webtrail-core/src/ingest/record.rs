use chrono::{DateTime, Utc};

/// One decoded and enriched access-log line. Immutable once produced;
/// ownership moves to the record store on batch submission.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub ip: String,
    pub is_pageview: bool,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    /// Percent-decoded request path.
    pub path: String,
    pub status: u16,
    pub bytes_sent: u64,
    pub referer: String,
    pub browser: String,
    pub os: String,
    pub device: String,
    pub domestic_location: String,
    pub global_location: String,
}
