mod combined;
mod structured;

pub use combined::CombinedDecoder;
pub use structured::StructuredDecoder;

use crate::config::LogFormat;
use crate::enrichment::Enricher;
use crate::ingest::NormalizedRecord;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Records older than this at decode time are dropped on ingestion,
/// independently of the store's own retention job.
pub const MAX_RECORD_AGE_DAYS: i64 = 31;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("line does not match the combined log format")]
    FormatMismatch,

    #[error("unparseable timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("record is older than {MAX_RECORD_AGE_DAYS} days")]
    TooOld,

    #[error("invalid structured log line: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unparseable request url: {0}")]
    Url(#[from] url::ParseError),
}

/// Closed set of line decoders, selected once per file from the site's
/// configured log format. Decoders are pure functions of (line, now) plus
/// the shared enricher, so one instance is safely used across files.
pub enum LineDecoder {
    Combined(CombinedDecoder),
    Structured(StructuredDecoder),
}

impl LineDecoder {
    pub fn for_format(format: LogFormat, enricher: Arc<dyn Enricher>) -> Self {
        match format {
            LogFormat::Nginx => Self::Combined(CombinedDecoder::new(enricher)),
            LogFormat::Json => Self::Structured(StructuredDecoder::new(enricher)),
        }
    }

    pub fn decode(
        &self,
        line: &str,
        now: DateTime<Utc>,
    ) -> Result<NormalizedRecord, DecodeError> {
        match self {
            Self::Combined(d) => d.decode(line, now),
            Self::Structured(d) => d.decode(line, now),
        }
    }
}

pub(crate) fn cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - chrono::Duration::days(MAX_RECORD_AGE_DAYS)
}
