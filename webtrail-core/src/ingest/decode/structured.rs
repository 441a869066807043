use crate::enrichment::Enricher;
use crate::ingest::NormalizedRecord;
use crate::ingest::decode::{DecodeError, cutoff};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

const TIME_LAYOUT: &str = "%Y/%m/%d %H:%M:%S%.3f";
const LOOPBACK_V6: &str = "::1";

/// One line-delimited JSON log entry. Field names follow the application
/// logger that produces these files.
#[derive(Debug, Deserialize)]
struct StructuredLine {
    #[serde(rename = "@timestamp")]
    timestamp: String,

    #[serde(rename = "aspnet-request-method", default)]
    method: String,

    #[serde(rename = "aspnet-request-url", default)]
    url: String,

    #[serde(rename = "aspnet-request-ip", default)]
    ip: String,

    #[serde(rename = "aspnet-request-headers", default)]
    headers: String,
}

/// Decoder for line-delimited structured (JSON) logs. The format carries no
/// status or byte count, so status defaults to 200 and bytes to 0.
pub struct StructuredDecoder {
    enricher: Arc<dyn Enricher>,
}

impl StructuredDecoder {
    pub fn new(enricher: Arc<dyn Enricher>) -> Self {
        Self { enricher }
    }

    pub fn decode(
        &self,
        line: &str,
        now: DateTime<Utc>,
    ) -> Result<NormalizedRecord, DecodeError> {
        let entry: StructuredLine = serde_json::from_str(line)?;

        let naive = NaiveDateTime::parse_from_str(&entry.timestamp, TIME_LAYOUT)?;
        // Timestamps are written in server-local time without an offset.
        let timestamp = match Local.from_local_datetime(&naive).earliest() {
            Some(local) => local.with_timezone(&Utc),
            None => Utc.from_utc_datetime(&naive),
        };
        if timestamp < cutoff(now) {
            return Err(DecodeError::TooOld);
        }

        let url = Url::parse(&entry.url)?;
        let path = url.path().to_string();
        // The record has no query column; the query string rides in referer.
        let referer = url.query().unwrap_or_default().to_string();

        let ip = client_ip(&entry.ip, &entry.headers);
        let user_agent = header_value(&entry.headers, "User-Agent=");

        let status = 200;
        let is_pageview = self.enricher.is_pageview(status, &path, &ip);
        let geo = self.enricher.locate(&ip);
        let ua = self.enricher.user_agent(&user_agent);

        Ok(NormalizedRecord {
            ip,
            is_pageview,
            timestamp,
            method: entry.method,
            path,
            status,
            bytes_sent: 0,
            referer,
            browser: ua.browser,
            os: ua.os,
            device: ua.device,
            domestic_location: geo.domestic,
            global_location: geo.global,
        })
    }
}

/// The explicit IP field wins unless it is empty or the loopback literal, in
/// which case the proxy headers are consulted. Empty when nothing resolves.
fn client_ip(ip: &str, headers: &str) -> String {
    if !ip.is_empty() && ip != LOOPBACK_V6 {
        return ip.to_string();
    }

    for marker in ["X-Real-IP=", "X-Forwarded-For="] {
        let value = header_value(headers, marker);
        if !value.is_empty() {
            return value;
        }
    }

    String::new()
}

/// First comma-separated token after `marker` in the raw headers blob.
fn header_value(headers: &str, marker: &str) -> String {
    headers
        .split_once(marker)
        .and_then(|(_, rest)| rest.split(',').next())
        .map(|token| token.trim().to_string())
        .unwrap_or_default()
}
