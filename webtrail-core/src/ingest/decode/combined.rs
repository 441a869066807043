use crate::enrichment::Enricher;
use crate::ingest::NormalizedRecord;
use crate::ingest::decode::{DecodeError, cutoff};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::sync::Arc;

/// `addr - user [time] "METHOD path HTTP/ver" status bytes "referer" "user-agent"`
static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(\S+) - (\S+) \[([^\]]+)\] "(\S+) ([^"]+) HTTP/\d\.\d" (\d+) (\d+) "([^"]*)" "([^"]*)""#,
    )
    .expect("combined log pattern")
});

const TIME_LAYOUT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Decoder for the classic combined access-log grammar.
pub struct CombinedDecoder {
    enricher: Arc<dyn Enricher>,
}

impl CombinedDecoder {
    pub fn new(enricher: Arc<dyn Enricher>) -> Self {
        Self { enricher }
    }

    pub fn decode(
        &self,
        line: &str,
        now: DateTime<Utc>,
    ) -> Result<NormalizedRecord, DecodeError> {
        let caps = LINE_RE.captures(line).ok_or(DecodeError::FormatMismatch)?;

        let timestamp = DateTime::parse_from_str(&caps[3], TIME_LAYOUT)?.with_timezone(&Utc);
        if timestamp < cutoff(now) {
            return Err(DecodeError::TooOld);
        }

        let ip = caps[1].to_string();
        let method = caps[4].to_string();
        let path = percent_decode(&caps[5]);
        // Digits by grammar; only overflow can fail here.
        let status: u16 = caps[6].parse().unwrap_or(0);
        let bytes_sent: u64 = caps[7].parse().unwrap_or(0);
        let referer = percent_decode(&caps[8]);
        let user_agent = &caps[9];

        let is_pageview = self.enricher.is_pageview(status, &path, &ip);
        let geo = self.enricher.locate(&ip);
        let ua = self.enricher.user_agent(user_agent);

        Ok(NormalizedRecord {
            ip,
            is_pageview,
            timestamp,
            method,
            path,
            status,
            bytes_sent,
            referer,
            browser: ua.browser,
            os: ua.os,
            device: ua.device,
            domestic_location: geo.domestic,
            global_location: geo.global,
        })
    }
}

/// Percent-decode, falling back to the raw string on invalid UTF-8 rather
/// than rejecting the line.
fn percent_decode(raw: &str) -> String {
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}
