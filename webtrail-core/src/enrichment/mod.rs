mod geoip;
mod pageview;
mod user_agent;

pub use geoip::GeoReader;
pub use pageview::PageviewPolicy;
pub use user_agent::UaClassifier;

use crate::config::EnrichmentConfig;

/// Per-record annotation used by the line decoders: pageview classification,
/// geo-IP labels, and user-agent classification. Implementations are pure
/// lookups and safe to share across files.
pub trait Enricher: Send + Sync {
    fn is_pageview(&self, status: u16, path: &str, ip: &str) -> bool;

    fn locate(&self, ip: &str) -> GeoLabels;

    fn user_agent(&self, ua: &str) -> UaLabels;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoLabels {
    /// Subdivision label when the address resolves inside the home country,
    /// empty otherwise.
    pub domestic: String,
    /// Country label, empty when unresolvable.
    pub global: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UaLabels {
    pub browser: String,
    pub os: String,
    pub device: String,
}

/// Production enricher: MaxMind geo lookups, woothee user-agent parsing,
/// and the configured pageview policy.
pub struct GeoUaEnricher {
    geo: GeoReader,
    ua: UaClassifier,
    pageview: PageviewPolicy,
}

impl GeoUaEnricher {
    pub fn from_config(config: &EnrichmentConfig) -> anyhow::Result<Self> {
        Ok(Self {
            geo: GeoReader::open(
                config.geoip_city_db.as_deref(),
                config.home_country.as_deref(),
            )?,
            ua: UaClassifier::new(),
            pageview: PageviewPolicy::new(&config.exclude_networks)?,
        })
    }
}

impl Enricher for GeoUaEnricher {
    fn is_pageview(&self, status: u16, path: &str, ip: &str) -> bool {
        self.pageview.is_pageview(status, path, ip)
    }

    fn locate(&self, ip: &str) -> GeoLabels {
        self.geo.locate(ip)
    }

    fn user_agent(&self, ua: &str) -> UaLabels {
        self.ua.classify(ua)
    }
}
