mod error;

pub use error::ConfigError;

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Directory holding the SQLite database and the scan state file.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Operational log file. Logs go to stdout when unset.
    pub log_file: Option<PathBuf>,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub retention: RetentionConfig,

    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    #[serde(default)]
    pub sites: Vec<SiteConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds between scheduler cycles.
    pub interval_secs: u64,

    /// Local hour (0-23) during which the daily retention cleanup may run.
    pub maintenance_hour: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            maintenance_hour: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Rows older than this are removed by the daily cleanup.
    pub days: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self { days: 45 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// MaxMind city database. Geo labels stay empty when unset.
    pub geoip_city_db: Option<PathBuf>,

    /// ISO country code whose subdivisions fill the domestic label.
    pub home_country: Option<String>,

    /// CIDR blocks whose requests never count as pageviews.
    pub exclude_networks: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub id: String,

    pub name: String,

    /// Literal path, or a pattern with a `*` glob segment.
    pub log_path: String,

    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Nginx,
    Json,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::parse(path, e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.schedule.interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        if self.schedule.maintenance_hour > 23 {
            return Err(ConfigError::InvalidMaintenanceHour {
                hour: self.schedule.maintenance_hour,
            });
        }

        let mut seen = HashSet::new();
        for site in &self.sites {
            if site.id.is_empty() {
                return Err(ConfigError::EmptySiteId {
                    name: site.name.clone(),
                });
            }
            if site.log_path.is_empty() {
                return Err(ConfigError::EmptyLogPath {
                    id: site.id.clone(),
                });
            }
            if !seen.insert(site.id.as_str()) {
                return Err(ConfigError::DuplicateSite {
                    id: site.id.clone(),
                });
            }
        }

        for value in &self.enrichment.exclude_networks {
            value
                .parse::<ipnet::IpNet>()
                .map_err(|e| ConfigError::InvalidNetwork {
                    value: value.clone(),
                    source: e,
                })?;
        }

        Ok(())
    }
}
