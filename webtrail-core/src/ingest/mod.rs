pub mod decode;
mod record;
mod scanner;
mod state;

#[cfg(test)]
pub(crate) mod tests;

pub use record::NormalizedRecord;
pub use scanner::{BATCH_SIZE, ScanFileError, scan_file};
pub use state::{FileState, ScanStateStore, SiteScanState};

use crate::config::SiteConfig;
use crate::enrichment::Enricher;
use crate::ingest::decode::LineDecoder;
use crate::store::RecordStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, warn};

/// Why a whole site's pass failed. File-level decode problems never end up
/// here; only total-file-access and path-resolution failures do.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("invalid log path pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("log path pattern {pattern} matched no files")]
    NoMatches { pattern: String },

    #[error(transparent)]
    File(#[from] ScanFileError),
}

/// Per-site result of one ingestion pass. Emitted for every configured
/// site, including those with zero new entries.
#[derive(Debug)]
pub struct ScanOutcome {
    pub site_name: String,
    pub site_id: String,
    pub total_entries: u64,
    pub elapsed: Duration,
    pub success: bool,
    pub error: Option<SiteError>,
}

impl ScanOutcome {
    fn new(site: &SiteConfig) -> Self {
        Self {
            site_name: site.name.clone(),
            site_id: site.id.clone(),
            total_entries: 0,
            elapsed: Duration::ZERO,
            success: true,
            error: None,
        }
    }

    fn fail(&mut self, error: SiteError) {
        self.success = false;
        self.error = Some(error);
    }
}

/// Fans the file scanner out across all configured sites and the files their
/// log-path patterns match, then persists the scan state once per pass.
pub struct LogIngestor {
    sites: Vec<SiteConfig>,
    state: ScanStateStore,
    store: Arc<dyn RecordStore>,
    enricher: Arc<dyn Enricher>,
}

impl LogIngestor {
    pub fn new(
        sites: Vec<SiteConfig>,
        state_path: impl Into<PathBuf>,
        store: Arc<dyn RecordStore>,
        enricher: Arc<dyn Enricher>,
    ) -> Self {
        Self {
            sites,
            state: ScanStateStore::load(state_path),
            store,
            enricher,
        }
    }

    /// Run one ingestion pass over every site, in configuration order. One
    /// site's failure never affects the others.
    pub async fn run_pass(&mut self) -> Vec<ScanOutcome> {
        let mut outcomes = Vec::with_capacity(self.sites.len());

        for site in self.sites.clone() {
            let started = Instant::now();
            let mut outcome = ScanOutcome::new(&site);
            let decoder = LineDecoder::for_format(site.format, self.enricher.clone());

            if site.log_path.contains('*') {
                self.scan_glob(&site, &decoder, &mut outcome).await;
            } else {
                self.scan_literal(&site, &decoder, &mut outcome).await;
            }

            outcome.elapsed = started.elapsed();
            outcomes.push(outcome);
        }

        if let Err(e) = self.state.save() {
            error!(error = %e, "failed to persist scan state");
        }

        outcomes
    }

    /// A glob pattern must expand and match at least one file; the matched
    /// files themselves fail soft so one bad file cannot hide its siblings.
    async fn scan_glob(
        &mut self,
        site: &SiteConfig,
        decoder: &LineDecoder,
        outcome: &mut ScanOutcome,
    ) {
        let paths = match glob::glob(&site.log_path) {
            Ok(matches) => {
                let mut paths: Vec<PathBuf> = matches.filter_map(Result::ok).collect();
                paths.sort();
                paths
            }
            Err(e) => {
                outcome.fail(SiteError::Pattern {
                    pattern: site.log_path.clone(),
                    source: e,
                });
                return;
            }
        };

        if paths.is_empty() {
            outcome.fail(SiteError::NoMatches {
                pattern: site.log_path.clone(),
            });
            return;
        }

        for path in &paths {
            match self.scan_one(site, decoder, path).await {
                Ok(entries) => outcome.total_entries += entries,
                Err(e) => {
                    warn!(site = %site.id, error = %e, "skipping unreadable file");
                }
            }
        }
    }

    /// A literal path that cannot be read is a site-level failure.
    async fn scan_literal(
        &mut self,
        site: &SiteConfig,
        decoder: &LineDecoder,
        outcome: &mut ScanOutcome,
    ) {
        let path = Path::new(&site.log_path).to_path_buf();
        match self.scan_one(site, decoder, &path).await {
            Ok(entries) => outcome.total_entries += entries,
            Err(e) => {
                warn!(site = %site.id, error = %e, "site log file unreadable");
                outcome.fail(e.into());
            }
        }
    }

    async fn scan_one(
        &mut self,
        site: &SiteConfig,
        decoder: &LineDecoder,
        path: &Path,
    ) -> Result<u64, ScanFileError> {
        scan_file(&mut self.state, self.store.as_ref(), decoder, &site.id, path).await
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &ScanStateStore {
        &self.state
    }
}
