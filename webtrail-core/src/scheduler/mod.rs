mod cleanup;

pub use cleanup::CleanupState;

use crate::ingest::LogIngestor;
use crate::logging::LogFile;
use crate::store::RecordStore;
use chrono::Local;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Drives the periodic maintenance cycle: rotate the operational log, run
/// the daily retention cleanup, then one full ingestion pass. Runs the cycle
/// once at startup, then on every tick until shutdown is signaled. A long
/// cycle delays the next tick rather than overlapping it, so at most one
/// ingestion pass is ever active.
pub struct Scheduler {
    interval: Duration,
    ingestor: LogIngestor,
    store: Arc<dyn RecordStore>,
    log_file: Option<LogFile>,
    cleanup: CleanupState,
}

impl Scheduler {
    pub fn new(
        interval: Duration,
        maintenance_hour: u32,
        ingestor: LogIngestor,
        store: Arc<dyn RecordStore>,
        log_file: Option<LogFile>,
    ) -> Self {
        Self {
            interval,
            ingestor,
            store,
            log_file,
            cleanup: CleanupState::new(maintenance_hour),
        }
    }

    /// Loop until `shutdown` flips to true. Cancellation is cooperative: it
    /// is only observed between cycles, and an in-flight cycle finishes.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        // Initial cycle so a restart never waits a full interval.
        self.run_cycle().await;

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval() fires immediately; the startup cycle already ran.
        ticker.tick().await;

        let mut iteration = 0u64;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    iteration += 1;
                    info!(iteration, "periodic tasks starting");
                    self.run_cycle().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("scheduler stopped");
    }

    async fn run_cycle(&mut self) {
        if let Some(log_file) = &self.log_file {
            match log_file.rotate_if_due() {
                Ok(true) => info!("operational log rotated"),
                Ok(false) => {}
                Err(e) => warn!(error = %e, "log rotation failed"),
            }
        }

        let now = Local::now();
        if self.cleanup.should_run(now) {
            match self.store.cleanup_expired().await {
                Ok(removed) => {
                    self.cleanup.mark_done(now.date_naive());
                    info!(removed, "retention cleanup complete");
                }
                Err(e) => warn!(error = %e, "retention cleanup failed"),
            }
        }

        let started = Instant::now();
        let outcomes = self.ingestor.run_pass().await;
        let elapsed = started.elapsed();

        let mut total_entries = 0u64;
        let mut succeeded = 0usize;
        for outcome in &outcomes {
            total_entries += outcome.total_entries;
            if outcome.success {
                succeeded += 1;
                if outcome.total_entries > 0 {
                    info!(
                        site = %outcome.site_name,
                        id = %outcome.site_id,
                        entries = outcome.total_entries,
                        elapsed_ms = outcome.elapsed.as_millis() as u64,
                        "site scan complete"
                    );
                }
            } else if let Some(error) = &outcome.error {
                warn!(site = %outcome.site_name, id = %outcome.site_id, error = %error, "site scan failed");
            }
        }

        if total_entries > 0 {
            info!(
                sites_ok = succeeded,
                sites_total = outcomes.len(),
                total_entries,
                elapsed_ms = elapsed.as_millis() as u64,
                "ingestion pass complete"
            );
        }
    }
}
