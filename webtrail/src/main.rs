use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use webtrail_core::config::AppConfig;
use webtrail_core::enrichment::GeoUaEnricher;
use webtrail_core::ingest::LogIngestor;
use webtrail_core::logging;
use webtrail_core::scheduler::Scheduler;
use webtrail_core::shutdown::ShutdownHandle;
use webtrail_core::store::SqliteStore;

const DEFAULT_CONFIG: &str = "config/webtrail.toml";

#[derive(Parser, Debug)]
#[command(
    name = "webtrail",
    version,
    about = "Webtrail: incremental access-log analytics service"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the Webtrail service (default)
    Run {
        /// Path to the Webtrail config file
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.command {
        Some(Command::Run { config }) => config,
        None => DEFAULT_CONFIG.to_string(),
    };

    let config = AppConfig::from_file(&config_path)
        .with_context(|| format!("failed to load config from {config_path}"))?;

    run(config)
}

#[tokio::main]
async fn run(config: AppConfig) -> anyhow::Result<()> {
    let log_file = logging::init_logging(
        config.log_file.as_deref(),
        logging::DEFAULT_MAX_LOG_BYTES,
    )?;

    tracing::info!(sites = config.sites.len(), "webtrail starting");

    // Collaborator construction is the only fatal error path; everything
    // after this point fails soft per file, site, or cycle.
    let store = Arc::new(
        SqliteStore::open(config.data_dir.join("webtrail.db"), config.retention.days)
            .await
            .context("failed to open access log store")?,
    );
    let enricher = Arc::new(
        GeoUaEnricher::from_config(&config.enrichment)
            .context("failed to build enrichment engine")?,
    );

    let ingestor = LogIngestor::new(
        config.sites.clone(),
        config.data_dir.join("scan_state.json"),
        store.clone(),
        enricher,
    );

    let scheduler = Scheduler::new(
        Duration::from_secs(config.schedule.interval_secs),
        config.schedule.maintenance_hour,
        ingestor,
        store,
        log_file,
    );

    let shutdown = ShutdownHandle::new();
    let receiver = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = shutdown.install_signal_handler().await {
                tracing::error!(error = %e, "failed to install signal handler");
            }
        }
    });

    // Returns once shutdown is signaled and any in-flight cycle finishes.
    scheduler.run(receiver).await;

    tracing::info!("webtrail stopped");
    Ok(())
}
