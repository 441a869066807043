pub mod config;
pub mod enrichment;
pub mod ingest;
pub mod logging;
pub mod scheduler;
pub mod shutdown;
pub mod store;
