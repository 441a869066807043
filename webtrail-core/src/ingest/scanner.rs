use crate::ingest::decode::LineDecoder;
use crate::ingest::state::ScanStateStore;
use crate::ingest::NormalizedRecord;
use crate::store::RecordStore;
use chrono::Utc;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tracing::{debug, warn};

/// Records accumulated before a submission to the store. Bounds memory to
/// one batch plus the decoder working set, and limits the loss window on
/// crash since full batches are flushed as soon as they fill.
pub const BATCH_SIZE: usize = 100;

/// A file could not be accessed at all. Decode failures are not errors;
/// they are skipped lines.
#[derive(Debug, Error)]
pub enum ScanFileError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot seek {path} to offset {offset}: {source}")]
    Seek {
        path: PathBuf,
        offset: u64,
        #[source]
        source: io::Error,
    },
}

/// Scan the unread tail of one log file through `decoder`, submitting
/// batches to `store` and updating `state` on completion. Returns the number
/// of records decoded on this pass.
///
/// On an access error the state entry is left untouched so the next pass
/// retries from the same offset. Once reading has started, the entry is
/// always advanced to the size observed at open, even if trailing bytes had
/// no newline yet; an appended continuation is picked up next pass.
pub async fn scan_file(
    state: &mut ScanStateStore,
    store: &dyn RecordStore,
    decoder: &LineDecoder,
    site_id: &str,
    path: &Path,
) -> Result<u64, ScanFileError> {
    let file = File::open(path).await.map_err(|e| ScanFileError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;

    let metadata = file.metadata().await.map_err(|e| ScanFileError::Stat {
        path: path.to_path_buf(),
        source: e,
    })?;
    let current_size = metadata.len();

    let start_offset = state.start_offset(site_id, path, current_size);

    let mut reader = BufReader::new(file);
    if start_offset > 0 {
        reader
            .seek(SeekFrom::Start(start_offset))
            .await
            .map_err(|e| ScanFileError::Seek {
                path: path.to_path_buf(),
                offset: start_offset,
                source: e,
            })?;
    }

    let now = Utc::now();
    let mut lines = reader.lines();
    let mut batch: Vec<NormalizedRecord> = Vec::with_capacity(BATCH_SIZE);
    let mut entries = 0u64;

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                // Malformed and stale lines are skipped, never fatal.
                let Ok(record) = decoder.decode(&line, now) else {
                    continue;
                };
                batch.push(record);
                entries += 1;
                if batch.len() >= BATCH_SIZE {
                    submit(store, site_id, &mut batch).await;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(site = site_id, path = %path.display(), error = %e, "read error, stopping scan of this file");
                break;
            }
        }
    }

    submit(store, site_id, &mut batch).await;

    state.record_scan(site_id, path, current_size);

    if entries > 0 {
        debug!(site = site_id, path = %path.display(), entries, "file scan complete");
    }

    Ok(entries)
}

/// Submit and clear the current batch. An insert failure is logged and the
/// batch dropped; the scan keeps reading and attempting further batches.
async fn submit(store: &dyn RecordStore, site_id: &str, batch: &mut Vec<NormalizedRecord>) {
    if batch.is_empty() {
        return;
    }

    if let Err(e) = store.batch_insert(site_id, batch).await {
        warn!(site = site_id, error = %e, "batch insert failed, dropping batch");
    }

    batch.clear();
}
