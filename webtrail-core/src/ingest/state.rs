use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Read progress for one log file. Both fields only ever grow while the file
/// identity persists; a size decrease means rotation and resets the offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileState {
    pub last_offset: u64,
    pub last_size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteScanState {
    pub files: HashMap<PathBuf, FileState>,
}

/// Durable site → (file → offset) mapping, held in memory during a pass and
/// rewritten as one JSON document afterwards. Deleting the file on disk is
/// safe and triggers a full rescan from offset 0.
#[derive(Debug)]
pub struct ScanStateStore {
    path: PathBuf,
    sites: HashMap<String, SiteScanState>,
}

impl ScanStateStore {
    /// Load prior state from disk. A missing file is an empty state; an
    /// unreadable or corrupt file is logged and also treated as empty rather
    /// than aborting the process.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let sites = match fs::read(&path) {
            Ok(data) => match serde_json::from_slice(&data) {
                Ok(sites) => sites,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "corrupt scan state, starting from scratch");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable scan state, starting from scratch");
                HashMap::new()
            }
        };

        Self { path, sites }
    }

    /// Full-replace write of the current state, staged through a temp file so
    /// a crash mid-write never leaves a truncated document.
    pub fn save(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(&self.sites)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)
    }

    /// Where scanning should resume for `(site_id, path)` given the size
    /// observed on this pass. A shrunken file was truncated or rotated, so
    /// missing bytes are never assumed ingested and the scan restarts at 0.
    pub fn start_offset(&self, site_id: &str, path: &Path, current_size: u64) -> u64 {
        let Some(state) = self.sites.get(site_id).and_then(|s| s.files.get(path)) else {
            return 0;
        };

        if current_size < state.last_size {
            info!(site = site_id, path = %path.display(), "log file rotated, rescanning from start");
            return 0;
        }

        state.last_offset
    }

    /// Record a completed scan: offset and size both become the size observed
    /// on this pass.
    pub fn record_scan(&mut self, site_id: &str, path: &Path, current_size: u64) {
        self.sites
            .entry(site_id.to_string())
            .or_default()
            .files
            .insert(
                path.to_path_buf(),
                FileState {
                    last_offset: current_size,
                    last_size: current_size,
                },
            );
    }

    pub fn file_state(&self, site_id: &str, path: &Path) -> Option<FileState> {
        self.sites
            .get(site_id)
            .and_then(|s| s.files.get(path))
            .copied()
    }
}
