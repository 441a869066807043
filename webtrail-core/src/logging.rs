use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::fmt::writer::MakeWriter;
use tracing_subscriber::{EnvFilter, fmt};

/// Rotate the operational log once it crosses 64 MiB.
pub const DEFAULT_MAX_LOG_BYTES: u64 = 64 * 1024 * 1024;

/// Initialize the logging system with environment-based filtering.
///
/// Defaults to "info" when RUST_LOG is not set. With a log file configured,
/// output goes to a size-capped rotating file and the returned handle is the
/// scheduler's hook for rotation; otherwise output goes to stdout.
pub fn init_logging(log_path: Option<&Path>, max_bytes: u64) -> anyhow::Result<Option<LogFile>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_path {
        Some(path) => {
            let log_file = LogFile::open(path, max_bytes)?;
            fmt()
                .with_env_filter(filter)
                .with_writer(log_file.clone())
                .with_ansi(false)
                .init();
            Ok(Some(log_file))
        }
        None => {
            fmt().with_env_filter(filter).init();
            Ok(None)
        }
    }
}

/// Append-only log file with single-generation size rotation
/// (`webtrail.log` → `webtrail.log.1`).
#[derive(Clone)]
pub struct LogFile {
    path: PathBuf,
    max_bytes: u64,
    file: Arc<Mutex<File>>,
}

impl LogFile {
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = append_handle(&path)?;
        Ok(Self {
            path,
            max_bytes,
            file: Arc::new(Mutex::new(file)),
        })
    }

    /// Rotate when the file has outgrown its cap. Returns whether a rotation
    /// happened. Writers block on the internal lock for the duration, so no
    /// log line is lost mid-rotation.
    pub fn rotate_if_due(&self) -> io::Result<bool> {
        let mut guard = self.lock();
        if guard.metadata()?.len() < self.max_bytes {
            return Ok(false);
        }

        guard.flush()?;
        let mut rotated = self.path.clone().into_os_string();
        rotated.push(".1");
        fs::rename(&self.path, &rotated)?;
        *guard = append_handle(&self.path)?;
        Ok(true)
    }

    fn lock(&self) -> MutexGuard<'_, File> {
        self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn append_handle(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

pub struct LogFileWriter<'a>(MutexGuard<'a, File>);

impl Write for LogFileWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFileWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LogFileWriter(self.lock())
    }
}
