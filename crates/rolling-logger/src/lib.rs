//! Rolling Logger
//!
//! Daily-rolling file logger with an in-memory circular buffer of the most
//! recent lines. Installs a `tracing` subscriber and bridges `log` records
//! into it, so crates logging through either facade end up in the same file.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use chrono::{Local, NaiveDate};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Lines kept in memory for `recent_lines()`
pub const DEFAULT_BUFFER_LINES: usize = 500;

/// Log files kept on disk before the oldest are pruned
pub const DEFAULT_KEEP_FILES: usize = 7;

static RECENT: OnceLock<Arc<Mutex<RingBuffer>>> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("log file error: {0}")]
    Io(#[from] io::Error),
    #[error("a global logger is already installed")]
    AlreadyInitialized,
    #[error("logger not initialized")]
    NotInitialized,
}

/// Knobs for `init_logger_with`
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    pub level: tracing::Level,
    pub buffer_lines: usize,
    pub keep_files: usize,
    /// Mirror every line to stderr as well
    pub stderr: bool,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            buffer_lines: DEFAULT_BUFFER_LINES,
            keep_files: DEFAULT_KEEP_FILES,
            stderr: true,
        }
    }
}

// ========================
// Ring Buffer
// ========================

#[derive(Debug)]
struct RingBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl RingBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    fn push(&mut self, line: &str) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_string());
    }

    fn snapshot(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic mid-write leaves at worst a truncated line
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ========================
// Rolling File
// ========================

#[derive(Debug)]
struct RollingFile {
    dir: PathBuf,
    app_name: String,
    keep_files: usize,
    date: NaiveDate,
    file: File,
}

impl RollingFile {
    fn open(dir: &Path, app_name: &str, keep_files: usize, date: NaiveDate) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let file = open_append(&dir.join(file_name(app_name, date)))?;
        let rolling = Self {
            dir: dir.to_path_buf(),
            app_name: app_name.to_string(),
            keep_files: keep_files.max(1),
            date,
            file,
        };
        rolling.prune()?;
        Ok(rolling)
    }

    fn roll_if_needed(&mut self, today: NaiveDate) -> io::Result<()> {
        if today == self.date {
            return Ok(());
        }
        self.file.flush()?;
        self.file = open_append(&self.dir.join(file_name(&self.app_name, today)))?;
        self.date = today;
        self.prune()
    }

    /// Delete the oldest log files beyond `keep_files`
    fn prune(&self) -> io::Result<()> {
        let prefix = format!("{}-", self.app_name);
        let mut logs: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .map(|name| name.starts_with(&prefix) && name.ends_with(".log"))
                    .unwrap_or(false)
            })
            .collect();

        if logs.len() <= self.keep_files {
            return Ok(());
        }
        // YYYY-MM-DD sorts chronologically
        logs.sort();
        let excess = logs.len() - self.keep_files;
        for path in logs.into_iter().take(excess) {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn file_name(app_name: &str, date: NaiveDate) -> String {
    format!("{}-{}.log", app_name, date.format("%Y-%m-%d"))
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

// ========================
// Writer
// ========================

/// `MakeWriter` handed to the tracing fmt layer
#[derive(Debug, Clone)]
pub struct RollingWriter {
    file: Arc<Mutex<RollingFile>>,
    recent: Arc<Mutex<RingBuffer>>,
}

impl RollingWriter {
    fn new(file: RollingFile, recent: Arc<Mutex<RingBuffer>>) -> Self {
        Self {
            file: Arc::new(Mutex::new(file)),
            recent,
        }
    }
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        {
            let mut file = lock(&self.file);
            file.roll_if_needed(Local::now().date_naive())?;
            file.file.write_all(buf)?;
        }
        let text = String::from_utf8_lossy(buf);
        let mut recent = lock(&self.recent);
        for line in text.lines().filter(|line| !line.is_empty()) {
            recent.push(line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        lock(&self.file).file.flush()
    }
}

impl<'a> MakeWriter<'a> for RollingWriter {
    type Writer = RollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

// ========================
// Public API
// ========================

/// Install the global logger writing to `<log_dir>/<app_name>-YYYY-MM-DD.log`
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<(), LoggerError> {
    init_logger_with(log_dir, app_name, LoggerOptions::default())
}

pub fn init_logger_with(
    log_dir: impl AsRef<Path>,
    app_name: &str,
    options: LoggerOptions,
) -> Result<(), LoggerError> {
    if RECENT.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }

    let recent = Arc::new(Mutex::new(RingBuffer::new(options.buffer_lines)));
    let file = RollingFile::open(
        log_dir.as_ref(),
        app_name,
        options.keep_files,
        Local::now().date_naive(),
    )?;
    let writer = RollingWriter::new(file, recent.clone());

    let stderr_layer = options
        .stderr
        .then(|| tracing_subscriber::fmt::layer().with_writer(io::stderr));

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(options.level))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
        .with(stderr_layer)
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    let _ = RECENT.set(recent);
    tracing::info!(app = app_name, "logger initialized");
    Ok(())
}

/// Most recent formatted lines, oldest first
pub fn recent_lines() -> Vec<String> {
    RECENT.get().map(|recent| lock(recent).snapshot()).unwrap_or_default()
}

fn ensure_initialized() -> Result<(), LoggerError> {
    RECENT.get().map(|_| ()).ok_or(LoggerError::NotInitialized)
}

pub fn info(message: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    tracing::info!("{}", message);
    Ok(())
}

pub fn warn(message: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    tracing::warn!("{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    tracing::error!("{}", message);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let mut ring = RingBuffer::new(2);
        ring.push("a");
        ring.push("b");
        ring.push("c");
        assert_eq!(ring.snapshot(), vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_roll_over_opens_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "App", 7, date(2026, 1, 1)).unwrap();
        file.file.write_all(b"day one\n").unwrap();

        file.roll_if_needed(date(2026, 1, 2)).unwrap();
        file.file.write_all(b"day two\n").unwrap();
        file.file.flush().unwrap();

        let first = fs::read_to_string(dir.path().join("App-2026-01-01.log")).unwrap();
        let second = fs::read_to_string(dir.path().join("App-2026-01-02.log")).unwrap();
        assert_eq!(first, "day one\n");
        assert_eq!(second, "day two\n");
    }

    #[test]
    fn test_prune_keeps_newest_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("App-2025-12-30.log"), "").unwrap();
        fs::write(dir.path().join("App-2025-12-31.log"), "").unwrap();
        fs::write(dir.path().join("other.txt"), "").unwrap();

        let _file = RollingFile::open(dir.path(), "App", 2, date(2026, 1, 1)).unwrap();

        assert!(!dir.path().join("App-2025-12-30.log").exists());
        assert!(dir.path().join("App-2025-12-31.log").exists());
        assert!(dir.path().join("App-2026-01-01.log").exists());
        assert!(dir.path().join("other.txt").exists());
    }

    #[test]
    fn test_writer_feeds_recent_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let file = RollingFile::open(dir.path(), "App", 7, Local::now().date_naive()).unwrap();
        let recent = Arc::new(Mutex::new(RingBuffer::new(10)));
        let mut writer = RollingWriter::new(file, recent.clone());

        writer.write_all(b"first\nsecond\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(lock(&recent).snapshot(), vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_global_logger_captures_log_records() {
        let dir = tempfile::tempdir().unwrap();
        let options = LoggerOptions { stderr: false, ..LoggerOptions::default() };
        init_logger_with(dir.path(), "Test", options).unwrap();

        log::info!("from the log facade");
        info("from the helper").unwrap();

        let lines = recent_lines();
        assert!(lines.iter().any(|line| line.contains("from the log facade")));
        assert!(lines.iter().any(|line| line.contains("from the helper")));
        assert!(matches!(
            init_logger(dir.path(), "Test"),
            Err(LoggerError::AlreadyInitialized)
        ));
    }
}
