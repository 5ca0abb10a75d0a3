//! Append-only file logging.
//!
//! The server shares its log file with the tools it spawns, so every line is
//! written with a single appending `write_all` on a freshly opened handle.
//! Logging must never take the server down: all I/O failures are swallowed.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

/// Default log file location.
pub const DEFAULT_LOG_PATH: &str = "/tmp/mcp_server.log";

/// Log severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Info,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Error => "ERROR",
        }
    }
}

/// Timestamped line logger appending to a fixed file path.
///
/// Lines look like `[2025-07-04 12:30:05] [INFO] 3 tools registered`.
#[derive(Debug, Clone)]
pub struct FileLogger {
    path: PathBuf,
}

impl FileLogger {
    /// Create a logger writing to the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this logger appends to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Log at informational severity.
    pub fn info(&self, message: &str) {
        self.write(Level::Info, message);
    }

    /// Log at error severity.
    pub fn error(&self, message: &str) {
        self.write(Level::Error, message);
    }

    fn write(&self, level: Level, message: &str) {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!("[{}] [{}] {}\n", stamp, level.as_str(), message);

        // Open-per-write keeps appends line-atomic with the child tools that
        // log to the same file.
        match OpenOptions::new().create(true).append(true).open(&self.path) {
            Ok(mut file) => {
                if let Err(e) = file.write_all(line.as_bytes()) {
                    tracing::warn!(error = %e, "log write failed");
                }
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "log open failed");
            }
        }
    }
}

impl Default for FileLogger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_PATH)
    }
}
