//! Log routing between the bridge core and the host shell.
//!
//! The core never talks to a UI directly. Every state transition and failure
//! becomes a [`LogEvent`] that is offered to the host shell over a channel
//! and mirrored into `tracing` at the matching level. Error-level events
//! additionally persist to a daily log file.
//!
//! Emission may happen from the timer turn or the reader I/O task; the
//! router never blocks either of them. A full subscriber channel drops the
//! event instead of waiting.

use crate::constants::ERROR_LOG_SUFFIX;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Severity of a log event as surfaced to the host shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// Routine status message.
    Info,

    /// Unexpected but recoverable condition.
    Warning,

    /// Failure; additionally persisted to the daily log file.
    Error,

    /// Positive outcome worth highlighting (device connected, tag accepted).
    Success,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "Info"),
            Self::Warning => write!(f, "Warning"),
            Self::Error => write!(f, "Error"),
            Self::Success => write!(f, "Success"),
        }
    }
}

/// A timestamped, leveled log line destined for the host shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// Local time the event was emitted.
    pub timestamp: chrono::DateTime<Local>,

    /// Event severity.
    pub level: LogLevel,

    /// Human-readable message.
    pub message: String,
}

/// Routes log events to the host shell, `tracing` and the error file.
///
/// Cloneable; every part of the session holds its own copy. Safe to use
/// from concurrent tasks.
///
/// # Examples
///
/// ```
/// use cardbridge_core::logging::{LogLevel, LogRouter};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (log, mut events) = LogRouter::new(false, std::env::temp_dir());
/// log.info("serial port ready");
///
/// let event = events.recv().await.unwrap();
/// assert_eq!(event.level, LogLevel::Info);
/// assert_eq!(event.message, "serial port ready");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LogRouter {
    event_tx: mpsc::Sender<LogEvent>,
    debug: bool,
    log_dir: PathBuf,
}

impl LogRouter {
    /// Create a router and the receiving end the host shell drains.
    pub fn new(debug: bool, log_dir: impl Into<PathBuf>) -> (Self, mpsc::Receiver<LogEvent>) {
        let (event_tx, event_rx) = mpsc::channel(100);
        (
            Self {
                event_tx,
                debug,
                log_dir: log_dir.into(),
            },
            event_rx,
        )
    }

    /// Whether debug-verbosity events are emitted.
    pub fn debug_enabled(&self) -> bool {
        self.debug
    }

    /// Emit an info-level event.
    pub fn info(&self, message: impl Into<String>) {
        self.emit(LogLevel::Info, message.into());
    }

    /// Emit a warning-level event.
    pub fn warning(&self, message: impl Into<String>) {
        self.emit(LogLevel::Warning, message.into());
    }

    /// Emit an error-level event and persist it to the daily log file.
    pub fn error(&self, message: impl Into<String>) {
        self.emit(LogLevel::Error, message.into());
    }

    /// Emit a success-level event.
    pub fn success(&self, message: impl Into<String>) {
        self.emit(LogLevel::Success, message.into());
    }

    /// Emit an info-level event only when the debug flag is set.
    pub fn debug_only(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!("{message}");
        if self.debug {
            self.emit(LogLevel::Info, message);
        }
    }

    fn emit(&self, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Warning => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
            LogLevel::Success => tracing::info!("{message}"),
        }

        let event = LogEvent {
            timestamp: Local::now(),
            level,
            message,
        };

        if level == LogLevel::Error {
            persist_error(&self.log_dir, &event);
        }

        // The host shell may be slow or gone; never block an I/O turn on it.
        let _ = self.event_tx.try_send(event);
    }
}

/// Write an error event to the daily log file.
///
/// The file is named after the current date. An existing file is replaced
/// with the new line; a missing file is created via append. Persistence
/// failures are reported to `tracing` only.
fn persist_error(log_dir: &Path, event: &LogEvent) {
    let name = format!("{}{}", event.timestamp.format("%d%m%Y"), ERROR_LOG_SUFFIX);
    let path = log_dir.join(name);
    let line = format!(
        "{} # Error!: {}",
        event.timestamp.format("%d.%m.%Y %H:%M:%S"),
        event.message
    );

    let result = if path.exists() {
        fs::write(&path, &line)
    } else {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .and_then(|mut file| file.write_all(line.as_bytes()))
    };

    if let Err(e) = result {
        tracing::error!("failed to persist error log to {}: {e}", path.display());
    }
}
