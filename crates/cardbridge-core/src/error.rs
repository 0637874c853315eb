//! Error types shared across the bridge.
//!
//! Every failure the bridge can hit is represented here. The session catches
//! errors at their origin and converts them to log events; only
//! [`BridgeError::MissingConfiguration`] is fatal, and only at session
//! construction time.

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur while bridging the HID reader to the serial link.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// No enumerated HID device path matched the identity substring.
    #[error("no HID device matching '{identity}' found")]
    DeviceNotFound { identity: String },

    /// HID open, write or report-read failure.
    #[error("HID device I/O error: {message}")]
    DeviceIo { message: String },

    /// The serial port could not be opened.
    #[error("failed to open serial port '{port}': {message}")]
    SerialOpen { port: String, message: String },

    /// The serial write failed after the port was opened.
    #[error("serial write error: {message}")]
    SerialWrite { message: String },

    /// The serial write exceeded the configured timeout.
    #[error("serial write timed out after {timeout_ms}ms")]
    SerialTimeout { timeout_ms: u64 },

    /// A card report was shorter than the fixed vendor layout requires.
    #[error("truncated card report: expected at least {expected} bytes, got {actual}")]
    TruncatedReport { expected: usize, actual: usize },

    /// A mandatory configuration value is absent.
    #[error("missing configuration value: {field}")]
    MissingConfiguration { field: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Create a new device-not-found error.
    pub fn device_not_found(identity: impl Into<String>) -> Self {
        Self::DeviceNotFound {
            identity: identity.into(),
        }
    }

    /// Create a new HID I/O error.
    pub fn device_io(message: impl Into<String>) -> Self {
        Self::DeviceIo {
            message: message.into(),
        }
    }

    /// Create a new serial open error.
    pub fn serial_open(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SerialOpen {
            port: port.into(),
            message: message.into(),
        }
    }

    /// Create a new serial write error.
    pub fn serial_write(message: impl Into<String>) -> Self {
        Self::SerialWrite {
            message: message.into(),
        }
    }

    /// Create a new serial timeout error.
    pub fn serial_timeout(timeout_ms: u64) -> Self {
        Self::SerialTimeout { timeout_ms }
    }

    /// Create a new truncated-report error.
    pub fn truncated_report(expected: usize, actual: usize) -> Self {
        Self::TruncatedReport { expected, actual }
    }

    /// Create a new missing-configuration error.
    pub fn missing_configuration(field: impl Into<String>) -> Self {
        Self::MissingConfiguration {
            field: field.into(),
        }
    }

    /// Whether this error is fatal to session construction.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingConfiguration { .. })
    }
}
