//! Session configuration.
//!
//! The host shell supplies these values once at session construction. They
//! are never mutated afterwards; the session holds them as immutable state.

use crate::constants::{
    DEFAULT_DEVICE_IDENTITY, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SERIAL_PORT,
    DEFAULT_WRITE_TIMEOUT_MS,
};
use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration consumed at session construction.
///
/// # Examples
///
/// ```
/// use cardbridge_core::config::SessionConfig;
///
/// let config = SessionConfig {
///     device_identity: "vid_0416&pid_b029".to_string(),
///     serial_port: "COM5".to_string(),
///     ..SessionConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Case-insensitive substring matched against enumerated HID device paths.
    pub device_identity: String,

    /// Serial port name the decoded tags are forwarded to (e.g. `COM5`,
    /// `/dev/ttyUSB0`).
    pub serial_port: String,

    /// Poll interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Serial write timeout in milliseconds.
    pub write_timeout_ms: u64,

    /// Emit debug-verbosity log events.
    pub debug: bool,

    /// Directory the daily error log file is written to.
    pub log_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            device_identity: DEFAULT_DEVICE_IDENTITY.to_string(),
            serial_port: DEFAULT_SERIAL_PORT.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
            debug: false,
            log_dir: PathBuf::from("."),
        }
    }
}

impl SessionConfig {
    /// Check that all mandatory values are present.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MissingConfiguration`] if the device identity
    /// or serial port name is empty, or if a timing value is zero. This is
    /// the only error that prevents session construction.
    pub fn validate(&self) -> Result<()> {
        if self.device_identity.trim().is_empty() {
            return Err(BridgeError::missing_configuration("device_identity"));
        }
        if self.serial_port.trim().is_empty() {
            return Err(BridgeError::missing_configuration("serial_port"));
        }
        if self.poll_interval_ms == 0 {
            return Err(BridgeError::missing_configuration("poll_interval_ms"));
        }
        if self.write_timeout_ms == 0 {
            return Err(BridgeError::missing_configuration("write_timeout_ms"));
        }
        Ok(())
    }

    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Serial write timeout as a [`Duration`].
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.device_identity, "vid_0416&pid_b029");
        assert_eq!(config.serial_port, "COM5");
        assert_eq!(config.poll_interval_ms, 1500);
    }

    #[test]
    fn test_empty_identity_rejected() {
        let config = SessionConfig {
            device_identity: String::new(),
            ..SessionConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            BridgeError::MissingConfiguration { ref field } if field == "device_identity"
        ));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_blank_port_rejected() {
        let config = SessionConfig {
            serial_port: "   ".to_string(),
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = SessionConfig {
            poll_interval_ms: 0,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_survives_serde_round_trip() {
        let config = SessionConfig {
            serial_port: "/dev/ttyUSB0".to_string(),
            debug: true,
            ..SessionConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_durations() {
        let config = SessionConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(1500));
        assert_eq!(config.write_timeout(), Duration::from_millis(500));
    }
}
