//! Default configuration constants for the bridge.

/// Default HID device path substring of the supported reader model.
pub const DEFAULT_DEVICE_IDENTITY: &str = "vid_0416&pid_b029";

/// Default serial port the decoded tags are forwarded to.
pub const DEFAULT_SERIAL_PORT: &str = "COM5";

/// Default poll interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1500;

/// Default serial write timeout in milliseconds.
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 500;

/// Suffix of the daily error log file name.
pub const ERROR_LOG_SUFFIX: &str = "_cardbridge.log";
