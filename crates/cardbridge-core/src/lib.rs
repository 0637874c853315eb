//! Shared types for the cardbridge USB-HID to serial bridge.
//!
//! This crate carries the pieces every other member needs: the error
//! taxonomy, the session configuration supplied by the host shell, and the
//! log router that turns internal state transitions into host-visible
//! events.
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`] backed by [`BridgeError`]. The
//! propagation policy is deliberate: failures are caught where they occur
//! and converted to log events, and only a missing mandatory configuration
//! value prevents a session from being constructed.
//!
//! # Log Routing
//!
//! The host shell receives [`LogEvent`]s over a bounded channel obtained
//! from [`LogRouter::new`]. Error-level events also persist to a daily log
//! file; see [`logging`] for the exact file semantics.

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;

pub use config::SessionConfig;
pub use error::{BridgeError, Result};
pub use logging::{LogEvent, LogLevel, LogRouter};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
