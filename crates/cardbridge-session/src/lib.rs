//! Device session for the cardbridge.
//!
//! This crate holds the only stateful part of the bridge: the
//! [`DeviceSession`] lifecycle state machine and the [`PollScheduler`]
//! driving it. The session owns the HID reader, issues the read-tag
//! command on a timer, decodes the answering reports, suppresses duplicate
//! reads of the card sitting on the reader, and forwards newly seen tags
//! to the serial sink.
//!
//! # Concurrency model
//!
//! All mutable session state lives behind one single-consumer event loop
//! ([`DeviceSession::run`]). The poll timer and the reader I/O task are
//! the only activity sources and both feed that loop, so no lock is
//! needed. The scheduler's skip-if-busy rule plus the size-1 command queue
//! keep at most one read command in flight at any time. While no device is
//! attached the timer doubles as a reattach probe, so the session recovers
//! from an unplug or a reader absent at startup by itself.
//!
//! # Example
//!
//! ```no_run
//! use cardbridge_core::{LogRouter, SessionConfig};
//! use cardbridge_hardware::devices::{AnyHidBackend, AnyTagSink};
//! use cardbridge_hardware::{HidApiBackend, SerialForwarder};
//! use cardbridge_session::DeviceSession;
//!
//! # #[tokio::main]
//! # async fn main() -> cardbridge_core::Result<()> {
//! let config = SessionConfig::default();
//! let (log, _events) = LogRouter::new(config.debug, config.log_dir.clone());
//! let backend = AnyHidBackend::HidApi(HidApiBackend::new()?);
//! let sink = AnyTagSink::Serial(SerialForwarder::new(
//!     &config.serial_port,
//!     config.write_timeout(),
//! ));
//!
//! let (mut session, handle) = DeviceSession::new(config, backend, sink, log)?;
//! session.connect().await?;
//! tokio::spawn(session.run());
//!
//! // ... later, before process exit:
//! handle.remove_device().await?;
//! handle.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod scheduler;
pub mod session;

pub use scheduler::PollScheduler;
pub use session::{DeviceSession, SessionEvent, SessionHandle, SessionState};
