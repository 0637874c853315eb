//! Hardware abstraction traits.
//!
//! These traits are the seam between the device session and the physical
//! peripherals, enabling substitution between the hidapi/serialport-backed
//! implementations and the mocks used in tests.
//!
//! All traits use native `async fn` methods (Edition 2024 RPITIT). They are
//! not object-safe; dynamic dispatch goes through the enum wrappers in
//! [`devices`](crate::devices).

#![allow(async_fn_in_trait)]

use cardbridge_core::Result;
use cardbridge_protocol::{CardReport, ReaderCommand};

use crate::devices::AnyHidReader;

/// Enumerates HID devices and opens the one matching an identity substring.
///
/// # Examples
///
/// ```no_run
/// use cardbridge_hardware::traits::HidBackend;
/// use cardbridge_hardware::devices::AnyHidReader;
///
/// async fn open<B: HidBackend>(backend: &mut B) -> cardbridge_core::Result<AnyHidReader> {
///     backend.open_matching("vid_0416&pid_b029").await
/// }
/// ```
pub trait HidBackend: Send {
    /// Open the first enumerated device whose platform path contains
    /// `identity`, compared case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceNotFound`](cardbridge_core::BridgeError::DeviceNotFound)
    /// when no path matches, and
    /// [`DeviceIo`](cardbridge_core::BridgeError::DeviceIo) when the match
    /// cannot be opened.
    async fn open_matching(&mut self, identity: &str) -> Result<AnyHidReader>;
}

/// One open HID reader.
///
/// The reader speaks a strict command/response protocol: every
/// [`ReaderCommand::ReadTag`] write is answered by exactly one card report.
pub trait HidReader: Send {
    /// Write a command frame to the device.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceIo`](cardbridge_core::BridgeError::DeviceIo) if the
    /// write fails; the session logs the failure and retries on the next
    /// timer tick.
    async fn send_command(&mut self, command: ReaderCommand) -> Result<()>;

    /// Read the next report from the device.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceIo`](cardbridge_core::BridgeError::DeviceIo) on read
    /// failure or timeout.
    async fn read_report(&mut self) -> Result<CardReport>;

    /// Platform path of the opened device.
    fn path(&self) -> &str;
}

/// Downstream consumer of decoded tag identifiers.
///
/// The link is opened immediately before each write and closed immediately
/// after; it is never held open between writes.
pub trait TagSink: Send {
    /// Validate that the link can be opened, then close it again.
    ///
    /// Called once at session startup so a misconfigured port surfaces
    /// early instead of on the first card.
    ///
    /// # Errors
    ///
    /// Returns [`SerialOpen`](cardbridge_core::BridgeError::SerialOpen) if
    /// the port cannot be opened.
    async fn probe(&mut self) -> Result<()>;

    /// Forward one decoded tag: ASCII digits plus a single carriage return.
    ///
    /// # Errors
    ///
    /// Open, write and timeout failures surface as their respective
    /// [`BridgeError`](cardbridge_core::BridgeError) variants. The caller
    /// logs and drops the write; a lost forward is preferable to blocking
    /// the report turn on a stuck port.
    async fn forward(&mut self, tag: &str) -> Result<()>;
}
