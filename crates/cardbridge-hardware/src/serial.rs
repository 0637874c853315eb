//! Serial forwarder for decoded tags.
//!
//! The downstream consumer is a legacy COM-port-style listener. Each tag is
//! written as ASCII decimal digits followed by a single carriage return; no
//! line feed, no checksum. The port is opened per write and closed again
//! right away, so a stuck consumer can never pin the bridge's port handle.

use cardbridge_core::{BridgeError, Result};
use std::io::ErrorKind;
use std::time::Duration;

use crate::traits::TagSink;

/// Baud rate of the downstream link.
const BAUD_RATE: u32 = 9600;

/// Frame a tag for the wire: the ASCII digits plus one carriage return.
pub fn frame_tag(tag: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(tag.len() + 1);
    frame.extend_from_slice(tag.as_bytes());
    frame.push(0x0D);
    frame
}

/// serialport-backed tag sink.
///
/// # Examples
///
/// ```no_run
/// use cardbridge_hardware::serial::SerialForwarder;
/// use cardbridge_hardware::traits::TagSink;
/// use std::time::Duration;
///
/// # async fn example() -> cardbridge_core::Result<()> {
/// let mut sink = SerialForwarder::new("COM5", Duration::from_millis(500));
/// sink.probe().await?;
/// sink.forward("0015663362").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SerialForwarder {
    port_name: String,
    write_timeout: Duration,
}

impl SerialForwarder {
    /// Create a forwarder for the given port. Nothing is opened yet.
    pub fn new(port_name: impl Into<String>, write_timeout: Duration) -> Self {
        Self {
            port_name: port_name.into(),
            write_timeout,
        }
    }

    /// The configured port name.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn open(&self) -> Result<Box<dyn serialport::SerialPort>> {
        serialport::new(&self.port_name, BAUD_RATE)
            .timeout(self.write_timeout)
            .open()
            .map_err(|e| BridgeError::serial_open(&self.port_name, e.to_string()))
    }
}

impl TagSink for SerialForwarder {
    async fn probe(&mut self) -> Result<()> {
        // Open then drop; the port must not stay held between writes.
        let port = self.open()?;
        drop(port);
        Ok(())
    }

    async fn forward(&mut self, tag: &str) -> Result<()> {
        let mut port = self.open()?;
        let frame = frame_tag(tag);
        std::io::Write::write_all(&mut port, &frame).map_err(|e| {
            if e.kind() == ErrorKind::TimedOut {
                BridgeError::serial_timeout(self.write_timeout.as_millis() as u64)
            } else {
                BridgeError::serial_write(e.to_string())
            }
        })?;
        Ok(())
        // The port closes on drop.
    }
}
