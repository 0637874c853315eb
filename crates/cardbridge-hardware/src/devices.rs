//! Enum wrappers for hardware dispatch.
//!
//! Native `async fn` in traits (RPITIT) is not object-safe, so the session
//! cannot hold `Box<dyn HidReader>`. These enums provide concrete dispatch
//! over the real and mock implementations at zero cost.

use cardbridge_core::Result;
use cardbridge_protocol::{CardReport, ReaderCommand};

use crate::hid::{HidApiBackend, HidApiReader};
use crate::mock::{MockHidBackend, MockHidReader, MockTagSink};
use crate::serial::SerialForwarder;
use crate::traits::{HidBackend, HidReader, TagSink};

/// Enum wrapper for HID backend dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyHidBackend {
    /// hidapi-backed enumeration of real devices.
    HidApi(HidApiBackend),

    /// Mock backend for development and testing.
    Mock(MockHidBackend),
}

impl HidBackend for AnyHidBackend {
    async fn open_matching(&mut self, identity: &str) -> Result<AnyHidReader> {
        match self {
            Self::HidApi(backend) => backend.open_matching(identity).await,
            Self::Mock(backend) => backend.open_matching(identity).await,
        }
    }
}

/// Enum wrapper for HID reader dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyHidReader {
    /// One open hidapi device.
    HidApi(HidApiReader),

    /// Mock reader for development and testing.
    Mock(MockHidReader),
}

impl HidReader for AnyHidReader {
    async fn send_command(&mut self, command: ReaderCommand) -> Result<()> {
        match self {
            Self::HidApi(reader) => reader.send_command(command).await,
            Self::Mock(reader) => reader.send_command(command).await,
        }
    }

    async fn read_report(&mut self) -> Result<CardReport> {
        match self {
            Self::HidApi(reader) => reader.read_report().await,
            Self::Mock(reader) => reader.read_report().await,
        }
    }

    fn path(&self) -> &str {
        match self {
            Self::HidApi(reader) => reader.path(),
            Self::Mock(reader) => reader.path(),
        }
    }
}

/// Enum wrapper for tag sink dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyTagSink {
    /// serialport-backed forwarder.
    Serial(SerialForwarder),

    /// Mock sink for development and testing.
    Mock(MockTagSink),
}

impl TagSink for AnyTagSink {
    async fn probe(&mut self) -> Result<()> {
        match self {
            Self::Serial(sink) => sink.probe().await,
            Self::Mock(sink) => sink.probe().await,
        }
    }

    async fn forward(&mut self, tag: &str) -> Result<()> {
        match self {
            Self::Serial(sink) => sink.forward(tag).await,
            Self::Mock(sink) => sink.forward(tag).await,
        }
    }
}
