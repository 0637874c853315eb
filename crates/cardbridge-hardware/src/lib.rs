//! Hardware abstraction layer for the cardbridge.
//!
//! Two peripherals exist: the USB-HID RFID reader (owned exclusively by the
//! device session) and the downstream serial link (owned by the forwarder,
//! opened per write). Both sit behind traits with native `async fn` methods
//! so the session logic runs identically over real hardware and mocks.
//!
//! # Dispatch
//!
//! The traits are not object-safe (Edition 2024 RPITIT); use the enum
//! wrappers in [`devices`] where a single concrete type is needed:
//!
//! ```
//! use cardbridge_hardware::devices::AnyTagSink;
//! use cardbridge_hardware::mock::MockTagSink;
//! use cardbridge_hardware::traits::TagSink;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> cardbridge_core::Result<()> {
//! let (sink, handle) = MockTagSink::new();
//! let mut any_sink = AnyTagSink::Mock(sink);
//!
//! any_sink.forward("0009594224").await?;
//! assert_eq!(handle.forward_count(), 1);
//! # Ok(())
//! # }
//! ```

pub mod devices;
pub mod hid;
pub mod mock;
pub mod serial;
pub mod traits;

pub use devices::{AnyHidBackend, AnyHidReader, AnyTagSink};
pub use hid::{HidApiBackend, HidApiReader};
pub use mock::{
    MockHidBackend, MockHidBackendHandle, MockHidReader, MockHidReaderHandle, MockTagSink,
    MockTagSinkHandle,
};
pub use serial::SerialForwarder;
pub use traits::{HidBackend, HidReader, TagSink};
