//! Wire protocol of the supported USB-HID RFID reader.
//!
//! Two concerns live here, both free of I/O:
//!
//! - [`commands`]: the fixed command frames the bridge writes to the reader.
//! - [`decoder`]: byte-level parsing of the reader's card report into the
//!   canonical tag identifier forms.
//!
//! The decoder is a total function over well-formed reports; a too-short
//! buffer is the only failure and surfaces as a distinct
//! [`TruncatedReport`](cardbridge_core::BridgeError::TruncatedReport)
//! error rather than a panic.

pub mod commands;
pub mod decoder;

pub use commands::{BEEP_FRAME, READ_TAG_FRAME, ReaderCommand};
pub use decoder::{CardReport, DecodedTag, MIN_REPORT_LEN, TAG_LEN, TAG_OFFSET, decode};
