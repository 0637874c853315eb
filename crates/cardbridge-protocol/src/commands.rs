//! Fixed command frames of the supported reader model.
//!
//! The reader speaks a command/response protocol over vendor HID reports.
//! Only two commands exist and both are fixed byte sequences; they are
//! never assembled from runtime data.

/// Command frame that requests a tag read. The reader answers with one
/// card report, zero-filled in the tag positions when no card is present.
pub const READ_TAG_FRAME: [u8; 20] = [
    0x01, 0x01, 0x13, 0x34, 0x00, 0xFF, 0x00, 0x65, 0x05, 0x1E, 0x48, 0xE8, 0x01, 0x00, 0x81,
    0x01, 0x18, 0x01, 0x64, 0xFE,
];

/// Command frame that makes the reader beep.
pub const BEEP_FRAME: [u8; 16] = [
    0x01, 0x01, 0x0F, 0x36, 0x00, 0xFF, 0x00, 0x40, 0x50, 0x04, 0x05, 0x01, 0x01, 0x01, 0x1E,
    0xFE,
];

/// A command the bridge can send to the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderCommand {
    /// Ask the reader for the currently present tag.
    ReadTag,

    /// Audible feedback.
    Beep,
}

impl ReaderCommand {
    /// The wire frame for this command.
    pub fn frame(&self) -> &'static [u8] {
        match self {
            Self::ReadTag => &READ_TAG_FRAME,
            Self::Beep => &BEEP_FRAME,
        }
    }
}

impl std::fmt::Display for ReaderCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadTag => write!(f, "ReadTag"),
            Self::Beep => write!(f, "Beep"),
        }
    }
}
