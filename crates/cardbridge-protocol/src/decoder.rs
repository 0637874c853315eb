//! Card report decoding.
//!
//! The reader answers every `ReadTag` command with a fixed-layout vendor
//! report. The 5-byte tag identifier sits at byte offsets 5 through 9; the
//! low 3 bytes of it double as the validity sentinel: all zero means no
//! card is on the reader, which is a normal answer and not an error.
//!
//! Decoding is pure and deterministic. The only failure mode is a report
//! shorter than the fixed layout, which is a distinct decode error so the
//! session can log and discard it instead of faulting.

use cardbridge_core::{BridgeError, Result};

/// Byte offset of the tag identifier inside a report.
pub const TAG_OFFSET: usize = 5;

/// Length of the tag identifier in bytes.
pub const TAG_LEN: usize = 5;

/// Minimum report length the decoder accepts.
pub const MIN_REPORT_LEN: usize = TAG_OFFSET + TAG_LEN;

/// Raw report buffer delivered by the peripheral.
///
/// Ephemeral; produced by the HID read and consumed synchronously by
/// [`decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardReport {
    data: Vec<u8>,
}

impl CardReport {
    /// Wrap a raw report buffer.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// The raw report bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Report length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the report carries no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<u8>> for CardReport {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for CardReport {
    fn from(data: &[u8]) -> Self {
        Self::new(data.to_vec())
    }
}

/// A card report decoded into its canonical identifier forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTag {
    /// The 5-byte tag identifier as 10 uppercase hex characters.
    pub hex: String,

    /// 10-digit zero-padded decimal form of the low 3 tag bytes. This is
    /// the form forwarded over the serial link.
    pub decimal10: String,

    /// Concatenated decimal renderings of the two 16-bit values at byte
    /// offsets [6..8) and [8..10). Exposed but not forwarded.
    pub decimal8: String,

    /// True iff `decimal10` is greater than zero. False marks the no-card
    /// sentinel report.
    pub is_valid: bool,
}

/// Decode a card report.
///
/// # Errors
///
/// Returns [`BridgeError::TruncatedReport`] if the buffer is shorter than
/// [`MIN_REPORT_LEN`]. A no-card sentinel report decodes successfully with
/// `is_valid == false`.
///
/// # Examples
///
/// ```
/// use cardbridge_protocol::decoder::{CardReport, decode};
///
/// let mut data = vec![0u8; 24];
/// data[5..10].copy_from_slice(&[0x5D, 0x00, 0x92, 0x65, 0x70]);
///
/// let tag = decode(&CardReport::new(data)).unwrap();
/// assert_eq!(tag.hex, "5D00926570");
/// assert_eq!(tag.decimal10, "0009594224");
/// assert!(tag.is_valid);
/// ```
pub fn decode(report: &CardReport) -> Result<DecodedTag> {
    let data = report.as_bytes();
    if data.len() < MIN_REPORT_LEN {
        return Err(BridgeError::truncated_report(MIN_REPORT_LEN, data.len()));
    }

    let tag = &data[TAG_OFFSET..TAG_OFFSET + TAG_LEN];
    let hex: String = tag.iter().map(|b| format!("{b:02X}")).collect();

    // Big-endian value of the hex pairs at offsets 7, 8 and 9.
    let value10 =
        (u32::from(data[7]) << 16) | (u32::from(data[8]) << 8) | u32::from(data[9]);
    let decimal10 = format!("{value10:010}");

    let high = u16::from_be_bytes([data[6], data[7]]);
    let low = u16::from_be_bytes([data[8], data[9]]);
    let decimal8 = format!("{high}{low}");

    Ok(DecodedTag {
        hex,
        decimal10,
        decimal8,
        is_valid: value10 > 0,
    })
}
