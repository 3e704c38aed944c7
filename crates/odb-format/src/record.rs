//! On-disk framing shared by the reader and writer.
//!
//! ```text
//! offset 0      u8      reserved, always 0
//! offset 1..5   u32 LE  declared row count (advisory)
//! offset 5..    records until EOF:
//!                 u8      table index
//!                 u16 LE  payload length
//!                 [u8]    payload, ',' stored as '\t'
//! ```

/// Reserved byte plus the advisory row count.
pub const HEADER_LEN: usize = 5;

/// Table index byte plus the little-endian payload length.
pub const RECORD_PREFIX_LEN: usize = 3;

pub const MAX_LINE_LEN: usize = u16::MAX as usize;

/// Field separator in text files.
pub const TEXT_DELIMITER: u8 = b',';

/// Field separator inside container payloads.
pub const CONTAINER_DELIMITER: u8 = b'\t';

/// One container row, with the payload already in text form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub table: u8,
    pub line: Vec<u8>,
}

impl Record {
    pub fn new(table: u8, line: impl Into<Vec<u8>>) -> Self {
        Self {
            table,
            line: line.into(),
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.table = 0;
        self.line.clear();
    }

    /// Bytes this record occupies in a container.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        RECORD_PREFIX_LEN + self.line.len()
    }

    /// Columns of the line split on `delimiter`: [`TEXT_DELIMITER`] for a
    /// decoded record, [`CONTAINER_DELIMITER`] for a raw one.
    pub fn columns(&self, delimiter: u8) -> impl Iterator<Item = &[u8]> {
        self.line.split(move |&b| b == delimiter)
    }

    /// Line as a string, one char per byte (Latin-1).
    pub fn line_lossless(&self) -> String {
        self.line.iter().map(|&b| b as char).collect()
    }
}

/// Text line to container payload.
#[inline]
pub fn to_container_delimiters(buf: &mut [u8]) {
    swap_byte(buf, TEXT_DELIMITER, CONTAINER_DELIMITER);
}

/// Container payload back to a text line. Applied unconditionally, so a tab
/// that was part of the original text comes back as a comma.
#[inline]
pub fn to_text_delimiters(buf: &mut [u8]) {
    swap_byte(buf, CONTAINER_DELIMITER, TEXT_DELIMITER);
}

#[inline]
fn swap_byte(buf: &mut [u8], from: u8, to: u8) {
    for b in buf.iter_mut().filter(|b| **b == from) {
        *b = to;
    }
}
