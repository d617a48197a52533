//! Information buffers.
//!
//! Replies to `op_info_database` and `op_info_sql` are a sequence of clusters:
//! a one byte item, a two byte little endian length, then the value. Integers
//! inside a value are little endian of variable width.
use bytes::Bytes;

use crate::gds::{ProtocolError, info};

/// Reply buffer size requested for information items.
pub const MAX_BUFFER_LEN: i32 = 32767;

/// Read little endian integer of `bytes.len()` width, at most 4 bytes are significant.
pub fn vax_integer(bytes: &[u8]) -> i32 {
    let mut value = 0u32;
    for (shift, b) in bytes.iter().take(4).enumerate() {
        value |= u32::from(*b) << (shift * 8);
    }
    value as i32
}

/// Cursor over an information buffer.
#[derive(Debug, Clone)]
pub(crate) struct InfoReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> InfoReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    pub(crate) fn item(&mut self) -> Result<u8, ProtocolError> {
        let item = *self.buf.get(self.offset).ok_or(ProtocolError::info("missing item"))?;
        self.offset += 1;
        Ok(item)
    }

    /// Read a length prefixed value.
    pub(crate) fn value(&mut self) -> Result<&'a [u8], ProtocolError> {
        let len = self.take(2)?;
        let len = u16::from_le_bytes([len[0], len[1]]) as usize;
        self.take(len)
    }

    pub(crate) fn int(&mut self) -> Result<i32, ProtocolError> {
        self.value().map(vax_integer)
    }

    pub(crate) fn string(&mut self) -> Result<String, ProtocolError> {
        self.value().map(|v| String::from_utf8_lossy(v).into_owned())
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ProtocolError> {
        let end = self.offset + len;
        let data = self.buf.get(self.offset..end).ok_or(ProtocolError::info("value exceeds buffer"))?;
        self.offset = end;
        Ok(data)
    }
}

/// Iterator over `(item, value)` clusters of a database information buffer.
///
/// Iteration stops at `isc_info_end`, and yields an error for
/// `isc_info_truncated` or a cluster running past the buffer.
#[derive(Debug, Clone)]
pub struct InfoItems {
    buf: Bytes,
    offset: usize,
}

impl InfoItems {
    pub fn new(buf: Bytes) -> Self {
        Self { buf, offset: 0 }
    }
}

impl Iterator for InfoItems {
    type Item = Result<(u8, Bytes), ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut reader = InfoReader { buf: &self.buf, offset: self.offset };
        let item = reader.item().ok()?;
        match item {
            info::END => {
                self.offset = self.buf.len();
                None
            }
            info::TRUNCATED => {
                self.offset = self.buf.len();
                Some(Err(ProtocolError::info("information buffer truncated")))
            }
            item => {
                let result = reader.value().map(|value| {
                    let start = reader.offset - value.len();
                    (item, self.buf.slice(start..reader.offset))
                });
                self.offset = match result {
                    Ok(_) => reader.offset,
                    Err(_) => self.buf.len(),
                };
                Some(result)
            }
        }
    }
}
