//! Parameter buffers.
//!
//! A [`Clumplet`] is an ordered list of `(tag, value)` pairs used as the
//! database (DPB), transaction (TPB) and blob (BPB) parameter blocks.
//!
//! A tag appears at most once, pushing a tag that already exists replaces its
//! value in place, otherwise the entry is appended.
use bytes::{BufMut, Bytes};

use crate::{gds::tpb, row::DecodeError};

/// Ordered parameter buffer.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Clumplet {
    entries: Vec<(u8, Bytes)>,
}

/// How entries are laid out in the wire buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Style {
    /// `tag, len, value` for every entry (DPB, BPB).
    Tagged,
    /// `tag` alone for flag entries, `tag, len, value` otherwise (TPB).
    Set,
}

impl Clumplet {
    /// Create empty parameter buffer.
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Transaction parameters used when none are given: write, concurrency, wait.
    pub fn default_tpb() -> Self {
        Self::new()
            .with_flag(tpb::WRITE)
            .with_flag(tpb::CONCURRENCY)
            .with_flag(tpb::WAIT)
    }

    /// Insert raw value, replacing the value of an existing `tag`.
    pub fn push(&mut self, tag: u8, value: impl Into<Bytes>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(t, _)| *t == tag) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((tag, value)),
        }
    }

    /// Insert string value.
    pub fn push_str(&mut self, tag: u8, value: &str) {
        self.push(tag, Bytes::copy_from_slice(value.as_bytes()));
    }

    /// Insert 32-bit integer value, big endian.
    pub fn push_i32(&mut self, tag: u8, value: i32) {
        self.push(tag, Bytes::copy_from_slice(&value.to_be_bytes()));
    }

    /// Insert 16-bit integer value, little endian.
    pub fn push_i16(&mut self, tag: u8, value: i16) {
        self.push(tag, Bytes::copy_from_slice(&value.to_le_bytes()));
    }

    /// Insert a tag without value.
    pub fn push_flag(&mut self, tag: u8) {
        self.push(tag, Bytes::new());
    }

    pub fn with(mut self, tag: u8, value: impl Into<Bytes>) -> Self {
        self.push(tag, value);
        self
    }

    pub fn with_str(mut self, tag: u8, value: &str) -> Self {
        self.push_str(tag, value);
        self
    }

    pub fn with_i32(mut self, tag: u8, value: i32) -> Self {
        self.push_i32(tag, value);
        self
    }

    pub fn with_i16(mut self, tag: u8, value: i16) -> Self {
        self.push_i16(tag, value);
        self
    }

    pub fn with_flag(mut self, tag: u8) -> Self {
        self.push_flag(tag);
        self
    }

    /// Returns the value of `tag`.
    pub fn find(&self, tag: u8) -> Option<&Bytes> {
        self.entries.iter().find(|(t, _)| *t == tag).map(|(_, v)| v)
    }

    /// Remove `tag`, returning its value.
    pub fn remove(&mut self, tag: u8) -> Option<Bytes> {
        let idx = self.entries.iter().position(|(t, _)| *t == tag)?;
        Some(self.entries.remove(idx).1)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Bytes)> {
        self.entries.iter().map(|(t, v)| (*t, v))
    }

    /// Fails if a value does not fit its one byte length prefix.
    pub fn validate(&self) -> Result<(), DecodeError> {
        match self.entries.iter().find(|(_, v)| v.len() > u8::MAX as usize) {
            Some((tag, value)) => Err(DecodeError::ParameterTooLong { tag: *tag, len: value.len() }),
            None => Ok(()),
        }
    }

    pub(crate) fn encoded_len(&self, style: Style) -> usize {
        self.entries
            .iter()
            .map(|(_, v)| match style {
                Style::Set if v.is_empty() => 1,
                _ => 2 + v.len().min(u8::MAX as usize),
            })
            .sum()
    }

    /// Expects a [validated][Clumplet::validate] buffer.
    pub(crate) fn encode(&self, style: Style, mut buf: impl BufMut) {
        for (tag, value) in &self.entries {
            buf.put_u8(*tag);
            if style == Style::Set && value.is_empty() {
                continue;
            }
            let len = value.len().min(u8::MAX as usize);
            buf.put_u8(len as u8);
            buf.put_slice(&value[..len]);
        }
    }

    pub(crate) fn to_vec(&self, style: Style) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len(style));
        self.encode(style, &mut buf);
        buf
    }
}

impl std::fmt::Debug for Clumplet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use crate::ext::FmtExt;
        let mut dbg = f.debug_map();
        for (tag, value) in &self.entries {
            dbg.entry(tag, &value.lossy());
        }
        dbg.finish()
    }
}
