//! XDR transcoder.
//!
//! Every scalar is written in network byte order. Every variable length payload
//! is followed by zero bytes up to the next 4 byte boundary, fixed length opaque
//! fields are first filled with ASCII spaces up to their declared length.
//!
//! Encoding is provided by [`XdrBufMut`] for any [`BufMut`], decoding by [`XdrBuf`]
//! for any [`Buf`]. Decoding never panics on short input, it returns
//! [`UnexpectedEof`][io::ErrorKind::UnexpectedEof] instead.
use std::io;

use bytes::{Buf, BufMut, Bytes};

use crate::ext::UsizeExt;

/// Number of pad bytes following a payload of `len` bytes.
pub const fn pad(len: usize) -> usize {
    (4 - (len & 3)) & 3
}

/// Encoded size of a fixed length opaque field of `len` bytes.
pub const fn opaque_size(len: usize) -> usize {
    len + pad(len)
}

/// Encoded size of a length prefixed buffer of `len` bytes.
pub const fn buffer_size(len: usize) -> usize {
    4 + opaque_size(len)
}

/// XDR encoding in [`BufMut`].
pub trait XdrBufMut: BufMut {
    /// Write a 16-bit integer, which occupy a full word on the wire.
    fn put_xdr_i16(&mut self, value: i16) {
        self.put_i32(value.into());
    }

    /// Write zero padding for a payload of `len` bytes.
    fn put_pad(&mut self, len: usize) {
        self.put_bytes(0, pad(len));
    }

    /// Write fixed length opaque field.
    ///
    /// `data` is filled with spaces up to `len`, then aligned. Bytes beyond `len` are not written.
    fn put_opaque(&mut self, data: &[u8], len: usize) {
        let data = &data[..data.len().min(len)];
        self.put_slice(data);
        self.put_bytes(b' ', len - data.len());
        self.put_pad(len);
    }

    /// Write length prefixed buffer.
    fn put_buffer(&mut self, data: &[u8]) {
        self.put_i32(data.len().to_i32());
        self.put_slice(data);
        self.put_pad(data.len());
    }

    /// Write length prefixed string.
    fn put_string(&mut self, string: &str) {
        self.put_buffer(string.as_bytes());
    }

    /// Write a buffer prefixed with a one byte type tag, the length includes the tag.
    fn put_typed(&mut self, kind: u8, data: &[u8]) {
        let size = data.len() + 1;
        self.put_i32(size.to_i32());
        self.put_u8(kind);
        self.put_slice(data);
        self.put_pad(size);
    }
}

impl<B: BufMut + ?Sized> XdrBufMut for B { }

/// XDR decoding in [`Buf`].
pub trait XdrBuf: Buf {
    fn try_xdr_i32(&mut self) -> io::Result<i32> {
        ensure(self, 4)?;
        Ok(self.get_i32())
    }

    /// Read a 16-bit integer, which occupy a full word on the wire.
    fn try_xdr_i16(&mut self) -> io::Result<i16> {
        ensure(self, 4)?;
        Ok(self.get_i32() as i16)
    }

    fn try_xdr_i64(&mut self) -> io::Result<i64> {
        ensure(self, 8)?;
        Ok(self.get_i64())
    }

    fn try_xdr_f32(&mut self) -> io::Result<f32> {
        ensure(self, 4)?;
        Ok(self.get_f32())
    }

    fn try_xdr_f64(&mut self) -> io::Result<f64> {
        ensure(self, 8)?;
        Ok(self.get_f64())
    }

    /// Read fixed length opaque field, discarding its padding.
    fn try_opaque(&mut self, len: usize) -> io::Result<Bytes> {
        ensure(self, opaque_size(len))?;
        let data = self.copy_to_bytes(len);
        self.advance(pad(len));
        Ok(data)
    }

    /// Read length prefixed buffer.
    fn try_buffer(&mut self) -> io::Result<Bytes> {
        let len = buffer_len(self.try_xdr_i32()?)?;
        self.try_opaque(len)
    }

    /// Read length prefixed string, invalid utf8 is replaced.
    fn try_string(&mut self) -> io::Result<String> {
        let data = self.try_buffer()?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}

impl<B: Buf + ?Sized> XdrBuf for B { }

/// Validate a length prefix read from the wire.
pub(crate) fn buffer_len(len: i32) -> io::Result<usize> {
    usize::try_from(len).map_err(|_| io::Error::new(
        io::ErrorKind::InvalidData,
        format!("negative xdr buffer length: {len}"),
    ))
}

fn ensure<B: Buf + ?Sized>(buf: &B, len: usize) -> io::Result<()> {
    if buf.remaining() < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("xdr value requires {len} bytes, {} remaining", buf.remaining()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use bytes::BytesMut;

    use super::*;

    #[test]
    fn scalars_round_trip() {
        let mut buf = BytesMut::new();
        buf.put_xdr_i16(-2);
        buf.put_i32(i32::MIN);
        buf.put_i64(0x0102_0304_0506_0708);
        buf.put_f32(1.5);
        buf.put_f64(-0.25);
        assert_eq!(buf.len(), 4 + 4 + 8 + 4 + 8);
        assert_eq!(&buf[..4], &[0xff, 0xff, 0xff, 0xfe]);

        let mut buf = buf.freeze();
        assert_eq!(buf.try_xdr_i16().unwrap(), -2);
        assert_eq!(buf.try_xdr_i32().unwrap(), i32::MIN);
        assert_eq!(buf.try_xdr_i64().unwrap(), 0x0102_0304_0506_0708);
        assert_eq!(buf.try_xdr_f32().unwrap(), 1.5);
        assert_eq!(buf.try_xdr_f64().unwrap(), -0.25);
        assert!(buf.is_empty());
    }

    #[test]
    fn buffers_are_word_aligned() {
        for len in 0..9 {
            let data = vec![7u8; len];
            let mut buf = BytesMut::new();
            buf.put_buffer(&data);
            assert_eq!(buf.len(), buffer_size(len));
            assert_eq!(buf.len() % 4, 0);
            assert!(buf[4 + len..].iter().all(|&b| b == 0));

            let mut read = buf.freeze();
            assert_eq!(&read.try_buffer().unwrap()[..], &data[..]);
            assert!(read.is_empty());
        }
    }

    #[test]
    fn opaque_fills_with_spaces() {
        let mut buf = BytesMut::new();
        buf.put_opaque(b"ab", 5);
        assert_eq!(&buf[..], b"ab   \0\0\0");

        let mut read = buf.freeze();
        assert_eq!(&read.try_opaque(5).unwrap()[..], b"ab   ");
        assert!(read.is_empty());
    }

    #[test]
    fn typed_counts_the_tag() {
        let mut buf = BytesMut::new();
        buf.put_typed(1, &[28, 1, b'a']);
        assert_eq!(&buf[..], &[0, 0, 0, 4, 1, 28, 1, b'a']);
    }

    #[test]
    fn string_round_trip() {
        let mut buf = BytesMut::new();
        buf.put_string("employee.fdb");
        assert_eq!(buf.len(), 4 + 12);
        assert_eq!(buf.freeze().try_string().unwrap(), "employee.fdb");
    }

    #[test]
    fn short_read_is_eof() {
        let mut buf = Bytes::from_static(&[0, 0, 0, 9, 1, 2]);
        let err = buf.try_buffer().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let mut buf = Bytes::from_static(&[0xff, 0xff, 0xff, 0xff]);
        let err = buf.try_buffer().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
