//! Buffered connection to the server.
use std::{
    io,
    pin::Pin,
    task::{Context, Poll, ready},
};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};

use crate::{
    common::verbose,
    gds::{FrontendProtocol, frontend, op},
    net::{Socket, TransportError},
    xdr::{self, XdrBuf},
};

const DEFAULT_BUF_CAPACITY: usize = 1024;

/// Largest buffer accepted from the wire.
const MAX_BUFFER_LEN: usize = 64 * 1024 * 1024;

/// Buffered XDR stream.
///
/// Messages are buffered by [`send`][GdsStream::send] and written by
/// [`flush`][GdsStream::flush]. Reads pull exactly the bytes a value
/// requires, so a reply is decoded field by field as it arrives.
#[derive(Debug)]
pub struct GdsStream {
    socket: Socket,
    read_buf: BytesMut,
    write_buf: BytesMut,
}

impl GdsStream {
    pub fn new(socket: Socket) -> Self {
        Self {
            socket,
            read_buf: BytesMut::with_capacity(DEFAULT_BUF_CAPACITY),
            write_buf: BytesMut::with_capacity(DEFAULT_BUF_CAPACITY),
        }
    }

    pub async fn connect(host: &str, port: u16, packet_size: u32) -> Result<Self, TransportError> {
        let socket = Socket::connect_tcp(host, port, packet_size)
            .await
            .map_err(TransportError::network)?;
        Ok(Self::new(socket))
    }

    /// Buffer a request.
    ///
    /// Note that this send is buffered, caller must also call [`flush`][GdsStream::flush] afterwards.
    pub fn send<F: FrontendProtocol>(&mut self, message: F) {
        verbose!(op = op::name(message.op()), "send");
        frontend::write(message, &mut self.write_buf);
    }

    /// Whether there are buffered requests.
    pub fn has_pending(&self) -> bool {
        !self.write_buf.is_empty()
    }

    /// Poll to write all buffered requests.
    pub fn poll_flush(&mut self, cx: &mut Context) -> Poll<Result<(), TransportError>> {
        while !self.write_buf.is_empty() {
            let n = ready!(Pin::new(&mut self.socket).poll_write(cx, &self.write_buf))
                .map_err(TransportError::write)?;
            if n == 0 {
                return Poll::Ready(Err(TransportError::write(io::ErrorKind::WriteZero.into())));
            }
            self.write_buf.advance(n);
        }
        Pin::new(&mut self.socket).poll_flush(cx).map_err(TransportError::write)
    }

    /// Poll until at least `len` bytes are buffered for reading.
    pub fn poll_fill(&mut self, cx: &mut Context, len: usize) -> Poll<Result<(), TransportError>> {
        while self.read_buf.len() < len {
            self.read_buf.reserve((len - self.read_buf.len()).max(DEFAULT_BUF_CAPACITY));

            let n = {
                let dst = self.read_buf.chunk_mut();
                let dst = unsafe { dst.as_uninit_slice_mut() };
                let mut buf = ReadBuf::uninit(dst);
                let ptr = buf.filled().as_ptr();
                ready!(Pin::new(&mut self.socket).poll_read(cx, &mut buf))
                    .map_err(TransportError::read)?;

                // Ensure the pointer does not change from under us
                assert_eq!(ptr, buf.filled().as_ptr());
                buf.filled().len()
            };

            if n == 0 {
                return Poll::Ready(Err(TransportError::eof()));
            }

            // Safety: This is guaranteed to be the number of initialized (and read)
            // bytes due to the invariants provided by `ReadBuf::filled`.
            unsafe {
                self.read_buf.advance_mut(n);
            }
        }
        Poll::Ready(Ok(()))
    }

    /// Write all buffered requests.
    pub async fn flush(&mut self) -> Result<(), TransportError> {
        std::future::poll_fn(|cx| self.poll_flush(cx)).await
    }

    /// Buffer at least `len` bytes for reading.
    pub async fn fill(&mut self, len: usize) -> Result<(), TransportError> {
        std::future::poll_fn(|cx| self.poll_fill(cx, len)).await
    }

    /// Read an operation code, skipping keep-alive packets.
    pub async fn read_op(&mut self) -> Result<i32, TransportError> {
        loop {
            let code = self.read_i32().await?;
            if code != op::DUMMY {
                verbose!(op = op::name(code), "recv");
                return Ok(code);
            }
        }
    }

    pub async fn read_i32(&mut self) -> Result<i32, TransportError> {
        self.fill(4).await?;
        self.read_buf.try_xdr_i32().map_err(TransportError::read)
    }

    pub async fn read_i16(&mut self) -> Result<i16, TransportError> {
        self.fill(4).await?;
        self.read_buf.try_xdr_i16().map_err(TransportError::read)
    }

    pub async fn read_i64(&mut self) -> Result<i64, TransportError> {
        self.fill(8).await?;
        self.read_buf.try_xdr_i64().map_err(TransportError::read)
    }

    pub async fn read_f32(&mut self) -> Result<f32, TransportError> {
        self.fill(4).await?;
        self.read_buf.try_xdr_f32().map_err(TransportError::read)
    }

    pub async fn read_f64(&mut self) -> Result<f64, TransportError> {
        self.fill(8).await?;
        self.read_buf.try_xdr_f64().map_err(TransportError::read)
    }

    /// Read fixed length opaque field.
    pub async fn read_opaque(&mut self, len: usize) -> Result<Bytes, TransportError> {
        if len > MAX_BUFFER_LEN {
            return Err(TransportError::read(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("xdr buffer of {len} bytes exceeds limit"),
            )));
        }
        self.fill(xdr::opaque_size(len)).await?;
        self.read_buf.try_opaque(len).map_err(TransportError::read)
    }

    /// Read length prefixed buffer.
    pub async fn read_buffer(&mut self) -> Result<Bytes, TransportError> {
        let len = xdr::buffer_len(self.read_i32().await?).map_err(TransportError::read)?;
        self.read_opaque(len).await
    }

    /// Read length prefixed string, invalid utf8 is replaced.
    pub async fn read_string(&mut self) -> Result<String, TransportError> {
        let data = self.read_buffer().await?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Shutdown the write half of the socket.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.socket.shutdown().await
    }
}

#[cfg(test)]
mod test {
    use bytes::BytesMut;
    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::xdr::XdrBufMut;

    #[tokio::test]
    async fn reads_across_partial_writes() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut stream = GdsStream::new(Socket::duplex(client));

        let mut reply = BytesMut::new();
        reply.put_i32(42);
        reply.put_string("hello world");
        reply.put_i64(-7);

        let write = tokio::spawn(async move {
            for chunk in reply.chunks(3) {
                server.write_all(chunk).await.unwrap();
            }
            server
        });

        assert_eq!(stream.read_i32().await.unwrap(), 42);
        assert_eq!(stream.read_string().await.unwrap(), "hello world");
        assert_eq!(stream.read_i64().await.unwrap(), -7);
        write.await.unwrap();
    }

    #[tokio::test]
    async fn keep_alive_is_skipped() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut stream = GdsStream::new(Socket::duplex(client));

        let mut reply = BytesMut::new();
        reply.put_i32(op::DUMMY);
        reply.put_i32(op::DUMMY);
        reply.put_i32(op::RESPONSE);
        server.write_all(&reply).await.unwrap();

        assert_eq!(stream.read_op().await.unwrap(), op::RESPONSE);
    }

    #[tokio::test]
    async fn closed_stream_is_read_error() {
        let (client, server) = tokio::io::duplex(64);
        let mut stream = GdsStream::new(Socket::duplex(client));
        drop(server);

        let err = stream.read_i32().await.unwrap_err();
        assert_eq!(err.code(), crate::gds::isc::NET_READ_ERR);
    }
}
