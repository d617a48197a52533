use std::{io, pin::Pin, task::{Context, Poll}};

use tokio::{
    io::{AsyncRead, AsyncWrite, ReadBuf},
    net::{TcpSocket, TcpStream},
};

/// An either `TcpStream` or in memory pipe, which implement
/// `AsyncRead` and `AsyncWrite` transparently.
pub struct Socket {
    kind: Kind,
}

enum Kind {
    Tcp(TcpStream),
    #[cfg(test)]
    Duplex(tokio::io::DuplexStream),
}

impl Socket {
    /// Connect to the first reachable address of `host`.
    ///
    /// Socket send and receive buffers are sized to `buffer_size`.
    pub async fn connect_tcp(host: &str, port: u16, buffer_size: u32) -> io::Result<Socket> {
        let mut last_err = None;

        for addr in tokio::net::lookup_host((host, port)).await? {
            let socket = match addr {
                std::net::SocketAddr::V4(_) => TcpSocket::new_v4()?,
                std::net::SocketAddr::V6(_) => TcpSocket::new_v6()?,
            };
            socket.set_send_buffer_size(buffer_size)?;
            socket.set_recv_buffer_size(buffer_size)?;

            match socket.connect(addr).await {
                Ok(tcp) => {
                    tcp.set_nodelay(true)?;
                    return Ok(Socket { kind: Kind::Tcp(tcp) });
                },
                Err(err) => last_err = Some(err),
            }
        }

        Err(last_err.unwrap_or_else(|| io::Error::new(
            io::ErrorKind::NotFound,
            format!("cannot resolve host {host}"),
        )))
    }

    #[cfg(test)]
    pub(crate) fn duplex(stream: tokio::io::DuplexStream) -> Socket {
        Socket { kind: Kind::Duplex(stream) }
    }
}

impl AsyncRead for Socket {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut self.kind {
            Kind::Tcp(t) => Pin::new(t).poll_read(cx, buf),
            #[cfg(test)]
            Kind::Duplex(d) => Pin::new(d).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Socket {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut self.kind {
            Kind::Tcp(t) => Pin::new(t).poll_write(cx, buf),
            #[cfg(test)]
            Kind::Duplex(d) => Pin::new(d).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut self.kind {
            Kind::Tcp(t) => Pin::new(t).poll_flush(cx),
            #[cfg(test)]
            Kind::Duplex(d) => Pin::new(d).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut self.kind {
            Kind::Tcp(t) => Pin::new(t).poll_shutdown(cx),
            #[cfg(test)]
            Kind::Duplex(d) => Pin::new(d).poll_shutdown(cx),
        }
    }
}

impl std::fmt::Debug for Socket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            Kind::Tcp(ref tcp) => std::fmt::Debug::fmt(tcp, f),
            #[cfg(test)]
            Kind::Duplex(_) => f.write_str("Duplex"),
        }
    }
}
