//! Connection setup.
//!
//! A session starts with a [`Connect`][frontend::Connect] request offering
//! the supported protocols, the server answers with an
//! [`Accept`][backend::Accept] or a reject.
use crate::{
    Result,
    common::verbose,
    gds::{BackendProtocol, backend, frontend},
    stream::GdsStream,
};

mod config;

pub use config::{Config, ParseError};

/// Open a socket to the configured server and negotiate the protocol.
pub(crate) async fn connect(config: &Config) -> Result<(GdsStream, backend::Accept)> {
    let mut stream = GdsStream::connect(&config.host, config.port, config.packet_size)
        .await
        .map_err(|e| crate::Error::from(e).context("connection rejected"))?;
    let accept = handshake(&mut stream, config).await?;
    Ok((stream, accept))
}

/// Exchange the connect request on an open stream.
pub(crate) async fn handshake(stream: &mut GdsStream, config: &Config) -> Result<backend::Accept> {
    stream.send(frontend::Connect {
        file_name: &config.database,
        user: &config.client_user,
        host: &config.client_host,
    });
    stream.flush().await?;

    let op = stream.read_op().await?;
    let accept = backend::Accept::decode(op, stream).await?;
    verbose!(version = accept.version, architecture = accept.architecture, "accepted");
    Ok(accept)
}

#[cfg(test)]
mod test {
    use bytes::{BufMut, BytesMut};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;
    use crate::{
        gds::{isc, op},
        net::Socket,
    };

    #[tokio::test]
    async fn accepted() {
        let (client, mut server) = tokio::io::duplex(1024);
        let mut stream = GdsStream::new(Socket::duplex(client));

        let mut reply = BytesMut::new();
        reply.put_i32(op::ACCEPT);
        reply.put_i32(10);
        reply.put_i32(1);
        reply.put_i32(2);
        server.write_all(&reply).await.unwrap();

        let config = Config::parse("srv:/db.fdb").unwrap();
        let accept = handshake(&mut stream, &config).await.unwrap();
        assert_eq!((accept.version, accept.architecture, accept.min_type), (10, 1, 2));

        let mut op = [0; 8];
        server.read_exact(&mut op).await.unwrap();
        assert_eq!(op, [0, 0, 0, 1, 0, 0, 0, 19]);
    }

    #[tokio::test]
    async fn rejected() {
        let (client, mut server) = tokio::io::duplex(1024);
        let mut stream = GdsStream::new(Socket::duplex(client));
        server.write_all(&op::REJECT.to_be_bytes()).await.unwrap();

        let config = Config::parse("/db.fdb").unwrap();
        let err = handshake(&mut stream, &config).await.unwrap_err();
        assert_eq!(err.code(), isc::CONNECT_REJECT);
    }
}
