use std::{fmt, io};

use crate::gds::isc;

/// Socket or stream failure.
///
/// A transport error is always fatal to the exchange in flight,
/// the attachment must be created again.
pub struct TransportError {
    kind: Kind,
    source: io::Error,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Read,
    Write,
    Network,
}

impl TransportError {
    pub(crate) fn read(source: io::Error) -> TransportError {
        Self { kind: Kind::Read, source }
    }

    pub(crate) fn write(source: io::Error) -> TransportError {
        Self { kind: Kind::Write, source }
    }

    pub(crate) fn network(source: io::Error) -> TransportError {
        Self { kind: Kind::Network, source }
    }

    pub(crate) fn eof() -> TransportError {
        Self::read(io::ErrorKind::UnexpectedEof.into())
    }

    /// The matching status code.
    pub fn code(&self) -> i32 {
        match self.kind {
            Kind::Read => isc::NET_READ_ERR,
            Kind::Write => isc::NET_WRITE_ERR,
            Kind::Network => isc::NETWORK_ERROR,
        }
    }

    /// The underlying io error.
    pub fn io_error(&self) -> &io::Error {
        &self.source
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            Kind::Read => "error reading data from the connection",
            Kind::Write => "error writing data to the connection",
            Kind::Network => "unable to complete network request",
        };
        write!(f, "{what}: {}", self.source)
    }
}

impl fmt::Debug for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}
