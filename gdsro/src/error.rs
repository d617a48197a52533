//! `gdsro` error types.
use std::{backtrace::Backtrace, fmt};

use crate::{
    connection::ParseError,
    gds::{Diagnostic, ProtocolError, isc},
    net::TransportError,
    row::DecodeError,
};

/// A specialized [`Result`] type for `gdsro` operation.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// All possible error from `gdsro` library.
pub struct Error {
    context: String,
    backtrace: Backtrace,
    kind: ErrorKind,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Attach a context message.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// The status code of the error.
    pub fn code(&self) -> i32 {
        self.kind.code()
    }

    /// Returns `true` if the connection failed, the attachment must be created again.
    pub fn is_transport(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport(_))
    }

    /// Returns the server diagnostic, if the server rejected the request.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match &self.kind {
            ErrorKind::Database(diag) => Some(diag),
            _ => None,
        }
    }

    /// Whether the stream can no longer be trusted after this error.
    pub(crate) fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Transport(_) | ErrorKind::Protocol(_) | ErrorKind::Decode(_)
        )
    }
}

/// All possible error kind from `gdsro` library.
pub enum ErrorKind {
    Config(ParseError),
    Transport(TransportError),
    Protocol(ProtocolError),
    Database(Diagnostic),
    State(StateError),
    Decode(DecodeError),
}

impl ErrorKind {
    /// The status code, `0` for errors that never reach the server.
    pub fn code(&self) -> i32 {
        match self {
            Self::Config(_) => 0,
            Self::Transport(e) => e.code(),
            Self::Protocol(e) => e.code(),
            Self::Database(e) => e.code().unwrap_or(0),
            Self::State(e) => e.code(),
            Self::Decode(e) => e.code(),
        }
    }
}

macro_rules! from {
    (<$ty:ty>$pat:pat => $body:expr) => {
        impl From<$ty> for Error {
            fn from($pat: $ty) -> Self {
                let backtrace = std::backtrace::Backtrace::capture();
                Self { context: String::new(), backtrace, kind: $body }
            }
        }
    };
}

from!(<ErrorKind>e => e);
from!(<ParseError>e => ErrorKind::Config(e));
from!(<TransportError>e => ErrorKind::Transport(e));
from!(<ProtocolError>e => ErrorKind::Protocol(e));
from!(<Diagnostic>e => ErrorKind::Database(e));
from!(<StateError>e => ErrorKind::State(e));
from!(<DecodeError>e => ErrorKind::Decode(e));

impl std::error::Error for Error { }

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.context.is_empty() {
            write!(f, "{}: ", self.context)?;
        }

        fmt::Display::fmt(&self.kind, f)?;

        if let std::backtrace::BacktraceStatus::Captured = self.backtrace.status() {
            let mut backtrace = self.backtrace.to_string();
            write!(f, "\n\n")?;
            writeln!(f, "Stack backtrace:")?;
            backtrace.truncate(backtrace.trim_end().len());
            write!(f, "{}", backtrace)?;
        }

        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

impl std::error::Error for ErrorKind { }

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => fmt::Display::fmt(e, f),
            Self::Transport(e) => fmt::Display::fmt(e, f),
            Self::Protocol(e) => fmt::Display::fmt(e, f),
            Self::Database(e) => fmt::Display::fmt(e, f),
            Self::State(e) => fmt::Display::fmt(e, f),
            Self::Decode(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl fmt::Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

/// An operation was called on a handle that cannot perform it.
///
/// State errors are raised before anything is sent.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// Attachment was detached, dropped, or its stream failed.
    InvalidAttachment,
    /// Transaction has not started or already ended.
    InvalidTransaction,
    /// Statement is not allocated or already freed.
    InvalidStatement,
    /// Blob was closed or its transaction ended.
    InvalidBlob,
    /// Transaction transition not allowed from its current state.
    TransactionState {
        operation: &'static str,
        state: crate::transaction::TransactionState,
    },
    /// Detach requested while transactions are still open.
    OpenTransactions(usize),
    /// Blob segment longer than the protocol allows.
    SegmentTooLong(usize),
}

impl StateError {
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidAttachment => isc::BAD_DB_HANDLE,
            Self::InvalidTransaction => isc::BAD_TRANS_HANDLE,
            Self::InvalidStatement => isc::BAD_REQ_HANDLE,
            Self::InvalidBlob | Self::SegmentTooLong(_) => isc::BAD_SEGSTR_HANDLE,
            Self::TransactionState { .. } => isc::TRA_STATE,
            Self::OpenTransactions(_) => isc::OPEN_TRANS,
        }
    }
}

impl std::error::Error for StateError { }

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAttachment => f.write_str("invalid database handle"),
            Self::InvalidTransaction => f.write_str("invalid transaction handle"),
            Self::InvalidStatement => f.write_str("invalid statement handle"),
            Self::InvalidBlob => f.write_str("invalid blob handle"),
            Self::TransactionState { operation, state } => {
                write!(f, "cannot {operation} a transaction in state {state:?}")
            }
            Self::OpenTransactions(n) => write!(f, "cannot detach with {n} open transactions"),
            Self::SegmentTooLong(len) => {
                write!(f, "blob segment of {len} bytes exceeds {} bytes", i16::MAX)
            }
        }
    }
}

impl fmt::Debug for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}
