//! Protocol error
use std::fmt;

use super::{isc, op};

/// An error when the server reply does not follow the protocol.
pub enum ProtocolError {
    Unexpected {
        expect: Option<i32>,
        found: i32,
        phase: Option<&'static str>,
    },
    /// Server rejected the connect request.
    Rejected,
    /// Information buffer could not be parsed.
    MalformedInfo {
        reason: &'static str,
    },
    /// Blob segment payload is not a sequence of length prefixed chunks.
    MalformedSegment {
        offset: usize,
    },
}

impl ProtocolError {
    pub(crate) fn unexpected(expect: i32, found: i32) -> ProtocolError {
        Self::Unexpected {
            expect: Some(expect),
            found,
            phase: None,
        }
    }

    pub(crate) fn unexpected_phase(found: i32, phase: &'static str) -> ProtocolError {
        Self::Unexpected {
            expect: None,
            found,
            phase: Some(phase),
        }
    }

    pub(crate) fn info(reason: &'static str) -> ProtocolError {
        Self::MalformedInfo { reason }
    }

    /// The matching status code.
    pub fn code(&self) -> i32 {
        match self {
            Self::Unexpected { .. } => isc::NET_READ_ERR,
            Self::Rejected => isc::CONNECT_REJECT,
            Self::MalformedInfo { .. } => isc::DSQL_SQLDA_ERR,
            Self::MalformedSegment { .. } => isc::NET_READ_ERR,
        }
    }
}

impl std::error::Error for ProtocolError { }

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ProtocolError::Unexpected { expect, found, phase } => {
                let found = op::name(found);
                match expect {
                    Some(m) => write!(f, "Expected operation `{}` found `{found}`", op::name(m))?,
                    None => write!(f, "Unexpected operation `{found}`")?,
                }
                if let Some(phase) = phase {
                    write!(f, " in `{phase}`")?
                }
                Ok(())
            },
            ProtocolError::Rejected => f.write_str("connection rejected by remote interface"),
            ProtocolError::MalformedInfo { reason } => write!(f, "malformed information buffer: {reason}"),
            ProtocolError::MalformedSegment { offset } => {
                write!(f, "malformed blob segment payload at offset {offset}")
            },
        }
    }
}

impl fmt::Debug for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
