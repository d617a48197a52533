//! Backend Messages
//!
//! A backend message is decoded field by field from the stream after its
//! operation code has been read.
use bytes::Bytes;

use super::{ProtocolError, op, status};
use crate::{Result, gds::Diagnostic, stream::GdsStream};

/// A type that can be decoded from a backend message.
pub trait BackendProtocol: Sized {
    /// Operation code of the message.
    const OP: i32;

    /// Decode the message body, `op` is the operation code already read.
    fn decode(op: i32, stream: &mut GdsStream) -> impl Future<Output = Result<Self>> + Send;
}

macro_rules! assert_op {
    ($op:ident) => {
        if Self::OP != $op {
            return Err(ProtocolError::unexpected(Self::OP, $op).into())
        }
    };
}

/// Connection accepted, carries the negotiated protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accept {
    pub version: i32,
    pub architecture: i32,
    pub min_type: i32,
}

impl BackendProtocol for Accept {
    const OP: i32 = op::ACCEPT;

    async fn decode(op: i32, stream: &mut GdsStream) -> Result<Self> {
        if op == op::REJECT {
            return Err(ProtocolError::Rejected.into());
        }
        assert_op!(op);
        Ok(Self {
            version: stream.read_i32().await?,
            architecture: stream.read_i32().await?,
            min_type: stream.read_i32().await?,
        })
    }
}

/// Generic response.
#[derive(Debug, Clone, Default)]
pub struct Response {
    /// Object id, the handle of whatever the request created.
    pub object: i32,
    pub blob_id: i64,
    pub data: Bytes,
    pub status: Diagnostic,
}

impl BackendProtocol for Response {
    const OP: i32 = op::RESPONSE;

    async fn decode(op: i32, stream: &mut GdsStream) -> Result<Self> {
        assert_op!(op);
        Ok(Self {
            object: stream.read_i32().await?,
            blob_id: stream.read_i64().await?,
            data: stream.read_buffer().await?,
            status: status::read(stream).await?,
        })
    }
}

/// Header of one block of fetched rows.
///
/// A row follows when `status` is `0` and `count` is positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: i32,
    pub count: i32,
}

impl FetchResponse {
    /// Status of a cursor with no more rows.
    pub const END_OF_CURSOR: i32 = 100;

    pub fn has_row(&self) -> bool {
        self.status == 0 && self.count > 0
    }
}

impl BackendProtocol for FetchResponse {
    const OP: i32 = op::FETCH_RESPONSE;

    async fn decode(op: i32, stream: &mut GdsStream) -> Result<Self> {
        assert_op!(op);
        Ok(Self {
            status: stream.read_i32().await?,
            count: stream.read_i32().await?,
        })
    }
}

/// Header of an inline singleton row, the row follows when `count` is positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlResponse {
    pub count: i32,
}

impl BackendProtocol for SqlResponse {
    const OP: i32 = op::SQL_RESPONSE;

    async fn decode(op: i32, stream: &mut GdsStream) -> Result<Self> {
        assert_op!(op);
        Ok(Self { count: stream.read_i32().await? })
    }
}
