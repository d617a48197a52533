//! GDS Remote Protocol
//!
//! ## Messaging Overview
//!
//! All communication is through a stream of 32-bit words in network byte order.
//! Every message starts with an operation code, the remaining fields are
//! determined by the operation. Unlike most protocols, messages carry no length,
//! the reader must know the layout of what it reads.
//!
//! ```text
//! ┏━━━━━━━━━━━━━━━━━━━┳━━━━━━━━━━━━━━━━━━━┳━━━━━━━━━━━━━━━━━━━┳━━━━━━┓
//! ┃     Operation     ┃      Field        ┃   Buffer Length   ┃ Data ┃
//! ┣━━━━━━━━━━━━━━━━━━━╋━━━━━━━━━━━━━━━━━━━╋━━━━━━━━━━━━━━━━━━━╋━━━━━━┫
//! ┃        i32        ┃        i32        ┃        i32        ┃ [u8] ┃
//! ┣━━━━━━━━━━━━━━━━━━━╋━━━━━━━━━━━━━━━━━━━╋━━━━━━━━━━━━━━━━━━━╋━━━━━━┫
//! ┃ 00 | 00 | 00 | 13 ┃ 00 | 00 | 00 | 00 ┃ 00 | 00 | 00 | 03 ┃ ab.. ┃
//! ┗━━━━━━━━━━━━━━━━━━━┻━━━━━━━━━━━━━━━━━━━┻━━━━━━━━━━━━━━━━━━━┻━━━━━━┛
//! ```
//!
//! Buffers are length prefixed and padded with zeros to a word boundary,
//! see [`xdr`][crate::xdr].
//!
//! ## Exchanges
//!
//! The protocol has no request identifier, replies arrive strictly in request order.
//! Most requests are answered with a generic [`Response`][backend::Response], which
//! carries an object id, a blob id, a data buffer and a [status vector][status].
//!
//! The server may send [`op::DUMMY`] keep-alive packets at any point where an
//! operation code is expected, readers must skip them.

mod codes;

pub mod frontend;
pub mod backend;
pub mod status;

mod error;

pub use codes::{blr, bpb, dpb, info, isc, op, tpb};

pub use frontend::FrontendProtocol;
pub use backend::{BackendProtocol, Response};
pub use status::{Diagnostic, StatusArg};
pub use error::ProtocolError;
