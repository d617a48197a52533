//! Frontend Messages
//!
//! Every request is an operation code followed by operation specific fields,
//! there is no length prefix.
use bytes::{BufMut, BytesMut};

use super::{bpb, dpb, op, tpb};
use crate::{
    blr::Blr,
    clumplet::{Clumplet, Style},
    marshal::EncodedRow,
    xdr::{self, XdrBufMut},
};

/// Write a frontend message to `buf`.
pub fn write<F: FrontendProtocol>(msg: F, buf: &mut BytesMut) {
    // operation code
    const PREFIX: usize = 4;

    let size_hint = msg.size_hint();
    buf.reserve(PREFIX + size_hint);

    let offset = buf.len();
    buf.put_i32(msg.op());

    msg.encode(&mut *buf);

    assert_eq!(
        buf.len() - offset,
        PREFIX + size_hint,
        "Frontend message body size not equal to size hint"
    );
}

/// A type which can be encoded into frontend message
pub trait FrontendProtocol {
    /// Operation code.
    fn op(&self) -> i32;

    /// Size of the body, excluding the operation code.
    fn size_hint(&self) -> usize;

    /// Write the body of the message.
    ///
    /// The length of body written must be equal to the
    /// length returned by [`size_hint`][FrontendProtocol::size_hint].
    fn encode(self, buf: impl BufMut);
}

const CONNECT_VERSION2: i32 = 2;
const ARCH_GENERIC: i32 = 1;
const PROTOCOL_VERSION10: i32 = 10;
const PTYPE_RPC: i32 = 2;
const PTYPE_BATCH_SEND: i32 = 3;

/// Client identification tags.
const CNCT_USER: u8 = 1;
const CNCT_HOST: u8 = 4;
const CNCT_USER_VERIFICATION: u8 = 6;

/// Largest value of a clumplet or identification entry.
const MAX_ENTRY: usize = u8::MAX as usize;

/// Size of a parameter buffer written as typed buffer.
fn clumplet_size(clumplet: &Clumplet, style: Style) -> usize {
    xdr::buffer_size(1 + clumplet.encoded_len(style))
}

fn put_clumplet(buf: &mut impl BufMut, kind: u8, clumplet: &Clumplet, style: Style) {
    buf.put_typed(kind, &clumplet.to_vec(style));
}

/// Size of an optional message descriptor, absent descriptor is an empty buffer.
fn blr_size(blr: Option<&Blr>) -> usize {
    xdr::buffer_size(blr.map(Blr::len).unwrap_or(0))
}

fn put_blr(buf: &mut impl BufMut, blr: Option<&Blr>) {
    match blr {
        Some(blr) => {
            buf.put_i32(blr.len() as i32);
            blr.encode(&mut *buf);
            buf.put_pad(blr.len());
        }
        None => buf.put_i32(0),
    }
}

/// Connect request, the first message of a session.
#[derive(Debug)]
pub struct Connect<'a> {
    /// Database file name, informational at this stage.
    pub file_name: &'a str,
    /// Client process user.
    pub user: &'a str,
    /// Client host name.
    pub host: &'a str,
}

impl Connect<'_> {
    fn user_id_len(&self) -> usize {
        2 + self.user.len().min(MAX_ENTRY) + 2 + self.host.len().min(MAX_ENTRY) + 2
    }
}

impl FrontendProtocol for Connect<'_> {
    fn op(&self) -> i32 {
        op::CONNECT
    }

    fn size_hint(&self) -> usize {
        // operation, version, architecture
        4 * 3
            + xdr::buffer_size(self.file_name.len())
            // protocol count
            + 4
            + xdr::buffer_size(self.user_id_len())
            // version, architecture, min type, max type, weight
            + 4 * 5
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_i32(op::ATTACH);
        buf.put_i32(CONNECT_VERSION2);
        buf.put_i32(ARCH_GENERIC);
        buf.put_string(self.file_name);
        buf.put_i32(1);

        let user = &self.user.as_bytes()[..self.user.len().min(MAX_ENTRY)];
        let host = &self.host.as_bytes()[..self.host.len().min(MAX_ENTRY)];
        let len = self.user_id_len();
        buf.put_i32(len as i32);
        buf.put_u8(CNCT_USER);
        buf.put_u8(user.len() as u8);
        buf.put_slice(user);
        buf.put_u8(CNCT_HOST);
        buf.put_u8(host.len() as u8);
        buf.put_slice(host);
        buf.put_u8(CNCT_USER_VERIFICATION);
        buf.put_u8(0);
        buf.put_pad(len);

        buf.put_i32(PROTOCOL_VERSION10);
        buf.put_i32(ARCH_GENERIC);
        buf.put_i32(PTYPE_RPC);
        buf.put_i32(PTYPE_BATCH_SEND);
        buf.put_i32(2);
    }
}

/// Attach to, or create, a database.
#[derive(Debug)]
pub struct Attach<'a> {
    /// Either [`op::ATTACH`] or [`op::CREATE`].
    pub op: i32,
    pub file_name: &'a str,
    pub dpb: &'a Clumplet,
}

impl FrontendProtocol for Attach<'_> {
    fn op(&self) -> i32 {
        self.op
    }

    fn size_hint(&self) -> usize {
        4 + xdr::buffer_size(self.file_name.len()) + clumplet_size(self.dpb, Style::Tagged)
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_i32(0);
        buf.put_string(self.file_name);
        put_clumplet(&mut buf, dpb::VERSION1, self.dpb, Style::Tagged);
    }
}

/// Request that only carries an object id: detach, drop database, commit,
/// rollback, their retaining forms, prepare, allocate statement, close and
/// cancel blob.
#[derive(Debug)]
pub struct Release {
    pub op: i32,
    pub id: i32,
}

impl FrontendProtocol for Release {
    fn op(&self) -> i32 {
        self.op
    }

    fn size_hint(&self) -> usize {
        4
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_i32(self.id);
    }
}

/// Database or statement information request.
#[derive(Debug)]
pub struct Info<'a> {
    /// Either [`op::INFO_DATABASE`] or [`op::INFO_SQL`].
    pub op: i32,
    /// Database or statement id.
    pub id: i32,
    pub items: &'a [u8],
    /// Size of the reply buffer the server may fill.
    pub buffer_len: i32,
}

impl FrontendProtocol for Info<'_> {
    fn op(&self) -> i32 {
        self.op
    }

    fn size_hint(&self) -> usize {
        4 + 4 + xdr::buffer_size(self.items.len()) + 4
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_i32(self.id);
        // incarnation
        buf.put_i32(0);
        buf.put_buffer(self.items);
        buf.put_i32(self.buffer_len);
    }
}

/// Start a transaction.
#[derive(Debug)]
pub struct Transaction<'a> {
    pub rdb_id: i32,
    pub tpb: &'a Clumplet,
}

impl FrontendProtocol for Transaction<'_> {
    fn op(&self) -> i32 {
        op::TRANSACTION
    }

    fn size_hint(&self) -> usize {
        4 + clumplet_size(self.tpb, Style::Set)
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_i32(self.rdb_id);
        put_clumplet(&mut buf, tpb::VERSION3, self.tpb, Style::Set);
    }
}

/// Two phase commit prepare with message.
#[derive(Debug)]
pub struct Prepare2<'a> {
    pub trid: i32,
    pub message: &'a [u8],
}

impl FrontendProtocol for Prepare2<'_> {
    fn op(&self) -> i32 {
        op::PREPARE2
    }

    fn size_hint(&self) -> usize {
        4 + xdr::buffer_size(self.message.len())
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_i32(self.trid);
        buf.put_buffer(self.message);
    }
}

/// Prepare sql text and describe the statement.
#[derive(Debug)]
pub struct PrepareStatement<'a> {
    pub trid: i32,
    pub stmt: i32,
    pub dialect: u32,
    pub sql: &'a str,
    /// Describe items.
    pub items: &'a [u8],
    pub buffer_len: i32,
}

impl FrontendProtocol for PrepareStatement<'_> {
    fn op(&self) -> i32 {
        op::PREPARE_STATEMENT
    }

    fn size_hint(&self) -> usize {
        4 * 3 + xdr::buffer_size(self.sql.len()) + xdr::buffer_size(self.items.len()) + 4
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_i32(self.trid);
        buf.put_i32(self.stmt);
        buf.put_u32(self.dialect);
        buf.put_string(self.sql);
        buf.put_buffer(self.items);
        buf.put_i32(self.buffer_len);
    }
}

/// Execute a prepared statement.
///
/// With an output descriptor this is `op_execute2`, which returns a
/// singleton row inline.
#[derive(Debug)]
pub struct Execute<'a> {
    pub stmt: i32,
    pub trid: i32,
    pub input: Option<(&'a Blr, &'a EncodedRow)>,
    pub output: Option<&'a Blr>,
}

impl FrontendProtocol for Execute<'_> {
    fn op(&self) -> i32 {
        match self.output {
            Some(_) => op::EXECUTE2,
            None => op::EXECUTE,
        }
    }

    fn size_hint(&self) -> usize {
        let input = blr_size(self.input.map(|i| i.0))
            // message number, message count
            + 4 * 2
            + self.input.map(|i| i.1.size()).unwrap_or(0);
        let output = match self.output {
            Some(blr) => blr_size(Some(blr)) + 4,
            None => 0,
        };
        4 * 2 + input + output
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_i32(self.stmt);
        buf.put_i32(self.trid);

        put_blr(&mut buf, self.input.map(|i| i.0));
        buf.put_i32(0);
        buf.put_i32(self.input.is_some() as i32);
        if let Some((_, row)) = self.input {
            row.encode(&mut buf);
        }

        if let Some(blr) = self.output {
            put_blr(&mut buf, Some(blr));
            buf.put_i32(0);
        }
    }
}

/// Prepare and execute sql text in one exchange.
///
/// With any descriptor this is `op_exec_immediate2`.
#[derive(Debug)]
pub struct ExecImmediate<'a> {
    pub trid: i32,
    pub dialect: u32,
    pub sql: &'a str,
    pub input: Option<(&'a Blr, &'a EncodedRow)>,
    pub output: Option<&'a Blr>,
}

impl ExecImmediate<'_> {
    fn has_descriptors(&self) -> bool {
        self.input.is_some() || self.output.is_some()
    }
}

impl FrontendProtocol for ExecImmediate<'_> {
    fn op(&self) -> i32 {
        match self.has_descriptors() {
            true => op::EXEC_IMMEDIATE2,
            false => op::EXEC_IMMEDIATE,
        }
    }

    fn size_hint(&self) -> usize {
        let descriptors = match self.has_descriptors() {
            true => {
                blr_size(self.input.map(|i| i.0))
                    + 4 * 2
                    + self.input.map(|i| i.1.size()).unwrap_or(0)
                    + blr_size(self.output)
                    + 4
            }
            false => 0,
        };
        descriptors + 4 * 3 + xdr::buffer_size(self.sql.len()) + xdr::buffer_size(0) + 4
    }

    fn encode(self, mut buf: impl BufMut) {
        if self.has_descriptors() {
            put_blr(&mut buf, self.input.map(|i| i.0));
            buf.put_i32(0);
            buf.put_i32(self.input.is_some() as i32);
            if let Some((_, row)) = self.input {
                row.encode(&mut buf);
            }
            put_blr(&mut buf, self.output);
            buf.put_i32(0);
        }

        buf.put_i32(self.trid);
        // statement id
        buf.put_i32(0);
        buf.put_u32(self.dialect);
        buf.put_string(self.sql);
        // describe items
        buf.put_buffer(&[]);
        buf.put_i32(0);
    }
}

/// Request a batch of rows.
#[derive(Debug)]
pub struct Fetch<'a> {
    pub stmt: i32,
    pub output: &'a Blr,
    /// Maximum rows in the reply.
    pub count: i32,
}

impl FrontendProtocol for Fetch<'_> {
    fn op(&self) -> i32 {
        op::FETCH
    }

    fn size_hint(&self) -> usize {
        4 + blr_size(Some(self.output)) + 4 * 2
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_i32(self.stmt);
        put_blr(&mut buf, Some(self.output));
        // message number
        buf.put_i32(0);
        buf.put_i32(self.count);
    }
}

/// Close the cursor or release the statement.
#[derive(Debug)]
pub struct FreeStatement {
    pub stmt: i32,
    /// Either [`isc::DSQL_CLOSE`][super::isc::DSQL_CLOSE] or [`isc::DSQL_DROP`][super::isc::DSQL_DROP].
    pub option: i32,
}

impl FrontendProtocol for FreeStatement {
    fn op(&self) -> i32 {
        op::FREE_STATEMENT
    }

    fn size_hint(&self) -> usize {
        8
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_i32(self.stmt);
        buf.put_i32(self.option);
    }
}

/// Name the cursor of a statement.
#[derive(Debug)]
pub struct SetCursor<'a> {
    pub stmt: i32,
    pub name: &'a str,
}

impl FrontendProtocol for SetCursor<'_> {
    fn op(&self) -> i32 {
        op::SET_CURSOR
    }

    fn size_hint(&self) -> usize {
        4 + xdr::buffer_size(self.name.len() + 1) + 4
    }

    fn encode(self, mut buf: impl BufMut) {
        let len = self.name.len() + 1;
        buf.put_i32(self.stmt);
        buf.put_i32(len as i32);
        buf.put_slice(self.name.as_bytes());
        buf.put_u8(b'\0');
        buf.put_pad(len);
        // cursor type
        buf.put_i32(0);
    }
}

/// Open or create a blob.
///
/// With a parameter buffer this is `op_open_blob2` or `op_create_blob2`.
#[derive(Debug)]
pub struct OpenBlob<'a> {
    /// Create a new blob instead of opening `blob_id`.
    pub create: bool,
    pub bpb: Option<&'a Clumplet>,
    pub trid: i32,
    pub blob_id: i64,
}

impl FrontendProtocol for OpenBlob<'_> {
    fn op(&self) -> i32 {
        match (self.create, self.bpb.is_some()) {
            (false, false) => op::OPEN_BLOB,
            (false, true) => op::OPEN_BLOB2,
            (true, false) => op::CREATE_BLOB,
            (true, true) => op::CREATE_BLOB2,
        }
    }

    fn size_hint(&self) -> usize {
        self.bpb.map(|bpb| clumplet_size(bpb, Style::Tagged)).unwrap_or(0) + 4 + 8
    }

    fn encode(self, mut buf: impl BufMut) {
        if let Some(bpb) = self.bpb {
            put_clumplet(&mut buf, bpb::VERSION1, bpb, Style::Tagged);
        }
        buf.put_i32(self.trid);
        buf.put_i64(self.blob_id);
    }
}

/// Request the next segment of a blob.
#[derive(Debug)]
pub struct GetSegment {
    pub handle: i32,
    /// Reply buffer size.
    pub len: i32,
}

impl FrontendProtocol for GetSegment {
    fn op(&self) -> i32 {
        op::GET_SEGMENT
    }

    fn size_hint(&self) -> usize {
        4 * 3
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_i32(self.handle);
        buf.put_i32(self.len);
        // segment
        buf.put_i32(0);
    }
}

/// Write one blob segment.
///
/// The segment length appears three times: twice as `len + 2`, then as a two
/// byte little endian prefix of the data. Data longer than [`i16::MAX`] must be
/// rejected before building this message.
#[derive(Debug)]
pub struct BatchSegments<'a> {
    pub handle: i32,
    pub data: &'a [u8],
}

impl FrontendProtocol for BatchSegments<'_> {
    fn op(&self) -> i32 {
        op::BATCH_SEGMENTS
    }

    fn size_hint(&self) -> usize {
        4 + 4 + xdr::buffer_size(self.data.len() + 2)
    }

    fn encode(self, mut buf: impl BufMut) {
        let len = self.data.len();
        buf.put_i32(self.handle);
        buf.put_i32(len as i32 + 2);
        buf.put_i32(len as i32 + 2);
        buf.put_u16_le(len as u16);
        buf.put_slice(self.data);
        buf.put_pad(len + 2);
    }
}
