//! The [`Blob`] type.
use bytes::Bytes;

use crate::{
    Result,
    attachment::Deferred,
    clumplet::Clumplet,
    common::verbose,
    error::StateError,
    gds::{ProtocolError, frontend, op},
    transaction::Transaction,
};

/// Largest segment accepted by the server.
const MAX_SEGMENT: usize = i16::MAX as usize;

/// Largest reply buffer of a get segment request.
const MAX_REPLY: usize = i16::MAX as usize;

/// Get segment status, the returned segment is incomplete.
const SEGMENT_PENDING: i32 = 1;
/// Get segment status, the blob has no more data.
const EOF_PENDING: i32 = 2;

/// An open blob, bound to the transaction it was opened in.
///
/// The transaction cannot end while a blob borrows it. A blob dropped while
/// open is cancelled before the next exchange on its attachment.
///
/// # Example
///
/// ```no_run
/// # async fn app(db: gdsro::Attachment) -> gdsro::Result<()> {
/// use gdsro::Blob;
///
/// let mut tx = db.begin().await?;
///
/// let mut blob = Blob::create(&tx, None).await?;
/// blob.write_all(b"hello world").await?;
/// let id = blob.id();
/// blob.close().await?;
///
/// let mut blob = Blob::open(&tx, id, None).await?;
/// assert_eq!(blob.read_to_end().await?, b"hello world");
/// blob.close().await?;
///
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Blob<'t> {
    tx: &'t Transaction,
    /// Server handle, `0` once closed.
    handle: i32,
    blob_id: i64,
    segment_pending: bool,
    eof_pending: bool,
    created: bool,
}

impl<'t> Blob<'t> {
    /// Open an existing blob for reading.
    pub async fn open(tx: &'t Transaction, blob_id: i64, bpb: Option<&Clumplet>) -> Result<Blob<'t>> {
        Self::open_inner(tx, false, blob_id, bpb).await
    }

    /// Create a new blob for writing, the id is assigned by the server.
    pub async fn create(tx: &'t Transaction, bpb: Option<&Clumplet>) -> Result<Blob<'t>> {
        Self::open_inner(tx, true, 0, bpb).await
    }

    async fn open_inner(
        tx: &'t Transaction,
        create: bool,
        blob_id: i64,
        bpb: Option<&Clumplet>,
    ) -> Result<Blob<'t>> {
        let trid = tx.handle()?;
        if let Some(bpb) = bpb {
            bpb.validate()?;
        }
        let mut session = tx.attachment().lock().await?;
        let res = session.request(frontend::OpenBlob { create, bpb, trid, blob_id }).await?;
        drop(session);

        let blob_id = if create { res.blob_id } else { blob_id };
        verbose!(handle = res.object, blob_id, create, "blob opened");

        Ok(Blob {
            tx,
            handle: res.object,
            blob_id,
            segment_pending: false,
            eof_pending: false,
            created: create,
        })
    }

    /// Blob id, to be stored in a blob column.
    pub fn id(&self) -> i64 {
        self.blob_id
    }

    pub fn handle(&self) -> i32 {
        self.handle
    }

    /// Returns `true` if the last segment read was incomplete.
    pub fn is_segment_pending(&self) -> bool {
        self.segment_pending
    }

    /// Returns `true` if the blob has no more data to read.
    pub fn is_eof(&self) -> bool {
        self.eof_pending
    }

    /// Returns `true` if the blob was created rather than opened.
    pub fn is_created(&self) -> bool {
        self.created
    }

    fn checked_handle(&self) -> Result<i32> {
        match self.handle {
            0 => Err(StateError::InvalidBlob.into()),
            handle => Ok(handle),
        }
    }

    /// Read segments of up to `len` bytes, joined into one buffer.
    ///
    /// An empty buffer means the end of the blob.
    pub async fn get_segment(&mut self, len: usize) -> Result<Bytes> {
        let handle = self.checked_handle()?;
        let len = len.saturating_add(2).min(MAX_REPLY) as i32;

        let mut session = self.tx.attachment().lock().await?;
        let res = session.request(frontend::GetSegment { handle, len }).await?;
        drop(session);

        self.segment_pending = res.object == SEGMENT_PENDING;
        if res.object == EOF_PENDING || res.data.is_empty() {
            self.eof_pending = true;
        }
        Ok(join_segments(&res.data)?.into())
    }

    /// Write one segment.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::SegmentTooLong`] if `data` is longer than [`i16::MAX`].
    pub async fn put_segment(&mut self, data: &[u8]) -> Result<()> {
        let handle = self.checked_handle()?;
        if data.len() > MAX_SEGMENT {
            return Err(StateError::SegmentTooLong(data.len()).into());
        }
        let mut session = self.tx.attachment().lock().await?;
        session.request(frontend::BatchSegments { handle, data }).await?;
        Ok(())
    }

    /// Read the remaining content.
    pub async fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        while !self.eof_pending {
            buf.extend_from_slice(&self.get_segment(MAX_SEGMENT).await?);
        }
        Ok(buf)
    }

    /// Write `data`, split into segments.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        for chunk in data.chunks(MAX_SEGMENT) {
            self.put_segment(chunk).await?;
        }
        Ok(())
    }

    /// Close the blob, a created blob is kept.
    pub async fn close(self) -> Result<()> {
        self.release(op::CLOSE_BLOB).await
    }

    /// Cancel the blob, a created blob is discarded.
    pub async fn cancel(self) -> Result<()> {
        self.release(op::CANCEL_BLOB).await
    }

    async fn release(mut self, op: i32) -> Result<()> {
        let id = self.checked_handle()?;
        self.handle = 0;
        let mut session = self.tx.attachment().lock().await?;
        session.request(frontend::Release { op, id }).await?;
        Ok(())
    }
}

impl Drop for Blob<'_> {
    fn drop(&mut self) {
        if self.handle != 0 {
            self.tx.attachment().defer(Deferred::CancelBlob(self.handle));
        }
    }
}

/// Join a get segment payload of little endian length prefixed chunks.
fn join_segments(data: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = Vec::with_capacity(data.len());
    let mut offset = 0;
    while offset < data.len() {
        let Some(&[lo, hi]) = data.get(offset..offset + 2) else {
            return Err(ProtocolError::MalformedSegment { offset });
        };
        let len = u16::from_le_bytes([lo, hi]) as usize;
        let Some(chunk) = data.get(offset + 2..offset + 2 + len) else {
            return Err(ProtocolError::MalformedSegment { offset });
        };
        buf.extend_from_slice(chunk);
        offset += 2 + len;
    }
    Ok(buf)
}
