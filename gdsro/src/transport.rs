//! The [`Session`], protocol state of one attachment.
use std::sync::Arc;

use crate::{
    Result,
    attachment::WarningLog,
    common::{verbose, warning},
    error::StateError,
    gds::{BackendProtocol, FrontendProtocol, Response},
    marshal,
    sqlda::XsqlVar,
    stream::GdsStream,
    value::Value,
};

/// Exclusive protocol state of an attachment.
///
/// The protocol has no request identifier, so a session is only reachable
/// through the attachment lock and one exchange runs at a time.
///
/// A transport, protocol or decode failure while reading leaves the stream
/// at an unknown position, the session then drops its stream and every
/// further call fails with [`StateError::InvalidAttachment`]. So does an
/// exchange abandoned before its reply was read.
#[derive(Debug)]
pub(crate) struct Session {
    stream: Option<GdsStream>,
    /// Operation code read ahead by [`peek_op`][Session::peek_op].
    peeked: Option<i32>,
    /// Replies owed by the server for requests already sent.
    awaiting: usize,
    /// Server handle of the database, `0` before attach.
    pub(crate) rdb_id: i32,
    warnings: Arc<WarningLog>,
}

impl Session {
    pub(crate) fn new(stream: GdsStream, warnings: Arc<WarningLog>) -> Self {
        Self { stream: Some(stream), peeked: None, awaiting: 0, rdb_id: 0, warnings }
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.stream.is_some()
    }

    /// Drop the stream, returning it for a graceful shutdown.
    pub(crate) fn invalidate(&mut self) -> Option<GdsStream> {
        self.peeked = None;
        self.awaiting = 0;
        self.stream.take()
    }

    /// Fails and invalidates the session if a previous exchange was dropped
    /// before its reply was read.
    pub(crate) fn ensure_synced(&mut self) -> Result<()> {
        if self.awaiting > 0 {
            warning!("attachment invalidated: {} unread replies", self.awaiting);
            self.invalidate();
            return Err(StateError::InvalidAttachment.into());
        }
        Ok(())
    }

    /// Mark the last reply of a request as read.
    pub(crate) fn reply_read(&mut self) {
        self.awaiting = self.awaiting.saturating_sub(1);
    }

    fn stream(&mut self) -> Result<&mut GdsStream> {
        self.stream.as_mut().ok_or_else(|| StateError::InvalidAttachment.into())
    }

    fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if err.is_fatal() {
                warning!("attachment invalidated: {err}");
                self.invalidate();
            }
        }
        result
    }

    /// Buffer a request.
    pub(crate) fn send<F: FrontendProtocol>(&mut self, message: F) -> Result<()> {
        self.stream()?.send(message);
        self.awaiting += 1;
        Ok(())
    }

    /// Write all buffered requests.
    pub(crate) async fn flush(&mut self) -> Result<()> {
        let result = match self.stream.as_mut() {
            Some(stream) => stream.flush().await.map_err(Into::into),
            None => Err(StateError::InvalidAttachment.into()),
        };
        self.guard(result)
    }

    /// Read the next operation code without consuming it.
    pub(crate) async fn peek_op(&mut self) -> Result<i32> {
        if let Some(op) = self.peeked {
            return Ok(op);
        }
        let result = match self.stream.as_mut() {
            Some(stream) => stream.read_op().await.map_err(Into::into),
            None => Err(StateError::InvalidAttachment.into()),
        };
        let op = self.guard(result)?;
        self.peeked = Some(op);
        Ok(op)
    }

    /// Receive a backend message.
    pub(crate) async fn recv<B: BackendProtocol>(&mut self) -> Result<B> {
        let op = self.peek_op().await?;
        self.peeked = None;
        let result = match self.stream.as_mut() {
            Some(stream) => B::decode(op, stream).await,
            None => Err(StateError::InvalidAttachment.into()),
        };
        self.guard(result)
    }

    /// Receive a generic response.
    ///
    /// An error status is returned as [`Err`], a warning status is added to
    /// the warning log.
    pub(crate) async fn response(&mut self) -> Result<Response> {
        let response = self.recv::<Response>().await?;
        self.reply_read();
        if !response.status.is_empty() {
            if !response.status.is_warning() {
                verbose!(status = %response.status, "error response");
                return Err(response.status.into());
            }
            self.warnings.push(response.status.clone());
        }
        Ok(response)
    }

    /// Send a request and receive its generic response.
    pub(crate) async fn request<F: FrontendProtocol>(&mut self, message: F) -> Result<Response> {
        self.send(message)?;
        self.flush().await?;
        self.response().await
    }

    /// Read one row described by `vars`.
    pub(crate) async fn read_row(&mut self, vars: &[XsqlVar]) -> Result<Vec<Option<Value>>> {
        let result = match self.stream.as_mut() {
            Some(stream) => marshal::read_row(stream, vars).await,
            None => Err(StateError::InvalidAttachment.into()),
        };
        self.guard(result)
    }
}
