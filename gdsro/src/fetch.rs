//! The [`Rows`] stream.
use futures_core::Stream;
use std::{
    marker::PhantomData,
    mem,
    pin::Pin,
    task::{
        Context,
        Poll::{self, *},
    },
};

use crate::{Result, row::FromRow, statement::Statement};

type FetchFuture<'a> = Pin<Box<dyn Future<Output = (&'a mut Statement, Result<()>)> + Send + 'a>>;

/// A stream of the remaining rows of an executed [`Statement`].
///
/// Cached rows are yielded without polling the server, a new block is
/// fetched only when the cache runs out.
///
/// Created by [`Statement::rows`] and [`Statement::rows_as`].
#[must_use = "streams do nothing unless polled"]
pub struct Rows<'a, R> {
    phase: Phase<'a>,
    _p: PhantomData<fn() -> R>,
}

enum Phase<'a> {
    Idle(&'a mut Statement),
    Fetching(FetchFuture<'a>),
    Complete,
}

impl<'a, R> Rows<'a, R> {
    pub(crate) fn new(stmt: &'a mut Statement) -> Self {
        Self { phase: Phase::Idle(stmt), _p: PhantomData }
    }
}

impl<R: FromRow> Stream for Rows<'_, R> {
    type Item = Result<R>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let me = self.get_mut();

        loop {
            match mem::replace(&mut me.phase, Phase::Complete) {
                Phase::Idle(stmt) => {
                    if let Some(row) = stmt.pop_row() {
                        me.phase = Phase::Idle(stmt);
                        return Ready(Some(R::from_row(row).map_err(Into::into)));
                    }
                    if stmt.is_all_fetched() {
                        return Ready(None);
                    }
                    me.phase = Phase::Fetching(Box::pin(async move {
                        let result = stmt.fetch_block().await;
                        (stmt, result)
                    }));
                }
                Phase::Fetching(mut f) => match f.as_mut().poll(cx) {
                    Ready((stmt, Ok(()))) => me.phase = Phase::Idle(stmt),
                    Ready((_, Err(err))) => return Ready(Some(Err(err))),
                    Pending => {
                        me.phase = Phase::Fetching(f);
                        return Pending;
                    }
                },
                Phase::Complete => return Ready(None),
            }
        }
    }
}

impl<R> std::fmt::Debug for Rows<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let phase = match self.phase {
            Phase::Idle(_) => "Idle",
            Phase::Fetching(_) => "Fetching",
            Phase::Complete => "Complete",
        };
        f.debug_struct("Rows").field("phase", &phase).finish()
    }
}

#[cfg(test)]
mod test {
    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::{
        attachment::test::{ok, request},
        gds::{frontend, isc, op},
        statement::test::{expect_prepare, prepared, setup},
        xdr::XdrBufMut,
    };

    async fn next<S: Stream + Unpin>(s: &mut S) -> Option<S::Item> {
        std::future::poll_fn(|cx| Pin::new(&mut *s).poll_next(cx)).await
    }

    #[tokio::test]
    async fn streams_across_blocks() {
        let (mut stmt, tx, mut server) = setup().await;

        server.reply(&ok(0, 0, &prepared(1, &[(496, 4, "ID"), (449, 8, "NAME")]))).await;
        server.reply(&ok(0, 0, &[])).await;

        let mut blocks = BytesMut::new();
        for (id, name) in [(1, "one"), (2, "two")] {
            blocks.put_i32(op::FETCH_RESPONSE);
            blocks.put_i32(0);
            blocks.put_i32(1);
            blocks.put_i32(id);
            blocks.put_i32(0);
            blocks.put_buffer(name.as_bytes());
            blocks.put_i32(0);
        }
        // batch full, more rows on the server
        blocks.put_i32(op::FETCH_RESPONSE);
        blocks.put_i32(0);
        blocks.put_i32(0);
        blocks.put_i32(op::FETCH_RESPONSE);
        blocks.put_i32(0);
        blocks.put_i32(1);
        blocks.put_i32(3);
        blocks.put_i32(0);
        blocks.put_buffer(&[]);
        blocks.put_i32(-1);
        blocks.put_i32(op::FETCH_RESPONSE);
        blocks.put_i32(100);
        blocks.put_i32(0);
        server.reply(&blocks).await;

        stmt.prepare(&tx, "select id, name from t").await.unwrap();
        stmt.execute(&tx, None).await.unwrap();

        let mut rows = stmt.rows_as::<(i32, Option<String>)>();
        assert_eq!(next(&mut rows).await.unwrap().unwrap(), (1, Some("one".into())));
        assert_eq!(next(&mut rows).await.unwrap().unwrap(), (2, Some("two".into())));
        assert_eq!(next(&mut rows).await.unwrap().unwrap(), (3, None));
        assert!(next(&mut rows).await.is_none());
        assert!(next(&mut rows).await.is_none());
        drop(rows);

        expect_prepare(&mut server, "select id, name from t").await;
        server
            .expect(&request(frontend::Execute { stmt: 7, trid: 3, input: None, output: None }))
            .await;
        let blr = crate::blr::Blr::new(stmt.output().columns()).unwrap();
        let fetch = request(frontend::Fetch { stmt: 7, output: &blr, count: 200 });
        server.expect(&fetch).await;
        server.expect(&fetch).await;
        server.expect_idle().await;
    }

    #[tokio::test]
    async fn error_ends_stream() {
        let (mut stmt, _tx, mut server) = setup().await;
        let mut rows = stmt.rows();
        let err: crate::Error = next(&mut rows).await.unwrap().unwrap_err();
        assert_eq!(err.code(), isc::BAD_REQ_HANDLE);
        assert!(next(&mut rows).await.is_none());
        server.expect_idle().await;
    }
}
