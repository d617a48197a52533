//! The [`Statement`] type.
use bytes::Bytes;
use std::{collections::VecDeque, sync::Arc};

use crate::{
    Result,
    attachment::{Attachment, Deferred},
    blr::Blr,
    common::verbose,
    error::StateError,
    fetch::Rows,
    gds::{
        ProtocolError,
        backend::{FetchResponse, SqlResponse},
        frontend, info, isc, op,
    },
    info::MAX_BUFFER_LEN,
    marshal::EncodedRow,
    row::{FromRow, Row},
    sqlda::{DESCRIBE_BIND, DESCRIBE_SELECT, DescribeParser, Sqlda, StatementType},
    transaction::Transaction,
    transport::Session,
    value::Value,
};

/// Maximum rows requested by one fetch.
const FETCH_SIZE: i32 = 200;

/// Option of [`Statement::free`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeOption {
    /// Close the cursor, the statement stays prepared.
    Close,
    /// Release the statement.
    Drop,
}

impl FreeOption {
    fn code(self) -> i32 {
        match self {
            FreeOption::Close => isc::DSQL_CLOSE,
            FreeOption::Drop => isc::DSQL_DROP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Allocated,
    Prepared,
    Executed,
}

/// A server side statement and its cursor.
///
/// Rows are fetched in blocks and cached, [`fetch`][Statement::fetch] only
/// goes to the server when the cache is empty.
///
/// A statement that is dropped without [`free`][Statement::free] is released
/// before the next exchange on its attachment.
///
/// # Example
///
/// ```no_run
/// # async fn app(db: gdsro::Attachment) -> gdsro::Result<()> {
/// let mut tx = db.begin().await?;
/// let mut stmt = db.statement().await?;
///
/// stmt.prepare(&tx, "select id, name from post").await?;
/// stmt.execute(&tx, None).await?;
///
/// while let Some(row) = stmt.fetch().await? {
///     let (id, name): (i32, String) = row.decode()?;
///     println!("{id}: {name}");
/// }
///
/// stmt.close().await?;
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Statement {
    attachment: Attachment,
    /// Server handle, `0` once released.
    id: i32,
    phase: Phase,
    stmt_type: Option<StatementType>,
    input: Sqlda,
    output: Sqlda,
    names: Arc<[String]>,
    rows: VecDeque<Vec<Option<Value>>>,
    all_fetched: bool,
    /// Result was returned inline, there is no server cursor.
    singleton: bool,
}

impl Statement {
    /// Allocate a statement on the attachment.
    pub async fn allocate(attachment: &Attachment) -> Result<Statement> {
        let mut session = attachment.lock().await?;
        let rdb_id = session.rdb_id;
        let res = session
            .request(frontend::Release { op: op::ALLOCATE_STATEMENT, id: rdb_id })
            .await?;
        drop(session);

        attachment.register_statement(res.object);
        verbose!(stmt = res.object, "statement allocated");

        Ok(Statement {
            attachment: attachment.clone(),
            id: res.object,
            phase: Phase::Allocated,
            stmt_type: None,
            input: Sqlda::default(),
            output: Sqlda::default(),
            names: Arc::from([]),
            rows: VecDeque::new(),
            all_fetched: false,
            singleton: false,
        })
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    /// Statement type reported at prepare.
    pub fn statement_type(&self) -> Option<StatementType> {
        self.stmt_type
    }

    /// Output columns.
    pub fn output(&self) -> &Sqlda {
        &self.output
    }

    /// Input parameters, empty until [`describe_bind`][Statement::describe_bind].
    pub fn input(&self) -> &Sqlda {
        &self.input
    }

    /// Number of rows fetched and not yet returned.
    pub fn cached_rows(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the server has no more rows.
    pub fn is_all_fetched(&self) -> bool {
        self.all_fetched
    }

    pub fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    fn handle(&self) -> Result<i32> {
        match self.id {
            0 => Err(StateError::InvalidStatement.into()),
            id => Ok(id),
        }
    }

    fn prepared(&self) -> Result<i32> {
        match self.phase {
            Phase::Prepared | Phase::Executed => self.handle(),
            Phase::Allocated => Err(StateError::InvalidStatement.into()),
        }
    }

    fn reset_cursor(&mut self) {
        self.rows.clear();
        self.all_fetched = false;
        self.singleton = false;
    }

    fn set_output(&mut self, output: Sqlda) {
        self.names = column_names(&output);
        self.output = output;
    }

    /// Whether rows of this statement come from a server cursor.
    fn has_cursor(&self) -> bool {
        !self.output.is_empty() && self.stmt_type.is_none_or(StatementType::has_cursor)
    }

    /// Prepare `sql` with the dialect of the attachment config.
    pub async fn prepare(&mut self, tx: &Transaction, sql: &str) -> Result<()> {
        let dialect = self.attachment.config().sql_dialect();
        self.prepare_with_dialect(tx, sql, dialect).await
    }

    /// Prepare `sql` and describe its output columns.
    pub async fn prepare_with_dialect(&mut self, tx: &Transaction, sql: &str, dialect: u32) -> Result<()> {
        let stmt = self.handle()?;
        let trid = tx.handle()?;

        self.phase = Phase::Allocated;
        self.reset_cursor();

        let items = prepare_items();
        let mut parser = DescribeParser::default();

        let mut session = self.attachment.lock().await?;
        let res = session
            .request(frontend::PrepareStatement {
                trid,
                stmt,
                dialect,
                sql,
                items: &items,
                buffer_len: MAX_BUFFER_LEN,
            })
            .await?;
        describe_rest(&mut session, stmt, &mut parser, res.data, DESCRIBE_SELECT).await?;
        drop(session);

        self.stmt_type = parser.stmt_type();
        self.input = Sqlda::default();
        self.set_output(parser.finish());
        self.phase = Phase::Prepared;
        verbose!(stmt, stmt_type = ?self.stmt_type, columns = self.output.sqld(), "prepared");
        Ok(())
    }

    /// Describe the output columns again.
    pub async fn describe(&mut self) -> Result<&Sqlda> {
        let output = self.describe_items(DESCRIBE_SELECT).await?;
        self.set_output(output);
        Ok(&self.output)
    }

    /// Describe the input parameters.
    ///
    /// The returned descriptor can be filled and passed to
    /// [`execute`][Statement::execute].
    pub async fn describe_bind(&mut self) -> Result<Sqlda> {
        self.input = self.describe_items(DESCRIBE_BIND).await?;
        Ok(self.input.clone())
    }

    async fn describe_items(&self, items: &[u8]) -> Result<Sqlda> {
        let stmt = self.prepared()?;
        let mut parser = DescribeParser::default();
        let mut session = self.attachment.lock().await?;
        let res = session
            .request(frontend::Info { op: op::INFO_SQL, id: stmt, items, buffer_len: MAX_BUFFER_LEN })
            .await?;
        describe_rest(&mut session, stmt, &mut parser, res.data, items).await?;
        Ok(parser.finish())
    }

    /// Request statement information, returns the raw reply buffer.
    pub async fn info(&self, items: &[u8], buffer_len: i32) -> Result<Bytes> {
        let stmt = self.handle()?;
        let mut session = self.attachment.lock().await?;
        let res = session
            .request(frontend::Info { op: op::INFO_SQL, id: stmt, items, buffer_len })
            .await?;
        Ok(res.data)
    }

    /// Name the cursor, for positioned update.
    pub async fn set_cursor_name(&self, name: &str) -> Result<()> {
        let stmt = self.handle()?;
        let mut session = self.attachment.lock().await?;
        session.request(frontend::SetCursor { stmt, name }).await?;
        Ok(())
    }

    /// Execute the prepared statement.
    ///
    /// An `EXECUTE PROCEDURE` statement with output columns is executed with
    /// its output descriptor, the result row is then available to
    /// [`fetch`][Statement::fetch] without a round trip.
    pub async fn execute(&mut self, tx: &Transaction, input: Option<&Sqlda>) -> Result<()> {
        let singleton = self.stmt_type == Some(StatementType::ExecProcedure) && !self.output.is_empty();
        self.run(tx, input, singleton).await
    }

    /// Execute the prepared statement with an explicit output descriptor.
    ///
    /// The output descriptor replaces the prepared one.
    pub async fn execute2(&mut self, tx: &Transaction, input: Option<&Sqlda>, output: &Sqlda) -> Result<()> {
        self.prepared()?;
        self.set_output(output.clone());
        self.run(tx, input, true).await
    }

    async fn run(&mut self, tx: &Transaction, input: Option<&Sqlda>, with_output: bool) -> Result<()> {
        let stmt = self.prepared()?;
        let trid = tx.handle()?;

        self.reset_cursor();
        let input = encode_input(input)?;
        let output_blr = match with_output {
            true => Some(Blr::new(self.output.columns())?),
            false => None,
        };

        let mut session = self.attachment.lock().await?;
        session.send(frontend::Execute {
            stmt,
            trid,
            input: input.as_ref().map(|(blr, row)| (blr, row)),
            output: output_blr.as_ref(),
        })?;
        session.flush().await?;

        let output = with_output.then_some(&self.output);
        let (singleton, row) = sql_response(&mut session, output, "execute").await?;
        session.response().await?;
        drop(session);

        if singleton {
            self.singleton = true;
            self.all_fetched = true;
        } else if !self.has_cursor() {
            self.all_fetched = true;
        }
        self.rows.extend(row);
        self.phase = Phase::Executed;
        Ok(())
    }

    /// Fetch the next row, `None` when the cursor is exhausted.
    pub async fn fetch(&mut self) -> Result<Option<Row>> {
        if self.rows.is_empty() && !self.all_fetched {
            self.fetch_block().await?;
        }
        Ok(self.pop_row())
    }

    /// Fetch the next row into the column slots of `out`.
    ///
    /// Columns of `out` beyond the row are set to null. Returns `false` when
    /// the cursor is exhausted.
    pub async fn fetch_into(&mut self, out: &mut Sqlda) -> Result<bool> {
        let Some(row) = self.fetch().await? else {
            return Ok(false);
        };
        let mut values = row.into_values().into_iter();
        for var in out.columns_mut() {
            var.set_value(values.next().flatten());
        }
        Ok(true)
    }

    /// Returns a [`Stream`][futures_core::Stream] of the remaining rows.
    pub fn rows(&mut self) -> Rows<'_, Row> {
        Rows::new(self)
    }

    /// Returns a [`Stream`][futures_core::Stream] of the remaining rows decoded as `R`.
    pub fn rows_as<R: FromRow>(&mut self) -> Rows<'_, R> {
        Rows::new(self)
    }

    pub(crate) fn pop_row(&mut self) -> Option<Row> {
        self.rows.pop_front().map(|values| Row::new(self.names.clone(), values))
    }

    /// Read one block of rows into the cache.
    ///
    /// Either caches at least one row or marks the cursor exhausted.
    pub(crate) async fn fetch_block(&mut self) -> Result<()> {
        if self.phase != Phase::Executed {
            return Err(StateError::InvalidStatement.into());
        }
        let stmt = self.handle()?;
        if !self.has_cursor() {
            self.all_fetched = true;
            return Ok(());
        }

        let blr = Blr::new(self.output.columns())?;
        let mut session = self.attachment.lock().await?;
        session.send(frontend::Fetch { stmt, output: &blr, count: FETCH_SIZE })?;
        session.flush().await?;

        if session.peek_op().await? != op::FETCH_RESPONSE {
            session.response().await?;
            self.all_fetched = true;
            return Ok(());
        }

        let cached = self.rows.len();
        loop {
            let block = session.recv::<FetchResponse>().await?;
            if block.status == FetchResponse::END_OF_CURSOR {
                self.all_fetched = true;
            }
            if !block.has_row() {
                session.reply_read();
                break;
            }
            let row = session.read_row(self.output.columns()).await?;
            self.rows.push_back(row);
        }
        if self.rows.len() == cached {
            self.all_fetched = true;
        }
        verbose!(stmt, rows = self.rows.len() - cached, "fetched");
        Ok(())
    }

    /// Close the cursor or release the statement.
    ///
    /// Closing a statement whose result was returned inline does nothing.
    pub async fn free(&mut self, option: FreeOption) -> Result<()> {
        let stmt = self.handle()?;
        if option == FreeOption::Close && self.singleton {
            self.rows.clear();
            return Ok(());
        }

        let res = async {
            let mut session = self.attachment.lock().await?;
            session.request(frontend::FreeStatement { stmt, option: option.code() }).await
        }
        .await;

        self.rows.clear();
        match option {
            FreeOption::Close => {
                if self.phase == Phase::Executed {
                    self.phase = Phase::Prepared;
                }
            }
            FreeOption::Drop => {
                self.id = 0;
                self.phase = Phase::Allocated;
                self.stmt_type = None;
                self.input = Sqlda::default();
                self.set_output(Sqlda::default());
                self.attachment.deregister_statement(stmt);
            }
        }
        res.map(|_| ())
    }

    /// Close the cursor.
    pub async fn close(&mut self) -> Result<()> {
        self.free(FreeOption::Close).await
    }
}

impl Drop for Statement {
    fn drop(&mut self) {
        if self.id != 0 {
            self.attachment.defer(Deferred::DropStatement(self.id));
        }
    }
}

fn prepare_items() -> Vec<u8> {
    let mut items = Vec::with_capacity(1 + DESCRIBE_SELECT.len());
    items.push(info::SQL_STMT_TYPE);
    items.extend_from_slice(DESCRIBE_SELECT);
    items
}

/// Parse describe replies, requesting the rest while the reply is truncated.
async fn describe_rest(
    session: &mut Session,
    stmt: i32,
    parser: &mut DescribeParser,
    mut data: Bytes,
    items: &[u8],
) -> Result<()> {
    while parser.feed(&data)? {
        let resume = parser.resume_items(items);
        verbose!(stmt, "describe truncated");
        data = session
            .request(frontend::Info {
                op: op::INFO_SQL,
                id: stmt,
                items: &resume,
                buffer_len: MAX_BUFFER_LEN,
            })
            .await?
            .data;
    }
    Ok(())
}

/// Validate and encode an input descriptor, an empty descriptor is no input.
pub(crate) fn encode_input(input: Option<&Sqlda>) -> Result<Option<(Blr, EncodedRow)>> {
    match input.filter(|s| !s.is_empty()) {
        Some(input) => {
            let row = EncodedRow::new(input.columns())?;
            Ok(Some((Blr::new(input.columns())?, row)))
        }
        None => Ok(None),
    }
}

/// Read an optional inline row preceding the generic response.
///
/// Returns whether the server answered with an inline result, and the row
/// if it carried one.
pub(crate) async fn sql_response(
    session: &mut Session,
    output: Option<&Sqlda>,
    phase: &'static str,
) -> Result<(bool, Option<Vec<Option<Value>>>)> {
    if session.peek_op().await? != op::SQL_RESPONSE {
        return Ok((false, None));
    }
    let res = session.recv::<SqlResponse>().await?;
    if res.count == 0 {
        return Ok((true, None));
    }
    let Some(output) = output else {
        session.invalidate();
        return Err(ProtocolError::unexpected_phase(op::SQL_RESPONSE, phase).into());
    };
    let row = session.read_row(output.columns()).await?;
    Ok((true, Some(row)))
}

pub(crate) fn column_names(sqlda: &Sqlda) -> Arc<[String]> {
    sqlda.names().map(String::from).collect()
}

#[cfg(test)]
pub(crate) mod test {
    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::{
        attachment::test::{Server, fail, ok, pair, request},
        clumplet::Clumplet,
        sqlda::{SqlType, XsqlVar, test::describe},
        transaction::TransactionState,
    };

    /// Prepare reply for a statement of `stmt_type` with `columns`.
    pub(crate) fn prepared(stmt_type: u8, columns: &[(i32, i32, &str)]) -> Vec<u8> {
        let mut data = vec![info::SQL_STMT_TYPE, 4, 0, stmt_type, 0, 0, 0];
        data.extend(describe(columns.len(), 1, columns));
        data.push(info::END);
        data
    }

    /// One fetch block carrying an `i32` row.
    fn long_row(value: i32) -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_i32(op::FETCH_RESPONSE);
        buf.put_i32(0);
        buf.put_i32(1);
        buf.put_i32(value);
        buf.put_i32(0);
        buf
    }

    fn end_of_cursor() -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_i32(op::FETCH_RESPONSE);
        buf.put_i32(FetchResponse::END_OF_CURSOR);
        buf.put_i32(0);
        buf
    }

    /// Allocated statement `7` and started transaction `3`.
    pub(crate) async fn setup() -> (Statement, Transaction, Server) {
        let (db, mut server) = pair();
        server.reply(&ok(7, 0, &[])).await;
        server.reply(&ok(3, 0, &[])).await;
        let stmt = db.statement().await.unwrap();
        let tx = db.begin().await.unwrap();
        server.expect(&request(frontend::Release { op: op::ALLOCATE_STATEMENT, id: 1 })).await;
        server.expect(&request(frontend::Transaction { rdb_id: 1, tpb: &Clumplet::default_tpb() })).await;
        (stmt, tx, server)
    }

    pub(crate) async fn expect_prepare(server: &mut Server, sql: &str) {
        server
            .expect(&request(frontend::PrepareStatement {
                trid: 3,
                stmt: 7,
                dialect: 3,
                sql,
                items: &prepare_items(),
                buffer_len: MAX_BUFFER_LEN,
            }))
            .await;
    }

    #[tokio::test]
    async fn fetch_is_buffered() {
        let (mut stmt, tx, mut server) = setup().await;
        let columns = [(496, 4, "ID")];

        server.reply(&ok(0, 0, &prepared(1, &columns))).await;
        server.reply(&ok(0, 0, &[])).await;
        server.reply(&long_row(1)).await;
        server.reply(&long_row(2)).await;
        server.reply(&end_of_cursor()).await;

        stmt.prepare(&tx, "select id from t").await.unwrap();
        assert_eq!(stmt.statement_type(), Some(StatementType::Select));
        stmt.execute(&tx, None).await.unwrap();

        let row = stmt.fetch().await.unwrap().unwrap();
        assert_eq!(row.try_get::<_, i32>("ID").unwrap(), 1);
        assert_eq!(stmt.cached_rows(), 1);
        assert!(stmt.is_all_fetched());

        let row = stmt.fetch().await.unwrap().unwrap();
        assert_eq!(row.try_get::<_, i32>(0).unwrap(), 2);
        assert!(stmt.fetch().await.unwrap().is_none());
        assert!(stmt.fetch().await.unwrap().is_none());

        expect_prepare(&mut server, "select id from t").await;
        server
            .expect(&request(frontend::Execute { stmt: 7, trid: 3, input: None, output: None }))
            .await;
        let blr = Blr::new(stmt.output().columns()).unwrap();
        server.expect(&request(frontend::Fetch { stmt: 7, output: &blr, count: 200 })).await;
        server.expect_idle().await;
    }

    #[tokio::test]
    async fn insert_then_commit() {
        let (mut stmt, mut tx, mut server) = setup().await;
        let mut no_columns = vec![info::SQL_STMT_TYPE, 4, 0, 2, 0, 0, 0];
        no_columns.extend(describe(0, 1, &[]));
        no_columns.push(info::END);

        server.reply(&ok(0, 0, &no_columns)).await;
        server.reply(&ok(0, 0, &[])).await;
        server.reply(&ok(0, 0, &[])).await;

        stmt.prepare(&tx, "insert into t values (?)").await.unwrap();
        assert!(stmt.output().is_empty());

        let mut input = Sqlda::from_vars(vec![XsqlVar::new(SqlType::Long, 4)]);
        input.set(0, 5);
        stmt.execute(&tx, Some(&input)).await.unwrap();
        assert!(stmt.fetch().await.unwrap().is_none());
        tx.commit().await.unwrap();

        assert_eq!(tx.state(), TransactionState::NoTransaction);
        assert_eq!(stmt.cached_rows(), 0);

        expect_prepare(&mut server, "insert into t values (?)").await;
        let blr = Blr::new(input.columns()).unwrap();
        let row = EncodedRow::new(input.columns()).unwrap();
        server
            .expect(&request(frontend::Execute {
                stmt: 7,
                trid: 3,
                input: Some((&blr, &row)),
                output: None,
            }))
            .await;
        server.expect(&request(frontend::Release { op: op::COMMIT, id: 3 })).await;
        server.expect_idle().await;
    }

    #[tokio::test]
    async fn truncated_describe_is_continued() {
        let (mut stmt, tx, mut server) = setup().await;

        let mut first = vec![info::SQL_STMT_TYPE, 4, 0, 1, 0, 0, 0];
        first.extend(describe(2, 1, &[(496, 4, "A")]));
        first.push(info::TRUNCATED);
        let mut second = describe(2, 1, &[(496, 4, "A"), (452, 10, "B")]);
        second.push(info::END);

        server.reply(&ok(0, 0, &first)).await;
        server.reply(&ok(0, 0, &second)).await;

        stmt.prepare(&tx, "select a, b from t").await.unwrap();
        assert_eq!(stmt.output().names().collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(stmt.output().columns()[1].sqllen, 10);

        expect_prepare(&mut server, "select a, b from t").await;
        let mut resume = vec![info::SQL_SQLDA_START, 2, 1, 0];
        resume.extend_from_slice(DESCRIBE_SELECT);
        server
            .expect(&request(frontend::Info {
                op: op::INFO_SQL,
                id: 7,
                items: &resume,
                buffer_len: MAX_BUFFER_LEN,
            }))
            .await;
    }

    #[tokio::test]
    async fn procedure_row_is_inline() {
        let (mut stmt, tx, mut server) = setup().await;

        let mut inline = BytesMut::new();
        inline.put_i32(op::SQL_RESPONSE);
        inline.put_i32(1);
        inline.put_i32(42);
        inline.put_i32(0);

        server.reply(&ok(0, 0, &prepared(8, &[(496, 4, "OUT")]))).await;
        server.reply(&inline).await;
        server.reply(&ok(0, 0, &[])).await;

        stmt.prepare(&tx, "execute procedure p").await.unwrap();
        stmt.execute(&tx, None).await.unwrap();

        let mut out = Sqlda::new(2);
        assert!(stmt.fetch_into(&mut out).await.unwrap());
        assert_eq!(out.columns()[0].sqldata, Some(Value::Long(42)));
        assert!(out.columns()[1].is_null());
        assert!(!stmt.fetch_into(&mut out).await.unwrap());

        // no cursor to close
        stmt.close().await.unwrap();

        expect_prepare(&mut server, "execute procedure p").await;
        let blr = Blr::new(stmt.output().columns()).unwrap();
        server
            .expect(&request(frontend::Execute { stmt: 7, trid: 3, input: None, output: Some(&blr) }))
            .await;
        server.expect_idle().await;
    }

    #[tokio::test]
    async fn invalid_handles_fail_before_sending() {
        let (mut stmt, mut tx, mut server) = setup().await;

        let err = stmt.execute(&tx, None).await.unwrap_err();
        assert_eq!(err.code(), isc::BAD_REQ_HANDLE);
        let err = stmt.fetch().await.unwrap_err();
        assert_eq!(err.code(), isc::BAD_REQ_HANDLE);

        server.reply(&ok(0, 0, &[])).await;
        tx.rollback().await.unwrap();
        server.expect(&request(frontend::Release { op: op::ROLLBACK, id: 3 })).await;

        let err = stmt.prepare(&tx, "select 1 from rdb$database").await.unwrap_err();
        assert_eq!(err.code(), isc::BAD_TRANS_HANDLE);

        let mut input = Sqlda::from_vars(vec![XsqlVar::new(SqlType::Long, 4)]);
        input.columns_mut()[0].sqlind = 0;
        assert_eq!(encode_input(Some(&input)).unwrap_err().code(), isc::DSQL_SQLDA_VALUE_ERR);
        server.expect_idle().await;
    }

    #[tokio::test]
    async fn drop_releases_statement() {
        let (mut stmt, tx, mut server) = setup().await;
        let db = stmt.attachment().clone();
        assert_eq!(db.statement_count(), 1);

        server.reply(&fail(isc::BAD_REQ_HANDLE)).await;
        let err = stmt.prepare(&tx, "selec").await.unwrap_err();
        assert!(err.diagnostic().is_some());
        expect_prepare(&mut server, "selec").await;

        server.reply(&ok(0, 0, &[])).await;
        stmt.free(FreeOption::Drop).await.unwrap();
        assert_eq!(stmt.id(), 0);
        assert_eq!(db.statement_count(), 0);
        server
            .expect(&request(frontend::FreeStatement { stmt: 7, option: isc::DSQL_DROP }))
            .await;

        // released statement is not released again
        drop(stmt);
        server.reply(&ok(8, 0, &[])).await;
        let stmt = db.statement().await.unwrap();
        server.expect(&request(frontend::Release { op: op::ALLOCATE_STATEMENT, id: 1 })).await;

        drop(stmt);
        assert_eq!(db.statement_count(), 0);
        server.reply(&ok(0, 0, &[])).await;
        server.reply(&ok(0, 0, &[])).await;
        db.info(&[info::END], 8).await.unwrap();
        server
            .expect(&request(frontend::FreeStatement { stmt: 8, option: isc::DSQL_DROP }))
            .await;
        drop(tx);
    }
}
