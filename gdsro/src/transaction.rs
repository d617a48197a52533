//! The [`Transaction`] type.
use crate::{
    Result,
    attachment::{Attachment, Deferred},
    clumplet::Clumplet,
    common::verbose,
    error::StateError,
    gds::{frontend, op},
};

/// Transaction lifecycle state.
///
/// ```text
/// NoTransaction -> Starting -> Started -> Preparing -> Prepared
///                              Started | Prepared -> Committing | RollingBack -> NoTransaction
///                              Started | Prepared -> Committing | RollingBack -> Started   (retaining)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    NoTransaction,
    Starting,
    Started,
    Preparing,
    Prepared,
    Committing,
    RollingBack,
}

use TransactionState::*;

/// An RAII implementation of transaction scope.
///
/// To begin a transaction, use [`Attachment::begin`].
///
/// To commit transaction, use [`Transaction::commit`].
///
/// If a started transaction is dropped, it is rolled back before the next
/// exchange on its attachment.
///
/// # Example
///
/// ```no_run
/// # async fn test(db: gdsro::Attachment) -> gdsro::Result<()> {
/// let mut tx = db.begin().await?;
///
/// db.execute_immediate(&tx, "insert into post(name) values('foo')", None, None).await?;
///
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Transaction {
    attachment: Attachment,
    id: i32,
    state: TransactionState,
}

impl Transaction {
    /// Create a transaction that is not started yet.
    pub fn new(attachment: &Attachment) -> Self {
        Self { attachment: attachment.clone(), id: 0, state: NoTransaction }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    /// Server handle of a started or prepared transaction.
    pub(crate) fn handle(&self) -> Result<i32> {
        match self.state {
            Started | Prepared => Ok(self.id),
            _ => Err(StateError::InvalidTransaction.into()),
        }
    }

    fn transition(
        &mut self,
        operation: &'static str,
        from: &[TransactionState],
        to: TransactionState,
    ) -> Result<TransactionState> {
        if !from.contains(&self.state) {
            return Err(StateError::TransactionState { operation, state: self.state }.into());
        }
        Ok(std::mem::replace(&mut self.state, to))
    }

    /// Start the transaction.
    pub async fn start(&mut self, tpb: &Clumplet) -> Result<()> {
        tpb.validate()?;
        self.transition("start", &[NoTransaction], Starting)?;

        let res = async {
            let mut session = self.attachment.lock().await?;
            let rdb_id = session.rdb_id;
            session.request(frontend::Transaction { rdb_id, tpb }).await
        }
        .await;

        match res {
            Ok(res) => {
                self.id = res.object;
                self.state = Started;
                self.attachment.register_transaction(self.id);
                verbose!(trid = self.id, "transaction started");
                Ok(())
            }
            Err(err) => {
                self.state = NoTransaction;
                Err(err)
            }
        }
    }

    /// First phase of a two phase commit.
    pub async fn prepare(&mut self) -> Result<()> {
        let prev = self.transition("prepare", &[Started], Preparing)?;
        let id = self.id;
        let res = self.exchange(frontend::Release { op: op::PREPARE, id }).await;
        self.state = if res.is_ok() { Prepared } else { prev };
        res
    }

    /// First phase of a two phase commit, with a message recorded by the server.
    pub async fn prepare_with(&mut self, message: &[u8]) -> Result<()> {
        let prev = self.transition("prepare", &[Started], Preparing)?;
        let trid = self.id;
        let res = self.exchange(frontend::Prepare2 { trid, message }).await;
        self.state = if res.is_ok() { Prepared } else { prev };
        res
    }

    /// Commit the transaction.
    ///
    /// The transaction ends even if the exchange fails.
    pub async fn commit(&mut self) -> Result<()> {
        self.end(op::COMMIT, "commit", Committing).await
    }

    /// Rollback the transaction.
    ///
    /// The transaction ends even if the exchange fails.
    pub async fn rollback(&mut self) -> Result<()> {
        self.end(op::ROLLBACK, "rollback", RollingBack).await
    }

    /// Commit the work and keep the transaction open.
    pub async fn commit_retaining(&mut self) -> Result<()> {
        self.retain(op::COMMIT_RETAINING, "commit", Committing).await
    }

    /// Rollback the work and keep the transaction open.
    pub async fn rollback_retaining(&mut self) -> Result<()> {
        self.retain(op::ROLLBACK_RETAINING, "rollback", RollingBack).await
    }

    async fn end(&mut self, op: i32, operation: &'static str, via: TransactionState) -> Result<()> {
        self.transition(operation, &[Started, Prepared], via)?;
        let id = self.id;
        let res = self.exchange(frontend::Release { op, id }).await;
        self.state = NoTransaction;
        self.attachment.deregister_transaction(id);
        res
    }

    async fn retain(&mut self, op: i32, operation: &'static str, via: TransactionState) -> Result<()> {
        let prev = self.transition(operation, &[Started, Prepared], via)?;
        let id = self.id;
        let res = self.exchange(frontend::Release { op, id }).await;
        self.state = if res.is_ok() { Started } else { prev };
        res
    }

    async fn exchange<F: frontend::FrontendProtocol>(&self, message: F) -> Result<()> {
        let mut session = self.attachment.lock().await?;
        session.request(message).await?;
        Ok(())
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if matches!(self.state, Started | Prepared) {
            self.attachment.defer(Deferred::Rollback(self.id));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        attachment::test::{fail, ok, pair, request},
        gds::isc,
    };

    async fn started() -> (Transaction, crate::attachment::test::Server) {
        let (db, mut server) = pair();
        server.reply(&ok(3, 0, &[])).await;
        let tx = db.begin().await.unwrap();
        server.expect(&request(frontend::Transaction { rdb_id: 1, tpb: &Clumplet::default_tpb() })).await;
        (tx, server)
    }

    #[tokio::test]
    async fn illegal_transitions_keep_state() {
        let (db, mut server) = pair();
        let mut tx = Transaction::new(&db);

        for err in [
            tx.commit().await.unwrap_err(),
            tx.rollback().await.unwrap_err(),
            tx.commit_retaining().await.unwrap_err(),
            tx.rollback_retaining().await.unwrap_err(),
            tx.prepare().await.unwrap_err(),
        ] {
            assert_eq!(err.code(), isc::TRA_STATE);
        }
        assert_eq!(tx.state(), NoTransaction);
        server.expect_idle().await;

        let (mut tx, mut server) = started().await;
        let err = tx.start(&Clumplet::default_tpb()).await.unwrap_err();
        assert_eq!(err.code(), isc::TRA_STATE);
        assert_eq!(tx.state(), Started);

        server.reply(&ok(0, 0, &[])).await;
        tx.prepare().await.unwrap();
        assert_eq!(tx.state(), Prepared);
        let err = tx.prepare().await.unwrap_err();
        assert_eq!(err.code(), isc::TRA_STATE);
        assert_eq!(tx.state(), Prepared);

        server.reply(&ok(0, 0, &[])).await;
        tx.commit().await.unwrap();
        assert_eq!(tx.state(), NoTransaction);
        server.expect(&request(frontend::Release { op: op::PREPARE, id: 3 })).await;
        server.expect(&request(frontend::Release { op: op::COMMIT, id: 3 })).await;
    }

    #[tokio::test]
    async fn retaining_keeps_id() {
        let (mut tx, mut server) = started().await;

        server.reply(&ok(0, 0, &[])).await;
        tx.commit_retaining().await.unwrap();
        assert_eq!((tx.state(), tx.id()), (Started, 3));
        assert_eq!(tx.attachment().transaction_count(), 1);

        server.reply(&ok(0, 0, &[])).await;
        tx.rollback_retaining().await.unwrap();
        assert_eq!(tx.state(), Started);

        server.reply(&ok(0, 0, &[])).await;
        tx.rollback().await.unwrap();
        assert_eq!(tx.attachment().transaction_count(), 0);

        server.expect(&request(frontend::Release { op: op::COMMIT_RETAINING, id: 3 })).await;
        server.expect(&request(frontend::Release { op: op::ROLLBACK_RETAINING, id: 3 })).await;
        server.expect(&request(frontend::Release { op: op::ROLLBACK, id: 3 })).await;
    }

    #[tokio::test]
    async fn failed_commit_still_ends() {
        let (mut tx, mut server) = started().await;
        let db = tx.attachment().clone();
        server.reply(&fail(isc::BAD_TRANS_HANDLE)).await;
        let err = tx.commit().await.unwrap_err();
        assert_eq!(err.code(), isc::BAD_TRANS_HANDLE);
        assert_eq!(tx.state(), NoTransaction);
        assert_eq!(tx.attachment().transaction_count(), 0);

        // no deferred rollback for an ended transaction
        drop(tx);
        server.expect(&request(frontend::Release { op: op::COMMIT, id: 3 })).await;
        server.reply(&ok(0, 0, &[])).await;
        db.info(&[crate::gds::info::END], 8).await.unwrap();
        server
            .expect(&request(frontend::Info {
                op: op::INFO_DATABASE,
                id: 1,
                items: &[crate::gds::info::END],
                buffer_len: 8,
            }))
            .await;
        server.expect_idle().await;
    }

    #[tokio::test]
    async fn failed_prepare_restores_state() {
        let (mut tx, mut server) = started().await;
        server.reply(&fail(isc::TRA_STATE)).await;
        tx.prepare_with(b"xa").await.unwrap_err();
        assert_eq!(tx.state(), Started);
        server.expect(&request(frontend::Prepare2 { trid: 3, message: b"xa" })).await;
    }
}
