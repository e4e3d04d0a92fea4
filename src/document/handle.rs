use std::sync::Arc;

use async_trait::async_trait;
use redb::Database;

use crate::error::TransactionError;
use crate::transaction::{
    require_state, HandleState, TransactionHandle, TransactionHandleFactory,
};

use super::executor::DocumentExecutor;

/// One redb write transaction, wrapped behind the handle state machine.
pub struct DocumentTransactionHandle {
    db: Arc<Database>,
    executor: DocumentExecutor,
    state: HandleState,
}

impl DocumentTransactionHandle {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            executor: DocumentExecutor::new(),
            state: HandleState::Created,
        }
    }
}

#[async_trait]
impl TransactionHandle for DocumentTransactionHandle {
    type Context = DocumentExecutor;

    fn context(&self) -> DocumentExecutor {
        self.executor.clone()
    }

    fn state(&self) -> HandleState {
        self.state
    }

    async fn start(&mut self) -> Result<(), TransactionError> {
        require_state(self.state, HandleState::Created)?;
        // begin_write blocks until the single writer slot is free; keep
        // that wait off the async workers.
        let db = Arc::clone(&self.db);
        let txn = tokio::task::spawn_blocking(move || db.begin_write())
            .await
            .map_err(|err| TransactionError::BeginFailed(Box::new(err)))?
            .map_err(|err| TransactionError::BeginFailed(Box::new(err)))?;
        self.executor.install(txn);
        self.state = HandleState::Started;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), TransactionError> {
        require_state(self.state, HandleState::Started)?;
        let txn = self
            .executor
            .take()
            .ok_or_else(|| TransactionError::CommitFailed("transaction was detached".into()))?;
        match txn.commit() {
            Ok(()) => {
                self.state = HandleState::Committed;
                Ok(())
            }
            Err(err) => {
                // A failed commit consumes the native transaction.
                self.state = HandleState::RolledBack;
                Err(TransactionError::CommitFailed(Box::new(err)))
            }
        }
    }

    async fn rollback(&mut self) -> Result<(), TransactionError> {
        require_state(self.state, HandleState::Started)?;
        let txn = self
            .executor
            .take()
            .ok_or_else(|| TransactionError::RollbackFailed("transaction was detached".into()))?;
        self.state = HandleState::RolledBack;
        txn.abort()
            .map_err(|err| TransactionError::RollbackFailed(Box::new(err)))
    }

    async fn close(&mut self) -> Result<(), TransactionError> {
        if self.state == HandleState::Closed {
            return Err(TransactionError::InvalidState {
                expected: "any open state",
                actual: HandleState::Closed.name(),
            });
        }
        // Dropping a still-open write transaction aborts it.
        drop(self.executor.take());
        self.state = HandleState::Closed;
        Ok(())
    }
}

/// Produces document handles from a shared database.
pub struct DocumentHandleFactory {
    db: Arc<Database>,
}

impl DocumentHandleFactory {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TransactionHandleFactory for DocumentHandleFactory {
    type Handle = DocumentTransactionHandle;

    async fn create_handle(&self) -> Result<DocumentTransactionHandle, TransactionError> {
        Ok(DocumentTransactionHandle::new(self.db.clone()))
    }
}
