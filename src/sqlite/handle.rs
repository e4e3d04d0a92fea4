use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::TransactionError;
use crate::transaction::{
    require_state, HandleState, TransactionHandle, TransactionHandleFactory,
};

use super::executor::SqliteExecutor;
use super::map_commit_error;

/// One SQLite transaction, wrapped behind the handle state machine.
pub struct SqliteTransactionHandle {
    pool: Arc<SqlitePool>,
    executor: SqliteExecutor,
    state: HandleState,
}

impl SqliteTransactionHandle {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            pool,
            executor: SqliteExecutor::new(),
            state: HandleState::Created,
        }
    }
}

#[async_trait]
impl TransactionHandle for SqliteTransactionHandle {
    type Context = SqliteExecutor;

    fn context(&self) -> SqliteExecutor {
        self.executor.clone()
    }

    fn state(&self) -> HandleState {
        self.state
    }

    async fn start(&mut self) -> Result<(), TransactionError> {
        require_state(self.state, HandleState::Created)?;
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|err| TransactionError::BeginFailed(err.into()))?;
        self.executor.install(tx).await;
        self.state = HandleState::Started;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), TransactionError> {
        require_state(self.state, HandleState::Started)?;
        let tx = self
            .executor
            .take()
            .await
            .ok_or_else(|| TransactionError::CommitFailed("transaction was detached".into()))?;
        match tx.commit().await {
            Ok(()) => {
                self.state = HandleState::Committed;
                Ok(())
            }
            Err(err) => {
                // A failed commit consumes the native transaction.
                self.state = HandleState::RolledBack;
                Err(map_commit_error(err))
            }
        }
    }

    async fn rollback(&mut self) -> Result<(), TransactionError> {
        require_state(self.state, HandleState::Started)?;
        let tx = self
            .executor
            .take()
            .await
            .ok_or_else(|| TransactionError::RollbackFailed("transaction was detached".into()))?;
        self.state = HandleState::RolledBack;
        tx.rollback()
            .await
            .map_err(|err| TransactionError::RollbackFailed(err.into()))
    }

    async fn close(&mut self) -> Result<(), TransactionError> {
        if self.state == HandleState::Closed {
            return Err(TransactionError::InvalidState {
                expected: "any open state",
                actual: HandleState::Closed.name(),
            });
        }
        // Dropping a still-open transaction returns its connection to the
        // pool and rolls the transaction back.
        drop(self.executor.take().await);
        self.state = HandleState::Closed;
        Ok(())
    }
}

/// Produces SQLite handles from a shared connection pool.
pub struct SqliteHandleFactory {
    pool: Arc<SqlitePool>,
}

impl SqliteHandleFactory {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionHandleFactory for SqliteHandleFactory {
    type Handle = SqliteTransactionHandle;

    async fn create_handle(&self) -> Result<SqliteTransactionHandle, TransactionError> {
        Ok(SqliteTransactionHandle::new(self.pool.clone()))
    }
}
