use std::sync::Arc;

use sqlx::{Sqlite, Transaction};
use tokio::sync::{Mutex, MutexGuard};

use crate::error::RepositoryError;

/// Shared handle to the live SQLite transaction of one unit of work.
///
/// Every repository built for the unit of work holds a clone, so all of
/// them execute against the same transaction. Taking the transaction out
/// leaves `None` behind; repository calls after that point fail instead of
/// silently running outside the transaction.
#[derive(Clone, Debug, Default)]
pub struct SqliteExecutor {
    tx: Arc<Mutex<Option<Transaction<'static, Sqlite>>>>,
}

impl SqliteExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn install(&self, tx: Transaction<'static, Sqlite>) {
        *self.tx.lock().await = Some(tx);
    }

    pub(crate) async fn take(&self) -> Option<Transaction<'static, Sqlite>> {
        self.tx.lock().await.take()
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, Option<Transaction<'static, Sqlite>>> {
        self.tx.lock().await
    }
}

/// Error for repository calls made after the transaction was taken.
pub(crate) fn detached_context() -> RepositoryError {
    RepositoryError::Storage("transactional context is no longer open".into())
}
