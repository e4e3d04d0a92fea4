use std::sync::Arc;

use parking_lot::Mutex;
use redb::WriteTransaction;

use crate::error::RepositoryError;

/// Shared handle to the live redb write transaction of one unit of work.
///
/// redb serializes writers, so one write transaction is the whole
/// transactional context. Repositories hold clones and run their operations
/// against it under a short-lived lock; no lock is held across await
/// points.
#[derive(Clone)]
pub struct DocumentExecutor {
    txn: Arc<Mutex<Option<WriteTransaction>>>,
}

impl DocumentExecutor {
    pub(crate) fn new() -> Self {
        Self {
            txn: Arc::new(Mutex::new(None)),
        }
    }

    pub(crate) fn install(&self, txn: WriteTransaction) {
        *self.txn.lock() = Some(txn);
    }

    pub(crate) fn take(&self) -> Option<WriteTransaction> {
        self.txn.lock().take()
    }

    /// Run an operation against the live transaction.
    pub(crate) fn with_txn<R>(
        &self,
        op: impl FnOnce(&WriteTransaction) -> Result<R, RepositoryError>,
    ) -> Result<R, RepositoryError> {
        let guard = self.txn.lock();
        let txn = guard.as_ref().ok_or_else(detached_context)?;
        op(txn)
    }
}

/// Error for repository calls made after the transaction was taken.
pub(crate) fn detached_context() -> RepositoryError {
    RepositoryError::Storage("transactional context is no longer open".into())
}
