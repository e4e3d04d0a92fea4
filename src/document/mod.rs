//! Document backend on redb.
//!
//! Each record kind is a table of JSON documents keyed by identifier, with
//! a companion index table per natural key. redb admits one writer at a
//! time, so the uniqueness probes repositories run against the index tables
//! are authoritative for the whole transaction.

pub mod executor;
pub mod handle;
pub mod repositories;
mod tables;

use std::path::Path;
use std::sync::Arc;

use redb::Database;

use crate::coordinator::TransactionCoordinator;
use crate::error::RepositoryError;

pub use executor::DocumentExecutor;
pub use handle::{DocumentHandleFactory, DocumentTransactionHandle};
pub use repositories::{
    DocumentClientRepository, DocumentRepositoryProvider, DocumentReservationRepository,
};

/// Transaction manager for the document backend.
pub type DocumentTransactionManager =
    TransactionCoordinator<DocumentHandleFactory, DocumentRepositoryProvider>;

impl DocumentTransactionManager {
    /// Manager with the default handle factory and repository provider.
    pub fn from_database(db: Arc<Database>) -> Self {
        TransactionCoordinator::new(DocumentHandleFactory::new(db), DocumentRepositoryProvider)
    }
}

/// Open or create the document store at the given path.
pub fn open(path: &Path) -> Result<Database, redb::DatabaseError> {
    Database::create(path)
}

pub(crate) fn storage_error<E>(err: E) -> RepositoryError
where
    E: std::error::Error + Send + Sync + 'static,
{
    RepositoryError::Storage(Box::new(err))
}
