//! Relational backend on SQLite through sqlx.
//!
//! Uniqueness of the client name pair and of reservation dates is enforced
//! by unique indexes, so a concurrent writer that slips past the
//! application check is still rejected by the store.

pub mod executor;
pub mod handle;
pub mod repositories;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::coordinator::TransactionCoordinator;
use crate::error::{RepositoryError, TransactionError};

pub use executor::SqliteExecutor;
pub use handle::{SqliteHandleFactory, SqliteTransactionHandle};
pub use repositories::{
    SqliteClientRepository, SqliteRepositoryProvider, SqliteReservationRepository,
};

/// Transaction manager for the SQLite backend.
pub type SqliteTransactionManager =
    TransactionCoordinator<SqliteHandleFactory, SqliteRepositoryProvider>;

impl SqliteTransactionManager {
    /// Manager with the default handle factory and repository provider.
    pub fn from_pool(pool: Arc<SqlitePool>) -> Self {
        TransactionCoordinator::new(SqliteHandleFactory::new(pool), SqliteRepositoryProvider)
    }
}

/// Open a pool suitable for concurrent units of work.
pub async fn connect(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    SqlitePoolOptions::new().connect_with(options).await
}

/// Create the clients and reservations tables and their indexes.
pub async fn initialize_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS clients (\
            id TEXT PRIMARY KEY, \
            first_name TEXT NOT NULL, \
            last_name TEXT NOT NULL, \
            UNIQUE (first_name, last_name)\
         )",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS reservations (\
            id TEXT PRIMARY KEY, \
            client_id TEXT NOT NULL REFERENCES clients (id), \
            date TEXT NOT NULL UNIQUE\
         )",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS reservations_client_id ON reservations (client_id)",
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Classify a sqlx failure into the repository taxonomy.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db) = &err {
        match db.kind() {
            sqlx::error::ErrorKind::UniqueViolation => {
                return RepositoryError::DuplicateKey(db.message().to_owned());
            }
            sqlx::error::ErrorKind::NotNullViolation => {
                return RepositoryError::MissingField(db.message().to_owned());
            }
            sqlx::error::ErrorKind::ForeignKeyViolation => {
                return RepositoryError::UpdateConflict(db.message().to_owned());
            }
            _ => {}
        }
    }
    RepositoryError::Storage(err.into())
}

/// Classify a commit failure. Constraint violations deferred to commit keep
/// their category; anything else is a commit failure.
pub(crate) fn map_commit_error(err: sqlx::Error) -> TransactionError {
    match map_sqlx_error(err) {
        RepositoryError::Storage(source) => TransactionError::CommitFailed(source),
        classified => TransactionError::Repository(classified),
    }
}
