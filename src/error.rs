use chrono::NaiveDate;
use uuid::Uuid;

/// Opaque backend failure carried as the cause of a classified error.
pub type StorageFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure categories surfaced by repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// A required field was absent or blank on save.
    #[error("required field `{0}` is missing")]
    MissingField(String),

    /// A natural-key or date uniqueness constraint would be broken.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// An update or delete targeted a record that no longer exists.
    #[error("update conflict: {0}")]
    UpdateConflict(String),

    /// The caller passed a malformed argument to a repository.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Any other storage failure, kept with its cause.
    #[error("storage error: {0}")]
    Storage(#[source] StorageFailure),
}

/// Failures raised at the transaction boundary.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("failed to begin transaction: {0}")]
    BeginFailed(#[source] StorageFailure),

    #[error("transaction commit failed: {0}")]
    CommitFailed(#[source] StorageFailure),

    #[error("transaction rollback failed: {0}")]
    RollbackFailed(#[source] StorageFailure),

    /// A handle method was invoked outside its legal state.
    #[error("invalid transaction state: expected {expected}, was {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    /// A classified repository failure observed inside the transaction.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Business-level outcomes of the booking operations.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("no client with identifier {0}")]
    ClientNotFound(Uuid),

    #[error("no client named {first_name} {last_name}")]
    NoClientNamed {
        first_name: String,
        last_name: String,
    },

    #[error("no reservation with identifier {0}")]
    ReservationNotFound(Uuid),

    #[error("no reservation on {0}")]
    NoReservationOn(NaiveDate),

    #[error("a client named {first_name} {last_name} already exists")]
    ClientAlreadyExists {
        first_name: String,
        last_name: String,
    },

    #[error("a reservation on {0} already exists")]
    DateAlreadyBooked(NaiveDate),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Anything the store failed at that is not a business outcome.
    #[error("database error")]
    Database(#[source] TransactionError),
}

/// Error type of one unit of work.
///
/// Business errors raised by the caller's own precondition checks pass
/// through the coordinator unchanged; everything else is an infrastructure
/// failure carrying its category.
#[derive(Debug, thiserror::Error)]
pub enum UnitOfWorkError {
    #[error(transparent)]
    Business(#[from] BookingError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

impl From<RepositoryError> for UnitOfWorkError {
    fn from(err: RepositoryError) -> Self {
        Self::Transaction(TransactionError::Repository(err))
    }
}
