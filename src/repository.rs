use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::model::{Client, Reservation};

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// CRUD operations over clients, bound to one transactional context.
///
/// Implementations are cheap stateless wrappers; they are only valid for the
/// unit of work they were built for and must not be retained afterwards.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn find_all(&self) -> RepositoryResult<Vec<Client>>;

    /// Yields `None` for a nil identifier instead of failing.
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Client>>;

    /// Yields `None` for blank names instead of failing.
    async fn find_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> RepositoryResult<Option<Client>>;

    /// Insert when the record carries no identifier, update otherwise.
    ///
    /// Returns the persisted record, with the assigned identifier on insert.
    async fn save(&self, client: Client) -> RepositoryResult<Client>;

    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;
}

/// CRUD operations over reservations, bound to one transactional context.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn find_all(&self) -> RepositoryResult<Vec<Reservation>>;

    /// Yields `None` for a nil identifier instead of failing.
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Reservation>>;

    async fn find_by_date(&self, date: NaiveDate) -> RepositoryResult<Option<Reservation>>;

    /// Yields an empty list for a nil client identifier.
    async fn find_by_client(&self, client_id: Uuid) -> RepositoryResult<Vec<Reservation>>;

    /// Insert when the record carries no identifier, update otherwise.
    async fn save(&self, reservation: Reservation) -> RepositoryResult<Reservation>;

    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;
}
