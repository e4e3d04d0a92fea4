//! Booking Core
//!
//! Transactional core for a booking system managing clients and
//! reservations over two interchangeable storage backends, a relational
//! one (SQLite through sqlx) and a document one (redb). The crate isolates
//! transaction management from repository implementations: every business
//! operation runs as one unit of work against repositories bound to a
//! single backend transaction, with commit-or-rollback and resource
//! release guaranteed on every exit path.

pub mod coordinator;
pub mod document;
pub mod error;
pub mod model;
pub mod provider;
pub mod repository;
pub mod service;
pub mod sqlite;
pub mod transaction;

pub use coordinator::{TransactionCoordinator, TransactionManager};
pub use error::{
    BookingError, RepositoryError, StorageFailure, TransactionError, UnitOfWorkError,
};
pub use model::{Client, Reservation};
pub use provider::RepositoryProvider;
pub use repository::{ClientRepository, RepositoryResult, ReservationRepository};
pub use service::{BookingResult, BookingService};
pub use transaction::{HandleState, TransactionHandle, TransactionHandleFactory};
