use chrono::NaiveDate;
use tracing::error;
use uuid::Uuid;

use crate::coordinator::TransactionManager;
use crate::error::{BookingError, RepositoryError, TransactionError, UnitOfWorkError};
use crate::model::{Client, Reservation};

/// Result type for the booking operations.
pub type BookingResult<T> = Result<T, BookingError>;

/// Business operations over clients and reservations.
///
/// The service holds no state of its own; every operation validates its
/// arguments, then runs exactly one unit of work through the transaction
/// manager. Precondition checks (existence, name or date collisions) raise
/// business errors from inside the unit of work, so the losing side of a
/// concurrent race still gets a clean business outcome when the store
/// rejects its write.
pub struct BookingService<M> {
    transactions: M,
}

impl<M: TransactionManager> BookingService<M> {
    pub fn new(transactions: M) -> Self {
        Self { transactions }
    }

    pub async fn all_clients(&self) -> BookingResult<Vec<Client>> {
        self.transactions
            .in_client_transaction(|clients| async move { Ok(clients.find_all().await?) })
            .await
            .map_err(into_booking_error)
    }

    pub async fn find_client(&self, id: Uuid) -> BookingResult<Client> {
        let id = require_id(id, "client")?;
        self.transactions
            .in_client_transaction(move |clients| async move {
                clients
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| BookingError::ClientNotFound(id).into())
            })
            .await
            .map_err(into_booking_error)
    }

    pub async fn find_client_named(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> BookingResult<Client> {
        let first_name = require_name(first_name, "first name")?;
        let last_name = require_name(last_name, "last name")?;
        self.transactions
            .in_client_transaction(move |clients| async move {
                let found = clients.find_by_name(&first_name, &last_name).await?;
                found.ok_or_else(|| {
                    BookingError::NoClientNamed {
                        first_name,
                        last_name,
                    }
                    .into()
                })
            })
            .await
            .map_err(into_booking_error)
    }

    pub async fn insert_new_client(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> BookingResult<Client> {
        let first_name = require_name(first_name, "first name")?;
        let last_name = require_name(last_name, "last name")?;
        let (first, last) = (first_name.clone(), last_name.clone());
        self.transactions
            .in_client_transaction(move |clients| async move {
                if clients.find_by_name(&first, &last).await?.is_some() {
                    return Err(BookingError::ClientAlreadyExists {
                        first_name: first,
                        last_name: last,
                    }
                    .into());
                }
                Ok(clients.save(Client::new(first, last)).await?)
            })
            .await
            .map_err(|err| {
                on_duplicate(err, || BookingError::ClientAlreadyExists {
                    first_name,
                    last_name,
                })
            })
    }

    pub async fn rename_client(
        &self,
        id: Uuid,
        first_name: &str,
        last_name: &str,
    ) -> BookingResult<Client> {
        let id = require_id(id, "client")?;
        let first_name = require_name(first_name, "first name")?;
        let last_name = require_name(last_name, "last name")?;
        let (first, last) = (first_name.clone(), last_name.clone());
        self.transactions
            .in_client_transaction(move |clients| async move {
                if clients.find_by_id(id).await?.is_none() {
                    return Err(BookingError::ClientNotFound(id).into());
                }
                if let Some(other) = clients.find_by_name(&first, &last).await? {
                    if other.id != Some(id) {
                        return Err(BookingError::ClientAlreadyExists {
                            first_name: first,
                            last_name: last,
                        }
                        .into());
                    }
                }
                Ok(clients.save(Client::with_id(id, first, last)).await?)
            })
            .await
            .map_err(|err| {
                on_duplicate(err, || BookingError::ClientAlreadyExists {
                    first_name,
                    last_name,
                })
            })
    }

    /// Remove a client together with every reservation it owns.
    pub async fn delete_client(&self, id: Uuid) -> BookingResult<()> {
        let id = require_id(id, "client")?;
        self.transactions
            .in_transaction(move |clients, reservations| async move {
                if clients.find_by_id(id).await?.is_none() {
                    return Err(BookingError::ClientNotFound(id).into());
                }
                for reservation in reservations.find_by_client(id).await? {
                    if let Some(reservation_id) = reservation.id {
                        reservations.delete(reservation_id).await?;
                    }
                }
                clients.delete(id).await?;
                Ok(())
            })
            .await
            .map_err(into_booking_error)
    }

    pub async fn all_reservations(&self) -> BookingResult<Vec<Reservation>> {
        self.transactions
            .in_reservation_transaction(|reservations| async move {
                Ok(reservations.find_all().await?)
            })
            .await
            .map_err(into_booking_error)
    }

    pub async fn find_reservation(&self, id: Uuid) -> BookingResult<Reservation> {
        let id = require_id(id, "reservation")?;
        self.transactions
            .in_reservation_transaction(move |reservations| async move {
                reservations
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| BookingError::ReservationNotFound(id).into())
            })
            .await
            .map_err(into_booking_error)
    }

    pub async fn find_reservation_on(&self, date: NaiveDate) -> BookingResult<Reservation> {
        self.transactions
            .in_reservation_transaction(move |reservations| async move {
                reservations
                    .find_by_date(date)
                    .await?
                    .ok_or_else(|| BookingError::NoReservationOn(date).into())
            })
            .await
            .map_err(into_booking_error)
    }

    /// All reservations owned by an existing client.
    pub async fn reservations_of(&self, client_id: Uuid) -> BookingResult<Vec<Reservation>> {
        let client_id = require_id(client_id, "client")?;
        self.transactions
            .in_transaction(move |clients, reservations| async move {
                if clients.find_by_id(client_id).await?.is_none() {
                    return Err(BookingError::ClientNotFound(client_id).into());
                }
                Ok(reservations.find_by_client(client_id).await?)
            })
            .await
            .map_err(into_booking_error)
    }

    pub async fn insert_new_reservation(
        &self,
        client_id: Uuid,
        date: NaiveDate,
    ) -> BookingResult<Reservation> {
        let client_id = require_id(client_id, "client")?;
        self.transactions
            .in_transaction(move |clients, reservations| async move {
                if clients.find_by_id(client_id).await?.is_none() {
                    return Err(BookingError::ClientNotFound(client_id).into());
                }
                if reservations.find_by_date(date).await?.is_some() {
                    return Err(BookingError::DateAlreadyBooked(date).into());
                }
                Ok(reservations.save(Reservation::new(client_id, date)).await?)
            })
            .await
            .map_err(|err| on_duplicate(err, || BookingError::DateAlreadyBooked(date)))
    }

    pub async fn reschedule_reservation(
        &self,
        id: Uuid,
        date: NaiveDate,
    ) -> BookingResult<Reservation> {
        let id = require_id(id, "reservation")?;
        self.transactions
            .in_reservation_transaction(move |reservations| async move {
                let existing = reservations
                    .find_by_id(id)
                    .await?
                    .ok_or(BookingError::ReservationNotFound(id))?;
                if let Some(other) = reservations.find_by_date(date).await? {
                    if other.id != Some(id) {
                        return Err(BookingError::DateAlreadyBooked(date).into());
                    }
                }
                Ok(reservations
                    .save(Reservation::with_id(id, existing.client_id, date))
                    .await?)
            })
            .await
            .map_err(|err| on_duplicate(err, || BookingError::DateAlreadyBooked(date)))
    }

    pub async fn delete_reservation(&self, id: Uuid) -> BookingResult<()> {
        let id = require_id(id, "reservation")?;
        self.transactions
            .in_reservation_transaction(move |reservations| async move {
                if reservations.find_by_id(id).await?.is_none() {
                    return Err(BookingError::ReservationNotFound(id).into());
                }
                reservations.delete(id).await?;
                Ok(())
            })
            .await
            .map_err(into_booking_error)
    }
}

fn require_name(value: &str, field: &'static str) -> Result<String, BookingError> {
    let name = value.trim();
    if name.is_empty() {
        return Err(BookingError::InvalidRequest(format!(
            "{field} must not be blank"
        )));
    }
    Ok(name.to_owned())
}

fn require_id(id: Uuid, kind: &'static str) -> Result<Uuid, BookingError> {
    if id.is_nil() {
        return Err(BookingError::InvalidRequest(format!(
            "{kind} identifier must not be nil"
        )));
    }
    Ok(id)
}

/// Business errors pass through; infrastructure failures become one
/// reportable database error, with the category logged for diagnostics.
fn into_booking_error(err: UnitOfWorkError) -> BookingError {
    match err {
        UnitOfWorkError::Business(err) => err,
        UnitOfWorkError::Transaction(err) => {
            error!(category = %err, "unit of work failed");
            BookingError::Database(err)
        }
    }
}

/// A uniqueness violation rejected by the store means a concurrent writer
/// got there first; report it as the same business outcome the precondition
/// check would have raised.
fn on_duplicate(err: UnitOfWorkError, already_exists: impl FnOnce() -> BookingError) -> BookingError {
    match err {
        UnitOfWorkError::Transaction(TransactionError::Repository(
            RepositoryError::DuplicateKey(_),
        )) => already_exists(),
        other => into_booking_error(other),
    }
}
