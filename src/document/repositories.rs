use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use redb::ReadableTable;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::model::{Client, Reservation};
use crate::provider::RepositoryProvider;
use crate::repository::{ClientRepository, RepositoryResult, ReservationRepository};

use super::executor::DocumentExecutor;
use super::storage_error;
use super::tables::{name_key, CLIENTS, CLIENTS_BY_NAME, RESERVATIONS, RESERVATIONS_BY_DATE};

/// Builds document repositories bound to one executor.
pub struct DocumentRepositoryProvider;

impl RepositoryProvider for DocumentRepositoryProvider {
    type Context = DocumentExecutor;

    fn client_repository(&self, context: &DocumentExecutor) -> Arc<dyn ClientRepository> {
        Arc::new(DocumentClientRepository::new(context.clone()))
    }

    fn reservation_repository(
        &self,
        context: &DocumentExecutor,
    ) -> Arc<dyn ReservationRepository> {
        Arc::new(DocumentReservationRepository::new(context.clone()))
    }
}

pub struct DocumentClientRepository {
    executor: DocumentExecutor,
}

impl DocumentClientRepository {
    pub fn new(executor: DocumentExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ClientRepository for DocumentClientRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Client>> {
        self.executor.with_txn(|txn| {
            let clients = txn.open_table(CLIENTS).map_err(storage_error)?;
            let mut all = Vec::new();
            for entry in clients.iter().map_err(storage_error)? {
                let (_, value) = entry.map_err(storage_error)?;
                all.push(decode_client(value.value())?);
            }
            all.sort_by(|a, b| {
                (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name))
            });
            Ok(all)
        })
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Client>> {
        if id.is_nil() {
            return Ok(None);
        }
        self.executor.with_txn(|txn| {
            let clients = txn.open_table(CLIENTS).map_err(storage_error)?;
            let result = clients
                .get(id.to_string().as_str())
                .map_err(storage_error)?
                .map(|guard| decode_client(guard.value()))
                .transpose();
            result
        })
    }

    async fn find_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> RepositoryResult<Option<Client>> {
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Ok(None);
        }
        self.executor.with_txn(|txn| {
            let by_name = txn.open_table(CLIENTS_BY_NAME).map_err(storage_error)?;
            let id = by_name
                .get(name_key(first_name, last_name).as_str())
                .map_err(storage_error)?
                .map(|guard| guard.value().to_owned());
            let Some(id) = id else {
                return Ok(None);
            };
            let clients = txn.open_table(CLIENTS).map_err(storage_error)?;
            let result = clients
                .get(id.as_str())
                .map_err(storage_error)?
                .map(|guard| decode_client(guard.value()))
                .transpose();
            result
        })
    }

    async fn save(&self, client: Client) -> RepositoryResult<Client> {
        require_field(&client.first_name, "first_name")?;
        require_field(&client.last_name, "last_name")?;
        self.executor.with_txn(|txn| {
            let mut clients = txn.open_table(CLIENTS).map_err(storage_error)?;
            let mut by_name = txn.open_table(CLIENTS_BY_NAME).map_err(storage_error)?;
            let key = name_key(&client.first_name, &client.last_name);
            let existing_id = by_name
                .get(key.as_str())
                .map_err(storage_error)?
                .map(|guard| guard.value().to_owned());
            match client.id {
                None => {
                    if existing_id.is_some() {
                        return Err(duplicate_name(&client));
                    }
                    let id = Uuid::new_v4();
                    let saved = Client {
                        id: Some(id),
                        ..client
                    };
                    let id_value = id.to_string();
                    let document = encode(&saved)?;
                    clients
                        .insert(id_value.as_str(), document.as_slice())
                        .map_err(storage_error)?;
                    by_name
                        .insert(key.as_str(), id_value.as_str())
                        .map_err(storage_error)?;
                    Ok(saved)
                }
                Some(id) => {
                    let id_value = id.to_string();
                    if existing_id.is_some_and(|existing| existing != id_value) {
                        return Err(duplicate_name(&client));
                    }
                    let previous = clients
                        .get(id_value.as_str())
                        .map_err(storage_error)?
                        .map(|guard| decode_client(guard.value()))
                        .transpose()?
                        .ok_or_else(|| {
                            RepositoryError::UpdateConflict(format!(
                                "client {id} no longer exists"
                            ))
                        })?;
                    let old_key = name_key(&previous.first_name, &previous.last_name);
                    if old_key != key {
                        by_name.remove(old_key.as_str()).map_err(storage_error)?;
                    }
                    let document = encode(&client)?;
                    clients
                        .insert(id_value.as_str(), document.as_slice())
                        .map_err(storage_error)?;
                    by_name
                        .insert(key.as_str(), id_value.as_str())
                        .map_err(storage_error)?;
                    Ok(client)
                }
            }
        })
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        self.executor.with_txn(|txn| {
            let mut clients = txn.open_table(CLIENTS).map_err(storage_error)?;
            let removed = clients
                .remove(id.to_string().as_str())
                .map_err(storage_error)?
                .map(|guard| decode_client(guard.value()))
                .transpose()?
                .ok_or_else(|| {
                    RepositoryError::UpdateConflict(format!("client {id} no longer exists"))
                })?;
            let mut by_name = txn.open_table(CLIENTS_BY_NAME).map_err(storage_error)?;
            by_name
                .remove(name_key(&removed.first_name, &removed.last_name).as_str())
                .map_err(storage_error)?;
            Ok(())
        })
    }
}

pub struct DocumentReservationRepository {
    executor: DocumentExecutor,
}

impl DocumentReservationRepository {
    pub fn new(executor: DocumentExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ReservationRepository for DocumentReservationRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Reservation>> {
        self.executor.with_txn(|txn| {
            let reservations = txn.open_table(RESERVATIONS).map_err(storage_error)?;
            let mut all = Vec::new();
            for entry in reservations.iter().map_err(storage_error)? {
                let (_, value) = entry.map_err(storage_error)?;
                all.push(decode_reservation(value.value())?);
            }
            all.sort_by_key(|reservation| reservation.date);
            Ok(all)
        })
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Reservation>> {
        if id.is_nil() {
            return Ok(None);
        }
        self.executor.with_txn(|txn| {
            let reservations = txn.open_table(RESERVATIONS).map_err(storage_error)?;
            let result = reservations
                .get(id.to_string().as_str())
                .map_err(storage_error)?
                .map(|guard| decode_reservation(guard.value()))
                .transpose();
            result
        })
    }

    async fn find_by_date(&self, date: NaiveDate) -> RepositoryResult<Option<Reservation>> {
        self.executor.with_txn(|txn| {
            let by_date = txn.open_table(RESERVATIONS_BY_DATE).map_err(storage_error)?;
            let id = by_date
                .get(date.to_string().as_str())
                .map_err(storage_error)?
                .map(|guard| guard.value().to_owned());
            let Some(id) = id else {
                return Ok(None);
            };
            let reservations = txn.open_table(RESERVATIONS).map_err(storage_error)?;
            let result = reservations
                .get(id.as_str())
                .map_err(storage_error)?
                .map(|guard| decode_reservation(guard.value()))
                .transpose();
            result
        })
    }

    async fn find_by_client(&self, client_id: Uuid) -> RepositoryResult<Vec<Reservation>> {
        if client_id.is_nil() {
            return Ok(Vec::new());
        }
        self.executor.with_txn(|txn| {
            let reservations = txn.open_table(RESERVATIONS).map_err(storage_error)?;
            let mut owned = Vec::new();
            for entry in reservations.iter().map_err(storage_error)? {
                let (_, value) = entry.map_err(storage_error)?;
                let reservation = decode_reservation(value.value())?;
                if reservation.client_id == client_id {
                    owned.push(reservation);
                }
            }
            owned.sort_by_key(|reservation| reservation.date);
            Ok(owned)
        })
    }

    async fn save(&self, reservation: Reservation) -> RepositoryResult<Reservation> {
        if reservation.client_id.is_nil() {
            return Err(RepositoryError::MissingField("client_id".into()));
        }
        self.executor.with_txn(|txn| {
            let mut reservations = txn.open_table(RESERVATIONS).map_err(storage_error)?;
            let mut by_date = txn.open_table(RESERVATIONS_BY_DATE).map_err(storage_error)?;
            let key = reservation.date.to_string();
            let existing_id = by_date
                .get(key.as_str())
                .map_err(storage_error)?
                .map(|guard| guard.value().to_owned());
            match reservation.id {
                None => {
                    if existing_id.is_some() {
                        return Err(duplicate_date(reservation.date));
                    }
                    let id = Uuid::new_v4();
                    let saved = Reservation {
                        id: Some(id),
                        ..reservation
                    };
                    let id_value = id.to_string();
                    let document = encode(&saved)?;
                    reservations
                        .insert(id_value.as_str(), document.as_slice())
                        .map_err(storage_error)?;
                    by_date
                        .insert(key.as_str(), id_value.as_str())
                        .map_err(storage_error)?;
                    Ok(saved)
                }
                Some(id) => {
                    let id_value = id.to_string();
                    if existing_id.is_some_and(|existing| existing != id_value) {
                        return Err(duplicate_date(reservation.date));
                    }
                    let previous = reservations
                        .get(id_value.as_str())
                        .map_err(storage_error)?
                        .map(|guard| decode_reservation(guard.value()))
                        .transpose()?
                        .ok_or_else(|| {
                            RepositoryError::UpdateConflict(format!(
                                "reservation {id} no longer exists"
                            ))
                        })?;
                    let old_key = previous.date.to_string();
                    if old_key != key {
                        by_date.remove(old_key.as_str()).map_err(storage_error)?;
                    }
                    let document = encode(&reservation)?;
                    reservations
                        .insert(id_value.as_str(), document.as_slice())
                        .map_err(storage_error)?;
                    by_date
                        .insert(key.as_str(), id_value.as_str())
                        .map_err(storage_error)?;
                    Ok(reservation)
                }
            }
        })
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        self.executor.with_txn(|txn| {
            let mut reservations = txn.open_table(RESERVATIONS).map_err(storage_error)?;
            let removed = reservations
                .remove(id.to_string().as_str())
                .map_err(storage_error)?
                .map(|guard| decode_reservation(guard.value()))
                .transpose()?
                .ok_or_else(|| {
                    RepositoryError::UpdateConflict(format!(
                        "reservation {id} no longer exists"
                    ))
                })?;
            let mut by_date = txn.open_table(RESERVATIONS_BY_DATE).map_err(storage_error)?;
            by_date
                .remove(removed.date.to_string().as_str())
                .map_err(storage_error)?;
            Ok(())
        })
    }
}

fn require_field(value: &str, field: &str) -> RepositoryResult<()> {
    if value.trim().is_empty() {
        return Err(RepositoryError::MissingField(field.to_owned()));
    }
    Ok(())
}

fn duplicate_name(client: &Client) -> RepositoryError {
    RepositoryError::DuplicateKey(format!(
        "client named {} {}",
        client.first_name, client.last_name
    ))
}

fn duplicate_date(date: NaiveDate) -> RepositoryError {
    RepositoryError::DuplicateKey(format!("reservation on {date}"))
}

fn encode<T: serde::Serialize>(record: &T) -> RepositoryResult<Vec<u8>> {
    serde_json::to_vec(record).map_err(|err| RepositoryError::Storage(err.into()))
}

fn decode_client(document: &[u8]) -> RepositoryResult<Client> {
    serde_json::from_slice(document).map_err(|err| RepositoryError::Storage(err.into()))
}

fn decode_reservation(document: &[u8]) -> RepositoryResult<Reservation> {
    serde_json::from_slice(document).map_err(|err| RepositoryError::Storage(err.into()))
}
