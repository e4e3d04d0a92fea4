use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::model::{Client, Reservation};
use crate::provider::RepositoryProvider;
use crate::repository::{ClientRepository, RepositoryResult, ReservationRepository};

use super::executor::{detached_context, SqliteExecutor};
use super::map_sqlx_error;

/// Builds SQLite repositories bound to one executor.
pub struct SqliteRepositoryProvider;

impl RepositoryProvider for SqliteRepositoryProvider {
    type Context = SqliteExecutor;

    fn client_repository(&self, context: &SqliteExecutor) -> Arc<dyn ClientRepository> {
        Arc::new(SqliteClientRepository::new(context.clone()))
    }

    fn reservation_repository(&self, context: &SqliteExecutor) -> Arc<dyn ReservationRepository> {
        Arc::new(SqliteReservationRepository::new(context.clone()))
    }
}

pub struct SqliteClientRepository {
    executor: SqliteExecutor,
}

impl SqliteClientRepository {
    pub fn new(executor: SqliteExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ClientRepository for SqliteClientRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Client>> {
        let mut guard = self.executor.lock().await;
        let tx = guard.as_mut().ok_or_else(detached_context)?;
        let rows = sqlx::query(
            "SELECT id, first_name, last_name FROM clients ORDER BY last_name, first_name",
        )
        .fetch_all(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;
        rows.iter().map(client_from_row).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Client>> {
        if id.is_nil() {
            return Ok(None);
        }
        let mut guard = self.executor.lock().await;
        let tx = guard.as_mut().ok_or_else(detached_context)?;
        let row = sqlx::query("SELECT id, first_name, last_name FROM clients WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(client_from_row).transpose()
    }

    async fn find_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> RepositoryResult<Option<Client>> {
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Ok(None);
        }
        let mut guard = self.executor.lock().await;
        let tx = guard.as_mut().ok_or_else(detached_context)?;
        let row = sqlx::query(
            "SELECT id, first_name, last_name FROM clients \
             WHERE first_name = ?1 AND last_name = ?2",
        )
        .bind(first_name)
        .bind(last_name)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;
        row.as_ref().map(client_from_row).transpose()
    }

    async fn save(&self, client: Client) -> RepositoryResult<Client> {
        require_field(&client.first_name, "first_name")?;
        require_field(&client.last_name, "last_name")?;
        let mut guard = self.executor.lock().await;
        let tx = guard.as_mut().ok_or_else(detached_context)?;
        match client.id {
            Some(id) => {
                let result = sqlx::query(
                    "UPDATE clients SET first_name = ?1, last_name = ?2 WHERE id = ?3",
                )
                .bind(&client.first_name)
                .bind(&client.last_name)
                .bind(id.to_string())
                .execute(&mut **tx)
                .await
                .map_err(map_sqlx_error)?;
                if result.rows_affected() == 0 {
                    return Err(RepositoryError::UpdateConflict(format!(
                        "client {id} no longer exists"
                    )));
                }
                Ok(client)
            }
            None => {
                let id = Uuid::new_v4();
                sqlx::query(
                    "INSERT INTO clients (id, first_name, last_name) VALUES (?1, ?2, ?3)",
                )
                .bind(id.to_string())
                .bind(&client.first_name)
                .bind(&client.last_name)
                .execute(&mut **tx)
                .await
                .map_err(map_sqlx_error)?;
                Ok(Client { id: Some(id), ..client })
            }
        }
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let mut guard = self.executor.lock().await;
        let tx = guard.as_mut().ok_or_else(detached_context)?;
        let result = sqlx::query("DELETE FROM clients WHERE id = ?1")
            .bind(id.to_string())
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::UpdateConflict(format!(
                "client {id} no longer exists"
            )));
        }
        Ok(())
    }
}

pub struct SqliteReservationRepository {
    executor: SqliteExecutor,
}

impl SqliteReservationRepository {
    pub fn new(executor: SqliteExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ReservationRepository for SqliteReservationRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Reservation>> {
        let mut guard = self.executor.lock().await;
        let tx = guard.as_mut().ok_or_else(detached_context)?;
        let rows = sqlx::query("SELECT id, client_id, date FROM reservations ORDER BY date")
            .fetch_all(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;
        rows.iter().map(reservation_from_row).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Reservation>> {
        if id.is_nil() {
            return Ok(None);
        }
        let mut guard = self.executor.lock().await;
        let tx = guard.as_mut().ok_or_else(detached_context)?;
        let row = sqlx::query("SELECT id, client_id, date FROM reservations WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(reservation_from_row).transpose()
    }

    async fn find_by_date(&self, date: NaiveDate) -> RepositoryResult<Option<Reservation>> {
        let mut guard = self.executor.lock().await;
        let tx = guard.as_mut().ok_or_else(detached_context)?;
        let row = sqlx::query("SELECT id, client_id, date FROM reservations WHERE date = ?1")
            .bind(date.to_string())
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(reservation_from_row).transpose()
    }

    async fn find_by_client(&self, client_id: Uuid) -> RepositoryResult<Vec<Reservation>> {
        if client_id.is_nil() {
            return Ok(Vec::new());
        }
        let mut guard = self.executor.lock().await;
        let tx = guard.as_mut().ok_or_else(detached_context)?;
        let rows = sqlx::query(
            "SELECT id, client_id, date FROM reservations WHERE client_id = ?1 ORDER BY date",
        )
        .bind(client_id.to_string())
        .fetch_all(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;
        rows.iter().map(reservation_from_row).collect()
    }

    async fn save(&self, reservation: Reservation) -> RepositoryResult<Reservation> {
        if reservation.client_id.is_nil() {
            return Err(RepositoryError::MissingField("client_id".into()));
        }
        let mut guard = self.executor.lock().await;
        let tx = guard.as_mut().ok_or_else(detached_context)?;
        match reservation.id {
            Some(id) => {
                let result = sqlx::query(
                    "UPDATE reservations SET client_id = ?1, date = ?2 WHERE id = ?3",
                )
                .bind(reservation.client_id.to_string())
                .bind(reservation.date.to_string())
                .bind(id.to_string())
                .execute(&mut **tx)
                .await
                .map_err(map_sqlx_error)?;
                if result.rows_affected() == 0 {
                    return Err(RepositoryError::UpdateConflict(format!(
                        "reservation {id} no longer exists"
                    )));
                }
                Ok(reservation)
            }
            None => {
                let id = Uuid::new_v4();
                sqlx::query(
                    "INSERT INTO reservations (id, client_id, date) VALUES (?1, ?2, ?3)",
                )
                .bind(id.to_string())
                .bind(reservation.client_id.to_string())
                .bind(reservation.date.to_string())
                .execute(&mut **tx)
                .await
                .map_err(map_sqlx_error)?;
                Ok(Reservation { id: Some(id), ..reservation })
            }
        }
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let mut guard = self.executor.lock().await;
        let tx = guard.as_mut().ok_or_else(detached_context)?;
        let result = sqlx::query("DELETE FROM reservations WHERE id = ?1")
            .bind(id.to_string())
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::UpdateConflict(format!(
                "reservation {id} no longer exists"
            )));
        }
        Ok(())
    }
}

fn require_field(value: &str, field: &str) -> RepositoryResult<()> {
    if value.trim().is_empty() {
        return Err(RepositoryError::MissingField(field.to_owned()));
    }
    Ok(())
}

fn client_from_row(row: &SqliteRow) -> RepositoryResult<Client> {
    Ok(Client {
        id: Some(uuid_column(row, "id")?),
        first_name: row.try_get("first_name").map_err(map_sqlx_error)?,
        last_name: row.try_get("last_name").map_err(map_sqlx_error)?,
    })
}

fn reservation_from_row(row: &SqliteRow) -> RepositoryResult<Reservation> {
    let date: String = row.try_get("date").map_err(map_sqlx_error)?;
    Ok(Reservation {
        id: Some(uuid_column(row, "id")?),
        client_id: uuid_column(row, "client_id")?,
        date: NaiveDate::from_str(&date)
            .map_err(|err| RepositoryError::Storage(err.into()))?,
    })
}

fn uuid_column(row: &SqliteRow, column: &str) -> RepositoryResult<Uuid> {
    let value: String = row.try_get(column).map_err(map_sqlx_error)?;
    Uuid::parse_str(&value).map_err(|err| RepositoryError::Storage(err.into()))
}
