use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person that can hold reservations.
///
/// The identifier is assigned by the store on the first successful save and
/// never changes afterwards. The (first name, last name) pair is unique
/// across all clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
}

impl Client {
    /// A client that has not been persisted yet.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// A client carrying an already assigned identifier.
    pub fn with_id(
        id: Uuid,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

/// A booked date owned by one client.
///
/// A date is taken by at most one reservation in the whole system, not one
/// per client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Option<Uuid>,
    pub client_id: Uuid,
    pub date: NaiveDate,
}

impl Reservation {
    /// A reservation that has not been persisted yet.
    pub fn new(client_id: Uuid, date: NaiveDate) -> Self {
        Self {
            id: None,
            client_id,
            date,
        }
    }

    /// A reservation carrying an already assigned identifier.
    pub fn with_id(id: Uuid, client_id: Uuid, date: NaiveDate) -> Self {
        Self {
            id: Some(id),
            client_id,
            date,
        }
    }
}
