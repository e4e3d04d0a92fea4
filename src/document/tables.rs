use redb::TableDefinition;

/// Client documents keyed by identifier.
pub(crate) const CLIENTS: TableDefinition<'static, &str, &[u8]> = TableDefinition::new("clients");

/// Unique index from the (first name, last name) pair to a client id.
pub(crate) const CLIENTS_BY_NAME: TableDefinition<'static, &str, &str> =
    TableDefinition::new("clients_by_name");

/// Reservation documents keyed by identifier.
pub(crate) const RESERVATIONS: TableDefinition<'static, &str, &[u8]> =
    TableDefinition::new("reservations");

/// Unique index from a date to a reservation id.
pub(crate) const RESERVATIONS_BY_DATE: TableDefinition<'static, &str, &str> =
    TableDefinition::new("reservations_by_date");

/// Index key for the client name pair. The separator cannot occur in
/// either component.
pub(crate) fn name_key(first_name: &str, last_name: &str) -> String {
    format!("{last_name}\u{1f}{first_name}")
}
