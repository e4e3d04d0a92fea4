use std::sync::Arc;

use crate::repository::{ClientRepository, ReservationRepository};

/// Builds the repositories for one unit of work, bound to its context.
///
/// Must be called fresh for every unit of work and never with a context
/// that has already been closed.
pub trait RepositoryProvider: Send + Sync {
    /// The transactional context the repositories bind to.
    type Context;

    fn client_repository(&self, context: &Self::Context) -> Arc<dyn ClientRepository>;

    fn reservation_repository(&self, context: &Self::Context) -> Arc<dyn ReservationRepository>;
}
