use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::UnitOfWorkError;
use crate::provider::RepositoryProvider;
use crate::repository::{ClientRepository, ReservationRepository};
use crate::transaction::{HandleState, TransactionHandle, TransactionHandleFactory};

/// Runs caller-supplied units of work inside one backend transaction.
///
/// A unit of work receives the repositories it needs and returns a result
/// or a [`UnitOfWorkError`]. Business errors raised by the unit of work
/// pass through unchanged; repository and backend failures surface as
/// classified infrastructure errors. Commit or rollback is decided by the
/// outcome, and the handle is released on every exit path.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// Run a unit of work against both repositories.
    async fn in_transaction<T, W, Fut>(&self, work: W) -> Result<T, UnitOfWorkError>
    where
        T: Send,
        W: FnOnce(Arc<dyn ClientRepository>, Arc<dyn ReservationRepository>) -> Fut + Send,
        Fut: Future<Output = Result<T, UnitOfWorkError>> + Send;

    /// Run a unit of work that only needs the client repository.
    async fn in_client_transaction<T, W, Fut>(&self, work: W) -> Result<T, UnitOfWorkError>
    where
        T: Send,
        W: FnOnce(Arc<dyn ClientRepository>) -> Fut + Send,
        Fut: Future<Output = Result<T, UnitOfWorkError>> + Send,
    {
        self.in_transaction(move |clients, _| work(clients)).await
    }

    /// Run a unit of work that only needs the reservation repository.
    async fn in_reservation_transaction<T, W, Fut>(&self, work: W) -> Result<T, UnitOfWorkError>
    where
        T: Send,
        W: FnOnce(Arc<dyn ReservationRepository>) -> Fut + Send,
        Fut: Future<Output = Result<T, UnitOfWorkError>> + Send,
    {
        self.in_transaction(move |_, reservations| work(reservations))
            .await
    }
}

/// Backend-agnostic [`TransactionManager`] implementation.
///
/// The coordinator owns no transactional state of its own; every call
/// acquires a fresh handle from the factory and fresh repositories from the
/// provider, so one instance is safely shared across concurrent callers.
pub struct TransactionCoordinator<F, P> {
    handles: F,
    provider: P,
}

impl<F, P> TransactionCoordinator<F, P> {
    pub fn new(handles: F, provider: P) -> Self {
        Self { handles, provider }
    }
}

#[async_trait]
impl<F, P> TransactionManager for TransactionCoordinator<F, P>
where
    F: TransactionHandleFactory + Send + Sync,
    P: RepositoryProvider<Context = <F::Handle as TransactionHandle>::Context> + Send + Sync,
{
    async fn in_transaction<T, W, Fut>(&self, work: W) -> Result<T, UnitOfWorkError>
    where
        T: Send,
        W: FnOnce(Arc<dyn ClientRepository>, Arc<dyn ReservationRepository>) -> Fut + Send,
        Fut: Future<Output = Result<T, UnitOfWorkError>> + Send,
    {
        let mut handle = self
            .handles
            .create_handle()
            .await
            .map_err(UnitOfWorkError::Transaction)?;

        if let Err(err) = handle.start().await {
            close_handle(&mut handle).await;
            return Err(UnitOfWorkError::Transaction(err));
        }

        let context = handle.context();
        let clients = self.provider.client_repository(&context);
        let reservations = self.provider.reservation_repository(&context);

        let outcome = work(clients, reservations).await;

        let result = match outcome {
            Ok(value) => match handle.commit().await {
                Ok(()) => Ok(value),
                Err(err) => {
                    roll_back(&mut handle).await;
                    Err(UnitOfWorkError::Transaction(err))
                }
            },
            Err(err) => {
                roll_back(&mut handle).await;
                Err(err)
            }
        };

        close_handle(&mut handle).await;
        result
    }
}

/// Roll back a handle that is still in flight. A commit failure may have
/// already consumed the native transaction, in which case there is nothing
/// left to roll back.
async fn roll_back<H: TransactionHandle>(handle: &mut H) {
    if handle.state() != HandleState::Started {
        return;
    }
    if let Err(err) = handle.rollback().await {
        warn!(error = %err, "transaction rollback failed");
    }
}

/// Release the handle. Failures here never mask the primary outcome.
async fn close_handle<H: TransactionHandle>(handle: &mut H) {
    if let Err(err) = handle.close().await {
        warn!(error = %err, "failed to release transaction handle");
    }
}
