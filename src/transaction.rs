use async_trait::async_trait;

use crate::error::TransactionError;

/// Lifecycle of a transaction handle.
///
/// Legal transitions: `Created` to `Started`, `Started` to `Committed` or
/// `RolledBack`, and any non-closed state to `Closed`. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Created,
    Started,
    Committed,
    RolledBack,
    Closed,
}

impl HandleState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::Committed => "committed",
            Self::RolledBack => "rolled back",
            Self::Closed => "closed",
        }
    }
}

pub(crate) fn require_state(
    actual: HandleState,
    expected: HandleState,
) -> Result<(), TransactionError> {
    if actual == expected {
        Ok(())
    } else {
        Err(TransactionError::InvalidState {
            expected: expected.name(),
            actual: actual.name(),
        })
    }
}

/// One backend transaction, from acquisition to resource release.
///
/// The handle wraps the backend's native transactional primitive. Its
/// context is the cloneable object repositories bind to, so every
/// repository built for this handle observes the same uncommitted state and
/// shares fate on commit or rollback.
#[async_trait]
pub trait TransactionHandle: Send {
    /// The native transactional context consumed by repositories.
    type Context: Clone + Send + Sync + 'static;

    fn context(&self) -> Self::Context;

    fn state(&self) -> HandleState;

    /// Begin the backend transaction.
    async fn start(&mut self) -> Result<(), TransactionError>;

    /// Make all effects durable. Deferred constraint checks surface here.
    async fn commit(&mut self) -> Result<(), TransactionError>;

    /// Discard all effects since `start`.
    async fn rollback(&mut self) -> Result<(), TransactionError>;

    /// Release the underlying resource. Succeeds at most once and is legal
    /// after any prior outcome; a still-open native transaction is
    /// discarded, which the backend treats as a rollback.
    async fn close(&mut self) -> Result<(), TransactionError>;
}

/// Produces a fresh handle per unit of work.
#[async_trait]
pub trait TransactionHandleFactory: Send + Sync {
    type Handle: TransactionHandle;

    async fn create_handle(&self) -> Result<Self::Handle, TransactionError>;
}
