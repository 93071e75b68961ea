//! The [`Broker`] contract: the external, opaque collaborator a
//! [`crate::distributed::task::Task`] pushes call payloads to and pops them
//! from. Concrete adapters live under [`crate::infra::broker`].

use std::time::Duration;

use async_trait::async_trait;

use crate::core::error::PoolError;

/// A named, byte-oriented queue a distributed task binds to.
///
/// Implementations own whatever connection state they need (an in-memory map, an
/// open file handle, a database pool) and must be safe to share across the
/// consumer loop and any number of concurrent producers.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Push one payload onto `queue_name`. Blocks (suspends) only as long as the
    /// backend itself needs to durably accept the write; it never blocks on
    /// downstream consumer availability.
    async fn push_blocking(&self, queue_name: &str, payload: Vec<u8>) -> Result<(), PoolError>;

    /// Pop the oldest payload on `queue_name`, suspending up to `timeout` if the
    /// queue is currently empty. Returns `Ok(None)` on a timeout, never an error.
    async fn pop_blocking(
        &self,
        queue_name: &str,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, PoolError>;

    /// Number of payloads currently waiting on `queue_name`.
    async fn length(&self, queue_name: &str) -> Result<usize, PoolError>;

    /// Discard every payload currently waiting on `queue_name`.
    async fn clear(&self, queue_name: &str) -> Result<(), PoolError>;

    /// Release any resources held by this broker (connections, file handles).
    /// Called once, when a [`crate::distributed::task::Task`] is closed.
    async fn close(&self) -> Result<(), PoolError>;
}
