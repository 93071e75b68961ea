//! Error types produced by the pool engine and the distributed task layer.

use thiserror::Error;

/// Errors produced by [`crate::core::pool::Pool`], [`crate::core::strict_pool::StrictPool`],
/// and the [`crate::distributed`] task layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// A non-blocking submit was rejected because the staging queue is at capacity.
    #[error("staging queue is full")]
    QueueFull,

    /// Submit was called on a pool that has already been shut down.
    #[error("pool has been shut down")]
    PoolClosed,

    /// The work unit panicked or otherwise failed while executing. Carries the
    /// panic payload's message where one was available.
    #[error("work unit failed: {0}")]
    UnitFailed(String),

    /// The result slot was dropped without being resolved — only possible on a
    /// forced shutdown that does not wait for in-flight units to finish.
    #[error("work unit was canceled before it resolved")]
    Canceled,

    /// The broker backing a distributed task queue failed (connection loss, I/O
    /// error). Retry/reconnect is the broker implementation's responsibility.
    #[error("broker unavailable: {0}")]
    BrokerUnavailable(String),

    /// A payload popped from the broker could not be decoded into a call.
    #[error("failed to deserialize task payload: {0}")]
    DeserializationFailed(String),

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An invariant was violated in a way callers cannot act on directly.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<tokio::sync::oneshot::error::RecvError> for PoolError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Self::Canceled
    }
}

impl From<tokio::task::JoinError> for PoolError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            return Self::Canceled;
        }
        match err.try_into_panic() {
            Ok(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "work unit panicked with a non-string payload".to_string());
                Self::UnitFailed(message)
            }
            Err(_) => Self::Internal("worker task join failed".to_string()),
        }
    }
}

/// Application-facing result using `anyhow` for higher-level contexts such as
/// broker wiring and distributed task setup.
pub type AppResult<T> = Result<T, anyhow::Error>;
