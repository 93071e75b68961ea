//! Postgres-backed broker (schema and interface stub), mirroring the teacher's
//! `PostgresQueue`/`PostgresMailbox` placeholders. Not wired to a database
//! client; provided so the migration shape and trait surface are in place for
//! whoever adds the client.

use std::time::Duration;

use async_trait::async_trait;

use crate::core::error::PoolError;
use crate::distributed::broker::Broker;

/// Placeholder Postgres broker adapter.
pub struct PostgresBroker {
    _connection_string: String,
}

impl PostgresBroker {
    /// Build an adapter against `connection_string`. Does not connect eagerly.
    #[must_use]
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            _connection_string: connection_string.into(),
        }
    }

    /// Migration statements for the broker's backing table.
    #[must_use]
    pub fn migrations() -> &'static [&'static str] {
        &[
            r#"
CREATE TABLE IF NOT EXISTS aio_pool_broker_payloads (
    id BIGSERIAL PRIMARY KEY,
    queue_name TEXT NOT NULL,
    payload BYTEA NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS idx_aio_pool_broker_queue ON aio_pool_broker_payloads (queue_name, created_at);
"#,
        ]
    }
}

#[async_trait]
impl Broker for PostgresBroker {
    async fn push_blocking(&self, _queue_name: &str, _payload: Vec<u8>) -> Result<(), PoolError> {
        Err(PoolError::BrokerUnavailable(
            "postgres broker not wired to a database client".into(),
        ))
    }

    async fn pop_blocking(
        &self,
        _queue_name: &str,
        _timeout: Duration,
    ) -> Result<Option<Vec<u8>>, PoolError> {
        Err(PoolError::BrokerUnavailable(
            "postgres broker not wired to a database client".into(),
        ))
    }

    async fn length(&self, _queue_name: &str) -> Result<usize, PoolError> {
        Err(PoolError::BrokerUnavailable(
            "postgres broker not wired to a database client".into(),
        ))
    }

    async fn clear(&self, _queue_name: &str) -> Result<(), PoolError> {
        Err(PoolError::BrokerUnavailable(
            "postgres broker not wired to a database client".into(),
        ))
    }

    async fn close(&self) -> Result<(), PoolError> {
        Ok(())
    }
}
