//! Per-task configuration for the distributed task layer.

use serde::{Deserialize, Serialize};

use super::PoolConfig;

/// Which codec a [`crate::distributed::Task`] uses to move calls across the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerializerKind {
    /// Opaque binary encoding (`bincode`) that can carry arbitrary argument types.
    /// Only safe between processes running the same code, since the wire format is
    /// not a stable, language-independent schema.
    Binary,
    /// Structured, language-independent encoding (`serde_json`). Payloads are
    /// restricted to what JSON can represent, but are safe across trust
    /// boundaries.
    Structured,
}

/// Configuration for a single named task's local pool and broker binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// The broker key this task's calls are pushed to and popped from.
    pub queue_name: String,
    /// Size of the task's locally-owned consumer pool.
    pub max_concurrency: usize,
    /// Capacity of the local staging queue. Defaults to `10 * max_concurrency`.
    pub max_queue_size: usize,
    /// Connection string for the broker backing this task's queue.
    pub broker_url: String,
    /// Codec used to move calls across the broker.
    pub serializer: SerializerKind,
}

impl TaskConfig {
    /// Build a configuration with the default `max_queue_size` of
    /// `10 * max_concurrency`.
    #[must_use]
    pub fn new(
        queue_name: impl Into<String>,
        max_concurrency: usize,
        broker_url: impl Into<String>,
        serializer: SerializerKind,
    ) -> Self {
        Self {
            queue_name: queue_name.into(),
            max_concurrency,
            max_queue_size: max_concurrency.saturating_mul(10),
            broker_url: broker_url.into(),
            serializer,
        }
    }

    /// Override the default staging queue capacity.
    #[must_use]
    pub fn with_max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = max_queue_size;
        self
    }

    /// The configuration for this task's locally-owned consumer pool.
    #[must_use]
    pub fn local_pool_config(&self) -> PoolConfig {
        PoolConfig::new(self.max_concurrency, self.max_queue_size)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.queue_name.is_empty() {
            return Err("queue_name must not be empty".into());
        }
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than 0".into());
        }
        Ok(())
    }
}
