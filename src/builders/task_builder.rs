//! Fluent construction of a [`Task`], binding a function to a broker queue.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{SerializerKind, TaskConfig};
use crate::core::error::PoolError;
use crate::distributed::broker::Broker;
use crate::distributed::task::Task;

/// Fluent builder for a [`Task`].
pub struct TaskBuilder {
    queue_name: Option<String>,
    max_concurrency: Option<usize>,
    max_queue_size: Option<usize>,
    broker_url: Option<String>,
    serializer: SerializerKind,
}

impl Default for TaskBuilder {
    fn default() -> Self {
        Self {
            queue_name: None,
            max_concurrency: None,
            max_queue_size: None,
            broker_url: None,
            serializer: SerializerKind::Structured,
        }
    }
}

impl TaskBuilder {
    /// Start a new builder with no values set and [`SerializerKind::Structured`]
    /// as the default codec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the broker queue name this task binds to. Required.
    #[must_use]
    pub fn queue_name(mut self, value: impl Into<String>) -> Self {
        self.queue_name = Some(value.into());
        self
    }

    /// Set the local pool's worker fleet size. Required.
    #[must_use]
    pub fn max_concurrency(mut self, value: usize) -> Self {
        self.max_concurrency = Some(value);
        self
    }

    /// Override the default staging queue capacity (`10 * max_concurrency`).
    #[must_use]
    pub fn max_queue_size(mut self, value: usize) -> Self {
        self.max_queue_size = Some(value);
        self
    }

    /// Set the broker connection string. Required.
    #[must_use]
    pub fn broker_url(mut self, value: impl Into<String>) -> Self {
        self.broker_url = Some(value.into());
        self
    }

    /// Override the default [`SerializerKind::Structured`] codec.
    #[must_use]
    pub fn serializer(mut self, value: SerializerKind) -> Self {
        self.serializer = value;
        self
    }

    /// Build the configuration without constructing a task.
    pub fn build_config(&self) -> Result<TaskConfig, String> {
        let queue_name = self
            .queue_name
            .clone()
            .ok_or_else(|| "queue_name is required".to_string())?;
        let max_concurrency = self
            .max_concurrency
            .ok_or_else(|| "max_concurrency is required".to_string())?;
        let broker_url = self
            .broker_url
            .clone()
            .ok_or_else(|| "broker_url is required".to_string())?;

        let mut config = TaskConfig::new(queue_name, max_concurrency, broker_url, self.serializer);
        if let Some(max_queue_size) = self.max_queue_size {
            config = config.with_max_queue_size(max_queue_size);
        }
        config.validate()?;
        Ok(config)
    }

    /// Build the configuration and bind `func` to it against `broker`.
    pub fn build<F, A, Fut, T>(&self, broker: Arc<dyn Broker>, func: F) -> Result<Task<F, A, Fut, T>, PoolError>
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        A: Serialize + DeserializeOwned + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let config = self.build_config().map_err(PoolError::InvalidConfig)?;
        Task::new(config, broker, func)
    }
}
