//! Fluent construction of [`Pool`] and [`StrictPool`] from configuration.

use crate::config::{PoolConfig, StrictPoolConfig};
use crate::core::pool::Pool;
use crate::core::strict_pool::StrictPool;

/// Fluent builder for a [`Pool`].
#[derive(Debug, Clone, Default)]
pub struct PoolBuilder {
    max_concurrency: Option<usize>,
    max_queue_size: Option<usize>,
}

impl PoolBuilder {
    /// Start a new builder with no values set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker fleet size. Required.
    #[must_use]
    pub fn max_concurrency(mut self, value: usize) -> Self {
        self.max_concurrency = Some(value);
        self
    }

    /// Set the staging queue capacity. Defaults to `max_concurrency` if unset.
    #[must_use]
    pub fn max_queue_size(mut self, value: usize) -> Self {
        self.max_queue_size = Some(value);
        self
    }

    /// Build the configuration without constructing a pool.
    pub fn build_config(&self) -> Result<PoolConfig, String> {
        let max_concurrency = self
            .max_concurrency
            .ok_or_else(|| "max_concurrency is required".to_string())?;
        let max_queue_size = self.max_queue_size.unwrap_or(max_concurrency);
        let config = PoolConfig::new(max_concurrency, max_queue_size);
        config.validate()?;
        Ok(config)
    }

    /// Build the configuration and construct the pool.
    pub fn build<T: Send + 'static>(&self) -> Result<Pool<T>, String> {
        Ok(Pool::new(self.build_config()?))
    }
}

/// Fluent builder for a [`StrictPool`].
#[derive(Debug, Clone, Default)]
pub struct StrictPoolBuilder {
    max_concurrency: Option<usize>,
}

impl StrictPoolBuilder {
    /// Start a new builder with no values set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of units allowed in flight at once. Required.
    #[must_use]
    pub fn max_concurrency(mut self, value: usize) -> Self {
        self.max_concurrency = Some(value);
        self
    }

    /// Build the configuration without constructing a pool.
    pub fn build_config(&self) -> Result<StrictPoolConfig, String> {
        let max_concurrency = self
            .max_concurrency
            .ok_or_else(|| "max_concurrency is required".to_string())?;
        let config = StrictPoolConfig::new(max_concurrency);
        config.validate()?;
        Ok(config)
    }

    /// Build the configuration and construct the pool.
    pub fn build(&self) -> Result<StrictPool, String> {
        Ok(StrictPool::new(self.build_config()?))
    }
}
