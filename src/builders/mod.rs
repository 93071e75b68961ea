//! Fluent builders for pools and distributed tasks.

pub mod pool_builder;
pub mod task_builder;

pub use pool_builder::{PoolBuilder, StrictPoolBuilder};
pub use task_builder::TaskBuilder;
