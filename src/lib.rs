//! # aio_pool
//!
//! A bounded, back-pressured asynchronous concurrency pool, and a minimal
//! distributed task queue layered on top of it.
//!
//! ## Core Problem Solved
//!
//! An unbounded producer loop submitting work faster than it can be consumed grows
//! memory without limit. This crate converts that producer rate into one that matches
//! consumer capacity: a program submitting `N` items keeps only
//! `O(max_concurrency + max_queue_size)` work in flight, independent of `N`.
//!
//! ## Key Pieces
//!
//! - [`core::pool::Pool`] — the back-pressured pool: bounded staging queue, a fixed
//!   worker fleet, and a `submit`/`run`/`batch_*`/`shutdown` surface.
//! - [`core::strict_pool::StrictPool`] — a stricter variant with no staging buffer at
//!   all: admission is gated by a monitor so the in-flight count never exceeds
//!   `max_concurrency`, even for a single instant.
//! - [`core::registry::shutdown_all`] — a process-wide drain hook for programs that
//!   submit work without tracking every result handle.
//! - [`distributed`] — binds a function to a named broker queue, providing
//!   `submit`/`consume`/`batch_consume` across process boundaries.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use aio_pool::config::PoolConfig;
//! use aio_pool::core::pool::Pool;
//!
//! # async fn run() -> Result<(), aio_pool::core::error::PoolError> {
//! let pool: Pool<i32> = Pool::new(PoolConfig::new(4, 16));
//! let handle = pool.submit(Box::pin(async { 2 + 2 })).await?;
//! assert_eq!(handle.await?, 4);
//! pool.shutdown(true).await;
//! # Ok(())
//! # }
//! ```
//!
//! For complete examples, see `tests/pool_test.rs`, `tests/strict_pool_test.rs`, and
//! `tests/distributed/task_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

/// Pool engine: bounded queue, worker fleet, result slots, the strict variant, and
/// the process-wide drain registry.
pub mod core;
/// Configuration models for pools and distributed tasks.
pub mod config;
/// Fluent builders for pools and distributed tasks.
pub mod builders;
/// Broker adapters backing the distributed task layer.
pub mod infra;
/// Broker-backed distributed task queue, layered on [`core::pool::Pool`].
pub mod distributed;
/// Shared utilities (clock, telemetry).
pub mod util;

pub use core::error::PoolError;
pub use core::pool::Pool;
pub use core::strict_pool::StrictPool;
