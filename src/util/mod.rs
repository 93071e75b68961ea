//! Shared utilities: a wall-clock stamp helper and tracing setup.

pub mod clock;
pub mod telemetry;

pub use clock::now_ms;
pub use telemetry::init_tracing;
