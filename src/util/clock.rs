//! A thin wall-clock helper, used to stamp durable broker records.

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch. Used by [`crate::infra::broker::file::FileBroker`]
/// to timestamp the records it appends, not for any ordering guarantee.
#[must_use]
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}
