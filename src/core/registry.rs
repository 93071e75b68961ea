//! A process-wide registry of weak pool handles, used to implement
//! [`shutdown_all`] — a drain hook that lets a process shut every pool down
//! cleanly regardless of how many call sites constructed one.

use std::sync::{OnceLock, Weak};

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tracing::debug;

/// Object-safe shutdown surface implemented by every pool type so the registry
/// can hold a single, type-erased list of weak handles.
pub(crate) trait DrainablePool: Send + Sync {
    fn shutdown_boxed(&self) -> BoxFuture<'_, ()>;
}

type Registry = Mutex<Vec<Weak<dyn DrainablePool>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(Vec::new()))
}

/// Register an already-shared pool handle for [`shutdown_all`]. Called
/// automatically by every pool constructor with its inner `Arc`; not part of
/// the public API. The registry only ever holds a [`Weak`] reference, so a pool
/// whose last strong handle is dropped disappears from the registry on its own.
pub(crate) fn register<P: DrainablePool + 'static>(inner: std::sync::Arc<P>) {
    let inner: std::sync::Arc<dyn DrainablePool> = inner;
    registry().lock().push(std::sync::Arc::downgrade(&inner));
}

/// Shut down every currently-live pool registered in this process, waiting for
/// each to fully drain before returning. Pools already dropped are skipped;
/// pools already shut down treat this as a no-op (shutdown is idempotent).
///
/// Intended for graceful-exit paths (signal handlers, test teardown) where the
/// caller does not have direct handles to every pool that might be live.
pub async fn shutdown_all() {
    let handles: Vec<_> = {
        let mut guard = registry().lock();
        guard.retain(|weak| weak.strong_count() > 0);
        guard.iter().filter_map(Weak::upgrade).collect()
    };

    debug!(count = handles.len(), "shutting down all registered pools");
    for handle in handles {
        handle.shutdown_boxed().await;
    }
}
