mod memory;

pub use memory::MemoryStore;

use std::sync::Arc;

use shared::config::CacheBackend;
use spotcache::{CacheStore, Sweepable};

/// Builds the store selected by configuration, returned both as the port
/// the façade uses and as the sweep handle for the background sweeper.
///
/// This is the storage swap point: a networked (Redis-style) backend would
/// add a `CacheBackend` variant and an arm here, and nothing above the
/// `CacheStore` port changes. Note that with a store shared across
/// processes, the single-flight guarantee becomes best-effort per process.
pub fn build_store<V>(backend: CacheBackend) -> (Arc<dyn CacheStore<V>>, Arc<dyn Sweepable>)
where
    V: Clone + Send + Sync + 'static,
{
    match backend {
        CacheBackend::Memory => {
            let store = Arc::new(MemoryStore::new());
            (store.clone(), store)
        }
    }
}
