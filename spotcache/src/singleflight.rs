use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use shared::{Error, Result};

use crate::fingerprint::CacheKey;

type Outcome<V> = Option<Result<V>>;
type Registry<V> = Arc<Mutex<HashMap<CacheKey, watch::Receiver<Outcome<V>>>>>;

/// Collapses concurrent fetches for the same key into one upstream call.
///
/// The first caller for an uncached key becomes the leader and runs the
/// fetch; everyone else arriving before it finishes parks on the in-flight
/// record and receives the leader's outcome, value or error. Distinct keys
/// never contend: the registry lock only guards map access and is never held
/// across an await point.
///
/// The guarantee is per-process. Once a networked store is shared between
/// processes, each process still makes at most one call per key, but the
/// fleet as a whole may make several.
pub struct SingleFlight<V> {
    inflight: Registry<V>,
}

enum Role<V> {
    Leader(watch::Sender<Outcome<V>>),
    Waiter(watch::Receiver<Outcome<V>>),
}

impl<V> SingleFlight<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Runs `fetch` at most once per key across all concurrent callers.
    ///
    /// No timeout is imposed here; a hanging `fetch` blocks every waiter for
    /// that key, so callers wrap their fetch with a deadline. If the leader
    /// is cancelled mid-fetch, waiters get [`Error::Cancelled`] and the next
    /// caller starts fresh. Errors are never memoized.
    pub async fn run<F, Fut>(&self, key: &CacheKey, fetch: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        // Check-and-create must be a single atomic step: two callers racing
        // here must resolve into exactly one leader.
        let role = {
            let mut inflight = self
                .inflight
                .lock()
                .expect("single-flight registry poisoned");
            match inflight.get(key) {
                Some(rx) => Role::Waiter(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    inflight.insert(key.clone(), rx);
                    Role::Leader(tx)
                }
            }
        };

        match role {
            Role::Leader(tx) => {
                let guard = FlightGuard {
                    registry: Arc::clone(&self.inflight),
                    key: key.clone(),
                };
                let outcome = fetch().await;
                // Remove the record before waking waiters: the fetch closure
                // has already populated the store on success, so a caller
                // arriving from here on sees a cache hit, not a new flight.
                drop(guard);
                let _ = tx.send(Some(outcome.clone()));
                outcome
            }
            Role::Waiter(mut rx) => loop {
                if let Some(outcome) = rx.borrow_and_update().clone() {
                    return outcome;
                }
                if rx.changed().await.is_err() {
                    // Leader dropped without publishing: its future was
                    // cancelled. Surface that instead of hanging.
                    return Err(Error::Cancelled);
                }
            },
        }
    }
}

impl<V> Default for SingleFlight<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Removes the in-flight record when the leader finishes or is cancelled.
struct FlightGuard<V> {
    registry: Registry<V>,
    key: CacheKey,
}

impl<V> Drop for FlightGuard<V> {
    fn drop(&mut self) {
        if let Ok(mut inflight) = self.registry.lock() {
            inflight.remove(&self.key);
        }
    }
}
