//! Request coalescing (singleflight).
//!
//! At most one producer runs per key. The first caller for a key spawns the
//! producer on the tokio runtime and registers a shared handle to it; every
//! caller arriving while it runs gets a clone of that handle instead of
//! starting a second one.
//!
//! The spawned task removes its own registration after the producer
//! settles and before its output is published, so a caller that arrives
//! just after completion starts a fresh run instead of reusing a stale
//! result. Because the work lives in its own task, callers that stop
//! waiting do not cancel it.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::debug;

use crate::telemetry;

/// Handle to an in-flight run.
///
/// Resolves to `None` if the producer panicked or its task was aborted.
pub type InFlight<T> = Shared<BoxFuture<'static, Option<T>>>;

/// Deduplicates concurrent work per key.
pub struct RequestCoalescer<T> {
    in_flight: Arc<DashMap<String, InFlight<T>>>,
}

impl<T> Clone for RequestCoalescer<T> {
    fn clone(&self) -> Self {
        Self {
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<T> Default for RequestCoalescer<T> {
    fn default() -> Self {
        Self {
            in_flight: Arc::new(DashMap::new()),
        }
    }
}

impl<T> RequestCoalescer<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a coalescer with nothing in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the run registered for `key`, or start one with `producer`.
    ///
    /// `producer` is invoked only when nothing is registered for `key`.
    ///
    /// # Panics
    ///
    /// Must be called within a tokio runtime.
    pub fn run_exclusive<F, Fut>(&self, key: &str, producer: F) -> InFlight<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        match self.in_flight.entry(key.to_owned()) {
            Entry::Occupied(existing) => {
                metrics::counter!(telemetry::COALESCED_TOTAL).increment(1);
                debug!(key, "joining in-flight fetch");
                existing.get().clone()
            }
            Entry::Vacant(slot) => {
                let guard = Deregister {
                    registry: Arc::clone(&self.in_flight),
                    key: slot.key().clone(),
                };
                let work = producer();
                // The spawned task blocks on this shard until `slot.insert`
                // below releases it, so registration always precedes removal.
                let handle = tokio::spawn(async move {
                    let _guard = guard;
                    work.await
                });
                let flight = handle.map(|joined| joined.ok()).boxed().shared();
                slot.insert(flight.clone());
                flight
            }
        }
    }

    /// Whether a run is currently registered for `key`.
    #[cfg(test)]
    pub(crate) fn is_in_flight(&self, key: &str) -> bool {
        self.in_flight.contains_key(key)
    }

    /// Number of keys with a run in flight.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.in_flight.len()
    }

    /// Whether nothing is in flight.
    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}

/// Removes a key's registration when the task owning it finishes,
/// unwinds or is aborted.
struct Deregister<T> {
    registry: Arc<DashMap<String, InFlight<T>>>,
    key: String,
}

impl<T> Drop for Deregister<T> {
    fn drop(&mut self) {
        self.registry.remove(&self.key);
    }
}
