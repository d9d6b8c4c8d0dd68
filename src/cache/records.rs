//! Time-to-live store of fetched mention lists.
//!
//! Unlike a fixed-TTL cache, every [`put`](RecordCache::put) carries its own
//! lifetime: successful fetches live for the success TTL, while the empty
//! placeholder seeded after a failure lives only as long as the cooldown.
//! This is done with a moka [`Expiry`] that reads the TTL stored in each
//! entry.
//!
//! There is no capacity bound. The key space is the set of pages on the
//! site, and entries disappear on expiry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::sync::Cache;

use crate::types::Mention;

/// Shared, immutable list of mentions as handed to callers.
pub type Mentions = Arc<[Mention]>;

#[derive(Clone)]
struct CacheEntry {
    value: Mentions,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with. Overwrites reset
/// the clock.
struct EntryTtl;

impl Expiry<String, CacheEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Thread-safe per-key TTL cache of mention lists.
///
/// Reads and writes on different keys do not contend; moka makes
/// operations on the same key atomic. Expired entries are never returned.
#[derive(Clone)]
pub struct RecordCache {
    entries: Cache<String, CacheEntry>,
}

impl RecordCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().expire_after(EntryTtl).build(),
        }
    }

    /// Look up a fresh entry. Returns `None` on miss or after expiry.
    pub fn get(&self, key: &str) -> Option<Mentions> {
        self.entries.get(key).map(|entry| entry.value)
    }

    /// Insert or overwrite the entry for `key`, fresh for `ttl` from now.
    pub fn put(&self, key: &str, value: Mentions, ttl: Duration) {
        self.entries.insert(key.to_owned(), CacheEntry { value, ttl });
    }

    /// Insert `value` only if `key` has no fresh entry.
    ///
    /// Returns `true` if this call inserted.
    pub fn seed_if_absent(&self, key: &str, value: Mentions, ttl: Duration) -> bool {
        self.entries
            .entry(key.to_owned())
            .or_insert_with(|| CacheEntry { value, ttl })
            .is_fresh()
    }

    /// Whether `key` has a fresh entry.
    #[cfg(test)]
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop the entry for `key`, if any.
    #[cfg(test)]
    pub(crate) fn invalidate(&self, key: &str) {
        self.entries.invalidate(key);
    }
}

impl Default for RecordCache {
    fn default() -> Self {
        Self::new()
    }
}
