//! Per-key failure backoff.
//!
//! After a failed fetch the aggregator records a `retry_at` instant for the
//! key. Until then no new upstream request is made for it. Entries expire
//! lazily: the check that finds a passed `retry_at` also removes it. There
//! is no background sweeper.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Thread-safe map of keys currently backing off.
#[derive(Debug, Clone, Default)]
pub struct CooldownTracker {
    retry_at: Arc<DashMap<String, Instant>>,
}

impl CooldownTracker {
    /// Create a tracker with no active cooldowns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is still backing off.
    ///
    /// An expired entry is removed as a side effect.
    pub fn is_active(&self, key: &str) -> bool {
        let now = Instant::now();
        if self
            .retry_at
            .remove_if(key, |_, retry_at| now >= *retry_at)
            .is_some()
        {
            return false;
        }
        self.retry_at.contains_key(key)
    }

    /// Start (or restart) a cooldown for `key` lasting `duration` from now.
    pub fn activate(&self, key: &str, duration: Duration) {
        self.retry_at
            .insert(key.to_owned(), Instant::now() + duration);
    }

    /// End any cooldown for `key`.
    pub fn clear(&self, key: &str) {
        self.retry_at.remove(key);
    }

    /// Time left before `key` may be fetched again, if it is cooling down.
    pub fn remaining(&self, key: &str) -> Option<Duration> {
        let retry_at = *self.retry_at.get(key)?;
        retry_at.checked_duration_since(Instant::now())
    }

    /// Number of keys with an entry, expired or not.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.retry_at.len()
    }

    /// Whether no key has an entry.
    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.retry_at.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_by_default() {
        let tracker = CooldownTracker::new();
        assert!(!tracker.is_active("https://example.com/a"));
        assert!(tracker.is_empty());
    }

    #[test]
    fn active_until_retry_at() {
        let tracker = CooldownTracker::new();
        tracker.activate("a", Duration::from_secs(60));

        assert!(tracker.is_active("a"));
        assert!(tracker.is_active("a"), "checking must not consume the cooldown");
        assert!(!tracker.is_active("b"));
        assert!(tracker.remaining("a").unwrap() > Duration::from_secs(59));
    }

    #[test]
    fn expired_entry_is_cleared_lazily() {
        let tracker = CooldownTracker::new();
        tracker.activate("a", Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(tracker.len(), 1);
        assert!(!tracker.is_active("a"));
        assert_eq!(tracker.len(), 0);
    }

    #[test]
    fn clear_ends_cooldown() {
        let tracker = CooldownTracker::new();
        tracker.activate("a", Duration::from_secs(60));
        tracker.clear("a");

        assert!(!tracker.is_active("a"));
        assert!(tracker.remaining("a").is_none());
    }

    #[test]
    fn reactivation_extends() {
        let tracker = CooldownTracker::new();
        tracker.activate("a", Duration::from_millis(10));
        tracker.activate("a", Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(30));

        assert!(tracker.is_active("a"));
    }
}
