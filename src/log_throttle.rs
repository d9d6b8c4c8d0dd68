//! Rate-limited warning and error logging.
//!
//! A sustained upstream outage would otherwise produce one log line per page
//! render. [`ThrottledLogger`] emits at most one line per key per window and
//! counts the rest in [`LOGS_SUPPRESSED_TOTAL`](crate::telemetry::LOGS_SUPPRESSED_TOTAL).

use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{error, warn};

use crate::telemetry;

/// Default throttling window.
pub const DEFAULT_LOG_WINDOW: Duration = Duration::from_secs(60);

/// Logger that drops repeats of the same key inside a rolling window.
#[derive(Debug, Clone)]
pub struct ThrottledLogger {
    window: Duration,
    last_emitted: Arc<DashMap<String, Instant>>,
}

impl ThrottledLogger {
    /// Create a logger with the given window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_emitted: Arc::new(DashMap::new()),
        }
    }

    /// Log `message` at WARN unless `key` was logged within the window.
    ///
    /// Returns whether the line was emitted.
    pub fn warn_once(&self, key: &str, message: &str) -> bool {
        if !self.claim(key) {
            return false;
        }
        warn!(throttle_key = key, "{message}");
        true
    }

    /// Log `message` and its `cause` at ERROR unless `key` was logged within
    /// the window.
    ///
    /// Returns whether the line was emitted.
    pub fn error_once(&self, key: &str, message: &str, cause: &dyn Display) -> bool {
        if !self.claim(key) {
            return false;
        }
        error!(throttle_key = key, error = %cause, "{message}");
        true
    }

    /// Atomically decide whether `key` may log now, recording the emission.
    fn claim(&self, key: &str) -> bool {
        let now = Instant::now();
        match self.last_emitted.entry(key.to_owned()) {
            Entry::Occupied(mut last) => {
                if now.duration_since(*last.get()) < self.window {
                    metrics::counter!(telemetry::LOGS_SUPPRESSED_TOTAL).increment(1);
                    return false;
                }
                last.insert(now);
            }
            Entry::Vacant(slot) => {
                slot.insert(now);
            }
        }
        true
    }
}

impl Default for ThrottledLogger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_WINDOW)
    }
}
