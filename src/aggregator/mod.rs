//! The mention aggregator.
//!
//! [`Aggregator`] is the one entry point the rendering layer calls. It wires
//! the record cache, cooldown tracker, request coalescer and throttled
//! logger around a [`MentionSource`]:
//!
//! ```text
//! fetch_mentions(url)
//!   ├─ empty url / no token ─────────────► []
//!   ├─ fresh cache entry ────────────────► cached
//!   ├─ cooling down ─────────────────────► last cached value (or [])
//!   └─ coalesced fetch (one per key)
//!        ├─ ok:  cache for success_ttl, clear cooldown ─► mentions
//!        └─ err: start cooldown, log (throttled),
//!                seed [] if nothing cached ────────────► last cached value
//! ```
//!
//! Per key this is a small state machine: `Cold → Fetching → Cached | Cooling`,
//! decaying back to `Cold` when the TTL or cooldown runs out.
//!
//! All outcome bookkeeping runs inside the coalesced task, so the cache is
//! populated even if every caller gave up waiting.

mod lookup;

pub use lookup::{Lookup, Origin};

use std::sync::{Arc, Once};
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::cache::{CooldownTracker, Mentions, RecordCache};
use crate::coalesce::RequestCoalescer;
use crate::config::MentionsConfig;
use crate::log_throttle::ThrottledLogger;
use crate::telemetry;
use crate::types::Mention;
use crate::upstream::{MentionSource, WebmentionIoClient};
use crate::{HuginnError, Result};

/// Cached, coalesced, failure-tolerant access to page mentions.
///
/// Construct once at startup and share it (it is cheap to clone) with
/// everything that renders mentions.
///
/// ```rust,no_run
/// use huginn::{Aggregator, MentionsConfig};
///
/// # async fn run() -> huginn::Result<()> {
/// let aggregator = Aggregator::new(MentionsConfig::from_env())?;
/// let mentions = aggregator.fetch_mentions("https://example.com/blog/post").await;
/// for mention in mentions.iter() {
///     println!("{} {}", mention.author.name, mention.property);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Aggregator {
    inner: Arc<Inner>,
}

struct Inner {
    config: MentionsConfig,
    source: Arc<dyn MentionSource>,
    records: RecordCache,
    cooldowns: CooldownTracker,
    in_flight: RequestCoalescer<Lookup>,
    logger: ThrottledLogger,
    missing_credential: Once,
}

impl Aggregator {
    /// Build an aggregator that talks to webmention.io.
    pub fn new(config: MentionsConfig) -> Result<Self> {
        let client = WebmentionIoClient::new(&config)?;
        Ok(Self::with_source(config, Arc::new(client)))
    }

    /// Build an aggregator around any [`MentionSource`].
    pub fn with_source(config: MentionsConfig, source: Arc<dyn MentionSource>) -> Self {
        let logger = ThrottledLogger::new(config.log_window);
        Self {
            inner: Arc::new(Inner {
                config,
                source,
                records: RecordCache::new(),
                cooldowns: CooldownTracker::new(),
                in_flight: RequestCoalescer::new(),
                logger,
                missing_credential: Once::new(),
            }),
        }
    }

    /// The configuration this aggregator was built with.
    pub fn config(&self) -> &MentionsConfig {
        &self.inner.config
    }

    /// Mentions of `target_url`, oldest first.
    ///
    /// Never fails: any problem degrades to the last cached list or an empty
    /// one. Only the caller that actually performs the upstream request waits
    /// for it (bounded by the request timeout); others wait for that request
    /// to settle.
    ///
    /// # Panics
    ///
    /// Must be called within a tokio runtime: fetches run as spawned tasks.
    pub async fn fetch_mentions(&self, target_url: &str) -> Mentions {
        self.lookup(target_url).await.mentions
    }

    /// Like [`fetch_mentions`](Self::fetch_mentions), but reports where the
    /// mentions came from and any upstream error.
    ///
    /// # Panics
    ///
    /// Must be called within a tokio runtime, like
    /// [`fetch_mentions`](Self::fetch_mentions).
    pub async fn lookup(&self, target_url: &str) -> Lookup {
        let key = target_url.trim();
        if key.is_empty() {
            return Lookup::empty(Origin::EmptyTarget);
        }

        if !self.inner.config.has_credential() {
            self.inner.missing_credential.call_once(|| {
                warn!("webmention.io token is not configured; mention fetches are disabled");
            });
            return Lookup::empty(Origin::Unconfigured);
        }

        if let Some(mentions) = self.inner.records.get(key) {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
            return Lookup::served(mentions, Origin::Cache);
        }
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);

        if self.inner.cooldowns.is_active(key) {
            metrics::counter!(telemetry::COOLDOWN_SKIPS_TOTAL).increment(1);
            let remaining = self.inner.cooldowns.remaining(key).unwrap_or_default();
            self.inner.logger.warn_once(
                &format!("cooldown:{key}"),
                &format!(
                    "skipping mention fetch for {key} after a recent failure, retrying in {:?}",
                    Duration::from_millis(remaining.as_millis() as u64)
                ),
            );
            return Lookup::served(self.inner.last_known(key), Origin::CoolingDown);
        }

        let inner = Arc::clone(&self.inner);
        let owned_key = key.to_owned();
        let flight = self
            .inner
            .in_flight
            .run_exclusive(key, move || async move { inner.refresh(&owned_key).await });

        match flight.await {
            Some(lookup) => lookup,
            None => {
                error!(target_url = %key, "mention fetch task aborted");
                Lookup::served(self.inner.last_known(key), Origin::Fallback)
            }
        }
    }
}

impl Inner {
    /// One upstream attempt plus all of its bookkeeping.
    async fn refresh(&self, key: &str) -> Lookup {
        match self.fetch_upstream(key).await {
            Ok(fetched) => {
                let mentions: Mentions = fetched.into();
                self.records
                    .put(key, Arc::clone(&mentions), self.config.success_ttl);
                self.cooldowns.clear(key);
                debug!(target_url = %key, count = mentions.len(), "cached mentions");
                Lookup::served(mentions, Origin::Upstream)
            }
            Err(err) => {
                let cooldown = self.config.failure_cooldown;
                self.cooldowns.activate(key, cooldown);
                self.logger.error_once(
                    &format!("error:{key}"),
                    &format!("failed to fetch mentions for {key}, retrying in {cooldown:?}"),
                    &err,
                );
                self.records
                    .seed_if_absent(key, Vec::new().into(), cooldown);
                Lookup::failed(self.last_known(key), err)
            }
        }
    }

    /// Single bounded request to the source, with metrics.
    async fn fetch_upstream(&self, key: &str) -> Result<Vec<Mention>> {
        let timeout = self.config.request_timeout;
        let started = Instant::now();
        let result = match tokio::time::timeout(timeout, self.source.fetch(key)).await {
            Ok(result) => result,
            Err(_) => Err(HuginnError::Timeout(timeout)),
        };

        metrics::histogram!(telemetry::UPSTREAM_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(telemetry::UPSTREAM_REQUESTS_TOTAL, "status" => status).increment(1);
        debug!(
            source = self.source.name(),
            target_url = %key,
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream mention fetch finished"
        );
        result
    }

    fn last_known(&self, key: &str) -> Mentions {
        self.records.get(key).unwrap_or_else(|| Vec::new().into())
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    use super::*;

    const KEY: &str = "https://example.com/blog/post";

    struct Unavailable {
        calls: AtomicU32,
    }

    #[async_trait]
    impl MentionSource for Unavailable {
        fn name(&self) -> &str {
            "unavailable"
        }

        async fn fetch(&self, _target: &str) -> Result<Vec<Mention>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(HuginnError::Http("connection reset".into()))
        }
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn count(&self, needle: &str) -> usize {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf)
                .lines()
                .filter(|line| line.contains(needle))
                .count()
        }
    }

    #[test]
    fn cooling_down_key_without_cache_entry_skips_upstream() {
        let source = Arc::new(Unavailable {
            calls: AtomicU32::new(0),
        });
        let aggregator = Aggregator::with_source(
            MentionsConfig::new()
                .token("test-token")
                .failure_cooldown(Duration::from_secs(60)),
            source.clone(),
        );

        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        let lookups = tracing::subscriber::with_default(subscriber, || {
            metrics::with_local_recorder(&recorder, || {
                tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .unwrap()
                    .block_on(async {
                        assert!(aggregator.lookup(KEY).await.is_failure());
                        // drop the empty placeholder so only the cooldown remains
                        aggregator.inner.records.invalidate(KEY);

                        let mut lookups = Vec::new();
                        for _ in 0..5 {
                            lookups.push(aggregator.lookup(KEY).await);
                        }
                        lookups
                    })
            })
        });

        for lookup in &lookups {
            assert_eq!(lookup.origin, Origin::CoolingDown);
            assert!(lookup.mentions.is_empty());
            assert!(!lookup.is_failure());
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(logs.count("skipping mention fetch"), 1);
        assert_eq!(logs.count("failed to fetch mentions"), 1);

        let skips: u64 = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter(|(key, _, _, _)| key.key().name() == telemetry::COOLDOWN_SKIPS_TOTAL)
            .map(|(_, _, _, value)| match value {
                DebugValue::Counter(v) => v,
                _ => 0,
            })
            .sum();
        assert_eq!(skips, 5);
    }

    #[tokio::test]
    async fn expired_cooldown_allows_a_new_fetch() {
        let source = Arc::new(Unavailable {
            calls: AtomicU32::new(0),
        });
        let aggregator = Aggregator::with_source(
            MentionsConfig::new()
                .token("test-token")
                .failure_cooldown(Duration::from_millis(50)),
            source.clone(),
        );

        aggregator.lookup(KEY).await;
        aggregator.inner.records.invalidate(KEY);
        assert_eq!(aggregator.lookup(KEY).await.origin, Origin::CoolingDown);
        assert!(aggregator.inner.cooldowns.remaining(KEY).is_some());

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(aggregator.lookup(KEY).await.origin, Origin::Fallback);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
