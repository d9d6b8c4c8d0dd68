//! Log volume during outages and misconfiguration.
//!
//! Captures `tracing` output on a current-thread runtime so that spawned
//! fetch tasks log through the same thread-local subscriber.

use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use huginn::{Aggregator, HuginnError, Mention, MentionSource, MentionsConfig, Result};

const TARGET: &str = "https://example.com/blog/post";

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn lines_containing(&self, needle: &str) -> usize {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .filter(|line| line.contains(needle))
            .count()
    }
}

impl io::Write for Captured {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture<F: Future>(fut: F) -> Captured {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap()
            .block_on(fut)
    });

    captured
}

/// Never answers within any reasonable timeout.
struct StalledSource {
    calls: AtomicU32,
}

#[async_trait]
impl MentionSource for StalledSource {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn fetch(&self, _target: &str) -> Result<Vec<Mention>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(vec![])
    }
}

struct DownSource {
    calls: AtomicU32,
}

#[async_trait]
impl MentionSource for DownSource {
    fn name(&self) -> &str {
        "down"
    }

    async fn fetch(&self, _target: &str) -> Result<Vec<Mention>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(HuginnError::Api {
            status: 502,
            message: "Bad Gateway".into(),
        })
    }
}

#[test]
fn timed_out_upstream_logs_one_error_for_many_calls() {
    let source = Arc::new(StalledSource {
        calls: AtomicU32::new(0),
    });
    let aggregator = Aggregator::with_source(
        MentionsConfig::new()
            .token("test-token")
            .request_timeout(Duration::from_millis(50)),
        source.clone(),
    );

    let logs = capture(async move {
        for _ in 0..50 {
            assert!(aggregator.fetch_mentions(TARGET).await.is_empty());
        }
    });

    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert_eq!(logs.lines_containing("failed to fetch mentions"), 1);
    assert_eq!(logs.lines_containing("ERROR"), 1);
}

#[test]
fn repeated_failures_within_window_log_once() {
    let source = Arc::new(DownSource {
        calls: AtomicU32::new(0),
    });
    let aggregator = Aggregator::with_source(
        MentionsConfig::new()
            .token("test-token")
            .failure_cooldown(Duration::from_millis(10))
            .log_window(Duration::from_secs(60)),
        source.clone(),
    );

    let logs = capture(async move {
        for _ in 0..3 {
            aggregator.fetch_mentions(TARGET).await;
            tokio::time::sleep(Duration::from_millis(40)).await;
        }
    });

    assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    assert_eq!(logs.lines_containing("failed to fetch mentions"), 1);
    assert_eq!(logs.lines_containing("502"), 1);
    // sub-second cooldowns keep their unit in the message
    assert_eq!(logs.lines_containing("retrying in 10ms"), 1);
}

#[test]
fn failures_on_distinct_keys_are_logged_separately() {
    let aggregator = Aggregator::with_source(
        MentionsConfig::new().token("test-token"),
        Arc::new(DownSource {
            calls: AtomicU32::new(0),
        }),
    );

    let logs = capture(async move {
        aggregator.fetch_mentions("https://example.com/a").await;
        aggregator.fetch_mentions("https://example.com/b").await;
        aggregator.fetch_mentions("https://example.com/a").await;
    });

    assert_eq!(logs.lines_containing("failed to fetch mentions"), 2);
}

#[test]
fn missing_token_warns_exactly_once() {
    let source = Arc::new(DownSource {
        calls: AtomicU32::new(0),
    });
    let aggregator = Aggregator::with_source(MentionsConfig::new().token("  "), source.clone());

    let logs = capture(async move {
        for i in 0..20 {
            let url = format!("https://example.com/post-{}", i % 4);
            assert!(aggregator.fetch_mentions(&url).await.is_empty());
        }
    });

    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    assert_eq!(logs.lines_containing("token is not configured"), 1);
    assert_eq!(logs.lines_containing("WARN"), 1);
}
