//! Upstream mention sources.
//!
//! The aggregator talks to the network only through [`MentionSource`], so
//! tests (and alternative services) can stand in for webmention.io.
//!
//! A source performs exactly one attempt per call. Retrying is the
//! aggregator's business, and it answers failures with a cooldown rather
//! than another request.

pub mod feed;
pub mod sanitize;
mod webmention_io;

use async_trait::async_trait;

use crate::Result;
use crate::types::Mention;

pub use feed::parse_feed;
pub use webmention_io::WebmentionIoClient;

/// Source of mentions for a target page.
#[async_trait]
pub trait MentionSource: Send + Sync {
    /// Source name for logging/debugging.
    fn name(&self) -> &str;

    /// Fetch validated, ordered and sanitized mentions of `target`.
    ///
    /// Fails on network errors, timeouts, non-2xx statuses and malformed
    /// payloads. Individual invalid records are dropped, not reported.
    async fn fetch(&self, target: &str) -> Result<Vec<Mention>>;
}
