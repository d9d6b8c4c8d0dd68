//! Huginn - cached, coalesced webmention aggregation
//!
//! This crate fetches the replies, likes, reposts and mentions a page has
//! received from an aggregation service (webmention.io by default) and
//! serves them to page renders without hammering the service or depending
//! on its availability:
//!
//! - successful results are cached per page for a short TTL
//! - concurrent renders of the same page share one upstream request
//! - a failed request puts the page into a cooldown during which the last
//!   cached value (or an empty list) is served
//! - repeated warnings during an outage are rate-limited
//!
//! # Example
//!
//! ```rust,no_run
//! use huginn::{Aggregator, Environment, MentionProperty, MentionsConfig, count_by_type};
//!
//! #[tokio::main]
//! async fn main() -> huginn::Result<()> {
//!     let config = MentionsConfig::for_environment(Environment::Development)
//!         .token("your-webmention-io-token");
//!     let aggregator = Aggregator::new(config)?;
//!
//!     let url = "https://example.com/blog/post";
//!     let mentions = aggregator.fetch_mentions(url).await;
//!     let likes = count_by_type(&mentions, url, &[MentionProperty::LikeOf]);
//!
//!     println!("{} mentions, {likes} likes", mentions.len());
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod cache;
pub mod coalesce;
pub mod config;
pub mod error;
pub mod filters;
pub mod log_throttle;
pub mod telemetry;
pub mod types;
pub mod upstream;

// Re-export main types at crate root
pub use aggregator::{Aggregator, Lookup, Origin};
pub use cache::Mentions;
pub use config::{Environment, MentionsConfig};
pub use error::{HuginnError, Result};
pub use filters::{count_by_type, filter_by_url, is_own_mention};
pub use types::{Author, Content, Mention, MentionProperty};
pub use upstream::{MentionSource, WebmentionIoClient};
