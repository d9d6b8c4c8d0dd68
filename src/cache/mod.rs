//! Caching subsystem.
//!
//! Two independent per-key stores, both owned by the
//! [`Aggregator`](crate::Aggregator) and written only by its fetch path:
//!
//! - [`RecordCache`]: mention lists from successful fetches (and the empty
//!   placeholder seeded after a failure), each with its own TTL.
//!
//! - [`CooldownTracker`]: keys that recently failed and must not be
//!   fetched again until their `retry_at` passes.
//!
//! Both are in-memory only; nothing survives a restart.

pub mod cooldown;
pub mod records;

pub use cooldown::CooldownTracker;
pub use records::{Mentions, RecordCache};
