//! Lookup results with provenance.

use std::sync::Arc;

use crate::HuginnError;
use crate::cache::Mentions;

/// Where a lookup's mentions came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The target URL was empty after trimming.
    EmptyTarget,
    /// No usable token is configured.
    Unconfigured,
    /// Fresh entry in the record cache (possibly a failure placeholder).
    Cache,
    /// The key is backing off after a failure; last cached value served.
    CoolingDown,
    /// A successful upstream fetch, own or joined.
    Upstream,
    /// The upstream fetch failed; last cached value served.
    Fallback,
}

/// Outcome of one [`Aggregator::lookup`](super::Aggregator::lookup).
///
/// `mentions` is always usable; `error` carries the upstream failure for
/// `Origin::Fallback` so callers and tests can see what happened without it
/// ever surfacing as an `Err`.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub mentions: Mentions,
    pub origin: Origin,
    pub error: Option<Arc<HuginnError>>,
}

impl Lookup {
    pub(crate) fn empty(origin: Origin) -> Self {
        Self::served(Vec::new().into(), origin)
    }

    pub(crate) fn served(mentions: Mentions, origin: Origin) -> Self {
        Self {
            mentions,
            origin,
            error: None,
        }
    }

    pub(crate) fn failed(mentions: Mentions, error: HuginnError) -> Self {
        Self {
            mentions,
            origin: Origin::Fallback,
            error: Some(Arc::new(error)),
        }
    }

    /// Whether an upstream request was attempted and failed.
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}
