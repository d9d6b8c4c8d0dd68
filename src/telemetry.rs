//! Telemetry metric name constants.
//!
//! Centralised metric names for huginn operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `huginn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `status`: upstream outcome: "ok" or "error"
//! - `reason`: why a record was dropped: "property" or "fields"

/// Total upstream fetches issued to the aggregation service.
///
/// Labels: `status` ("ok" | "error").
pub const UPSTREAM_REQUESTS_TOTAL: &str = "huginn_upstream_requests_total";

/// Upstream fetch duration in seconds, including timeouts.
pub const UPSTREAM_DURATION_SECONDS: &str = "huginn_upstream_duration_seconds";

/// Total lookups answered from the record cache.
pub const CACHE_HITS_TOTAL: &str = "huginn_cache_hits_total";

/// Total lookups that missed the record cache.
pub const CACHE_MISSES_TOTAL: &str = "huginn_cache_misses_total";

/// Total lookups short-circuited because the key was cooling down.
pub const COOLDOWN_SKIPS_TOTAL: &str = "huginn_cooldown_skips_total";

/// Total callers that joined a fetch already in flight for their key.
pub const COALESCED_TOTAL: &str = "huginn_coalesced_total";

/// Total raw records discarded while processing a feed.
///
/// Labels: `reason` ("property" | "fields").
pub const RECORDS_DROPPED_TOTAL: &str = "huginn_records_dropped_total";

/// Total log lines swallowed by the throttled logger.
pub const LOGS_SUPPRESSED_TOTAL: &str = "huginn_logs_suppressed_total";
