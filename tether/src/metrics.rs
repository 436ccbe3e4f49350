//! Metrics declaration.
//!
//! Metric names are only registered when the `metrics` feature is enabled.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    // Fetch outcome metrics

    /// Track fetches answered from the network.
    pub static ref FETCH_NETWORK_COUNTER: &'static str = {
        metrics::describe_counter!(
            "tether_fetch_network_total",
            "Total number of fetches answered from the network."
        );
        "tether_fetch_network_total"
    };
    /// Track fetches answered from cache after a network failure.
    pub static ref FETCH_CACHE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "tether_fetch_cache_total",
            "Total number of fetches answered from cache after a network failure."
        );
        "tether_fetch_cache_total"
    };
    /// Track fetches that failed with no cached fallback.
    pub static ref FETCH_FAILED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "tether_fetch_failed_total",
            "Total number of fetches that failed with no cached fallback."
        );
        "tether_fetch_failed_total"
    };

    // Cache storage metrics

    /// Track successful cache writes.
    pub static ref CACHE_WRITES: &'static str = {
        metrics::describe_counter!(
            "tether_cache_writes_total",
            "Total number of successful cache writes."
        );
        "tether_cache_writes_total"
    };
    /// Track failed cache writes.
    pub static ref CACHE_WRITE_ERRORS: &'static str = {
        metrics::describe_counter!(
            "tether_cache_write_errors_total",
            "Total number of failed cache writes."
        );
        "tether_cache_write_errors_total"
    };
    /// Track cache generations deleted on activation.
    pub static ref GENERATIONS_PURGED: &'static str = {
        metrics::describe_counter!(
            "tether_generations_purged_total",
            "Total number of cache generations deleted on activation."
        );
        "tether_generations_purged_total"
    };

    // Lifecycle metrics

    /// Gauge of currently running lifecycle tasks.
    pub static ref LIFECYCLE_TASKS_ACTIVE: &'static str = {
        metrics::describe_gauge!(
            "tether_lifecycle_tasks_active",
            "Number of currently running lifecycle tasks."
        );
        "tether_lifecycle_tasks_active"
    };
    /// Track lifecycle tasks that ran to completion.
    pub static ref LIFECYCLE_TASKS_COMPLETED: &'static str = {
        metrics::describe_counter!(
            "tether_lifecycle_tasks_completed_total",
            "Total number of lifecycle tasks completed."
        );
        "tether_lifecycle_tasks_completed_total"
    };
    /// Histogram of lifecycle task duration.
    pub static ref LIFECYCLE_TASK_DURATION: &'static str = {
        metrics::describe_histogram!(
            "tether_lifecycle_task_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of lifecycle tasks in seconds."
        );
        "tether_lifecycle_task_duration_seconds"
    };

    // Messaging metrics

    /// Track messages delivered to pages.
    pub static ref MESSAGES_DELIVERED: &'static str = {
        metrics::describe_counter!(
            "tether_messages_delivered_total",
            "Total number of messages delivered to pages."
        );
        "tether_messages_delivered_total"
    };
    /// Track messages dropped because the page was gone.
    pub static ref MESSAGES_DROPPED: &'static str = {
        metrics::describe_counter!(
            "tether_messages_dropped_total",
            "Total number of messages dropped because the addressee was gone."
        );
        "tether_messages_dropped_total"
    };
}

/// How a fetch was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The network answered.
    Network,
    /// The network failed and a cached snapshot answered.
    Cache,
    /// The network failed and nothing was cached.
    Failed,
}

impl FetchOutcome {
    /// Value recorded on the `fetch.outcome` span field.
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchOutcome::Network => "network",
            FetchOutcome::Cache => "cache",
            FetchOutcome::Failed => "failed",
        }
    }
}

/// Record the outcome of one intercepted fetch.
///
/// No-op when the `metrics` feature is disabled.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_fetch(outcome: FetchOutcome) {
    let counter = match outcome {
        FetchOutcome::Network => *FETCH_NETWORK_COUNTER,
        FetchOutcome::Cache => *FETCH_CACHE_COUNTER,
        FetchOutcome::Failed => *FETCH_FAILED_COUNTER,
    };
    metrics::counter!(counter).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_fetch(_outcome: FetchOutcome) {}
