//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with SLO-aligned histograms
//! and standardized naming conventions.

use crate::errors::AppError;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Quyca metrics
pub const METRICS_PREFIX: &str = "quyca";

/// SLO-aligned histogram buckets for request latency (in seconds)
/// Targets: P50 < 100ms, P99 < 500ms
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms - P50 target
    0.250,  // 250ms
    0.500,  // 500ms - P99 target
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Enrichment metrics
    describe_histogram!(
        format!("{}_enrichment_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Time to enrich affiliations with parents and counts"
    );

    describe_counter!(
        format!("{}_affiliations_enriched_total", METRICS_PREFIX),
        Unit::Count,
        "Total affiliation records enriched"
    );

    // Search metrics
    describe_counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of affiliation searches"
    );

    describe_histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Affiliation search latency in seconds"
    );

    describe_gauge!(
        format!("{}_search_results_count", METRICS_PREFIX),
        Unit::Count,
        "Number of results on the last returned page"
    );

    // Hierarchy metrics
    describe_counter!(
        format!("{}_related_lookups_total", METRICS_PREFIX),
        Unit::Count,
        "Total related-entity assemblies"
    );

    describe_counter!(
        format!("{}_collaborator_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Failed store, counter or lookup calls"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record enrichment of `records` affiliations
pub fn record_enrichment(duration_secs: f64, records: usize) {
    counter!(format!("{}_affiliations_enriched_total", METRICS_PREFIX)).increment(records as u64);

    histogram!(format!("{}_enrichment_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

/// Helper to record search metrics
pub fn record_search(duration_secs: f64, scope: &str, result_count: usize) {
    counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        "scope" => scope.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        "scope" => scope.to_string()
    )
    .record(duration_secs);

    gauge!(
        format!("{}_search_results_count", METRICS_PREFIX),
        "scope" => scope.to_string()
    )
    .set(result_count as f64);
}

/// Helper to record a related-entity assembly
pub fn record_related(typ: &str, tiers: usize) {
    counter!(
        format!("{}_related_lookups_total", METRICS_PREFIX),
        "type" => typ.to_string(),
        "tiers" => tiers.to_string()
    )
    .increment(1);
}

/// Helper to record a failed collaborator call, labelled by error code.
///
/// Client errors (validation, not found) are not counted.
pub fn record_collaborator_error(operation: &str, error: &AppError) -> bool {
    if !error.is_collaborator_failure() {
        return false;
    }
    counter!(
        format!("{}_collaborator_errors_total", METRICS_PREFIX),
        "operation" => operation.to_string(),
        "code" => format!("{:?}", error.code())
    )
    .increment(1);
    true
}
