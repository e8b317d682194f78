//! Prometheus metrics for monitoring the prompt relay.
//!
//! This module provides a centralized metrics registry for request volume,
//! latency, upstream failures and stream outcomes.

use prometheus::{
    register_gauge_vec, register_histogram, register_histogram_vec, register_int_counter_vec,
    GaugeVec, Histogram, HistogramVec, IntCounterVec,
};
use std::sync::OnceLock;

/// Stream ended because the upstream finished normally.
pub const OUTCOME_COMPLETED: &str = "completed";
/// Stream ended because reading the upstream failed.
pub const OUTCOME_TRANSPORT_ERROR: &str = "transport_error";
/// Stream was dropped before it finished.
pub const OUTCOME_CLIENT_DISCONNECT: &str = "client_disconnect";

/// Container for all application metrics.
pub struct Metrics {
    /// Total number of requests by method, endpoint and status
    pub request_count: IntCounterVec,

    /// Request duration histogram in seconds (time to headers for streams)
    pub request_duration: HistogramVec,

    /// Number of currently active requests by endpoint
    pub active_requests: GaugeVec,

    /// Upstream non-success responses by upstream status code
    pub upstream_errors: IntCounterVec,

    /// Text fragments forwarded to clients, by extraction mode
    pub fragments: IntCounterVec,

    /// How outbound streams ended
    pub stream_outcomes: IntCounterVec,

    /// Time from upstream response to the first forwarded fragment
    pub time_to_first_fragment: Histogram,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Initialize the metrics registry.
///
/// Safe to call more than once; later calls return the same instance.
///
/// # Examples
///
/// ```no_run
/// use prompt_relay::core::metrics::init_metrics;
///
/// let metrics = init_metrics();
/// metrics.request_count.with_label_values(&["GET", "/health", "200"]).inc();
/// ```
pub fn init_metrics() -> &'static Metrics {
    METRICS.get_or_init(|| {
        let request_count = register_int_counter_vec!(
            "prompt_relay_requests_total",
            "Total number of requests",
            &["method", "endpoint", "status_code"]
        )
        .expect("Failed to register request_count metric");

        let request_duration = register_histogram_vec!(
            "prompt_relay_request_duration_seconds",
            "Request duration in seconds",
            &["method", "endpoint"],
            vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]
        )
        .expect("Failed to register request_duration metric");

        let active_requests = register_gauge_vec!(
            "prompt_relay_active_requests",
            "Number of active requests",
            &["endpoint"]
        )
        .expect("Failed to register active_requests metric");

        let upstream_errors = register_int_counter_vec!(
            "prompt_relay_upstream_errors_total",
            "Upstream responses with a non-success status",
            &["status_code"]
        )
        .expect("Failed to register upstream_errors metric");

        let fragments = register_int_counter_vec!(
            "prompt_relay_fragments_total",
            "Text fragments forwarded to clients",
            &["mode"]
        )
        .expect("Failed to register fragments metric");

        let stream_outcomes = register_int_counter_vec!(
            "prompt_relay_stream_outcomes_total",
            "Outbound stream terminations by outcome",
            &["outcome"]
        )
        .expect("Failed to register stream_outcomes metric");

        let time_to_first_fragment = register_histogram!(
            "prompt_relay_time_to_first_fragment_seconds",
            "Time from upstream response headers to the first forwarded fragment",
            vec![0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0]
        )
        .expect("Failed to register time_to_first_fragment metric");

        Metrics {
            request_count,
            request_duration,
            active_requests,
            upstream_errors,
            fragments,
            stream_outcomes,
            time_to_first_fragment,
        }
    })
}

/// Get the global metrics instance, initializing it on first use.
pub fn get_metrics() -> &'static Metrics {
    init_metrics()
}
