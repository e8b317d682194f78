//! HTTP middleware for request tracking and metrics.
//!
//! Records request counts, durations and in-flight gauges, and writes one
//! access log line per request.

use crate::core::metrics::get_metrics;
use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// Metrics label for requests that matched no route.
pub const UNMATCHED_ENDPOINT: &str = "unmatched";

/// Middleware for tracking request metrics.
pub struct MetricsMiddleware;

impl MetricsMiddleware {
    /// Track metrics for each request.
    ///
    /// For streaming responses the recorded duration is time to headers,
    /// since `next.run()` returns before the body has been sent.
    pub async fn track_metrics(request: Request, next: Next) -> Response {
        let path = request.uri().path().to_string();
        let method = request.method().to_string();

        // Skip metrics endpoint itself to avoid recursion
        if path == "/metrics" {
            return next.run(request).await;
        }

        // Any path reaches the relay; label by route pattern to bound cardinality.
        let endpoint = request
            .extensions()
            .get::<MatchedPath>()
            .map(|matched| matched.as_str().to_string())
            .unwrap_or_else(|| UNMATCHED_ENDPOINT.to_string());

        let metrics = get_metrics();

        metrics
            .active_requests
            .with_label_values(&[&endpoint])
            .inc();

        let start = Instant::now();

        let response = next.run(request).await;

        let duration = start.elapsed().as_secs_f64();
        let status_code = response.status().as_u16().to_string();

        metrics
            .request_count
            .with_label_values(&[&method, &endpoint, &status_code])
            .inc();
        metrics
            .request_duration
            .with_label_values(&[&method, &endpoint])
            .observe(duration);

        let is_streaming = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("text/plain"))
            .unwrap_or(false);

        if is_streaming {
            tracing::info!(
                "{} {} - status={} ttfb={:.3}s",
                method,
                path,
                status_code,
                duration
            );
        } else {
            tracing::info!(
                "{} {} - status={} duration={:.3}s",
                method,
                path,
                status_code,
                duration
            );
        }

        metrics
            .active_requests
            .with_label_values(&[&endpoint])
            .dec();

        response
    }
}
