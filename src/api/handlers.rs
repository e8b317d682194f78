//! HTTP request handlers for the prompt relay.
//!
//! This module contains the relay endpoint plus health and metrics handlers.

use crate::api::models::{HealthResponse, PromptRequest};
use crate::api::streaming::create_text_stream;
use crate::api::upstream::{read_upstream_error, send_stream_request};
use crate::core::config::AppConfig;
use crate::core::logging::get_request_id;
use crate::core::metrics::get_metrics;
use crate::core::{AppError, Result};
use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;

/// Largest inbound body accepted.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: AppConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }
}

/// Relay a prompt to the upstream and stream the generated text back.
///
/// Checks, in order: method, prompt, API key. The first failing check
/// decides the response. Once the upstream answers successfully the
/// response is a `text/plain` stream of text fragments.
#[tracing::instrument(
    skip_all,
    fields(method = %request.method(), path = %request.uri().path())
)]
pub async fn relay_prompt(State(state): State<Arc<AppState>>, request: Request) -> Result<Response> {
    if request.method() != Method::POST {
        return Err(AppError::MethodNotAllowed);
    }

    let body = axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Failed to read body: {}", e)))?;
    let prompt = PromptRequest::parse_prompt(&body)?;

    let api_key = state
        .config
        .upstream
        .api_key()
        .ok_or(AppError::Misconfigured)?;

    let request_id = get_request_id();

    let response = send_stream_request(
        &state.http_client,
        &state.config.upstream,
        api_key,
        &prompt,
    )
    .await?;

    let status = response.status();
    if !status.is_success() {
        let error_body = read_upstream_error(response).await;
        tracing::error!(
            request_id = %request_id,
            status = status.as_u16(),
            body = %error_body,
            "Upstream returned an error"
        );
        get_metrics()
            .upstream_errors
            .with_label_values(&[status.as_str()])
            .inc();
        let status = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        return Err(AppError::Upstream { status });
    }

    Ok(create_text_stream(
        response,
        state.config.extraction_mode,
        request_id,
    ))
}

/// Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Prometheus metrics endpoint.
pub async fn metrics_handler() -> Result<Response> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response())
}
