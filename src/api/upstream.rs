//! Upstream request execution helpers.
//!
//! Builds the shared HTTP client and the single `streamGenerateContent`
//! call made per inbound request.

use crate::core::config::{AppConfig, UpstreamConfig};
use crate::transformer::gemini::GenerateContentRequest;
use std::error::Error;
use std::time::Duration;

const MAX_ERROR_BODY_LEN: usize = 2000;

/// Create the HTTP client with connection pooling.
pub fn create_http_client(config: &AppConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(!config.verify_ssl)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_max_idle_per_host(100)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
}

/// Send the streaming generation request.
///
/// The key travels as the `key` query parameter and is kept out of logs.
pub async fn send_stream_request(
    http_client: &reqwest::Client,
    upstream: &UpstreamConfig,
    api_key: &str,
    prompt: &str,
) -> reqwest::Result<reqwest::Response> {
    let url = upstream.stream_url();
    let payload = GenerateContentRequest::from_prompt(prompt);

    tracing::debug!(
        url = %url,
        model = %upstream.model,
        prompt_len = prompt.len(),
        "Sending upstream streaming request"
    );

    let response = http_client
        .post(&url)
        .query(&[("key", api_key)])
        .json(&payload)
        .send()
        .await
        .map_err(|e| {
            // reqwest includes the full URL in its error text; drop it.
            let e = e.without_url();
            tracing::error!(
                url = %url,
                error = %e,
                error_source = ?e.source(),
                is_timeout = e.is_timeout(),
                is_connect = e.is_connect(),
                "HTTP request failed to upstream"
            );
            e
        })?;

    tracing::debug!(
        url = %url,
        status = %response.status(),
        "Upstream responded"
    );

    Ok(response)
}

/// Drain an error response body for diagnostics.
pub async fn read_upstream_error(response: reqwest::Response) -> String {
    match response.bytes().await {
        Ok(bytes) if bytes.is_empty() => "<empty body>".to_string(),
        Ok(bytes) => truncate_message(&String::from_utf8_lossy(&bytes)),
        Err(error) => format!("Failed to read response: {}", error.without_url()),
    }
}

fn truncate_message(message: &str) -> String {
    if message.len() <= MAX_ERROR_BODY_LEN {
        return message.to_string();
    }
    let mut end = MAX_ERROR_BODY_LEN;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &message[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_message() {
        assert_eq!(truncate_message("boom"), "boom");
    }

    #[test]
    fn test_truncate_long_message_on_char_boundary() {
        let message = "é".repeat(MAX_ERROR_BODY_LEN);
        let truncated = truncate_message(&message);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= MAX_ERROR_BODY_LEN + 3);
    }

    #[test]
    fn test_create_http_client() {
        let config = AppConfig::default();
        assert!(create_http_client(&config).is_ok());
    }
}
