//! Plain-text streaming of extracted fragments.
//!
//! The outbound body is a pull-driven generator: it awaits one upstream
//! chunk, yields the fragments found in it, and only then asks for the next
//! chunk. The generator owns the upstream byte stream, so dropping the body
//! on any path releases the upstream connection.

use crate::api::disconnect::{DisconnectStream, StreamCompletion};
use crate::core::metrics::{get_metrics, OUTCOME_COMPLETED, OUTCOME_TRANSPORT_ERROR};
use crate::transformer::ExtractionMode;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use std::time::Instant;

pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Turn an upstream byte stream into a stream of text fragments.
///
/// Each yielded item is exactly one fragment, in upstream order. A read
/// error ends the stream with an `io::Error`, which aborts the response body
/// since headers have already been sent.
pub fn fragment_stream<S, E>(
    upstream: S,
    mode: ExtractionMode,
    completion: StreamCompletion,
    request_id: String,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    async_stream::stream! {
        let mut upstream = Box::pin(upstream);
        let mut extractor = mode.extractor();
        let started = Instant::now();
        let mut emitted: usize = 0;
        let mut failure: Option<String> = None;

        while let Some(chunk) = upstream.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    failure = Some(e.to_string());
                    break;
                }
            };

            for fragment in extractor.push(&bytes) {
                record_fragment(mode, started, &mut emitted);
                yield Ok(Bytes::from(fragment));
            }
        }

        if let Some(error) = failure {
            tracing::error!(
                request_id = %request_id,
                error = %error,
                fragments = emitted,
                "Error reading upstream stream"
            );
            completion.finish(OUTCOME_TRANSPORT_ERROR);
            yield Err(std::io::Error::new(std::io::ErrorKind::Other, error));
        } else {
            for fragment in extractor.finish() {
                record_fragment(mode, started, &mut emitted);
                yield Ok(Bytes::from(fragment));
            }
            completion.finish(OUTCOME_COMPLETED);
            tracing::debug!(
                request_id = %request_id,
                fragments = emitted,
                mode = %mode,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Upstream stream completed"
            );
        }
    }
}

fn record_fragment(mode: ExtractionMode, started: Instant, emitted: &mut usize) {
    let metrics = get_metrics();
    if *emitted == 0 {
        metrics
            .time_to_first_fragment
            .observe(started.elapsed().as_secs_f64());
    }
    *emitted += 1;
    metrics.fragments.with_label_values(&[mode.as_str()]).inc();
}

/// Build the `200 text/plain` response relaying a successful upstream call.
pub fn create_text_stream(
    response: reqwest::Response,
    mode: ExtractionMode,
    request_id: String,
) -> Response {
    text_stream_response(response.bytes_stream(), mode, request_id)
}

/// Same as [`create_text_stream`] for any upstream byte stream.
pub fn text_stream_response<S, E>(upstream: S, mode: ExtractionMode, request_id: String) -> Response
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let completion = StreamCompletion::new();
    let fragments = fragment_stream(upstream, mode, completion.clone(), request_id.clone());
    let guarded = DisconnectStream::new(Box::pin(fragments), completion, request_id);

    let mut response = Response::new(Body::from_stream(guarded));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(TEXT_CONTENT_TYPE),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}
