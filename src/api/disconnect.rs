use crate::core::metrics::{get_metrics, OUTCOME_CLIENT_DISCONNECT};
use bytes::Bytes;
use futures::stream::Stream;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

/// Shared flag recording whether an outbound stream reached a terminal state.
#[derive(Clone, Default)]
pub struct StreamCompletion {
    finished: Arc<AtomicBool>,
}

impl StreamCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome. Only the first call counts.
    pub fn finish(&self, outcome: &'static str) -> bool {
        if self.finished.swap(true, Ordering::SeqCst) {
            return false;
        }
        get_metrics()
            .stream_outcomes
            .with_label_values(&[outcome])
            .inc();
        true
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

/// A stream wrapper that detects the client going away.
///
/// Axum drops the response body when the connection closes. If that happens
/// before the inner stream finished, it is recorded as a disconnect. The
/// inner stream, and with it the upstream connection, is dropped right after.
pub struct DisconnectStream<S> {
    pub stream: S,
    pub completion: StreamCompletion,
    pub request_id: String,
}

impl<S> DisconnectStream<S> {
    pub fn new(stream: S, completion: StreamCompletion, request_id: String) -> Self {
        Self {
            stream,
            completion,
            request_id,
        }
    }
}

impl<S, E> Stream for DisconnectStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.stream).poll_next(cx)
    }
}

impl<S> Drop for DisconnectStream<S> {
    fn drop(&mut self) {
        if self.completion.finish(OUTCOME_CLIENT_DISCONNECT) {
            tracing::info!(
                request_id = %self.request_id,
                "Client disconnected before the stream finished"
            );
        }
    }
}
