//! Shared helpers for the relay integration tests.
#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    http::Request,
    response::Response,
    routing::post,
    Router,
};
use prompt_relay::{
    api::create_http_client,
    core::{init_metrics, AppConfig},
    create_router, AppState, ExtractionMode,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

pub const TEST_API_KEY: &str = "test-key";

/// Build the relay router pointed at `api_base`.
pub fn create_relay_app(api_base: &str, mode: ExtractionMode) -> Router {
    init_metrics();

    let mut config = AppConfig::default();
    config.upstream.api_base = api_base.trim_end_matches('/').to_string();
    config.upstream.api_key = Some(TEST_API_KEY.to_string());
    config.request_timeout_secs = 10;
    config.connect_timeout_secs = 2;
    config.extraction_mode = mode;

    let http_client = create_http_client(&config).expect("Failed to build HTTP client");
    create_router(Arc::new(AppState::new(config, http_client)))
}

pub fn prompt_request(prompt: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "prompt": prompt }).to_string()))
        .unwrap()
}

/// One streamed response object carrying `text`.
pub fn gemini_object(text: &str) -> String {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
        }]
    })
    .to_string()
}

/// A complete upstream body in the bracketed array framing.
pub fn gemini_array(texts: &[&str]) -> String {
    let objects: Vec<String> = texts.iter().map(|t| gemini_object(t)).collect();
    format!("[{}]", objects.join(",\r\n"))
}

/// An upstream that streams whatever the test pushes through `sender`.
///
/// Dropping `sender` ends the upstream body. Once the relay lets go of the
/// upstream connection, sends start failing.
pub struct StubUpstream {
    pub base_url: String,
    pub sender: mpsc::UnboundedSender<Bytes>,
}

pub async fn spawn_stub_upstream() -> StubUpstream {
    let (sender, receiver) = mpsc::unbounded_channel::<Bytes>();
    let receiver = Arc::new(Mutex::new(Some(receiver)));

    let app = Router::new().route(
        "/v1beta/models/*rest",
        post(move |_body: Bytes| {
            let receiver = receiver.clone();
            async move {
                let mut receiver = receiver
                    .lock()
                    .await
                    .take()
                    .expect("stub upstream serves a single request");
                let stream = async_stream::stream! {
                    while let Some(chunk) = receiver.recv().await {
                        yield Ok::<Bytes, std::io::Error>(chunk);
                    }
                };
                Response::builder()
                    .header("content-type", "application/json")
                    .body(Body::from_stream(stream))
                    .unwrap()
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubUpstream {
        base_url: format!("http://{}", addr),
        sender,
    }
}
