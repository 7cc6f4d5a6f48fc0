#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chatlogs_queue::memory::MemoryQueue;
use chatlogs_queue::publisher::QueuePublisher;
use chatlogs_queue::submitter::JobSubmitter;
use http_body_util::BodyExt;
use tower::ServiceExt;

use chatlogs_api::config::{QueueBackend, ServerConfig};
use chatlogs_api::router::build_app_router;
use chatlogs_api::state::AppState;

/// Build a test `ServerConfig` with an in-memory queue and a 30-second
/// request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
        queue: QueueBackend::Memory,
    }
}

/// Build the full application router around the given publisher.
pub fn build_test_app(publisher: Arc<dyn QueuePublisher>) -> Router {
    let config = test_config();
    let state = AppState {
        submitter: JobSubmitter::new(publisher),
    };
    build_app_router(state, &config)
}

/// Build the router around a fresh [`MemoryQueue`] and return both.
pub fn build_memory_app() -> (Router, Arc<MemoryQueue>) {
    let queue = Arc::new(MemoryQueue::default());
    (build_test_app(queue.clone()), queue)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, Body::empty()).await
}

pub async fn post_raw(app: Router, uri: &str, body: &str) -> Response<Body> {
    send(app, Method::POST, uri, Body::from(body.to_owned())).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, &body.to_string()).await
}

pub async fn send(app: Router, method: Method, uri: &str, body: Body) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the fixed CORS headers the admin console relies on.
pub fn assert_cors_headers(response: &Response<Body>) {
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(
        headers["access-control-allow-headers"],
        "Content-Type,X-Amz-Date,Authorization,X-Api-Key"
    );
    assert_eq!(headers["access-control-allow-methods"], "OPTIONS,POST");
}
