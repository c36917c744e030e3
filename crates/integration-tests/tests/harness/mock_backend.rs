//! Mock OpenAI-compatible backend for integration tests
//!
//! Serves chat completions, legacy completions and embeddings, plus a
//! predictor endpoint for external strategies. Every request is counted
//! and the last forwarded completion body is kept for inspection.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Mock backend that returns predictable responses
pub struct MockBackend {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    chat_count: AtomicU32,
    completion_count: AtomicU32,
    embedding_count: AtomicU32,
    predict_count: AtomicU32,
    /// Answer completions with 500
    failing: AtomicBool,
    /// Delay before answering completions
    delay: Mutex<Option<Duration>>,
    last_request: Mutex<Option<Value>>,
}

impl MockBackend {
    /// Start the mock server, returning immediately
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .route("/v1/completions", routing::post(handle_completions))
            .route("/v1/embeddings", routing::post(handle_embeddings))
            .route("/predict", routing::post(handle_predict))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as backend and embeddings provider
    ///
    /// Includes `/v1` since clients append paths like `/chat/completions`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// URL of the predictor endpoint
    pub fn predictor_url(&self) -> String {
        format!("http://{}/predict", self.addr)
    }

    /// Fail every subsequent completion with 500
    pub fn fail_completions(&self) {
        self.state.failing.store(true, Ordering::Relaxed);
    }

    /// Delay every subsequent completion
    pub fn delay_completions(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = Some(delay);
    }

    pub fn chat_count(&self) -> u32 {
        self.state.chat_count.load(Ordering::Relaxed)
    }

    pub fn completion_count(&self) -> u32 {
        self.state.completion_count.load(Ordering::Relaxed)
    }

    pub fn embedding_count(&self) -> u32 {
        self.state.embedding_count.load(Ordering::Relaxed)
    }

    pub fn predict_count(&self) -> u32 {
        self.state.predict_count.load(Ordering::Relaxed)
    }

    /// Body of the most recent chat or legacy completion request
    pub fn last_request(&self) -> Option<Value> {
        self.state.last_request.lock().unwrap().clone()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Shared handling for both completion APIs; `None` means answer normally
async fn intercept(state: &MockState, body: &Value) -> Option<Response> {
    *state.last_request.lock().unwrap() = Some(body.clone());

    let delay = *state.delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    if state.failing.load(Ordering::Relaxed) {
        return Some(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": {"message": "mock failure", "type": "server_error"}})),
            )
                .into_response(),
        );
    }

    None
}

async fn handle_chat_completions(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.chat_count.fetch_add(1, Ordering::Relaxed);
    if let Some(response) = intercept(&state, &body).await {
        return response;
    }

    Json(json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": body["model"],
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "Hello from mock backend"},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 5, "completion_tokens": 4, "total_tokens": 9}
    }))
    .into_response()
}

async fn handle_completions(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.completion_count.fetch_add(1, Ordering::Relaxed);
    if let Some(response) = intercept(&state, &body).await {
        return response;
    }

    Json(json!({
        "id": "cmpl-mock",
        "object": "text_completion",
        "created": 1_700_000_000,
        "model": body["model"],
        "choices": [{"index": 0, "text": " there lived a router", "finish_reason": "stop"}]
    }))
    .into_response()
}

/// Prompts mentioning "math" embed along the first axis, everything
/// else along the second
async fn handle_embeddings(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Json<Value> {
    state.embedding_count.fetch_add(1, Ordering::Relaxed);

    let input = body["input"].as_str().unwrap_or_default();
    let embedding = if input.contains("math") { [1.0, 0.0] } else { [0.0, 1.0] };

    Json(json!({
        "object": "list",
        "data": [{"object": "embedding", "index": 0, "embedding": embedding}],
        "model": body["model"],
        "usage": {"prompt_tokens": 1, "total_tokens": 1}
    }))
}

/// Prompts mentioning "hard" score high
async fn handle_predict(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Json<Value> {
    state.predict_count.fetch_add(1, Ordering::Relaxed);

    let prompt = body["prompt"].as_str().unwrap_or_default();
    let score = if prompt.contains("hard") { 0.9 } else { 0.1 };

    Json(json!({"score": score}))
}
