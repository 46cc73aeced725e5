#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct MockState {
    replies: Arc<Mutex<VecDeque<(StatusCode, Value)>>>,
    payloads: Arc<Mutex<Vec<Value>>>,
}

/// OpenAI-compatible chat-completions endpoint that replays scripted model output.
pub struct MockLlmProvider {
    base_url: String,
    state: MockState,
    handle: tokio::task::JoinHandle<()>,
}

impl MockLlmProvider {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new()
            .route("/chat/completions", post(chat_completions))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("mock llm listener should bind");
        let bind_addr = listener
            .local_addr()
            .expect("mock llm listener local address should exist");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("mock llm server should run");
        });

        Self {
            base_url: format!("http://{bind_addr}"),
            state,
            handle,
        }
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Queues one completion whose message content is `model_output` serialized as text.
    pub async fn reply_with(&self, model_output: Value) {
        self.state.replies.lock().await.push_back((
            StatusCode::OK,
            json!({
                "id": "mock-completion",
                "model": "integration-test-model",
                "choices": [{ "message": { "content": model_output.to_string() } }]
            }),
        ));
    }

    pub async fn reply_with_text(&self, text: &str) {
        self.state.replies.lock().await.push_back((
            StatusCode::OK,
            json!({
                "id": "mock-completion",
                "choices": [{ "message": { "content": text } }]
            }),
        ));
    }

    pub async fn fail_with(&self, status: StatusCode, message: &str) {
        self.state
            .replies
            .lock()
            .await
            .push_back((status, json!({ "error": { "message": message } })));
    }

    pub async fn payloads(&self) -> Vec<Value> {
        self.state.payloads.lock().await.clone()
    }
}

impl Drop for MockLlmProvider {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn chat_completions(
    State(state): State<MockState>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.payloads.lock().await.push(payload);

    let (status, body) = state.replies.lock().await.pop_front().unwrap_or((
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": { "message": "no scripted completion left" } }),
    ));
    (status, Json(body))
}
