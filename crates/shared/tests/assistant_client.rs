use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use shared::conversation::{
    AssistantTransport, ClientError, ConversationSession, HttpAssistantClient,
    NETWORK_ERROR_MESSAGE,
};
use shared::models::{TurnRequest, TurnResponse};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};

#[derive(Debug, Clone)]
struct TestServerState {
    replies: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
    seen_bodies: Arc<Mutex<Vec<Value>>>,
    seen_auth_headers: Arc<Mutex<Vec<String>>>,
}

impl TestServerState {
    fn with_replies(replies: Vec<(StatusCode, String)>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            seen_bodies: Arc::new(Mutex::new(Vec::new())),
            seen_auth_headers: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[tokio::test]
async fn posts_turn_with_bearer_token_and_reads_reply() {
    let state = TestServerState::with_replies(vec![(
        StatusCode::OK,
        json!({
            "action": "confirm_ticket",
            "data": { "customer_name": "Jane Doe", "equipment_type": "mower" },
            "message": "I'll create a ticket for Jane Doe with a mower. Sound good?"
        })
        .to_string(),
    )]);
    let (base_url, shutdown_tx, server_task) = spawn_test_server(state.clone()).await;

    let client = HttpAssistantClient::new(&base_url, "session-token", Duration::from_secs(5))
        .expect("client should build");
    let mut session = ConversationSession::new();
    let entry = session
        .submit(&client, "ticket for Jane Doe, mower")
        .await
        .expect("submit should be accepted")
        .clone();

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert!(matches!(entry.reply, Some(TurnResponse::ConfirmTicket { .. })));
    assert!(session.pending_draft().is_some());
    assert_eq!(client.endpoint().path(), "/api/ai-assistant");

    let bodies = state.seen_bodies.lock().await.clone();
    assert_eq!(bodies[0]["message"], "ticket for Jane Doe, mower");
    assert_eq!(bodies[0]["conversationHistory"][0]["role"], "assistant");
    assert_eq!(
        state.seen_auth_headers.lock().await.clone(),
        vec!["Bearer session-token".to_string()]
    );
}

#[tokio::test]
async fn error_bodies_become_server_errors() {
    let state = TestServerState::with_replies(vec![
        (
            StatusCode::UNAUTHORIZED,
            json!({ "error": "Not authenticated" }).to_string(),
        ),
        (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>".to_string()),
    ]);
    let (base_url, shutdown_tx, server_task) = spawn_test_server(state).await;

    let client = HttpAssistantClient::new(&base_url, "expired", Duration::from_secs(5))
        .expect("client should build");
    let request = TurnRequest {
        message: Some("hi".to_string()),
        ..TurnRequest::default()
    };
    let unauthorized = client.send_turn(&request).await;
    let unstructured = client.send_turn(&request).await;

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert_eq!(
        unauthorized,
        Err(ClientError::Server {
            status: 401,
            message: "Not authenticated".to_string()
        })
    );
    assert_eq!(
        unstructured,
        Err(ClientError::Server {
            status: 502,
            message: String::new()
        })
    );
}

#[tokio::test]
async fn unreachable_server_renders_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let local_addr = listener.local_addr().expect("listener address");
    drop(listener);

    let client = HttpAssistantClient::new(
        &format!("http://{local_addr}"),
        "token",
        Duration::from_secs(2),
    )
    .expect("client should build");
    let mut session = ConversationSession::new();
    let entry = session
        .submit(&client, "hello")
        .await
        .expect("submit should be accepted")
        .clone();

    assert_eq!(entry.content(), NETWORK_ERROR_MESSAGE);
    assert!(!session.is_in_flight());
}

#[test]
fn rejects_invalid_base_url() {
    assert!(HttpAssistantClient::new("not a url", "token", Duration::from_secs(1)).is_err());
}

async fn spawn_test_server(
    state: TestServerState,
) -> (String, oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/api/ai-assistant", post(test_assistant_handler))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let local_addr = listener
        .local_addr()
        .expect("listener address should resolve");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let server_task = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });

        server.await.expect("test server should run");
    });

    (format!("http://{local_addr}"), shutdown_tx, server_task)
}

async fn test_assistant_handler(
    State(state): State<TestServerState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> (StatusCode, String) {
    state.seen_bodies.lock().await.push(payload);

    if let Some(value) = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
    {
        state.seen_auth_headers.lock().await.push(value.to_string());
    }

    state.replies.lock().await.pop_front().unwrap_or((
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": "exhausted test replies" }).to_string(),
    ))
}
