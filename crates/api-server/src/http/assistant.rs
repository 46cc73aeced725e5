use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::response::{IntoResponse, Response};
use shared::assistant::{TurnError, TurnInput};
use shared::models::TurnRequest;
use tracing::{info, warn};

use super::errors::{bad_request_response, internal_error_response, store_error_response};
use super::{AppState, AuthUser};

const MISSING_MESSAGE: &str = "No message provided";
const NOT_CONFIGURED: &str = "AI not configured. Set LLM_API_KEY to enable the assistant.";
const NO_WORKSPACE: &str = "No workspace found";

pub(super) async fn handle_turn(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<TurnRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(user_id = %user.user_id, "rejected assistant request body: {rejection}");
            return bad_request_response(&rejection.body_text());
        }
    };

    let Some(utterance) = utterance(&request) else {
        return bad_request_response(MISSING_MESSAGE);
    };

    let Some(processor) = state.assistant.as_ref() else {
        warn!("assistant request received without a configured language model");
        return internal_error_response(NOT_CONFIGURED);
    };

    let workspace_id = match state.store.workspace_for_user(user.user_id).await {
        Ok(Some(workspace_id)) => workspace_id,
        Ok(None) => return bad_request_response(NO_WORKSPACE),
        Err(err) => return store_error_response(err),
    };

    let history = request.conversation_history.as_deref().unwrap_or_default();
    let input = TurnInput {
        utterance,
        history,
        pending_draft: request.pending_ticket_data.as_ref(),
        workspace_id,
        user_id: Some(user.user_id),
    };

    match processor.process_turn(&state.store, input).await {
        Ok(response) => {
            info!(
                user_id = %user.user_id,
                workspace_id = %workspace_id,
                action = response.action_label(),
                "assistant turn completed"
            );
            Json(response).into_response()
        }
        Err(TurnError::Extraction(err)) => {
            warn!(
                user_id = %user.user_id,
                workspace_id = %workspace_id,
                "assistant extraction failed: {err}"
            );
            internal_error_response(&err.to_string())
        }
        Err(TurnError::Store(err)) => store_error_response(err),
    }
}

fn utterance(request: &TurnRequest) -> Option<&str> {
    request
        .message
        .as_deref()
        .map(str::trim)
        .filter(|message| !message.is_empty())
}
