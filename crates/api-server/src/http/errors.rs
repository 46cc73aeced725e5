use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::models::ErrorResponse;
use shared::repos::StoreError;
use tracing::error;

pub(super) fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

pub(super) fn bad_request_response(message: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, message)
}

pub(super) fn unauthorized_response() -> Response {
    error_response(StatusCode::UNAUTHORIZED, "Not authenticated")
}

pub(super) fn internal_error_response(message: &str) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
}

pub(super) fn store_error_response(err: StoreError) -> Response {
    error!("database operation failed: {err}");
    internal_error_response("Unexpected server error")
}
