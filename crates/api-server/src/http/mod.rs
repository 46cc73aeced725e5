use axum::routing::{get, post};
use axum::{Router, middleware};
use shared::assistant::TurnProcessor;
use shared::repos::Store;
use uuid::Uuid;

mod assistant;
mod authn;
mod errors;
mod health;
mod observability;
mod tokens;

pub use tokens::hash_token;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    /// `None` when no language-model credential is configured.
    pub assistant: Option<TurnProcessor>,
}

#[derive(Clone, Copy)]
pub(super) struct AuthUser {
    pub(super) user_id: Uuid,
}

pub fn build_router(app_state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .with_state(app_state.clone());

    let auth_layer_state = app_state.clone();

    let protected_routes = Router::new()
        .route("/api/ai-assistant", post(assistant::handle_turn))
        .layer(middleware::from_fn_with_state(
            auth_layer_state,
            authn::auth_middleware,
        ))
        .with_state(app_state);

    public_routes
        .merge(protected_routes)
        .layer(middleware::from_fn(
            observability::request_observability_middleware,
        ))
}
