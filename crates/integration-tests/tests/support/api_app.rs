#![allow(dead_code)]

use std::sync::Arc;

use api_server::http::{AppState, build_router};
use shared::assistant::TurnProcessor;
use shared::llm::{ExtractionClient, LlmGatewayConfig, OpenRouterGateway, assistant_system_prompt};
use shared::repos::Store;

use super::llm_mock::MockLlmProvider;

pub fn build_test_router(store: Store, llm: &MockLlmProvider) -> axum::Router {
    let gateway = OpenRouterGateway::new(LlmGatewayConfig {
        chat_completions_url: llm.chat_completions_url(),
        api_key: "integration-test-llm-key".to_string(),
        model: "integration-test-model".to_string(),
        max_tokens: 512,
        timeout_ms: 5_000,
        max_retries: 0,
        retry_base_backoff_ms: 0,
    })
    .expect("llm gateway should build");
    let extraction = ExtractionClient::new(
        Arc::new(gateway),
        assistant_system_prompt("Integration Test Repair"),
    );

    build_router(AppState {
        store,
        assistant: Some(TurnProcessor::new(extraction)),
    })
}

/// Router for a deployment without a language-model credential.
pub fn build_unconfigured_router(store: Store) -> axum::Router {
    build_router(AppState {
        store,
        assistant: None,
    })
}
