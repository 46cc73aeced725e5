use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use super::gateway::{LlmGateway, LlmGatewayError, LlmGatewayRequest};
use crate::models::ChatTurn;

/// Number of prior turns sent to the model alongside a new utterance.
pub const HISTORY_WINDOW: usize = 10;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{0}")]
    UpstreamUnavailable(String),
    #[error("assistant returned an unreadable response: {0}")]
    MalformedResponse(String),
}

impl From<LlmGatewayError> for ExtractionError {
    fn from(err: LlmGatewayError) -> Self {
        match err {
            LlmGatewayError::Timeout | LlmGatewayError::ProviderFailure(_) => {
                Self::UpstreamUnavailable(err.to_string())
            }
            LlmGatewayError::InvalidProviderPayload(detail) => Self::MalformedResponse(detail),
        }
    }
}

/// Discriminator the model emits to pick a branch of the turn processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionTag {
    CreateTicket,
    ConfirmCreate,
    SearchTickets,
    GetStats,
    Chat,
    Error,
    Unknown(String),
}

impl ActionTag {
    pub fn from_wire(value: &str) -> Self {
        match value.trim() {
            "create_ticket" => Self::CreateTicket,
            "confirm_create" => Self::ConfirmCreate,
            "search_tickets" => Self::SearchTickets,
            "get_stats" => Self::GetStats,
            "chat" => Self::Chat,
            "error" => Self::Error,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::CreateTicket => "create_ticket",
            Self::ConfirmCreate => "confirm_create",
            Self::SearchTickets => "search_tickets",
            Self::GetStats => "get_stats",
            Self::Chat => "chat",
            Self::Error => "error",
            Self::Unknown(raw) => raw,
        }
    }
}

/// Shape-checked view of one model reply. Every field other than `action` is optional and
/// blank strings read as absent. `message` keeps the model's text as written; `query` is
/// trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEnvelope {
    pub action: ActionTag,
    pub message: Option<String>,
    pub data: Option<Map<String, Value>>,
    pub query: Option<String>,
}

impl ActionEnvelope {
    pub fn from_value(value: Value) -> Result<Self, ExtractionError> {
        let Value::Object(mut fields) = value else {
            return Err(ExtractionError::MalformedResponse(
                "expected a json object".to_string(),
            ));
        };

        let action = match fields.get("action") {
            Some(Value::String(raw)) => ActionTag::from_wire(raw),
            _ => ActionTag::Unknown(String::new()),
        };
        let data = match fields.remove("data") {
            Some(Value::Object(data)) => Some(data),
            _ => None,
        };

        Ok(Self {
            action,
            message: non_blank_string(fields.get("message")),
            data,
            query: non_blank_string(fields.get("query")).map(|query| query.trim().to_string()),
        })
    }
}

/// Removes markdown code fences (with or without a `json` tag) wherever they appear.
pub fn strip_code_fences(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(index) = rest.find("```") {
        cleaned.push_str(&rest[..index]);
        let after_fence = &rest[index + 3..];
        rest = after_fence
            .strip_prefix("json")
            .unwrap_or(after_fence)
            .trim_start();
    }
    cleaned.push_str(rest);

    cleaned.trim().to_string()
}

pub fn parse_action_envelope(raw: &str) -> Result<ActionEnvelope, ExtractionError> {
    let cleaned = strip_code_fences(raw);
    let value = serde_json::from_str::<Value>(&cleaned)
        .map_err(|err| ExtractionError::MalformedResponse(err.to_string()))?;
    ActionEnvelope::from_value(value)
}

/// The most recent [`HISTORY_WINDOW`] turns of `history`.
pub fn recent_turns(history: &[ChatTurn]) -> &[ChatTurn] {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    &history[start..]
}

#[derive(Clone)]
pub struct ExtractionClient {
    gateway: Arc<dyn LlmGateway>,
    system_prompt: String,
}

impl ExtractionClient {
    pub fn new(gateway: Arc<dyn LlmGateway>, system_prompt: impl Into<String>) -> Self {
        Self {
            gateway,
            system_prompt: system_prompt.into(),
        }
    }

    /// Sends `prior_turns` followed by `utterance` and interprets the reply as an action.
    /// Callers bound `prior_turns`; no retry happens on unreadable output.
    pub async fn extract(
        &self,
        prior_turns: &[ChatTurn],
        utterance: &str,
    ) -> Result<ActionEnvelope, ExtractionError> {
        let mut messages = Vec::with_capacity(prior_turns.len() + 1);
        messages.extend_from_slice(prior_turns);
        messages.push(ChatTurn::user(utterance));

        let completion = self
            .gateway
            .generate(LlmGatewayRequest {
                system_prompt: self.system_prompt.clone(),
                messages,
            })
            .await?;

        parse_action_envelope(&completion.text).inspect_err(|err| {
            warn!(model = %completion.model, "assistant output rejected: {err}");
        })
    }
}

fn non_blank_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(raw) if !raw.trim().is_empty() => Some(raw.clone()),
        _ => None,
    }
}
