use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::gateway::{
    LlmCompletion, LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmGatewayRequest,
    LlmTokenUsage,
};
use crate::config_env::optional_trimmed_env;

const DEFAULT_CHAT_COMPLETIONS_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_MODEL: &str = "anthropic/claude-haiku-4.5";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const DEFAULT_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_MAX_RETRIES: u32 = 0;
const DEFAULT_RETRY_BASE_BACKOFF_MS: u64 = 250;

#[derive(Debug, Clone)]
pub struct LlmGatewayConfig {
    pub chat_completions_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_base_backoff_ms: u64,
}

impl LlmGatewayConfig {
    /// Reads provider settings. Returns `Ok(None)` when no credential is configured so the
    /// server can still start and report the missing key per request.
    pub fn from_env() -> Result<Option<Self>, LlmGatewayConfigError> {
        let Some(api_key) = optional_trimmed_env("LLM_API_KEY") else {
            return Ok(None);
        };

        let chat_completions_url = optional_trimmed_env("LLM_CHAT_COMPLETIONS_URL")
            .unwrap_or_else(|| DEFAULT_CHAT_COMPLETIONS_URL.to_string());
        if !chat_completions_url.starts_with("http://")
            && !chat_completions_url.starts_with("https://")
        {
            return Err(LlmGatewayConfigError::InvalidConfiguration(
                "LLM_CHAT_COMPLETIONS_URL must start with http:// or https://".to_string(),
            ));
        }

        Ok(Some(Self {
            chat_completions_url,
            api_key,
            model: optional_trimmed_env("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: parse_u32_env("LLM_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            timeout_ms: parse_u64_env("LLM_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?,
            max_retries: parse_u32_env("LLM_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            retry_base_backoff_ms: parse_u64_env(
                "LLM_RETRY_BASE_BACKOFF_MS",
                DEFAULT_RETRY_BASE_BACKOFF_MS,
            )?,
        }))
    }
}

#[derive(Debug, Error)]
pub enum LlmGatewayConfigError {
    #[error("invalid integer in env var {key}: {value}")]
    ParseInt { key: String, value: String },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("failed to build llm http client: {0}")]
    HttpClient(String),
}

/// Chat-completions client for OpenRouter and other OpenAI-compatible providers.
#[derive(Clone)]
pub struct OpenRouterGateway {
    client: reqwest::Client,
    config: LlmGatewayConfig,
}

impl OpenRouterGateway {
    pub fn new(config: LlmGatewayConfig) -> Result<Self, LlmGatewayConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| LlmGatewayConfigError::HttpClient(err.to_string()))?;

        Ok(Self { client, config })
    }

    async fn send_with_retries(
        &self,
        request: &LlmGatewayRequest,
    ) -> Result<LlmCompletion, LlmGatewayError> {
        let mut attempt = 0_u32;

        loop {
            match self.send_once(request).await {
                Ok(completion) => return Ok(completion),
                Err(err) if err.retryable && attempt < self.config.max_retries => {
                    let backoff_multiplier = 2_u64.saturating_pow(attempt);
                    let backoff_ms = self
                        .config
                        .retry_base_backoff_ms
                        .saturating_mul(backoff_multiplier);
                    warn!(
                        attempt,
                        backoff_ms, "llm provider attempt failed, retrying: {}", err.error
                    );
                    sleep(Duration::from_millis(backoff_ms)).await;
                    attempt = attempt.saturating_add(1);
                }
                Err(err) => return Err(err.error),
            }
        }
    }

    async fn send_once(
        &self,
        request: &LlmGatewayRequest,
    ) -> Result<LlmCompletion, SendAttemptError> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(json!({ "role": "system", "content": request.system_prompt }));
        messages.extend(
            request
                .messages
                .iter()
                .map(|turn| json!({ "role": turn.role, "content": turn.content })),
        );

        let request_body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": messages,
            "response_format": {
                "type": "json_object"
            },
            "temperature": 0
        });

        let response = self
            .client
            .post(&self.config.chat_completions_url)
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    SendAttemptError::retryable(LlmGatewayError::Timeout)
                } else {
                    SendAttemptError::retryable(LlmGatewayError::ProviderFailure(
                        "llm provider is unreachable".to_string(),
                    ))
                }
            })?;

        let status = response.status();
        let header_request_id = header_request_id(response.headers());
        let body = response.text().await.map_err(|_| {
            SendAttemptError::non_retryable(LlmGatewayError::InvalidProviderPayload(
                "response_body_read_failed".to_string(),
            ))
        })?;

        if !status.is_success() {
            let message = provider_error_message(&body)
                .unwrap_or_else(|| format!("llm provider returned status {}", status.as_u16()));
            return Err(SendAttemptError {
                error: LlmGatewayError::ProviderFailure(message),
                retryable: is_retryable_status(status),
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|_| {
            SendAttemptError::non_retryable(LlmGatewayError::InvalidProviderPayload(
                "response_json_parse_failed".to_string(),
            ))
        })?;

        let text = match parsed.choices.first().map(|choice| &choice.message.content) {
            Some(Value::String(text)) => text.clone(),
            Some(value @ Value::Object(_)) => value.to_string(),
            Some(_) => {
                return Err(SendAttemptError::non_retryable(
                    LlmGatewayError::InvalidProviderPayload(
                        "unsupported_content_shape".to_string(),
                    ),
                ));
            }
            None => {
                return Err(SendAttemptError::non_retryable(
                    LlmGatewayError::InvalidProviderPayload("missing_choice".to_string()),
                ));
            }
        };

        let completion = LlmCompletion {
            model: parsed.model.unwrap_or_else(|| self.config.model.clone()),
            provider_request_id: header_request_id.or(parsed.id),
            text,
            usage: parsed.usage.map(|usage| LlmTokenUsage {
                prompt_tokens: clamp_u64_to_u32(usage.prompt_tokens.unwrap_or(0)),
                completion_tokens: clamp_u64_to_u32(usage.completion_tokens.unwrap_or(0)),
                total_tokens: clamp_u64_to_u32(usage.total_tokens.unwrap_or(0)),
            }),
        };
        debug!(
            model = %completion.model,
            provider_request_id = completion.provider_request_id.as_deref().unwrap_or("none"),
            total_tokens = completion.usage.as_ref().map(|usage| usage.total_tokens).unwrap_or(0),
            "llm completion received"
        );

        Ok(completion)
    }
}

impl LlmGateway for OpenRouterGateway {
    fn generate<'a>(&'a self, request: LlmGatewayRequest) -> LlmGatewayFuture<'a> {
        Box::pin(async move { self.send_with_retries(&request).await })
    }
}

#[derive(Debug)]
struct SendAttemptError {
    error: LlmGatewayError,
    retryable: bool,
}

impl SendAttemptError {
    fn retryable(error: LlmGatewayError) -> Self {
        Self {
            error,
            retryable: true,
        }
    }

    fn non_retryable(error: LlmGatewayError) -> Self {
        Self {
            error,
            retryable: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    id: Option<String>,
    model: Option<String>,
    choices: Vec<ChatCompletionChoice>,
    usage: Option<ChatCompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Value,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionUsage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
    total_tokens: Option<u64>,
}

fn parse_u64_env(key: &str, default: u64) -> Result<u64, LlmGatewayConfigError> {
    match optional_trimmed_env(key) {
        Some(value) => value
            .parse::<u64>()
            .map_err(|_| LlmGatewayConfigError::ParseInt {
                key: key.to_string(),
                value,
            }),
        None => Ok(default),
    }
}

fn parse_u32_env(key: &str, default: u32) -> Result<u32, LlmGatewayConfigError> {
    match optional_trimmed_env(key) {
        Some(value) => value
            .parse::<u32>()
            .map_err(|_| LlmGatewayConfigError::ParseInt {
                key: key.to_string(),
                value,
            }),
        None => Ok(default),
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn header_request_id(headers: &reqwest::header::HeaderMap) -> Option<String> {
    headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
}

fn provider_error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ProviderErrorEnvelope {
        error: Option<ProviderErrorDetails>,
    }

    #[derive(Deserialize)]
    struct ProviderErrorDetails {
        message: Option<String>,
    }

    serde_json::from_str::<ProviderErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|details| details.message)
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
}

fn clamp_u64_to_u32(value: u64) -> u32 {
    value.min(u32::MAX as u64) as u32
}
