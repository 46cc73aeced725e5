use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::models::{ErrorResponse, TurnRequest, TurnResponse};

pub const ASSISTANT_PATH: &str = "/api/ai-assistant";

pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<TurnResponse, ClientError>> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The request never produced a readable reply.
    #[error("network error: {0}")]
    Network(String),
    /// The server answered with a non-success status and this `error` message.
    #[error("{message}")]
    Server { status: u16, message: String },
}

#[derive(Debug, Error)]
pub enum ClientConfigError {
    #[error("invalid assistant base url: {0}")]
    InvalidBaseUrl(String),
    #[error("failed to build assistant http client: {0}")]
    HttpClient(String),
}

/// Delivers one turn request to the assistant service.
pub trait AssistantTransport: Send + Sync {
    fn send_turn<'a>(&'a self, request: &'a TurnRequest) -> TransportFuture<'a>;
}

#[derive(Clone)]
pub struct HttpAssistantClient {
    client: reqwest::Client,
    endpoint: Url,
    access_token: String,
}

impl HttpAssistantClient {
    pub fn new(
        base_url: &str,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientConfigError> {
        let endpoint = Url::parse(base_url)
            .and_then(|base| base.join(ASSISTANT_PATH))
            .map_err(|err| ClientConfigError::InvalidBaseUrl(err.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ClientConfigError::HttpClient(err.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            access_token: access_token.into(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post_turn(&self, request: &TurnRequest) -> Result<TurnResponse, ClientError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.access_token)
            .json(request)
            .send()
            .await
            .map_err(|err| ClientError::Network(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| ClientError::Network(err.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|payload| payload.error)
                .unwrap_or_default();
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str::<TurnResponse>(&body)
            .map_err(|err| ClientError::Network(format!("unreadable assistant reply: {err}")))
    }
}

impl AssistantTransport for HttpAssistantClient {
    fn send_turn<'a>(&'a self, request: &'a TurnRequest) -> TransportFuture<'a> {
        Box::pin(self.post_turn(request))
    }
}
