//! Chat-completion client used by the scheduler and the report aggregator.
//!
//! Talks to any OpenAI-compatible `POST /v1/chat/completions` endpoint.
//! Callers depend on [`CompletionClient`] so tests can swap in a stub.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::AiConfig;

#[derive(Debug, Error)]
pub enum AiError {
    /// No API key was configured.
    #[error("AI endpoint is not configured (set PLANWISE_AI_API_KEY)")]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Authentication failed ({0})")]
    Authentication(u16),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Body or content did not match what the caller expected.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// One completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

pub trait CompletionClient {
    /// Returns the assistant message text.
    fn complete(&self, request: &CompletionRequest) -> Result<String, AiError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Blocking HTTP client for an OpenAI-compatible endpoint.
pub struct ChatClient {
    http: reqwest::blocking::Client,
    api_key: String,
    model: String,
    temperature: f32,
    endpoint: String,
}

impl ChatClient {
    pub fn new(config: &AiConfig) -> Result<Self, AiError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AiError::NotConfigured)?;
        let http = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| AiError::Network(e.to_string()))?;
        Ok(Self {
            http,
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            endpoint: format!("{}/v1/chat/completions", config.base_url.trim_end_matches('/')),
        })
    }

    fn map_send_error(err: reqwest::Error, timeout: Duration) -> AiError {
        if err.is_timeout() {
            AiError::Timeout(timeout)
        } else {
            AiError::Network(err.to_string())
        }
    }
}

impl CompletionClient for ChatClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, AiError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.prompt },
            ],
            max_tokens: request.max_tokens,
            temperature: self.temperature,
        };

        info!(model = %self.model, max_tokens = request.max_tokens, "Calling completion endpoint");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(request.timeout)
            .json(&body)
            .send()
            .map_err(|e| Self::map_send_error(e, request.timeout))?;

        let status = response.status().as_u16();
        debug!(status, "Received completion response");

        match status {
            200..=299 => {}
            401 | 403 => return Err(AiError::Authentication(status)),
            429 => return Err(AiError::RateLimit),
            _ => {
                let message = response.text().unwrap_or_else(|_| "Unknown error".to_string());
                return Err(AiError::Api { status, message });
            }
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| AiError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AiError::InvalidResponse("Response contained no content".to_string()))
    }
}
