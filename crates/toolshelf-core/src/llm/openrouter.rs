//! OpenAI-compatible chat-completion provider.
//!
//! Implements [`LlmProvider`] for OpenRouter's Chat Completions API. The same
//! client also talks to the relay's shared gateway, which speaks the same
//! format but takes no attribution headers.

use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use toolshelf_config::UpstreamConfig;

use crate::BoxFuture;
use crate::secrets::SecretValue;

use super::provider::{LlmProvider, UpstreamError, error_message_from_body, extract_reply};
use super::types::*;

/// OpenAI-compatible provider.
pub struct OpenRouterProvider {
    client: Client,
    name: String,
    api_key: SecretValue,
    endpoint: String,
    referer: Option<String>,
    title: Option<String>,
}

impl OpenRouterProvider {
    /// Create a provider posting to `endpoint` with bearer `api_key`.
    pub fn new(api_key: SecretValue, endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            name: "openrouter".to_string(),
            api_key,
            endpoint: endpoint.into(),
            referer: None,
            title: None,
        }
    }

    /// Provider for the configured upstream, with attribution headers.
    pub fn from_config(api_key: SecretValue, config: &UpstreamConfig) -> Self {
        Self::new(api_key, &config.endpoint).with_attribution(&config.referer, &config.title)
    }

    /// Reuse an existing HTTP client and its connection pool.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Set the display name used in logs.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Send `HTTP-Referer` and `X-Title` with every request.
    pub fn with_attribution(mut self, referer: impl Into<String>, title: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self.title = Some(title.into());
        self
    }

    /// Convert our ChatRequest into the OpenAI wire format.
    fn build_request_body(&self, request: &ChatRequest) -> WireRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(ref system) = request.system {
            messages.push(Message::system(system.clone()));
        }
        messages.extend(request.messages.iter().cloned());

        WireRequest {
            model: request.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
        }
    }
}

impl LlmProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn chat(&self, request: &ChatRequest) -> BoxFuture<'_, Result<ChatResponse, UpstreamError>> {
        let body = self.build_request_body(request);
        Box::pin(async move {
            debug!(provider = %self.name, model = %body.model, "Chat completion request");

            let mut builder = self
                .client
                .post(&self.endpoint)
                .header("authorization", format!("Bearer {}", self.api_key.expose()))
                .header("content-type", "application/json");
            if let Some(ref referer) = self.referer {
                builder = builder.header("HTTP-Referer", referer);
            }
            if let Some(ref title) = self.title {
                builder = builder.header("X-Title", title);
            }

            let resp = builder
                .json(&body)
                .send()
                .await
                .map_err(|e| UpstreamError::Network(e.to_string()))?;

            let status = resp.status();
            let text = resp
                .text()
                .await
                .map_err(|e| UpstreamError::Network(e.to_string()))?;

            if !status.is_success() {
                let message = error_message_from_body(status.as_u16(), &text);
                debug!(provider = %self.name, status = status.as_u16(), %message, "Upstream error");
                return Err(UpstreamError::Status {
                    status: status.as_u16(),
                    message,
                });
            }

            let value: serde_json::Value =
                serde_json::from_str(&text).map_err(|e| UpstreamError::Parse(e.to_string()))?;

            Ok(ChatResponse {
                content: extract_reply(&value),
                model: value["model"]
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or(body.model),
            })
        })
    }
}

// ── Wire types (private) ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}
