//! Chat backends: the two ways a turn reaches a model.
//!
//! - [`DirectBackend`] calls the upstream API with the user's own key.
//! - [`RelayBackend`] posts to the relay service, which holds shared keys.
//!
//! Backends report raw [`BackendFailure`]s and never classify them.

use std::sync::Arc;

use reqwest::Client;
use tracing::debug;

use toolshelf_config::UpstreamConfig;

use crate::BoxFuture;
use crate::llm::{
    ChatRequest, LlmProvider, Message, OpenRouterProvider, UpstreamError, error_message_from_body,
    extract_reply,
};
use crate::relay::RelayRequest;
use crate::secrets::SecretValue;

use super::models::ModelKey;

/// One outgoing chat call.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub message: String,
    pub system_prompt: String,
    pub tools_context: String,
    pub model: ModelKey,
    /// Key for the direct backend. The relay ignores it.
    pub credential: Option<SecretValue>,
}

/// Reply text from a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    pub content: String,
}

/// Unclassified backend failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendFailure {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The relay could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The upstream could not be reached in direct mode.
    #[error("network error: {0}")]
    Network(String),

    /// A response whose body could not be read or decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// A way to send one chat turn.
pub trait ChatBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    fn send(&self, request: &BackendRequest) -> BoxFuture<'_, Result<BackendReply, BackendFailure>>;
}

/// Builds the upstream provider for a given key.
pub type ProviderFactory = dyn Fn(SecretValue) -> Arc<dyn LlmProvider> + Send + Sync;

/// Calls the upstream chat-completion API directly.
pub struct DirectBackend {
    config: UpstreamConfig,
    factory: Box<ProviderFactory>,
}

impl DirectBackend {
    /// Backend posting to the configured upstream endpoint.
    pub fn new(config: UpstreamConfig) -> Self {
        let client = Client::new();
        let upstream = config.clone();
        Self::with_factory(
            config,
            Box::new(move |key: SecretValue| -> Arc<dyn LlmProvider> {
                Arc::new(OpenRouterProvider::from_config(key, &upstream).with_client(client.clone()))
            }),
        )
    }

    /// Backend using `factory` to build a provider per request.
    pub fn with_factory(config: UpstreamConfig, factory: Box<ProviderFactory>) -> Self {
        Self { config, factory }
    }

    fn build_request(&self, request: &BackendRequest) -> ChatRequest {
        ChatRequest {
            model: request.model.upstream_id().to_string(),
            system: Some(request.system_prompt.clone()),
            messages: vec![Message::user(request.message.clone())],
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
            top_p: Some(self.config.top_p),
        }
    }
}

impl ChatBackend for DirectBackend {
    fn name(&self) -> &str {
        "direct"
    }

    fn send(&self, request: &BackendRequest) -> BoxFuture<'_, Result<BackendReply, BackendFailure>> {
        let chat_request = self.build_request(request);
        let credential = request.credential.clone();
        Box::pin(async move {
            let key = credential.ok_or_else(|| BackendFailure::Http {
                status: 401,
                message: "Invalid API key. Please check your OpenRouter API key.".to_string(),
            })?;
            let provider = (self.factory)(key);
            let response = provider.chat(&chat_request).await.map_err(|e| match e {
                UpstreamError::Status { status, message } => BackendFailure::Http { status, message },
                UpstreamError::Network(reason) => BackendFailure::Network(reason),
                UpstreamError::Parse(reason) => BackendFailure::Malformed(reason),
            })?;
            Ok(BackendReply {
                content: response.content,
            })
        })
    }
}

/// Posts turns to the relay service.
pub struct RelayBackend {
    client: Client,
    url: String,
    provider: String,
}

impl RelayBackend {
    /// `provider` selects the relay's upstream: "gateway" or "openrouter".
    pub fn new(url: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            provider: provider.into(),
        }
    }

    fn build_body(&self, request: &BackendRequest) -> RelayRequest {
        RelayRequest {
            message: request.message.clone(),
            tools_context: request.tools_context.clone(),
            model_preference: Some(request.model.key().to_string()),
            provider: Some(self.provider.clone()),
            system_prompt: Some(request.system_prompt.clone()),
        }
    }
}

impl ChatBackend for RelayBackend {
    fn name(&self) -> &str {
        "relay"
    }

    fn send(&self, request: &BackendRequest) -> BoxFuture<'_, Result<BackendReply, BackendFailure>> {
        let body = self.build_body(request);
        Box::pin(async move {
            debug!(url = %self.url, provider = %self.provider, "Relay chat request");

            let resp = self
                .client
                .post(&self.url)
                .json(&body)
                .send()
                .await
                .map_err(|e| BackendFailure::Connection(e.to_string()))?;

            let status = resp.status();
            // The relay answered, so a broken body must not trigger the direct fallback.
            let text = resp
                .text()
                .await
                .map_err(|e| BackendFailure::Malformed(e.to_string()))?;

            if !status.is_success() {
                return Err(BackendFailure::Http {
                    status: status.as_u16(),
                    message: error_message_from_body(status.as_u16(), &text),
                });
            }

            let value: serde_json::Value =
                serde_json::from_str(&text).map_err(|e| BackendFailure::Malformed(e.to_string()))?;
            Ok(BackendReply {
                content: extract_reply(&value),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;
    use serde_json::Value;

    use crate::llm::ChatResponse;

    fn request(credential: Option<&str>) -> BackendRequest {
        BackendRequest {
            message: "which database?".to_string(),
            system_prompt: "be brief".to_string(),
            tools_context: "Supabase (Backend): db. Status: free. Link: x".to_string(),
            model: ModelKey::DeepSeek,
            credential: credential.map(SecretValue::new),
        }
    }

    /// Provider that records requests and replays one canned result.
    struct CannedProvider {
        result: Result<ChatResponse, UpstreamError>,
        seen: Arc<Mutex<Vec<(String, ChatRequest)>>>,
        key: String,
    }

    impl LlmProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        fn chat(&self, request: &ChatRequest) -> BoxFuture<'_, Result<ChatResponse, UpstreamError>> {
            self.seen
                .lock()
                .unwrap()
                .push((self.key.clone(), request.clone()));
            let result = self.result.clone();
            Box::pin(async move { result })
        }
    }

    fn direct_with(
        result: Result<ChatResponse, UpstreamError>,
    ) -> (DirectBackend, Arc<Mutex<Vec<(String, ChatRequest)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_factory = seen.clone();
        let backend = DirectBackend::with_factory(
            UpstreamConfig::default(),
            Box::new(move |key: SecretValue| {
                Arc::new(CannedProvider {
                    result: result.clone(),
                    seen: seen_by_factory.clone(),
                    key: key.expose().to_string(),
                }) as Arc<dyn LlmProvider>
            }),
        );
        (backend, seen)
    }

    #[tokio::test]
    async fn test_direct_sends_sampling_params_and_key() {
        let (backend, seen) = direct_with(Ok(ChatResponse {
            content: "Use Supabase".to_string(),
            model: "deepseek/deepseek-r1:free".to_string(),
        }));

        let reply = backend.send(&request(Some("sk-user"))).await.unwrap();
        assert_eq!(reply.content, "Use Supabase");

        let seen = seen.lock().unwrap();
        let (key, req) = &seen[0];
        assert_eq!(key, "sk-user");
        assert_eq!(req.model, "deepseek/deepseek-r1:free");
        assert_eq!(req.system.as_deref(), Some("be brief"));
        assert_eq!(req.messages, vec![Message::user("which database?")]);
        assert_eq!(req.temperature, Some(0.6));
        assert_eq!(req.max_tokens, Some(800));
        assert_eq!(req.top_p, Some(0.9));
    }

    #[tokio::test]
    async fn test_direct_maps_upstream_errors() {
        let (backend, _) = direct_with(Err(UpstreamError::Network("dns".to_string())));
        assert_eq!(
            backend.send(&request(Some("k"))).await.unwrap_err(),
            BackendFailure::Network("dns".to_string())
        );

        let (backend, _) = direct_with(Err(UpstreamError::Status {
            status: 429,
            message: "Rate limit exceeded".to_string(),
        }));
        assert_eq!(
            backend.send(&request(Some("k"))).await.unwrap_err(),
            BackendFailure::Http {
                status: 429,
                message: "Rate limit exceeded".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_direct_without_key_is_rejected() {
        let (backend, seen) = direct_with(Err(UpstreamError::Parse("unused".to_string())));
        let err = backend.send(&request(None)).await.unwrap_err();
        assert!(matches!(err, BackendFailure::Http { status: 401, .. }));
        assert!(seen.lock().unwrap().is_empty());
    }

    async fn spawn_relay(status: StatusCode, body: &'static str) -> (String, Arc<Mutex<Option<Value>>>) {
        let captured = Arc::new(Mutex::new(None));
        let app = Router::new().route(
            "/chat-with-tool",
            post({
                let captured = captured.clone();
                move |axum::Json(json): axum::Json<Value>| {
                    let captured = captured.clone();
                    async move {
                        *captured.lock().unwrap() = Some(json);
                        (status, body)
                    }
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/chat-with-tool"), captured)
    }

    #[tokio::test]
    async fn test_relay_posts_expected_body() {
        let (url, captured) = spawn_relay(
            StatusCode::OK,
            r#"{"reply":"Try Supabase","model":"gateway","availableModels":[]}"#,
        )
        .await;
        let backend = RelayBackend::new(url, "gateway");

        let reply = backend.send(&request(Some("ignored"))).await.unwrap();
        assert_eq!(reply.content, "Try Supabase");

        let body = captured.lock().unwrap().take().unwrap();
        assert_eq!(body["message"], "which database?");
        assert_eq!(body["modelPreference"], "deepseek");
        assert_eq!(body["provider"], "gateway");
        assert_eq!(body["systemPrompt"], "be brief");
        assert!(body["toolsContext"].as_str().unwrap().starts_with("Supabase"));
    }

    #[tokio::test]
    async fn test_relay_error_body_is_extracted() {
        let (url, _) = spawn_relay(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":"Rate limit exceeded. Please try again later."}"#,
        )
        .await;
        let backend = RelayBackend::new(url, "gateway");
        assert_eq!(
            backend.send(&request(None)).await.unwrap_err(),
            BackendFailure::Http {
                status: 429,
                message: "Rate limit exceeded. Please try again later.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_relay_unreachable_is_connection_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend = RelayBackend::new(format!("http://{addr}/chat-with-tool"), "gateway");
        let err = backend.send(&request(None)).await.unwrap_err();
        assert!(matches!(err, BackendFailure::Connection(_)));
    }

    #[tokio::test]
    async fn test_relay_malformed_success_body() {
        let (url, _) = spawn_relay(StatusCode::OK, "<html>").await;
        let backend = RelayBackend::new(url, "gateway");
        let err = backend.send(&request(None)).await.unwrap_err();
        assert!(matches!(err, BackendFailure::Malformed(_)));
    }

    #[tokio::test]
    async fn test_relay_truncated_body_is_malformed() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 64\r\n\r\n{\"resp")
                .await
                .unwrap();
        });

        let backend = RelayBackend::new(format!("http://{addr}/chat-with-tool"), "gateway");
        let err = backend.send(&request(None)).await.unwrap_err();
        assert!(matches!(err, BackendFailure::Malformed(_)), "{err:?}");
    }
}
