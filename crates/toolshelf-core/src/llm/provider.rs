//! LLM provider trait: the abstraction over chat-completion endpoints.
//!
//! The direct chat backend and both relay providers dispatch through this
//! interface, which keeps them testable against scripted implementations.

use crate::BoxFuture;

use super::types::{ChatRequest, ChatResponse};

/// Errors from upstream chat-completion calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status. `message` is the extracted error text.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The success body was not valid JSON.
    #[error("response parse error: {0}")]
    Parse(String),
}

impl UpstreamError {
    /// HTTP status, if the upstream answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Core trait for chat-completion providers.
///
/// Implementations must be `Send + Sync` for use behind `Arc<dyn LlmProvider>`
/// in the relay's shared state.
pub trait LlmProvider: Send + Sync {
    /// Provider display name (e.g. "openrouter", "gateway").
    fn name(&self) -> &str;

    /// Perform a chat completion.
    fn chat(&self, request: &ChatRequest) -> BoxFuture<'_, Result<ChatResponse, UpstreamError>>;
}

/// Human-readable error text for a failed upstream response.
///
/// Prefers `{"error": {"message": ...}}`, then `{"error": "..."}`. When the
/// body cannot be parsed, falls back to a fixed message per status.
pub fn error_message_from_body(status: u16, body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => {
            let error = &value["error"];
            if let Some(message) = error["message"].as_str() {
                message.to_string()
            } else if let Some(message) = error.as_str() {
                message.to_string()
            } else {
                format!("HTTP {status}")
            }
        }
        Err(_) => status_message(status),
    }
}

fn status_message(status: u16) -> String {
    match status {
        429 => "Rate limit exceeded. Please try again in a few minutes.".to_string(),
        401 => "Invalid API key. Please check your OpenRouter API key.".to_string(),
        402 => "Payment required. Please add credits to your OpenRouter account.".to_string(),
        403 => "Access forbidden. Please check your API key permissions.".to_string(),
        500 => "Server error. The AI provider is temporarily unavailable. Please try again later."
            .to_string(),
        502 => "Bad gateway. The AI provider is experiencing issues. Please try again later."
            .to_string(),
        503 => "Service unavailable. The AI provider is temporarily down. Please try again later."
            .to_string(),
        other => format!("HTTP {other}"),
    }
}

/// Reply text from a chat-completion body.
///
/// Reads `choices[0].message.content`, then a top-level `reply`, then a
/// top-level `message`. Missing or empty everywhere yields `""`.
pub fn extract_reply(body: &serde_json::Value) -> String {
    let candidates = [
        &body["choices"][0]["message"]["content"],
        &body["reply"],
        &body["message"],
    ];
    candidates
        .into_iter()
        .filter_map(|v| v.as_str())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_nested() {
        let body = r#"{"error":{"message":"Provider returned error","code":502}}"#;
        assert_eq!(error_message_from_body(502, body), "Provider returned error");
    }

    #[test]
    fn test_error_message_flat() {
        let body = r#"{"error":"Trial limit reached"}"#;
        assert_eq!(error_message_from_body(429, body), "Trial limit reached");
    }

    #[test]
    fn test_error_message_json_without_error_field() {
        assert_eq!(error_message_from_body(418, r#"{"detail":"teapot"}"#), "HTTP 418");
    }

    #[test]
    fn test_error_message_unparseable_uses_status() {
        assert_eq!(
            error_message_from_body(429, "<html>too many</html>"),
            "Rate limit exceeded. Please try again in a few minutes."
        );
        assert_eq!(
            error_message_from_body(401, ""),
            "Invalid API key. Please check your OpenRouter API key."
        );
        assert!(error_message_from_body(503, "oops").starts_with("Service unavailable."));
        assert_eq!(error_message_from_body(504, "oops"), "HTTP 504");
    }

    #[test]
    fn test_extract_reply_order() {
        let body = json!({"choices":[{"message":{"content":"from choices"}}],"reply":"r"});
        assert_eq!(extract_reply(&body), "from choices");

        let body = json!({"choices":[{"message":{"content":""}}],"reply":"from reply"});
        assert_eq!(extract_reply(&body), "from reply");

        let body = json!({"message":"from message"});
        assert_eq!(extract_reply(&body), "from message");

        assert_eq!(extract_reply(&json!({})), "");
    }

    #[test]
    fn test_status_accessor() {
        let err = UpstreamError::Status {
            status: 402,
            message: "pay".to_string(),
        };
        assert_eq!(err.status(), Some(402));
        assert_eq!(err.to_string(), "pay");
        assert_eq!(UpstreamError::Network("down".to_string()).status(), None);
    }
}
