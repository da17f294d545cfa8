//! Chat failure taxonomy and user-facing notices.
//!
//! Backends report raw [`BackendFailure`]s. They are classified into a
//! [`ChatError`] only at the orchestrator boundary, and every error that is
//! not retried is shown as a [`Notice`].

use serde::Serialize;

use crate::secrets::CredentialError;

use super::backend::BackendFailure;

const GENERIC_DESCRIPTION: &str = "Failed to send message. Please try again.";

/// A short title and description shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn key_saved() -> Self {
        Self::new(
            "API Key Saved",
            "Your OpenRouter API key has been saved successfully.",
        )
    }

    pub fn key_cleared() -> Self {
        Self::new("API Key Cleared", "Your API key has been removed.")
    }

    /// Notice for a failed credential save or clear.
    pub fn for_credential_error(err: &CredentialError) -> Self {
        match err {
            CredentialError::Empty => Self::new("Invalid API Key", "Please enter a valid API key."),
            other => Self::new("Error", other.to_string()),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// Classified chat failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("rate limited")]
    RateLimited,

    #[error("invalid credential")]
    InvalidCredential,

    #[error("payment required")]
    PaymentRequired,

    #[error("upstream unavailable")]
    UpstreamUnavailable,

    /// The chosen model failed upstream. The only retryable kind.
    #[error("provider returned error")]
    ProviderError,

    #[error("relay unreachable: {0}")]
    Connection(String),

    #[error("{0}")]
    Generic(String),
}

impl ChatError {
    /// Classify a backend failure.
    ///
    /// Order: the provider-error marker in the message, then the HTTP status,
    /// then message keywords, then generic.
    pub fn classify(failure: &BackendFailure) -> Self {
        match failure {
            BackendFailure::Http { status, message } => Self::classify_http(*status, message),
            BackendFailure::Connection(reason) => ChatError::Connection(reason.clone()),
            BackendFailure::Network(reason) | BackendFailure::Malformed(reason) => {
                ChatError::Generic(reason.clone())
            }
        }
    }

    fn classify_http(status: u16, message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("provider returned error") {
            return ChatError::ProviderError;
        }
        match status {
            429 => return ChatError::RateLimited,
            401 | 403 => return ChatError::InvalidCredential,
            402 => return ChatError::PaymentRequired,
            500..=599 => return ChatError::UpstreamUnavailable,
            _ => {}
        }
        if lower.contains("rate limit") {
            ChatError::RateLimited
        } else if lower.contains("invalid api key") {
            ChatError::InvalidCredential
        } else if lower.contains("payment required") {
            ChatError::PaymentRequired
        } else if ["server error", "bad gateway", "service unavailable"]
            .iter()
            .any(|k| lower.contains(k))
        {
            ChatError::UpstreamUnavailable
        } else {
            ChatError::Generic(message.to_string())
        }
    }

    /// Whether this error may trigger the automatic model retry.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, ChatError::ProviderError)
    }

    /// User-facing title and description.
    pub fn notice(&self) -> Notice {
        match self {
            ChatError::ProviderError => Notice::new(
                "AI Provider Error",
                "The AI model is temporarily unavailable. Try switching to a different model \
                 (like 'Auto' or 'Gemini') or try again later.",
            ),
            ChatError::RateLimited => Notice::new(
                "Rate Limit",
                "Too many requests. Please wait a few minutes before trying again.",
            ),
            ChatError::InvalidCredential => Notice::new(
                "Invalid API Key",
                "Please check your OpenRouter API key in settings.",
            ),
            ChatError::PaymentRequired => Notice::new(
                "Payment Required",
                "Please add credits to your OpenRouter account.",
            ),
            ChatError::UpstreamUnavailable => Notice::new(
                "Service Unavailable",
                "The AI service is temporarily down. Please try again later.",
            ),
            ChatError::Connection(_) => Notice::new(
                "Connection Error",
                "Could not reach the chat relay. Check your connection and try again.",
            ),
            ChatError::Generic(message) if message.trim().is_empty() => {
                Notice::new("Error", GENERIC_DESCRIPTION)
            }
            ChatError::Generic(message) => Notice::new("Error", message.clone()),
        }
    }
}

/// Why a turn did not produce an assistant reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("a message is already being sent")]
    Busy,

    #[error(transparent)]
    Chat(#[from] ChatError),
}

impl TurnError {
    /// Notice for the failure. Rejected sends have none.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            TurnError::Chat(err) => Some(err.notice()),
            TurnError::EmptyMessage | TurnError::Busy => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16, message: &str) -> BackendFailure {
        BackendFailure::Http {
            status,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_provider_marker_wins_over_status() {
        assert_eq!(
            ChatError::classify(&http(429, "Provider returned error")),
            ChatError::ProviderError
        );
        assert_eq!(
            ChatError::classify(&http(400, "provider returned error (upstream 503)")),
            ChatError::ProviderError
        );
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(ChatError::classify(&http(429, "slow down")), ChatError::RateLimited);
        assert_eq!(ChatError::classify(&http(401, "nope")), ChatError::InvalidCredential);
        assert_eq!(ChatError::classify(&http(403, "nope")), ChatError::InvalidCredential);
        assert_eq!(ChatError::classify(&http(402, "credits")), ChatError::PaymentRequired);
        assert_eq!(
            ChatError::classify(&http(500, "Chat provider error: 502")),
            ChatError::UpstreamUnavailable
        );
        assert_eq!(ChatError::classify(&http(503, "")), ChatError::UpstreamUnavailable);
    }

    #[test]
    fn test_message_keywords() {
        assert_eq!(
            ChatError::classify(&http(400, "Rate limit exceeded")),
            ChatError::RateLimited
        );
        assert_eq!(
            ChatError::classify(&http(400, "Invalid API key supplied")),
            ChatError::InvalidCredential
        );
        assert_eq!(
            ChatError::classify(&http(400, "Payment required")),
            ChatError::PaymentRequired
        );
        assert_eq!(
            ChatError::classify(&http(418, "Bad gateway upstream")),
            ChatError::UpstreamUnavailable
        );
        assert_eq!(
            ChatError::classify(&http(400, "model not found")),
            ChatError::Generic("model not found".to_string())
        );
    }

    #[test]
    fn test_transport_failures() {
        assert_eq!(
            ChatError::classify(&BackendFailure::Connection("refused".to_string())),
            ChatError::Connection("refused".to_string())
        );
        assert_eq!(
            ChatError::classify(&BackendFailure::Network("dns".to_string())),
            ChatError::Generic("dns".to_string())
        );
        assert_eq!(
            ChatError::classify(&BackendFailure::Malformed("eof".to_string())),
            ChatError::Generic("eof".to_string())
        );
    }

    #[test]
    fn test_notices() {
        let notice = ChatError::RateLimited.notice();
        assert_eq!(notice.title, "Rate Limit");
        assert_eq!(
            notice.description,
            "Too many requests. Please wait a few minutes before trying again."
        );
        assert_eq!(ChatError::ProviderError.notice().title, "AI Provider Error");
        assert_eq!(
            ChatError::Generic(String::new()).notice().description,
            GENERIC_DESCRIPTION
        );
        assert_eq!(
            ChatError::Generic("boom".to_string()).notice(),
            Notice::new("Error", "boom")
        );
    }

    #[test]
    fn test_turn_error_notice() {
        assert!(TurnError::Busy.notice().is_none());
        assert!(TurnError::EmptyMessage.notice().is_none());
        let err = TurnError::from(ChatError::PaymentRequired);
        assert_eq!(err.notice().unwrap().title, "Payment Required");
    }

    #[test]
    fn test_credential_notice() {
        assert_eq!(
            Notice::for_credential_error(&CredentialError::Empty).title,
            "Invalid API Key"
        );
    }
}
