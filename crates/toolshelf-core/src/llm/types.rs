//! Common types for chat-completion requests.
//!
//! These types are the wire-independent vocabulary shared by the direct
//! chat backend and the relay service.

use serde::{Deserialize, Serialize};

/// A message sent to the upstream model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role: "system", "user" or "assistant".
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request for a chat completion.
///
/// Sampling parameters left as `None` are omitted from the request body so
/// the upstream applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatRequest {
    /// Upstream model identifier (e.g. "google/gemini-2.0-flash-exp:free").
    pub model: String,
    /// Optional system prompt, sent as the first message.
    pub system: Option<String>,
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// Temperature (0.0–2.0).
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Nucleus-sampling parameter.
    pub top_p: Option<f32>,
}

/// Response from a chat completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    /// Reply text. Empty when the upstream returned no content.
    pub content: String,
    /// Model identifier reported by the upstream, or the requested one.
    pub model: String,
}
