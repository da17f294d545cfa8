//! The relay's model table and its selection heuristic.
//!
//! The relay knows more models than the chat client exposes. A mapped
//! preference wins; otherwise the message text picks the model.

/// A model reachable through the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayModel {
    Qwen,
    Gemini,
    DeepSeek,
    Gemma,
    DeepSeekChat,
    GptOss,
}

const CODING_KEYWORDS: [&str; 6] = ["code", "programming", "function", "api", "debug", "error"];
const EXPLAIN_KEYWORDS: [&str; 4] = ["explain", "what is", "how does", "tell me"];

impl RelayModel {
    /// The whole table, in the order reported as `availableModels`.
    pub const ALL: [RelayModel; 6] = [
        RelayModel::Qwen,
        RelayModel::Gemini,
        RelayModel::DeepSeek,
        RelayModel::Gemma,
        RelayModel::DeepSeekChat,
        RelayModel::GptOss,
    ];

    pub fn key(self) -> &'static str {
        match self {
            RelayModel::Qwen => "qwen",
            RelayModel::Gemini => "gemini",
            RelayModel::DeepSeek => "deepseek",
            RelayModel::Gemma => "gemma",
            RelayModel::DeepSeekChat => "deepseek_chat",
            RelayModel::GptOss => "gpt_oss",
        }
    }

    pub fn upstream_id(self) -> &'static str {
        match self {
            RelayModel::Qwen => "qwen/qwen3-coder:free",
            RelayModel::Gemini => "google/gemini-2.0-flash-exp:free",
            RelayModel::DeepSeek => "deepseek/deepseek-r1:free",
            RelayModel::Gemma => "google/gemma-3-27b-it:free",
            RelayModel::DeepSeekChat => "deepseek/deepseek-chat-v3-0324:free",
            RelayModel::GptOss => "openai/gpt-oss-20b:free",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.key() == key)
    }

    /// Pick a model for `message`, honoring a mapped `preference`.
    pub fn select(message: &str, preference: Option<&str>) -> Self {
        if let Some(model) = preference.and_then(Self::from_key) {
            return model;
        }
        let lower = message.to_lowercase();
        if CODING_KEYWORDS.iter().any(|k| lower.contains(k)) {
            RelayModel::Qwen
        } else if EXPLAIN_KEYWORDS.iter().any(|k| lower.contains(k)) {
            RelayModel::Gemini
        } else {
            RelayModel::DeepSeekChat
        }
    }

    /// Keys of every model, for the `availableModels` field.
    pub fn available_keys() -> Vec<String> {
        Self::ALL.iter().map(|m| m.key().to_string()).collect()
    }
}
