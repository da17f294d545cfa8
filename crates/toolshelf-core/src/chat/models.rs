//! Client-side model table and the user's model preference.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A model the chat client can ask for by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKey {
    Gemini,
    #[serde(rename = "deepseek")]
    DeepSeek,
    GptOss,
}

impl ModelKey {
    /// Every client model, in display order.
    pub const ALL: [ModelKey; 3] = [ModelKey::Gemini, ModelKey::DeepSeek, ModelKey::GptOss];

    /// Entry used for unmapped keys.
    pub const DEFAULT: ModelKey = ModelKey::Gemini;

    /// Stable key used in config, on the wire, and on transcript entries.
    pub fn key(self) -> &'static str {
        match self {
            ModelKey::Gemini => "gemini",
            ModelKey::DeepSeek => "deepseek",
            ModelKey::GptOss => "gpt_oss",
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            ModelKey::Gemini => "Gemini",
            ModelKey::DeepSeek => "DeepSeek",
            ModelKey::GptOss => "GPT-OSS",
        }
    }

    /// Upstream model identifier.
    pub fn upstream_id(self) -> &'static str {
        match self {
            ModelKey::Gemini => "google/gemini-2.0-flash-exp:free",
            ModelKey::DeepSeek => "deepseek/deepseek-r1:free",
            ModelKey::GptOss => "openai/gpt-oss-20b:free",
        }
    }

    /// Look up a key exactly.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.key() == key)
    }

    /// Look up a key, falling back to [`ModelKey::DEFAULT`].
    pub fn resolve(key: &str) -> Self {
        Self::from_key(key).unwrap_or(Self::DEFAULT)
    }

    /// Heuristic used by the `auto` preference.
    pub fn auto_select(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("code") || lower.contains("programming") {
            ModelKey::DeepSeek
        } else {
            ModelKey::Gemini
        }
    }
}

impl std::fmt::Display for ModelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// The user's model choice: automatic, or a specific model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModelPreference {
    #[default]
    Auto,
    Specific(ModelKey),
}

impl ModelPreference {
    /// Parse a preference key. `auto` selects [`ModelPreference::Auto`];
    /// unknown keys map to the default model.
    pub fn parse(key: &str) -> Self {
        let key = key.trim();
        if key.eq_ignore_ascii_case("auto") {
            return ModelPreference::Auto;
        }
        match ModelKey::from_key(key) {
            Some(model) => ModelPreference::Specific(model),
            None => {
                warn!(key, default = %ModelKey::DEFAULT, "Unknown model key, using default");
                ModelPreference::Specific(ModelKey::DEFAULT)
            }
        }
    }

    pub fn is_auto(self) -> bool {
        matches!(self, ModelPreference::Auto)
    }

    pub fn key(self) -> &'static str {
        match self {
            ModelPreference::Auto => "auto",
            ModelPreference::Specific(model) => model.key(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ModelPreference::Auto => "Auto",
            ModelPreference::Specific(model) => model.label(),
        }
    }

    /// Model to use for `message`. An explicit preference always wins.
    pub fn resolve(self, message: &str) -> ModelKey {
        match self {
            ModelPreference::Auto => ModelKey::auto_select(message),
            ModelPreference::Specific(model) => model,
        }
    }

    /// All selectable preferences, `Auto` first.
    pub fn all() -> impl Iterator<Item = ModelPreference> {
        std::iter::once(ModelPreference::Auto)
            .chain(ModelKey::ALL.into_iter().map(ModelPreference::Specific))
    }
}

impl std::fmt::Display for ModelPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
