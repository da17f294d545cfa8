#![deny(unsafe_code)]

//! Configuration loading and validation for Toolshelf.
//!
//! Loads TOML configuration files and validates them against expected schemas.
//! Provides the [`AppConfig`] type as the central configuration structure
//! shared by the relay service, the chat orchestrator, and the CLI.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Relay service configuration.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Upstream chat-completion provider configuration.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Chat client configuration.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Tool catalog configuration.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Durable credential storage.
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration for the chat relay service.
///
/// ## TOML Example
///
/// ```toml
/// [relay]
/// listen_addr = "0.0.0.0"
/// listen_port = 8787
/// max_requests = 3
/// window_secs = 600
/// gateway_key_env = "TOOLSHELF_GATEWAY_API_KEY"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Address the relay listens on.
    #[serde(default = "default_relay_listen_addr")]
    pub listen_addr: String,

    /// Port the relay listens on.
    #[serde(default = "default_relay_listen_port")]
    pub listen_port: u16,

    /// HTTP route of the chat endpoint.
    #[serde(default = "default_relay_route")]
    pub route: String,

    /// Maximum requests per caller inside one rate-limit window.
    #[serde(default = "default_relay_max_requests")]
    pub max_requests: u32,

    /// Length of the sliding rate-limit window in seconds.
    #[serde(default = "default_relay_window_secs")]
    pub window_secs: u64,

    /// Environment variable holding the shared OpenRouter key.
    #[serde(default = "default_openrouter_key_env")]
    pub openrouter_key_env: String,

    /// Environment variable holding the shared gateway key.
    #[serde(default = "default_gateway_key_env")]
    pub gateway_key_env: String,

    /// Chat-completion URL of the alternate gateway.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// Upstream model identifier always used through the gateway.
    #[serde(default = "default_gateway_model")]
    pub gateway_model: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_relay_listen_addr(),
            listen_port: default_relay_listen_port(),
            route: default_relay_route(),
            max_requests: default_relay_max_requests(),
            window_secs: default_relay_window_secs(),
            openrouter_key_env: default_openrouter_key_env(),
            gateway_key_env: default_gateway_key_env(),
            gateway_url: default_gateway_url(),
            gateway_model: default_gateway_model(),
        }
    }
}

fn default_relay_listen_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_relay_listen_port() -> u16 {
    8787
}

fn default_relay_route() -> String {
    "/chat-with-tool".to_string()
}

fn default_relay_max_requests() -> u32 {
    3
}

fn default_relay_window_secs() -> u64 {
    600
}

fn default_openrouter_key_env() -> String {
    "TOOLSHELF_OPENROUTER_API_KEY".to_string()
}

fn default_gateway_key_env() -> String {
    "TOOLSHELF_GATEWAY_API_KEY".to_string()
}

fn default_gateway_url() -> String {
    "https://ai.gateway.example.dev/v1/chat/completions".to_string()
}

fn default_gateway_model() -> String {
    "google/gemini-2.0-flash-exp:free".to_string()
}

/// Upstream chat-completion provider settings used in direct mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Chat-completion endpoint URL.
    #[serde(default = "default_upstream_endpoint")]
    pub endpoint: String,

    /// Value of the `HTTP-Referer` attribution header.
    #[serde(default = "default_upstream_referer")]
    pub referer: String,

    /// Value of the `X-Title` attribution header.
    #[serde(default = "default_upstream_title")]
    pub title: String,

    /// Sampling temperature (0.0–2.0).
    #[serde(default = "default_upstream_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate.
    #[serde(default = "default_upstream_max_tokens")]
    pub max_tokens: u32,

    /// Nucleus-sampling parameter (0.0–1.0].
    #[serde(default = "default_upstream_top_p")]
    pub top_p: f32,

    /// Environment variable holding the fallback key used when the relay
    /// cannot be reached. Never the user's own key.
    #[serde(default = "default_fallback_key_env")]
    pub fallback_key_env: String,

    /// Model key used for the fallback call.
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: default_upstream_endpoint(),
            referer: default_upstream_referer(),
            title: default_upstream_title(),
            temperature: default_upstream_temperature(),
            max_tokens: default_upstream_max_tokens(),
            top_p: default_upstream_top_p(),
            fallback_key_env: default_fallback_key_env(),
            fallback_model: default_fallback_model(),
        }
    }
}

fn default_upstream_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_upstream_referer() -> String {
    "https://toolshelf.example.org".to_string()
}

fn default_upstream_title() -> String {
    "Toolshelf".to_string()
}

fn default_upstream_temperature() -> f32 {
    0.6
}

fn default_upstream_max_tokens() -> u32 {
    800
}

fn default_upstream_top_p() -> f32 {
    0.9
}

fn default_fallback_key_env() -> String {
    "TOOLSHELF_FALLBACK_API_KEY".to_string()
}

fn default_fallback_model() -> String {
    "gemini".to_string()
}

/// Chat client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// URL of the relay chat endpoint used when no user key is stored.
    #[serde(default = "default_chat_relay_url")]
    pub relay_url: String,

    /// Relay provider: "gateway" (rate limited trial) or "openrouter".
    #[serde(default = "default_chat_provider")]
    pub provider: String,

    /// Initial model preference: "auto" or a model key.
    #[serde(default = "default_chat_model")]
    pub default_model: String,

    /// Delay before the automatic model-fallback retry, in milliseconds.
    #[serde(default = "default_chat_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Strip markdown artifacts from replies.
    #[serde(default = "default_chat_plain_text")]
    pub plain_text: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            relay_url: default_chat_relay_url(),
            provider: default_chat_provider(),
            default_model: default_chat_model(),
            retry_delay_ms: default_chat_retry_delay_ms(),
            plain_text: default_chat_plain_text(),
        }
    }
}

fn default_chat_relay_url() -> String {
    "http://127.0.0.1:8787/chat-with-tool".to_string()
}

fn default_chat_provider() -> String {
    "gateway".to_string()
}

fn default_chat_model() -> String {
    "auto".to_string()
}

fn default_chat_retry_delay_ms() -> u64 {
    1000
}

fn default_chat_plain_text() -> bool {
    true
}

/// Tool catalog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Directory holding the catalog JSON documents.
    #[serde(default = "default_catalog_data_dir")]
    pub data_dir: String,

    /// Base URL guides are served from (file name is appended).
    #[serde(default = "default_guides_base_url")]
    pub guides_base_url: String,

    /// Base URL example projects are served from (file name is appended).
    #[serde(default = "default_examples_base_url")]
    pub examples_base_url: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_dir: default_catalog_data_dir(),
            guides_base_url: default_guides_base_url(),
            examples_base_url: default_examples_base_url(),
        }
    }
}

fn default_catalog_data_dir() -> String {
    "data".to_string()
}

fn default_guides_base_url() -> String {
    "https://raw.githubusercontent.com/toolshelf/toolshelf/main/guides/".to_string()
}

fn default_examples_base_url() -> String {
    "https://raw.githubusercontent.com/toolshelf/toolshelf/main/examples/".to_string()
}

/// Where the user's own API key is persisted between sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Path of the credential file.
    #[serde(default = "default_credentials_path")]
    pub path: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            path: default_credentials_path(),
        }
    }
}

fn default_credentials_path() -> String {
    ".toolshelf/openrouter_api_key".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Model keys accepted as a chat preference.
pub const CHAT_MODEL_KEYS: [&str; 4] = ["auto", "gemini", "deepseek", "gpt_oss"];

/// Relay providers accepted by the chat client.
pub const RELAY_PROVIDERS: [&str; 2] = ["gateway", "openrouter"];

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.relay.listen_port == 0 {
            return Err(ConfigError::Validation(
                "relay.listen_port must be non-zero".to_string(),
            ));
        }
        if self.relay.listen_addr.is_empty() {
            return Err(ConfigError::Validation(
                "relay.listen_addr must not be empty".to_string(),
            ));
        }
        if !self.relay.route.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "relay.route must start with '/', got {:?}",
                self.relay.route
            )));
        }
        if self.relay.max_requests == 0 {
            return Err(ConfigError::Validation(
                "relay.max_requests must be at least 1".to_string(),
            ));
        }
        if self.relay.window_secs == 0 {
            return Err(ConfigError::Validation(
                "relay.window_secs must be non-zero".to_string(),
            ));
        }

        if self.upstream.endpoint.is_empty() {
            return Err(ConfigError::Validation(
                "upstream.endpoint must not be empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.upstream.temperature) {
            return Err(ConfigError::Validation(format!(
                "upstream.temperature must be in [0.0, 2.0], got {}",
                self.upstream.temperature
            )));
        }
        if self.upstream.top_p <= 0.0 || self.upstream.top_p > 1.0 {
            return Err(ConfigError::Validation(format!(
                "upstream.top_p must be in (0.0, 1.0], got {}",
                self.upstream.top_p
            )));
        }
        if self.upstream.max_tokens == 0 {
            return Err(ConfigError::Validation(
                "upstream.max_tokens must be non-zero".to_string(),
            ));
        }
        let fallback_keys = &CHAT_MODEL_KEYS[1..];
        if !fallback_keys.contains(&self.upstream.fallback_model.as_str()) {
            return Err(ConfigError::Validation(format!(
                "upstream.fallback_model must be one of {:?}, got {:?}",
                fallback_keys, self.upstream.fallback_model
            )));
        }

        if !CHAT_MODEL_KEYS.contains(&self.chat.default_model.as_str()) {
            return Err(ConfigError::Validation(format!(
                "chat.default_model must be one of {:?}, got {:?}",
                CHAT_MODEL_KEYS, self.chat.default_model
            )));
        }
        if !RELAY_PROVIDERS.contains(&self.chat.provider.as_str()) {
            return Err(ConfigError::Validation(format!(
                "chat.provider must be one of {:?}, got {:?}",
                RELAY_PROVIDERS, self.chat.provider
            )));
        }
        if self.chat.relay_url.is_empty() {
            return Err(ConfigError::Validation(
                "chat.relay_url must not be empty".to_string(),
            ));
        }

        if self.catalog.data_dir.is_empty() {
            return Err(ConfigError::Validation(
                "catalog.data_dir must not be empty".to_string(),
            ));
        }
        if self.credentials.path.is_empty() {
            return Err(ConfigError::Validation(
                "credentials.path must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
