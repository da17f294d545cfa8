//! Chat orchestrator: runs one user turn from input to transcript.
//!
//! ```text
//! idle ──send──▶ sending ──ok──────────────▶ idle (reply appended)
//!                  │  ▲
//!                  │  └── provider error, preference ≠ auto, no retry yet
//!                  │      (switch to auto, wait, resend silently)
//!                  └────err─────────────────▶ idle (notice, nothing appended)
//! ```
//!
//! Without a stored key the turn goes through the relay. If the relay cannot
//! be reached and a fallback key is configured, one direct attempt is made
//! with that key and the fallback model.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use toolshelf_config::AppConfig;

use crate::catalog::Catalog;
use crate::matcher::match_query;
use crate::secrets::SecretValue;

use super::backend::{
    BackendFailure, BackendReply, BackendRequest, ChatBackend, DirectBackend, RelayBackend,
};
use super::error::{ChatError, TurnError};
use super::markup::strip_markup;
use super::models::{ModelKey, ModelPreference};
use super::prompts::compose_system_prompt;
use super::session::{ChatMessage, Session, TurnContext};

/// Default pause before the automatic retry.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

struct Fallback {
    credential: SecretValue,
    model: ModelKey,
}

/// Result of one dispatch attempt.
struct Attempt {
    result: Result<BackendReply, BackendFailure>,
    model: ModelKey,
    via_fallback: bool,
}

/// Drives chat turns for any number of sessions.
pub struct ChatOrchestrator {
    catalog: Arc<Catalog>,
    tools_context: String,
    direct: Arc<dyn ChatBackend>,
    relay: Arc<dyn ChatBackend>,
    fallback: Option<Fallback>,
    retry_delay: Duration,
    plain_text: bool,
}

impl ChatOrchestrator {
    pub fn new(
        catalog: Arc<Catalog>,
        direct: Arc<dyn ChatBackend>,
        relay: Arc<dyn ChatBackend>,
    ) -> Self {
        let tools_context = catalog.tools_context();
        Self {
            catalog,
            tools_context,
            direct,
            relay,
            fallback: None,
            retry_delay: DEFAULT_RETRY_DELAY,
            plain_text: true,
        }
    }

    /// Orchestrator wired to the real backends described by `config`.
    ///
    /// The fallback key is read from the environment variable named by
    /// `upstream.fallback_key_env`.
    pub fn from_config(catalog: Arc<Catalog>, config: &AppConfig) -> Self {
        let direct = Arc::new(DirectBackend::new(config.upstream.clone()));
        let relay = Arc::new(RelayBackend::new(&config.chat.relay_url, &config.chat.provider));
        let mut orchestrator = Self::new(catalog, direct, relay)
            .with_retry_delay(Duration::from_millis(config.chat.retry_delay_ms))
            .with_plain_text(config.chat.plain_text);
        if let Some(key) = SecretValue::from_env(&config.upstream.fallback_key_env) {
            orchestrator =
                orchestrator.with_fallback(key, ModelKey::resolve(&config.upstream.fallback_model));
        }
        orchestrator
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Strip markdown from replies before they are stored.
    pub fn with_plain_text(mut self, plain_text: bool) -> Self {
        self.plain_text = plain_text;
        self
    }

    /// Direct fallback used when the relay cannot be reached.
    pub fn with_fallback(mut self, credential: SecretValue, model: ModelKey) -> Self {
        self.fallback = Some(Fallback { credential, model });
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Send one user message and wait for the assistant reply.
    ///
    /// On success the transcript has grown by the user turn and the reply.
    /// On a classified failure only the user turn was appended.
    pub async fn send_turn(&self, session: &Session, message: &str) -> Result<ChatMessage, TurnError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(TurnError::EmptyMessage);
        }
        let _busy = session.try_begin().ok_or(TurnError::Busy)?;

        let matched = match_query(message, &self.catalog);
        debug!(
            level = %matched.level,
            tools = matched.tools.len(),
            guides = matched.guides.len(),
            examples = matched.examples.len(),
            "Matched query"
        );
        session.begin_turn(ChatMessage::user(message, TurnContext::from(&matched)));
        let system_prompt = compose_system_prompt(&self.tools_context, &matched);

        loop {
            let attempt = self.dispatch(session, message, &system_prompt).await;
            match attempt.result {
                Ok(reply) => {
                    let content = if self.plain_text {
                        strip_markup(&reply.content)
                    } else {
                        reply.content
                    };
                    let reply = ChatMessage::assistant(content, Some(attempt.model));
                    session.complete_turn(reply.clone());
                    info!(model = %attempt.model, fallback = attempt.via_fallback, "Turn completed");
                    return Ok(reply);
                }
                Err(failure) => {
                    let error = ChatError::classify(&failure);
                    if error.is_provider_error() && !attempt.via_fallback && session.arm_retry() {
                        info!(
                            model = %attempt.model,
                            delay_ms = self.retry_delay.as_millis() as u64,
                            "Model unavailable, switched to auto and retrying"
                        );
                        tokio::time::sleep(self.retry_delay).await;
                        continue;
                    }
                    warn!(model = %attempt.model, %failure, "Turn failed");
                    return Err(TurnError::Chat(error));
                }
            }
        }
    }

    async fn dispatch(&self, session: &Session, message: &str, system_prompt: &str) -> Attempt {
        let (preference, credential) = session.dispatch_inputs();
        let model = preference.resolve(message);
        let uses_relay = credential.is_none();
        let backend = if uses_relay { &self.relay } else { &self.direct };

        let request = BackendRequest {
            message: message.to_string(),
            system_prompt: system_prompt.to_string(),
            tools_context: self.tools_context.clone(),
            model,
            credential,
        };
        debug!(backend = backend.name(), %model, preference = %preference, "Dispatching turn");
        let result = backend.send(&request).await;

        match (result, &self.fallback) {
            (Err(BackendFailure::Connection(reason)), Some(fallback)) if uses_relay => {
                warn!(%reason, model = %fallback.model, "Relay unreachable, using fallback key");
                let request = BackendRequest {
                    model: fallback.model,
                    credential: Some(fallback.credential.clone()),
                    ..request
                };
                Attempt {
                    result: self.direct.send(&request).await,
                    model: fallback.model,
                    via_fallback: true,
                }
            }
            (result, _) => Attempt {
                result,
                model,
                via_fallback: false,
            },
        }
    }
}

/// Model preference the session should start with, from config.
pub fn initial_preference(config: &AppConfig) -> ModelPreference {
    ModelPreference::parse(&config.chat.default_model)
}
