//! Chat session state: transcript, model preference, credential, retry
//! counter and the busy flag.
//!
//! The transcript only grows. A session is driven by one orchestrator call
//! at a time; the busy flag rejects overlapping sends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::matcher::{MatchResult, UserLevel};
use crate::secrets::{CredentialError, CredentialStore, SecretValue};

use super::models::{ModelKey, ModelPreference};

/// First message of every transcript.
pub const GREETING: &str =
    "Hi! Ask me about developer and AI tools, guides or example projects and I'll point you to the right ones.";

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// What the matcher found for a user turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TurnContext {
    pub tools: Vec<String>,
    pub guides: Vec<String>,
    pub examples: Vec<String>,
    pub level: UserLevel,
}

impl From<&MatchResult> for TurnContext {
    fn from(matched: &MatchResult) -> Self {
        Self {
            tools: matched.tool_names(),
            guides: matched.guides.iter().map(|g| g.to_string()).collect(),
            examples: matched.examples.iter().map(|e| e.to_string()).collect(),
            level: matched.level,
        }
    }
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Model that produced an assistant reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelKey>,
    /// Matcher context of a user turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<TurnContext>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>, context: TurnContext) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            model: None,
            context: Some(context),
        }
    }

    pub fn assistant(content: impl Into<String>, model: Option<ModelKey>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            model,
            context: None,
        }
    }
}

struct SessionState {
    transcript: Vec<ChatMessage>,
    preference: ModelPreference,
    credential: Option<SecretValue>,
    retry_count: u8,
}

/// A single user's conversation.
pub struct Session {
    state: Mutex<SessionState>,
    busy: AtomicBool,
}

/// Releases the busy flag when dropped.
pub(crate) struct BusyGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl Session {
    /// New session with the greeting as its only message.
    pub fn new(preference: ModelPreference, credential: Option<SecretValue>) -> Self {
        Self {
            state: Mutex::new(SessionState {
                transcript: vec![ChatMessage::assistant(GREETING, None)],
                preference,
                credential,
                retry_count: 0,
            }),
            busy: AtomicBool::new(false),
        }
    }

    /// New session with the credential read from `store`.
    pub async fn open(
        store: &CredentialStore,
        preference: ModelPreference,
    ) -> Result<Self, CredentialError> {
        let credential = store.load().await?;
        Ok(Self::new(preference, credential))
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the transcript.
    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.state().transcript.clone()
    }

    /// Number of transcript entries.
    pub fn len(&self) -> usize {
        self.state().transcript.len()
    }

    /// Whether the transcript is empty. Never true for a new session.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most recent transcript entry.
    pub fn last(&self) -> Option<ChatMessage> {
        self.state().transcript.last().cloned()
    }

    pub fn preference(&self) -> ModelPreference {
        self.state().preference
    }

    pub fn set_preference(&self, preference: ModelPreference) {
        self.state().preference = preference;
    }

    pub fn has_credential(&self) -> bool {
        self.state().credential.is_some()
    }

    pub fn retry_count(&self) -> u8 {
        self.state().retry_count
    }

    /// Whether a send is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Persist `key` and use it for the following turns.
    pub async fn save_credential(
        &self,
        store: &CredentialStore,
        key: &str,
    ) -> Result<(), CredentialError> {
        let saved = store.save(key).await?;
        self.state().credential = Some(saved);
        Ok(())
    }

    /// Remove the stored key. Following turns go through the relay.
    pub async fn clear_credential(&self, store: &CredentialStore) -> Result<(), CredentialError> {
        store.clear().await?;
        self.state().credential = None;
        Ok(())
    }

    pub(crate) fn try_begin(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard { busy: &self.busy })
    }

    /// Append the user turn and reset the retry counter.
    pub(crate) fn begin_turn(&self, message: ChatMessage) {
        let mut state = self.state();
        state.transcript.push(message);
        state.retry_count = 0;
    }

    /// Preference and credential for the next attempt.
    pub(crate) fn dispatch_inputs(&self) -> (ModelPreference, Option<SecretValue>) {
        let state = self.state();
        (state.preference, state.credential.clone())
    }

    /// Append the assistant reply and reset the retry counter.
    pub(crate) fn complete_turn(&self, message: ChatMessage) {
        let mut state = self.state();
        state.transcript.push(message);
        state.retry_count = 0;
    }

    /// Arm the one automatic retry: switch to `auto` and count it.
    ///
    /// Returns false when the preference is already `auto` or the retry was
    /// used.
    pub(crate) fn arm_retry(&self) -> bool {
        let mut state = self.state();
        if state.preference.is_auto() || state.retry_count >= 1 {
            return false;
        }
        state.preference = ModelPreference::Auto;
        state.retry_count += 1;
        true
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("Session")
            .field("messages", &state.transcript.len())
            .field("preference", &state.preference)
            .field("has_credential", &state.credential.is_some())
            .field("retry_count", &state.retry_count)
            .field("busy", &self.is_busy())
            .finish()
    }
}
