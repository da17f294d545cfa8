//! Upstream chat-completion integration.
//!
//! Every upstream (OpenRouter, the relay's shared gateway) speaks the
//! OpenAI Chat Completions format and is reached through the [`LlmProvider`]
//! trait.
//!
//! ```text
//! ┌───────────────┐  ┌─────────────┐
//! │ DirectBackend │  │ Relay route │
//! └───────┬───────┘  └──────┬──────┘
//!         └────────┬────────┘
//!                  ▼
//!          ┌──────────────┐
//!          │ LlmProvider  │  (trait)
//!          └──────┬───────┘
//!                 ▼
//!       ┌────────────────────┐
//!       │ OpenRouterProvider │
//!       └────────────────────┘
//! ```

pub mod openrouter;
pub mod provider;
pub mod types;

pub use openrouter::OpenRouterProvider;
pub use provider::{LlmProvider, UpstreamError, error_message_from_body, extract_reply};
pub use types::*;
