//! Chat assistant: sessions, backends, error classification and the
//! orchestrator that ties them together.

pub mod backend;
pub mod error;
pub mod markup;
pub mod models;
pub mod orchestrator;
pub mod prompts;
pub mod session;

pub use backend::{
    BackendFailure, BackendReply, BackendRequest, ChatBackend, DirectBackend, RelayBackend,
};
pub use error::{ChatError, Notice, TurnError};
pub use markup::strip_markup;
pub use models::{ModelKey, ModelPreference};
pub use orchestrator::{ChatOrchestrator, initial_preference};
pub use prompts::{PromptTemplate, compose_system_prompt, relay_system_prompt};
pub use session::{ChatMessage, GREETING, Role, Session, TurnContext};
