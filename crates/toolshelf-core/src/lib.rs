#![deny(unsafe_code)]

//! Toolshelf core library.
//!
//! Provides the tool catalog, the content matcher, the chat orchestrator with
//! its direct and relay backends, and the relay service itself. The CLI is a
//! thin shell over these modules.

use std::future::Future;
use std::pin::Pin;

/// A type-erased, `Send`-safe, boxed future, the return type for async trait
/// methods that require dynamic dispatch (`dyn Trait`).
///
/// Native `async fn` in traits produces opaque return types that are not
/// object-safe. Traits consumed via `Arc<dyn Trait>` return a concrete
/// `Pin<Box<dyn Future>>` instead.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Compile-time build metadata (version, git hash, profile).
pub mod build_info;
/// Tool catalog loading, validation and browsing.
pub mod catalog;
/// Chat sessions, backends and the turn orchestrator.
pub mod chat;
/// Guide and example-project references.
pub mod guides;
/// Upstream chat-completion providers.
pub mod llm;
/// Lexical matching of queries to tools, guides and examples.
pub mod matcher;
/// Chat relay HTTP service.
pub mod relay;
/// API key storage and zeroization.
pub mod secrets;

pub use catalog::{Catalog, ToolRecord, ToolStatus};
pub use chat::{ChatOrchestrator, Session};
pub use matcher::{MatchResult, UserLevel, match_query};
pub use secrets::{CredentialStore, SecretValue};
