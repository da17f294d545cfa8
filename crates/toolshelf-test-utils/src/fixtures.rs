//! Catalog data and scripted backends for tests.
//!
//! [`sample_catalog`] is a small catalog spread over several categories.
//! [`TestCatalogDir`] writes catalog documents into a temporary directory.
//! [`ScriptedBackend`] and [`ScriptedProvider`] replay canned results in
//! place of the network.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::TempDir;
use toolshelf_core::BoxFuture;
use toolshelf_core::catalog::{Catalog, ToolRecord, ToolStatus};
use toolshelf_core::chat::{BackendFailure, BackendReply, BackendRequest, ChatBackend};
use toolshelf_core::llm::{ChatRequest, ChatResponse, LlmProvider, UpstreamError};

/// A catalog record with a generated description and link.
pub fn tool(name: &str, category: &str, tags: &[&str], status: ToolStatus) -> ToolRecord {
    ToolRecord {
        id: String::new(),
        name: name.to_string(),
        description: format!("{name} for {}", category.to_lowercase()),
        category: category.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        status,
        link: format!("https://{}.example.com", name.to_lowercase()),
        tutorial: None,
        example_project_link: None,
        popularity: Some(4.5),
        logo: None,
    }
}

/// Records of [`sample_catalog`], in catalog order.
pub fn sample_tools() -> Vec<ToolRecord> {
    vec![
        tool(
            "Supabase",
            "Database",
            &["postgres", "auth", "storage"],
            ToolStatus::Freemium,
        ),
        tool("Vercel", "Hosting", &["deploy", "serverless"], ToolStatus::Freemium),
        tool("Plausible", "Analytics", &["privacy", "tracking"], ToolStatus::Paid),
        tool("PostHog", "Analytics", &["product", "tracking"], ToolStatus::Freemium),
        tool("Paystack", "Payments", &["checkout", "africa"], ToolStatus::Paid),
        tool("Ollama", "AI", &["llm", "local", "models"], ToolStatus::Free),
    ]
}

pub fn sample_catalog() -> Catalog {
    Catalog::new(sample_tools())
}

/// A catalog document in the on-disk shape, with `type` for the status.
pub fn catalog_document(tools: &[ToolRecord]) -> String {
    let records: Vec<serde_json::Value> = tools
        .iter()
        .map(|t| {
            serde_json::json!({
                "name": t.name,
                "description": t.description,
                "link": t.link,
                "type": t.status.to_string(),
                "category": t.category,
                "tags": t.tags,
                "popularity": t.popularity,
                "tutorial": t.tutorial,
            })
        })
        .collect();
    serde_json::Value::Array(records).to_string()
}

/// A temporary catalog data directory, deleted on drop.
pub struct TestCatalogDir {
    _temp_dir: TempDir,
    path: PathBuf,
}

impl TestCatalogDir {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let path = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            path,
        }
    }

    /// Directory holding [`sample_tools`] split over two documents.
    pub fn with_sample() -> Self {
        let dir = Self::new();
        let tools = sample_tools();
        let (first, second) = tools.split_at(3);
        dir.write("01-core.json", &catalog_document(first));
        dir.write("02-more.json", &catalog_document(second));
        dir
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `content` to `name` inside the directory.
    pub fn write(&self, name: &str, content: &str) {
        std::fs::write(self.path.join(name), content).expect("failed to write catalog file");
    }
}

impl Default for TestCatalogDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Chat backend replaying a queue of canned results.
///
/// Every request is recorded. Once the queue is empty each call fails with
/// [`BackendFailure::Connection`].
pub struct ScriptedBackend {
    name: String,
    replies: Mutex<VecDeque<Result<BackendReply, BackendFailure>>>,
    seen: Mutex<Vec<BackendRequest>>,
}

impl ScriptedBackend {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            replies: Mutex::new(VecDeque::new()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply.
    pub fn reply(self, content: &str) -> Self {
        self.push(Ok(BackendReply {
            content: content.to_string(),
        }))
    }

    /// Queue a failure.
    pub fn fail(self, failure: BackendFailure) -> Self {
        self.push(Err(failure))
    }

    fn push(self, result: Result<BackendReply, BackendFailure>) -> Self {
        self.replies
            .lock()
            .expect("scripted backend lock poisoned")
            .push_back(result);
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<BackendRequest> {
        self.seen.lock().expect("scripted backend lock poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().expect("scripted backend lock poisoned").len()
    }
}

impl ChatBackend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, request: &BackendRequest) -> BoxFuture<'_, Result<BackendReply, BackendFailure>> {
        self.seen
            .lock()
            .expect("scripted backend lock poisoned")
            .push(request.clone());
        let next = self
            .replies
            .lock()
            .expect("scripted backend lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(BackendFailure::Connection("script exhausted".to_string())));
        Box::pin(async move { next })
    }
}

/// Upstream provider replaying canned results, for relay tests.
pub struct ScriptedProvider {
    name: String,
    replies: Mutex<VecDeque<Result<ChatResponse, UpstreamError>>>,
    seen: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            replies: Mutex::new(VecDeque::new()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful completion.
    pub fn reply(self, content: &str, model: &str) -> Self {
        self.push(Ok(ChatResponse {
            content: content.to_string(),
            model: model.to_string(),
        }))
    }

    /// Queue a failure.
    pub fn fail(self, error: UpstreamError) -> Self {
        self.push(Err(error))
    }

    fn push(self, result: Result<ChatResponse, UpstreamError>) -> Self {
        self.replies
            .lock()
            .expect("scripted provider lock poisoned")
            .push_back(result);
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.seen.lock().expect("scripted provider lock poisoned").clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn chat(&self, request: &ChatRequest) -> BoxFuture<'_, Result<ChatResponse, UpstreamError>> {
        self.seen
            .lock()
            .expect("scripted provider lock poisoned")
            .push(request.clone());
        let next = self
            .replies
            .lock()
            .expect("scripted provider lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(UpstreamError::Network("script exhausted".to_string())));
        Box::pin(async move { next })
    }
}
