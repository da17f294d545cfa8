//! Tool catalog: loading, validation, category listing and browsing filters.
//!
//! The catalog is aggregated once from a directory of JSON documents. Each
//! document is either a bare array of tool records or an object of the form
//! `{ "tools": [...] }`. Records are immutable after loading.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Pseudo-category that matches every tool.
pub const ALL_CATEGORIES: &str = "All";

/// Keys every record in a catalog data file must carry.
pub const REQUIRED_KEYS: [&str; 8] = [
    "name",
    "description",
    "link",
    "type",
    "category",
    "tags",
    "popularity",
    "tutorial",
];

/// Errors from catalog loading.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog data at '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid catalog document '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Pricing status of a tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ToolStatus {
    #[default]
    Free,
    Paid,
    Freemium,
}

impl TryFrom<String> for ToolStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "free" | "open source" | "open-source" => Ok(ToolStatus::Free),
            "paid" => Ok(ToolStatus::Paid),
            "freemium" => Ok(ToolStatus::Freemium),
            other => Err(format!(
                "unknown tool status {other:?} (expected free, paid or freemium)"
            )),
        }
    }
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolStatus::Free => write!(f, "free"),
            ToolStatus::Paid => write!(f, "paid"),
            ToolStatus::Freemium => write!(f, "freemium"),
        }
    }
}

/// A single tool in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRecord {
    /// Stable identifier. Derived from the name when absent in the data.
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Data files spell this key `type`.
    #[serde(default, alias = "type")]
    pub status: ToolStatus,
    #[serde(default)]
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tutorial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_project_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl ToolRecord {
    /// Line describing this tool in the chat prompt context.
    pub fn context_line(&self) -> String {
        format!(
            "{} ({}): {}. Status: {}. Link: {}",
            self.name, self.category, self.description, self.status, self.link
        )
    }

    /// Table row for the markdown listing. Docs point at the tutorial and
    /// fall back to the tool link.
    fn markdown_row(&self) -> String {
        let link = if self.link.is_empty() { "#" } else { self.link.as_str() };
        let docs = self.tutorial.as_deref().filter(|t| !t.is_empty()).unwrap_or(link);
        let popularity = self.popularity.map(|p| p.to_string()).unwrap_or_default();
        format!(
            "| [{}]({link}) | {} | {} | [Docs]({docs}) | {} | {popularity} |\n",
            escape_cell(&self.name),
            escape_cell(&self.description),
            self.status,
            escape_cell(&self.tags.join(", ")),
        )
    }

    /// Case-insensitive browse match on name, description, or any tag.
    fn matches_search(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase().contains(needle_lower)
            || self.description.to_lowercase().contains(needle_lower)
            || self
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(needle_lower))
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Lower-case, dash-separated slug of a tool name.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// On-disk shape of a catalog document. Records are decoded one at a time
/// so a bad record does not take the whole document down with it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Bare(Vec<serde_json::Value>),
    Wrapped { tools: Vec<serde_json::Value> },
}

impl CatalogDocument {
    fn into_records(self) -> Vec<serde_json::Value> {
        match self {
            CatalogDocument::Bare(records) | CatalogDocument::Wrapped { tools: records } => records,
        }
    }
}

/// The aggregated, immutable tool catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tools: Vec<ToolRecord>,
}

impl Catalog {
    /// Build a catalog from records, filling in missing ids.
    pub fn new(tools: Vec<ToolRecord>) -> Self {
        let tools = tools
            .into_iter()
            .map(|mut tool| {
                if tool.id.is_empty() {
                    tool.id = slugify(&tool.name);
                }
                tool
            })
            .collect();
        Self { tools }
    }

    /// Parse the records of a single JSON document.
    ///
    /// Fails only when the document itself is malformed. Records that do not
    /// decode are skipped with a warning; [`validate_document`] reports them.
    pub fn parse_document(path: &Path, json: &str) -> Result<Vec<ToolRecord>, CatalogError> {
        let document: CatalogDocument =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;
        let mut tools = Vec::new();
        for (index, record) in document.into_records().into_iter().enumerate() {
            match serde_json::from_value::<ToolRecord>(record) {
                Ok(tool) => tools.push(tool),
                Err(e) => {
                    warn!(path = %path.display(), index, error = %e, "Skipping invalid catalog record");
                }
            }
        }
        Ok(tools)
    }

    /// Load and aggregate every `*.json` document in `dir`, in file-name order.
    pub async fn load_dir(dir: &Path) -> Result<Self, CatalogError> {
        let mut tools = Vec::new();
        for path in json_files(dir).await? {
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| CatalogError::Io {
                    path: path.clone(),
                    source: e,
                })?;
            let records = Self::parse_document(&path, &content)?;
            debug!(path = %path.display(), count = records.len(), "Loaded catalog document");
            tools.extend(records);
        }
        info!(dir = %dir.display(), tools = tools.len(), "Catalog loaded");
        Ok(Self::new(tools))
    }

    /// All tools in load order.
    pub fn tools(&self) -> &[ToolRecord] {
        &self.tools
    }

    /// Number of tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up a tool by id.
    pub fn get(&self, id: &str) -> Option<&ToolRecord> {
        self.tools.iter().find(|t| t.id == id)
    }

    /// `All` followed by every distinct category, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut unique: Vec<String> = self.tools.iter().map(|t| t.category.clone()).collect();
        unique.sort();
        unique.dedup();

        let mut categories = Vec::with_capacity(unique.len() + 1);
        categories.push(ALL_CATEGORIES.to_string());
        categories.extend(unique);
        categories
    }

    /// Tools in `category` (or any, for [`ALL_CATEGORIES`]) whose name,
    /// description, or tags contain `search` case-insensitively.
    pub fn filter(&self, category: &str, search: &str) -> Vec<&ToolRecord> {
        let needle = search.to_lowercase();
        self.tools
            .iter()
            .filter(|t| category == ALL_CATEGORIES || t.category == category)
            .filter(|t| needle.is_empty() || t.matches_search(&needle))
            .collect()
    }

    /// Markdown listing of the catalog: one table per category, sorted by
    /// category name, tools in load order.
    pub fn render_markdown(&self, title: &str) -> String {
        let mut out = format!("# {title}\n\nGenerated from the catalog data files.\n\n");
        for category in self.categories().iter().skip(1) {
            let tools: Vec<&ToolRecord> = self.tools.iter().filter(|t| &t.category == category).collect();
            out.push_str(&format!("## {category} ({})\n\n", tools.len()));
            out.push_str("| Name | Description | Type | Learn | Tags | Popularity |\n");
            out.push_str("|------|-------------|------|-------|------|------------|\n");
            for tool in tools {
                out.push_str(&tool.markdown_row());
            }
            out.push_str("\n---\n\n");
        }
        out
    }

    /// Prompt context for the whole catalog, one tool per line.
    pub fn tools_context(&self) -> String {
        self.tools
            .iter()
            .map(ToolRecord::context_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

async fn json_files(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let io_err = |e| CatalogError::Io {
        path: dir.to_path_buf(),
        source: e,
    };
    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

// ── Data file validation ────────────────────────────────────────────────

/// A schema problem found in a catalog data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Index of the offending record, if the issue is record-level.
    pub index: Option<usize>,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "[{i}] {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Check a parsed document against the catalog data schema.
pub fn validate_document(document: &serde_json::Value) -> Vec<ValidationIssue> {
    let records = match document {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => match map.get("tools") {
            Some(serde_json::Value::Array(items)) => items,
            _ => {
                return vec![ValidationIssue {
                    index: None,
                    message: "expected an array of tools or an object with a \"tools\" array"
                        .to_string(),
                }];
            }
        },
        _ => {
            return vec![ValidationIssue {
                index: None,
                message: "expected an array of tools".to_string(),
            }];
        }
    };

    let mut issues = Vec::new();
    for (index, record) in records.iter().enumerate() {
        let Some(fields) = record.as_object() else {
            issues.push(ValidationIssue {
                index: Some(index),
                message: "record must be an object".to_string(),
            });
            continue;
        };
        for key in REQUIRED_KEYS {
            if !fields.contains_key(key) {
                issues.push(ValidationIssue {
                    index: Some(index),
                    message: format!("missing key: {key}"),
                });
            }
        }
        issues.extend(
            value_problems(fields)
                .into_iter()
                .map(|message| ValidationIssue {
                    index: Some(index),
                    message,
                }),
        );
    }
    issues
}

/// Keys that must hold a string when present.
const STRING_KEYS: [&str; 5] = ["id", "name", "description", "link", "category"];

/// Keys that may hold a string or `null`.
const OPTIONAL_STRING_KEYS: [&str; 3] = ["tutorial", "exampleProjectLink", "logo"];

/// Value-level problems of one record: everything that would stop it from
/// loading as a [`ToolRecord`].
fn value_problems(fields: &serde_json::Map<String, serde_json::Value>) -> Vec<String> {
    use serde_json::Value;

    let mut problems = Vec::new();
    for key in STRING_KEYS {
        if fields.get(key).is_some_and(|v| !v.is_string()) {
            problems.push(format!("{key} must be a string"));
        }
    }
    for key in OPTIONAL_STRING_KEYS {
        if fields.get(key).is_some_and(|v| !(v.is_string() || v.is_null())) {
            problems.push(format!("{key} must be a string or null"));
        }
    }
    if let Some(tags) = fields.get("tags") {
        match tags {
            Value::Array(items) if items.iter().all(Value::is_string) => {}
            Value::Array(_) => problems.push("tags must contain only strings".to_string()),
            _ => problems.push("tags must be an array".to_string()),
        }
    }
    if let Some(popularity) = fields.get("popularity") {
        if !(popularity.is_number() || popularity.is_null()) {
            problems.push("popularity must be a number".to_string());
        }
    }
    // Either spelling of the status key is decoded, but not both.
    if fields.contains_key("type") && fields.contains_key("status") {
        problems.push("use either type or status, not both".to_string());
    }
    for key in ["type", "status"] {
        match fields.get(key) {
            None => {}
            Some(Value::String(status)) => {
                if let Err(reason) = ToolStatus::try_from(status.clone()) {
                    problems.push(format!("{key}: {reason}"));
                }
            }
            Some(_) => problems.push(format!("{key} must be a string")),
        }
    }
    problems
}

/// Validation outcome for one data file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub issues: Vec<ValidationIssue>,
}

impl FileReport {
    /// Whether the file passed validation.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validate every `*.json` file in `dir`. Unparseable JSON is reported as an
/// issue rather than an error so every file gets a verdict.
pub async fn validate_dir(dir: &Path) -> Result<Vec<FileReport>, CatalogError> {
    let mut reports = Vec::new();
    for path in json_files(dir).await? {
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| CatalogError::Io {
                path: path.clone(),
                source: e,
            })?;
        let issues = match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(document) => validate_document(&document),
            Err(e) => vec![ValidationIssue {
                index: None,
                message: format!("invalid JSON: {e}"),
            }],
        };
        reports.push(FileReport { path, issues });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn tool(name: &str, category: &str, tags: &[&str]) -> ToolRecord {
        ToolRecord {
            id: String::new(),
            name: name.to_string(),
            description: format!("{name} description"),
            category: category.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            status: ToolStatus::Free,
            link: format!("https://{}.example.com", slugify(name)),
            tutorial: None,
            example_project_link: None,
            popularity: None,
            logo: None,
        }
    }

    #[test]
    fn test_parse_bare_array() {
        let json = r#"[
            {"name": "Supabase", "description": "Postgres backend", "category": "Backend & Databases",
             "tags": ["database", "auth"], "type": "Freemium", "link": "https://supabase.com",
             "tutorial": "https://supabase.com/docs", "popularity": 9}
        ]"#;
        let tools = Catalog::parse_document(Path::new("backend.json"), json).unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].status, ToolStatus::Freemium);
        assert_eq!(tools[0].popularity, Some(9.0));
        assert_eq!(tools[0].tutorial.as_deref(), Some("https://supabase.com/docs"));
    }

    #[test]
    fn test_parse_wrapped_document() {
        let json = r#"{"tools": [
            {"id": "vercel", "name": "Vercel", "description": "Hosting", "category": "Hosting",
             "tags": [], "status": "free", "link": "https://vercel.com"}
        ]}"#;
        let tools = Catalog::parse_document(Path::new("hosting.json"), json).unwrap();
        assert_eq!(tools[0].id, "vercel");
        assert_eq!(tools[0].status, ToolStatus::Free);
    }

    #[test]
    fn test_parse_skips_undecodable_records() {
        let json = r#"[
            {"name": "X", "type": "Subscription"},
            {"name": "Neon", "type": "free", "popularity": "high"},
            {"name": "Vercel", "type": "Freemium"}
        ]"#;
        let tools = Catalog::parse_document(Path::new("x.json"), json).unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "Vercel");
    }

    #[test]
    fn test_parse_rejects_malformed_document() {
        for json in ["[{", r#"{"items": []}"#, "42"] {
            let err = Catalog::parse_document(Path::new("x.json"), json).unwrap_err();
            assert!(matches!(err, CatalogError::Parse { .. }), "{json}");
        }
    }

    #[test]
    fn test_missing_ids_are_slugified() {
        let catalog = Catalog::new(vec![tool("Hugging Face Hub", "AI & LLM APIs", &[])]);
        assert_eq!(catalog.tools()[0].id, "hugging-face-hub");
        assert!(catalog.get("hugging-face-hub").is_some());
    }

    #[test]
    fn test_categories_sorted_and_unique() {
        let catalog = Catalog::new(vec![
            tool("Stripe", "Payments & Monetization", &[]),
            tool("Supabase", "Backend & Databases", &[]),
            tool("Paystack", "Payments & Monetization", &[]),
        ]);
        assert_eq!(
            catalog.categories(),
            vec![
                "All".to_string(),
                "Backend & Databases".to_string(),
                "Payments & Monetization".to_string(),
            ]
        );
    }

    #[test]
    fn test_filter_by_category_and_search() {
        let catalog = Catalog::new(vec![
            tool("Stripe", "Payments & Monetization", &["billing"]),
            tool("Supabase", "Backend & Databases", &["postgres"]),
            tool("Paystack", "Payments & Monetization", &["africa"]),
        ]);

        assert_eq!(catalog.filter(ALL_CATEGORIES, "").len(), 3);
        assert_eq!(catalog.filter("Payments & Monetization", "").len(), 2);

        let by_tag = catalog.filter(ALL_CATEGORIES, "POSTGRES");
        assert_eq!(by_tag.len(), 1);
        assert_eq!(by_tag[0].name, "Supabase");

        let both = catalog.filter("Payments & Monetization", "africa");
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].name, "Paystack");

        assert!(catalog.filter("Hosting", "").is_empty());
    }

    #[test]
    fn test_tools_context_lines() {
        let catalog = Catalog::new(vec![tool("Stripe", "Payments & Monetization", &[])]);
        assert_eq!(
            catalog.tools_context(),
            "Stripe (Payments & Monetization): Stripe description. Status: free. Link: https://stripe.example.com"
        );
    }

    #[test]
    fn test_render_markdown_groups_by_category() {
        let mut stripe = tool("Stripe", "Payments & Monetization", &["billing", "cards"]);
        stripe.tutorial = Some("https://stripe.com/docs".to_string());
        stripe.popularity = Some(9.0);
        stripe.status = ToolStatus::Paid;
        let catalog = Catalog::new(vec![
            stripe,
            tool("Supabase", "Backend & Databases", &["postgres"]),
        ]);

        let markdown = catalog.render_markdown("Toolshelf");
        assert!(markdown.starts_with("# Toolshelf\n\n"));
        let backend = markdown.find("## Backend & Databases (1)").unwrap();
        let payments = markdown.find("## Payments & Monetization (1)").unwrap();
        assert!(backend < payments);
        assert!(markdown.contains(
            "| [Stripe](https://stripe.example.com) | Stripe description | paid | [Docs](https://stripe.com/docs) | billing, cards | 9 |\n"
        ));
        assert_eq!(markdown.matches("\n---\n").count(), 2);
    }

    #[test]
    fn test_render_markdown_escapes_pipes_and_falls_back_to_link() {
        let mut cli = tool("Pipe CLI", "Developer Tools", &[]);
        cli.description = "Reads a | b\nand more".to_string();
        let mut bare = tool("Bare", "Developer Tools", &[]);
        bare.link = String::new();

        let markdown = Catalog::new(vec![cli, bare]).render_markdown("T");
        assert!(markdown.contains(
            "| [Pipe CLI](https://pipe-cli.example.com) | Reads a \\| b and more | free | [Docs](https://pipe-cli.example.com) |  |  |\n"
        ));
        assert!(markdown.contains("| [Bare](#) | Bare description | free | [Docs](#) |  |  |\n"));
    }

    #[test]
    fn test_validate_document_reports_missing_keys() {
        let doc = serde_json::json!([
            {"name": "A", "description": "", "link": "", "type": "free", "category": "x",
             "tags": [], "popularity": 1, "tutorial": ""},
            {"name": "B", "tags": "not-an-array"}
        ]);
        let issues = validate_document(&doc);
        assert!(issues.iter().all(|i| i.index == Some(1)));
        assert!(issues.iter().any(|i| i.message == "missing key: tutorial"));
        assert!(issues.iter().any(|i| i.message == "tags must be an array"));
    }

    fn complete(overrides: serde_json::Value) -> serde_json::Value {
        let mut record = serde_json::json!({
            "name": "Neon", "description": "Serverless Postgres", "link": "https://neon.tech",
            "type": "Free", "category": "Backend & Databases", "tags": ["postgres"],
            "popularity": 8, "tutorial": null
        });
        if let (Some(record), Some(overrides)) = (record.as_object_mut(), overrides.as_object()) {
            for (key, value) in overrides {
                record.insert(key.clone(), value.clone());
            }
        }
        record
    }

    #[test]
    fn test_validate_document_checks_values() {
        let doc = serde_json::json!([
            complete(serde_json::json!({"type": "Subscription"})),
            complete(serde_json::json!({"popularity": "high"})),
            complete(serde_json::json!({"tags": ["db", 3]})),
            complete(serde_json::json!({"description": null})),
            complete(serde_json::json!({"status": "paid"})),
        ]);
        let messages: Vec<String> = validate_document(&doc).iter().map(|i| i.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "[0] type: unknown tool status \"subscription\" (expected free, paid or freemium)",
                "[1] popularity must be a number",
                "[2] tags must contain only strings",
                "[3] description must be a string",
                "[4] use either type or status, not both",
            ]
        );
    }

    #[test]
    fn test_records_passing_validation_always_decode() {
        let candidates = [
            complete(serde_json::json!({})),
            complete(serde_json::json!({"type": "Subscription"})),
            complete(serde_json::json!({"type": "open source", "popularity": 4.5})),
            complete(serde_json::json!({"popularity": "high"})),
            complete(serde_json::json!({"popularity": null, "tutorial": "https://x.dev"})),
            complete(serde_json::json!({"tags": [1, 2]})),
            complete(serde_json::json!({"tutorial": 7})),
            complete(serde_json::json!({"logo": false})),
            complete(serde_json::json!({"id": 12})),
            complete(serde_json::json!({"status": "paid"})),
            complete(serde_json::json!({"type": null})),
        ];
        for record in candidates {
            let valid = validate_document(&serde_json::json!([record.clone()])).is_empty();
            let decoded = serde_json::from_value::<ToolRecord>(record.clone()).is_ok();
            if valid {
                assert!(decoded, "validated record failed to load: {record}");
            } else {
                assert!(!decoded, "rejected record would have loaded: {record}");
            }
        }
    }

    #[test]
    fn test_validate_document_rejects_scalar() {
        let issues = validate_document(&serde_json::json!("tools"));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].index, None);
    }

    #[tokio::test]
    async fn test_load_dir_aggregates_documents_in_name_order() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("b_hosting.json"),
            r#"{"tools": [{"name": "Vercel", "category": "Hosting", "status": "free"}]}"#,
        )
        .await
        .unwrap();
        tokio::fs::write(
            tmp.path().join("a_ai.json"),
            r#"[{"name": "OpenRouter", "category": "AI & LLM APIs", "type": "paid"}]"#,
        )
        .await
        .unwrap();
        tokio::fs::write(tmp.path().join("notes.txt"), "ignored")
            .await
            .unwrap();

        let catalog = Catalog::load_dir(tmp.path()).await.unwrap();
        let names: Vec<&str> = catalog.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["OpenRouter", "Vercel"]);
    }

    #[tokio::test]
    async fn test_load_dir_missing_directory() {
        let result = Catalog::load_dir(Path::new("/nonexistent/catalog")).await;
        assert!(matches!(result, Err(CatalogError::Io { .. })));
    }

    #[tokio::test]
    async fn test_validate_dir_reports_invalid_json() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("broken.json"), "[{")
            .await
            .unwrap();
        let reports = validate_dir(tmp.path()).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert!(!reports[0].is_valid());
        assert!(reports[0].issues[0].message.starts_with("invalid JSON"));
    }
}
