//! Static guide and example-project references.
//!
//! Guides and example projects are markdown documents identified by their
//! file name. Rendering them is left to the front end; this module only
//! knows the fixed lists, their slugs, and where they are served from.

use serde::Serialize;

/// Guide documents, in display order.
pub const GUIDE_FILES: [&str; 7] = [
    "accept-payments-with-paystack.md",
    "ai-integration-guide.md",
    "connect-supabase-vercel.md",
    "get-started.md",
    "getting-started.md",
    "run-llm-locally.md",
    "track-users-privately.md",
];

/// Example-project documents, in display order.
pub const EXAMPLE_FILES: [&str; 6] = [
    "ai-chatbot-with-supabase.md",
    "analytics-dashboard.md",
    "file-uploader-app.md",
    "image-generator-app.md",
    "personal-dashboard.md",
    "sample-projects.md",
];

/// Which list a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    Guide,
    Example,
}

/// A reference to one guide or example document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocRef {
    pub kind: DocKind,
    pub file: &'static str,
}

impl DocRef {
    /// File name without the `.md` suffix.
    pub fn slug(&self) -> &'static str {
        self.file.strip_suffix(".md").unwrap_or(self.file)
    }

    /// Location of the raw document under `base_url`.
    pub fn url(&self, base_url: &str) -> String {
        if base_url.ends_with('/') {
            format!("{base_url}{}", self.file)
        } else {
            format!("{base_url}/{}", self.file)
        }
    }
}

/// All guide references.
pub fn guides() -> impl Iterator<Item = DocRef> {
    GUIDE_FILES.into_iter().map(|file| DocRef {
        kind: DocKind::Guide,
        file,
    })
}

/// All example-project references.
pub fn examples() -> impl Iterator<Item = DocRef> {
    EXAMPLE_FILES.into_iter().map(|file| DocRef {
        kind: DocKind::Example,
        file,
    })
}

/// Find a guide or example by slug.
pub fn find(kind: DocKind, slug: &str) -> Option<DocRef> {
    let mut all: Box<dyn Iterator<Item = DocRef>> = match kind {
        DocKind::Guide => Box::new(guides()),
        DocKind::Example => Box::new(examples()),
    };
    all.find(|doc| doc.slug() == slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_strips_extension() {
        let doc = find(DocKind::Guide, "run-llm-locally").unwrap();
        assert_eq!(doc.file, "run-llm-locally.md");
        assert_eq!(doc.slug(), "run-llm-locally");
    }

    #[test]
    fn test_url_joins_base() {
        let doc = find(DocKind::Example, "analytics-dashboard").unwrap();
        assert_eq!(
            doc.url("https://cdn.example.com/examples"),
            "https://cdn.example.com/examples/analytics-dashboard.md"
        );
        assert_eq!(
            doc.url("https://cdn.example.com/examples/"),
            "https://cdn.example.com/examples/analytics-dashboard.md"
        );
    }

    #[test]
    fn test_find_respects_kind() {
        assert!(find(DocKind::Example, "get-started").is_none());
        assert!(find(DocKind::Guide, "nope").is_none());
    }

    #[test]
    fn test_lists_are_complete() {
        assert_eq!(guides().count(), GUIDE_FILES.len());
        assert!(examples().all(|d| d.kind == DocKind::Example));
    }
}
