//! Content matcher: lexical relevance of catalog tools, guides and example
//! projects to a free-text query, plus a coarse guess at the asker's
//! experience level.
//!
//! Each query token scores a point when it occurs anywhere inside the
//! searchable text. The matcher never fails; the worst case is an empty
//! result.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ToolRecord};
use crate::guides::{EXAMPLE_FILES, GUIDE_FILES};

/// Maximum number of tools returned by [`match_query`].
pub const MAX_TOOL_MATCHES: usize = 8;

/// Score added when the query names a tool's category outright.
pub const CATEGORY_BONUS: usize = 5;

/// Tokens shorter than this are ignored.
const MIN_TOKEN_LEN: usize = 3;

/// Phrases that mark a beginner. Checked before [`EXPERT_PHRASES`].
pub const BEGINNER_PHRASES: [&str; 13] = [
    "new to",
    "beginner",
    "just started",
    "getting started",
    "help me understand",
    "first time",
    "i'm learning",
    "im learning",
    "learning to code",
    "what is",
    "explain like",
    "simple terms",
    "never used",
];

/// Phrases that mark an experienced developer.
pub const EXPERT_PHRASES: [&str; 12] = [
    "optimize",
    "architecture",
    "scalability",
    "scale",
    "performance",
    "production",
    "advanced",
    "best practices",
    "latency",
    "throughput",
    "concurrency",
    "distributed",
];

/// Inferred experience level of the person asking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserLevel {
    Beginner,
    #[default]
    Intermediate,
    Expert,
}

impl std::fmt::Display for UserLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserLevel::Beginner => write!(f, "beginner"),
            UserLevel::Intermediate => write!(f, "intermediate"),
            UserLevel::Expert => write!(f, "expert"),
        }
    }
}

/// A catalog tool together with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolMatch {
    pub tool: ToolRecord,
    pub score: usize,
}

/// Everything the matcher found for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchResult {
    /// At most [`MAX_TOOL_MATCHES`] tools, best first.
    pub tools: Vec<ToolMatch>,
    /// Matching guide file names, best first.
    pub guides: Vec<&'static str>,
    /// Matching example-project file names, best first.
    pub examples: Vec<&'static str>,
    pub level: UserLevel,
}

impl MatchResult {
    /// Names of the matched tools, best first.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|m| m.tool.name.clone()).collect()
    }
}

/// Split a lower-cased query into word tokens of at least three characters.
pub fn tokenize(query_lower: &str) -> Vec<&str> {
    query_lower
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= MIN_TOKEN_LEN)
        .collect()
}

/// Score one tool against the query tokens.
///
/// `query_lower` is the whole lower-cased query, used for the category bonus.
pub fn score_tool(tokens: &[&str], query_lower: &str, tool: &ToolRecord) -> usize {
    let mut haystack = format!("{} {} {}", tool.name, tool.description, tool.category);
    for tag in &tool.tags {
        haystack.push(' ');
        haystack.push_str(tag);
    }
    let haystack = haystack.to_lowercase();

    let overlap = tokens.iter().filter(|t| haystack.contains(**t)).count();

    let category = tool.category.to_lowercase();
    let names_category = !query_lower.trim().is_empty()
        && !category.is_empty()
        && query_lower.contains(&category);

    if names_category {
        overlap + CATEGORY_BONUS
    } else {
        overlap
    }
}

/// Classify the asker's level from fixed phrase lists. Beginner wins ties.
pub fn detect_level(query_lower: &str) -> UserLevel {
    if BEGINNER_PHRASES.iter().any(|p| query_lower.contains(p)) {
        UserLevel::Beginner
    } else if EXPERT_PHRASES.iter().any(|p| query_lower.contains(p)) {
        UserLevel::Expert
    } else {
        UserLevel::Intermediate
    }
}

/// Rank catalog tools, guides, and examples for `query`.
pub fn match_query(query: &str, catalog: &Catalog) -> MatchResult {
    let query_lower = query.to_lowercase();
    let tokens = tokenize(&query_lower);

    let mut tools: Vec<ToolMatch> = catalog
        .tools()
        .iter()
        .filter_map(|tool| {
            let score = score_tool(&tokens, &query_lower, tool);
            (score > 0).then(|| ToolMatch {
                tool: tool.clone(),
                score,
            })
        })
        .collect();
    // `sort_by` is stable, so ties keep catalog order.
    tools.sort_by(|a, b| b.score.cmp(&a.score));
    tools.truncate(MAX_TOOL_MATCHES);

    MatchResult {
        tools,
        guides: rank_names(&tokens, &GUIDE_FILES),
        examples: rank_names(&tokens, &EXAMPLE_FILES),
        level: detect_level(&query_lower),
    }
}

fn rank_names(tokens: &[&str], names: &[&'static str]) -> Vec<&'static str> {
    let mut scored: Vec<(&'static str, usize)> = names
        .iter()
        .map(|name| (*name, tokens.iter().filter(|t| name.contains(**t)).count()))
        .filter(|(_, score)| *score > 0)
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().map(|(name, _)| name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ToolStatus;
    use pretty_assertions::assert_eq;

    fn tool(name: &str, category: &str, tags: &[&str]) -> ToolRecord {
        ToolRecord {
            id: name.to_lowercase(),
            name: name.to_string(),
            description: String::new(),
            category: category.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            status: ToolStatus::Free,
            link: String::new(),
            tutorial: None,
            example_project_link: None,
            popularity: None,
            logo: None,
        }
    }

    #[test]
    fn test_tokenize_drops_short_tokens() {
        assert_eq!(
            tokenize("how do i use an api, e.g. supabase?"),
            vec!["how", "use", "api", "supabase"]
        );
        assert!(tokenize("a an to").is_empty());
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_tokenize_keeps_underscores() {
        assert_eq!(tokenize("gpt_oss model"), vec!["gpt_oss", "model"]);
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        let catalog = Catalog::new(vec![tool("Supabase", "Backend", &["db"])]);
        let result = match_query("", &catalog);
        assert!(result.tools.is_empty());
        assert!(result.guides.is_empty());
        assert!(result.examples.is_empty());
        assert_eq!(result.level, UserLevel::Intermediate);
    }

    #[test]
    fn test_short_tokens_are_ignored() {
        let catalog = Catalog::new(vec![tool("Go", "Go", &["go"])]);
        let result = match_query("go to it", &catalog);
        // "go" is too short to be a token; only the category bonus applies.
        assert_eq!(result.tools.len(), 1);
        assert_eq!(result.tools[0].score, CATEGORY_BONUS);

        let catalog = Catalog::new(vec![tool("Deno", "Runtime", &["js"])]);
        assert!(match_query("is it ok", &catalog).tools.is_empty());
    }

    #[test]
    fn test_scores_count_every_query_token() {
        let t = tool("Supabase", "Backend", &["postgres", "auth"]);
        let tokens = tokenize("supabase postgres supabase");
        assert_eq!(score_tool(&tokens, "supabase postgres supabase", &t), 3);
    }

    #[test]
    fn test_category_bonus_outranks_tag_overlap() {
        let catalog = Catalog::new(vec![
            tool("Plausible", "Privacy", &["analytics"]),
            tool("PostHog", "Analytics", &["product"]),
        ]);
        let result = match_query("analytics for my app", &catalog);
        assert_eq!(result.tools[0].tool.name, "PostHog");
        assert_eq!(result.tools[0].score, 1 + CATEGORY_BONUS);
        assert_eq!(result.tools[1].score, 1);
    }

    #[test]
    fn test_results_capped_and_sorted() {
        let tools = (0..12)
            .map(|i| {
                let tags: Vec<&str> = if i % 2 == 0 {
                    vec!["hosting", "deploy"]
                } else {
                    vec!["hosting"]
                };
                tool(&format!("Host{i}"), "Cloud", &tags)
            })
            .collect();
        let catalog = Catalog::new(tools);
        let result = match_query("hosting deploy", &catalog);
        assert_eq!(result.tools.len(), MAX_TOOL_MATCHES);
        assert!(result.tools.windows(2).all(|w| w[0].score >= w[1].score));
        // Stable: the best-scoring tools keep catalog order.
        assert_eq!(result.tools[0].tool.name, "Host0");
        assert_eq!(result.tools[1].tool.name, "Host2");
    }

    #[test]
    fn test_guides_and_examples_ranked_by_overlap() {
        let result = match_query("supabase dashboard", &Catalog::default());
        assert_eq!(result.guides, vec!["connect-supabase-vercel.md"]);
        assert_eq!(
            result.examples,
            vec![
                "ai-chatbot-with-supabase.md",
                "analytics-dashboard.md",
                "personal-dashboard.md",
            ]
        );
    }

    #[test]
    fn test_beginner_scenario() {
        let result = match_query(
            "help me understand how does supabase work",
            &Catalog::default(),
        );
        assert_eq!(result.level, UserLevel::Beginner);
        assert!(result.guides.contains(&"connect-supabase-vercel.md"));
    }

    #[test]
    fn test_expert_scenario() {
        assert_eq!(
            detect_level("optimize my api architecture"),
            UserLevel::Expert
        );
    }

    #[test]
    fn test_beginner_takes_precedence() {
        assert_eq!(
            detect_level("i'm new to this, how do i optimize performance?"),
            UserLevel::Beginner
        );
    }

    #[test]
    fn test_default_level_is_intermediate() {
        assert_eq!(detect_level("compare stripe and paystack"), UserLevel::Intermediate);
    }

    #[test]
    fn test_tool_names() {
        let catalog = Catalog::new(vec![tool("Stripe", "Payments", &["billing"])]);
        let result = match_query("billing", &catalog);
        assert_eq!(result.tool_names(), vec!["Stripe".to_string()]);
    }
}
