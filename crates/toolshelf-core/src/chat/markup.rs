//! Lightweight markdown stripping for plain-text replies.
//!
//! Models sometimes ignore the plain-text instruction. This removes the
//! common artifacts: code fences, inline code, links, bold, italics and
//! headers. Links keep their target as `text (url)`.

use std::sync::LazyLock;

use regex::Regex;

/// Rewrite rules, applied in order. Fences run before inline code so their
/// backticks are not paired up across lines.
const RULES: [(&str, &str); 8] = [
    (r"(?s)```[\w+-]*[ \t]*\n?(.*?)```", "$1"),
    (r"`([^`\n]+)`", "$1"),
    (r"\[([^\]\n]+)\]\(([^)\s]+)\)", "$1 ($2)"),
    (r"\*\*([^*\n]+)\*\*", "$1"),
    (r"__([^_\n]+)__", "$1"),
    (r"\*([^*\n]+)\*", "$1"),
    // Word boundaries keep snake_case identifiers intact.
    (r"\b_([^_\n]+)_\b", "$1"),
    (r"(?m)^[ \t]*#{1,6}[ \t]+", ""),
];

static COMPILED: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    RULES
        .iter()
        .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, *replacement)))
        .collect()
});

/// Remove markdown artifacts from `text`.
pub fn strip_markup(text: &str) -> String {
    let stripped = COMPILED
        .iter()
        .fold(text.to_string(), |acc, (re, replacement)| {
            re.replace_all(&acc, *replacement).into_owned()
        });
    stripped.trim().to_string()
}
