//! System prompt templates.
//!
//! Three templates are keyed by the asker's level. Each is followed by the
//! shared formatting rules, the full tools context, and a summary of what the
//! matcher found for the current question.

use crate::matcher::{MatchResult, UserLevel};

const DEFAULT_PREAMBLE: &str = "\
You are a friendly assistant for a catalog of developer and AI tools. Help people \
pick tools, plan what to build, and find the right guide or example project.

When answering:
1. Be warm and conversational, like a helpful colleague.
2. Break problems into clear steps with practical examples.
3. Recommend tools from the catalog below and include their links.
4. Point to related guides and example projects when they fit the question.
5. Compare options with their trade-offs when there is more than one.
6. Be honest about limitations. Ask a short clarifying question when unsure.";

const BEGINNER_PREAMBLE: &str = "\
You are a patient teacher helping someone who is new to building software. \
Make every idea approachable and never intimidating.

When explaining:
1. Use everyday analogies before technical detail.
2. Go one small step at a time and say what each step achieves.
3. Avoid jargon, or define it in plain words the first time it appears.
4. Prefer tools from the catalog below that are free and easy to start with.
5. Suggest a guide or example project as a concrete next step.
6. Encourage the learner and treat confusion as a normal part of learning.";

const TECHNICAL_PREAMBLE: &str = "\
You are an expert engineer advising an experienced developer. Be precise and \
complete without padding.

When answering:
1. Give concrete code or configuration, indented with plain spaces.
2. Cover failure modes, error handling, and security implications.
3. Discuss performance, scalability, and architectural trade-offs.
4. Reference official documentation with full URLs in parentheses.
5. Compare catalog tools against each other and name their limits.
6. Suggest how to test, observe, and debug the result in production.";

const FORMATTING_RULES: &str = "\
Formatting rules:
- Reply in plain text only. Do not use markdown.
- Do not wrap words in ** or * for emphasis. Use \"quotes\" or CAPITALS instead.
- Do not start lines with # to make headers.
- Do not write links as [text](url). Write the text, then the full URL in parentheses.
- Use simple dashes (-) or numbers (1., 2.) for lists.
- Indent code with regular spaces instead of code fences.";

const RELAY_INSTRUCTIONS: &str = "\
Instructions:
- Answer based ONLY on the tools context when relevant.
- Be concise and practical. Prefer bullet points and numbered steps.
- Include links if available in the context. If a tool is missing, say so and suggest close alternatives.
- Avoid speculation. If unsure, ask a brief clarifying question.";

/// Which of the three templates to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    Default,
    Beginner,
    Technical,
}

impl PromptTemplate {
    pub fn for_level(level: UserLevel) -> Self {
        match level {
            UserLevel::Beginner => PromptTemplate::Beginner,
            UserLevel::Intermediate => PromptTemplate::Default,
            UserLevel::Expert => PromptTemplate::Technical,
        }
    }

    fn preamble(self) -> &'static str {
        match self {
            PromptTemplate::Default => DEFAULT_PREAMBLE,
            PromptTemplate::Beginner => BEGINNER_PREAMBLE,
            PromptTemplate::Technical => TECHNICAL_PREAMBLE,
        }
    }
}

/// Build the system prompt for one turn.
pub fn compose_system_prompt(tools_context: &str, matched: &MatchResult) -> String {
    let template = PromptTemplate::for_level(matched.level);
    format!(
        "{preamble}\n\n{rules}\n\nContext (tools database):\n{tools_context}\n\n{related}",
        preamble = template.preamble(),
        rules = FORMATTING_RULES,
        related = related_summary(matched),
    )
}

/// Prompt the relay uses when the client sends none of its own.
pub fn relay_system_prompt(tools_context: &str) -> String {
    format!(
        "You are the AI assistant for a catalog of developer and AI tools.\n\n\
         Context (tools database):\n{tools_context}\n\n{RELAY_INSTRUCTIONS}"
    )
}

fn related_summary(matched: &MatchResult) -> String {
    let tools = matched.tool_names();
    format!(
        "Related to this question:\n\
         - Tools: {tools}\n\
         - Guides: {guides}\n\
         - Example projects: {examples}\n\
         - Experience level: {level}",
        tools = list_or_none(&tools),
        guides = list_or_none(&matched.guides),
        examples = list_or_none(&matched.examples),
        level = matched.level,
    )
}

fn list_or_none<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", ")
    }
}
