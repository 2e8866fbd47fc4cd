//! Robots.txt handling module
//!
//! This module parses robots.txt bodies into per-agent rule groups and
//! evaluates them for whole-domain crawlability, including the restrictions
//! aimed at AI-training crawlers.

mod evaluator;
mod parser;

pub use evaluator::{ai_restriction, evaluate, evaluate_path, AiRestriction, Verdict};
pub use parser::{Directive, RobotsDirectives, Rule, RuleGroup};

/// Maximum number of robots.txt bytes that are parsed; the rest is discarded
pub const MAX_ROBOTS_BYTES: usize = 1024 * 1024;

/// Agent token of the generic group
pub const WILDCARD_AGENT: &str = "*";

/// Crawlers that collect content for AI training or AI answers
pub const DEFAULT_AI_AGENTS: &[&str] = &[
    "GPTBot",
    "ChatGPT-User",
    "ClaudeBot",
    "anthropic-ai",
    "CCBot",
    "Google-Extended",
    "PerplexityBot",
    "Bytespider",
];

/// Reduces a user-agent value to the lowercase product token used for matching
///
/// `Googlebot/2.1 (+http://www.google.com/bot.html)` becomes `googlebot`.
pub fn normalize_agent_token(value: &str) -> String {
    value
        .trim()
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}
