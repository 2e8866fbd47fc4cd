//! Compliance evaluation over parsed robots.txt directives
//!
//! Both entry points are pure functions of their inputs: evaluating the same
//! directives with the same agent list always yields the same verdict.

use crate::robots::{RobotsDirectives, RuleGroup};
use serde::Serialize;

/// Crawlability verdict for one agent identity
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verdict {
    /// Whether the evaluated path may be crawled
    pub crawlable: bool,

    /// Crawl delay of the authoritative group, in seconds
    pub crawl_delay: Option<f64>,
}

impl Verdict {
    fn unrestricted() -> Self {
        Self {
            crawlable: true,
            crawl_delay: None,
        }
    }
}

/// Outcome of checking the AI-agent block-list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AiRestriction {
    /// True if at least one AI agent is denied the root path
    pub restricted: bool,

    /// AI agent tokens that are denied, in block-list order
    pub blocked_agents: Vec<String>,
}

/// Evaluates whole-domain crawlability (path `/`) for an agent identity
///
/// Agent tokens are tried in order, most specific first; the first token
/// that has a group decides. Without a match the `*` group decides, and
/// without a `*` group the domain is crawlable.
///
/// # Arguments
///
/// * `directives` - The parsed robots.txt
/// * `agent_tokens` - Agent tokens in priority order (may be empty)
///
/// # Examples
///
/// ```
/// use robots_gate::robots::{evaluate, RobotsDirectives};
///
/// let robots = RobotsDirectives::parse("User-agent: *\nDisallow: /private");
/// let verdict = evaluate(&robots, &["MyBot"]);
/// assert!(verdict.crawlable);
/// ```
pub fn evaluate<S: AsRef<str>>(directives: &RobotsDirectives, agent_tokens: &[S]) -> Verdict {
    evaluate_path(directives, agent_tokens, "/")
}

/// Evaluates an arbitrary path with the same agent resolution as [`evaluate`]
pub fn evaluate_path<S: AsRef<str>>(
    directives: &RobotsDirectives,
    agent_tokens: &[S],
    path: &str,
) -> Verdict {
    match resolve_group(directives, agent_tokens) {
        Some(group) => Verdict {
            crawlable: group.is_allowed(path),
            crawl_delay: group.crawl_delay,
        },
        None => Verdict::unrestricted(),
    }
}

/// Checks the root path once per AI agent token
///
/// Each token is evaluated on its own, so a token without a dedicated group
/// falls back to the `*` group. The result is independent of the generic
/// verdict.
pub fn ai_restriction<S: AsRef<str>>(
    directives: &RobotsDirectives,
    ai_tokens: &[S],
) -> AiRestriction {
    let blocked_agents: Vec<String> = ai_tokens
        .iter()
        .map(AsRef::as_ref)
        .filter(|token| !evaluate(directives, &[*token]).crawlable)
        .map(str::to_string)
        .collect();

    AiRestriction {
        restricted: !blocked_agents.is_empty(),
        blocked_agents,
    }
}

fn resolve_group<'a, S: AsRef<str>>(
    directives: &'a RobotsDirectives,
    agent_tokens: &[S],
) -> Option<&'a RuleGroup> {
    agent_tokens
        .iter()
        .find_map(|token| directives.group_for(token.as_ref()))
        .or_else(|| directives.wildcard_group())
}
