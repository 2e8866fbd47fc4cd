//! Robots.txt parser implementation
//!
//! Parsing is line oriented and never fails: lines that cannot be understood
//! are skipped, so a broken file degrades to "no restriction found".

use crate::robots::{normalize_agent_token, MAX_ROBOTS_BYTES, WILDCARD_AGENT};
use std::collections::HashMap;

/// Kind of path rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    Allow,
    Disallow,
}

/// A single Allow/Disallow rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub directive: Directive,
    pub pattern: String,
}

impl Rule {
    pub fn new(directive: Directive, pattern: impl Into<String>) -> Self {
        Self {
            directive,
            pattern: pattern.into(),
        }
    }

    /// Checks whether the rule's pattern matches the given path
    ///
    /// Patterns are anchored at the start of the path. `*` matches any
    /// sequence of characters and a trailing `$` anchors the end of the path.
    pub fn matches(&self, path: &str) -> bool {
        let (pattern, anchored) = match self.pattern.strip_suffix('$') {
            Some(stripped) => (stripped, true),
            None => (self.pattern.as_str(), false),
        };
        let path = path.as_bytes();

        // Every path length that the pattern consumed so far, ascending
        let mut positions: Vec<usize> = vec![0];
        for &c in pattern.as_bytes() {
            if c == b'*' {
                positions = (positions[0]..=path.len()).collect();
            } else {
                positions.retain(|&pos| pos < path.len() && path[pos] == c);
                if positions.is_empty() {
                    return false;
                }
                for pos in positions.iter_mut() {
                    *pos += 1;
                }
            }
        }

        if anchored {
            positions.contains(&path.len())
        } else {
            true
        }
    }

    /// Length used to rank matching rules; longer is more specific
    pub fn specificity(&self) -> usize {
        self.pattern.len()
    }
}

/// Rules and crawl delay that apply to one agent token
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleGroup {
    /// Rules in file order
    pub rules: Vec<Rule>,

    /// Requested delay between requests, in seconds
    pub crawl_delay: Option<f64>,
}

impl RuleGroup {
    /// Decides whether a path is allowed by this group
    ///
    /// The longest matching pattern wins. When an Allow and a Disallow
    /// pattern of the same length both match, Allow wins. A path that no
    /// rule matches is allowed.
    pub fn is_allowed(&self, path: &str) -> bool {
        let mut best: Option<&Rule> = None;

        for rule in self.rules.iter().filter(|rule| rule.matches(path)) {
            best = match best {
                None => Some(rule),
                Some(current) => {
                    let longer = rule.specificity() > current.specificity();
                    let allow_tie = rule.specificity() == current.specificity()
                        && rule.directive == Directive::Allow;
                    if longer || allow_tie {
                        Some(rule)
                    } else {
                        Some(current)
                    }
                }
            };
        }

        best.map_or(true, |rule| rule.directive == Directive::Allow)
    }
}

/// Parsed robots.txt content
///
/// Groups are keyed by the lowercase product token; `*` is the generic group.
/// Groups naming the same token in different places of the file are merged.
#[derive(Debug, Clone, Default)]
pub struct RobotsDirectives {
    groups: HashMap<String, RuleGroup>,
    sitemaps: Vec<String>,
    truncated: bool,
}

impl RobotsDirectives {
    /// Creates directives with no groups, which allow everything
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Parses a raw robots.txt body
    ///
    /// Bodies longer than [`MAX_ROBOTS_BYTES`] are truncated before parsing;
    /// invalid UTF-8 is replaced rather than rejected.
    pub fn parse_bytes(body: &[u8]) -> Self {
        let truncated = body.len() > MAX_ROBOTS_BYTES;
        let body = &body[..body.len().min(MAX_ROBOTS_BYTES)];
        let text = String::from_utf8_lossy(body);

        let mut directives = Self::parse(&text);
        directives.truncated = truncated;
        directives
    }

    /// Parses robots.txt text
    ///
    /// # Grouping
    ///
    /// - Consecutive `User-agent` lines open one group
    /// - `Allow`, `Disallow` and `Crawl-delay` lines attach to the open group
    /// - A `User-agent` line after rules opens a new group
    /// - A blank line after rules closes the group; rules that follow before
    ///   the next `User-agent` line are ignored
    ///
    /// Field names are case-insensitive, `#` starts a comment and unknown
    /// fields are ignored. An empty `Disallow:` adds no rule.
    pub fn parse(body: &str) -> Self {
        let body = body.strip_prefix('\u{feff}').unwrap_or(body);
        if body.len() > MAX_ROBOTS_BYTES {
            let mut end = MAX_ROBOTS_BYTES;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            let mut directives = Self::parse(&body[..end]);
            directives.truncated = true;
            return directives;
        }

        let mut groups: HashMap<String, RuleGroup> = HashMap::new();
        let mut sitemaps = Vec::new();
        let mut current_agents: Vec<String> = Vec::new();
        let mut group_has_rules = false;

        for (index, raw_line) in body.lines().enumerate() {
            if raw_line.trim().is_empty() {
                if group_has_rules {
                    current_agents.clear();
                    group_has_rules = false;
                }
                continue;
            }

            let line = match raw_line.split_once('#') {
                Some((content, _comment)) => content.trim(),
                None => raw_line.trim(),
            };
            if line.is_empty() {
                continue;
            }

            let Some((field, value)) = line.split_once(':') else {
                tracing::trace!(line = index + 1, "Skipping robots.txt line without a field");
                continue;
            };
            let field = field.trim().to_ascii_lowercase();
            let value = value.trim();

            match field.as_str() {
                "user-agent" => {
                    if group_has_rules {
                        current_agents.clear();
                        group_has_rules = false;
                    }
                    let token = normalize_agent_token(value);
                    if token.is_empty() {
                        continue;
                    }
                    groups.entry(token.clone()).or_default();
                    if !current_agents.contains(&token) {
                        current_agents.push(token);
                    }
                }
                "allow" | "disallow" => {
                    if current_agents.is_empty() {
                        tracing::trace!(line = index + 1, "Ignoring rule outside of a group");
                        continue;
                    }
                    group_has_rules = true;
                    if value.is_empty() {
                        continue;
                    }
                    let directive = if field == "allow" {
                        Directive::Allow
                    } else {
                        Directive::Disallow
                    };
                    for agent in &current_agents {
                        if let Some(group) = groups.get_mut(agent) {
                            group.rules.push(Rule::new(directive, value));
                        }
                    }
                }
                "crawl-delay" => {
                    if current_agents.is_empty() {
                        continue;
                    }
                    group_has_rules = true;
                    let Some(delay) = parse_crawl_delay(value) else {
                        tracing::trace!(line = index + 1, value, "Ignoring invalid crawl-delay");
                        continue;
                    };
                    for agent in &current_agents {
                        if let Some(group) = groups.get_mut(agent) {
                            group.crawl_delay.get_or_insert(delay);
                        }
                    }
                }
                "sitemap" => {
                    if !value.is_empty() {
                        sitemaps.push(value.to_string());
                    }
                }
                _ => {
                    // Unknown fields (Host, Clean-param, ...) are ignored
                }
            }
        }

        Self {
            groups,
            sitemaps,
            truncated: false,
        }
    }

    /// Returns the group for an agent token, matched case-insensitively
    pub fn group_for(&self, agent: &str) -> Option<&RuleGroup> {
        self.groups.get(&normalize_agent_token(agent))
    }

    /// Returns the generic (`*`) group, if present
    pub fn wildcard_group(&self) -> Option<&RuleGroup> {
        self.groups.get(WILDCARD_AGENT)
    }

    /// Returns the agent tokens that have a group, sorted
    pub fn agents(&self) -> Vec<&str> {
        let mut agents: Vec<&str> = self.groups.keys().map(String::as_str).collect();
        agents.sort_unstable();
        agents
    }

    /// Returns the Sitemap URLs listed in the file
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }

    /// Returns true if no group was found
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns true if the body exceeded [`MAX_ROBOTS_BYTES`]
    pub fn was_truncated(&self) -> bool {
        self.truncated
    }
}

fn parse_crawl_delay(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|delay| delay.is_finite() && *delay >= 0.0)
}
