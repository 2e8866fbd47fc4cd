//! Check results and domain labels

use crate::checker::Scheme;
use crate::url::Domain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Error text recorded for domains that were never checked
pub const CANCELLED_ERROR: &str = "check cancelled";

/// Scheme whose response decided the result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchedScheme {
    Https,
    Http,
    None,
}

impl From<Scheme> for FetchedScheme {
    fn from(scheme: Scheme) -> Self {
        match scheme {
            Scheme::Https => Self::Https,
            Scheme::Http => Self::Http,
        }
    }
}

/// Binary crawl label of a domain, serialized as `1` or `0`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum DomainLabel {
    Blocked = 0,
    Crawlable = 1,
}

impl DomainLabel {
    pub fn is_crawlable(&self) -> bool {
        matches!(self, Self::Crawlable)
    }
}

impl From<bool> for DomainLabel {
    fn from(crawlable: bool) -> Self {
        if crawlable {
            Self::Crawlable
        } else {
            Self::Blocked
        }
    }
}

impl From<DomainLabel> for u8 {
    fn from(label: DomainLabel) -> Self {
        label as u8
    }
}

impl TryFrom<u8> for DomainLabel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Blocked),
            1 => Ok(Self::Crawlable),
            other => Err(format!("invalid domain label {}, expected 0 or 1", other)),
        }
    }
}

impl fmt::Display for DomainLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Outcome of checking one domain's robots.txt
///
/// Created once per domain by the checker and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotsCheckResult {
    pub domain: Domain,
    pub fetched_scheme: FetchedScheme,

    /// Last HTTP status seen, if any response arrived
    pub http_status: Option<u16>,

    /// Last robots.txt URL attempted
    pub robots_url: Option<String>,

    /// True if a robots.txt body was fetched and parsed
    pub robots_exists: bool,

    pub crawlable_generic: bool,
    pub crawl_delay_seconds: Option<f64>,
    pub ai_restricted: bool,

    /// AI agent tokens denied the root path
    #[serde(default)]
    pub ai_agents_blocked: Vec<String>,

    #[serde(default)]
    pub sitemaps: Vec<String>,

    pub error: Option<String>,
    pub response_time_ms: u64,
    pub checked_at: DateTime<Utc>,
}

impl RobotsCheckResult {
    /// Result for a domain the run never started
    pub fn cancelled(domain: Domain) -> Self {
        Self {
            domain,
            fetched_scheme: FetchedScheme::None,
            http_status: None,
            robots_url: None,
            robots_exists: false,
            crawlable_generic: false,
            crawl_delay_seconds: None,
            ai_restricted: false,
            ai_agents_blocked: Vec::new(),
            sitemaps: Vec::new(),
            error: Some(CANCELLED_ERROR.to_string()),
            response_time_ms: 0,
            checked_at: Utc::now(),
        }
    }

    /// The label derived from the generic verdict
    pub fn label(&self) -> DomainLabel {
        DomainLabel::from(self.crawlable_generic)
    }
}

/// All results of one checker run, keyed by domain
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    results: BTreeMap<Domain, RobotsCheckResult>,
}

impl CheckReport {
    /// Builds a report from individual results; a later result for the same
    /// domain replaces an earlier one
    pub fn from_results<I: IntoIterator<Item = RobotsCheckResult>>(results: I) -> Self {
        Self {
            results: results
                .into_iter()
                .map(|result| (result.domain.clone(), result))
                .collect(),
        }
    }

    /// The domain → label map consumed by the record filter
    pub fn labels(&self) -> HashMap<Domain, DomainLabel> {
        self.results
            .iter()
            .map(|(domain, result)| (domain.clone(), result.label()))
            .collect()
    }

    /// Results sorted by domain
    pub fn results(&self) -> impl Iterator<Item = &RobotsCheckResult> {
        self.results.values()
    }

    pub fn get(&self, domain: &str) -> Option<&RobotsCheckResult> {
        self.results.get(domain)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn crawlable_count(&self) -> usize {
        self.results().filter(|r| r.crawlable_generic).count()
    }

    pub fn blocked_count(&self) -> usize {
        self.len() - self.crawlable_count()
    }

    pub fn ai_restricted_count(&self) -> usize {
        self.results().filter(|r| r.ai_restricted).count()
    }

    pub fn cancelled_count(&self) -> usize {
        self.results()
            .filter(|r| r.error.as_deref().is_some_and(|e| e.ends_with(CANCELLED_ERROR)))
            .count()
    }
}
