use crate::url::{extract_tld, subdomain_depth, Domain};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Default number of sample URLs kept per domain
pub const DEFAULT_SAMPLE_URL_LIMIT: usize = 5;

/// Accumulated statistics for one domain
///
/// Only the registry mutates these, during ingestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainStats {
    /// Number of records that resolved to this domain
    pub count: u64,

    /// Top-level domain (last label only)
    pub tld: String,

    /// Labels in front of the registrable domain
    pub subdomain_depth: u32,

    /// First few URLs seen, in insertion order
    pub sample_urls: Vec<String>,

    /// Earliest record timestamp
    pub first_seen: Option<DateTime<Utc>>,

    /// Latest record timestamp
    pub last_seen: Option<DateTime<Utc>>,
}

impl DomainStats {
    pub(crate) fn new(domain: &Domain) -> Self {
        Self {
            count: 0,
            tld: extract_tld(domain.as_str()).to_string(),
            subdomain_depth: subdomain_depth(domain.as_str()),
            sample_urls: Vec::new(),
            first_seen: None,
            last_seen: None,
        }
    }

    /// Records one more occurrence of the domain
    pub(crate) fn record(
        &mut self,
        url: &str,
        timestamp: Option<DateTime<Utc>>,
        sample_url_limit: usize,
    ) {
        self.count += 1;

        if self.sample_urls.len() < sample_url_limit {
            self.sample_urls.push(url.trim().to_string());
        }

        if let Some(ts) = timestamp {
            if self.first_seen.map_or(true, |first| ts < first) {
                self.first_seen = Some(ts);
            }
            if self.last_seen.map_or(true, |last| ts > last) {
                self.last_seen = Some(ts);
            }
        }
    }
}
