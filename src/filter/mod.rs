//! Record filter
//!
//! Streams corpus records and routes each one, byte for byte, to either the
//! kept or the rejected output according to its domain's label. Anything
//! uncertain is rejected.

use crate::checker::DomainLabel;
use crate::registry::{JsonRecord, RecordFields, UrlRecord};
use crate::url::{canonicalize_url, Domain};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::{BufRead, Write};
use std::sync::Arc;

/// Read-only domain → label map shared by filter instances
pub type LabelMap = Arc<HashMap<Domain, DomainLabel>>;

/// Why a record was kept or rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterReason {
    LabeledAllow,
    LabeledDeny,
    UnknownDomain,
    UnparseableUrl,
}

impl FilterReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LabeledAllow => "labeled-allow",
            Self::LabeledDeny => "labeled-deny",
            Self::UnknownDomain => "unknown-domain",
            Self::UnparseableUrl => "unparseable-url",
        }
    }
}

impl fmt::Display for FilterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-record routing decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDecision {
    pub kept: bool,
    pub reason: FilterReason,

    /// The record's domain, when its URL could be canonicalized
    pub domain: Option<Domain>,
}

impl FilterDecision {
    fn new(reason: FilterReason, domain: Option<Domain>) -> Self {
        Self {
            kept: reason == FilterReason::LabeledAllow,
            reason,
            domain,
        }
    }
}

/// Rejection counts by reason
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RejectionReasons {
    pub unknown_domain: u64,
    pub labeled_deny: u64,
    pub unparseable_url: u64,
}

/// Counters for one or more filtering passes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    pub total: u64,
    pub kept: u64,
    pub rejected: u64,
    pub reasons: RejectionReasons,
}

impl FilterStats {
    /// Counts one decision
    pub fn record(&mut self, decision: &FilterDecision) {
        self.total += 1;
        if decision.kept {
            self.kept += 1;
            return;
        }

        self.rejected += 1;
        match decision.reason {
            FilterReason::UnknownDomain => self.reasons.unknown_domain += 1,
            FilterReason::LabeledDeny => self.reasons.labeled_deny += 1,
            FilterReason::UnparseableUrl => self.reasons.unparseable_url += 1,
            FilterReason::LabeledAllow => {}
        }
    }

    /// Adds the counters of another pass
    pub fn merge(&mut self, other: &FilterStats) {
        self.total += other.total;
        self.kept += other.kept;
        self.rejected += other.rejected;
        self.reasons.unknown_domain += other.reasons.unknown_domain;
        self.reasons.labeled_deny += other.reasons.labeled_deny;
        self.reasons.unparseable_url += other.reasons.unparseable_url;
    }

    /// Percentage of records kept; 0 when nothing was read
    pub fn retention_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.kept as f64 / self.total as f64 * 100.0
        }
    }
}

/// Applies a domain label map to records
#[derive(Debug, Clone)]
pub struct RecordFilter {
    labels: LabelMap,
    fields: RecordFields,
}

impl RecordFilter {
    /// Creates a filter reading the default `url` field
    pub fn new(labels: LabelMap) -> Self {
        Self::with_fields(labels, RecordFields::default())
    }

    pub fn with_fields(labels: LabelMap, fields: RecordFields) -> Self {
        Self { labels, fields }
    }

    /// Decides whether a record is kept
    ///
    /// # Decision Table
    ///
    /// | Record | Kept | Reason |
    /// |--------|------|--------|
    /// | No URL, or URL fails canonicalization | no | unparseable-url |
    /// | Domain not in the label map | no | unknown-domain |
    /// | Domain labeled 0 | no | labeled-deny |
    /// | Domain labeled 1 | yes | labeled-allow |
    pub fn decide<R: UrlRecord + ?Sized>(&self, record: &R) -> FilterDecision {
        let Some(domain) = record.url().and_then(|url| canonicalize_url(url).ok()) else {
            return FilterDecision::new(FilterReason::UnparseableUrl, None);
        };

        let reason = match self.labels.get(&domain) {
            Some(DomainLabel::Crawlable) => FilterReason::LabeledAllow,
            Some(DomainLabel::Blocked) => FilterReason::LabeledDeny,
            None => FilterReason::UnknownDomain,
        };
        FilterDecision::new(reason, Some(domain))
    }

    /// Streams JSONL records into the kept and rejected outputs
    ///
    /// Every non-blank input line goes verbatim, newline included, to exactly
    /// one output. Lines that are not JSON are rejected as unparseable.
    ///
    /// # Returns
    ///
    /// * `Ok(FilterStats)` - Counters for this pass
    /// * `Err(ComplianceError)` - Reading or writing failed
    pub fn filter_jsonl<R, K, J>(&self, mut reader: R, kept: &mut K, rejected: &mut J) -> Result<FilterStats>
    where
        R: BufRead,
        K: Write,
        J: Write,
    {
        let mut stats = FilterStats::default();
        let mut line = Vec::new();

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let decision = match JsonRecord::from_slice(&line, &self.fields) {
                Ok(record) => self.decide(&record),
                Err(_) => FilterDecision::new(FilterReason::UnparseableUrl, None),
            };

            if decision.kept {
                kept.write_all(&line)?;
            } else {
                tracing::trace!(reason = %decision.reason, domain = ?decision.domain, "Record rejected");
                rejected.write_all(&line)?;
            }
            stats.record(&decision);
        }

        kept.flush()?;
        rejected.flush()?;

        tracing::debug!(
            total = stats.total,
            kept = stats.kept,
            rejected = stats.rejected,
            "Filter pass finished"
        );

        Ok(stats)
    }
}
