//! Domain registry
//!
//! This module deduplicates the domains of a record stream and accumulates
//! per-domain statistics:
//! - Occurrence count and sample URLs
//! - First/last seen timestamps
//! - Naive TLD and subdomain depth

mod record;
mod stats;

pub use record::{parse_timestamp, JsonRecord, RecordFields, UrlRecord};
pub use stats::{DomainStats, DEFAULT_SAMPLE_URL_LIMIT};

use crate::url::{canonicalize_url, Domain};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::BufRead;

/// Counters for one JSONL ingestion pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    /// Non-blank lines read
    pub records_read: u64,

    /// Records that contributed a domain
    pub records_ingested: u64,

    /// Records without a usable URL
    pub records_skipped: u64,

    /// Lines that were not valid JSON
    pub malformed_lines: u64,
}

impl IngestStats {
    /// Adds the counters of another pass
    pub fn merge(&mut self, other: &IngestStats) {
        self.records_read += other.records_read;
        self.records_ingested += other.records_ingested;
        self.records_skipped += other.records_skipped;
        self.malformed_lines += other.malformed_lines;
    }
}

/// Deduplicating domain registry for one pipeline run
#[derive(Debug, Clone)]
pub struct DomainRegistry {
    domains: HashMap<Domain, DomainStats>,
    fields: RecordFields,
    sample_url_limit: usize,
    skipped: u64,
}

impl Default for DomainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainRegistry {
    /// Creates an empty registry reading the default record fields
    pub fn new() -> Self {
        Self::with_settings(RecordFields::default(), DEFAULT_SAMPLE_URL_LIMIT)
    }

    /// Creates an empty registry with custom record fields and sample cap
    pub fn with_settings(fields: RecordFields, sample_url_limit: usize) -> Self {
        Self {
            domains: HashMap::new(),
            fields,
            sample_url_limit,
            skipped: 0,
        }
    }

    /// Ingests a single record
    ///
    /// # Returns
    ///
    /// * `Some(Domain)` - The record's canonical domain, now counted
    /// * `None` - The record has no URL or the URL failed canonicalization
    pub fn ingest<R: UrlRecord + ?Sized>(&mut self, record: &R) -> Option<Domain> {
        let Some(raw_url) = record.url() else {
            self.skipped += 1;
            return None;
        };

        let domain = match canonicalize_url(raw_url) {
            Ok(domain) => domain,
            Err(e) => {
                tracing::trace!(url = raw_url, error = %e, "Skipping record");
                self.skipped += 1;
                return None;
            }
        };

        let limit = self.sample_url_limit;
        self.domains
            .entry(domain.clone())
            .or_insert_with(|| DomainStats::new(&domain))
            .record(raw_url, record.timestamp(), limit);

        Some(domain)
    }

    /// Streams JSONL records into the registry
    ///
    /// Blank lines are ignored. Malformed lines and records without a usable
    /// URL are counted and never abort the pass; only a read failure does.
    ///
    /// # Arguments
    ///
    /// * `reader` - The JSONL source
    /// * `max_records` - Stop after this many non-blank lines
    ///
    /// # Returns
    ///
    /// * `Ok(IngestStats)` - Counters for this pass
    /// * `Err(ComplianceError)` - The reader failed
    pub fn ingest_jsonl<R: BufRead>(
        &mut self,
        mut reader: R,
        max_records: Option<u64>,
    ) -> Result<IngestStats> {
        let mut stats = IngestStats::default();
        let fields = self.fields.clone();
        let mut line = Vec::new();

        loop {
            if max_records.is_some_and(|max| stats.records_read >= max) {
                tracing::debug!(max_records = ?max_records, "Record limit reached");
                break;
            }

            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            stats.records_read += 1;

            let record = match JsonRecord::from_slice(&line, &fields) {
                Ok(record) => record,
                Err(e) => {
                    tracing::trace!(line = stats.records_read, error = %e, "Malformed JSON line");
                    stats.malformed_lines += 1;
                    continue;
                }
            };

            if self.ingest(&record).is_some() {
                stats.records_ingested += 1;
            } else {
                stats.records_skipped += 1;
            }
        }

        tracing::debug!(
            records_read = stats.records_read,
            records_ingested = stats.records_ingested,
            records_skipped = stats.records_skipped,
            malformed_lines = stats.malformed_lines,
            "Ingestion pass finished"
        );

        Ok(stats)
    }

    /// Returns the deduplicated domain set in sorted order
    pub fn snapshot(&self) -> BTreeSet<Domain> {
        self.domains.keys().cloned().collect()
    }

    /// Returns domains by descending count, ties broken by name
    pub fn ranked(&self) -> Vec<(&Domain, &DomainStats)> {
        let mut ranked: Vec<_> = self.domains.iter().collect();
        ranked.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    /// Returns the statistics of one domain
    pub fn get(&self, domain: &str) -> Option<&DomainStats> {
        self.domains.get(domain)
    }

    /// Iterates over all domains and their statistics
    pub fn iter(&self) -> impl Iterator<Item = (&Domain, &DomainStats)> {
        self.domains.iter()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Total records counted across all domains
    pub fn total_urls(&self) -> u64 {
        self.domains.values().map(|stats| stats.count).sum()
    }

    /// Records rejected by [`DomainRegistry::ingest`] so far
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Number of domains per TLD
    pub fn tld_counts(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for stats in self.domains.values() {
            *counts.entry(stats.tld.clone()).or_insert(0) += 1;
        }
        counts
    }
}
