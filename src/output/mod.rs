//! Output module for reports and record files
//!
//! This module handles:
//! - Timestamped report file names
//! - Writing report documents as pretty JSON
//! - Loading domain lists and label maps written by earlier runs

mod reports;
pub mod stats;

pub use reports::{
    CheckMetadata, CheckStepSummary, CrawlabilityReport, DomainLabelsReport, DomainListMetadata,
    DomainStatsReport, ExtractStepSummary, ExtractedDomainsReport, FileFilterDetail,
    FilterMetadata, FilterStepSummary, FilterSummary, FilteringReport, LabelsMetadata,
    PipelineSteps, PipelineSummary, RankedDomain, RankedDomainsReport, RunInfo,
};
pub use stats::{print_statistics, CrawlabilityStats, DomainAdvice, Recommendations, TldBreakdown};

use crate::checker::DomainLabel;
use crate::url::{parse_domain, Domain};
use crate::{ComplianceError, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Report file name prefixes
pub const EXTRACTED_DOMAINS: &str = "extracted_domains";
pub const DOMAIN_STATS: &str = "domain_stats";
pub const DOMAINS_RANKED: &str = "domains_ranked";
pub const CRAWLABILITY_RESULTS: &str = "crawlability_results";
pub const DOMAIN_LABELS: &str = "domain_labels";
pub const FILTERING_REPORT: &str = "filtering_report";
pub const PIPELINE_SUMMARY: &str = "pipeline_summary";

/// Formats the timestamp suffix used in report file names
pub fn timestamp_suffix(now: DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// Builds `{directory}/{prefix}_{stamp}.json`
pub fn report_path(directory: &Path, prefix: &str, stamp: &str) -> PathBuf {
    directory.join(format!("{}_{}.json", prefix, stamp))
}

/// Builds the kept and rejected record paths for one input file
///
/// `data/part-01.jsonl` becomes `filtered_part-01.jsonl` and
/// `rejected_part-01.jsonl` inside `directory`.
pub fn filtered_paths(directory: &Path, input: &Path) -> (PathBuf, PathBuf) {
    let name = record_file_name(input);
    (
        directory.join(format!("filtered_{}", name)),
        directory.join(format!("rejected_{}", name)),
    )
}

/// Builds kept and rejected paths for every input of one run
///
/// Inputs sharing a file name get their 1-based position as a prefix, so
/// `a/part.jsonl` and `b/part.jsonl` become `filtered_1_part.jsonl` and
/// `filtered_2_part.jsonl`. Unique names are left as [`filtered_paths`]
/// builds them.
pub fn filtered_paths_for(directory: &Path, inputs: &[PathBuf]) -> Vec<(PathBuf, PathBuf)> {
    let names: Vec<String> = inputs.iter().map(|input| record_file_name(input)).collect();
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for name in &names {
        *occurrences.entry(name.as_str()).or_default() += 1;
    }

    inputs
        .iter()
        .zip(&names)
        .enumerate()
        .map(|(index, (input, name))| {
            if occurrences[name.as_str()] == 1 {
                return filtered_paths(directory, input);
            }
            (
                directory.join(format!("filtered_{}_{}", index + 1, name)),
                directory.join(format!("rejected_{}_{}", index + 1, name)),
            )
        })
        .collect()
}

fn record_file_name(input: &Path) -> String {
    input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "records.jsonl".to_string())
}

/// Creates a file for writing, creating missing parent directories
pub fn create_output_file(path: &Path) -> Result<BufWriter<File>> {
    let output_error = |source| ComplianceError::Output {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(output_error)?;
    }
    let file = File::create(path).map_err(output_error)?;
    Ok(BufWriter::new(file))
}

/// Opens an input file for buffered reading
pub fn open_input_file(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|source| ComplianceError::Input {
        path: path.display().to_string(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Writes a report as pretty-printed JSON
///
/// # Arguments
///
/// * `path` - Destination file; parent directories are created
/// * `report` - Any serializable report document
pub fn write_json_report<T: Serialize + ?Sized>(path: &Path, report: &T) -> Result<()> {
    let mut writer = create_output_file(path)?;
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer
        .write_all(b"\n")
        .and_then(|_| writer.flush())
        .map_err(|source| ComplianceError::Output {
            path: path.display().to_string(),
            source,
        })?;

    tracing::info!(path = %path.display(), "Report written");
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let reader = open_input_file(path)?;
    Ok(serde_json::from_reader(reader)?)
}

/// Loads a domain list file
///
/// # Accepted Shapes
///
/// - `["a.com", "b.com"]`
/// - `{"domains": ["a.com", ...]}` (extracted domains report)
/// - `{"domains": {"a.com": {...}}}` (domain stats report)
/// - `{"domains": [{"domain": "a.com", ...}]}` (ranked report)
///
/// Entries that are not valid domains are skipped with a warning.
pub fn load_domain_list(path: &Path) -> Result<BTreeSet<Domain>> {
    let value = read_json(path)?;
    let list = match &value {
        Value::Object(map) => map.get("domains").unwrap_or(&Value::Null),
        other => other,
    };

    let names: Vec<&str> = match list {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(name.as_str()),
                Value::Object(entry) => entry.get("domain").and_then(Value::as_str),
                _ => None,
            })
            .collect(),
        Value::Object(map) => map.keys().map(String::as_str).collect(),
        _ => {
            return Err(ComplianceError::Pipeline(format!(
                "{} does not contain a domain list",
                path.display()
            )))
        }
    };

    let mut domains = BTreeSet::new();
    for name in names {
        match parse_domain(name) {
            Ok(domain) => {
                domains.insert(domain);
            }
            Err(e) => tracing::warn!(entry = name, error = %e, "Skipping invalid domain entry"),
        }
    }
    Ok(domains)
}

/// Loads a domain label map
///
/// Accepts a domain labels report (`{"domain_labels": {...}}`) or a bare
/// `{"domain": 0|1}` object.
pub fn load_label_map(path: &Path) -> Result<HashMap<Domain, DomainLabel>> {
    let mut value = read_json(path)?;
    if let Some(labels) = value.get_mut("domain_labels") {
        value = labels.take();
    }
    let labels: HashMap<Domain, DomainLabel> = serde_json::from_value(value)?;
    Ok(labels)
}
