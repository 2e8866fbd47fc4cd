//! Report documents
//!
//! Every report is a JSON object with a `metadata` block followed by its
//! payload. Reports read back by later stages also derive `Deserialize`.

use crate::checker::{CheckReport, DomainLabel, RobotsCheckResult};
use crate::filter::{FilterStats, RejectionReasons};
use crate::output::stats::{percentage, CrawlabilityStats, Recommendations};
use crate::registry::{DomainRegistry, DomainStats, IngestStats};
use crate::url::Domain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Metadata shared by all reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,

    /// SHA-256 of the configuration file, when one was used
    pub config_hash: Option<String>,

    /// 1 = extract, 2 = check, 3 = filter
    pub pipeline_step: u8,
}

impl RunInfo {
    pub fn new(pipeline_step: u8, config_hash: Option<String>) -> Self {
        Self {
            generated_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            config_hash,
            pipeline_step,
        }
    }
}

/// Metadata of the domain list reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainListMetadata {
    #[serde(flatten)]
    pub run: RunInfo,
    pub format: String,
    pub total_domains: u64,
    pub total_urls_processed: u64,
    pub ingest: IngestStats,
}

/// `extracted_domains_*.json`: the sorted domain list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDomainsReport {
    pub metadata: DomainListMetadata,
    pub domains: Vec<Domain>,
}

/// `domain_stats_*.json`: statistics keyed by domain
#[derive(Debug, Clone, Serialize)]
pub struct DomainStatsReport<'a> {
    pub metadata: DomainListMetadata,
    pub domains: BTreeMap<&'a Domain, &'a DomainStats>,
}

/// One row of the ranked domain list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDomain {
    pub rank: u64,
    pub domain: Domain,
    pub count: u64,
    pub percentage: f64,
    pub tld: String,
}

/// `domains_ranked_*.json`: domains by descending frequency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedDomainsReport {
    pub metadata: DomainListMetadata,
    pub domains: Vec<RankedDomain>,
}

fn list_metadata(
    run: RunInfo,
    format: &str,
    registry: &DomainRegistry,
    ingest: IngestStats,
) -> DomainListMetadata {
    DomainListMetadata {
        run,
        format: format.to_string(),
        total_domains: registry.len() as u64,
        total_urls_processed: registry.total_urls(),
        ingest,
    }
}

impl ExtractedDomainsReport {
    pub fn new(run: RunInfo, registry: &DomainRegistry, ingest: IngestStats) -> Self {
        Self {
            metadata: list_metadata(run, "simple_list", registry, ingest),
            domains: registry.snapshot().into_iter().collect(),
        }
    }
}

impl<'a> DomainStatsReport<'a> {
    pub fn new(run: RunInfo, registry: &'a DomainRegistry, ingest: IngestStats) -> Self {
        Self {
            metadata: list_metadata(run, "detailed", registry, ingest),
            domains: registry.iter().collect(),
        }
    }
}

impl RankedDomainsReport {
    pub fn new(run: RunInfo, registry: &DomainRegistry, ingest: IngestStats) -> Self {
        let total = registry.total_urls();
        let domains = registry
            .ranked()
            .into_iter()
            .enumerate()
            .map(|(index, (domain, stats))| RankedDomain {
                rank: index as u64 + 1,
                domain: domain.clone(),
                count: stats.count,
                percentage: (percentage(stats.count, total) * 100.0).round() / 100.0,
                tld: stats.tld.clone(),
            })
            .collect();

        Self {
            metadata: list_metadata(run, "frequency_ranked", registry, ingest),
            domains,
        }
    }
}

/// Metadata of the check reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckMetadata {
    #[serde(flatten)]
    pub run: RunInfo,
    pub total_domains: u64,
    pub user_agent: String,
    pub timeout_seconds: f64,
    pub max_workers: usize,
    pub agent_tokens: Vec<String>,
    pub ai_agent_tokens: Vec<String>,
}

/// `crawlability_results_*.json`: detailed results with analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlabilityReport {
    pub metadata: CheckMetadata,
    pub results: Vec<RobotsCheckResult>,
    pub statistics: CrawlabilityStats,
    pub recommendations: Recommendations,
}

impl CrawlabilityReport {
    pub fn new(metadata: CheckMetadata, report: &CheckReport) -> Self {
        let statistics = CrawlabilityStats::from_results(report.results());
        let recommendations = Recommendations::generate(report.results(), &statistics);
        Self {
            metadata,
            results: report.results().cloned().collect(),
            statistics,
            recommendations,
        }
    }
}

/// Metadata of the label file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelsMetadata {
    #[serde(flatten)]
    pub run: RunInfo,
    pub format: String,
    pub total_domains: u64,
    pub crawlable_count: u64,
    pub non_crawlable_count: u64,
    pub crawlable_rate: f64,
}

/// `domain_labels_*.json`: the label map consumed by the filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainLabelsReport {
    pub metadata: LabelsMetadata,
    pub domain_labels: BTreeMap<Domain, DomainLabel>,
    pub crawlable_domains: Vec<Domain>,
    pub non_crawlable_domains: Vec<Domain>,
}

impl DomainLabelsReport {
    pub fn new(run: RunInfo, report: &CheckReport) -> Self {
        let domain_labels: BTreeMap<Domain, DomainLabel> = report.labels().into_iter().collect();
        let (crawlable, blocked): (Vec<_>, Vec<_>) = domain_labels
            .iter()
            .partition(|(_, label)| label.is_crawlable());

        let crawlable_domains: Vec<Domain> = crawlable.into_iter().map(|(d, _)| d.clone()).collect();
        let non_crawlable_domains: Vec<Domain> = blocked.into_iter().map(|(d, _)| d.clone()).collect();
        let total = domain_labels.len() as u64;

        Self {
            metadata: LabelsMetadata {
                run,
                format: "domain_labels".to_string(),
                total_domains: total,
                crawlable_count: crawlable_domains.len() as u64,
                non_crawlable_count: non_crawlable_domains.len() as u64,
                crawlable_rate: percentage(crawlable_domains.len() as u64, total),
            },
            domain_labels,
            crawlable_domains,
            non_crawlable_domains,
        }
    }
}

/// Per-input-file filter outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileFilterDetail {
    pub input_file: PathBuf,
    pub kept_file: PathBuf,
    pub rejected_file: PathBuf,

    #[serde(flatten)]
    pub stats: FilterStats,
}

/// Metadata of the filtering report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterMetadata {
    #[serde(flatten)]
    pub run: RunInfo,
    pub total_input_files: u64,
    pub processed_files: u64,
}

/// Totals across all filtered files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSummary {
    pub total_records_processed: u64,
    pub records_kept: u64,
    pub records_rejected: u64,
    pub retention_rate: f64,
    pub reasons: RejectionReasons,
}

impl From<&FilterStats> for FilterSummary {
    fn from(stats: &FilterStats) -> Self {
        Self {
            total_records_processed: stats.total,
            records_kept: stats.kept,
            records_rejected: stats.rejected,
            retention_rate: stats.retention_rate(),
            reasons: stats.reasons,
        }
    }
}

/// `filtering_report_*.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilteringReport {
    pub metadata: FilterMetadata,
    pub summary: FilterSummary,
    pub file_details: Vec<FileFilterDetail>,
}

impl FilteringReport {
    pub fn new(run: RunInfo, total_input_files: usize, file_details: Vec<FileFilterDetail>) -> Self {
        let mut totals = FilterStats::default();
        for detail in &file_details {
            totals.merge(&detail.stats);
        }

        Self {
            metadata: FilterMetadata {
                run,
                total_input_files: total_input_files as u64,
                processed_files: file_details.len() as u64,
            },
            summary: FilterSummary::from(&totals),
            file_details,
        }
    }
}

/// Summary of the extract step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractStepSummary {
    pub domains_file: PathBuf,
    pub stats_file: PathBuf,
    pub ranked_file: PathBuf,
    pub total_domains: u64,
    pub total_urls: u64,
    pub ingest: IngestStats,
}

/// Summary of the check step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckStepSummary {
    pub results_file: PathBuf,
    pub labels_file: PathBuf,
    pub total_checked: u64,
    pub crawlable_count: u64,
    pub non_crawlable_count: u64,
    pub ai_restricted_count: u64,
    pub cancelled_count: u64,
    pub crawlable_rate: f64,
}

/// Summary of the filter step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterStepSummary {
    pub report_file: PathBuf,
    pub total_processed: u64,
    pub total_kept: u64,
    pub retention_rate: f64,
}

/// Per-step summaries; a step that did not run is `null`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSteps {
    pub extract: Option<ExtractStepSummary>,
    pub check: Option<CheckStepSummary>,
    pub filter: Option<FilterStepSummary>,
}

/// `pipeline_summary_*.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub steps: PipelineSteps,
    pub total_runtime_seconds: f64,
    pub completed_at: DateTime<Utc>,
    pub config_hash: Option<String>,
    pub cancelled: bool,
    pub success: bool,
    pub error: Option<String>,
}
