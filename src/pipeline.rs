//! Pipeline orchestration
//!
//! Runs the three stages over files on disk and writes their reports:
//! 1. Extract: JSONL records → domain registry → domain list reports
//! 2. Check: domains → robots.txt results → label file
//! 3. Filter: JSONL records + labels → kept/rejected record files
//!
//! All files of one run share a single timestamp suffix.

use crate::checker::{CheckReport, RobotsChecker};
use crate::config::Config;
use crate::filter::{FilterStats, LabelMap, RecordFilter};
use crate::output::{
    self, filtered_paths_for, report_path, timestamp_suffix, write_json_report, CheckMetadata,
    CheckStepSummary, CrawlabilityReport, DomainLabelsReport, DomainStatsReport,
    ExtractStepSummary, ExtractedDomainsReport, FileFilterDetail, FilterStepSummary,
    FilteringReport, PipelineSteps, PipelineSummary, RankedDomainsReport, RunInfo,
};
use crate::registry::{DomainRegistry, IngestStats};
use crate::url::Domain;
use crate::{ComplianceError, Result};
use chrono::{Local, Utc};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// One pipeline run: configuration, output location and file timestamp
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
    config_hash: Option<String>,
    stamp: String,
}

impl Pipeline {
    /// Creates a run writing into `config.output.directory`
    pub fn new(config: Config, config_hash: Option<String>) -> Self {
        Self {
            config,
            config_hash,
            stamp: timestamp_suffix(Local::now()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output.directory
    }

    fn report_file(&self, prefix: &str) -> PathBuf {
        report_path(self.output_dir(), prefix, &self.stamp)
    }

    fn run_info(&self, step: u8) -> RunInfo {
        RunInfo::new(step, self.config_hash.clone())
    }

    /// Builds a checker from the `[checker]` configuration
    pub fn checker(&self) -> Result<RobotsChecker> {
        RobotsChecker::new(self.config.checker.to_options())
    }

    /// Step 1: extracts and deduplicates the domains of the input files
    ///
    /// Writes the simple, detailed and ranked domain reports.
    pub fn extract(&self, inputs: &[PathBuf]) -> Result<(DomainRegistry, ExtractStepSummary)> {
        let ingest_config = &self.config.ingest;
        let mut registry =
            DomainRegistry::with_settings(ingest_config.record_fields(), ingest_config.sample_url_limit);
        let mut totals = IngestStats::default();

        for input in inputs {
            tracing::info!(input = %input.display(), "Extracting domains");
            let reader = output::open_input_file(input)?;
            let stats = registry.ingest_jsonl(reader, ingest_config.max_records)?;
            totals.merge(&stats);
        }

        tracing::info!(
            domains = registry.len(),
            records_read = totals.records_read,
            records_skipped = totals.records_skipped,
            malformed_lines = totals.malformed_lines,
            "Domain extraction finished"
        );

        let domains_file = self.report_file(output::EXTRACTED_DOMAINS);
        let stats_file = self.report_file(output::DOMAIN_STATS);
        let ranked_file = self.report_file(output::DOMAINS_RANKED);

        write_json_report(
            &domains_file,
            &ExtractedDomainsReport::new(self.run_info(1), &registry, totals),
        )?;
        write_json_report(
            &stats_file,
            &DomainStatsReport::new(self.run_info(1), &registry, totals),
        )?;
        write_json_report(
            &ranked_file,
            &RankedDomainsReport::new(self.run_info(1), &registry, totals),
        )?;

        let summary = ExtractStepSummary {
            domains_file,
            stats_file,
            ranked_file,
            total_domains: registry.len() as u64,
            total_urls: registry.total_urls(),
            ingest: totals,
        };
        Ok((registry, summary))
    }

    /// Step 2: checks robots.txt for every domain
    ///
    /// Writes the detailed results report and the label file.
    pub async fn check(
        &self,
        checker: &RobotsChecker,
        domains: BTreeSet<Domain>,
        cancel: CancellationToken,
    ) -> Result<(CheckReport, CheckStepSummary)> {
        let total = domains.len();
        let report = checker.check_all(domains, cancel).await?;

        let options = checker.options();
        let metadata = CheckMetadata {
            run: self.run_info(2),
            total_domains: total as u64,
            user_agent: options.user_agent.clone(),
            timeout_seconds: options.timeout.as_secs_f64(),
            max_workers: options.max_workers,
            agent_tokens: options.agent_tokens.clone(),
            ai_agent_tokens: options.ai_agent_tokens.clone(),
        };

        let results_file = self.report_file(output::CRAWLABILITY_RESULTS);
        let labels_file = self.report_file(output::DOMAIN_LABELS);

        let crawlability = CrawlabilityReport::new(metadata, &report);
        write_json_report(&results_file, &crawlability)?;

        let labels = DomainLabelsReport::new(self.run_info(2), &report);
        write_json_report(&labels_file, &labels)?;

        let summary = CheckStepSummary {
            results_file,
            labels_file,
            total_checked: report.len() as u64,
            crawlable_count: report.crawlable_count() as u64,
            non_crawlable_count: report.blocked_count() as u64,
            ai_restricted_count: report.ai_restricted_count() as u64,
            cancelled_count: report.cancelled_count() as u64,
            crawlable_rate: labels.metadata.crawlable_rate,
        };
        Ok((report, summary))
    }

    /// Step 3: partitions the records of every input file
    ///
    /// Each input yields `filtered_<name>` and `rejected_<name>` in the
    /// output directory; inputs sharing a name are prefixed with their
    /// position. Cancellation stops before the next file.
    pub fn filter(
        &self,
        labels: LabelMap,
        inputs: &[PathBuf],
        cancel: &CancellationToken,
    ) -> Result<(FilteringReport, FilterStepSummary)> {
        let filter = RecordFilter::with_fields(labels, self.config.ingest.record_fields());
        let paths = filtered_paths_for(self.output_dir(), inputs);
        let mut details = Vec::with_capacity(inputs.len());

        for (input, (kept_file, rejected_file)) in inputs.iter().zip(paths) {
            if cancel.is_cancelled() {
                tracing::warn!(input = %input.display(), "Filtering cancelled, skipping remaining files");
                break;
            }
            details.push(self.filter_file(&filter, input, kept_file, rejected_file)?);
        }

        let report = FilteringReport::new(self.run_info(3), inputs.len(), details);
        let report_file = self.report_file(output::FILTERING_REPORT);
        write_json_report(&report_file, &report)?;

        tracing::info!(
            total = report.summary.total_records_processed,
            kept = report.summary.records_kept,
            retention_rate = report.summary.retention_rate,
            "Filtering finished"
        );

        let summary = FilterStepSummary {
            report_file,
            total_processed: report.summary.total_records_processed,
            total_kept: report.summary.records_kept,
            retention_rate: report.summary.retention_rate,
        };
        Ok((report, summary))
    }

    fn filter_file(
        &self,
        filter: &RecordFilter,
        input: &Path,
        kept_file: PathBuf,
        rejected_file: PathBuf,
    ) -> Result<FileFilterDetail> {
        tracing::info!(input = %input.display(), kept = %kept_file.display(), "Filtering records");

        let reader = output::open_input_file(input)?;
        let mut kept = output::create_output_file(&kept_file)?;
        let mut rejected = output::create_output_file(&rejected_file)?;

        let stats: FilterStats = filter.filter_jsonl(reader, &mut kept, &mut rejected)?;

        Ok(FileFilterDetail {
            input_file: input.to_path_buf(),
            kept_file,
            rejected_file,
            stats,
        })
    }

    /// Runs extract, check and filter in order and writes the run summary
    ///
    /// The summary is written even when a step fails; the step error is then
    /// returned. A cancelled run skips filtering.
    pub async fn run(
        &self,
        inputs: &[PathBuf],
        checker: &RobotsChecker,
        cancel: CancellationToken,
    ) -> Result<PipelineSummary> {
        let started = Instant::now();
        let mut steps = PipelineSteps::default();

        let outcome = self.run_steps(inputs, checker, &cancel, &mut steps).await;

        let summary = PipelineSummary {
            steps,
            total_runtime_seconds: started.elapsed().as_secs_f64(),
            completed_at: Utc::now(),
            config_hash: self.config_hash.clone(),
            cancelled: cancel.is_cancelled(),
            success: outcome.is_ok() && !cancel.is_cancelled(),
            error: outcome.as_ref().err().map(|e| e.to_string()),
        };
        write_json_report(&self.report_file(output::PIPELINE_SUMMARY), &summary)?;

        outcome.map(|_| summary)
    }

    async fn run_steps(
        &self,
        inputs: &[PathBuf],
        checker: &RobotsChecker,
        cancel: &CancellationToken,
        steps: &mut PipelineSteps,
    ) -> Result<()> {
        if inputs.is_empty() {
            return Err(ComplianceError::Pipeline("no input files given".to_string()));
        }

        let (registry, extract) = self.extract(inputs)?;
        steps.extract = Some(extract);

        let (report, check) = self.check(checker, registry.snapshot(), cancel.clone()).await?;
        steps.check = Some(check);

        if cancel.is_cancelled() {
            tracing::warn!("Run cancelled, skipping record filtering");
            return Ok(());
        }

        let labels = LabelMap::new(report.labels());
        let (_, filter) = self.filter(labels, inputs, cancel)?;
        steps.filter = Some(filter);

        Ok(())
    }
}
