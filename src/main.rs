//! Robots-Gate main entry point
//!
//! This is the command-line interface for the robots.txt compliance pipeline.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use robots_gate::config::{load_config_with_hash, validate, Config};
use robots_gate::filter::LabelMap;
use robots_gate::output::{load_domain_list, load_label_map, print_statistics, CrawlabilityStats};
use robots_gate::pipeline::Pipeline;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Robots-Gate: robots.txt compliance labeling for crawl corpora
///
/// Robots-Gate extracts the domains of a JSONL record corpus, checks each
/// domain's robots.txt (generic and AI-crawler rules), and splits the
/// records into kept and rejected files.
#[derive(Parser, Debug)]
#[command(name = "robots-gate")]
#[command(version)]
#[command(about = "robots.txt compliance labeling for crawl corpora", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to TOML configuration file
    #[arg(short, long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Directory for reports and filtered record files
    #[arg(short, long, global = true, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract and deduplicate domains from JSONL records
    Extract {
        /// JSONL input files
        #[arg(required = true, value_name = "INPUT")]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        ingest: IngestArgs,
    },

    /// Check robots.txt for every domain of a domain list
    Check {
        /// Domain list (extracted domains report or JSON array)
        #[arg(short, long, value_name = "FILE")]
        domains: PathBuf,

        #[command(flatten)]
        checker: CheckerArgs,
    },

    /// Split JSONL records by domain label
    Filter {
        /// Domain labels file written by `check`
        #[arg(short, long, value_name = "FILE")]
        labels: PathBuf,

        /// JSONL input files
        #[arg(required = true, value_name = "INPUT")]
        inputs: Vec<PathBuf>,
    },

    /// Run extract, check and filter in one go
    Run {
        /// JSONL input files
        #[arg(required = true, value_name = "INPUT")]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        ingest: IngestArgs,

        #[command(flatten)]
        checker: CheckerArgs,
    },
}

#[derive(Args, Debug, Default)]
struct IngestArgs {
    /// Stop reading each input after this many records
    #[arg(long)]
    max_records: Option<u64>,
}

#[derive(Args, Debug, Default)]
struct CheckerArgs {
    /// Number of concurrent robots.txt checks
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// User-Agent header for robots.txt requests
    #[arg(long)]
    user_agent: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    if let Some(dir) = &cli.output {
        config.output.directory = dir.clone();
    }
    match &cli.command {
        Command::Extract { ingest, .. } => apply_ingest_args(&mut config, ingest),
        Command::Check { checker, .. } => apply_checker_args(&mut config, checker),
        Command::Run { ingest, checker, .. } => {
            apply_ingest_args(&mut config, ingest);
            apply_checker_args(&mut config, checker);
        }
        Command::Filter { .. } => {}
    }
    validate(&config).context("invalid settings")?;

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let pipeline = Pipeline::new(config, config_hash);

    match cli.command {
        Command::Extract { inputs, .. } => handle_extract(&pipeline, &inputs),
        Command::Check { domains, .. } => handle_check(&pipeline, domains, cancel).await,
        Command::Filter { labels, inputs } => handle_filter(&pipeline, labels, &inputs, &cancel),
        Command::Run { inputs, .. } => handle_run(&pipeline, &inputs, cancel).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("robots_gate=info,warn"),
            1 => EnvFilter::new("robots_gate=debug,info"),
            2 => EnvFilter::new("robots_gate=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn apply_ingest_args(config: &mut Config, args: &IngestArgs) {
    if let Some(max) = args.max_records {
        config.ingest.max_records = Some(max);
    }
}

fn apply_checker_args(config: &mut Config, args: &CheckerArgs) {
    if let Some(workers) = args.workers {
        config.checker.max_workers = workers;
    }
    if let Some(timeout) = args.timeout {
        config.checker.timeout_seconds = timeout;
    }
    if let Some(user_agent) = &args.user_agent {
        config.checker.user_agent = user_agent.clone();
    }
}

/// Cancels the run on Ctrl-C; in-flight requests finish or time out
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight checks");
            cancel.cancel();
        }
    });
}

/// Handles the extract command
fn handle_extract(pipeline: &Pipeline, inputs: &[PathBuf]) -> Result<()> {
    let (registry, summary) = pipeline.extract(inputs).context("domain extraction failed")?;

    println!("=== Domain Extraction ===\n");
    println!("  Records read: {}", summary.ingest.records_read);
    println!("  Records skipped: {}", summary.ingest.records_skipped);
    println!("  Malformed lines: {}", summary.ingest.malformed_lines);
    println!("  Unique domains: {}", registry.len());
    println!();
    println!("Top Domains:");
    for (domain, stats) in registry.ranked().into_iter().take(10) {
        println!("  {}: {}", domain, stats.count);
    }
    println!();
    println!("✓ Domain list: {}", summary.domains_file.display());
    println!("✓ Domain statistics: {}", summary.stats_file.display());
    println!("✓ Ranked domains: {}", summary.ranked_file.display());

    Ok(())
}

/// Handles the check command
async fn handle_check(pipeline: &Pipeline, domains: PathBuf, cancel: CancellationToken) -> Result<()> {
    let domains = load_domain_list(&domains)
        .with_context(|| format!("failed to load domain list {}", domains.display()))?;
    tracing::info!("Loaded {} domains", domains.len());

    let checker = pipeline.checker().context("failed to build HTTP client")?;
    let (report, summary) = pipeline
        .check(&checker, domains, cancel)
        .await
        .context("robots.txt checks failed")?;

    print_statistics(&CrawlabilityStats::from_results(report.results()));
    if summary.cancelled_count > 0 {
        println!("⚠ {} domains not checked (cancelled)", summary.cancelled_count);
    }
    println!("✓ Detailed results: {}", summary.results_file.display());
    println!("✓ Domain labels: {}", summary.labels_file.display());

    Ok(())
}

/// Handles the filter command
fn handle_filter(
    pipeline: &Pipeline,
    labels: PathBuf,
    inputs: &[PathBuf],
    cancel: &CancellationToken,
) -> Result<()> {
    let labels = load_label_map(&labels)
        .with_context(|| format!("failed to load domain labels {}", labels.display()))?;
    tracing::info!("Loaded {} domain labels", labels.len());

    let (report, summary) = pipeline
        .filter(LabelMap::new(labels), inputs, cancel)
        .context("record filtering failed")?;

    print_filter_summary(&report.summary);
    println!("✓ Filtering report: {}", summary.report_file.display());

    Ok(())
}

fn print_filter_summary(summary: &robots_gate::output::FilterSummary) {
    println!("=== Record Filtering ===\n");
    println!("  Records processed: {}", summary.total_records_processed);
    println!("  Kept: {}", summary.records_kept);
    println!("  Rejected: {}", summary.records_rejected);
    println!("    Labeled deny: {}", summary.reasons.labeled_deny);
    println!("    Unknown domain: {}", summary.reasons.unknown_domain);
    println!("    Unparseable URL: {}", summary.reasons.unparseable_url);
    println!("  Retention rate: {:.1}%", summary.retention_rate);
    println!();
}

/// Handles the run command
async fn handle_run(pipeline: &Pipeline, inputs: &[PathBuf], cancel: CancellationToken) -> Result<()> {
    let checker = pipeline.checker().context("failed to build HTTP client")?;

    let summary = match pipeline.run(inputs, &checker, cancel).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Pipeline failed: {}", e);
            return Err(e).context("pipeline run failed");
        }
    };

    println!("=== Pipeline Summary ===\n");
    if let Some(extract) = &summary.steps.extract {
        println!(
            "  Extract: {} domains from {} records",
            extract.total_domains, extract.ingest.records_read
        );
    }
    if let Some(check) = &summary.steps.check {
        println!(
            "  Check: {} crawlable, {} not crawlable ({:.1}% crawlable)",
            check.crawlable_count, check.non_crawlable_count, check.crawlable_rate
        );
    }
    match &summary.steps.filter {
        Some(filter) => println!(
            "  Filter: kept {} of {} records ({:.1}%)",
            filter.total_kept, filter.total_processed, filter.retention_rate
        ),
        None => println!("  Filter: skipped (run cancelled)"),
    }
    println!("  Runtime: {:.1}s", summary.total_runtime_seconds);
    println!();
    println!("✓ Reports written to: {}", pipeline.output_dir().display());

    Ok(())
}
