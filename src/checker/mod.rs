//! Concurrent robots.txt checker
//!
//! This module fetches and evaluates the robots.txt of every domain in a run:
//! - HTTPS first, one HTTP fallback on any HTTPS failure
//! - A bounded pool of tokio workers draining a shared queue
//! - Conservative labels when neither scheme yields an answer
//! - Cancellation that still accounts for every domain

mod fetcher;
mod result;
mod state;

pub use fetcher::{build_http_client, fetch_robots, DefaultLocator, FetchOutcome, RobotsLocator};
pub use result::{CheckReport, DomainLabel, FetchedScheme, RobotsCheckResult, CANCELLED_ERROR};
pub use state::{CheckState, Scheme};

use crate::robots::{ai_restriction, evaluate, RobotsDirectives, DEFAULT_AI_AGENTS};
use crate::url::Domain;
use crate::{ComplianceError, Result};
use chrono::Utc;
use dashmap::DashMap;
use reqwest::Client;
use state::StateTracker;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Default `User-Agent` header: `robots-gate/<version>`
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default worker pool size
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Settings for one checker instance
#[derive(Debug, Clone)]
pub struct CheckerOptions {
    /// `User-Agent` header sent with every request
    pub user_agent: String,

    /// Agent tokens for the generic verdict, most specific first; `*` is
    /// always the fallback
    pub agent_tokens: Vec<String>,

    /// AI-agent block-list
    pub ai_agent_tokens: Vec<String>,

    /// Bound on each attempt, body included
    pub timeout: Duration,

    /// Number of concurrent workers
    pub max_workers: usize,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            agent_tokens: Vec::new(),
            ai_agent_tokens: DEFAULT_AI_AGENTS.iter().map(|s| s.to_string()).collect(),
            timeout: DEFAULT_TIMEOUT,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

struct CheckerInner {
    client: Client,
    locator: Arc<dyn RobotsLocator>,
    options: CheckerOptions,
}

/// Checks robots.txt for a set of domains with a bounded worker pool
#[derive(Clone)]
pub struct RobotsChecker {
    inner: Arc<CheckerInner>,
}

impl RobotsChecker {
    /// Creates a checker using the standard robots.txt location
    ///
    /// # Returns
    ///
    /// * `Ok(RobotsChecker)` - Ready to run
    /// * `Err(ComplianceError)` - The HTTP client could not be built
    pub fn new(options: CheckerOptions) -> Result<Self> {
        Self::with_locator(options, Arc::new(DefaultLocator))
    }

    /// Creates a checker that resolves robots.txt URLs through `locator`
    pub fn with_locator(options: CheckerOptions, locator: Arc<dyn RobotsLocator>) -> Result<Self> {
        let client = build_http_client(&options.user_agent, options.timeout)?;
        Ok(Self {
            inner: Arc::new(CheckerInner {
                client,
                locator,
                options,
            }),
        })
    }

    pub fn options(&self) -> &CheckerOptions {
        &self.inner.options
    }

    /// Checks every domain exactly once
    ///
    /// Duplicate domains in the input are checked once. When `cancel` fires,
    /// workers stop taking new domains; attempts in flight finish or time
    /// out, but no HTTP fallback is started afterwards. Domains that were
    /// never started, or whose fallback was skipped, are recorded as blocked
    /// with an error ending in `check cancelled`.
    ///
    /// # Returns
    ///
    /// * `Ok(CheckReport)` - One result per distinct input domain
    /// * `Err(ComplianceError)` - A worker task panicked
    pub async fn check_all<I>(&self, domains: I, cancel: CancellationToken) -> Result<CheckReport>
    where
        I: IntoIterator<Item = Domain>,
    {
        let domains: BTreeSet<Domain> = domains.into_iter().collect();
        if domains.is_empty() {
            return Ok(CheckReport::default());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        for domain in &domains {
            tx.send(domain.clone())
                .map_err(|e| ComplianceError::WorkerPool(e.to_string()))?;
        }
        drop(tx);

        let queue = Arc::new(Mutex::new(rx));
        let results: Arc<DashMap<Domain, RobotsCheckResult>> = Arc::new(DashMap::new());
        let worker_count = self.inner.options.max_workers.clamp(1, domains.len());

        tracing::info!(
            domains = domains.len(),
            workers = worker_count,
            timeout_secs = self.inner.options.timeout.as_secs_f64(),
            "Starting robots.txt checks"
        );

        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            workers.spawn(run_worker(
                worker_id,
                Arc::clone(&self.inner),
                Arc::clone(&queue),
                Arc::clone(&results),
                cancel.clone(),
            ));
        }

        while let Some(joined) = workers.join_next().await {
            joined.map_err(|e| ComplianceError::WorkerPool(e.to_string()))?;
        }

        let mut skipped = 0usize;
        for domain in &domains {
            if !results.contains_key(domain) {
                results.insert(domain.clone(), RobotsCheckResult::cancelled(domain.clone()));
                skipped += 1;
            }
        }
        if skipped > 0 {
            tracing::warn!(skipped, "Checks cancelled before completion");
        }

        let results = Arc::try_unwrap(results)
            .map_err(|_| ComplianceError::WorkerPool("result map still shared".to_string()))?;
        let report = CheckReport::from_results(results.into_iter().map(|(_, result)| result));

        tracing::info!(
            checked = report.len(),
            crawlable = report.crawlable_count(),
            blocked = report.blocked_count(),
            ai_restricted = report.ai_restricted_count(),
            "Robots.txt checks finished"
        );

        Ok(report)
    }

    /// Checks a single domain: HTTPS, then HTTP on failure
    pub async fn check_domain(&self, domain: &Domain) -> RobotsCheckResult {
        self.inner.check_domain(domain, &CancellationToken::new()).await
    }
}

async fn run_worker(
    worker_id: usize,
    inner: Arc<CheckerInner>,
    queue: Arc<Mutex<mpsc::UnboundedReceiver<Domain>>>,
    results: Arc<DashMap<Domain, RobotsCheckResult>>,
    cancel: CancellationToken,
) {
    let mut checked = 0u64;

    loop {
        if cancel.is_cancelled() {
            tracing::debug!(worker_id, "Worker stopping on cancellation");
            break;
        }

        // The queue is filled and closed up front, so recv never waits
        let Some(domain) = queue.lock().await.recv().await else {
            break;
        };

        let span = tracing::info_span!("robots_check", domain = %domain, worker_id);
        let result = inner.check_domain(&domain, &cancel).instrument(span).await;

        if results.insert(domain.clone(), result).is_some() {
            tracing::warn!(domain = %domain, "Domain checked twice");
        }
        checked += 1;
    }

    tracing::debug!(worker_id, checked, "Worker finished");
}

impl CheckerInner {
    /// Runs the scheme attempts for one domain
    ///
    /// Once `cancel` fires no further attempt is started; a domain whose
    /// HTTPS attempt already failed is then recorded as cancelled.
    async fn check_domain(&self, domain: &Domain, cancel: &CancellationToken) -> RobotsCheckResult {
        let started = Instant::now();
        let mut tracker = StateTracker::new();
        let mut last_status = None;
        let mut last_url = None;
        let mut errors = Vec::new();

        for scheme in [Scheme::Https, Scheme::Http] {
            if !errors.is_empty() && cancel.is_cancelled() {
                tracing::debug!(scheme = %scheme, "Skipping fallback attempt on cancellation");
                errors.push(CANCELLED_ERROR.to_string());
                break;
            }
            tracker.advance(CheckState::Fetching(scheme));
            let url = self.locator.robots_url(domain, scheme);
            tracing::debug!(url = %url, "Fetching robots.txt");

            let outcome = fetch_robots(&self.client, &url, self.options.timeout).await;
            last_url = Some(url);

            match outcome {
                FetchOutcome::Found { status_code, body } => {
                    tracker.advance(CheckState::Parsing);
                    let directives = RobotsDirectives::parse_bytes(&body);
                    let verdict = evaluate(&directives, &self.options.agent_tokens);
                    let ai = ai_restriction(&directives, &self.options.ai_agent_tokens);
                    tracker.advance(CheckState::Done);

                    tracing::debug!(
                        status_code,
                        crawlable = verdict.crawlable,
                        ai_restricted = ai.restricted,
                        state = %tracker.state(),
                        "robots.txt evaluated"
                    );

                    return RobotsCheckResult {
                        domain: domain.clone(),
                        fetched_scheme: scheme.into(),
                        http_status: Some(status_code),
                        robots_url: last_url,
                        robots_exists: true,
                        crawlable_generic: verdict.crawlable,
                        crawl_delay_seconds: verdict.crawl_delay,
                        ai_restricted: ai.restricted,
                        ai_agents_blocked: ai.blocked_agents,
                        sitemaps: directives.sitemaps().to_vec(),
                        error: None,
                        response_time_ms: elapsed_ms(started),
                        checked_at: Utc::now(),
                    };
                }
                FetchOutcome::Missing { status_code } => {
                    tracker.advance(CheckState::Done);
                    tracing::debug!(status_code, "No robots.txt, crawling allowed");

                    return RobotsCheckResult {
                        domain: domain.clone(),
                        fetched_scheme: scheme.into(),
                        http_status: Some(status_code),
                        robots_url: last_url,
                        robots_exists: false,
                        crawlable_generic: true,
                        crawl_delay_seconds: None,
                        ai_restricted: false,
                        ai_agents_blocked: Vec::new(),
                        sitemaps: Vec::new(),
                        error: None,
                        response_time_ms: elapsed_ms(started),
                        checked_at: Utc::now(),
                    };
                }
                FetchOutcome::Failed { status_code, error } => {
                    tracing::debug!(scheme = %scheme, status_code = ?status_code, error = %error, "Attempt failed");
                    if status_code.is_some() {
                        last_status = status_code;
                    }
                    errors.push(format!("{}: {}", scheme, error));
                }
            }
        }

        tracker.advance(CheckState::Done);
        let error = errors.join("; ");
        tracing::info!(error = %error, "robots.txt unreachable, marking not crawlable");

        RobotsCheckResult {
            domain: domain.clone(),
            fetched_scheme: FetchedScheme::None,
            http_status: last_status,
            robots_url: last_url,
            robots_exists: false,
            crawlable_generic: false,
            crawl_delay_seconds: None,
            ai_restricted: false,
            ai_agents_blocked: Vec::new(),
            sitemaps: Vec::new(),
            error: Some(error),
            response_time_ms: elapsed_ms(started),
            checked_at: Utc::now(),
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
