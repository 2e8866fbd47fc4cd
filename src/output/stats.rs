//! Crawlability statistics and recommendations
//!
//! This module summarizes a checker run: label counts, robots.txt presence,
//! crawl-delay and status-code distributions, a per-TLD breakdown, and
//! per-domain crawl advice.

use crate::checker::RobotsCheckResult;
use crate::url::{extract_tld, Domain};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Crawl delay above which a crawlable domain needs caution (seconds)
const CAUTION_DELAY_SECONDS: f64 = 10.0;

/// Per-TLD counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TldBreakdown {
    pub total: u64,
    pub crawlable: u64,
    pub robots_exists: u64,
}

/// Summary statistics of a checker run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlabilityStats {
    pub total_domains: u64,
    pub crawlable_domains: u64,
    pub non_crawlable_domains: u64,
    pub robots_exists_count: u64,
    pub error_count: u64,
    pub ai_restricted_count: u64,
    pub domains_with_sitemap: u64,

    /// Mean of the positive crawl delays, rounded to two decimals
    pub avg_crawl_delay: f64,

    pub tld_analysis: BTreeMap<String, TldBreakdown>,
    pub crawl_delay_distribution: BTreeMap<String, u64>,

    /// Keyed by status code, `none` when no response arrived
    pub status_code_distribution: BTreeMap<String, u64>,
}

impl CrawlabilityStats {
    /// Computes statistics over check results
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a RobotsCheckResult>,
    {
        let mut stats = Self::default();
        let mut delays = Vec::new();

        for result in results {
            stats.total_domains += 1;
            if result.crawlable_generic {
                stats.crawlable_domains += 1;
            } else {
                stats.non_crawlable_domains += 1;
            }
            if result.robots_exists {
                stats.robots_exists_count += 1;
            }
            if result.error.is_some() {
                stats.error_count += 1;
            }
            if result.ai_restricted {
                stats.ai_restricted_count += 1;
            }
            if !result.sitemaps.is_empty() {
                stats.domains_with_sitemap += 1;
            }

            if let Some(delay) = result.crawl_delay_seconds.filter(|d| *d > 0.0) {
                delays.push(delay);
                *stats
                    .crawl_delay_distribution
                    .entry(delay_bucket(delay).to_string())
                    .or_insert(0) += 1;
            }

            let tld = match extract_tld(result.domain.as_str()) {
                "" => "unknown",
                tld => tld,
            };
            let breakdown = stats.tld_analysis.entry(tld.to_string()).or_default();
            breakdown.total += 1;
            if result.crawlable_generic {
                breakdown.crawlable += 1;
            }
            if result.robots_exists {
                breakdown.robots_exists += 1;
            }

            let status = result
                .http_status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "none".to_string());
            *stats.status_code_distribution.entry(status).or_insert(0) += 1;
        }

        if !delays.is_empty() {
            let mean = delays.iter().sum::<f64>() / delays.len() as f64;
            stats.avg_crawl_delay = (mean * 100.0).round() / 100.0;
        }

        stats
    }

    /// Percentage of domains labeled crawlable; 0 for an empty run
    pub fn crawlable_rate(&self) -> f64 {
        percentage(self.crawlable_domains, self.total_domains)
    }
}

/// Returns the distribution bucket of a crawl delay
pub fn delay_bucket(delay: f64) -> &'static str {
    if delay <= 1.0 {
        "0-1s"
    } else if delay <= 5.0 {
        "1-5s"
    } else if delay <= 10.0 {
        "5-10s"
    } else {
        "10s+"
    }
}

/// Crawl advice for one domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainAdvice {
    pub domain: Domain,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub crawl_delay: Option<f64>,
}

/// Per-domain advice grouped by category, plus run-level advice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub safe_to_crawl: Vec<DomainAdvice>,
    pub crawl_with_caution: Vec<DomainAdvice>,
    pub do_not_crawl: Vec<DomainAdvice>,
    pub general_advice: Vec<String>,
}

impl Recommendations {
    /// Sorts every domain into one advice category
    ///
    /// # Categories
    ///
    /// | Result | Category |
    /// |--------|----------|
    /// | Check error | do_not_crawl |
    /// | Generic verdict denies | do_not_crawl |
    /// | Crawl delay above 10s | crawl_with_caution |
    /// | Otherwise | safe_to_crawl |
    pub fn generate<'a, I>(results: I, stats: &CrawlabilityStats) -> Self
    where
        I: IntoIterator<Item = &'a RobotsCheckResult>,
    {
        let mut recs = Self::default();

        for result in results {
            let domain = result.domain.clone();
            if let Some(error) = &result.error {
                recs.do_not_crawl.push(DomainAdvice {
                    domain,
                    reason: Some(format!("check failed: {}", error)),
                    crawl_delay: None,
                });
            } else if !result.crawlable_generic {
                recs.do_not_crawl.push(DomainAdvice {
                    domain,
                    reason: Some("robots.txt disallows crawling".to_string()),
                    crawl_delay: None,
                });
            } else if let Some(delay) = result
                .crawl_delay_seconds
                .filter(|d| *d > CAUTION_DELAY_SECONDS)
            {
                recs.crawl_with_caution.push(DomainAdvice {
                    domain,
                    reason: Some(format!("requests a crawl delay of {}s", delay)),
                    crawl_delay: Some(delay),
                });
            } else {
                recs.safe_to_crawl.push(DomainAdvice {
                    domain,
                    reason: None,
                    crawl_delay: Some(result.crawl_delay_seconds.unwrap_or(0.0)),
                });
            }
        }

        let rate = stats.crawlable_rate();
        let advice = if rate > 80.0 {
            "Most domains allow crawling; overall risk is low"
        } else if rate > 50.0 {
            "About half of the domains allow crawling; review robots.txt rules carefully"
        } else {
            "Most domains restrict crawling; proceed with caution"
        };
        recs.general_advice.push(advice.to_string());

        if stats.avg_crawl_delay > 5.0 {
            recs.general_advice.push(format!(
                "Average crawl delay is {}s; plan crawl throughput accordingly",
                stats.avg_crawl_delay
            ));
        }

        if stats.ai_restricted_count > 0 {
            recs.general_advice.push(format!(
                "{} domains restrict AI crawlers; exclude them from AI training data",
                stats.ai_restricted_count
            ));
        }

        recs
    }
}

pub(crate) fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlabilityStats) {
    let total = stats.total_domains;

    println!("=== Crawlability Statistics ===\n");

    println!("Overview:");
    println!("  Total domains: {}", total);
    println!(
        "  Crawlable: {} ({:.1}%)",
        stats.crawlable_domains,
        percentage(stats.crawlable_domains, total)
    );
    println!(
        "  Not crawlable: {} ({:.1}%)",
        stats.non_crawlable_domains,
        percentage(stats.non_crawlable_domains, total)
    );
    println!(
        "  With robots.txt: {} ({:.1}%)",
        stats.robots_exists_count,
        percentage(stats.robots_exists_count, total)
    );
    println!("  AI restricted: {}", stats.ai_restricted_count);
    println!("  Check errors: {}", stats.error_count);
    if stats.avg_crawl_delay > 0.0 {
        println!("  Average crawl delay: {}s", stats.avg_crawl_delay);
    }
    println!();

    if !stats.status_code_distribution.is_empty() {
        println!("Status Codes:");
        let mut codes: Vec<_> = stats.status_code_distribution.iter().collect();
        codes.sort_by(|a, b| b.1.cmp(a.1));
        for (code, count) in codes {
            println!("  {}: {}", code, count);
        }
        println!();
    }

    if !stats.tld_analysis.is_empty() {
        println!("Top TLDs:");
        let mut tlds: Vec<_> = stats.tld_analysis.iter().collect();
        tlds.sort_by(|a, b| b.1.total.cmp(&a.1.total));
        for (tld, breakdown) in tlds.into_iter().take(10) {
            println!(
                "  .{}: {} domains, {} crawlable",
                tld, breakdown.total, breakdown.crawlable
            );
        }
        println!();
    }
}
