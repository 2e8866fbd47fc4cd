//! HTTP fetcher for robots.txt
//!
//! This module handles the robots.txt requests of the checker:
//! - Building the shared HTTP client with the configured user agent
//! - Reading bodies up to the robots.txt size cap
//! - Classifying each attempt as found, missing or failed

use crate::checker::Scheme;
use crate::robots::MAX_ROBOTS_BYTES;
use crate::url::Domain;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;

/// Maximum redirect hops followed for one robots.txt request
const MAX_REDIRECTS: usize = 10;

/// Decides where a domain's robots.txt lives
pub trait RobotsLocator: Send + Sync {
    /// Returns the robots.txt URL for `domain` over `scheme`
    fn robots_url(&self, domain: &Domain, scheme: Scheme) -> String;
}

/// The standard location, `{scheme}://{domain}/robots.txt`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLocator;

impl RobotsLocator for DefaultLocator {
    fn robots_url(&self, domain: &Domain, scheme: Scheme) -> String {
        format!("{}://{}/robots.txt", scheme, domain)
    }
}

/// Result of one robots.txt attempt
#[derive(Debug)]
pub enum FetchOutcome {
    /// 2xx response; body read up to the size cap
    Found {
        /// HTTP status code
        status_code: u16,
        /// Body bytes; longer than `MAX_ROBOTS_BYTES` only when the response
        /// exceeded the cap, by a single byte
        body: Vec<u8>,
    },

    /// 404 or 410: the site has no robots.txt
    Missing {
        /// HTTP status code
        status_code: u16,
    },

    /// Any other status, or no usable response at all
    Failed {
        /// HTTP status code, if a response arrived
        status_code: Option<u16>,
        /// Error description
        error: String,
    },
}

/// Builds the HTTP client shared by all checker workers
///
/// Redirects are followed (up to 10 hops) so that a 2xx at the end of a
/// redirect chain counts as found.
///
/// # Arguments
///
/// * `user_agent` - The `User-Agent` header sent with every request
/// * `timeout` - Per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one robots.txt URL
///
/// # Classification
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | 2xx | Found |
/// | 404, 410 | Missing |
/// | Other status (401, 403, 429, 5xx, unresolved 3xx) | Failed |
/// | Timeout, DNS, connection or TLS error | Failed |
///
/// The whole attempt, body included, is bounded by `timeout`.
pub async fn fetch_robots(client: &Client, url: &str, timeout: Duration) -> FetchOutcome {
    match tokio::time::timeout(timeout, fetch_inner(client, url)).await {
        Ok(outcome) => outcome,
        Err(_) => FetchOutcome::Failed {
            status_code: None,
            error: format!("timed out after {}s", timeout.as_secs_f64()),
        },
    }
}

async fn fetch_inner(client: &Client, url: &str) -> FetchOutcome {
    let mut response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            return FetchOutcome::Failed {
                status_code: e.status().map(|s| s.as_u16()),
                error: describe_error(&e),
            }
        }
    };

    let status = response.status();

    if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        return FetchOutcome::Missing {
            status_code: status.as_u16(),
        };
    }

    if !status.is_success() {
        return FetchOutcome::Failed {
            status_code: Some(status.as_u16()),
            error: format!("HTTP {}", status.as_u16()),
        };
    }

    // One byte past the cap is kept so the parser can flag the truncation
    let read_limit = MAX_ROBOTS_BYTES + 1;
    let mut body = Vec::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let remaining = read_limit - body.len();
                if chunk.len() >= remaining {
                    body.extend_from_slice(&chunk[..remaining]);
                    if body.len() > MAX_ROBOTS_BYTES {
                        tracing::debug!(url, limit = MAX_ROBOTS_BYTES, "robots.txt truncated");
                    }
                    break;
                }
                body.extend_from_slice(&chunk);
            }
            Ok(None) => break,
            Err(e) => {
                return FetchOutcome::Failed {
                    status_code: Some(status.as_u16()),
                    error: format!("body read failed: {}", describe_error(&e)),
                }
            }
        }
    }

    FetchOutcome::Found {
        status_code: status.as_u16(),
        body,
    }
}

fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("timeout: {}", error)
    } else if error.is_redirect() {
        format!("redirect error: {}", error)
    } else if error.is_connect() {
        format!("connection error: {}", error)
    } else {
        error.to_string()
    }
}
