//! Shared helpers for the integration tests

use robots_gate::checker::{CheckerOptions, RobotsChecker, RobotsLocator, Scheme};
use robots_gate::url::{parse_domain, Domain};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Routes every robots.txt request to the mock server
///
/// `{domain}` over HTTPS becomes `{server}/https/{domain}/robots.txt`, and
/// likewise for HTTP, so one server can answer for many domains and both
/// schemes independently. Unmounted paths answer 404.
pub struct MockLocator {
    base: String,
}

impl MockLocator {
    pub fn new(server: &MockServer) -> Self {
        Self { base: server.uri() }
    }
}

impl RobotsLocator for MockLocator {
    fn robots_url(&self, domain: &Domain, scheme: Scheme) -> String {
        format!("{}/{}/{}/robots.txt", self.base, scheme, domain)
    }
}

/// Path the mock server sees for `domain` over `scheme`
pub fn robots_path(domain: &str, scheme: Scheme) -> String {
    format!("/{}/{}/robots.txt", scheme, domain)
}

pub fn test_options() -> CheckerOptions {
    CheckerOptions {
        user_agent: "TestBot/1.0".to_string(),
        timeout: Duration::from_secs(2),
        max_workers: 4,
        ..CheckerOptions::default()
    }
}

pub fn mock_checker(server: &MockServer, options: CheckerOptions) -> RobotsChecker {
    RobotsChecker::with_locator(options, Arc::new(MockLocator::new(server)))
        .expect("Failed to build checker")
}

pub fn domain(name: &str) -> Domain {
    parse_domain(name).expect("Invalid test domain")
}

/// Mounts a robots.txt body for `domain` on one scheme
pub async fn mount_robots(server: &MockServer, domain: &str, scheme: Scheme, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(robots_path(domain, scheme)))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}
