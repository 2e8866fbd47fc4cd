//! Integration tests for the robots.txt checker

use crate::common::{domain, mock_checker, mount_robots, robots_path, test_options};
use robots_gate::checker::{
    build_http_client, fetch_robots, DomainLabel, FetchOutcome, FetchedScheme, Scheme, CANCELLED_ERROR,
};
use robots_gate::robots::{evaluate, RobotsDirectives, MAX_ROBOTS_BYTES};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_generic_and_ai_block() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        "x.test",
        Scheme::Https,
        200,
        "User-agent: *\nDisallow: /\nUser-agent: GPTBot\nDisallow: /",
    )
    .await;

    let checker = mock_checker(&server, test_options());
    let result = checker.check_domain(&domain("x.test")).await;

    assert_eq!(result.fetched_scheme, FetchedScheme::Https);
    assert_eq!(result.http_status, Some(200));
    assert!(result.robots_exists);
    assert!(!result.crawlable_generic);
    assert!(result.ai_restricted);
    assert!(result.ai_agents_blocked.contains(&"GPTBot".to_string()));
    assert_eq!(result.label(), DomainLabel::Blocked);
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_private_path_leaves_root_crawlable() {
    let server = MockServer::start().await;
    mount_robots(&server, "y.test", Scheme::Https, 200, "User-agent: *\nDisallow: /private").await;

    let checker = mock_checker(&server, test_options());
    let result = checker.check_domain(&domain("y.test")).await;

    assert!(result.crawlable_generic);
    assert!(!result.ai_restricted);
    assert!(result.ai_agents_blocked.is_empty());
    assert_eq!(result.label(), DomainLabel::Crawlable);
}

#[tokio::test]
async fn test_ai_only_block_keeps_generic_verdict() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        "ai.test",
        Scheme::Https,
        200,
        "User-agent: CCBot\nDisallow: /\n\nUser-agent: *\nAllow: /\nCrawl-delay: 2.5\nSitemap: https://ai.test/sitemap.xml",
    )
    .await;

    let checker = mock_checker(&server, test_options());
    let result = checker.check_domain(&domain("ai.test")).await;

    assert!(result.crawlable_generic);
    assert!(result.ai_restricted);
    assert_eq!(result.ai_agents_blocked, vec!["CCBot".to_string()]);
    assert_eq!(result.crawl_delay_seconds, Some(2.5));
    assert_eq!(result.sitemaps, vec!["https://ai.test/sitemap.xml".to_string()]);
}

#[tokio::test]
async fn test_empty_body_is_crawlable() {
    let server = MockServer::start().await;
    mount_robots(&server, "empty.test", Scheme::Https, 200, "").await;

    let checker = mock_checker(&server, test_options());
    let result = checker.check_domain(&domain("empty.test")).await;

    assert!(result.robots_exists);
    assert!(result.crawlable_generic);
    assert!(result.crawl_delay_seconds.is_none());
}

#[tokio::test]
async fn test_missing_robots_allows_without_fallback() {
    let server = MockServer::start().await;
    mount_robots(&server, "gone.test", Scheme::Https, 404, "").await;
    Mock::given(method("GET"))
        .and(path(robots_path("gone.test", Scheme::Http)))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .expect(0)
        .mount(&server)
        .await;

    let checker = mock_checker(&server, test_options());
    let result = checker.check_domain(&domain("gone.test")).await;

    assert_eq!(result.fetched_scheme, FetchedScheme::Https);
    assert_eq!(result.http_status, Some(404));
    assert!(!result.robots_exists);
    assert!(result.crawlable_generic);
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_server_error_falls_back_to_http() {
    let server = MockServer::start().await;
    mount_robots(&server, "flaky.test", Scheme::Https, 500, "").await;
    mount_robots(&server, "flaky.test", Scheme::Http, 200, "User-agent: *\nDisallow: /").await;

    let checker = mock_checker(&server, test_options());
    let result = checker.check_domain(&domain("flaky.test")).await;

    assert_eq!(result.fetched_scheme, FetchedScheme::Http);
    assert_eq!(result.http_status, Some(200));
    assert!(result.robots_url.unwrap().contains("/http/flaky.test/"));
    assert!(!result.crawlable_generic);
}

#[tokio::test]
async fn test_both_schemes_erroring_is_blocked() {
    let server = MockServer::start().await;
    mount_robots(&server, "down.test", Scheme::Https, 503, "").await;
    mount_robots(&server, "down.test", Scheme::Http, 500, "").await;

    let checker = mock_checker(&server, test_options());
    let result = checker.check_domain(&domain("down.test")).await;

    assert_eq!(result.fetched_scheme, FetchedScheme::None);
    assert_eq!(result.http_status, Some(500));
    assert!(!result.crawlable_generic);
    assert_eq!(result.label(), DomainLabel::Blocked);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn test_timeout_falls_back_to_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(robots_path("slow.test", Scheme::Https)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nDisallow: /")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    mount_robots(&server, "slow.test", Scheme::Http, 200, "User-agent: *\nAllow: /").await;

    let mut options = test_options();
    options.timeout = Duration::from_secs(1);
    let checker = mock_checker(&server, options);
    let result = checker.check_domain(&domain("slow.test")).await;

    assert_eq!(result.fetched_scheme, FetchedScheme::Http);
    assert!(result.crawlable_generic);
}

#[tokio::test]
async fn test_user_agent_header_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(robots_path("ua.test", Scheme::Https)))
        .and(header("user-agent", "TestBot/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .expect(1)
        .mount(&server)
        .await;

    let checker = mock_checker(&server, test_options());
    let result = checker.check_domain(&domain("ua.test")).await;

    // An unmatched request would fall through to a 404 and read as crawlable
    assert!(!result.crawlable_generic);
}

#[tokio::test]
async fn test_check_all_labels_every_domain() {
    let server = MockServer::start().await;
    mount_robots(&server, "open.test", Scheme::Https, 200, "User-agent: *\nAllow: /").await;
    mount_robots(&server, "closed.test", Scheme::Https, 200, "User-agent: *\nDisallow: /").await;
    mount_robots(&server, "broken.test", Scheme::Https, 500, "").await;
    mount_robots(&server, "broken.test", Scheme::Http, 500, "").await;

    let checker = mock_checker(&server, test_options());
    let domains = vec![
        domain("open.test"),
        domain("closed.test"),
        domain("broken.test"),
        domain("nofile.test"),
        domain("open.test"),
    ];

    let report = checker.check_all(domains, CancellationToken::new()).await.unwrap();

    assert_eq!(report.len(), 4);
    let labels = report.labels();
    assert_eq!(labels.get("open.test"), Some(&DomainLabel::Crawlable));
    assert_eq!(labels.get("closed.test"), Some(&DomainLabel::Blocked));
    assert_eq!(labels.get("broken.test"), Some(&DomainLabel::Blocked));
    assert_eq!(labels.get("nofile.test"), Some(&DomainLabel::Crawlable));
    assert_eq!(report.crawlable_count(), 2);
    assert_eq!(report.cancelled_count(), 0);
}

#[tokio::test]
async fn test_single_worker_processes_whole_queue() {
    let server = MockServer::start().await;
    let mut options = test_options();
    options.max_workers = 1;
    let checker = mock_checker(&server, options);

    let domains: Vec<_> = (0..12).map(|i| domain(&format!("site{}.test", i))).collect();
    let report = checker.check_all(domains, CancellationToken::new()).await.unwrap();

    assert_eq!(report.len(), 12);
    assert_eq!(report.crawlable_count(), 12);
}

#[tokio::test]
async fn test_cancellation_skips_http_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(robots_path("stall.test", Scheme::Https)))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(robots_path("stall.test", Scheme::Http)))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
        .expect(0)
        .mount(&server)
        .await;

    let mut options = test_options();
    options.timeout = Duration::from_secs(1);
    let checker = mock_checker(&server, options);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let report = checker.check_all(vec![domain("stall.test")], cancel).await.unwrap();
    let result = report.get("stall.test").unwrap();

    assert_eq!(result.fetched_scheme, FetchedScheme::None);
    assert_eq!(result.label(), DomainLabel::Blocked);
    let error = result.error.as_deref().unwrap();
    assert!(error.starts_with("https:"));
    assert!(error.ends_with(CANCELLED_ERROR));
    assert_eq!(report.cancelled_count(), 1);

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| !r.url.path().starts_with("/http/")));
}

#[tokio::test]
async fn test_pool_never_exceeds_worker_limit() {
    const DOMAINS: u32 = 12;
    const WORKERS: u32 = 3;
    let delay = Duration::from_millis(300);

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nAllow: /")
                .set_delay(delay),
        )
        .mount(&server)
        .await;

    let mut options = test_options();
    options.max_workers = WORKERS as usize;
    let checker = mock_checker(&server, options);

    let domains: Vec<_> = (0..DOMAINS).map(|i| domain(&format!("pool{}.test", i))).collect();
    let started = Instant::now();
    let report = checker.check_all(domains, CancellationToken::new()).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(report.crawlable_count(), DOMAINS as usize);
    assert_eq!(server.received_requests().await.unwrap().len(), DOMAINS as usize);

    // Three workers need four rounds; more in flight would finish sooner
    let rounds = DOMAINS.div_ceil(WORKERS);
    assert!(elapsed >= delay * rounds, "finished in {:?}", elapsed);
    // One worker at a time would need twelve rounds
    assert!(elapsed < delay * DOMAINS, "finished in {:?}", elapsed);
}

#[tokio::test]
async fn test_oversized_robots_reported_truncated() {
    let server = MockServer::start().await;
    let mut body = "User-agent: *\nDisallow: /\n".to_string();
    body.push_str(&"# padding\n".repeat(MAX_ROBOTS_BYTES / 10 + 10));
    mount_robots(&server, "huge.test", Scheme::Https, 200, &body).await;

    let url = format!("{}{}", server.uri(), robots_path("huge.test", Scheme::Https));
    let client = build_http_client("TestBot/1.0", Duration::from_secs(5)).unwrap();

    let FetchOutcome::Found { body, .. } = fetch_robots(&client, &url, Duration::from_secs(5)).await else {
        panic!("expected a robots.txt body");
    };
    assert_eq!(body.len(), MAX_ROBOTS_BYTES + 1);

    let directives = RobotsDirectives::parse_bytes(&body);
    assert!(directives.was_truncated());
    assert!(!evaluate(&directives, &[] as &[&str]).crawlable);

    let exact = RobotsDirectives::parse_bytes(&body[..MAX_ROBOTS_BYTES]);
    assert!(!exact.was_truncated());
}
