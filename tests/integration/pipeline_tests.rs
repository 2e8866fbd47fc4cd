//! End-to-end tests for the extract → check → filter pipeline

use crate::common::{domain, mock_checker, mount_robots, test_options};
use robots_gate::checker::{DomainLabel, Scheme};
use robots_gate::config::Config;
use robots_gate::filter::LabelMap;
use robots_gate::output::{load_domain_list, load_label_map};
use robots_gate::pipeline::Pipeline;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

const RECORDS: &str = r#"{"url": "https://open.test/a", "timestamp": "2024-01-02T03:04:05Z"}
{"url": "https://Open.test:8443/b?q=1", "date": "2024-02-01"}
{"url": "https://closed.test/x"}
{"url": "http://ai.test/p"}
{"text": "no url here"}
not json at all

{"url": "mailto:someone@example.com"}
"#;

fn test_config(output: &Path) -> Config {
    let mut config = Config::default();
    config.output.directory = output.to_path_buf();
    config
}

fn write_input(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write input");
    path
}

/// Finds the single report written with `prefix` in `dir`
fn find_report(dir: &Path, prefix: &str) -> PathBuf {
    let matches: Vec<PathBuf> = std::fs::read_dir(dir)
        .expect("Failed to list output directory")
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix) && n.ends_with(".json"))
        })
        .collect();
    assert_eq!(matches.len(), 1, "expected one {} report", prefix);
    matches.into_iter().next().unwrap()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

async fn mount_sites(server: &MockServer) {
    mount_robots(server, "open.test", Scheme::Https, 200, "User-agent: *\nAllow: /").await;
    mount_robots(server, "closed.test", Scheme::Https, 200, "User-agent: *\nDisallow: /").await;
    mount_robots(
        server,
        "ai.test",
        Scheme::Https,
        200,
        "User-agent: GPTBot\nDisallow: /\n\nUser-agent: *\nDisallow: /admin",
    )
    .await;
}

#[tokio::test]
async fn test_full_pipeline_run() {
    let server = MockServer::start().await;
    mount_sites(&server).await;

    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let input = write_input(&input_dir, "part-01.jsonl", RECORDS);

    let pipeline = Pipeline::new(test_config(output_dir.path()), Some("abc123".to_string()));
    let checker = mock_checker(&server, test_options());

    let summary = pipeline
        .run(&[input], &checker, CancellationToken::new())
        .await
        .expect("Pipeline run failed");

    assert!(summary.success);
    assert!(!summary.cancelled);
    assert!(summary.error.is_none());

    let extract = summary.steps.extract.as_ref().unwrap();
    assert_eq!(extract.total_domains, 3);
    assert_eq!(extract.ingest.records_read, 7);
    assert_eq!(extract.ingest.records_ingested, 4);
    assert_eq!(extract.ingest.malformed_lines, 1);

    let check = summary.steps.check.as_ref().unwrap();
    assert_eq!(check.total_checked, 3);
    assert_eq!(check.crawlable_count, 2);
    assert_eq!(check.ai_restricted_count, 1);

    let filter = summary.steps.filter.as_ref().unwrap();
    assert_eq!(filter.total_processed, 7);
    assert_eq!(filter.total_kept, 3);

    // Domain list reports
    let domains = load_domain_list(&find_report(output_dir.path(), "extracted_domains_")).unwrap();
    let names: Vec<&str> = domains.iter().map(|d| d.as_str()).collect();
    assert_eq!(names, vec!["ai.test", "closed.test", "open.test"]);

    let stats = read_json(&find_report(output_dir.path(), "domain_stats_"));
    assert_eq!(stats["domains"]["open.test"]["count"], 2);
    assert_eq!(stats["metadata"]["config_hash"], "abc123");

    let ranked = read_json(&find_report(output_dir.path(), "domains_ranked_"));
    assert_eq!(ranked["domains"][0]["domain"], "open.test");
    assert_eq!(ranked["domains"][0]["rank"], 1);

    // Check reports
    let labels = load_label_map(&find_report(output_dir.path(), "domain_labels_")).unwrap();
    assert_eq!(labels.get("open.test"), Some(&DomainLabel::Crawlable));
    assert_eq!(labels.get("closed.test"), Some(&DomainLabel::Blocked));
    assert_eq!(labels.get("ai.test"), Some(&DomainLabel::Crawlable));

    let raw_labels = read_json(&find_report(output_dir.path(), "domain_labels_"));
    assert_eq!(raw_labels["domain_labels"]["closed.test"], 0);
    assert_eq!(raw_labels["domain_labels"]["open.test"], 1);

    let results = read_json(&find_report(output_dir.path(), "crawlability_results_"));
    assert_eq!(results["results"].as_array().unwrap().len(), 3);
    assert_eq!(results["statistics"]["ai_restricted_count"], 1);

    // Record files
    let kept = read_lines(&output_dir.path().join("filtered_part-01.jsonl"));
    assert_eq!(kept.len(), 3);
    assert!(kept.iter().all(|l| l.contains("open.test") || l.contains("ai.test")));
    assert!(kept[1].contains("Open.test:8443/b?q=1"), "records are copied verbatim");

    let rejected = read_lines(&output_dir.path().join("rejected_part-01.jsonl"));
    assert_eq!(rejected.len(), 4);
    assert!(rejected.iter().any(|l| l == "not json at all"));

    let report = read_json(&find_report(output_dir.path(), "filtering_report_"));
    assert_eq!(report["summary"]["records_kept"], 3);
    assert_eq!(report["summary"]["reasons"]["labeled-deny"], 1);
    assert_eq!(report["summary"]["reasons"]["unparseable-url"], 3);

    let pipeline_summary = read_json(&find_report(output_dir.path(), "pipeline_summary_"));
    assert_eq!(pipeline_summary["success"], true);
}

#[tokio::test]
async fn test_cancelled_run_skips_filtering() {
    let server = MockServer::start().await;
    mount_sites(&server).await;

    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let input = write_input(&input_dir, "records.jsonl", RECORDS);

    let pipeline = Pipeline::new(test_config(output_dir.path()), None);
    let checker = mock_checker(&server, test_options());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let summary = pipeline.run(&[input], &checker, cancel).await.unwrap();

    assert!(summary.cancelled);
    assert!(!summary.success);
    assert!(summary.steps.filter.is_none());

    let check = summary.steps.check.as_ref().unwrap();
    assert_eq!(check.cancelled_count, 3);
    assert_eq!(check.crawlable_count, 0);

    assert!(!output_dir.path().join("filtered_records.jsonl").exists());
    find_report(output_dir.path(), "pipeline_summary_");
}

#[tokio::test]
async fn test_run_without_inputs_still_writes_summary() {
    let server = MockServer::start().await;
    let output_dir = TempDir::new().unwrap();

    let pipeline = Pipeline::new(test_config(output_dir.path()), None);
    let checker = mock_checker(&server, test_options());

    let result = pipeline.run(&[], &checker, CancellationToken::new()).await;
    assert!(result.is_err());

    let summary = read_json(&find_report(output_dir.path(), "pipeline_summary_"));
    assert_eq!(summary["success"], false);
    assert!(summary["error"].as_str().unwrap().contains("no input files"));
}

#[test]
fn test_filter_rejects_unknown_domains() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let input = write_input(
        &input_dir,
        "shard.jsonl",
        "{\"url\": \"https://known.test/\"}\n{\"url\": \"https://stranger.test/\"}\n",
    );

    let labels: HashMap<_, _> = [(domain("known.test"), DomainLabel::Crawlable)].into_iter().collect();
    let pipeline = Pipeline::new(test_config(output_dir.path()), None);

    let (report, summary) = pipeline
        .filter(LabelMap::new(labels), &[input], &CancellationToken::new())
        .unwrap();

    assert_eq!(summary.total_processed, 2);
    assert_eq!(summary.total_kept, 1);
    assert_eq!(report.summary.reasons.unknown_domain, 1);
    assert_eq!(report.file_details.len(), 1);

    let rejected = read_lines(&output_dir.path().join("rejected_shard.jsonl"));
    assert_eq!(rejected, vec!["{\"url\": \"https://stranger.test/\"}".to_string()]);
}

#[test]
fn test_extract_respects_record_limit() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let input = write_input(&input_dir, "big.jsonl", RECORDS);

    let mut config = test_config(output_dir.path());
    config.ingest.max_records = Some(2);
    let pipeline = Pipeline::new(config, None);

    let (registry, summary) = pipeline.extract(&[input]).unwrap();
    assert_eq!(summary.ingest.records_read, 2);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get("open.test").unwrap().count, 2);
}

#[test]
fn test_filter_keeps_inputs_sharing_a_file_name_apart() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    std::fs::create_dir_all(input_dir.path().join("a")).unwrap();
    std::fs::create_dir_all(input_dir.path().join("b")).unwrap();
    let first = write_input(&input_dir, "a/part.jsonl", "{\"url\":\"https://ok.com/1\"}\n");
    let second = write_input(&input_dir, "b/part.jsonl", "{\"url\":\"https://ok.com/2\"}\n");

    let labels: HashMap<_, _> = [(domain("ok.com"), DomainLabel::Crawlable)].into_iter().collect();
    let pipeline = Pipeline::new(test_config(output_dir.path()), None);

    let (report, summary) = pipeline
        .filter(LabelMap::new(labels), &[first, second], &CancellationToken::new())
        .unwrap();
    assert_eq!(summary.total_kept, 2);

    let kept_files: Vec<&PathBuf> = report.file_details.iter().map(|d| &d.kept_file).collect();
    assert_ne!(kept_files[0], kept_files[1]);

    let kept: Vec<String> = kept_files.iter().flat_map(|path| read_lines(path)).collect();
    assert_eq!(
        kept,
        vec![
            "{\"url\":\"https://ok.com/1\"}".to_string(),
            "{\"url\":\"https://ok.com/2\"}".to_string(),
        ]
    );
    assert!(output_dir.path().join("filtered_1_part.jsonl").exists());
    assert!(output_dir.path().join("filtered_2_part.jsonl").exists());
}
