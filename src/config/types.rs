use crate::checker::{CheckerOptions, DEFAULT_MAX_WORKERS, DEFAULT_USER_AGENT};
use crate::registry::{RecordFields, DEFAULT_SAMPLE_URL_LIMIT};
use crate::robots::DEFAULT_AI_AGENTS;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Robots-Gate
///
/// Every section is optional; missing values take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub checker: CheckerConfig,
    pub ingest: IngestConfig,
    pub output: OutputConfig,
}

/// Robots.txt checker configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-seconds")]
    pub timeout_seconds: u64,

    /// Number of concurrent robots.txt checks
    #[serde(rename = "max-workers")]
    pub max_workers: usize,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Agent tokens for the generic verdict, most specific first
    #[serde(rename = "agent-tokens")]
    pub agent_tokens: Vec<String>,

    /// AI-agent block-list
    #[serde(rename = "ai-agent-tokens")]
    pub ai_agent_tokens: Vec<String>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            max_workers: DEFAULT_MAX_WORKERS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            agent_tokens: Vec::new(),
            ai_agent_tokens: DEFAULT_AI_AGENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CheckerConfig {
    /// Converts the section into checker options
    pub fn to_options(&self) -> CheckerOptions {
        CheckerOptions {
            user_agent: self.user_agent.clone(),
            agent_tokens: self.agent_tokens.clone(),
            ai_agent_tokens: self.ai_agent_tokens.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
            max_workers: self.max_workers,
        }
    }
}

/// Record ingestion configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// JSON field holding the record URL
    #[serde(rename = "url-field")]
    pub url_field: String,

    /// JSON fields tried in order for the record timestamp
    #[serde(rename = "timestamp-fields")]
    pub timestamp_fields: Vec<String>,

    /// Stop reading each input after this many records
    #[serde(rename = "max-records")]
    pub max_records: Option<u64>,

    /// Sample URLs kept per domain
    #[serde(rename = "sample-url-limit")]
    pub sample_url_limit: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        let fields = RecordFields::default();
        Self {
            url_field: fields.url_field,
            timestamp_fields: fields.timestamp_fields,
            max_records: None,
            sample_url_limit: DEFAULT_SAMPLE_URL_LIMIT,
        }
    }
}

impl IngestConfig {
    pub fn record_fields(&self) -> RecordFields {
        RecordFields {
            url_field: self.url_field.clone(),
            timestamp_fields: self.timestamp_fields.clone(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for reports and filtered record files
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
        }
    }
}
