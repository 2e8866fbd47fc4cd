//! Robots-Gate: robots.txt compliance labeling for crawl corpora
//!
//! This crate extracts the distinct domains of a record corpus, checks each
//! domain's live robots.txt (generic and AI-agent rules), and partitions the
//! corpus records into kept and rejected streams according to the verdicts.

pub mod checker;
pub mod config;
pub mod filter;
pub mod output;
pub mod pipeline;
pub mod registry;
pub mod robots;
pub mod url;

use thiserror::Error;

/// Main error type for Robots-Gate operations
#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read input {path}: {source}")]
    Input {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write output {path}: {source}")]
    Output {
        path: String,
        source: std::io::Error,
    },

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid agent token: {0}")]
    InvalidAgentToken(String),
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed host: {0}")]
    Malformed(String),
}

/// Result type alias for Robots-Gate operations
pub type Result<T> = std::result::Result<T, ComplianceError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use checker::{CheckReport, DomainLabel, RobotsCheckResult, RobotsChecker};
pub use config::Config;
pub use filter::{FilterDecision, FilterReason, FilterStats, RecordFilter};
pub use registry::{DomainRegistry, DomainStats};
pub use robots::{ai_restriction, evaluate, RobotsDirectives, Verdict};
pub use url::{canonicalize_url, Domain};
