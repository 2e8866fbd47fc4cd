//! Configuration module for Robots-Gate
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use robots_gate::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("robots-gate.toml")).unwrap();
//! println!("Per-request timeout: {}s", config.checker.timeout_seconds);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CheckerConfig, Config, IngestConfig, OutputConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
