use crate::config::types::{CheckerConfig, Config, IngestConfig, OutputConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_checker_config(&config.checker)?;
    validate_ingest_config(&config.ingest)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates checker configuration
fn validate_checker_config(config: &CheckerConfig) -> Result<(), ConfigError> {
    if config.max_workers < 1 || config.max_workers > 256 {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and 256, got {}",
            config.max_workers
        )));
    }

    if config.timeout_seconds < 1 || config.timeout_seconds > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout_seconds must be between 1 and 300, got {}",
            config.timeout_seconds
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.user_agent.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(
            "user_agent cannot contain control characters".to_string(),
        ));
    }

    for token in config.agent_tokens.iter().chain(&config.ai_agent_tokens) {
        validate_agent_token(token)?;
    }

    Ok(())
}

/// Validates a robots.txt product token
///
/// Tokens are matched against `User-agent` lines, so they must be a single
/// word of letters, digits, `-` and `_`. `*` is implied and not accepted.
fn validate_agent_token(token: &str) -> Result<(), ConfigError> {
    if token.is_empty() {
        return Err(ConfigError::InvalidAgentToken(
            "agent token cannot be empty".to_string(),
        ));
    }

    if !token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::InvalidAgentToken(format!(
            "'{}' must contain only letters, digits, hyphens and underscores",
            token
        )));
    }

    Ok(())
}

/// Validates ingestion configuration
fn validate_ingest_config(config: &IngestConfig) -> Result<(), ConfigError> {
    if config.url_field.is_empty() {
        return Err(ConfigError::Validation(
            "url_field cannot be empty".to_string(),
        ));
    }

    if config.timestamp_fields.iter().any(|f| f.is_empty()) {
        return Err(ConfigError::Validation(
            "timestamp_fields cannot contain empty names".to_string(),
        ));
    }

    if config.max_records == Some(0) {
        return Err(ConfigError::Validation(
            "max_records must be >= 1 when set".to_string(),
        ));
    }

    if config.sample_url_limit > 100 {
        return Err(ConfigError::Validation(format!(
            "sample_url_limit must be <= 100, got {}",
            config.sample_url_limit
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}
