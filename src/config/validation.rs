use crate::config::types::{Config, CrawlerConfig, OracleConfig, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Longest accepted wait, in seconds, for any configured delay
const MAX_DELAY_SECS: f64 = 3600.0;

fn is_valid_delay(secs: f64) -> bool {
    secs.is_finite() && (0.0..=MAX_DELAY_SECS).contains(&secs)
}

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_oracle_config(&config.oracle)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates traversal configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if !is_valid_delay(config.delay_between_pages) {
        return Err(ConfigError::Validation(format!(
            "delay_between_pages must be between 0 and {} seconds, got {}",
            MAX_DELAY_SECS, config.delay_between_pages
        )));
    }

    if config.request_timeout == 0 {
        return Err(ConfigError::Validation(
            "request_timeout must be >= 1 second".to_string(),
        ));
    }

    if config.connect_timeout == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout must be >= 1 second".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates oracle configuration
///
/// The API key itself is checked when the LLM oracle is built, since it
/// lives in the environment rather than in the file.
fn validate_oracle_config(config: &OracleConfig) -> Result<(), ConfigError> {
    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation("model cannot be empty".to_string()));
    }

    let api_base = Url::parse(&config.api_base)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api_base: {}", e)))?;
    if api_base.scheme() != "http" && api_base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "api_base must use http or https, got '{}'",
            config.api_base
        )));
    }

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api_key_env cannot be empty".to_string(),
        ));
    }

    if config.max_html_chars < 1_000 {
        return Err(ConfigError::Validation(format!(
            "max_html_chars must be >= 1000, got {}",
            config.max_html_chars
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(
            "max_attempts must be >= 1".to_string(),
        ));
    }

    if !is_valid_delay(config.retry_delay) {
        return Err(ConfigError::Validation(format!(
            "retry_delay must be between 0 and {} seconds, got {}",
            MAX_DELAY_SECS, config.retry_delay
        )));
    }

    if config.request_timeout == 0 {
        return Err(ConfigError::Validation(
            "oracle request_timeout must be >= 1 second".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.urls_file.is_empty() {
        return Err(ConfigError::Validation(
            "urls_file cannot be empty".to_string(),
        ));
    }

    if config.markdown_dir.is_empty() {
        return Err(ConfigError::Validation(
            "markdown_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}
