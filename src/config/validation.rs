use crate::config::types::{Config, CrawlerConfig, HttpConfig};
use crate::url::normalize_url;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 {
        return Err(ConfigError::Validation(format!(
            "workers must be greater than zero, got {}",
            config.workers
        )));
    }

    if config.channel_capacity < 1 {
        return Err(ConfigError::Validation(format!(
            "channel-capacity must be greater than zero, got {}",
            config.channel_capacity
        )));
    }

    parse_seed_url(&config.seed_url)?;

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.timeout_ms < 1 {
        return Err(ConfigError::Validation(
            "timeout-ms must be greater than zero".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Parses the seed URL, which must be an absolute http(s) URL with a host
fn parse_seed_url(seed: &str) -> Result<Url, ConfigError> {
    if seed.trim().is_empty() {
        return Err(ConfigError::Validation(
            "seed URL is not set (use --url, URL or crawler.seed-url)".to_string(),
        ));
    }

    normalize_url(seed).map_err(|source| ConfigError::InvalidUrl {
        url: seed.to_string(),
        source,
    })
}
