use crate::config::types::{Config, CrawlerConfig, OutputConfig, SourceConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the remote source configuration
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::Validation(format!(
            "base-url must have a host, got '{}'",
            config.base_url
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect-timeout-secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    if config.max_redirects < 1 || config.max_redirects > 20 {
        return Err(ConfigError::Validation(format!(
            "max-redirects must be between 1 and 20, got {}",
            config.max_redirects
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.dest_dir.is_empty() {
        return Err(ConfigError::Validation(
            "dest-dir cannot be empty".to_string(),
        ));
    }

    if config.catalog_file.is_empty() {
        return Err(ConfigError::Validation(
            "catalog-file cannot be empty".to_string(),
        ));
    }

    // The catalog file lives inside dest-dir; a path separator would silently
    // escape it.
    if config.catalog_file.contains('/') || config.catalog_file.contains('\\') {
        return Err(ConfigError::Validation(format!(
            "catalog-file must be a bare file name, got '{}'",
            config.catalog_file
        )));
    }

    Ok(())
}
