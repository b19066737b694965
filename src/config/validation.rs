use crate::config::types::{AnnotateConfig, Config, HttpConfig, OutputConfig, QueueConfig};
use crate::{ConfigError, ConfigResult};

/// Upper bound on simultaneously open browser tabs
const MAX_CONCURRENCY: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_queue_config(&config.queue)?;
    validate_http_config(&config.http)?;
    validate_output_config(&config.output)?;
    validate_annotate_config(&config.annotate)?;
    Ok(())
}

/// Validates worker pool configuration
fn validate_queue_config(config: &QueueConfig) -> ConfigResult<()> {
    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    if config.page_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "page-timeout-secs must be at least 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates file server configuration
fn validate_http_config(config: &HttpConfig) -> ConfigResult<()> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "http directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    let ext = config.extension.as_str();
    if ext.is_empty() || ext.contains('/') || ext.contains('\\') || ext.starts_with('.') {
        return Err(ConfigError::Validation(format!(
            "output extension must be a bare file extension, got '{}'",
            ext
        )));
    }

    Ok(())
}

/// Validates SSR marker configuration
fn validate_annotate_config(config: &AnnotateConfig) -> ConfigResult<()> {
    if config.marker_class.trim().is_empty() || config.marker_class.contains(char::is_whitespace)
    {
        return Err(ConfigError::Validation(format!(
            "marker-class must be a single class name, got '{}'",
            config.marker_class
        )));
    }

    if config.transparent_tag.trim().is_empty() {
        return Err(ConfigError::Validation(
            "transparent-tag cannot be empty".to_string(),
        ));
    }

    Ok(())
}
