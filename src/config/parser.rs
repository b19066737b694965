use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigResult;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use ssr_prerender::config::load_config;
///
/// let config = load_config(Path::new("prerender.toml")).unwrap();
/// println!("Concurrency: {}", config.queue.concurrency);
/// ```
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads `path` if it exists, otherwise returns the default configuration
pub fn load_config_or_default(path: &Path) -> ConfigResult<Config> {
    if path.is_file() {
        tracing::info!("Loading configuration from {}", path.display());
        load_config(path)
    } else {
        tracing::debug!("No configuration at {}, using defaults", path.display());
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigError;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let config_content = r#"
[queue]
concurrency = 4
page-timeout-secs = 10

[http]
directory = "./dist"
port = 8080

[output]
directory = "./static"
extension = "htm"

[annotate]
marker-class = "component"
transparent-tag = "slot"

[browser]
network-idle-ms = 250
headless = false
chrome-executable = "/usr/bin/chromium"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.queue.concurrency, 4);
        assert_eq!(config.queue.page_timeout_secs, 10);
        assert_eq!(config.http.directory, PathBuf::from("./dist"));
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.output.directory, PathBuf::from("./static"));
        assert_eq!(config.output.extension, "htm");
        assert_eq!(config.annotate.marker_class, "component");
        assert_eq!(config.browser.network_idle_ms, 250);
        assert!(!config.browser.headless);
        assert_eq!(
            config.browser.chrome_executable,
            Some(PathBuf::from("/usr/bin/chromium"))
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let file = create_temp_config("[http]\nport = 9000\n");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.http.port, 9000);
        assert_eq!(config.http.directory, PathBuf::from("./www"));
        assert_eq!(config.queue.concurrency, 25);
        assert_eq!(config.output.directory, PathBuf::from("./output"));
        assert_eq!(config.annotate.marker_class, "hydrated");
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config.queue.concurrency, 25);
        assert_eq!(config.http.port, 1337);
        assert_eq!(config.output.extension, "html");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/prerender.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[queue]\nconcurrency = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let config = load_config_or_default(Path::new("/nonexistent/prerender.toml")).unwrap();
        assert_eq!(config.http.port, 1337);
    }
}
