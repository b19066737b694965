use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for the prerenderer
///
/// Every table and field is optional in the TOML file; missing values fall
/// back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub queue: QueueConfig,
    pub http: HttpConfig,
    pub output: OutputConfig,
    pub annotate: AnnotateConfig,
    pub browser: BrowserConfig,
}

/// Worker pool configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of renders in flight at once
    pub concurrency: usize,

    /// Per-page render timeout (seconds)
    #[serde(rename = "page-timeout-secs")]
    pub page_timeout_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: 25,
            page_timeout_secs: 30,
        }
    }
}

/// Local file server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Directory holding the built single-page app
    pub directory: PathBuf,

    /// Port the local server listens on
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./www"),
            port: 1337,
        }
    }
}

/// Output tree configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root of the generated static site
    pub directory: PathBuf,

    /// Extension of the per-route file (`index.<extension>`)
    pub extension: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./output"),
            extension: "html".to_string(),
        }
    }
}

/// SSR marker configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnnotateConfig {
    /// Class that marks a component boundary
    #[serde(rename = "marker-class")]
    pub marker_class: String,

    /// Tag skipped over when looking for nested components
    #[serde(rename = "transparent-tag")]
    pub transparent_tag: String,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            marker_class: "hydrated".to_string(),
            transparent_tag: "slot".to_string(),
        }
    }
}

/// Headless browser configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// How long the network must stay quiet before a page counts as loaded (milliseconds)
    #[serde(rename = "network-idle-ms")]
    pub network_idle_ms: u64,

    /// Run Chrome without a window
    pub headless: bool,

    /// Explicit Chrome binary; auto-detected when absent
    #[serde(rename = "chrome-executable")]
    pub chrome_executable: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            network_idle_ms: 500,
            headless: true,
            chrome_executable: None,
        }
    }
}
