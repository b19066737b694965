//! ssr-prerender: static snapshots of single-page applications
//!
//! This crate crawls every internally reachable route of a locally served
//! single-page app, renders each page in headless Chrome, stamps the rendered
//! markup with SSR markers for client-side re-hydration, and writes one
//! static HTML file per route.

pub mod annotate;
pub mod config;
pub mod crawler;
pub mod manager;
pub mod output;
pub mod server;
pub mod state;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for prerender operations
#[derive(Debug, Error)]
pub enum PrerenderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to bind file server to {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("File server error: {0}")]
    Server(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Render of {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::PageState,
        to: state::PageState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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
}

/// URL-specific errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("URL {0} is not on the crawl origin")]
    CrossOrigin(String),

    #[error("URL {0} points to a static resource")]
    Resource(String),
}

/// Result type alias for prerender operations
pub type Result<T> = std::result::Result<T, PrerenderError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use annotate::{annotate, Annotator};
pub use config::Config;
pub use crawler::{CrawlReport, ErrorRecord, RenderResult, Renderer};
pub use manager::PrerenderManager;
pub use state::PageState;
pub use url::{normalize_route, Route};
