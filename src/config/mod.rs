//! Configuration module for the prerenderer
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use ssr_prerender::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("prerender.toml")).unwrap();
//! println!("Rendering with {} workers", config.queue.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{AnnotateConfig, BrowserConfig, Config, HttpConfig, OutputConfig, QueueConfig};

// Re-export parser functions
pub use parser::{load_config, load_config_or_default, parse_config};
pub use validation::validate;
