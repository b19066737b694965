//! Crawler module for rendering and walking a single-page app
//!
//! This module contains the core crawling logic, including:
//! - The [`Renderer`] contract and its Chrome implementation
//! - A bounded worker pool
//! - The coordinator that owns the frontier and deduplicates routes

mod chrome;
mod coordinator;
mod pool;
mod renderer;

pub use chrome::ChromeRenderer;
pub use coordinator::{Coordinator, CrawlOptions, CrawlReport};
pub use pool::WorkerPool;
pub use renderer::{dedup_links, ErrorRecord, RenderResult, Renderer};
