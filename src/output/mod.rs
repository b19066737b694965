//! Output module for the generated static site
//!
//! This module handles:
//! - Writing one annotated page per route
//! - Preparing the output directory and copying static assets
//! - The end-of-run summary

mod assets;
pub mod stats;
mod writer;

pub use assets::{copy_assets, prepare_output_dir, ROOT_DOCUMENT};
pub use stats::CrawlSummary;
pub use writer::ContentWriter;
