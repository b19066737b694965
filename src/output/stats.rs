//! Final crawl summary
//!
//! Builds the report printed at the end of a run from the crawl result.

use crate::crawler::{CrawlReport, ErrorRecord};
use serde::Serialize;
use std::time::Duration;

/// Totals for one finished run
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    /// Pages written to the output tree
    pub pages_rendered: usize,

    /// Every route the crawl found, rendered or not
    pub pages_discovered: usize,

    /// Routes that produced no output
    pub pages_failed: usize,

    /// Number of error records
    pub error_count: usize,

    /// Error records in the order they were collected
    pub errors: Vec<ErrorRecord>,

    /// Wall-clock length of the crawl
    pub duration_seconds: f64,
}

impl CrawlSummary {
    pub fn from_report(report: &CrawlReport, elapsed: Duration) -> Self {
        Self {
            pages_rendered: report.rendered,
            pages_discovered: report.pages.len(),
            pages_failed: report.failed_routes().count(),
            error_count: report.error_count(),
            errors: report.errors.clone(),
            duration_seconds: elapsed.as_secs_f64(),
        }
    }

    /// JSON array of the error records
    pub fn errors_json(&self) -> String {
        serde_json::to_string(&self.errors).unwrap_or_else(|_| "[]".to_string())
    }

    /// The summary as printed, one line per entry
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Pages rendered: {}", self.pages_rendered),
            format!("Error count: {}", self.error_count),
            format!("Errors: {}", self.errors_json()),
        ]
    }

    /// Prints the summary to stdout
    pub fn print(&self) {
        for line in self.lines() {
            println!("{}", line);
        }
        tracing::info!(
            "{} of {} discovered pages rendered ({} failed) in {:.1}s",
            self.pages_rendered,
            self.pages_discovered,
            self.pages_failed,
            self.duration_seconds
        );
    }
}
