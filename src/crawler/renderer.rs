//! The contract between the crawl and a page renderer

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;
use url::Url;

/// Outcome of one render attempt
///
/// A renderer never fails outright: navigation failures are reported as an
/// entry in `errors` together with an empty `html`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderResult {
    /// The URL that was rendered
    pub url: String,

    /// Serialized document after script execution (empty if navigation failed)
    pub html: String,

    /// Same-origin anchor targets found on the page, without repeats
    pub links: Vec<String>,

    /// Uncaught page errors and navigation failures
    pub errors: Vec<String>,
}

impl RenderResult {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// A result for a render that never produced a document
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            errors: vec![error.into()],
            ..Self::default()
        }
    }

    pub fn has_html(&self) -> bool {
        !self.html.is_empty()
    }
}

/// Errors collected for one URL, kept for the final summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub url: String,
    pub errors: Vec<String>,
}

/// Drives one page load and reports what it produced
///
/// Implementations must allow many concurrent `render` calls and must not
/// hold crawl-level state.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Loads `url`, waits for the network to go idle, and captures the page
    async fn render(&self, url: &Url) -> RenderResult;

    /// Releases the underlying engine; safe to call more than once
    async fn shutdown(&self);
}

/// Removes repeated links, keeping the first occurrence of each
pub fn dedup_links<I>(links: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| seen.insert(link.clone()))
        .collect()
}
