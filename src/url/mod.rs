//! URL handling module
//!
//! Every page of the crawl is keyed by its [`Route`]: the normalized path of a
//! same-origin URL. Routes are what the crawl deduplicates on and what the
//! output tree is laid out by.

mod normalize;

pub use normalize::normalize_route;

use serde::Serialize;
use std::fmt;
use url::Url;

/// Normalized, origin-relative path of a page (always starts with `/`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Route(String);

impl Route {
    /// The start route of every crawl
    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub(crate) fn from_normalized(path: String) -> Self {
        debug_assert!(path.starts_with('/'));
        Self(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Non-empty path segments, in order
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Absolute URL of this route on `origin`
    pub fn to_url(&self, origin: &Url) -> Url {
        let mut url = origin.clone();
        url.set_path(&self.0);
        url.set_query(None);
        url.set_fragment(None);
        url
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
