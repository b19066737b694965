//! Persists rendered pages to the output tree

use crate::url::Route;
use crate::{PrerenderError, Result};
use std::path::PathBuf;
use tokio::fs;

/// Writes `<root>/<route>/index.<extension>` files
#[derive(Debug, Clone)]
pub struct ContentWriter {
    root: PathBuf,
    extension: String,
}

impl ContentWriter {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    /// Directory that holds the file for `route`
    pub fn dir_for(&self, route: &Route) -> PathBuf {
        route
            .segments()
            .fold(self.root.clone(), |dir, segment| dir.join(segment))
    }

    /// Full path of the file written for `route`
    pub fn path_for(&self, route: &Route) -> PathBuf {
        self.dir_for(route).join(format!("index.{}", self.extension))
    }

    /// Writes `html` for `route`
    ///
    /// Intermediate directories are created as needed. The content goes to a
    /// temporary sibling first and is renamed into place, so a failed write
    /// never leaves a truncated page behind.
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Path of the written file
    /// * `Err(PrerenderError::Write)` - Directory creation or write failed
    pub async fn write(&self, route: &Route, html: &str) -> Result<PathBuf> {
        let dir = self.dir_for(route);
        let path = self.path_for(route);
        let staging = dir.join(format!(".index.{}.partial", self.extension));

        fs::create_dir_all(&dir)
            .await
            .map_err(|source| PrerenderError::Write {
                path: dir.clone(),
                source,
            })?;

        if let Err(source) = fs::write(&staging, html).await {
            let _ = fs::remove_file(&staging).await;
            return Err(PrerenderError::Write { path, source });
        }

        fs::rename(&staging, &path)
            .await
            .map_err(|source| PrerenderError::Write {
                path: path.clone(),
                source,
            })?;

        tracing::debug!("Wrote {} ({} bytes)", path.display(), html.len());
        Ok(path)
    }
}
