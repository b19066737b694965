//! Prerender driver
//!
//! Wires the file server, renderer, crawl coordinator and output tree
//! together for one complete run.

use crate::annotate::Annotator;
use crate::config::Config;
use crate::crawler::{ChromeRenderer, Coordinator, CrawlOptions, Renderer};
use crate::output::{copy_assets, prepare_output_dir, ContentWriter, CrawlSummary};
use crate::server::FileServer;
use crate::url::Route;
use crate::Result;
use std::sync::Arc;
use std::time::Instant;

/// Runs a full prerender of the configured site
pub struct PrerenderManager {
    config: Config,
}

impl PrerenderManager {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Prerenders the site with headless Chrome
    pub async fn run(&self) -> Result<CrawlSummary> {
        let renderer = Arc::new(ChromeRenderer::new(self.config.browser.clone()));
        self.run_with_renderer(renderer).await
    }

    /// Prerenders the site with the given renderer
    ///
    /// Only a server that cannot bind is fatal. Output preparation and asset
    /// copy failures are logged and the run carries on; page failures end up
    /// in the summary.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - The printed end-of-run summary
    /// * `Err(PrerenderError)` - The file server could not start
    pub async fn run_with_renderer(&self, renderer: Arc<dyn Renderer>) -> Result<CrawlSummary> {
        let started = Instant::now();
        let source = &self.config.http.directory;
        let output = &self.config.output.directory;

        let server = FileServer::start(source, self.config.http.port).await?;
        let origin = server.origin()?;

        if let Err(e) = prepare_output_dir(output).await {
            tracing::warn!(
                "Error while creating output directory {}: {}",
                output.display(),
                e
            );
        }
        self.copy_assets().await;

        let coordinator = Coordinator::new(
            origin,
            Arc::clone(&renderer),
            Annotator::from_config(&self.config.annotate),
            ContentWriter::new(output.clone(), self.config.output.extension.clone()),
            CrawlOptions::from_config(&self.config.queue),
        );
        let report = coordinator.run(Route::root()).await;

        renderer.shutdown().await;
        tracing::info!("All done");

        self.copy_assets().await;

        let summary = CrawlSummary::from_report(&report, started.elapsed());
        summary.print();

        if let Err(e) = server.shutdown().await {
            tracing::warn!("File server did not stop cleanly: {}", e);
        }
        Ok(summary)
    }

    async fn copy_assets(&self) {
        tracing::info!("Copying build and assets");
        match copy_assets(&self.config.http.directory, &self.config.output.directory).await {
            Ok(count) => tracing::debug!("Copied {} asset files", count),
            Err(e) => tracing::warn!("Error while copying files: {}", e),
        }
    }
}
