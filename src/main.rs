//! ssr-prerender main entry point
//!
//! This is the command-line interface for prerendering a single-page app
//! into a static site.

use anyhow::Context;
use clap::Parser;
use ssr_prerender::config::{load_config_or_default, validate};
use ssr_prerender::PrerenderManager;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Optional configuration file looked up in the working directory
const CONFIG_FILE: &str = "prerender.toml";

/// ssr-prerender: static snapshots of single-page apps
///
/// Serves SOURCE_DIR locally, renders every reachable route in headless
/// Chrome, and writes one annotated HTML file per route to OUTPUT_DIR
/// along with a copy of the static assets.
#[derive(Parser, Debug)]
#[command(name = "ssr-prerender")]
#[command(version = "1.0.0")]
#[command(about = "Prerenders a single-page app into static HTML", long_about = None)]
struct Cli {
    /// Directory holding the built app (default: ./www)
    #[arg(value_name = "SOURCE_DIR")]
    source: Option<PathBuf>,

    /// Directory the static site is written to (default: ./output)
    #[arg(value_name = "OUTPUT_DIR")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging();

    let mut config = load_config_or_default(Path::new(CONFIG_FILE))
        .with_context(|| format!("Failed to load {}", CONFIG_FILE))?;
    if let Some(source) = cli.source {
        config.http.directory = source;
    }
    if let Some(output) = cli.output {
        config.output.directory = output;
    }
    validate(&config).context("Invalid configuration")?;

    tracing::info!(
        "Prerendering {} into {} with {} workers",
        config.http.directory.display(),
        config.output.directory.display(),
        config.queue.concurrency
    );

    let manager = PrerenderManager::new(config);
    manager.run().await.context("Prerender failed to start")?;

    std::process::exit(0);
}

/// Sets up the logging/tracing subscriber, honouring `RUST_LOG`
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ssr_prerender=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
