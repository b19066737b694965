//! Integration tests for the prerender pipeline
//!
//! These tests serve a small site from a temporary directory through the real
//! file server and render it with an HTTP-only renderer, so the full run
//! (server, crawl, annotation, output tree, asset copy) is exercised without
//! a browser.

use async_trait::async_trait;
use scraper::{Html, Selector};
use ssr_prerender::config::Config;
use ssr_prerender::crawler::{Coordinator, CrawlOptions};
use ssr_prerender::output::ContentWriter;
use ssr_prerender::server::FileServer;
use ssr_prerender::{
    Annotator, PageState, PrerenderError, PrerenderManager, RenderResult, Renderer, Route,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;

const APP_SHELL: &str = r#"<!DOCTYPE html>
<html>
<head><title>App</title><script src="/app.js"></script></head>
<body>
<nav class="hydrated">
<a href="/about">About</a>
<a href="/contact">Contact</a>
<a href="/about#team">Team</a>
<a href="/app.js">Source</a>
<a href="https://example.com/">Elsewhere</a>
</nav>
<main><section class="hydrated"><p>Hello</p></section></main>
</body>
</html>"#;

/// Fetches pages over HTTP and reads their anchors without running scripts
#[derive(Default)]
struct HttpRenderer {
    renders: AtomicUsize,
    shutdowns: AtomicUsize,
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, url: &Url) -> RenderResult {
        self.renders.fetch_add(1, Ordering::SeqCst);

        let body = match reqwest::get(url.clone()).await {
            Ok(response) => match response.text().await {
                Ok(body) => body,
                Err(e) => return RenderResult::failed(url.as_str(), e.to_string()),
            },
            Err(e) => return RenderResult::failed(url.as_str(), e.to_string()),
        };

        let links = {
            let document = Html::parse_document(&body);
            let anchors = Selector::parse("a[href]").unwrap();
            document
                .select(&anchors)
                .filter_map(|a| a.value().attr("href"))
                .filter_map(|href| url.join(href).ok())
                .filter(|target| target.origin() == url.origin())
                .map(|target| target.to_string())
                .collect::<Vec<_>>()
        };

        let mut result = RenderResult::new(url.as_str());
        result.html = body;
        result.links = ssr_prerender::crawler::dedup_links(links);
        result
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Creates the source site: the app shell plus a few static assets
fn create_site(dir: &Path) {
    std::fs::write(dir.join("index.html"), APP_SHELL).unwrap();
    std::fs::write(dir.join("app.js"), "console.log('app')").unwrap();
    std::fs::create_dir_all(dir.join("assets/fonts")).unwrap();
    std::fs::write(dir.join("assets/site.css"), "body{margin:0}").unwrap();
    std::fs::write(dir.join("assets/fonts/a.woff2"), "font").unwrap();
}

fn create_test_config(source: &Path, output: &Path) -> Config {
    let mut config = Config::default();
    config.http.directory = source.to_path_buf();
    config.http.port = 0;
    config.output.directory = output.to_path_buf();
    config.queue.concurrency = 4;
    config.queue.page_timeout_secs = 10;
    config
}

#[tokio::test]
async fn test_full_prerender_run() {
    let source = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    create_site(source.path());
    // Left over from an earlier run
    std::fs::create_dir_all(output.path().join("stale")).unwrap();
    std::fs::write(output.path().join("stale/index.html"), "old").unwrap();

    let renderer = Arc::new(HttpRenderer::default());
    let manager = PrerenderManager::new(create_test_config(source.path(), output.path()));
    let summary = manager
        .run_with_renderer(Arc::clone(&renderer) as Arc<dyn Renderer>)
        .await
        .expect("run failed");

    assert_eq!(summary.pages_rendered, 3);
    assert_eq!(summary.error_count, 0, "{}", summary.errors_json());
    assert_eq!(renderer.renders.load(Ordering::SeqCst), 3);
    assert_eq!(renderer.shutdowns.load(Ordering::SeqCst), 1);

    for page in ["index.html", "about/index.html", "contact/index.html"] {
        let html = std::fs::read_to_string(output.path().join(page)).unwrap();
        assert!(html.contains(r#"<html ssr=""#), "{}: {}", page, html);
        assert!(
            html.contains(r#"<nav class="hydrated" ssrv="0" ssrc="0.0.">"#),
            "{}: {}",
            page,
            html
        );
        assert!(
            html.contains(r#"<section class="hydrated" ssrv="1" ssrc="1.0.">"#),
            "{}: {}",
            page,
            html
        );
        // Holds a component, so no trailing dot
        assert!(html.contains(r#"<main ssrc=".1">"#), "{}: {}", page, html);
    }

    assert!(!output.path().join("stale").exists());
    assert!(output.path().join("app.js").is_file());
    assert!(output.path().join("assets/site.css").is_file());
    assert!(output.path().join("assets/fonts/a.woff2").is_file());
}

#[tokio::test]
async fn test_unreachable_server_pages_are_reported() {
    let source = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    create_site(source.path());

    let server = FileServer::start(source.path(), 0).await.unwrap();
    let origin = server.origin().unwrap();
    server.shutdown().await.unwrap();

    let coordinator = Coordinator::new(
        origin,
        Arc::new(HttpRenderer::default()),
        Annotator::default(),
        ContentWriter::new(output.path(), "html"),
        CrawlOptions {
            concurrency: 2,
            page_timeout: Duration::from_secs(5),
        },
    );
    let report = coordinator.run(Route::root()).await;

    assert_eq!(report.rendered, 0);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].url, "/");
    assert_eq!(report.pages.get(&Route::root()), Some(&PageState::Failed));
    assert!(!output.path().join("index.html").exists());
}

#[tokio::test]
async fn test_port_conflict_is_fatal() {
    let source = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    create_site(source.path());

    let blocker = FileServer::start(source.path(), 0).await.unwrap();
    let mut config = create_test_config(source.path(), output.path());
    config.http.port = blocker.addr().port();

    let renderer = Arc::new(HttpRenderer::default());
    let result = PrerenderManager::new(config)
        .run_with_renderer(Arc::clone(&renderer) as Arc<dyn Renderer>)
        .await;

    assert!(matches!(result, Err(PrerenderError::Bind { .. })));
    assert_eq!(renderer.renders.load(Ordering::SeqCst), 0);

    blocker.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_custom_extension_and_marker() {
    let source = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    create_site(source.path());

    let mut config = create_test_config(source.path(), output.path());
    config.output.extension = "htm".to_string();
    config.annotate.marker_class = "island".to_string();

    let summary = PrerenderManager::new(config)
        .run_with_renderer(Arc::new(HttpRenderer::default()))
        .await
        .unwrap();

    assert_eq!(summary.pages_rendered, 3);
    let html = std::fs::read_to_string(output.path().join("about/index.htm")).unwrap();
    assert!(!html.contains("ssrv="), "{}", html);
    assert!(html.contains(r#"<nav class="hydrated" ssrc=".0.">"#), "{}", html);
}
