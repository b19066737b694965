//! Headless Chrome renderer built on chromiumoxide
//!
//! One browser process is shared by every render. It is launched on the first
//! call to [`Renderer::render`] and closed by [`Renderer::shutdown`]. Each
//! render gets its own tab, which is closed again however the render ends.

use crate::config::BrowserConfig;
use crate::crawler::renderer::{dedup_links, RenderResult, Renderer};
use crate::{PrerenderError, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
use chromiumoxide::cdp::browser_protocol::inspector::{
    EnableParams as InspectorEnableParams, EventTargetCrashed,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::cdp::js_protocol::runtime::EventExceptionThrown;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use url::Url;

/// Task driving a browser's CDP connection, aborted on drop
struct HandlerTask(JoinHandle<()>);

impl Drop for HandlerTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A launched browser and the task driving its CDP connection
struct BrowserHandle {
    browser: Arc<Browser>,
    handler: HandlerTask,
}

/// [`Renderer`] backed by a single shared Chrome instance
pub struct ChromeRenderer {
    config: BrowserConfig,
    browser: Mutex<Option<BrowserHandle>>,
}

impl ChromeRenderer {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            browser: Mutex::new(None),
        }
    }

    fn idle_window(&self) -> Duration {
        Duration::from_millis(self.config.network_idle_ms)
    }

    /// Returns the shared browser, launching it on first use
    async fn browser(&self) -> Result<Arc<Browser>> {
        let mut slot = self.browser.lock().await;
        if let Some(handle) = slot.as_ref() {
            return Ok(Arc::clone(&handle.browser));
        }

        let handle = launch(&self.config).await?;
        let browser = Arc::clone(&handle.browser);
        *slot = Some(handle);
        Ok(browser)
    }

    async fn try_render(&self, url: &Url) -> Result<RenderResult> {
        let browser = self.browser().await?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| PrerenderError::Browser(format!("Failed to open tab: {}", e)))?;
        let tab = TabGuard::new(page);
        let page = tab.page();

        let errors = PageErrorCollector::attach(page).await?;
        let network = NetworkMonitor::attach(page).await?;

        page.goto(url.as_str())
            .await
            .map_err(|e| PrerenderError::Browser(format!("Navigation failed: {}", e)))?;

        network.wait_for_idle(self.idle_window()).await;

        let links = page
            .evaluate(links_script(url))
            .await
            .map_err(|e| PrerenderError::Browser(format!("Link collection failed: {}", e)))?
            .into_value::<Vec<String>>()
            .map_err(|e| PrerenderError::Browser(format!("Unexpected link list: {}", e)))?;

        let html = page
            .content()
            .await
            .map_err(|e| PrerenderError::Browser(format!("Failed to read content: {}", e)))?;

        let mut result = RenderResult::new(url.as_str());
        result.html = html;
        result.links = dedup_links(links);
        result.errors = errors.drain();

        tab.close().await;
        Ok(result)
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn render(&self, url: &Url) -> RenderResult {
        match self.try_render(url).await {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!("Render of {} failed: {}", url, e);
                RenderResult::failed(url.as_str(), e.to_string())
            }
        }
    }

    async fn shutdown(&self) {
        let Some(BrowserHandle { browser, handler }) = self.browser.lock().await.take() else {
            return;
        };

        match Arc::try_unwrap(browser) {
            Ok(mut browser) => {
                if let Err(e) = browser.close().await {
                    tracing::warn!("Failed to close browser: {}", e);
                }
                if let Err(e) = browser.wait().await {
                    tracing::warn!("Failed to wait for browser exit: {}", e);
                }
                tracing::info!("Browser closed");
            }
            Err(_) => {
                // Dropping the last reference kills the process
                tracing::warn!("Browser still in use at shutdown, killing it on release");
            }
        }
        drop(handler);
    }
}

async fn launch(config: &BrowserConfig) -> Result<BrowserHandle> {
    let mut builder = LaunchConfig::builder()
        .arg("--no-sandbox")
        .arg("--disable-setuid-sandbox");
    if !config.headless {
        builder = builder.with_head();
    }
    if let Some(path) = &config.chrome_executable {
        builder = builder.chrome_executable(path);
    }
    let launch_config = builder
        .build()
        .map_err(|e| PrerenderError::Browser(format!("Invalid browser config: {}", e)))?;

    let (browser, mut handler) = Browser::launch(launch_config)
        .await
        .map_err(|e| PrerenderError::Browser(format!("Failed to launch Chrome: {}", e)))?;

    let handler = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                tracing::trace!("CDP handler error: {}", e);
            }
        }
        tracing::debug!("Browser handler task completed");
    });

    tracing::info!("Browser launched");
    Ok(BrowserHandle {
        browser: Arc::new(browser),
        handler: HandlerTask(handler),
    })
}

/// Builds the script that lists same-origin anchor targets
///
/// Runs in the page. Targets are resolved against the document base, kept
/// only if they share `url`'s origin, and deduplicated with a `Set`.
fn links_script(url: &Url) -> String {
    let origin = url.origin().ascii_serialization();
    let origin = serde_json::Value::String(origin).to_string();
    format!(
        r#"(function (origin) {{
    const found = new Set();
    for (const anchor of document.querySelectorAll('a[href]')) {{
        let target;
        try {{
            target = new URL(anchor.getAttribute('href'), document.baseURI);
        }} catch (e) {{
            continue;
        }}
        if (target.origin === origin) {{
            found.add(target.href);
        }}
    }}
    return Array.from(found);
}})({origin})"#
    )
}

/// Closes the tab when dropped, unless it was closed explicitly
struct TabGuard {
    page: Page,
    closed: bool,
}

impl TabGuard {
    fn new(page: Page) -> Self {
        Self {
            page,
            closed: false,
        }
    }

    fn page(&self) -> &Page {
        &self.page
    }

    async fn close(mut self) {
        self.closed = true;
        if let Err(e) = self.page.clone().close().await {
            tracing::debug!("Failed to close tab: {}", e);
        }
    }
}

impl Drop for TabGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let page = self.page.clone();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                let _ = page.close().await;
            });
        }
    }
}

/// Collects uncaught script exceptions and renderer crashes of one tab
struct PageErrorCollector {
    errors: mpsc::UnboundedReceiver<String>,
    task: JoinHandle<()>,
}

impl PageErrorCollector {
    async fn attach(page: &Page) -> Result<Self> {
        page.execute(InspectorEnableParams::default())
            .await
            .map_err(|e| PrerenderError::Browser(format!("Failed to enable inspector: {}", e)))?;
        let mut exceptions = page
            .event_listener::<EventExceptionThrown>()
            .await
            .map_err(|e| PrerenderError::Browser(format!("Failed to watch exceptions: {}", e)))?;
        let mut crashes = page
            .event_listener::<EventTargetCrashed>()
            .await
            .map_err(|e| PrerenderError::Browser(format!("Failed to watch crashes: {}", e)))?;

        let (tx, errors) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            loop {
                let message = tokio::select! {
                    Some(event) = exceptions.next() => {
                        let details = &event.exception_details;
                        details
                            .exception
                            .as_ref()
                            .and_then(|exception| exception.description.clone())
                            .unwrap_or_else(|| details.text.clone())
                    }
                    Some(_) = crashes.next() => "Page crashed".to_string(),
                    else => break,
                };
                tracing::debug!("Page error: {}", message);
                if tx.send(message).is_err() {
                    break;
                }
            }
        });

        Ok(Self { errors, task })
    }

    /// Everything reported so far, in arrival order
    fn drain(mut self) -> Vec<String> {
        let mut errors = Vec::new();
        while let Ok(error) = self.errors.try_recv() {
            errors.push(error);
        }
        errors
    }
}

impl Drop for PageErrorCollector {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Tracks the number of outstanding network requests of one tab
struct NetworkMonitor {
    in_flight: watch::Receiver<usize>,
    task: JoinHandle<()>,
}

impl NetworkMonitor {
    async fn attach(page: &Page) -> Result<Self> {
        let watch_err =
            |e: CdpError| PrerenderError::Browser(format!("Failed to watch network: {}", e));

        page.execute(EnableParams::default()).await.map_err(watch_err)?;
        let mut started = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(watch_err)?;
        let mut finished = page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(watch_err)?;
        let mut failed = page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(watch_err)?;

        let (tx, in_flight) = watch::channel(0usize);
        let task = tokio::spawn(async move {
            let mut pending = HashSet::new();
            loop {
                tokio::select! {
                    Some(event) = started.next() => {
                        pending.insert(event.request_id.inner().clone());
                    }
                    Some(event) = finished.next() => {
                        pending.remove(event.request_id.inner());
                    }
                    Some(event) = failed.next() => {
                        pending.remove(event.request_id.inner());
                    }
                    else => break,
                }
                let count = pending.len();
                tx.send_modify(|n| *n = count);
            }
        });

        Ok(Self { in_flight, task })
    }

    /// Waits until no request has been outstanding for `window`
    async fn wait_for_idle(mut self, window: Duration) {
        wait_for_quiet(&mut self.in_flight, window).await;
    }
}

/// Waits until `in_flight` has read zero for a full `window`
///
/// Any change during the window restarts it. Returns early once the sender
/// is gone.
async fn wait_for_quiet(in_flight: &mut watch::Receiver<usize>, window: Duration) {
    loop {
        if in_flight.wait_for(|n| *n == 0).await.is_err() {
            return;
        }
        match tokio::time::timeout(window, in_flight.changed()).await {
            Ok(Ok(())) => continue,
            Ok(Err(_)) | Err(_) => return,
        }
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}
