//! Crawler coordinator - the crawl session and its main loop
//!
//! One coordinating task owns every piece of crawl state: the frontier, the
//! per-route [`PageState`] map (whose keys are the seen set), the error log,
//! and the rendered count. Workers never touch that state. They run the page
//! pipeline (render, annotate, write) and send a [`PageOutcome`] back; the
//! coordinator folds it into the session and dispatches newly found routes.
//!
//! The crawl ends on quiescence: an empty frontier with nothing in flight.

use crate::annotate::Annotator;
use crate::config::QueueConfig;
use crate::crawler::pool::WorkerPool;
use crate::crawler::renderer::{ErrorRecord, Renderer};
use crate::output::ContentWriter;
use crate::state::PageState;
use crate::url::{normalize_route, Route};
use crate::PrerenderError;
use futures::FutureExt;
use std::any::Any;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Tuning for one crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Maximum number of pages in flight at once
    pub concurrency: usize,

    /// Upper bound on a single render
    pub page_timeout: Duration,
}

impl CrawlOptions {
    pub fn from_config(config: &QueueConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            page_timeout: Duration::from_secs(config.page_timeout_secs),
        }
    }
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self::from_config(&QueueConfig::default())
    }
}

/// Result of a finished crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Number of pages written to the output tree
    pub rendered: usize,

    /// Errors in the order they were recorded
    pub errors: Vec<ErrorRecord>,

    /// Final state of every route the crawl discovered
    pub pages: BTreeMap<Route, PageState>,
}

impl CrawlReport {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Routes that produced no output
    pub fn failed_routes(&self) -> impl Iterator<Item = &Route> {
        self.pages
            .iter()
            .filter(|(_, state)| state.is_terminal() && !state.is_success())
            .map(|(route, _)| route)
    }
}

/// What a worker reports back for one route
#[derive(Debug)]
enum PageOutcome {
    Completed {
        route: Route,
        links: Vec<Route>,
        page_errors: Vec<String>,
    },
    Failed {
        route: Route,
        errors: Vec<String>,
    },
}

/// Mutable crawl state, owned by the coordinating task
#[derive(Debug, Default)]
struct CrawlSession {
    frontier: VecDeque<Route>,
    pages: HashMap<Route, PageState>,
    errors: Vec<ErrorRecord>,
    rendered: usize,
    in_flight: usize,
}

impl CrawlSession {
    /// Queues `route` unless it was seen before
    ///
    /// Returns whether the route was new.
    fn discover(&mut self, route: Route) -> bool {
        if self.pages.contains_key(&route) {
            tracing::trace!("Already seen: {}", route);
            return false;
        }
        self.pages.insert(route.clone(), PageState::Queued);
        self.frontier.push_back(route);
        true
    }

    /// Takes the next route off the frontier and marks it in flight
    fn next_dispatch(&mut self) -> Option<Route> {
        let route = self.frontier.pop_front()?;
        self.advance(&route, PageState::InFlight);
        self.in_flight += 1;
        Some(route)
    }

    /// Folds a worker outcome into the session
    fn absorb(&mut self, outcome: PageOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match outcome {
            PageOutcome::Completed {
                route,
                links,
                page_errors,
            } => {
                self.advance(&route, PageState::Completed);
                self.rendered += 1;

                if !page_errors.is_empty() {
                    tracing::debug!("{} reported {} page errors", route, page_errors.len());
                    self.record_errors(&route, page_errors);
                }

                let found = links
                    .into_iter()
                    .map(|link| self.discover(link))
                    .filter(|is_new| *is_new)
                    .count();
                if found > 0 {
                    tracing::debug!("{} led to {} new routes", route, found);
                }
            }
            PageOutcome::Failed { route, errors } => {
                tracing::warn!("Failed to prerender {}: {}", route, errors.join("; "));
                self.advance(&route, PageState::Failed);
                self.record_errors(&route, errors);
            }
        }
    }

    /// Fails every route still in flight, for when the workers are gone
    fn abandon_in_flight(&mut self) {
        let stranded: Vec<Route> = self
            .pages
            .iter()
            .filter(|(_, state)| state.is_active())
            .map(|(route, _)| route.clone())
            .collect();

        for route in stranded {
            if self.pages.get(&route) == Some(&PageState::Queued) {
                self.advance(&route, PageState::InFlight);
            }
            self.advance(&route, PageState::Failed);
            self.record_errors(&route, vec!["Worker pool stopped".to_string()]);
        }
        self.frontier.clear();
        self.in_flight = 0;
    }

    fn is_quiescent(&self) -> bool {
        self.frontier.is_empty() && self.in_flight == 0
    }

    fn advance(&mut self, route: &Route, next: PageState) {
        let Some(state) = self.pages.get_mut(route) else {
            tracing::warn!("Outcome for undiscovered route {}", route);
            return;
        };
        match state.transition(next) {
            Ok(new_state) => *state = new_state,
            Err(e) => tracing::warn!("{}: {}", route, e),
        }
    }

    fn record_errors(&mut self, route: &Route, errors: Vec<String>) {
        self.errors.push(ErrorRecord {
            url: route.to_string(),
            errors,
        });
    }

    fn into_report(self) -> CrawlReport {
        debug_assert!(self.pages.values().all(PageState::is_terminal));
        CrawlReport {
            rendered: self.rendered,
            errors: self.errors,
            pages: self.pages.into_iter().collect(),
        }
    }
}

/// Everything a worker needs to take one route through the page pipeline
struct PagePipeline {
    origin: Url,
    renderer: Arc<dyn Renderer>,
    annotator: Annotator,
    writer: ContentWriter,
    page_timeout: Duration,
}

impl PagePipeline {
    async fn process(&self, route: Route) -> PageOutcome {
        let url = route.to_url(&self.origin);
        tracing::info!("Render: {}", url);

        let outcome = AssertUnwindSafe(self.run(&route, &url)).catch_unwind().await;
        match outcome {
            Ok(Ok((links, page_errors))) => PageOutcome::Completed {
                route,
                links,
                page_errors,
            },
            Ok(Err(errors)) => PageOutcome::Failed { route, errors },
            Err(panic) => PageOutcome::Failed {
                route,
                errors: vec![format!("Render panicked: {}", panic_message(&*panic))],
            },
        }
    }

    /// Render, annotate, write; on failure returns the errors to record
    async fn run(
        &self,
        route: &Route,
        url: &Url,
    ) -> Result<(Vec<Route>, Vec<String>), Vec<String>> {
        let result = match tokio::time::timeout(self.page_timeout, self.renderer.render(url)).await
        {
            Ok(result) => result,
            Err(_) => {
                let timeout = PrerenderError::Timeout {
                    url: url.to_string(),
                    secs: self.page_timeout.as_secs(),
                };
                return Err(vec![timeout.to_string()]);
            }
        };

        if !result.has_html() {
            let mut errors = result.errors;
            if errors.is_empty() {
                errors.push("Renderer returned an empty document".to_string());
            }
            return Err(errors);
        }

        let annotated = self.annotator.annotate(&result.html);
        if let Err(e) = self.writer.write(route, &annotated).await {
            let mut errors = result.errors;
            errors.push(e.to_string());
            return Err(errors);
        }

        let links = result
            .links
            .iter()
            .filter_map(|link| match normalize_route(link, &self.origin) {
                Ok(route) => Some(route),
                Err(e) => {
                    tracing::trace!("Skipping link {}: {}", link, e);
                    None
                }
            })
            .collect();

        Ok((links, result.errors))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Drives a crawl from a start route to quiescence
pub struct Coordinator {
    pipeline: Arc<PagePipeline>,
    options: CrawlOptions,
}

impl Coordinator {
    /// Creates a coordinator for the site served at `origin`
    ///
    /// # Arguments
    ///
    /// * `origin` - Scheme, host and port of the local server
    /// * `renderer` - Page renderer shared by all workers
    /// * `annotator` - SSR marker settings
    /// * `writer` - Destination of the rendered pages
    /// * `options` - Concurrency and timeout limits
    pub fn new(
        origin: Url,
        renderer: Arc<dyn Renderer>,
        annotator: Annotator,
        writer: ContentWriter,
        options: CrawlOptions,
    ) -> Self {
        Self {
            pipeline: Arc::new(PagePipeline {
                origin,
                renderer,
                annotator,
                writer,
                page_timeout: options.page_timeout,
            }),
            options,
        }
    }

    /// Crawls every route reachable from `start`
    ///
    /// Per-page failures never end the crawl; they are collected in the
    /// returned report.
    pub async fn run(&self, start: Route) -> CrawlReport {
        let started = std::time::Instant::now();
        let mut session = CrawlSession::default();
        session.discover(start);

        let pipeline = Arc::clone(&self.pipeline);
        let mut pool = WorkerPool::spawn(self.options.concurrency, move |route: Route| {
            let pipeline = Arc::clone(&pipeline);
            async move { pipeline.process(route).await }
        });

        'crawl: loop {
            // Never more in flight than there are workers, so submit cannot stall
            while session.in_flight < pool.size() {
                let Some(route) = session.next_dispatch() else {
                    break;
                };
                if pool.submit(route).await.is_err() {
                    tracing::error!("Worker pool stopped unexpectedly");
                    session.abandon_in_flight();
                    break 'crawl;
                }
            }

            if session.is_quiescent() {
                break;
            }

            match pool.next_outcome().await {
                Some(outcome) => session.absorb(outcome),
                None => {
                    tracing::error!("Worker pool stopped unexpectedly");
                    session.abandon_in_flight();
                    break;
                }
            }
        }

        pool.shutdown().await;

        tracing::info!(
            "Crawl finished: {} pages rendered, {} errors in {:?}",
            session.rendered,
            session.errors.len(),
            started.elapsed()
        );
        session.into_report()
    }
}
