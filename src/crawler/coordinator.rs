//! Crawler coordinator - main crawl orchestration logic
//!
//! A single coordinator task owns the [`Frontier`] and the [`Aggregator`].
//! It hands URLs to at most `workers` concurrent units on a `JoinSet`; each
//! unit waits its politeness turn, fetches, extracts and classifies one
//! page and returns the outcome. Workers share nothing with the
//! coordinator except the mutex-guarded [`HostTable`].

use crate::config::{Config, CrawlerConfig, UserAgentConfig};
use crate::crawler::aggregator::{elapsed_ms, Aggregator, CrawlEnd};
use crate::crawler::classifier::classify;
use crate::crawler::extractor::{extract, PageMeta};
use crate::crawler::fetcher::{build_http_client, FetchError, Fetcher, HttpTransport, Transport};
use crate::crawler::frontier::{Frontier, QueuedUrl};
use crate::model::{CrawlStats, Product, ScrapeOptions, ScrapeResult};
use crate::progress::{CrawlEvent, ProgressSender};
use crate::robots::RobotsPolicy;
use crate::state::{CrawlOutcome, CrawlPhase, HostTable};
use crate::url::{extract_domain, normalize_parsed, parse_seed, Scope};
use crate::CrawlError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{self, JoinSet};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Runtime settings of a crawler, independent of the per-crawl options
#[derive(Debug, Clone, Default)]
pub struct CrawlerSettings {
    pub crawler: CrawlerConfig,
    pub user_agent: UserAgentConfig,
}

impl From<&Config> for CrawlerSettings {
    fn from(config: &Config) -> Self {
        Self {
            crawler: config.crawler.clone(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// A configured crawler that can run any number of crawls
pub struct Crawler<T = HttpTransport> {
    transport: Arc<T>,
    settings: CrawlerSettings,
    options: ScrapeOptions,
    cancel: CancellationToken,
    progress: ProgressSender,
}

impl Crawler<HttpTransport> {
    /// Creates a crawler backed by a `reqwest` client
    pub fn new(settings: CrawlerSettings, options: ScrapeOptions) -> Result<Self, CrawlError> {
        let client = build_http_client(&settings.user_agent, settings.crawler.request_timeout())?;
        Ok(Self::with_transport(
            HttpTransport::new(client),
            settings,
            options,
        ))
    }

    /// Creates a crawler from a loaded configuration file
    pub fn from_config(config: &Config) -> Result<Self, CrawlError> {
        Self::new(CrawlerSettings::from(config), config.scrape.clone())
    }
}

impl<T: Transport> Crawler<T> {
    /// Creates a crawler over a custom transport
    pub fn with_transport(transport: T, settings: CrawlerSettings, options: ScrapeOptions) -> Self {
        Self {
            transport: Arc::new(transport),
            settings,
            options,
            cancel: CancellationToken::new(),
            progress: ProgressSender::default(),
        }
    }

    /// Stops the crawl when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Reports progress on `progress` instead of a private channel
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = progress;
        self
    }

    pub fn options(&self) -> &ScrapeOptions {
        &self.options
    }

    pub fn settings(&self) -> &CrawlerSettings {
        &self.settings
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Subscribes to the progress events of subsequent crawls
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<CrawlEvent> {
        self.progress.subscribe()
    }

    /// Runs one crawl from `seed`
    ///
    /// Never fails: an invalid seed or an unreachable root page produce a
    /// result with `success == false` and a single error message.
    pub async fn run(&self, seed: &str) -> ScrapeResult {
        let started = Instant::now();
        let mut phase = CrawlPhase::Idle;

        self.progress.emit(CrawlEvent::Started {
            seed_url: seed.to_string(),
        });

        let seed_url = match parse_seed(seed) {
            Ok(url) => url,
            Err(source) => {
                let error = CrawlError::InvalidSeedUrl {
                    url: seed.to_string(),
                    source,
                };
                return self.fail(&mut phase, seed, error.to_string(), Default::default());
            }
        };
        let scope = match Scope::new(&seed_url, self.options.include_subdomains) {
            Ok(scope) => scope,
            Err(source) => {
                let error = CrawlError::InvalidSeedUrl {
                    url: seed.to_string(),
                    source,
                };
                return self.fail(&mut phase, seed, error.to_string(), Default::default());
            }
        };

        advance(&mut phase, CrawlPhase::Running);
        tracing::info!(
            "Starting crawl of {} (max {} pages, depth {})",
            seed_url,
            self.options.max_pages_to_visit,
            self.options.max_depth
        );

        let fetcher = Arc::new(Fetcher::new(
            Arc::clone(&self.transport),
            scope,
            self.options.auth.clone(),
        ));

        let robots = if self.settings.crawler.respect_robots {
            RobotsPolicy::fetch(&*fetcher, &seed_url, &self.settings.user_agent.crawler_name).await
        } else {
            RobotsPolicy::allow_all(&self.settings.user_agent.crawler_name)
        };

        if !robots.allows(&seed_url) {
            let message = format!("Seed URL {} is disallowed by robots.txt", seed_url);
            return self.fail(&mut phase, seed_url.as_str(), message, Default::default());
        }

        let mut gap = self.settings.crawler.request_gap();
        if let Some(delay) = robots.crawl_delay() {
            if delay > gap {
                tracing::info!("Honoring robots.txt crawl delay of {:?}", delay);
                gap = delay;
            }
        }
        let hosts = Arc::new(HostTable::new(gap));

        let mut run = CrawlRun {
            frontier: Frontier::new(self.options.max_depth, self.options.max_pages_to_visit),
            aggregator: Aggregator::new(seed_url.clone(), self.options.max_products),
            robots,
            scope: fetcher.scope().clone(),
            options: &self.options,
        };
        // The seed always fits: the page cap is at least one.
        if let Err(rejection) = run.frontier.enqueue(seed_url.clone(), 0) {
            let message = format!("Seed URL {} was not queued: {}", seed_url, rejection);
            return self.fail(&mut phase, seed_url.as_str(), message, Default::default());
        }

        let deadline = self
            .settings
            .crawler
            .deadline()
            .map(|d| tokio::time::Instant::now() + d);
        let workers = self.settings.crawler.workers.max(1) as usize;
        let detect_categories = self.options.detect_categories;

        let mut tasks: JoinSet<PageOutcome> = JoinSet::new();
        // Lets a worker that panicked still be settled in the frontier.
        let mut in_flight: HashMap<task::Id, QueuedUrl> = HashMap::new();
        let mut interrupted = false;

        loop {
            while tasks.len() < workers && !run.aggregator.product_limit_reached() {
                let Some(queued) = run.frontier.next() else {
                    break;
                };
                let fetcher = Arc::clone(&fetcher);
                let hosts = Arc::clone(&hosts);
                let handle = tasks.spawn(process_page(
                    fetcher,
                    hosts,
                    queued.clone(),
                    detect_categories,
                ));
                in_flight.insert(handle.id(), queued);
            }

            if tasks.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    tracing::info!("Crawl of {} cancelled", seed_url);
                    interrupted = true;
                    break;
                }

                _ = deadline_reached(deadline) => {
                    tracing::info!("Crawl of {} hit its deadline", seed_url);
                    interrupted = true;
                    break;
                }

                joined = tasks.join_next_with_id() => {
                    let Some(joined) = joined else {
                        break;
                    };
                    let outcome = match joined {
                        Ok((id, outcome)) => {
                            in_flight.remove(&id);
                            Some(outcome)
                        }
                        Err(e) => {
                            tracing::error!("Page worker failed: {}", e);
                            in_flight.remove(&e.id()).map(|queued| PageOutcome {
                                queued,
                                result: Err(FetchError::Worker(e.to_string())),
                            })
                        }
                    };
                    match outcome {
                        Some(outcome) => {
                            match run.handle(outcome) {
                                PageReport::Visited => {}
                                PageReport::Failed { url, reason } => {
                                    self.progress.emit(CrawlEvent::PageFailed { url, reason });
                                }
                                PageReport::RootFailed(message) => {
                                    tasks.abort_all();
                                    let mut stats = run.aggregator.stats().clone();
                                    stats.pages_failed += 1;
                                    stats.elapsed_ms = elapsed_ms(started.elapsed());
                                    return self.fail(
                                        &mut phase,
                                        seed_url.as_str(),
                                        message,
                                        stats,
                                    );
                                }
                            }
                            self.progress.emit(CrawlEvent::Progress {
                                pages_visited: run.frontier.visited_count(),
                                products_found: run.aggregator.product_count(),
                                pending: run.frontier.pending_count(),
                            });
                        }
                        None => run.aggregator.record_page_failed(),
                    }
                }
            }
        }

        if interrupted {
            tasks.abort_all();
        }

        let end = CrawlEnd {
            page_limit_reached: run.frontier.limit_reached(),
            interrupted,
            unvisited: run.frontier.pending_count() + run.frontier.in_flight_count(),
            urls_dropped_by_limit: run.frontier.dropped_count(),
            elapsed: started.elapsed(),
        };
        let result = run.aggregator.finish(end);

        advance(&mut phase, CrawlPhase::Finished(result.outcome));
        tracing::info!(
            "Crawl of {} finished ({}): {} products from {} pages in {}ms",
            seed_url,
            result.outcome,
            result.products.len(),
            result.stats.pages_visited,
            result.stats.elapsed_ms
        );
        self.progress.emit(CrawlEvent::Finished {
            outcome: result.outcome,
            products: result.products.len(),
        });

        result
    }

    fn fail(
        &self,
        phase: &mut CrawlPhase,
        seed: &str,
        message: String,
        stats: CrawlStats,
    ) -> ScrapeResult {
        advance(phase, CrawlPhase::Finished(CrawlOutcome::Failed));
        tracing::warn!("Crawl failed: {}", message);
        self.progress.emit(CrawlEvent::Failed {
            message: message.clone(),
        });
        ScrapeResult::failed(seed, message, stats)
    }
}

fn advance(phase: &mut CrawlPhase, next: CrawlPhase) {
    if let Err(e) = phase.transition(next) {
        tracing::error!("{}", e);
    }
}

async fn deadline_reached(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

/// Coordinator-owned state of one crawl
struct CrawlRun<'a> {
    frontier: Frontier,
    aggregator: Aggregator,
    robots: RobotsPolicy,
    scope: Scope,
    options: &'a ScrapeOptions,
}

/// How one page outcome was folded into the crawl
enum PageReport {
    Visited,
    Failed { url: String, reason: String },
    RootFailed(String),
}

impl CrawlRun<'_> {
    fn handle(&mut self, outcome: PageOutcome) -> PageReport {
        let PageOutcome { queued, result } = outcome;
        self.frontier.mark_visited(&queued.url);

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                if queued.depth == 0 {
                    return PageReport::RootFailed(format!(
                        "Failed to fetch root page {}: {}",
                        queued.url, e
                    ));
                }
                tracing::warn!("Skipping {}: {}", queued.url, e);
                self.aggregator.record_page_failed();
                return PageReport::Failed {
                    url: queued.url.to_string(),
                    reason: e.to_string(),
                };
            }
        };

        tracing::debug!(
            "Visited {} (depth {}): {} products, {} product links, {} links",
            queued.url,
            queued.depth,
            page.products.len(),
            page.product_links.len(),
            page.links.len()
        );

        self.aggregator.record_page_visited();
        self.aggregator.add_page_meta(&page.meta);
        self.aggregator.add_products(page.products);

        let next_depth = queued.depth + 1;
        if self.options.include_product_pages {
            for link in page.product_links {
                self.offer(link, next_depth);
            }
        }
        if self.options.recursive {
            for link in page.links {
                self.offer(link, next_depth);
            }
        }

        PageReport::Visited
    }

    /// Scope, then robots, then the frontier's own checks
    fn offer(&mut self, link: Url, depth: u32) {
        if !self.scope.contains(&link) {
            self.aggregator.record_out_of_scope(1);
            return;
        }
        if !self.robots.allows(&link) {
            tracing::debug!("{} disallowed by robots.txt", link);
            self.aggregator.record_disallowed(1);
            return;
        }
        if let Err(rejection) = self.frontier.enqueue(link, depth) {
            tracing::trace!("Link not queued: {}", rejection);
        }
    }
}

/// What a worker reports back for one URL
struct PageOutcome {
    queued: QueuedUrl,
    result: Result<PageData, FetchError>,
}

struct PageData {
    products: Vec<Product>,
    product_links: Vec<Url>,
    links: Vec<Url>,
    meta: PageMeta,
}

/// One unit of work: politeness wait, fetch, extract, classify
async fn process_page<T: Transport>(
    fetcher: Arc<Fetcher<T>>,
    hosts: Arc<HostTable>,
    queued: QueuedUrl,
    detect_categories: bool,
) -> PageOutcome {
    let result = fetch_and_extract(&*fetcher, &hosts, &queued.url, detect_categories).await;
    PageOutcome { queued, result }
}

async fn fetch_and_extract<T: Transport>(
    fetcher: &Fetcher<T>,
    hosts: &HostTable,
    url: &Url,
    detect_categories: bool,
) -> Result<PageData, FetchError> {
    if !fetcher.scope().contains(url) {
        return Err(FetchError::OutOfScope(url.to_string()));
    }

    if let Some(host) = extract_domain(url) {
        hosts.wait_turn(&host).await;
    }

    let page = fetcher.fetch(url).await?;
    let page_url = normalize_parsed(page.url.clone()).unwrap_or_else(|_| url.clone());
    let extracted = extract(&page.body, &page_url);

    let products = extracted
        .products
        .into_iter()
        .filter_map(|mut candidate| {
            if detect_categories {
                if let Some((category, subcategory)) = candidate.detail_url().and_then(classify) {
                    candidate.category = Some(category);
                    candidate.subcategory = Some(subcategory);
                }
            }
            candidate.build()
        })
        .collect();

    Ok(PageData {
        products,
        product_links: extracted.product_links,
        links: extracted.links,
        meta: extracted.meta,
    })
}

/// Crawls `seed` with default crawler settings
///
/// # Example
///
/// ```no_run
/// use storefront_crawler::{run_crawl, ScrapeOptions};
///
/// # async fn example() {
/// let result = run_crawl("https://store.example.com", ScrapeOptions::default()).await;
/// println!("{} products", result.products.len());
/// # }
/// ```
pub async fn run_crawl(seed_url: &str, options: ScrapeOptions) -> ScrapeResult {
    match Crawler::new(CrawlerSettings::default(), options) {
        Ok(crawler) => crawler.run(seed_url).await,
        Err(e) => ScrapeResult::failed(seed_url, e.to_string(), Default::default()),
    }
}
