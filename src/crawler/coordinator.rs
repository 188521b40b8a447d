//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop, which:
//! - Pops URLs breadth-first from the frontier
//! - Applies the robots.txt policy and the pause between fetches
//! - Runs each page through the fetch/decode/parse/extract pipeline
//! - Queues in-scope outbound links one level deeper
//! - Builds the final report

use crate::config::{Config, RobotsPolicy};
use crate::crawler::scheduler::{effective_delay, url_key, Frontier, QueuedUrl};
use crate::crawler::PageState;
use crate::extract::{ExtractedItem, ExtractionMode, ExtractionRequest};
use crate::fetcher::{FetchChain, FetchConfig, Strategy};
use crate::pipeline::{self, PageOutcome};
use crate::robots::{is_allowed, RobotsCache};
use crate::url::host_key;
use crate::ScrapeError;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// What the crawl extracts from each page besides its summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContentFocus {
    /// Main article body per page
    Articles,
    /// Product metadata (JSON-LD, Open Graph) per page
    Products,
    /// Title and summary only
    #[default]
    General,
}

impl ContentFocus {
    /// Extraction run on every successfully fetched page
    pub fn extraction_mode(&self) -> Option<ExtractionMode> {
        match self {
            Self::Articles => Some(ExtractionMode::Article),
            Self::Products => Some(ExtractionMode::Metadata),
            Self::General => None,
        }
    }
}

/// Bounds and behavior of one crawl
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub max_pages: usize,
    pub max_depth: usize,
    /// Only follow links on the seed's host (or the host it redirected to)
    pub same_domain_only: bool,
    pub stealth: bool,
    pub use_javascript: bool,
    /// Extraction run on each fetched page; `None` keeps title and summary only
    pub mode: Option<ExtractionMode>,
    /// Narrows the per-page extraction
    pub selector: Option<String>,
    /// Per-page item cap; defaults to `extractor.max-results`
    pub max_results: Option<usize>,
}

impl CrawlOptions {
    /// Sets the per-page extraction from a content focus
    pub fn with_focus(mut self, focus: ContentFocus) -> Self {
        self.mode = focus.extraction_mode();
        self
    }
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_pages: 10,
            max_depth: 2,
            same_domain_only: true,
            stealth: true,
            use_javascript: false,
            mode: None,
            selector: None,
            max_results: None,
        }
    }
}

/// Result for one visited page
#[derive(Debug, Clone, Serialize)]
pub struct CrawlPage {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    pub depth: usize,
    pub state: PageState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub summary: String,
    pub word_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    pub attempts: u32,
    /// robots.txt disallows this URL (recorded under the advisory policy)
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub robots_disallowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ExtractedItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

impl CrawlPage {
    fn new(queued: &QueuedUrl) -> Self {
        Self {
            url: queued.url.to_string(),
            final_url: None,
            depth: queued.depth,
            state: PageState::Pending,
            title: None,
            summary: String::new(),
            word_count: 0,
            status_code: None,
            strategy: None,
            attempts: 0,
            robots_disallowed: false,
            error: None,
            items: Vec::new(),
            notes: Vec::new(),
            fetched_at: Utc::now(),
        }
    }

    fn record(&mut self, outcome: PageOutcome) {
        self.final_url = Some(outcome.fetch.final_url);
        self.status_code = Some(outcome.fetch.status_code);
        self.strategy = Some(outcome.fetch.strategy);
        self.attempts = outcome.fetch.attempts;
        self.title = outcome.title;
        self.summary = outcome.summary;
        self.word_count = outcome.word_count;
        self.items = outcome.extraction.items;
        self.notes = outcome.extraction.notes;
    }
}

/// Crawl-level totals
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    pub start_url: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub pages_attempted: usize,
    pub pages_succeeded: usize,
    pub pages_failed: usize,
    pub max_depth_reached: usize,
    pub total_words: usize,
    pub robots_policy: RobotsPolicy,
    /// Unique in-scope links seen, capped at `crawler.max-discovered-links`
    pub discovered_links: Vec<String>,
    pub discovered_total: usize,
}

/// Everything a crawl produced
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub summary: CrawlSummary,
    pub pages: Vec<CrawlPage>,
}

/// Unique discovered links, keeping the first `cap` for the report
struct Discovered {
    seen: HashSet<String>,
    kept: Vec<String>,
    cap: usize,
}

impl Discovered {
    fn new(cap: usize) -> Self {
        Self {
            seen: HashSet::new(),
            kept: Vec::new(),
            cap,
        }
    }

    fn add(&mut self, url: &Url) {
        if self.seen.insert(url_key(url)) && self.kept.len() < self.cap {
            self.kept.push(url.to_string());
        }
    }
}

/// Crawls breadth-first from `seed`
///
/// Pages are fetched one at a time. A failing page is recorded and the crawl
/// moves on; the crawl itself only fails on an internal state error.
///
/// # Arguments
///
/// * `chain` - Fetch strategies, session client and identity
/// * `config` - Crawler, extractor and parser settings
/// * `seed` - Starting URL (depth 0)
/// * `options` - Page and depth limits, scope and per-page extraction
pub async fn crawl(
    chain: &FetchChain,
    config: &Config,
    seed: Url,
    options: &CrawlOptions,
) -> Result<CrawlReport, ScrapeError> {
    let started_at = Utc::now();
    let start_time = Instant::now();
    let policy = config.crawler.robots_policy;
    let fetch_config = FetchConfig::from_config(config, options.stealth, options.use_javascript);
    let product = chain.identity().product_token().to_string();
    let declared = chain.identity().declared_agent().to_string();

    info!(
        "Starting crawl of {} (max_pages={}, max_depth={}, robots={})",
        seed, options.max_pages, options.max_depth, policy
    );

    let mut frontier = Frontier::new(seed.clone(), options.max_depth);
    let mut allowed_hosts: HashSet<String> = host_key(&seed).into_iter().collect();
    let mut robots = RobotsCache::new();
    let mut discovered = Discovered::new(config.crawler.max_discovered_links);
    let mut pages: Vec<CrawlPage> = Vec::new();
    let mut fetched_any = false;

    while pages.len() < options.max_pages {
        let Some(queued) = frontier.pop() else {
            info!("Frontier is empty, crawl complete");
            break;
        };
        debug!("Processing {} at depth {}", queued.url, queued.depth);

        let mut page = CrawlPage::new(&queued);
        let mut state = PageState::Pending;

        let mut crawl_delay = None;
        if policy != RobotsPolicy::Ignore {
            let rules = robots.rules_for(chain.client(), &queued.url, &declared).await;
            crawl_delay = rules.crawl_delay(&product);
            if !is_allowed(rules, &queued.url, &product) {
                page.robots_disallowed = true;
                if policy == RobotsPolicy::Enforce {
                    info!("Skipping {}: disallowed by robots.txt", queued.url);
                    page.error = Some(
                        ScrapeError::RobotsDenied {
                            url: queued.url.to_string(),
                        }
                        .to_string(),
                    );
                    page.state = state.transition(PageState::Failed)?;
                    pages.push(page);
                    continue;
                }
                warn!("{} is disallowed by robots.txt (advisory policy)", queued.url);
            }
        }

        if fetched_any {
            let delay = effective_delay(&config.crawler, options.stealth, crawl_delay);
            debug!("Waiting {:?} before next fetch", delay);
            tokio::time::sleep(delay).await;
        }

        state = state.transition(PageState::Fetching)?;
        fetched_any = true;
        page.fetched_at = Utc::now();

        match chain.fetch(&queued.url, &fetch_config).await {
            Err(e) => {
                warn!("Failed to crawl {}: {}", queued.url, e);
                page.error = Some(e.to_string());
                state = state.transition(PageState::Failed)?;
            }
            Ok(result) if !result.is_document() => {
                info!(
                    "Skipping {}: not a page ({})",
                    queued.url,
                    result.content_type().unwrap_or_default()
                );
                page.final_url = Some(result.final_url.clone());
                page.status_code = Some(result.status_code);
                page.strategy = Some(result.strategy);
                page.attempts = result.attempts;
                page.error = Some(format!(
                    "Unsupported content type: {}",
                    result.content_type().unwrap_or_default()
                ));
                state = state.transition(PageState::Failed)?;
            }
            Ok(result) => {
                state = state.transition(PageState::Extracting)?;

                let request = page_request(&queued.url, options, config);
                let outcome = pipeline::process(&result, &request, config);
                if let Some(final_url) = result.base_url() {
                    if queued.depth == 0 {
                        allowed_hosts.extend(host_key(&final_url));
                    }
                    frontier.mark_visited(&final_url);
                }

                let mut queued_links = 0;
                for link in outcome
                    .links
                    .iter()
                    .filter(|link| {
                        !options.same_domain_only
                            || host_key(link).is_some_and(|h| allowed_hosts.contains(&h))
                    })
                    .take(config.crawler.links_per_page)
                {
                    discovered.add(link);
                    if frontier.can_descend(queued.depth)
                        && frontier.push(link.clone(), queued.depth + 1)
                    {
                        queued_links += 1;
                    }
                }
                debug!("Queued {} links from {}", queued_links, queued.url);

                page.record(outcome);
                state = state.transition(PageState::Done)?;
            }
        }

        page.state = state;
        pages.push(page);

        info!(
            "Progress: {} pages crawled, {} in frontier",
            pages.len(),
            frontier.len()
        );
    }

    let succeeded: Vec<&CrawlPage> = pages
        .iter()
        .filter(|p| p.state == PageState::Done)
        .collect();
    let summary = CrawlSummary {
        start_url: seed.to_string(),
        started_at,
        elapsed_ms: start_time.elapsed().as_millis() as u64,
        pages_attempted: pages.len(),
        pages_succeeded: succeeded.len(),
        pages_failed: pages.len() - succeeded.len(),
        max_depth_reached: succeeded.iter().map(|p| p.depth).max().unwrap_or(0),
        total_words: succeeded.iter().map(|p| p.word_count).sum(),
        robots_policy: policy,
        discovered_total: discovered.seen.len(),
        discovered_links: discovered.kept,
    };

    info!(
        "Crawl completed: {} pages ({} failed) in {:?}",
        summary.pages_attempted,
        summary.pages_failed,
        start_time.elapsed()
    );

    Ok(CrawlReport { summary, pages })
}

fn page_request(url: &Url, options: &CrawlOptions, config: &Config) -> ExtractionRequest {
    let mode = options.mode.unwrap_or_default();
    let mut request = ExtractionRequest::new(url.clone(), mode)
        .with_config(&config.extractor)
        .with_selector(options.selector.clone());
    if let Some(max_results) = options.max_results {
        request.limits.max_results = max_results;
    }
    request.include_technical = false;
    request.behavior.stealth = options.stealth;
    request.behavior.use_dynamic_rendering = options.use_javascript;
    request.behavior.respect_domain_scope = options.same_domain_only;
    request.limits.max_pages = options.max_pages;
    request.limits.max_depth = options.max_depth;
    if options.mode.is_none() {
        request.limits.max_results = 0;
    }
    request
}
