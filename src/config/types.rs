use serde::{Deserialize, Serialize};
use std::fmt;

/// Main configuration structure for Sumi-Scrape
///
/// Every section has defaults, so an empty file (or no file at all) yields
/// a working configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetcher: FetcherConfig,
    pub retry: RetryConfig,
    pub identity: IdentityConfig,
    pub browser: BrowserConfig,
    pub crawler: CrawlerConfig,
    pub extractor: ExtractorConfig,
    pub parser: ParserConfig,

    /// Domain patterns that are never fetched (e.g., "ads.example.com" or "*.tracker.net")
    #[serde(rename = "blocked-domains")]
    pub blocked_domains: Vec<String>,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetcherConfig {
    /// Total request timeout for the static strategy (milliseconds)
    pub timeout_ms: u64,

    /// Connection establishment timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// Total request timeout for the raw best-effort strategy (milliseconds)
    pub raw_timeout_ms: u64,

    /// Bodies larger than this are truncated
    pub max_body_bytes: usize,

    /// Maximum redirect hops followed per request
    pub max_redirects: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            raw_timeout_ms: 15_000,
            max_body_bytes: 10 * 1024 * 1024,
            max_redirects: 10,
        }
    }
}

/// Retry and backoff configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Maximum attempts per strategy, including the first one
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds); doubles on each retry
    pub base_delay_ms: u64,

    /// Upper bound for a single backoff delay (milliseconds)
    pub max_delay_ms: u64,

    /// Random spread applied to each delay, as a fraction of it (0.0 - 1.0)
    pub jitter_ratio: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            jitter_ratio: 0.2,
        }
    }
}

/// Client identity configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct IdentityConfig {
    /// Name used in the declared (non-stealth) user agent
    pub crawler_name: String,

    /// Version used in the declared user agent
    pub crawler_version: String,

    /// Optional URL with information about the client
    pub contact_url: Option<String>,

    /// Browser user agents rotated through in stealth mode
    pub user_agents: Vec<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SumiScrape".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            user_agents: default_user_agents(),
        }
    }
}

fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:122.0) Gecko/20100101 Firefox/122.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2.1 Safari/605.1.15",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36 Edg/121.0.0.0",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Headless browser configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserConfig {
    /// Allow the dynamic rendering strategy when a caller asks for it
    pub enabled: bool,

    /// Explicit Chromium executable; searched on PATH when unset
    pub chrome_path: Option<String>,

    /// Navigation timeout (milliseconds)
    pub navigation_timeout_ms: u64,

    /// Fixed delay after navigation before reading the DOM (milliseconds)
    pub settle_ms: u64,

    /// Upper bound on waiting for network idle (milliseconds)
    pub network_idle_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chrome_path: None,
            navigation_timeout_ms: 45_000,
            settle_ms: 2_000,
            network_idle_timeout_ms: 10_000,
        }
    }
}

/// How robots.txt is treated during fetches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotsPolicy {
    /// Never fetch robots.txt
    Ignore,
    /// Fetch robots.txt, log and flag disallowed pages, fetch them anyway
    #[default]
    Advisory,
    /// Skip pages disallowed by robots.txt
    Enforce,
}

impl fmt::Display for RobotsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignore => write!(f, "ignore"),
            Self::Advisory => write!(f, "advisory"),
            Self::Enforce => write!(f, "enforce"),
        }
    }
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Lower bound of the pause between page fetches (milliseconds)
    pub delay_min_ms: u64,

    /// Upper bound of the randomized pause between page fetches (milliseconds)
    pub delay_max_ms: u64,

    /// Maximum outbound links queued from a single page
    pub links_per_page: usize,

    /// Cap on the discovered-links list returned in a crawl report
    pub max_discovered_links: usize,

    /// robots.txt handling
    pub robots_policy: RobotsPolicy,

    /// Ceiling on a robots.txt crawl-delay (milliseconds)
    pub max_robots_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            delay_min_ms: 1_000,
            delay_max_ms: 3_000,
            links_per_page: 25,
            max_discovered_links: 100,
            robots_policy: RobotsPolicy::Advisory,
            max_robots_delay_ms: 30_000,
        }
    }
}

/// Extraction tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtractorConfig {
    /// Text blocks shorter than this (in characters) are treated as noise
    pub min_text_length: usize,

    /// Default cap on items per extraction mode
    pub max_results: usize,

    /// Pages with less cleaned text than this are considered thin
    pub min_content_chars: usize,

    /// Length of the per-page summary in crawl reports
    pub summary_chars: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_text_length: 10,
            max_results: 50,
            min_content_chars: 100,
            summary_chars: 500,
        }
    }
}

/// Parser adapter tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ParserConfig {
    /// Recoverable errors tolerated by the strict strategy before falling back
    pub max_strict_errors: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_strict_errors: 100,
        }
    }
}
