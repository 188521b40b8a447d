//! Page acquisition
//!
//! Design: each [`Fetcher`] is one acquisition strategy (headless browser,
//! stealth HTTP session, raw HTTP). [`FetchChain`] holds them in priority
//! order and returns the first success, or every strategy's error when all
//! of them fail.

#[cfg(feature = "browser")]
mod browser;
mod chain;
mod http;
mod identity;
mod retry;

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;
pub use chain::FetchChain;
pub use http::{HttpFetcher, RawFetcher};
pub use identity::Identity;
pub use retry::RetryPolicy;

use crate::config::Config;
use crate::FetchError;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Acquisition strategy that produced a [`FetchResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Headless browser navigation with JavaScript executed
    Dynamic,
    /// Session client with cookies, identity headers and retries
    Static,
    /// Single best-effort request with minimal headers
    Raw,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dynamic => write!(f, "dynamic"),
            Self::Static => write!(f, "static"),
            Self::Raw => write!(f, "raw"),
        }
    }
}

/// Raw response for one URL
///
/// Produced once per successful fetch and never modified afterwards.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// URL that was requested
    pub url: String,
    /// URL after redirects
    pub final_url: String,
    /// HTTP status; 0 when the strategy could not observe it
    pub status_code: u16,
    /// Response headers with lowercase names
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub elapsed: Duration,
    pub strategy: Strategy,
    /// Attempts made by the producing strategy, including the successful one
    pub attempts: u32,
}

impl FetchResult {
    /// Content-Type header value, if any
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// Returns false when the Content-Type names something other than a page
    ///
    /// A missing header counts as a page; the decoder sniffs it.
    pub fn is_document(&self) -> bool {
        let Some(value) = self.content_type() else {
            return true;
        };
        let mime = value
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        mime.is_empty() || mime.starts_with("text/") || mime == "application/xhtml+xml"
    }

    /// Final URL parsed, falling back to the requested URL
    pub fn base_url(&self) -> Option<Url> {
        Url::parse(&self.final_url)
            .or_else(|_| Url::parse(&self.url))
            .ok()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }
}

/// Turns the status a rendered page reports into a fetch outcome
///
/// Error statuses fail the strategy like they do for HTTP fetches. A missing
/// or zero status (cached, `file:` or opaque navigations) is recorded as 0.
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
pub(crate) fn rendered_status(url: &Url, observed: Option<u16>) -> Result<u16, FetchError> {
    match observed {
        Some(status) if status >= 400 => Err(FetchError::from_status(url.as_str(), status)),
        Some(status) => Ok(status),
        None => Ok(0),
    }
}

/// Per-call fetch behavior
///
/// Transport settings (timeouts, identity, clients) live in the fetchers
/// themselves; this carries what can change from one tool call to the next.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Rotate browser identities and headers, retry 403 responses
    pub stealth: bool,
    /// Allow the headless browser strategy
    pub use_javascript: bool,
    pub retry: RetryPolicy,
}

impl FetchConfig {
    /// Builds per-call settings from configuration
    pub fn from_config(config: &Config, stealth: bool, use_javascript: bool) -> Self {
        Self {
            stealth,
            use_javascript,
            retry: RetryPolicy::from_config(&config.retry),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            stealth: true,
            use_javascript: false,
            retry: RetryPolicy::default(),
        }
    }
}

/// One page acquisition strategy
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Strategy label recorded on results and in logs
    fn strategy(&self) -> Strategy;

    /// Returns true if this strategy should run for the given call
    ///
    /// The browser strategy only runs when JavaScript rendering is requested.
    fn applies(&self, _config: &FetchConfig) -> bool {
        true
    }

    /// Fetch one URL
    async fn fetch(&self, url: &Url, config: &FetchConfig) -> Result<FetchResult, FetchError>;
}
