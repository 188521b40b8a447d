//! Ordered fallback over fetch strategies

use crate::config::Config;
use crate::fetcher::http::{HttpFetcher, RawFetcher};
use crate::fetcher::{FetchConfig, FetchResult, Fetcher, Identity};
use crate::url::blocked_by;
use crate::FetchError;
use reqwest::Client;
use tracing::{debug, error, warn};
use url::Url;

/// Fetch strategies tried in priority order
pub struct FetchChain {
    fetchers: Vec<Box<dyn Fetcher>>,
    blocked_domains: Vec<String>,
    client: Client,
    identity: Identity,
}

impl FetchChain {
    /// Builds the standard chain: browser (when compiled in), static, raw
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let http = HttpFetcher::new(config)?;
        let client = http.client().clone();
        let identity = http.identity().clone();

        let mut fetchers: Vec<Box<dyn Fetcher>> = Vec::new();
        #[cfg(feature = "browser")]
        fetchers.push(Box::new(crate::fetcher::BrowserFetcher::new(config)));
        fetchers.push(Box::new(http));
        fetchers.push(Box::new(RawFetcher::new(config)?));

        Ok(Self {
            fetchers,
            blocked_domains: config.blocked_domains.clone(),
            client,
            identity,
        })
    }

    /// Builds a chain from explicit strategies
    ///
    /// `client` is used for robots.txt lookups only.
    pub fn new(fetchers: Vec<Box<dyn Fetcher>>, config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(FetchError::ClientBuild)?;

        Ok(Self {
            fetchers,
            blocked_domains: config.blocked_domains.clone(),
            client,
            identity: Identity::from_config(&config.identity),
        })
    }

    /// Session client for auxiliary requests such as robots.txt
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Fetches `url` with the first strategy that succeeds
    pub async fn fetch(&self, url: &Url, config: &FetchConfig) -> Result<FetchResult, FetchError> {
        self.fetch_best(url, config, 0, |_| 0).await
    }

    /// Fetches `url`, moving on to later strategies while results are thin
    ///
    /// `measure` scores a result (e.g. characters of cleaned text). A result
    /// scoring at least `min_score` is returned immediately; otherwise the
    /// next strategy runs and the best-scoring result wins.
    ///
    /// # Returns
    ///
    /// * `Ok(FetchResult)` - The first sufficient result, or the richest one
    /// * `Err(FetchError::BlockedDomain)` - The host matches `blocked-domains`
    /// * `Err(FetchError::AllStrategiesFailed)` - No strategy produced a result
    pub async fn fetch_best<M>(
        &self,
        url: &Url,
        config: &FetchConfig,
        min_score: usize,
        measure: M,
    ) -> Result<FetchResult, FetchError>
    where
        M: Fn(&FetchResult) -> usize + Send + Sync,
    {
        if let Some(pattern) = blocked_by(url, &self.blocked_domains) {
            warn!("Refusing {}: host matches blocked pattern {}", url, pattern);
            return Err(FetchError::BlockedDomain {
                domain: url.host_str().unwrap_or_default().to_string(),
            });
        }

        let mut errors = Vec::new();
        let mut best: Option<(usize, FetchResult)> = None;

        for fetcher in self.fetchers.iter().filter(|f| f.applies(config)) {
            let strategy = fetcher.strategy();
            match fetcher.fetch(url, config).await {
                Ok(result) => {
                    let score = measure(&result);
                    if score >= min_score {
                        debug!(
                            "{} fetched {} ({} bytes, {} attempts)",
                            strategy,
                            url,
                            result.body.len(),
                            result.attempts
                        );
                        return Ok(result);
                    }
                    warn!(
                        "{} result for {} is thin (score {} < {}); trying next strategy",
                        strategy, url, score, min_score
                    );
                    if best.as_ref().map_or(true, |(s, _)| score > *s) {
                        best = Some((score, result));
                    }
                }
                Err(e) => {
                    warn!("{} strategy failed for {}: {}", strategy, url, e);
                    errors.push(format!("{}: {}", strategy, e));
                }
            }
        }

        if let Some((_, result)) = best {
            return Ok(result);
        }

        error!("All fetch strategies failed for {}", url);
        Err(FetchError::AllStrategiesFailed {
            url: url.to_string(),
            errors,
        })
    }
}
