//! HTTP fetch strategies
//!
//! [`HttpFetcher`] is the primary static strategy: one session client with a
//! cookie jar, identity headers per attempt, retries on transient failures.
//! [`RawFetcher`] is the last resort: a separate cookie-less client, minimal
//! headers, a single attempt.

use crate::config::Config;
use crate::fetcher::identity::{minimal_headers, Identity};
use crate::fetcher::{FetchConfig, FetchResult, Fetcher, Strategy};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{redirect::Policy, Client};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// Static strategy backed by a cookie-keeping session
pub struct HttpFetcher {
    client: Client,
    identity: Identity,
    max_body_bytes: usize,
}

impl HttpFetcher {
    /// Builds the session client from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(HttpFetcher)` - Ready to fetch
    /// * `Err(FetchError::ClientBuild)` - The TLS backend or client failed to initialize
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_millis(config.fetcher.timeout_ms))
            .connect_timeout(Duration::from_millis(config.fetcher.connect_timeout_ms))
            .redirect(Policy::limited(config.fetcher.max_redirects))
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(FetchError::ClientBuild)?;

        Ok(Self {
            client,
            identity: Identity::from_config(&config.identity),
            max_body_bytes: config.fetcher.max_body_bytes,
        })
    }

    /// The session client, shared with robots.txt lookups
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn strategy(&self) -> Strategy {
        Strategy::Static
    }

    async fn fetch(&self, url: &Url, config: &FetchConfig) -> Result<FetchResult, FetchError> {
        let stealth = config.stealth;
        let (mut result, attempts) = config
            .retry
            .run(
                |attempt| {
                    let headers = self.identity.headers(url, stealth);
                    debug!("GET {} (attempt {}, stealth={})", url, attempt + 1, stealth);
                    send(&self.client, url, headers, self.max_body_bytes, Strategy::Static)
                },
                |err| err.is_transient(stealth),
            )
            .await?;

        result.attempts = attempts;
        Ok(result)
    }
}

/// Last-resort strategy: one plain request
pub struct RawFetcher {
    client: Client,
    user_agent: String,
    max_body_bytes: usize,
}

impl RawFetcher {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.fetcher.raw_timeout_ms))
            .redirect(Policy::limited(config.fetcher.max_redirects))
            .build()
            .map_err(FetchError::ClientBuild)?;

        Ok(Self {
            client,
            user_agent: Identity::from_config(&config.identity)
                .declared_agent()
                .to_string(),
            max_body_bytes: config.fetcher.max_body_bytes,
        })
    }
}

#[async_trait]
impl Fetcher for RawFetcher {
    fn strategy(&self) -> Strategy {
        Strategy::Raw
    }

    async fn fetch(&self, url: &Url, _config: &FetchConfig) -> Result<FetchResult, FetchError> {
        debug!("GET {} (raw)", url);
        send(
            &self.client,
            url,
            minimal_headers(&self.user_agent),
            self.max_body_bytes,
            Strategy::Raw,
        )
        .await
    }
}

/// Sends one GET request and reads the body
///
/// Non-success statuses become errors; bodies beyond `max_body_bytes` are truncated.
async fn send(
    client: &Client,
    url: &Url,
    headers: HeaderMap,
    max_body_bytes: usize,
    strategy: Strategy,
) -> Result<FetchResult, FetchError> {
    let start = Instant::now();
    let mut response = client
        .get(url.clone())
        .headers(headers)
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::from_status(url.as_str(), status.as_u16()));
    }

    let final_url = response.url().to_string();
    let headers: BTreeMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?
    {
        if append_capped(&mut body, &chunk, max_body_bytes) {
            debug!("Body of {} truncated at {} bytes", url, max_body_bytes);
            break;
        }
    }

    Ok(FetchResult {
        url: url.to_string(),
        final_url,
        status_code: status.as_u16(),
        headers,
        body,
        elapsed: start.elapsed(),
        strategy,
        attempts: 1,
    })
}

/// Appends as much of `chunk` as fits under `cap`
///
/// Returns true only when bytes had to be dropped; a body ending exactly at
/// the cap is complete.
fn append_capped(body: &mut Vec<u8>, chunk: &[u8], cap: usize) -> bool {
    let room = cap.saturating_sub(body.len());
    if chunk.len() > room {
        body.extend_from_slice(&chunk[..room]);
        return true;
    }
    body.extend_from_slice(chunk);
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_ending_at_cap_is_complete() {
        let mut body = b"abc".to_vec();
        assert!(!append_capped(&mut body, b"de", 5));
        assert_eq!(body, b"abcde");
    }

    #[test]
    fn test_body_past_cap_truncated() {
        let mut body = b"abc".to_vec();
        assert!(append_capped(&mut body, b"defg", 5));
        assert_eq!(body, b"abcde");

        assert!(append_capped(&mut body, b"h", 5));
        assert_eq!(body.len(), 5);
    }

    #[test]
    fn test_empty_chunk_at_cap() {
        let mut body = b"abcde".to_vec();
        assert!(!append_capped(&mut body, b"", 5));
    }
}
