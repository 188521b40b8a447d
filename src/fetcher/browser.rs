//! Headless Chromium strategy using chromiumoxide
//!
//! The browser is launched on first use and lives as long as the fetcher.
//! Each fetch opens a fresh page, navigates, waits for the DOM to settle and
//! returns the rendered HTML.

use crate::config::{BrowserConfig as BrowserSettings, Config};
use crate::fetcher::identity::Identity;
use crate::fetcher::{rendered_status, FetchConfig, FetchResult, Fetcher, Strategy};
use crate::FetchError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use futures::StreamExt;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

/// Poll interval while waiting for the page to go quiet
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Main-document status from the Navigation Timing entry, 0 if unavailable
const NAVIGATION_STATUS_JS: &str = "(() => { \
    const entry = performance.getEntriesByType('navigation')[0]; \
    return entry && entry.responseStatus ? entry.responseStatus : 0; })()";

struct Session {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl Drop for Session {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Dynamic strategy: renders pages in headless Chromium
pub struct BrowserFetcher {
    settings: BrowserSettings,
    identity: Identity,
    session: OnceCell<Session>,
}

impl BrowserFetcher {
    pub fn new(config: &Config) -> Self {
        Self {
            settings: config.browser.clone(),
            identity: Identity::from_config(&config.identity),
            session: OnceCell::new(),
        }
    }

    async fn session(&self, url: &Url) -> Result<&Session, FetchError> {
        self.session
            .get_or_try_init(|| launch(&self.settings, url))
            .await
    }

    /// Waits until the document is complete and its size stops changing
    ///
    /// Bounded by `network-idle-timeout-ms`; giving up is not an error.
    async fn wait_for_idle(&self, page: &chromiumoxide::Page) {
        let deadline = Instant::now() + Duration::from_millis(self.settings.network_idle_timeout_ms);
        let mut last_len = 0usize;

        while Instant::now() < deadline {
            let state = page
                .evaluate("[document.readyState, document.documentElement.outerHTML.length]")
                .await
                .ok()
                .and_then(|r| r.into_value::<(String, usize)>().ok());

            if let Some((ready, len)) = state {
                if ready == "complete" && len == last_len {
                    return;
                }
                last_len = len;
            }
            tokio::time::sleep(IDLE_POLL).await;
        }
        debug!("Page did not go idle within {}ms", self.settings.network_idle_timeout_ms);
    }
}

async fn launch(settings: &BrowserSettings, url: &Url) -> Result<Session, FetchError> {
    let browser_error = |message: String| FetchError::Browser {
        url: url.to_string(),
        message,
    };

    let mut builder = BrowserConfig::builder()
        .arg("--headless=new")
        .arg("--disable-gpu")
        .arg("--no-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-extensions")
        .arg("--disable-blink-features=AutomationControlled");
    if let Some(path) = &settings.chrome_path {
        builder = builder.chrome_executable(path);
    }
    let config = builder
        .build()
        .map_err(|e| browser_error(format!("failed to build browser config: {e}")))?;

    let (browser, mut handler) = Browser::launch(config)
        .await
        .map_err(|e| browser_error(format!("failed to launch Chromium: {e}")))?;

    let handler = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    });

    debug!("Launched headless Chromium");
    Ok(Session { browser, handler })
}

#[async_trait]
impl Fetcher for BrowserFetcher {
    fn strategy(&self) -> Strategy {
        Strategy::Dynamic
    }

    fn applies(&self, config: &FetchConfig) -> bool {
        config.use_javascript && self.settings.enabled
    }

    async fn fetch(&self, url: &Url, config: &FetchConfig) -> Result<FetchResult, FetchError> {
        let browser_error = |message: String| FetchError::Browser {
            url: url.to_string(),
            message,
        };
        let start = Instant::now();
        let session = self.session(url).await?;

        let page = session
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| browser_error(format!("failed to open page: {e}")))?;

        let agent = SetUserAgentOverrideParams::new(self.identity.user_agent(config.stealth));
        if let Err(e) = page.set_user_agent(agent).await {
            warn!("Could not set user agent for {}: {}", url, e);
        }

        let timeout = Duration::from_millis(self.settings.navigation_timeout_ms);
        let navigation = tokio::time::timeout(timeout, page.goto(url.as_str()))
            .await
            .map(|r| r.map(|_| ()));
        match navigation {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                let _ = page.close().await;
                return Err(browser_error(format!("navigation failed: {e}")));
            }
            Err(_) => {
                let _ = page.close().await;
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                });
            }
        }
        let _ = page.wait_for_navigation().await;

        tokio::time::sleep(Duration::from_millis(self.settings.settle_ms)).await;
        self.wait_for_idle(&page).await;

        let observed = page
            .evaluate(NAVIGATION_STATUS_JS)
            .await
            .ok()
            .and_then(|r| r.into_value::<u16>().ok())
            .filter(|status| *status > 0);
        let html = page.content().await;
        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());
        let _ = page.close().await;
        let status_code = rendered_status(url, observed)?;
        let html = html.map_err(|e| browser_error(format!("failed to read DOM: {e}")))?;

        let mut headers = BTreeMap::new();
        headers.insert(
            "content-type".to_string(),
            "text/html; charset=utf-8".to_string(),
        );

        Ok(FetchResult {
            url: url.to_string(),
            final_url,
            status_code,
            headers,
            body: html.into_bytes(),
            elapsed: start.elapsed(),
            strategy: Strategy::Dynamic,
            attempts: 1,
        })
    }
}
