//! Request identity: user agent and header set
//!
//! Stealth mode presents as a desktop browser, picking a user agent from the
//! configured pool on every attempt. Otherwise requests carry one declared
//! identity of the form `Name/Version (+contact-url)`.

use crate::config::IdentityConfig;
use rand::seq::SliceRandom;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, DNT, REFERER,
    UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use url::Url;

const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8";
const DECLARED_ACCEPT: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";

/// Identity presented to servers
#[derive(Debug, Clone)]
pub struct Identity {
    declared: String,
    product: String,
    user_agents: Vec<String>,
}

impl Identity {
    pub fn from_config(config: &IdentityConfig) -> Self {
        let declared = match &config.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                config.crawler_name, config.crawler_version, contact
            ),
            None => format!("{}/{}", config.crawler_name, config.crawler_version),
        };

        Self {
            declared,
            product: config.crawler_name.clone(),
            user_agents: config.user_agents.clone(),
        }
    }

    /// The declared, non-stealth user agent
    pub fn declared_agent(&self) -> &str {
        &self.declared
    }

    /// Product token matched against robots.txt groups
    pub fn product_token(&self) -> &str {
        &self.product
    }

    /// Picks a user agent for one attempt
    ///
    /// Falls back to the declared agent when stealth is off or the pool is empty.
    pub fn user_agent(&self, stealth: bool) -> &str {
        if !stealth {
            return &self.declared;
        }
        self.user_agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(&self.declared)
    }

    /// Full header set for one request to `url`
    pub fn headers(&self, url: &Url, stealth: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        insert(&mut headers, USER_AGENT, self.user_agent(stealth));

        if !stealth {
            insert(&mut headers, ACCEPT, DECLARED_ACCEPT);
            return headers;
        }

        insert(&mut headers, ACCEPT, BROWSER_ACCEPT);
        insert(&mut headers, ACCEPT_LANGUAGE, "en-US,en;q=0.9");
        insert(&mut headers, DNT, "1");
        insert(&mut headers, UPGRADE_INSECURE_REQUESTS, "1");
        insert(&mut headers, CACHE_CONTROL, "max-age=0");
        for (name, value) in [
            ("sec-fetch-dest", "document"),
            ("sec-fetch-mode", "navigate"),
            ("sec-fetch-site", "none"),
            ("sec-fetch-user", "?1"),
        ] {
            insert(&mut headers, HeaderName::from_static(name), value);
        }

        if let Some(origin) = origin_referer(url) {
            insert(&mut headers, REFERER, &origin);
        }

        headers
    }
}

/// Minimal header set for the raw strategy
pub fn minimal_headers(user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(&mut headers, USER_AGENT, user_agent);
    headers
}

fn origin_referer(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}/", url.scheme(), host, port),
        None => format!("{}://{}/", url.scheme(), host),
    })
}

// Values come from config or constants; invalid ones are dropped rather than sent.
fn insert(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}
