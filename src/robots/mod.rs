//! Robots.txt handling module
//!
//! This module fetches, parses, and caches robots.txt files. Whether the rules
//! are ignored, logged, or enforced is decided by the crawler's
//! [`RobotsPolicy`](crate::config::RobotsPolicy).

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::ParsedRobots;

use tracing::{debug, warn};
use url::Url;

/// Fetches robots.txt for the origin of `url`
///
/// Never fails: a missing file (4xx) allows everything, and so does any
/// transport error or server error, which is logged.
///
/// # Arguments
///
/// * `client` - HTTP client to issue the request with
/// * `url` - Any URL on the target origin
/// * `user_agent` - The user agent string to send
pub async fn fetch_robots(client: &reqwest::Client, url: &Url, user_agent: &str) -> ParsedRobots {
    let robots_url = match url.join("/robots.txt") {
        Ok(u) => u,
        Err(_) => return ParsedRobots::allow_all(),
    };

    let response = match client
        .get(robots_url.clone())
        .header(reqwest::header::USER_AGENT, user_agent)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            warn!("Failed to fetch {}: {}", robots_url, e);
            return ParsedRobots::allow_all();
        }
    };

    let status = response.status();
    if status.is_success() {
        match response.text().await {
            Ok(body) => {
                debug!("Loaded {} ({} bytes)", robots_url, body.len());
                ParsedRobots::from_content(&body)
            }
            Err(e) => {
                warn!("Failed to read {}: {}", robots_url, e);
                ParsedRobots::allow_all()
            }
        }
    } else {
        if status.is_server_error() {
            warn!("{} returned HTTP {}; treating as allow-all", robots_url, status);
        } else {
            debug!("No robots.txt at {} (HTTP {})", robots_url, status);
        }
        ParsedRobots::allow_all()
    }
}

/// Checks if a URL is allowed by robots.txt
pub fn is_allowed(robots: &ParsedRobots, url: &Url, user_agent: &str) -> bool {
    robots.is_allowed(url.as_str(), user_agent)
}
