//! Per-invocation robots.txt cache
//!
//! robots.txt is fetched at most once per origin for the lifetime of one
//! crawl. Nothing is kept across invocations.

use crate::robots::{fetch_robots, ParsedRobots};
use std::collections::HashMap;
use url::Url;

/// robots.txt rules keyed by origin (`scheme://host:port`)
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: HashMap<String, ParsedRobots>,
}

impl RobotsCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the rules governing `url`, fetching them on first use
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for the robots.txt request
    /// * `url` - Page URL whose origin is looked up
    /// * `user_agent` - User agent sent with the robots.txt request
    pub async fn rules_for(
        &mut self,
        client: &reqwest::Client,
        url: &Url,
        user_agent: &str,
    ) -> &ParsedRobots {
        let key = origin_key(url);
        if !self.entries.contains_key(&key) {
            let rules = fetch_robots(client, url, user_agent).await;
            self.entries.insert(key.clone(), rules);
        }
        self.entries.entry(key).or_default()
    }

    /// Stores rules for an origin directly
    pub fn insert(&mut self, url: &Url, rules: ParsedRobots) {
        self.entries.insert(origin_key(url), rules);
    }

    /// Returns cached rules for an origin without fetching
    pub fn get(&self, url: &Url) -> Option<&ParsedRobots> {
        self.entries.get(&origin_key(url))
    }

    /// Number of origins cached
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn origin_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}
