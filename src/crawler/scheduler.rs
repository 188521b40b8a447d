//! Frontier and pacing for a single crawl
//!
//! This module handles:
//! - The breadth-first frontier of (url, depth) entries
//! - The visited and queued sets, keyed by normalized URL
//! - The pause inserted between page fetches

use crate::config::CrawlerConfig;
use crate::url::normalize_url;
use rand::Rng;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use url::Url;

/// A URL waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUrl {
    /// The URL as discovered; requests go here
    pub url: Url,

    /// Link distance from the seed
    pub depth: usize,

    /// Normalized identity key
    pub key: String,
}

/// Breadth-first frontier with visited-set filtering
///
/// No URL is handed out twice and nothing deeper than `max_depth` is ever
/// queued.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<QueuedUrl>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    max_depth: usize,
}

/// Identity key for visited-set checks
pub fn url_key(url: &Url) -> String {
    normalize_url(url.as_str())
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}

impl Frontier {
    /// Creates a frontier holding only the seed at depth 0
    pub fn new(seed: Url, max_depth: usize) -> Self {
        let mut frontier = Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            max_depth,
        };
        frontier.push(seed, 0);
        frontier
    }

    /// Queues `url` at `depth`
    ///
    /// # Returns
    ///
    /// * `true` - The URL was added
    /// * `false` - Too deep, already visited, or already queued
    pub fn push(&mut self, url: Url, depth: usize) -> bool {
        if depth > self.max_depth {
            return false;
        }
        let key = url_key(&url);
        if self.visited.contains(&key) || self.queued.contains(&key) {
            return false;
        }
        self.queued.insert(key.clone());
        self.queue.push_back(QueuedUrl { url, depth, key });
        true
    }

    /// Takes the oldest unvisited entry and marks it visited
    ///
    /// Entries marked visited while waiting (redirect targets) are dropped.
    pub fn pop(&mut self) -> Option<QueuedUrl> {
        while let Some(next) = self.queue.pop_front() {
            self.queued.remove(&next.key);
            if self.visited.insert(next.key.clone()) {
                return Some(next);
            }
        }
        None
    }

    /// Marks an additional URL as visited (e.g. a redirect target)
    pub fn mark_visited(&mut self, url: &Url) {
        let key = url_key(url);
        self.visited.insert(key);
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(&url_key(url))
    }

    /// Returns true if links found at `depth` may still be followed
    pub fn can_descend(&self, depth: usize) -> bool {
        depth < self.max_depth
    }

    /// Number of URLs waiting
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of distinct URLs handed out or marked visited
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

/// Pause before the next fetch
///
/// Stealth crawls wait a uniformly random time between the configured
/// bounds; polite crawls wait the fixed minimum. A robots.txt crawl-delay
/// larger than the chosen pause takes precedence, up to
/// `crawler.max-robots-delay-ms`. Unrepresentable values are ignored.
///
/// # Arguments
///
/// * `config` - Crawler configuration holding the delay bounds
/// * `stealth` - Randomize the delay
/// * `robots_delay` - Crawl-delay in seconds from robots.txt, if any
pub fn effective_delay(config: &CrawlerConfig, stealth: bool, robots_delay: Option<f64>) -> Duration {
    let base_ms = if stealth && config.delay_max_ms > config.delay_min_ms {
        rand::thread_rng().gen_range(config.delay_min_ms..=config.delay_max_ms)
    } else {
        config.delay_min_ms
    };
    let base = Duration::from_millis(base_ms);

    let ceiling = Duration::from_millis(config.max_robots_delay_ms);
    let robots = robots_delay
        .filter(|s| *s > 0.0)
        .and_then(|s| Duration::try_from_secs_f64(s).ok())
        .map_or(Duration::ZERO, |d| d.min(ceiling));

    std::cmp::max(base, robots)
}
