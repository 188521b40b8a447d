//! Configuration module for Sumi-Scrape
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; absent keys fall back to their defaults.
//!
//! # Example
//!
//! ```no_run
//! use sumi_scrape::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sumi-scrape.toml")).unwrap();
//! println!("Fetch timeout: {}ms", config.fetcher.timeout_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, CrawlerConfig, ExtractorConfig, FetcherConfig, IdentityConfig,
    ParserConfig, RetryConfig, RobotsPolicy,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
