//! Sumi-Scrape: web scraping tools for AI assistants
//!
//! This crate fetches web pages through an ordered chain of acquisition
//! strategies (headless browser, stealth HTTP, raw HTTP), decodes and parses
//! them with fallbacks, extracts structured content, and crawls sites
//! breadth-first. The pipeline is exposed as MCP tools over stdio.

pub mod config;
pub mod crawler;
pub mod document;
pub mod extract;
pub mod fetcher;
pub mod pipeline;
pub mod robots;
pub mod tool;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Scrape operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("URL disallowed by robots.txt: {url}")]
    RobotsDenied { url: String },

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: crawler::PageState,
        to: crawler::PageState,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Errors produced while acquiring a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timed out for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connection { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Blocked by {url} (HTTP {status})")]
    Blocked { url: String, status: u16 },

    #[error("Browser rendering failed for {url}: {message}")]
    Browser { url: String, message: String },

    #[error("Failed to create HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Domain is blocked by configuration: {domain}")]
    BlockedDomain { domain: String },

    #[error("Request failed for {url}: {message}")]
    Request { url: String, message: String },

    #[error("All fetch strategies failed for {url}: {}", .errors.join("; "))]
    AllStrategiesFailed { url: String, errors: Vec<String> },
}

/// Errors from the parser adapter's individual strategies
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Strict parse produced {count} errors (limit {limit})")]
    TooManyErrors { count: usize, limit: usize },

    #[error("Content has no element structure")]
    NoStructure,
}

/// Errors raised by extraction modes
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),

    #[error("No structured content available")]
    NoStructuredContent,

    #[error("Selector matched nothing: {selector}")]
    NoMatch { selector: String },
}

/// Errors raised while validating or dispatching a tool call
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Missing required parameter: url")]
    MissingUrl,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Parameter {field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Result type alias for Sumi-Scrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, CrawlOptions, CrawlReport, PageState};
pub use extract::{extract, ExtractedItem, ExtractionMode, ExtractionRequest};
pub use fetcher::{FetchConfig, FetchResult};
pub use crate::url::{extract_domain, normalize_url, registered_domain};
