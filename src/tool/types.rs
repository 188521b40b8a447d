//! Tool arguments, validation and responses

use crate::config::Config;
use crate::crawler::{ContentFocus, CrawlReport};
use crate::extract::{validate_selector, ExtractedItem, ExtractionMode, ResolvedMetadata};
use crate::pipeline::FetchSummary;
use crate::ToolError;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

/// Arguments of `scrape_website_enhanced`
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ScrapeArgs {
    /// The URL to scrape (http:// or https://)
    pub url: String,

    /// Type of data to extract (default text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract_type: Option<ExtractionMode>,

    /// CSS selector narrowing the extraction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,

    /// Maximum items per page (1-500)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i64>,

    /// Render the page in a headless browser first (default false)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_javascript: Option<bool>,

    /// Rotate browser identities and headers (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stealth_mode: Option<bool>,

    /// Maximum pages visited when crawl_depth > 0 (1-20, default 5)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<i64>,

    /// Link depth to follow: 0 = this page only (0-2, default 0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crawl_depth: Option<i64>,
}

/// Arguments of `extract_article_content`
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ArticleArgs {
    /// The URL to extract article content from
    pub url: String,

    /// Render the page in a headless browser first (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_javascript: Option<bool>,
}

/// Arguments of `extract_comprehensive_metadata`
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct MetadataArgs {
    /// The URL to extract metadata from
    pub url: String,

    /// Include technical metadata: server headers and document statistics (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_technical: Option<bool>,
}

/// Arguments of `crawl_website_enhanced`
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CrawlArgs {
    /// The starting URL to crawl
    pub url: String,

    /// Maximum number of pages to crawl (1-30, default 10)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<i64>,

    /// Maximum crawling depth (1-3, default 2)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<i64>,

    /// Focus crawling on specific content types (default general)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_focus: Option<ContentFocus>,

    /// Only follow links within the starting site's domain (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_domain_only: Option<bool>,
}

/// Validated `scrape_website_enhanced` parameters
#[derive(Debug, Clone)]
pub struct ScrapeParams {
    pub url: Url,
    pub mode: ExtractionMode,
    pub selector: Option<String>,
    pub max_results: usize,
    pub use_javascript: bool,
    pub stealth: bool,
    pub max_pages: usize,
    pub crawl_depth: usize,
}

/// Validated `crawl_website_enhanced` parameters
#[derive(Debug, Clone)]
pub struct CrawlParams {
    pub url: Url,
    pub max_pages: usize,
    pub max_depth: usize,
    pub focus: ContentFocus,
    pub same_domain_only: bool,
}

/// Parses the target URL, accepting only http and https
pub fn parse_target(raw: &str) -> Result<Url, ToolError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ToolError::MissingUrl);
    }
    let url = Url::parse(raw).map_err(|e| ToolError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        "http" | "https" => Err(ToolError::InvalidUrl(format!("{}: missing host", raw))),
        scheme => Err(ToolError::InvalidUrl(format!(
            "{}: scheme must be http or https, got {}",
            raw, scheme
        ))),
    }
}

/// Returns `value` (or `default`) after checking it lies within `min..=max`
fn bounded(
    field: &'static str,
    value: Option<i64>,
    default: i64,
    min: i64,
    max: i64,
) -> Result<usize, ToolError> {
    let value = value.unwrap_or(default);
    if !(min..=max).contains(&value) {
        return Err(ToolError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(value as usize)
}

impl ScrapeArgs {
    pub fn validate(self, config: &Config) -> Result<ScrapeParams, ToolError> {
        let url = parse_target(&self.url)?;
        let selector = self.selector.filter(|s| !s.trim().is_empty());
        if let Some(css) = &selector {
            validate_selector(css).map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        }

        Ok(ScrapeParams {
            url,
            mode: self.extract_type.unwrap_or_default(),
            selector,
            max_results: bounded(
                "max_results",
                self.max_results,
                config.extractor.max_results as i64,
                1,
                500,
            )?,
            use_javascript: self.use_javascript.unwrap_or(false),
            stealth: self.stealth_mode.unwrap_or(true),
            max_pages: bounded("max_pages", self.max_pages, 5, 1, 20)?,
            crawl_depth: bounded("crawl_depth", self.crawl_depth, 0, 0, 2)?,
        })
    }
}

impl CrawlArgs {
    pub fn validate(self) -> Result<CrawlParams, ToolError> {
        Ok(CrawlParams {
            url: parse_target(&self.url)?,
            max_pages: bounded("max_pages", self.max_pages, 10, 1, 30)?,
            max_depth: bounded("max_depth", self.max_depth, 2, 1, 3)?,
            focus: self.content_focus.unwrap_or_default(),
            same_domain_only: self.same_domain_only.unwrap_or(true),
        })
    }
}

/// Result of a single-page scrape
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeResponse {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub extract_type: ExtractionMode,
    pub total_items: usize,
    pub items: Vec<ExtractedItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    pub fetch: FetchSummary,
    pub timestamp: DateTime<Utc>,
}

/// Result of a scrape that followed links (crawl_depth > 0)
#[derive(Debug, Clone, Serialize)]
pub struct MultiPageScrapeResponse {
    pub url: String,
    pub extract_type: ExtractionMode,
    #[serde(flatten)]
    pub report: CrawlReport,
}

/// Result of `extract_article_content`
#[derive(Debug, Clone, Serialize)]
pub struct ArticleResponse {
    pub url: String,
    /// `None` when no article body was found
    pub article: Option<ExtractedItem>,
    pub metadata: ResolvedMetadata,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    pub fetch: FetchSummary,
    pub timestamp: DateTime<Utc>,
}

/// Result of `extract_comprehensive_metadata`
#[derive(Debug, Clone, Serialize)]
pub struct MetadataResponse {
    pub url: String,
    pub resolved: ResolvedMetadata,
    pub total_records: usize,
    pub records: Vec<ExtractedItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    pub fetch: FetchSummary,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scrape_args(value: serde_json::Value) -> ScrapeArgs {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_scrape_defaults() {
        let params = scrape_args(json!({"url": "https://example.com"}))
            .validate(&Config::default())
            .unwrap();

        assert_eq!(params.mode, ExtractionMode::Text);
        assert_eq!(params.max_results, 50);
        assert_eq!(params.max_pages, 5);
        assert_eq!(params.crawl_depth, 0);
        assert!(params.stealth);
        assert!(!params.use_javascript);
    }

    #[test]
    fn test_scrape_ranges() {
        let err = scrape_args(json!({"url": "https://example.com", "max_pages": 21}))
            .validate(&Config::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ToolError::OutOfRange {
                field: "max_pages",
                value: 21,
                ..
            }
        ));

        let err = scrape_args(json!({"url": "https://example.com", "crawl_depth": -1}))
            .validate(&Config::default())
            .unwrap_err();
        assert!(matches!(err, ToolError::OutOfRange { field: "crawl_depth", .. }));
    }

    #[test]
    fn test_scrape_bad_selector() {
        let err = scrape_args(json!({"url": "https://example.com", "selector": "div[["}))
            .validate(&Config::default())
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn test_unknown_extract_type_rejected() {
        let parsed: Result<ScrapeArgs, _> =
            serde_json::from_value(json!({"url": "https://example.com", "extract_type": "pdf"}));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_crawl_defaults_and_ranges() {
        let params: CrawlArgs = serde_json::from_value(json!({"url": "http://example.com/"})).unwrap();
        let params = params.validate().unwrap();
        assert_eq!(params.max_pages, 10);
        assert_eq!(params.max_depth, 2);
        assert_eq!(params.focus, ContentFocus::General);
        assert!(params.same_domain_only);

        let zero_depth: CrawlArgs =
            serde_json::from_value(json!({"url": "http://example.com/", "max_depth": 0})).unwrap();
        assert!(matches!(
            zero_depth.validate(),
            Err(ToolError::OutOfRange { field: "max_depth", .. })
        ));
    }

    #[test]
    fn test_parse_target() {
        assert!(parse_target("https://example.com/a").is_ok());
        assert!(matches!(parse_target("  "), Err(ToolError::MissingUrl)));
        assert!(matches!(parse_target("example.com"), Err(ToolError::InvalidUrl(_))));
        assert!(matches!(parse_target("ftp://example.com"), Err(ToolError::InvalidUrl(_))));
        assert!(matches!(parse_target("file:///etc/passwd"), Err(ToolError::InvalidUrl(_))));
    }

    #[test]
    fn test_schema_lists_extract_types() {
        let schema = serde_json::to_value(schemars::schema_for!(ScrapeArgs)).unwrap();
        let text = schema.to_string();
        assert!(text.contains("\"article\""));
        assert_eq!(schema["required"], json!(["url"]));
    }
}
