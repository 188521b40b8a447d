//! Maps tool names and arguments onto the scraping pipeline

use crate::config::Config;
use crate::crawler::{crawl, CrawlOptions, CrawlReport};
use crate::extract::{ExtractionMode, ExtractionRequest};
use crate::fetcher::{FetchChain, FetchConfig};
use crate::pipeline::{fetch_page, process};
use crate::tool::types::{
    parse_target, ArticleArgs, ArticleResponse, CrawlArgs, MetadataArgs, MetadataResponse,
    MultiPageScrapeResponse, ScrapeArgs, ScrapeResponse,
};
use crate::{ScrapeError, ToolError};
use chrono::Utc;
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

pub const SCRAPE_TOOL: &str = "scrape_website_enhanced";
pub const ARTICLE_TOOL: &str = "extract_article_content";
pub const METADATA_TOOL: &str = "extract_comprehensive_metadata";
pub const CRAWL_TOOL: &str = "crawl_website_enhanced";

/// Name, description and input schema of one tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

fn describe<T: JsonSchema>(name: &'static str, description: &'static str) -> ToolSpec {
    ToolSpec {
        name,
        description,
        input_schema: serde_json::to_value(schema_for!(T)).unwrap_or_default(),
    }
}

/// Every tool the server exposes
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        describe::<ScrapeArgs>(
            SCRAPE_TOOL,
            "Scrape a web page (optionally following links) and extract text, links, images, metadata, tables or the main article",
        ),
        describe::<ArticleArgs>(
            ARTICLE_TOOL,
            "Extract the main article content of a page with title, author, word count and read time",
        ),
        describe::<MetadataArgs>(
            METADATA_TOOL,
            "Extract page metadata: meta tags, Open Graph, Twitter cards, Schema.org JSON-LD and technical details",
        ),
        describe::<CrawlArgs>(
            CRAWL_TOOL,
            "Crawl a website breadth-first and summarize each page visited",
        ),
    ]
}

/// Executes tool calls against a configuration
///
/// Each call builds its own fetch chain, so cookies and browser sessions
/// never outlive the invocation that created them.
pub struct ToolDispatcher {
    config: Config,
}

impl ToolDispatcher {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the named tool
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - The tool's JSON result
    /// * `Err(ScrapeError::Tool)` - Unknown tool or invalid arguments
    /// * `Err(ScrapeError)` - Any other failure, e.g. every fetch strategy failed
    pub async fn call(&self, name: &str, arguments: Value) -> Result<Value, ScrapeError> {
        info!("Tool call: {}", name);
        match name {
            SCRAPE_TOOL => to_json(self.scrape(parse_args(arguments)?).await?),
            ARTICLE_TOOL => to_json(self.article(parse_args(arguments)?).await?),
            METADATA_TOOL => to_json(self.metadata(parse_args(arguments)?).await?),
            CRAWL_TOOL => to_json(self.crawl(parse_args(arguments)?).await?),
            other => Err(ToolError::UnknownTool(other.to_string()).into()),
        }
    }

    /// `scrape_website_enhanced`
    pub async fn scrape(&self, args: ScrapeArgs) -> Result<Value, ScrapeError> {
        let params = args.validate(&self.config)?;
        let chain = FetchChain::from_config(&self.config)?;

        if params.crawl_depth > 0 {
            let options = CrawlOptions {
                max_pages: params.max_pages,
                max_depth: params.crawl_depth,
                same_domain_only: true,
                stealth: params.stealth,
                use_javascript: params.use_javascript,
                mode: Some(params.mode),
                selector: params.selector.clone(),
                max_results: Some(params.max_results),
            };
            let report = crawl(&chain, &self.config, params.url.clone(), &options).await?;
            return to_json(MultiPageScrapeResponse {
                url: params.url.to_string(),
                extract_type: params.mode,
                report,
            });
        }

        let fetch_config =
            FetchConfig::from_config(&self.config, params.stealth, params.use_javascript);
        let result = fetch_page(&chain, &params.url, &fetch_config, &self.config).await?;

        let mut request = ExtractionRequest::new(params.url.clone(), params.mode)
            .with_config(&self.config.extractor)
            .with_selector(params.selector.clone())
            .with_max_results(params.max_results);
        request.behavior.stealth = params.stealth;
        request.behavior.use_dynamic_rendering = params.use_javascript;
        let outcome = process(&result, &request, &self.config);

        to_json(ScrapeResponse {
            url: params.url.to_string(),
            title: outcome.title,
            extract_type: params.mode,
            total_items: outcome.extraction.items.len(),
            items: outcome.extraction.items,
            notes: outcome.extraction.notes,
            fetch: outcome.fetch,
            timestamp: Utc::now(),
        })
    }

    /// `extract_article_content`
    pub async fn article(&self, args: ArticleArgs) -> Result<ArticleResponse, ScrapeError> {
        let url = parse_target(&args.url)?;
        let use_javascript = args.use_javascript.unwrap_or(true);
        let chain = FetchChain::from_config(&self.config)?;
        let fetch_config = FetchConfig::from_config(&self.config, true, use_javascript);
        let result = fetch_page(&chain, &url, &fetch_config, &self.config).await?;

        let request = ExtractionRequest::new(url.clone(), ExtractionMode::Article)
            .with_config(&self.config.extractor);
        let outcome = process(&result, &request, &self.config);

        Ok(ArticleResponse {
            url: url.to_string(),
            article: outcome.extraction.items.into_iter().next(),
            metadata: outcome.metadata,
            notes: outcome.extraction.notes,
            fetch: outcome.fetch,
            timestamp: Utc::now(),
        })
    }

    /// `extract_comprehensive_metadata`
    pub async fn metadata(&self, args: MetadataArgs) -> Result<MetadataResponse, ScrapeError> {
        let url = parse_target(&args.url)?;
        let chain = FetchChain::from_config(&self.config)?;
        let fetch_config = FetchConfig::from_config(&self.config, true, false);
        let result = fetch_page(&chain, &url, &fetch_config, &self.config).await?;

        let mut request = ExtractionRequest::new(url.clone(), ExtractionMode::Metadata)
            .with_config(&self.config.extractor);
        request.include_technical = args.include_technical.unwrap_or(true);
        let outcome = process(&result, &request, &self.config);

        Ok(MetadataResponse {
            url: url.to_string(),
            resolved: outcome.metadata,
            total_records: outcome.extraction.items.len(),
            records: outcome.extraction.items,
            notes: outcome.extraction.notes,
            fetch: outcome.fetch,
            timestamp: Utc::now(),
        })
    }

    /// `crawl_website_enhanced`
    pub async fn crawl(&self, args: CrawlArgs) -> Result<CrawlReport, ScrapeError> {
        let params = args.validate()?;
        let chain = FetchChain::from_config(&self.config)?;
        let options = CrawlOptions {
            max_pages: params.max_pages,
            max_depth: params.max_depth,
            same_domain_only: params.same_domain_only,
            ..Default::default()
        }
        .with_focus(params.focus);

        crawl(&chain, &self.config, params.url, &options).await
    }
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() {
        Value::Object(Default::default())
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

fn to_json<T: Serialize>(value: T) -> Result<Value, ScrapeError> {
    Ok(serde_json::to_value(value)?)
}
