//! MCP tool surface
//!
//! Four tools are exposed: single-page scraping, article extraction,
//! metadata extraction and site crawling.

pub mod dispatch;
pub mod server;
pub mod types;

pub use dispatch::{
    tool_specs, ToolDispatcher, ToolSpec, ARTICLE_TOOL, CRAWL_TOOL, METADATA_TOOL, SCRAPE_TOOL,
};
pub use server::{run_stdio, McpServer, PROTOCOL_VERSION, SERVER_NAME};
pub use types::{
    parse_target, ArticleArgs, ArticleResponse, CrawlArgs, MetadataArgs, MetadataResponse,
    MultiPageScrapeResponse, ScrapeArgs, ScrapeResponse,
};
