//! Single-page pipeline: fetch, decode, parse, extract
//!
//! Fetching is the only asynchronous step. Everything after it runs
//! synchronously in [`process`], so the parsed tree is dropped before the
//! caller awaits anything else.

use crate::config::Config;
use crate::document::{decode_response, Document, EncodingSource};
use crate::extract::{
    discover_links, extract, extract_metadata, page_summary, resolve_metadata,
    technical_from_headers, text_len, word_count, Extraction, ExtractionMode, ExtractionRequest,
    ResolvedMetadata,
};
use crate::fetcher::{FetchChain, FetchConfig, FetchResult, Strategy};
use crate::FetchError;
use serde::Serialize;
use tracing::debug;
use url::Url;

/// How a page was acquired and read
#[derive(Debug, Clone, Serialize)]
pub struct FetchSummary {
    pub url: String,
    pub final_url: String,
    pub status_code: u16,
    pub strategy: Strategy,
    pub attempts: u32,
    pub elapsed_ms: u64,
    pub encoding: &'static str,
    pub encoding_source: EncodingSource,
    /// "strict", "lenient" or "flat"
    pub parser: &'static str,
}

/// Everything kept from one processed page
///
/// Holds no parsed tree, so it can cross await points.
#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub fetch: FetchSummary,
    pub title: Option<String>,
    pub metadata: ResolvedMetadata,
    pub extraction: Extraction,
    /// Leading visible text
    pub summary: String,
    pub word_count: usize,
    /// Outbound links in document order
    pub links: Vec<Url>,
}

/// Characters of visible text in a fetched page
///
/// Used to tell thin results (e.g. a JavaScript shell) from real content.
pub fn content_score(result: &FetchResult, max_strict_errors: usize) -> usize {
    let decoded = decode_response(result);
    let document = Document::parse(&decoded.text, max_strict_errors);
    text_len(&document)
}

/// Fetches one page for a single-page tool
///
/// Results thinner than `extractor.min-content-chars` let later strategies
/// run; the richest result wins.
pub async fn fetch_page(
    chain: &FetchChain,
    url: &Url,
    fetch_config: &FetchConfig,
    config: &Config,
) -> Result<FetchResult, FetchError> {
    let max_errors = config.parser.max_strict_errors;
    chain
        .fetch_best(
            url,
            fetch_config,
            config.extractor.min_content_chars,
            move |result| content_score(result, max_errors),
        )
        .await
}

/// Decodes, parses and extracts a fetched page
///
/// # Arguments
///
/// * `result` - The fetched response
/// * `request` - Extraction mode, selector and limits
/// * `config` - Parser and extractor tuning
pub fn process(result: &FetchResult, request: &ExtractionRequest, config: &Config) -> PageOutcome {
    let decoded = decode_response(result);
    if decoded.had_replacements {
        debug!(
            "{} decoded as {} with replacement characters",
            result.final_url, decoded.encoding
        );
    }

    let document = Document::parse(&decoded.text, config.parser.max_strict_errors);
    let base = result.base_url().unwrap_or_else(|| request.url.clone());

    let mut extraction = extract(&document, request, &base);
    if request.include_technical
        && matches!(request.mode, ExtractionMode::Metadata | ExtractionMode::All)
    {
        extraction.items.extend(technical_from_headers(&result.headers));
    }

    let metadata = document
        .html()
        .map(|html| resolve_metadata(&extract_metadata(html, &base, false)))
        .unwrap_or_default();
    let links = document
        .html()
        .map(|html| discover_links(html, &base))
        .unwrap_or_default();
    let summary = page_summary(&document, config.extractor.summary_chars);
    let word_count = word_count(&document);

    PageOutcome {
        fetch: FetchSummary {
            url: result.url.clone(),
            final_url: result.final_url.clone(),
            status_code: result.status_code,
            strategy: result.strategy,
            attempts: result.attempts,
            elapsed_ms: result.elapsed_ms(),
            encoding: decoded.encoding,
            encoding_source: decoded.source,
            parser: document.strategy_name(),
        },
        title: metadata.title.clone().or_else(|| document.title()),
        metadata,
        extraction,
        summary,
        word_count,
        links,
    }
}
