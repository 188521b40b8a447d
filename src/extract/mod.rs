//! Structured extraction from parsed pages
//!
//! [`extract`] runs one [`ExtractionMode`] over a [`Document`] and returns the
//! items found plus notes about anything that was skipped. Extraction never
//! fails outright: a bad selector, a flat-text page or an empty match all
//! produce notes and an empty (or partial) item list.

mod article;
mod clean;
mod images;
mod links;
mod metadata;
mod table;
mod text;

pub use article::{extract_article, read_time_minutes, PARAGRAPH_CLUSTER};
pub use clean::{clean_text, TextBlock};
pub use images::extract_images;
pub use links::{document_base, extract_links};
pub use metadata::{extract_metadata, resolve_metadata, technical_from_headers, ResolvedMetadata};
pub use table::extract_tables;
pub use text::{extract_text, page_summary, text_len, word_count};

pub(crate) use links::discover_links;

use crate::config::ExtractorConfig;
use crate::document::Document;
use crate::ExtractionError;
use schemars::JsonSchema;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// What to pull out of a page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Visible text blocks
    #[default]
    Text,
    /// Anchors resolved to absolute URLs
    Links,
    /// Images with absolute sources
    Images,
    /// Meta tags, Open Graph, Twitter cards, JSON-LD
    Metadata,
    /// Table rows
    Table,
    /// Main article body
    Article,
    /// Text, links, images and metadata together
    All,
}

impl ExtractionMode {
    /// Modes that need an element tree to produce anything
    pub fn requires_structure(&self) -> bool {
        !matches!(self, Self::Text)
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Links => "links",
            Self::Images => "images",
            Self::Metadata => "metadata",
            Self::Table => "table",
            Self::Article => "article",
            Self::All => "all",
        };
        write!(f, "{}", name)
    }
}

/// Caps applied to an extraction or crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Items per extraction mode
    pub max_results: usize,
    /// Pages visited by a crawl
    pub max_pages: usize,
    /// Link depth followed from the seed
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_results: ExtractorConfig::default().max_results,
            max_pages: 1,
            max_depth: 0,
        }
    }
}

/// Caller-chosen fetch and scope behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Behavior {
    pub use_dynamic_rendering: bool,
    pub stealth: bool,
    /// Only follow links within the seed's registered domain
    pub respect_domain_scope: bool,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            use_dynamic_rendering: false,
            stealth: true,
            respect_domain_scope: true,
        }
    }
}

/// A validated extraction request
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub url: Url,
    pub mode: ExtractionMode,
    /// CSS selector narrowing the extraction scope
    pub selector: Option<String>,
    pub limits: Limits,
    pub behavior: Behavior,
    /// Add the technical metadata namespace
    pub include_technical: bool,
    /// Text blocks shorter than this many characters are dropped
    pub min_text_length: usize,
}

impl ExtractionRequest {
    pub fn new(url: Url, mode: ExtractionMode) -> Self {
        let defaults = ExtractorConfig::default();
        Self {
            url,
            mode,
            selector: None,
            limits: Limits::default(),
            behavior: Behavior::default(),
            include_technical: true,
            min_text_length: defaults.min_text_length,
        }
    }

    /// Applies configured extraction tuning
    pub fn with_config(mut self, config: &ExtractorConfig) -> Self {
        self.limits.max_results = config.max_results;
        self.min_text_length = config.min_text_length;
        self
    }

    pub fn with_selector(mut self, selector: Option<String>) -> Self {
        self.selector = selector.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.limits.max_results = max_results;
        self
    }
}

/// Metadata grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataNamespace {
    Basic,
    Opengraph,
    Twitter,
    SchemaOrg,
    Technical,
}

/// One extracted value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtractedItem {
    TextBlock {
        content: String,
        source_selector: String,
    },
    Link {
        href: String,
        text: String,
        is_external: bool,
    },
    Image {
        src: String,
        alt: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
    },
    MetadataRecord {
        key: String,
        value: serde_json::Value,
        namespace: MetadataNamespace,
    },
    TableRow {
        table_index: usize,
        cells: Vec<String>,
    },
    Article {
        title: Option<String>,
        content: String,
        word_count: usize,
        read_time_minutes: usize,
        /// Descriptor of the chosen container, or "paragraph-cluster"
        container: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        author: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        published: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

/// Items found on one page, plus notes on what was skipped
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
    pub items: Vec<ExtractedItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Extraction {
    fn absorb(&mut self, mode: ExtractionMode, result: Result<Vec<ExtractedItem>, ExtractionError>) {
        match result {
            Ok(items) => self.items.extend(items),
            Err(e) => self.notes.push(format!("{}: {}", mode, e)),
        }
    }
}

/// Runs the requested extraction mode over a parsed page
///
/// # Arguments
///
/// * `document` - Parsed page (tree or flat text)
/// * `request` - Mode, selector and limits
/// * `base_url` - Final page URL, used to resolve relative references
pub fn extract(document: &Document, request: &ExtractionRequest, base_url: &Url) -> Extraction {
    let mut out = Extraction::default();

    let html = match document {
        Document::Tree { html, .. } => html,
        Document::Flat(text) => {
            if matches!(request.mode, ExtractionMode::Text | ExtractionMode::All) {
                out.items.extend(text::flat_text(text, request));
            }
            if request.mode.requires_structure() {
                out.notes.push(format!(
                    "{}: {}",
                    request.mode,
                    ExtractionError::NoStructuredContent
                ));
            }
            return out;
        }
    };

    match request.mode {
        ExtractionMode::Text => out.absorb(request.mode, extract_text(html, request)),
        ExtractionMode::Links => out.absorb(request.mode, extract_links(html, request, base_url)),
        ExtractionMode::Images => out.absorb(request.mode, extract_images(html, request, base_url)),
        ExtractionMode::Metadata => {
            out.items.extend(extract_metadata(html, base_url, request.include_technical))
        }
        ExtractionMode::Table => out.absorb(request.mode, extract_tables(html, request)),
        ExtractionMode::Article => {
            let resolved = resolve_metadata(&extract_metadata(html, base_url, false));
            out.absorb(request.mode, extract_article(html, request, &resolved))
        }
        ExtractionMode::All => {
            out.absorb(ExtractionMode::Text, extract_text(html, request));
            out.absorb(ExtractionMode::Links, extract_links(html, request, base_url));
            out.absorb(ExtractionMode::Images, extract_images(html, request, base_url));
            out.items
                .extend(extract_metadata(html, base_url, request.include_technical));
        }
    }

    out
}

/// Elements the request's selector matches, or `default` when there is none
///
/// With no selector and no element matching `default`, the document root is
/// used.
pub(crate) fn scope<'a>(
    html: &'a Html,
    selector: Option<&str>,
    default: Option<&str>,
) -> Result<Vec<ElementRef<'a>>, ExtractionError> {
    match selector {
        Some(css) => {
            let parsed = Selector::parse(css)
                .map_err(|e| ExtractionError::InvalidSelector(format!("{}: {}", css, e)))?;
            let matched: Vec<ElementRef<'a>> = html.select(&parsed).collect();
            if matched.is_empty() {
                return Err(ExtractionError::NoMatch {
                    selector: css.to_string(),
                });
            }
            Ok(matched)
        }
        None => {
            let found = default
                .and_then(|css| Selector::parse(css).ok())
                .and_then(|sel| html.select(&sel).next());
            Ok(vec![found.unwrap_or_else(|| html.root_element())])
        }
    }
}

/// Checks that a CSS selector parses
pub fn validate_selector(css: &str) -> Result<(), ExtractionError> {
    Selector::parse(css)
        .map(|_| ())
        .map_err(|e| ExtractionError::InvalidSelector(format!("{}: {}", css, e)))
}
