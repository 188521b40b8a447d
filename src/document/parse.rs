//! Parser adapter
//!
//! Tries a strict full-document parse first, then a lenient fragment parse.
//! When neither yields element structure the content is kept as flat text.

use crate::ParseError;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::debug;

/// Parse strategy that produced a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseStrategy {
    Strict,
    Lenient,
}

/// A parsed page
#[derive(Debug, Clone)]
pub enum Document {
    /// Element tree and the strategy that built it
    Tree { html: Html, strategy: ParseStrategy },
    /// Unstructured content, whitespace-collapsed
    Flat(String),
}

impl Document {
    /// Parses text with fallback: strict, then lenient, then flat text
    ///
    /// # Arguments
    ///
    /// * `text` - Decoded page content
    /// * `max_strict_errors` - Recoverable errors the strict parse may report
    pub fn parse(text: &str, max_strict_errors: usize) -> Self {
        match parse_strict(text, max_strict_errors) {
            Ok(html) => {
                return Self::Tree {
                    html,
                    strategy: ParseStrategy::Strict,
                }
            }
            Err(e) => debug!("Strict parse rejected: {}", e),
        }

        match parse_lenient(text) {
            Ok(html) => Self::Tree {
                html,
                strategy: ParseStrategy::Lenient,
            },
            Err(e) => {
                debug!("Lenient parse rejected: {}; keeping flat text", e);
                Self::Flat(collapse_whitespace(text))
            }
        }
    }

    /// The element tree, if there is one
    pub fn html(&self) -> Option<&Html> {
        match self {
            Self::Tree { html, .. } => Some(html),
            Self::Flat(_) => None,
        }
    }

    /// Strategy label for reporting ("strict", "lenient" or "flat")
    pub fn strategy_name(&self) -> &'static str {
        match self {
            Self::Tree {
                strategy: ParseStrategy::Strict,
                ..
            } => "strict",
            Self::Tree {
                strategy: ParseStrategy::Lenient,
                ..
            } => "lenient",
            Self::Flat(_) => "flat",
        }
    }

    /// Text of the first non-empty `<title>`
    pub fn title(&self) -> Option<String> {
        let html = self.html()?;
        let selector = Selector::parse("title").ok()?;
        html.select(&selector)
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .find(|t| !t.is_empty())
    }
}

/// Full-document parse with an error budget
pub fn parse_strict(text: &str, max_errors: usize) -> Result<Html, ParseError> {
    let html = Html::parse_document(text);
    if html.errors.len() > max_errors {
        return Err(ParseError::TooManyErrors {
            count: html.errors.len(),
            limit: max_errors,
        });
    }
    if !has_content_elements(&html) {
        return Err(ParseError::NoStructure);
    }
    Ok(html)
}

/// Fragment parse with no error budget
pub fn parse_lenient(text: &str) -> Result<Html, ParseError> {
    let html = Html::parse_fragment(text);
    if !has_content_elements(&html) {
        return Err(ParseError::NoStructure);
    }
    Ok(html)
}

/// True if the tree has any element beyond the implied html/head/body shell
fn has_content_elements(html: &Html) -> bool {
    html.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .any(|el| !matches!(el.value().name(), "html" | "head" | "body"))
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
