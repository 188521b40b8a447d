//! Text mode

use super::clean::{element_text, is_boilerplate, text_blocks};
use super::{scope, ExtractedItem, ExtractionRequest};
use crate::document::Document;
use crate::ExtractionError;
use scraper::Html;
use std::collections::HashSet;

/// Visible text blocks under the request's selector (default `body`)
pub fn extract_text(
    html: &Html,
    request: &ExtractionRequest,
) -> Result<Vec<ExtractedItem>, ExtractionError> {
    let roots = scope(html, request.selector.as_deref(), Some("body"))?;

    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for root in roots {
        for block in text_blocks(root) {
            if items.len() >= request.limits.max_results {
                return Ok(items);
            }
            if block.text.chars().count() < request.min_text_length || is_boilerplate(&block.text) {
                continue;
            }
            if !seen.insert(block.text.clone()) {
                continue;
            }
            items.push(ExtractedItem::TextBlock {
                content: block.text,
                source_selector: block.source,
            });
        }
    }
    Ok(items)
}

/// Text mode over a page with no element structure
pub(crate) fn flat_text(text: &str, request: &ExtractionRequest) -> Vec<ExtractedItem> {
    let content = super::clean_text(text);
    if content.chars().count() < request.min_text_length || request.limits.max_results == 0 {
        return Vec::new();
    }
    vec![ExtractedItem::TextBlock {
        content,
        source_selector: "flat".to_string(),
    }]
}

/// Visible text of the whole page as one string
fn page_text(document: &Document) -> String {
    match document {
        Document::Flat(text) => text.clone(),
        Document::Tree { html, .. } => match scope(html, None, Some("body")) {
            Ok(roots) => roots
                .into_iter()
                .map(element_text)
                .collect::<Vec<_>>()
                .join(" "),
            Err(_) => String::new(),
        },
    }
}

/// Character count of the page's visible text
pub fn text_len(document: &Document) -> usize {
    page_text(document).chars().count()
}

/// Words of visible text on the page
pub fn word_count(document: &Document) -> usize {
    page_text(document).split_whitespace().count()
}

/// First `max_chars` characters of visible text, cut at a word boundary
pub fn page_summary(document: &Document, max_chars: usize) -> String {
    let text = page_text(document);
    if text.chars().count() <= max_chars {
        return text;
    }
    let cut: String = text.chars().take(max_chars).collect();
    let trimmed = match cut.rfind(' ') {
        Some(pos) if pos > 0 => &cut[..pos],
        _ => cut.as_str(),
    };
    format!("{}...", trimmed.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractionMode;
    use url::Url;

    fn request() -> ExtractionRequest {
        ExtractionRequest::new(
            Url::parse("https://example.com/").unwrap(),
            ExtractionMode::Text,
        )
    }

    fn texts(items: &[ExtractedItem]) -> Vec<String> {
        items
            .iter()
            .filter_map(|i| match i {
                ExtractedItem::TextBlock { content, .. } => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_short_and_duplicate_blocks_dropped() {
        let html = Html::parse_document(
            "<body><p>Tiny</p><p>Long enough paragraph text.</p><p>Long enough paragraph text.</p></body>",
        );
        let items = extract_text(&html, &request()).unwrap();
        assert_eq!(texts(&items), vec!["Long enough paragraph text."]);
    }

    #[test]
    fn test_boilerplate_dropped() {
        let html = Html::parse_document(
            "<body><a>Skip to main content</a><p>The actual article begins here.</p></body>",
        );
        let items = extract_text(&html, &request()).unwrap();
        assert_eq!(texts(&items), vec!["The actual article begins here."]);
    }

    #[test]
    fn test_selector_scopes_blocks() {
        let html = Html::parse_document(
            "<body><div class='nav'>Navigation links section</div><div class='main'><p>Main content paragraph.</p></div></body>",
        );
        let req = request().with_selector(Some(".main".to_string()));
        let items = extract_text(&html, &req).unwrap();
        assert_eq!(texts(&items), vec!["Main content paragraph."]);
    }

    #[test]
    fn test_max_results_truncates() {
        let html = Html::parse_document(
            "<body><p>First paragraph here.</p><p>Second paragraph here.</p><p>Third paragraph here.</p></body>",
        );
        let req = request().with_max_results(2);
        let items = extract_text(&html, &req).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_entities_decoded() {
        let html = Html::parse_document("<body><p>Fish &amp; chips &mdash; tonight only</p></body>");
        let items = extract_text(&html, &request()).unwrap();
        assert_eq!(texts(&items), vec!["Fish & chips \u{2014} tonight only"]);
    }

    #[test]
    fn test_page_summary_cuts_at_word() {
        let doc = Document::Flat("alpha beta gamma delta".to_string());
        assert_eq!(page_summary(&doc, 12), "alpha beta...");
        assert_eq!(page_summary(&doc, 100), "alpha beta gamma delta");
        assert_eq!(text_len(&doc), 22);
    }
}
