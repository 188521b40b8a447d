//! Images mode

use super::clean::{clean_text, static_selector};
use super::links::document_base;
use super::{scope, ExtractedItem, ExtractionRequest};
use crate::url::resolve_href;
use crate::ExtractionError;
use scraper::Html;
use std::collections::HashSet;
use url::Url;

/// Attributes checked for the image source, in order
const SOURCE_ATTRS: &[&str] = &["src", "data-src", "data-lazy-src"];

/// Images under the selector with absolute sources
pub fn extract_images(
    html: &Html,
    request: &ExtractionRequest,
    page_url: &Url,
) -> Result<Vec<ExtractedItem>, ExtractionError> {
    let roots = scope(html, request.selector.as_deref(), None)?;
    let Some(img) = static_selector("img") else {
        return Ok(Vec::new());
    };
    let base = document_base(html, page_url);

    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for root in roots {
        for el in root.select(&img) {
            if items.len() >= request.limits.max_results {
                return Ok(items);
            }
            let attrs = el.value();

            // Lazy-loaded images often carry a data: placeholder in src
            let Some(src) = SOURCE_ATTRS
                .iter()
                .filter_map(|name| attrs.attr(name))
                .map(str::trim)
                .find(|v| !v.is_empty() && !v.to_ascii_lowercase().starts_with("data:"))
            else {
                continue;
            };
            let Some(absolute) = resolve_href(src, &base) else {
                continue;
            };
            if !seen.insert(absolute.to_string()) {
                continue;
            }

            items.push(ExtractedItem::Image {
                src: absolute.to_string(),
                alt: attrs.attr("alt").map(clean_text).unwrap_or_default(),
                title: attrs
                    .attr("title")
                    .map(clean_text)
                    .filter(|t| !t.is_empty()),
                width: attrs.attr("width").and_then(parse_dimension),
                height: attrs.attr("height").and_then(parse_dimension),
            });
        }
    }
    Ok(items)
}

/// Parses a declared dimension such as `640` or `640px`
fn parse_dimension(value: &str) -> Option<u32> {
    let value = value.trim();
    let digits = value.strip_suffix("px").unwrap_or(value).trim();
    digits.parse().ok()
}
