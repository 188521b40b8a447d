//! Links mode

use super::clean::{clean_text, element_text, static_selector};
use super::{scope, ExtractedItem, ExtractionRequest};
use crate::url::{is_document_link, is_same_site, normalize_url, resolve_href};
use crate::ExtractionError;
use scraper::Html;
use std::collections::HashSet;
use url::Url;

/// Base URL for resolving references, honouring `<base href>`
pub fn document_base(html: &Html, page_url: &Url) -> Url {
    static_selector("base[href]")
        .and_then(|sel| html.select(&sel).next())
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone())
}

/// Anchors under the selector, resolved to absolute URLs
///
/// Anchors marked `download` and hrefs that do not lead to a page are
/// skipped. Links are deduplicated on their normalized form.
pub fn extract_links(
    html: &Html,
    request: &ExtractionRequest,
    page_url: &Url,
) -> Result<Vec<ExtractedItem>, ExtractionError> {
    let roots = scope(html, request.selector.as_deref(), None)?;
    let Some(anchor) = static_selector("a[href]") else {
        return Ok(Vec::new());
    };
    let base = document_base(html, page_url);

    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for root in roots {
        for el in root.select(&anchor) {
            if items.len() >= request.limits.max_results {
                return Ok(items);
            }
            if el.value().attr("download").is_some() {
                continue;
            }
            let Some(href) = el.value().attr("href") else {
                continue;
            };
            let Some(absolute) = resolve_href(href, &base) else {
                continue;
            };

            let key = normalize_url(absolute.as_str())
                .map(|u| u.to_string())
                .unwrap_or_else(|_| absolute.to_string());
            if !seen.insert(key) {
                continue;
            }

            let mut text = element_text(el);
            if text.is_empty() {
                text = el
                    .value()
                    .attr("title")
                    .or_else(|| el.value().attr("aria-label"))
                    .map(clean_text)
                    .unwrap_or_default();
            }

            items.push(ExtractedItem::Link {
                is_external: !is_same_site(&absolute, page_url),
                href: absolute.to_string(),
                text,
            });
        }
    }
    Ok(items)
}

/// Absolute links in document order, used for crawl discovery
///
/// Downloads and static assets are left out.
pub(crate) fn discover_links(html: &Html, page_url: &Url) -> Vec<Url> {
    let Some(anchor) = static_selector("a[href]") else {
        return Vec::new();
    };
    let base = document_base(html, page_url);
    html.select(&anchor)
        .filter(|el| el.value().attr("download").is_none())
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| resolve_href(href, &base))
        .filter(is_document_link)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractionMode;

    fn page_url() -> Url {
        Url::parse("https://example.com/blog/post").unwrap()
    }

    fn links(body: &str) -> Vec<(String, String, bool)> {
        let html = Html::parse_document(body);
        let req = ExtractionRequest::new(page_url(), ExtractionMode::Links);
        extract_links(&html, &req, &page_url())
            .unwrap()
            .into_iter()
            .filter_map(|i| match i {
                ExtractedItem::Link {
                    href,
                    text,
                    is_external,
                } => Some((href, text, is_external)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_links_are_absolute() {
        let found = links(
            r#"<a href="/about">About</a><a href="next">Next</a><a href="https://other.org/">Other</a>"#,
        );
        assert_eq!(found.len(), 3);
        for (href, _, _) in &found {
            assert!(Url::parse(href).is_ok(), "not absolute: {}", href);
        }
        assert_eq!(found[0].0, "https://example.com/about");
        assert_eq!(found[1].0, "https://example.com/blog/next");
    }

    #[test]
    fn test_external_classification_by_registered_domain() {
        let found = links(
            r#"<a href="https://shop.example.com/x">Shop</a><a href="https://example.org/">Org</a>"#,
        );
        assert!(!found[0].2);
        assert!(found[1].2);
    }

    #[test]
    fn test_skips_non_page_hrefs() {
        let found = links(
            r##"<a href="#top">Top</a><a href="mailto:a@b.c">Mail</a><a href="javascript:void(0)">JS</a><a href="/file.zip" download>Zip</a><a href="/ok">Ok</a>"##,
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1, "Ok");
    }

    #[test]
    fn test_dedupes_normalized() {
        let found = links(
            r#"<a href="/page">One</a><a href="/page#frag">Two</a><a href="https://EXAMPLE.com/page">Three</a>"#,
        );
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_ref_params_not_collapsed() {
        let found = links(
            r#"<a href="/tree?ref=main">Main</a><a href="/tree?ref=dev">Dev</a><a href="/tree?ref=dev&utm_source=x">Dev again</a>"#,
        );
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_base_href_honoured() {
        let found = links(
            r#"<html><head><base href="https://cdn.example.com/root/"></head><body><a href="img">I</a></body></html>"#,
        );
        assert_eq!(found[0].0, "https://cdn.example.com/root/img");
    }

    #[test]
    fn test_empty_anchor_text_falls_back_to_title() {
        let found = links(r#"<a href="/x" title="Home page"><img src="/i.png"></a>"#);
        assert_eq!(found[0].1, "Home page");
    }

    #[test]
    fn test_discover_links_in_order() {
        let html = Html::parse_document(r#"<a href="/a">A</a><a href="mailto:x@y.z">M</a><a href="/b">B</a>"#);
        let found = discover_links(&html, &page_url());
        let paths: Vec<&str> = found.iter().map(|u| u.path()).collect();
        assert_eq!(paths, vec!["/a", "/b"]);
    }

    #[test]
    fn test_discover_links_skips_downloads() {
        let html = Html::parse_document(
            r#"<a href="/guide.pdf">PDF</a><a href="/guide">Guide</a><a href="/clip.mp4">Clip</a><a href="/pics/cat.JPG">Cat</a>"#,
        );
        let found = discover_links(&html, &page_url());
        let paths: Vec<&str> = found.iter().map(|u| u.path()).collect();
        assert_eq!(paths, vec!["/guide"]);
    }
}
