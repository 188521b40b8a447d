//! Metadata mode
//!
//! Records are grouped into namespaces: `basic` (title, meta tags, canonical
//! link, language), `opengraph` (`og:*` and `article:*` properties),
//! `twitter` (`twitter:*`), `schema_org` (parsed JSON-LD blocks) and
//! `technical` (document statistics and selected response headers).

use super::clean::{clean_text, static_selector};
use super::{ExtractedItem, MetadataNamespace};
use crate::url::resolve_href;
use scraper::Html;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

/// Response headers reported in the technical namespace
const TECHNICAL_HEADERS: &[&str] = &["server", "content-type", "last-modified", "x-powered-by"];

fn record(namespace: MetadataNamespace, key: &str, value: Value) -> ExtractedItem {
    ExtractedItem::MetadataRecord {
        key: key.to_string(),
        value,
        namespace,
    }
}

/// All metadata records found in the document
///
/// # Arguments
///
/// * `html` - Parsed page
/// * `page_url` - Final page URL, used to resolve the canonical link
/// * `include_technical` - Add document statistics
pub fn extract_metadata(html: &Html, page_url: &Url, include_technical: bool) -> Vec<ExtractedItem> {
    let mut items = Vec::new();

    if let Some(title) = select_first_text(html, "title") {
        items.push(record(MetadataNamespace::Basic, "title", json!(title)));
    }

    if let Some(sel) = static_selector("meta[content]") {
        for el in html.select(&sel) {
            let attrs = el.value();
            let Some(content) = attrs.attr("content").map(clean_text) else {
                continue;
            };
            if content.is_empty() {
                continue;
            }
            let Some(key) = attrs
                .attr("property")
                .or_else(|| attrs.attr("name"))
                .or_else(|| attrs.attr("http-equiv"))
                .map(|k| k.trim().to_ascii_lowercase())
                .filter(|k| !k.is_empty())
            else {
                continue;
            };
            items.push(classify_meta(&key, content));
        }
    }

    if let Some(href) = static_selector("link[rel~=canonical][href]")
        .and_then(|sel| html.select(&sel).next())
        .and_then(|el| el.value().attr("href"))
    {
        let canonical = resolve_href(href, page_url)
            .map(|u| u.to_string())
            .unwrap_or_else(|| href.trim().to_string());
        items.push(record(MetadataNamespace::Basic, "canonical", json!(canonical)));
    }

    if let Some(lang) = html
        .root_element()
        .value()
        .attr("lang")
        .map(str::trim)
        .filter(|l| !l.is_empty())
    {
        items.push(record(MetadataNamespace::Basic, "lang", json!(lang)));
    }

    items.extend(json_ld(html));

    if include_technical {
        items.extend(document_statistics(html));
    }

    items
}

fn classify_meta(key: &str, content: String) -> ExtractedItem {
    if let Some(rest) = key.strip_prefix("og:") {
        record(MetadataNamespace::Opengraph, rest, json!(content))
    } else if key.starts_with("article:") {
        record(MetadataNamespace::Opengraph, key, json!(content))
    } else if let Some(rest) = key.strip_prefix("twitter:") {
        record(MetadataNamespace::Twitter, rest, json!(content))
    } else {
        record(MetadataNamespace::Basic, key, json!(content))
    }
}

/// Parsed JSON-LD blocks; blocks that are not valid JSON are skipped
fn json_ld(html: &Html) -> Vec<ExtractedItem> {
    let Some(sel) = static_selector(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };
    html.select(&sel)
        .filter_map(|el| {
            let raw: String = el.text().collect();
            match serde_json::from_str::<Value>(raw.trim()) {
                Ok(value) => {
                    let key = value
                        .get("@type")
                        .and_then(Value::as_str)
                        .unwrap_or("json_ld")
                        .to_string();
                    Some(record(MetadataNamespace::SchemaOrg, &key, value))
                }
                Err(e) => {
                    debug!("Skipping invalid JSON-LD block: {}", e);
                    None
                }
            }
        })
        .collect()
}

fn count(html: &Html, css: &str) -> usize {
    static_selector(css)
        .map(|sel| html.select(&sel).count())
        .unwrap_or(0)
}

fn document_statistics(html: &Html) -> Vec<ExtractedItem> {
    let forms = count(html, "form");
    vec![
        record(MetadataNamespace::Technical, "total_links", json!(count(html, "a"))),
        record(MetadataNamespace::Technical, "total_images", json!(count(html, "img"))),
        record(MetadataNamespace::Technical, "total_scripts", json!(count(html, "script"))),
        record(
            MetadataNamespace::Technical,
            "total_stylesheets",
            json!(count(html, "link[rel~=stylesheet]")),
        ),
        record(MetadataNamespace::Technical, "total_forms", json!(forms)),
        record(MetadataNamespace::Technical, "has_forms", json!(forms > 0)),
        record(
            MetadataNamespace::Technical,
            "total_headings",
            json!(count(html, "h1, h2, h3, h4, h5, h6")),
        ),
    ]
}

/// Technical records for the response headers worth reporting
pub fn technical_from_headers(headers: &BTreeMap<String, String>) -> Vec<ExtractedItem> {
    TECHNICAL_HEADERS
        .iter()
        .filter_map(|name| {
            headers
                .get(*name)
                .map(|value| record(MetadataNamespace::Technical, name, json!(value)))
        })
        .collect()
}

fn select_first_text(html: &Html, css: &str) -> Option<String> {
    let sel = static_selector(css)?;
    html.select(&sel)
        .map(|el| clean_text(&el.text().collect::<String>()))
        .find(|t| !t.is_empty())
}

/// Summary of the page's descriptive fields
///
/// Open Graph and Twitter values take precedence over basic meta tags for
/// title, description and image.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub author: Option<String>,
    pub published: Option<String>,
    pub canonical: Option<String>,
    pub lang: Option<String>,
}

/// Resolves the descriptive summary from extracted records
pub fn resolve_metadata(items: &[ExtractedItem]) -> ResolvedMetadata {
    use MetadataNamespace::{Basic, Opengraph, Twitter};
    ResolvedMetadata {
        title: first_of(items, &[(Opengraph, "title"), (Twitter, "title"), (Basic, "title")]),
        description: first_of(
            items,
            &[
                (Opengraph, "description"),
                (Twitter, "description"),
                (Basic, "description"),
            ],
        ),
        image: first_of(items, &[(Opengraph, "image"), (Twitter, "image"), (Basic, "image")]),
        author: first_of(
            items,
            &[
                (Basic, "author"),
                (Opengraph, "article:author"),
                (Twitter, "creator"),
            ],
        )
        .or_else(|| schema_field(items, "author")),
        published: first_of(
            items,
            &[
                (Opengraph, "article:published_time"),
                (Basic, "date"),
                (Basic, "pubdate"),
            ],
        )
        .or_else(|| schema_field(items, "datePublished")),
        canonical: first_of(items, &[(Basic, "canonical"), (Opengraph, "url")]),
        lang: first_of(items, &[(Basic, "lang")]),
    }
}

/// String value of the first candidate (namespace, key) present
fn first_of(items: &[ExtractedItem], candidates: &[(MetadataNamespace, &str)]) -> Option<String> {
    candidates.iter().find_map(|(namespace, key)| {
        items.iter().find_map(|item| match item {
            ExtractedItem::MetadataRecord {
                key: k,
                value,
                namespace: ns,
            } if ns == namespace && k == key => value.as_str().map(str::to_string),
            _ => None,
        })
    })
}

/// A string field from the first JSON-LD block that has it
///
/// Object values (e.g. `"author": {"name": ...}`) yield their `name`.
fn schema_field(items: &[ExtractedItem], field: &str) -> Option<String> {
    items.iter().find_map(|item| match item {
        ExtractedItem::MetadataRecord {
            value,
            namespace: MetadataNamespace::SchemaOrg,
            ..
        } => match value.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => map.get("name")?.as_str().map(str::to_string),
            Value::Array(list) => list.iter().find_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Object(map) => map.get("name")?.as_str().map(str::to_string),
                _ => None,
            }),
            _ => None,
        },
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en-GB"><head>
<title>Basic Title</title>
<meta charset="utf-8">
<meta name="description" content="Basic description">
<meta name="Author" content="Jane Doe">
<meta property="og:title" content="OG Title">
<meta property="article:published_time" content="2024-03-01T10:00:00Z">
<meta name="twitter:description" content="Twitter description">
<meta name="twitter:card" content="summary">
<link rel="canonical" href="/canonical-page">
<link rel="stylesheet" href="/s.css">
<script type="application/ld+json">{"@type": "NewsArticle", "author": {"name": "J. Doe"}}</script>
<script type="application/ld+json">{ not json</script>
</head><body><h1>Heading</h1><a href="/x">x</a><form></form></body></html>"#;

    fn page_url() -> Url {
        Url::parse("https://news.example.com/story").unwrap()
    }

    fn find<'a>(items: &'a [ExtractedItem], ns: MetadataNamespace, key: &str) -> Option<&'a Value> {
        items.iter().find_map(|i| match i {
            ExtractedItem::MetadataRecord {
                key: k,
                value,
                namespace,
            } if *namespace == ns && k == key => Some(value),
            _ => None,
        })
    }

    #[test]
    fn test_namespaces() {
        let html = Html::parse_document(PAGE);
        let items = extract_metadata(&html, &page_url(), false);

        assert_eq!(find(&items, MetadataNamespace::Basic, "title"), Some(&json!("Basic Title")));
        assert_eq!(find(&items, MetadataNamespace::Basic, "author"), Some(&json!("Jane Doe")));
        assert_eq!(find(&items, MetadataNamespace::Opengraph, "title"), Some(&json!("OG Title")));
        assert_eq!(
            find(&items, MetadataNamespace::Opengraph, "article:published_time"),
            Some(&json!("2024-03-01T10:00:00Z"))
        );
        assert_eq!(find(&items, MetadataNamespace::Twitter, "card"), Some(&json!("summary")));
        assert_eq!(
            find(&items, MetadataNamespace::Basic, "canonical"),
            Some(&json!("https://news.example.com/canonical-page"))
        );
        assert_eq!(find(&items, MetadataNamespace::Basic, "lang"), Some(&json!("en-GB")));
        assert!(find(&items, MetadataNamespace::Technical, "total_links").is_none());
    }

    #[test]
    fn test_invalid_json_ld_skipped() {
        let html = Html::parse_document(PAGE);
        let items = extract_metadata(&html, &page_url(), false);
        let blocks = items
            .iter()
            .filter(|i| {
                matches!(
                    i,
                    ExtractedItem::MetadataRecord {
                        namespace: MetadataNamespace::SchemaOrg,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(blocks, 1);
        assert!(find(&items, MetadataNamespace::SchemaOrg, "NewsArticle").is_some());
    }

    #[test]
    fn test_technical_statistics() {
        let html = Html::parse_document(PAGE);
        let items = extract_metadata(&html, &page_url(), true);

        assert_eq!(find(&items, MetadataNamespace::Technical, "total_links"), Some(&json!(1)));
        assert_eq!(find(&items, MetadataNamespace::Technical, "total_scripts"), Some(&json!(2)));
        assert_eq!(
            find(&items, MetadataNamespace::Technical, "total_stylesheets"),
            Some(&json!(1))
        );
        assert_eq!(find(&items, MetadataNamespace::Technical, "has_forms"), Some(&json!(true)));
        assert_eq!(find(&items, MetadataNamespace::Technical, "total_headings"), Some(&json!(1)));
    }

    #[test]
    fn test_resolved_precedence() {
        let html = Html::parse_document(PAGE);
        let resolved = resolve_metadata(&extract_metadata(&html, &page_url(), false));

        assert_eq!(resolved.title.as_deref(), Some("OG Title"));
        assert_eq!(resolved.description.as_deref(), Some("Twitter description"));
        assert_eq!(resolved.author.as_deref(), Some("Jane Doe"));
        assert_eq!(resolved.published.as_deref(), Some("2024-03-01T10:00:00Z"));
        assert!(resolved.image.is_none());
    }

    #[test]
    fn test_author_from_json_ld() {
        let html = Html::parse_document(
            r#"<html><head><script type="application/ld+json">{"@type":"Article","author":[{"name":"A. Writer"}]}</script></head><body><p>x</p></body></html>"#,
        );
        let resolved = resolve_metadata(&extract_metadata(&html, &page_url(), false));
        assert_eq!(resolved.author.as_deref(), Some("A. Writer"));
    }

    #[test]
    fn test_technical_from_headers() {
        let mut headers = BTreeMap::new();
        headers.insert("server".to_string(), "nginx".to_string());
        headers.insert("x-request-id".to_string(), "abc".to_string());
        let items = technical_from_headers(&headers);
        assert_eq!(items.len(), 1);
        assert_eq!(find(&items, MetadataNamespace::Technical, "server"), Some(&json!("nginx")));
    }
}
