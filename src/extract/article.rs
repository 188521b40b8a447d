//! Article mode
//!
//! Finds the main content container by scoring candidates on text density,
//! falling back to the element holding the most paragraph text.

use super::clean::{
    describe, descendant_element_count, element_text, is_boilerplate, static_selector, text_blocks,
};
use super::metadata::ResolvedMetadata;
use super::{scope, ExtractedItem, ExtractionRequest};
use crate::ExtractionError;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use tracing::debug;

/// Candidate containers, most specific first
const CANDIDATES: &[&str] = &[
    "article",
    "main",
    "[role=main]",
    ".post-content",
    ".entry-content",
    ".article-content",
    ".article-body",
    ".story-body",
    ".content",
    "#content",
    ".post",
    "#main",
];

/// Reading speed used for the read-time estimate
const WORDS_PER_MINUTE: usize = 200;

/// Container label used when the paragraph fallback is taken
pub const PARAGRAPH_CLUSTER: &str = "paragraph-cluster";

/// Extracts the main article body
///
/// An explicit selector names the container directly. Otherwise the
/// best-scoring candidate wins, score being text length divided by the
/// number of descendant elements plus one. A page with no candidate and no
/// paragraphs yields no items.
pub fn extract_article(
    html: &Html,
    request: &ExtractionRequest,
    metadata: &ResolvedMetadata,
) -> Result<Vec<ExtractedItem>, ExtractionError> {
    let chosen = match request.selector.as_deref() {
        Some(css) => scope(html, Some(css), None)?
            .into_iter()
            .next()
            .map(|el| (describe(el), container_text(el, request.min_text_length))),
        None => best_candidate(html)
            .map(|el| (describe(el), container_text(el, request.min_text_length)))
            .filter(|(_, content)| !content.is_empty())
            .or_else(|| paragraph_cluster(html)),
    };

    let Some((container, content)) = chosen else {
        return Ok(Vec::new());
    };
    debug!("Article container: {}", container);

    let word_count = content.split_whitespace().count();
    let title = metadata.title.clone().or_else(|| first_heading(html));

    Ok(vec![ExtractedItem::Article {
        title,
        word_count,
        read_time_minutes: read_time_minutes(word_count),
        container,
        content,
        author: metadata.author.clone(),
        published: metadata.published.clone(),
        description: metadata.description.clone(),
    }])
}

fn score(element: ElementRef<'_>) -> (usize, f64) {
    let text_len = element_text(element).chars().count();
    let tags = descendant_element_count(element);
    (text_len, text_len as f64 / (tags + 1) as f64)
}

fn best_candidate(html: &Html) -> Option<ElementRef<'_>> {
    let mut best: Option<(ElementRef<'_>, f64)> = None;
    for css in CANDIDATES {
        let Some(sel) = static_selector(css) else {
            continue;
        };
        for el in html.select(&sel) {
            let (text_len, value) = score(el);
            if text_len == 0 {
                continue;
            }
            if best.map_or(true, |(_, top)| value > top) {
                best = Some((el, value));
            }
        }
    }
    best.map(|(el, _)| el)
}

/// Cleaned blocks of the container joined as paragraphs
fn container_text(element: ElementRef<'_>, min_len: usize) -> String {
    let mut seen = HashSet::new();
    text_blocks(element)
        .into_iter()
        .map(|b| b.text)
        .filter(|t| t.chars().count() >= min_len && !is_boilerplate(t))
        .filter(|t| seen.insert(t.clone()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The parent whose direct `<p>` children hold the most text
fn paragraph_cluster(html: &Html) -> Option<(String, String)> {
    let sel = static_selector("p")?;
    let mut clusters: Vec<(_, usize, Vec<String>)> = Vec::new();
    for p in html.select(&sel) {
        let text = element_text(p);
        if text.is_empty() {
            continue;
        }
        let Some(parent) = p.parent() else {
            continue;
        };
        let id = parent.id();
        match clusters.iter_mut().find(|(pid, _, _)| *pid == id) {
            Some((_, total, texts)) => {
                *total += text.chars().count();
                texts.push(text);
            }
            None => clusters.push((id, text.chars().count(), vec![text])),
        }
    }

    let mut best: Option<(usize, Vec<String>)> = None;
    for (_, total, texts) in clusters {
        if best.as_ref().map_or(true, |(top, _)| total > *top) {
            best = Some((total, texts));
        }
    }
    best.map(|(_, texts)| (PARAGRAPH_CLUSTER.to_string(), texts.join("\n\n")))
}

fn first_heading(html: &Html) -> Option<String> {
    let sel = static_selector("h1")?;
    html.select(&sel).map(element_text).find(|t| !t.is_empty())
}

/// Minutes at 200 words per minute, rounded up; zero only for empty text
pub fn read_time_minutes(word_count: usize) -> usize {
    word_count.div_ceil(WORDS_PER_MINUTE)
}
