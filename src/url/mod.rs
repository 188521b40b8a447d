//! URL handling module for Sumi-Scrape
//!
//! This module provides URL normalization, domain extraction, host and
//! registered-domain comparison, wildcard matching for blocked domains, and
//! href resolution.

mod domain;
mod matcher;
mod normalize;

use url::Url;

// Re-export main functions
pub use domain::{extract_domain, registered_domain};
pub use matcher::matches_wildcard;
pub use normalize::normalize_url;

/// Schemes that never lead to a fetchable page
const SKIPPED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Path extensions of downloads and assets rather than pages
const NON_DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "zip", "gz", "tgz", "tar", "rar", "7z", "bz2", "xz", "exe", "msi", "dmg", "iso",
    "apk", "deb", "rpm", "mp3", "mp4", "m4a", "m4v", "avi", "mov", "mkv", "webm", "wav", "ogg",
    "flac", "jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "ico", "tif", "tiff", "css", "js",
    "woff", "woff2", "ttf", "otf", "eot", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "csv",
];

/// Resolves an href found in a page into an absolute http(s) URL
///
/// Returns `None` for hrefs that should be ignored:
/// - empty values and fragment-only anchors (`#top`)
/// - `javascript:`, `mailto:`, `tel:` and `data:` URIs
/// - values that cannot be joined onto the base URL
/// - anything that resolves to a scheme other than http or https
///
/// # Arguments
///
/// * `href` - Raw attribute value
/// * `base` - The document base URL (page URL or `<base href>`)
pub fn resolve_href(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if SKIPPED_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) {
        return None;
    }

    let absolute = base.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute),
        _ => None,
    }
}

/// Returns true if both URLs belong to the same registered domain
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_scrape::url::is_same_site;
///
/// let a = Url::parse("https://blog.example.com/post").unwrap();
/// let b = Url::parse("https://www.example.com/").unwrap();
/// assert!(is_same_site(&a, &b));
/// ```
pub fn is_same_site(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(x), Some(y)) => registered_domain(x) == registered_domain(y),
        _ => false,
    }
}

/// Lowercased host of a URL, without the port
pub fn host_key(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.trim_end_matches('.').to_ascii_lowercase())
}

/// Returns true if both URLs name the same host
///
/// Subdomains are different hosts: `blog.example.com` is not `example.com`.
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (host_key(a), host_key(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Returns false for links to downloads and static assets
///
/// Only the last path segment's extension is inspected; query strings do
/// not count.
pub fn is_document_link(url: &Url) -> bool {
    let last = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");
    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            !NON_DOCUMENT_EXTENSIONS.contains(&ext.as_str())
        }
        _ => true,
    }
}

/// Returns the first blocked-domain pattern matching the URL's host, if any
///
/// Patterns use the same syntax as [`matches_wildcard`].
pub fn blocked_by<'a>(url: &Url, patterns: &'a [String]) -> Option<&'a str> {
    let domain = extract_domain(url)?;
    patterns
        .iter()
        .map(String::as_str)
        .find(|pattern| matches_wildcard(&pattern.to_lowercase(), &domain))
}
