use crate::UrlError;
use url::Url;

/// Click and campaign identifiers that never select content
///
/// Anything starting with `utm_` is also dropped. Parameters such as `ref`,
/// `source` or `page` are kept: on many sites they pick the content served.
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Builds the identity key used for the crawl visited set and link dedup
///
/// Two hrefs that differ only in host case, a `www.` prefix, empty or dot
/// path segments, a trailing slash, the fragment, tracking parameters or
/// query order get the same key. Scheme and port are part of the identity.
/// The key is never requested; fetches go to the URL as discovered.
///
/// # Returns
///
/// * `Ok(Url)` - The key
/// * `Err(UrlError)` - Unparseable, hostless or not http(s)
///
/// # Examples
///
/// ```
/// use sumi_scrape::url::normalize_url;
///
/// let url = normalize_url("https://WWW.EXAMPLE.COM/page/#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?.to_lowercase();
    if let Some(bare) = host.strip_prefix("www.") {
        let bare = bare.to_string();
        url.set_host(Some(&bare))
            .map_err(|e| UrlError::Malformed(e.to_string()))?;
    }

    let path = collapse_path(url.path());
    url.set_path(&path);
    url.set_fragment(None);

    if url.query().is_some() {
        let mut kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        kept.sort();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    Ok(url)
}

/// Drops empty and `.` segments, resolves `..`, trims the trailing slash
fn collapse_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
