use std::net::IpAddr;
use url::Url;

/// Second-level labels that commonly form a public suffix together with a
/// country-code TLD (e.g. `co.uk`, `com.au`).
const MULTI_PART_SECOND_LEVEL: &[&str] = &["co", "com", "net", "org", "gov", "ac", "edu", "ne", "or"];

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host, it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_scrape::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Reduces a host to its registered domain
///
/// Keeps the last two labels, or three when the second-to-last label is a
/// generic second level under a two-letter country code (`example.co.uk`).
/// IP addresses and single-label hosts such as `localhost` are returned
/// unchanged. A leading `www.` never survives.
///
/// # Arguments
///
/// * `host` - Hostname, with or without subdomains
///
/// # Returns
///
/// The lowercase registered domain
///
/// # Examples
///
/// ```
/// use sumi_scrape::url::registered_domain;
///
/// assert_eq!(registered_domain("blog.example.com"), "example.com");
/// assert_eq!(registered_domain("news.bbc.co.uk"), "bbc.co.uk");
/// assert_eq!(registered_domain("127.0.0.1"), "127.0.0.1");
/// ```
pub fn registered_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_ok() {
        return host;
    }

    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() <= 2 {
        return labels.join(".");
    }

    let tld = labels[labels.len() - 1];
    let second = labels[labels.len() - 2];
    let keep = if tld.len() == 2 && MULTI_PART_SECOND_LEVEL.contains(&second) {
        3
    } else {
        2
    };

    labels[labels.len() - keep..].join(".")
}
