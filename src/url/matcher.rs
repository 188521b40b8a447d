/// Checks if a domain matches a blocked-domain pattern
///
/// Two pattern forms are supported:
/// 1. Exact: "ads.example.com" matches only "ads.example.com"
/// 2. Wildcard: "*.tracker.net" matches "tracker.net" and any subdomain of it
///
/// Both sides are expected to be lowercase already.
///
/// # Examples
///
/// ```
/// use sumi_scrape::url::matches_wildcard;
///
/// assert!(matches_wildcard("ads.example.com", "ads.example.com"));
/// assert!(!matches_wildcard("ads.example.com", "example.com"));
///
/// assert!(matches_wildcard("*.tracker.net", "tracker.net"));
/// assert!(matches_wildcard("*.tracker.net", "eu.pixel.tracker.net"));
/// assert!(!matches_wildcard("*.tracker.net", "nottracker.net"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => candidate == pattern,
    }
}
