//! Robots.txt rules for a single host
//!
//! Allow/Disallow matching is delegated to the robotstxt crate. Crawl-delay is
//! not covered by it, so that directive is read here.

use robotstxt::DefaultMatcher;

/// Robots.txt rules for one host
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    /// Raw robots.txt body; empty means everything is allowed
    content: String,
}

impl ParsedRobots {
    /// Wraps a robots.txt body
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Rules that allow everything
    ///
    /// Used when robots.txt is missing (4xx) or could not be fetched.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL or path (e.g., "/page.html")
    /// * `user_agent` - The product token or full user agent string
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Crawl-delay in seconds for the given user agent
    ///
    /// A group naming the agent wins over the `*` group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        let agent = user_agent.to_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut in_rules = false;
        let mut wildcard = None;
        let mut specific = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                "user-agent" => {
                    // A user-agent line after rules starts a new group
                    if in_rules {
                        group.clear();
                        in_rules = false;
                    }
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_rules = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if group.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                        specific = Some(delay);
                    } else if group.iter().any(|ua| ua == "*") {
                        wildcard = Some(delay);
                    }
                }
                _ => in_rules = true,
            }
        }

        specific.or(wildcard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        let robots = ParsedRobots::allow_all();
        assert!(robots.is_allowed("/any/path", "SumiScrape"));
        assert_eq!(robots.crawl_delay("SumiScrape"), None);
    }

    #[test]
    fn test_disallow_specific_path() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /admin");
        assert!(robots.is_allowed("/", "SumiScrape"));
        assert!(robots.is_allowed("https://example.com/page", "SumiScrape"));
        assert!(!robots.is_allowed("/admin/users", "SumiScrape"));
        assert!(!robots.is_allowed("https://example.com/admin", "SumiScrape"));
    }

    #[test]
    fn test_allow_overrides_disallow() {
        let content = "User-agent: *\nDisallow: /private\nAllow: /private/public";
        let robots = ParsedRobots::from_content(content);
        assert!(!robots.is_allowed("/private", "SumiScrape"));
        assert!(robots.is_allowed("/private/public", "SumiScrape"));
    }

    #[test]
    fn test_agent_specific_group() {
        let content = "User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nAllow: /";
        let robots = ParsedRobots::from_content(content);
        assert!(robots.is_allowed("/page", "SumiScrape"));
        assert!(!robots.is_allowed("/page", "BadBot"));
    }

    #[test]
    fn test_garbage_content_allows() {
        let robots = ParsedRobots::from_content("<html>not robots</html>");
        assert!(robots.is_allowed("/any/path", "SumiScrape"));
    }

    #[test]
    fn test_crawl_delay_wildcard_and_specific() {
        let content = "User-agent: SumiScrape\nCrawl-delay: 5\n\nUser-agent: *\nCrawl-delay: 10";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(robots.crawl_delay("SumiScrape"), Some(5.0));
        assert_eq!(robots.crawl_delay("OtherBot"), Some(10.0));
    }

    #[test]
    fn test_crawl_delay_shared_group() {
        let content = "User-agent: BotA\nUser-agent: BotB\nCrawl-delay: 2.5\nDisallow: /x";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(robots.crawl_delay("BotA"), Some(2.5));
        assert_eq!(robots.crawl_delay("botb"), Some(2.5));
        assert_eq!(robots.crawl_delay("BotC"), None);
    }
}
