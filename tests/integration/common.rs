//! Shared helpers for integration tests

use sumi_scrape::config::Config;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration with no pauses and millisecond backoff
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.crawler.delay_min_ms = 0;
    config.crawler.delay_max_ms = 0;
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 5;
    config.retry.jitter_ratio = 0.0;
    config.extractor.min_content_chars = 0;
    config
}

/// Wraps a body fragment in a minimal HTML page
pub fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>{}</title></head><body>{}</body></html>",
        title, body
    )
}

/// Serves `html` at `route`
pub async fn serve_html(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(html),
        )
        .mount(server)
        .await;
}
