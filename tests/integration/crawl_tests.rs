//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use crate::common::{fast_config, page, serve_html};
use std::collections::HashSet;
use sumi_scrape::config::RobotsPolicy;
use sumi_scrape::crawler::{crawl, CrawlOptions, PageState};
use sumi_scrape::fetcher::FetchChain;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn seed(server: &MockServer) -> Url {
    Url::parse(&format!("{}/", server.uri())).unwrap()
}

fn polite(max_pages: usize, max_depth: usize) -> CrawlOptions {
    CrawlOptions {
        max_pages,
        max_depth,
        stealth: false,
        ..Default::default()
    }
}

/// Seed page linking to `/p1` .. `/pN`, each of which links back to the seed
async fn mount_fan_out(server: &MockServer, n: usize) {
    let links: String = (1..=n)
        .map(|i| format!("<a href=\"/p{}\">Page number {}</a>", i, i))
        .collect();
    serve_html(server, "/", page("Home", &links)).await;

    for i in 1..=n {
        serve_html(
            server,
            &format!("/p{}", i),
            page(
                &format!("Page {}", i),
                "<p>Some words on this page.</p><a href=\"/\">Home</a>",
            ),
        )
        .await;
    }
}

#[tokio::test]
async fn test_crawl_respects_max_pages() {
    let server = MockServer::start().await;
    mount_fan_out(&server, 6).await;

    let config = fast_config();
    let chain = FetchChain::from_config(&config).unwrap();
    let report = crawl(&chain, &config, seed(&server), &polite(3, 2))
        .await
        .unwrap();

    assert_eq!(report.pages.len(), 3);
    assert_eq!(report.summary.pages_attempted, 3);

    let unique: HashSet<&str> = report.pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(unique.len(), report.pages.len());
}

#[tokio::test]
async fn test_crawl_breadth_first_order() {
    let server = MockServer::start().await;
    mount_fan_out(&server, 2).await;

    let config = fast_config();
    let chain = FetchChain::from_config(&config).unwrap();
    let report = crawl(&chain, &config, seed(&server), &polite(10, 2))
        .await
        .unwrap();

    let depths: Vec<usize> = report.pages.iter().map(|p| p.depth).collect();
    assert_eq!(depths, vec![0, 1, 1]);
    assert_eq!(report.pages[0].title.as_deref(), Some("Home"));
    assert!(report.pages.iter().all(|p| p.state == PageState::Done));
    assert_eq!(report.summary.max_depth_reached, 1);
}

#[tokio::test]
async fn test_crawl_depth_zero_visits_only_seed() {
    let server = MockServer::start().await;
    mount_fan_out(&server, 3).await;

    let config = fast_config();
    let chain = FetchChain::from_config(&config).unwrap();
    let report = crawl(&chain, &config, seed(&server), &polite(10, 0))
        .await
        .unwrap();

    assert_eq!(report.pages.len(), 1);
    assert_eq!(report.pages[0].depth, 0);
    // Links are still reported even though none are followed
    assert_eq!(report.summary.discovered_total, 3);
}

#[tokio::test]
async fn test_crawl_same_domain_only() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/",
        page(
            "Home",
            "<a href=\"/local\">Local page</a><a href=\"https://elsewhere.example/away\">Away</a>",
        ),
    )
    .await;
    serve_html(&server, "/local", page("Local", "<p>Local content here.</p>")).await;

    let config = fast_config();
    let chain = FetchChain::from_config(&config).unwrap();
    let report = crawl(&chain, &config, seed(&server), &polite(10, 2))
        .await
        .unwrap();

    assert_eq!(report.pages.len(), 2);
    assert!(report.pages.iter().all(|p| !p.url.contains("elsewhere")));
    assert!(report
        .summary
        .discovered_links
        .iter()
        .all(|l| !l.contains("elsewhere")));
}

#[tokio::test]
async fn test_crawl_records_failed_pages_and_continues() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/",
        page(
            "Home",
            "<a href=\"/missing\">Missing page</a><a href=\"/ok\">Working page</a>",
        ),
    )
    .await;
    serve_html(&server, "/ok", page("Ok", "<p>This page works fine.</p>")).await;

    let config = fast_config();
    let chain = FetchChain::from_config(&config).unwrap();
    let report = crawl(&chain, &config, seed(&server), &polite(10, 1))
        .await
        .unwrap();

    assert_eq!(report.pages.len(), 3);
    let missing = report
        .pages
        .iter()
        .find(|p| p.url.ends_with("/missing"))
        .unwrap();
    assert_eq!(missing.state, PageState::Failed);
    assert!(missing.error.is_some());

    assert_eq!(report.summary.pages_succeeded, 2);
    assert_eq!(report.summary.pages_failed, 1);
}

#[tokio::test]
async fn test_crawl_enforces_robots() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
        )
        .mount(&server)
        .await;
    serve_html(
        &server,
        "/",
        page(
            "Home",
            "<a href=\"/private/page\">Private</a><a href=\"/public\">Public</a>",
        ),
    )
    .await;
    serve_html(&server, "/public", page("Public", "<p>Anyone may read this.</p>")).await;
    Mock::given(method("GET"))
        .and(path("/private/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("secret"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = fast_config();
    config.crawler.robots_policy = RobotsPolicy::Enforce;
    let chain = FetchChain::from_config(&config).unwrap();
    let report = crawl(&chain, &config, seed(&server), &polite(10, 1))
        .await
        .unwrap();

    let private = report
        .pages
        .iter()
        .find(|p| p.url.ends_with("/private/page"))
        .unwrap();
    assert!(private.robots_disallowed);
    assert_eq!(private.state, PageState::Failed);
    assert!(private.error.as_deref().unwrap().contains("robots.txt"));
    assert_eq!(report.summary.robots_policy, RobotsPolicy::Enforce);
}

#[tokio::test]
async fn test_crawl_advisory_robots_still_fetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .mount(&server)
        .await;
    serve_html(&server, "/", page("Home", "<p>Fetched regardless.</p>")).await;

    let config = fast_config();
    let chain = FetchChain::from_config(&config).unwrap();
    let report = crawl(&chain, &config, seed(&server), &polite(1, 0))
        .await
        .unwrap();

    assert_eq!(report.pages[0].state, PageState::Done);
    assert!(report.pages[0].robots_disallowed);
}

#[tokio::test]
async fn test_crawl_redirect_target_not_revisited() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/",
        page(
            "Home",
            "<a href=\"/old\">Old location</a><a href=\"/new\">New location</a>",
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&server)
        .await;
    serve_html(&server, "/new", page("New", "<p>Moved content lives here.</p>")).await;

    let config = fast_config();
    let chain = FetchChain::from_config(&config).unwrap();
    let report = crawl(&chain, &config, seed(&server), &polite(10, 1))
        .await
        .unwrap();

    assert_eq!(report.pages.len(), 2);
    let old = &report.pages[1];
    assert!(old.url.ends_with("/old"));
    assert!(old.final_url.as_deref().unwrap().ends_with("/new"));
}

#[tokio::test]
async fn test_crawl_stays_on_seed_host() {
    let server = MockServer::start().await;
    let port = server.address().port();
    serve_html(
        &server,
        "/",
        page(
            "Home",
            &format!(
                "<a href=\"/local\">Local page</a>\
                 <a href=\"http://localhost:{}/other-host\">Other host</a>",
                port
            ),
        ),
    )
    .await;
    serve_html(&server, "/local", page("Local", "<p>Local content here.</p>")).await;
    Mock::given(method("GET"))
        .and(path("/other-host"))
        .respond_with(ResponseTemplate::new(200).set_body_string("off host"))
        .expect(0)
        .mount(&server)
        .await;

    let config = fast_config();
    let chain = FetchChain::from_config(&config).unwrap();
    let report = crawl(&chain, &config, seed(&server), &polite(10, 2))
        .await
        .unwrap();

    assert_eq!(report.pages.len(), 2);
    assert!(report.pages.iter().all(|p| p.url.contains("127.0.0.1")));
    assert!(report
        .summary
        .discovered_links
        .iter()
        .all(|l| !l.contains("other-host")));
}

#[tokio::test]
async fn test_crawl_follows_host_seed_redirected_to() {
    let server = MockServer::start().await;
    let port = server.address().port();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("http://localhost:{}/home", port).as_str()),
        )
        .mount(&server)
        .await;
    serve_html(
        &server,
        "/home",
        page("Home", "<p>Landing text here.</p><a href=\"/about\">About</a>"),
    )
    .await;
    serve_html(&server, "/about", page("About", "<p>About us text.</p>")).await;

    let config = fast_config();
    let chain = FetchChain::from_config(&config).unwrap();
    let report = crawl(&chain, &config, seed(&server), &polite(10, 1))
        .await
        .unwrap();

    assert_eq!(report.pages.len(), 2);
    assert!(report.pages[1].url.starts_with("http://localhost:"));
    assert_eq!(report.pages[1].title.as_deref(), Some("About"));
}

#[tokio::test]
async fn test_crawl_skips_downloads_and_non_html_pages() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/",
        page(
            "Home",
            "<a href=\"/manual.pdf\">Manual</a>\
             <a href=\"/export\">Export</a>\
             <a href=\"/guide\">Guide</a>",
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/manual.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/export"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
        .mount(&server)
        .await;
    serve_html(&server, "/guide", page("Guide", "<p>How to use the thing.</p>")).await;

    let config = fast_config();
    let chain = FetchChain::from_config(&config).unwrap();
    let report = crawl(&chain, &config, seed(&server), &polite(10, 1))
        .await
        .unwrap();

    assert_eq!(report.pages.len(), 3);
    assert!(report.pages.iter().all(|p| !p.url.ends_with(".pdf")));

    let export = report
        .pages
        .iter()
        .find(|p| p.url.ends_with("/export"))
        .unwrap();
    assert_eq!(export.state, PageState::Failed);
    assert!(export.error.as_deref().unwrap().contains("application/pdf"));
    assert!(export.title.is_none());
    assert_eq!(report.summary.pages_succeeded, 2);
}
