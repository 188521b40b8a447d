//! Integration tests for the single-page tools

use crate::common::{fast_config, page, serve_html};
use serde_json::{json, Value};
use sumi_scrape::tool::{ToolDispatcher, ARTICLE_TOOL, METADATA_TOOL, SCRAPE_TOOL};
use sumi_scrape::{FetchError, ScrapeError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dispatcher() -> ToolDispatcher {
    ToolDispatcher::new(fast_config())
}

async fn scrape(server: &MockServer, route: &str, extra: Value) -> Value {
    let mut args = json!({ "url": format!("{}{}", server.uri(), route), "stealth_mode": false });
    if let (Some(args), Some(extra)) = (args.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            args.insert(k.clone(), v.clone());
        }
    }
    dispatcher().call(SCRAPE_TOOL, args).await.unwrap()
}

fn item_strings(response: &Value, field: &str) -> Vec<String> {
    response["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|i| i[field].as_str().map(String::from))
        .collect()
}

#[tokio::test]
async fn test_scrape_text() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/",
        page(
            "Welcome",
            "<script>var hidden = 'do not show';</script>\
             <style>.x { color: red }</style>\
             <p>The first paragraph of real text.</p>\
             <p>The second paragraph of real text.</p>",
        ),
    )
    .await;

    let response = scrape(&server, "/", json!({})).await;

    assert_eq!(response["title"], "Welcome");
    assert_eq!(response["extract_type"], "text");
    assert_eq!(response["fetch"]["strategy"], "static");
    let texts = item_strings(&response, "content");
    assert_eq!(
        texts,
        vec![
            "The first paragraph of real text.",
            "The second paragraph of real text."
        ]
    );
    assert!(texts.iter().all(|t| !t.contains("do not show")));
    assert_eq!(response["total_items"], 2);
}

#[tokio::test]
async fn test_scrape_retries_transient_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    serve_html(&server, "/flaky", page("Flaky", "<p>Third time lucky here.</p>")).await;

    let response = scrape(&server, "/flaky", json!({})).await;

    assert_eq!(response["fetch"]["attempts"], 3);
    assert_eq!(response["fetch"]["strategy"], "static");
    assert_eq!(response["fetch"]["status_code"], 200);
}

#[tokio::test]
async fn test_scrape_all_strategies_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = dispatcher()
        .call(
            SCRAPE_TOOL,
            json!({ "url": format!("{}/down", server.uri()), "stealth_mode": false }),
        )
        .await
        .unwrap_err();

    match err {
        ScrapeError::Fetch(FetchError::AllStrategiesFailed { errors, .. }) => {
            assert_eq!(errors.len(), 2);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_scrape_decodes_latin1() {
    let server = MockServer::start().await;
    let mut body = b"<html><head><title>Menu</title></head><body><p>Caf".to_vec();
    body.push(0xE9);
    body.extend_from_slice(b" au lait, tr");
    body.push(0xE8);
    body.extend_from_slice(b"s bon</p></body></html>");
    Mock::given(method("GET"))
        .and(path("/menu"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=ISO-8859-1"))
        .mount(&server)
        .await;

    let response = scrape(&server, "/menu", json!({})).await;

    assert_eq!(item_strings(&response, "content"), vec!["Café au lait, très bon"]);
    assert_eq!(response["fetch"]["encoding"], "windows-1252");
}

#[tokio::test]
async fn test_scrape_links_are_absolute() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/docs/index.html",
        page(
            "Docs",
            "<a href=\"intro.html\">Intro</a>\
             <a href=\"/about\">About</a>\
             <a href=\"https://other.example/x\">Other</a>\
             <a href=\"javascript:void(0)\">Nothing</a>\
             <a href=\"intro.html#top\">Intro again</a>",
        ),
    )
    .await;

    let response = scrape(&server, "/docs/index.html", json!({ "extract_type": "links" })).await;

    let hrefs = item_strings(&response, "href");
    assert_eq!(hrefs.len(), 3);
    assert!(hrefs.iter().all(|h| h.starts_with("http://") || h.starts_with("https://")));
    assert!(hrefs[0].ends_with("/docs/intro.html"));

    let items = response["items"].as_array().unwrap();
    assert_eq!(items[0]["is_external"], false);
    assert_eq!(items[2]["is_external"], true);
}

#[tokio::test]
async fn test_scrape_table_rows_padded() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/prices",
        page(
            "Prices",
            "<table>\
             <tr><th>Item</th><th>Price</th><th>Stock</th></tr>\
             <tr><td>Apple</td><td>1.00</td><td>12</td></tr>\
             <tr><td>Pear</td><td>2.00</td></tr>\
             </table>",
        ),
    )
    .await;

    let response = scrape(&server, "/prices", json!({ "extract_type": "table" })).await;

    let items = response["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["cells"], json!(["Apple", "1.00", "12"]));
    assert_eq!(items[1]["cells"], json!(["Pear", "2.00", ""]));
}

#[tokio::test]
async fn test_scrape_selector_without_match_notes_it() {
    let server = MockServer::start().await;
    serve_html(&server, "/", page("Home", "<p>Only a paragraph here.</p>")).await;

    let response = scrape(&server, "/", json!({ "selector": "#missing" })).await;

    assert_eq!(response["total_items"], 0);
    assert!(response["notes"][0].as_str().unwrap().contains("#missing"));
}

#[tokio::test]
async fn test_scrape_with_crawl_depth() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/",
        page("Home", "<p>Home page text here.</p><a href=\"/next\">Next</a>"),
    )
    .await;
    serve_html(&server, "/next", page("Next", "<p>Next page text here.</p>")).await;

    let response = scrape(&server, "/", json!({ "crawl_depth": 1, "max_pages": 5 })).await;

    let pages = response["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[1]["title"], "Next");
    assert_eq!(pages[1]["items"][0]["content"], "Next page text here.");
    assert_eq!(response["summary"]["pages_succeeded"], 2);
}

#[tokio::test]
async fn test_scrape_blocked_domain_never_requested() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = fast_config();
    config.blocked_domains = vec!["127.0.0.1".to_string()];
    let err = ToolDispatcher::new(config)
        .call(SCRAPE_TOOL, json!({ "url": server.uri() }))
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Fetch(FetchError::BlockedDomain { .. })));
}

#[tokio::test]
async fn test_article_tool() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/post",
        "<html><head>\
         <title>Site | Post</title>\
         <meta property=\"og:title\" content=\"The Real Title\">\
         <meta name=\"author\" content=\"Jo Writer\">\
         </head><body>\
         <nav><a href=\"/\">Home</a><a href=\"/blog\">Blog</a></nav>\
         <article>\
         <h1>The Real Title</h1>\
         <p>The opening paragraph explains what the article covers.</p>\
         <p>A second paragraph adds the supporting detail.</p>\
         </article>\
         <footer>Copyright notice</footer>\
         </body></html>"
            .to_string(),
    )
    .await;

    let response = dispatcher()
        .call(
            ARTICLE_TOOL,
            json!({ "url": format!("{}/post", server.uri()), "use_javascript": false }),
        )
        .await
        .unwrap();

    let article = &response["article"];
    assert_eq!(article["type"], "article");
    assert_eq!(article["title"], "The Real Title");
    assert_eq!(article["author"], "Jo Writer");
    assert!(article["container"].as_str().unwrap().starts_with("article"));
    let content = article["content"].as_str().unwrap();
    assert!(content.contains("opening paragraph"));
    assert!(!content.contains("Copyright"));
    assert_eq!(article["read_time_minutes"], 1);
}

#[tokio::test]
async fn test_metadata_tool() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("server", "mock-server")
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(
                    "<html lang=\"en\"><head>\
                     <title>Widget</title>\
                     <meta name=\"description\" content=\"A useful widget\">\
                     <meta property=\"og:title\" content=\"Widget Deluxe\">\
                     <meta name=\"twitter:card\" content=\"summary\">\
                     <script type=\"application/ld+json\">{\"@type\": \"Product\", \"name\": \"Widget\"}</script>\
                     </head><body><p>Buy it now.</p></body></html>",
                ),
        )
        .mount(&server)
        .await;

    let response = dispatcher()
        .call(
            METADATA_TOOL,
            json!({ "url": format!("{}/product", server.uri()) }),
        )
        .await
        .unwrap();

    assert_eq!(response["resolved"]["title"], "Widget Deluxe");
    assert_eq!(response["resolved"]["description"], "A useful widget");
    assert_eq!(response["resolved"]["lang"], "en");

    let records = response["records"].as_array().unwrap();
    let find = |namespace: &str, key: &str| {
        records
            .iter()
            .find(|r| r["namespace"] == namespace && r["key"] == key)
            .map(|r| r["value"].clone())
    };
    assert_eq!(find("opengraph", "title"), Some(json!("Widget Deluxe")));
    assert_eq!(find("twitter", "card"), Some(json!("summary")));
    assert_eq!(find("schema_org", "Product").unwrap()["name"], "Widget");
    assert_eq!(find("technical", "server"), Some(json!("mock-server")));
}
