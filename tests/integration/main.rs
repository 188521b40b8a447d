//! Integration tests for Sumi-Scrape
//!
//! These run the fetch/extract pipeline and the crawler against wiremock
//! servers.

mod common;
mod crawl_tests;
mod scrape_tests;
