//! Crawler module: sequential breadth-first crawling
//!
//! This module contains the crawl logic, including:
//! - The page state machine
//! - The frontier, visited set and pacing
//! - Overall crawl coordination and reporting

mod coordinator;
mod page_state;
mod scheduler;

pub use coordinator::{crawl, ContentFocus, CrawlOptions, CrawlPage, CrawlReport, CrawlSummary};
pub use page_state::PageState;
pub use scheduler::{effective_delay, url_key, Frontier, QueuedUrl};
