//! Crawler module for book fetching and processing
//!
//! This module contains the core acquisition pipeline:
//! - HTTP transport with manual redirect following and chain capture
//! - Existence detection from redirect metadata
//! - Detail-page and listing-page parsing
//! - Text and cover asset download
//! - The retry/backoff crawl loop

mod assets;
mod coordinator;
mod existence;
mod fetcher;
mod listing;
mod parser;

pub use assets::{download_cover, download_text, sanitize_filename};
pub use coordinator::{classify_failure, FailureClass, Harvester, ItemOutcome, RunStats, SkipReason};
pub use existence::{Existence, RedirectRule};
pub use fetcher::{build_http_client, fetch, FetchResult, RedirectHop};
pub use listing::{extract_book_links, listing_page_url};
pub use parser::{parse_book_page, ParsedBook};
