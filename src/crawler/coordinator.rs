//! Crawl controller: drives the reference sequence and the retry policy
//!
//! Each item moves through one attempt at a time; the outcome of an attempt is
//! a tagged `ItemOutcome` so the continue-vs-advance decision is a pure
//! function of the error class:
//! - connectivity failures wait out the backoff interval and retry the SAME
//!   item (its batch position never changes),
//! - a missing book, malformed page, or hard HTTP error is a permanent skip,
//! - local-storage failures are fatal and abort the run.

use crate::catalog::BookRecord;
use crate::config::Config;
use crate::crawler::assets::{download_cover, download_text};
use crate::crawler::existence::{Existence, RedirectRule};
use crate::crawler::fetcher::{build_http_client, fetch};
use crate::crawler::listing::{extract_book_links, listing_page_url};
use crate::crawler::parser::parse_book_page;
use crate::reference::{resolve, BookRef};
use crate::{HarvestError, Result};
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Outcome of one item attempt
#[derive(Debug)]
pub enum ItemOutcome {
    /// Detail page and assets processed; the record joins the batch
    Recorded(BookRecord),

    /// Permanent skip; the loop advances to the next item
    Skipped(SkipReason),

    /// Connectivity failure; the loop waits and retries the same item
    RetryScheduled,
}

/// Why an item was permanently skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The existence guard saw the not-found redirect signal
    NotFound,

    /// The detail page violated the parser's structure assumptions
    MalformedPage(String),

    /// Hard HTTP error unrelated to the existence signal
    HttpStatus(u16),

    /// Non-retryable transport or reference failure
    Other(String),
}

impl SkipReason {
    /// Maps a skip-classified error to its reason
    fn from_error(error: &HarvestError) -> Self {
        match error {
            HarvestError::MalformedPage { message, .. } => Self::MalformedPage(message.clone()),
            HarvestError::HttpStatus { status, .. } => Self::HttpStatus(*status),
            other => Self::Other(other.to_string()),
        }
    }
}

/// Classification of a per-item failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Transient connectivity problem: back off and retry the same item
    Retry,

    /// Permanent problem with this item: log and advance
    Skip,

    /// Unrecoverable local failure: abort the whole run
    Fatal,
}

/// Classifies a per-item error into retry-same-item, skip-and-advance, or
/// abort-the-run
///
/// This is a pure function of the error so the control flow is testable
/// without network calls.
pub fn classify_failure(error: &HarvestError) -> FailureClass {
    match error {
        HarvestError::Transport(t) if t.is_connectivity() => FailureClass::Retry,
        HarvestError::Transport(_) => FailureClass::Skip,
        HarvestError::HttpStatus { .. } => FailureClass::Skip,
        HarvestError::MalformedPage { .. } => FailureClass::Skip,
        HarvestError::Reference(_) => FailureClass::Skip,
        HarvestError::UrlParse(_) => FailureClass::Skip,
        // Config, catalog, IO, and client construction failures leave local
        // state unsafe to continue from
        _ => FailureClass::Fatal,
    }
}

/// Counters for one harvest run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub recorded: usize,
    pub skipped: usize,
    pub retries: usize,
}

/// Drives the crawl over an id range or a listing walk
pub struct Harvester {
    config: Config,
    client: Client,
    rule: RedirectRule,
    backoff: Duration,
    dest_dir: PathBuf,
    stats: RunStats,
}

impl Harvester {
    /// Creates a harvester from a validated configuration
    pub fn new(config: Config) -> Result<Self> {
        let client = build_http_client(&config.crawler)?;
        let backoff = Duration::from_millis(config.crawler.backoff_ms);
        let dest_dir = PathBuf::from(&config.output.dest_dir);

        Ok(Self {
            client,
            rule: RedirectRule::default(),
            backoff,
            dest_dir,
            stats: RunStats::default(),
            config,
        })
    }

    /// Replaces the existence policy (used to compare redirect rules)
    pub fn with_rule(mut self, rule: RedirectRule) -> Self {
        self.rule = rule;
        self
    }

    /// Counters accumulated so far
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Harvests a bounded linear id range `[start, end]`
    ///
    /// Records appear in the batch in id order; a retried id keeps its
    /// position because nothing is appended until it succeeds.
    pub async fn run_range(&mut self, start: u32, end: u32) -> Result<Vec<BookRecord>> {
        let mut batch = Vec::new();
        let total = end.saturating_sub(start).saturating_add(1);

        for (index, id) in (start..=end).enumerate() {
            let Some(book_ref) = BookRef::new(id) else {
                tracing::debug!("Ignoring id {} below the valid range", id);
                continue;
            };

            self.process_with_retry(book_ref, &mut batch).await?;

            let done = index + 1;
            if done % 10 == 0 || done as u32 == total {
                tracing::info!(
                    "Progress: {}/{} ids processed, {} recorded",
                    done,
                    total,
                    batch.len()
                );
            }
        }

        Ok(batch)
    }

    /// Harvests by walking genre listing pages `[start_page, end_page]`
    ///
    /// References are yielded in the order links appear on each page. Listing
    /// fetches use the same retry and skip rules as item fetches.
    pub async fn run_listing(
        &mut self,
        genre: u32,
        start_page: u32,
        end_page: u32,
    ) -> Result<Vec<BookRecord>> {
        let mut batch = Vec::new();

        for page in start_page..=end_page {
            let refs = match self.fetch_listing_refs(genre, page).await? {
                Some(refs) => refs,
                None => continue,
            };

            tracing::info!(
                "Listing l{}/{}: {} detail links, {} recorded so far",
                genre,
                page,
                refs.len(),
                batch.len()
            );

            for book_ref in refs {
                self.process_with_retry(book_ref, &mut batch).await?;
            }
        }

        Ok(batch)
    }

    /// Fetches one listing page under the retry policy and resolves its links
    ///
    /// Returns `Ok(None)` when the page is permanently skipped (not present
    /// on the source, or a hard fetch error).
    async fn fetch_listing_refs(&mut self, genre: u32, page: u32) -> Result<Option<Vec<BookRef>>> {
        let url = listing_page_url(&self.config.source.base_url, genre, page);
        let host = self.config.source.host();

        loop {
            let result = match fetch(&self.client, &url, self.config.crawler.max_redirects).await {
                Ok(result) => result,
                Err(error) => match classify_failure(&error) {
                    FailureClass::Retry => {
                        self.wait_out_backoff(&error).await;
                        continue;
                    }
                    FailureClass::Skip => {
                        tracing::warn!("Skipping listing page {}: {}", url, error);
                        return Ok(None);
                    }
                    FailureClass::Fatal => return Err(error),
                },
            };

            if self.rule.check(&result) == Existence::NotFound {
                tracing::info!("Listing page {} not present on source", url);
                return Ok(None);
            }

            let refs = extract_book_links(&result.text(), &result.final_url)
                .into_iter()
                .filter_map(|link| match resolve(&link, &host) {
                    Ok(book_ref) => Some(book_ref),
                    Err(error) => {
                        tracing::debug!("Ignoring listing link {}: {}", link, error);
                        None
                    }
                })
                .collect();

            return Ok(Some(refs));
        }
    }

    /// Processes one item to a terminal outcome, retrying through
    /// connectivity failures
    async fn process_with_retry(
        &mut self,
        book_ref: BookRef,
        batch: &mut Vec<BookRecord>,
    ) -> Result<()> {
        let mut consecutive_connection_failures: u32 = 0;

        loop {
            match self.attempt(book_ref).await? {
                ItemOutcome::Recorded(record) => {
                    tracing::info!("Recorded {}: '{}'", book_ref, record.title);
                    batch.push(record);
                    self.stats.recorded += 1;
                    return Ok(());
                }
                ItemOutcome::Skipped(reason) => {
                    tracing::info!("Skipping {}: {:?}", book_ref, reason);
                    self.stats.skipped += 1;
                    return Ok(());
                }
                ItemOutcome::RetryScheduled => {
                    consecutive_connection_failures += 1;
                    self.stats.retries += 1;
                    tracing::warn!(
                        "Connectivity failure {} in a row for {}, waiting {:?}",
                        consecutive_connection_failures,
                        book_ref,
                        self.backoff
                    );
                    tokio::time::sleep(self.backoff).await;
                }
            }
        }
    }

    /// One attempt at an item, with the failure already classified
    async fn attempt(&self, book_ref: BookRef) -> Result<ItemOutcome> {
        match self.process_book(book_ref).await {
            Ok(outcome) => Ok(outcome),
            Err(error) => match classify_failure(&error) {
                FailureClass::Retry => Ok(ItemOutcome::RetryScheduled),
                FailureClass::Skip => Ok(ItemOutcome::Skipped(SkipReason::from_error(&error))),
                FailureClass::Fatal => Err(error),
            },
        }
    }

    /// Fetches, checks, parses, and stores assets for one book
    async fn process_book(&self, book_ref: BookRef) -> Result<ItemOutcome> {
        let base = &self.config.source.base_url;
        let max_redirects = self.config.crawler.max_redirects;

        let url = book_ref.detail_page_url(base);
        let result = fetch(&self.client, &url, max_redirects).await?;

        if self.rule.check(&result) == Existence::NotFound {
            return Ok(ItemOutcome::Skipped(SkipReason::NotFound));
        }

        let page_url = Url::parse(&url)?;
        let parsed = parse_book_page(&result.text(), &page_url)?;

        let text_path = if self.config.output.skip_text {
            None
        } else {
            download_text(
                &self.client,
                base,
                self.rule,
                max_redirects,
                book_ref,
                &parsed.title,
                &self.dest_dir,
            )
            .await?
        };

        let cover_path = match (&parsed.cover_url, self.config.output.skip_covers) {
            (Some(cover_url), false) => {
                match download_cover(&self.client, cover_url, max_redirects, &self.dest_dir).await
                {
                    Ok(path) => Some(path),
                    // A bad status on the cover endpoint is fatal for that
                    // asset only; the record survives without a cover
                    Err(HarvestError::HttpStatus { url, status }) => {
                        tracing::warn!("Cover fetch got HTTP {} for {}", status, url);
                        None
                    }
                    Err(error) => return Err(error),
                }
            }
            _ => None,
        };

        let record = BookRecord {
            id: book_ref.id(),
            title: parsed.title,
            author: parsed.author,
            genres: parsed.genres,
            comments: parsed.comments,
            cover_url: parsed.cover_url,
            text_path: text_path.map(|p| p.to_string_lossy().into_owned()),
            cover_path: cover_path.map(|p| p.to_string_lossy().into_owned()),
        };

        Ok(ItemOutcome::Recorded(record))
    }

    /// Logs a listing-level connectivity failure and sleeps the backoff
    async fn wait_out_backoff(&mut self, error: &HarvestError) {
        self.stats.retries += 1;
        tracing::warn!("Connectivity failure: {}, waiting {:?}", error, self.backoff);
        tokio::time::sleep(self.backoff).await;
    }
}
