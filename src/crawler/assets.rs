//! Asset downloader for book texts and cover images
//!
//! Writes fetched bytes under the destination directory (`books/` for texts,
//! `covers/` for images), creating the subdirectory if absent. Downloads are
//! idempotent: re-fetching silently overwrites the file on disk.

use crate::crawler::existence::{Existence, RedirectRule};
use crate::crawler::fetcher::fetch;
use crate::reference::BookRef;
use percent_encoding::percent_decode_str;
use reqwest::Client;
use std::path::{Path, PathBuf};
use url::Url;

/// Subdirectory for text files
const BOOKS_DIR: &str = "books";

/// Subdirectory for cover images
const COVERS_DIR: &str = "covers";

/// Downloads a book's plain-text body
///
/// The text endpoint uses the same existence-by-redirect signal as the detail
/// page, queried independently: a `NotFound` verdict returns `Ok(None)` and is
/// treated as a skip, not an error. Transport errors propagate unchanged.
///
/// # Returns
///
/// * `Ok(Some(path))` - Text written to `{dest}/books/{sanitized-title}.txt`
/// * `Ok(None)` - The source has no text for this book
/// * `Err(HarvestError)` - Transport or filesystem failure
pub async fn download_text(
    client: &Client,
    base: &str,
    rule: RedirectRule,
    max_redirects: u32,
    book_ref: BookRef,
    title: &str,
    dest_dir: &Path,
) -> crate::Result<Option<PathBuf>> {
    let url = book_ref.text_url(base);
    let result = fetch(client, &url, max_redirects).await?;

    if rule.check(&result) == Existence::NotFound {
        tracing::debug!("No text on source for {}", book_ref);
        return Ok(None);
    }

    let folder = dest_dir.join(BOOKS_DIR);
    tokio::fs::create_dir_all(&folder).await?;

    let path = folder.join(format!("{}.txt", sanitize_filename(title)));
    tokio::fs::write(&path, &result.body).await?;

    Ok(Some(path))
}

/// Downloads a cover image to `{dest}/covers/{image-name}.{ext}`
///
/// The image name is taken from the cover URL's last path segment. A 4xx/5xx
/// response is an error for this asset; existence checking does not apply to
/// plain byte fetches.
pub async fn download_cover(
    client: &Client,
    cover_url: &str,
    max_redirects: u32,
    dest_dir: &Path,
) -> crate::Result<PathBuf> {
    let result = fetch(client, cover_url, max_redirects).await?;

    let folder = dest_dir.join(COVERS_DIR);
    tokio::fs::create_dir_all(&folder).await?;

    let path = folder.join(cover_file_name(cover_url));
    tokio::fs::write(&path, &result.body).await?;

    Ok(path)
}

/// Derives a local file name from a cover URL's path
fn cover_file_name(cover_url: &str) -> String {
    let segment = Url::parse(cover_url)
        .ok()
        .and_then(|url| {
            url.path_segments().and_then(|segments| {
                segments
                    .filter(|s| !s.is_empty())
                    .last()
                    .map(|s| s.to_string())
            })
        })
        .unwrap_or_default();

    let decoded = percent_decode_str(&segment).decode_utf8_lossy().into_owned();
    let name = sanitize_filename(&decoded);
    if name.is_empty() {
        "cover".to_string()
    } else {
        name
    }
}

/// Strips characters that are invalid in file names
///
/// Keeps the name readable: forbidden characters are dropped, surrounding
/// whitespace and trailing dots are trimmed.
pub fn sanitize_filename(name: &str) -> String {
    const FORBIDDEN: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

    name.chars()
        .filter(|c| !FORBIDDEN.contains(c) && !c.is_control())
        .collect::<String>()
        .trim()
        .trim_end_matches('.')
        .to_string()
}
