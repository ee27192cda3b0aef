//! Book detail-page parser
//!
//! Extracts title, author, genres, comments, and the cover image URL from a
//! detail page. The heading carries title and author in one element separated
//! by `" :: "`; a heading that does not split into exactly two parts means the
//! page structure drifted and the whole book is rejected.

use crate::HarvestError;
use scraper::{Html, Selector};
use url::Url;

/// Separator between title and author in the detail-page heading
const TITLE_SEPARATOR: &str = " :: ";

/// Metadata extracted from one book detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBook {
    pub title: String,
    pub author: String,

    /// Genre strings in page order, duplicates allowed
    pub genres: Vec<String>,

    /// Comment strings in page order; empty when the page has no comments
    pub comments: Vec<String>,

    /// Absolute cover image URL, absent when the page carries no cover element
    pub cover_url: Option<String>,
}

/// Parses a book detail page
///
/// # Arguments
///
/// * `html` - The detail page markup
/// * `page_url` - The page's own URL; relative cover references resolve
///   against it because covers live under per-book paths
///
/// # Returns
///
/// * `Ok(ParsedBook)` - Extracted metadata
/// * `Err(HarvestError::MalformedPage)` - Structure assumptions violated
pub fn parse_book_page(html: &str, page_url: &Url) -> Result<ParsedBook, HarvestError> {
    let document = Html::parse_document(html);

    let (title, author) = extract_title_author(&document, page_url)?;
    let genres = extract_genres(&document);
    let comments = extract_comments(&document);
    let cover_url = extract_cover_url(&document, page_url);

    Ok(ParsedBook {
        title,
        author,
        genres,
        comments,
        cover_url,
    })
}

/// Extracts title and author from the heading element
fn extract_title_author(
    document: &Html,
    page_url: &Url,
) -> Result<(String, String), HarvestError> {
    let heading = Selector::parse("h1")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .map(|element| element.text().collect::<String>())
        })
        .ok_or_else(|| malformed(page_url, "missing h1 heading"))?;

    let parts: Vec<&str> = heading.split(TITLE_SEPARATOR).collect();
    if parts.len() != 2 {
        return Err(malformed(
            page_url,
            &format!(
                "heading does not split into title and author: '{}'",
                heading.trim()
            ),
        ));
    }

    let title = parts[0].trim().to_string();
    let author = parts[1].trim().to_string();

    if title.is_empty() {
        return Err(malformed(page_url, "empty title in heading"));
    }

    Ok((title, author))
}

/// Extracts the genre list from the inline genre region
fn extract_genres(document: &Html) -> Vec<String> {
    let mut genres = Vec::new();

    if let Ok(selector) = Selector::parse("span.d_book a") {
        for element in document.select(&selector) {
            let genre = element.text().collect::<String>().trim().to_string();
            if !genre.is_empty() {
                genres.push(genre);
            }
        }
    }

    genres
}

/// Extracts comment texts; zero comment blocks yields an empty list
fn extract_comments(document: &Html) -> Vec<String> {
    let mut comments = Vec::new();

    if let Ok(selector) = Selector::parse(".texts .black") {
        for element in document.select(&selector) {
            let comment = element.text().collect::<String>().trim().to_string();
            if !comment.is_empty() {
                comments.push(comment);
            }
        }
    }

    comments
}

/// Resolves the cover image URL against the detail page's own URL
///
/// A missing cover element is not a failure; the cover is simply absent.
fn extract_cover_url(document: &Html, page_url: &Url) -> Option<String> {
    let selector = Selector::parse(".bookimage img[src]").ok()?;
    let src = document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("src"))?;

    page_url.join(src).ok().map(|url| url.to_string())
}

fn malformed(page_url: &Url, message: &str) -> HarvestError {
    HarvestError::MalformedPage {
        url: page_url.to_string(),
        message: message.to_string(),
    }
}
