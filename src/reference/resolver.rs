use crate::reference::BookRef;
use crate::ReferenceError;
use percent_encoding::percent_decode_str;
use url::Url;

/// Resolves a raw input into a canonical book reference
///
/// Accepts either a bare positive integer or a URL pointing at the configured
/// source. URLs are percent-decoded before inspection. A `?id=<n>` query
/// designates a direct text-endpoint reference; a `/b<n>` path segment
/// designates a detail-page reference.
///
/// # Arguments
///
/// * `input` - A bare book id (e.g. "8") or a source URL
/// * `source_host` - Host of the configured source; foreign hosts are rejected
///
/// # Returns
///
/// * `Ok(BookRef)` - The resolved reference
/// * `Err(ReferenceError)` - The input does not name a book on the source
pub fn resolve(input: &str, source_host: &str) -> Result<BookRef, ReferenceError> {
    let input = input.trim();

    // Bare integer input
    if input.chars().all(|c| c.is_ascii_digit()) && !input.is_empty() {
        let id: u32 = input
            .parse()
            .map_err(|_| ReferenceError::InvalidId(input.to_string()))?;
        return BookRef::new(id).ok_or_else(|| ReferenceError::InvalidId(input.to_string()));
    }

    // Percent-decode before parsing so encoded ids and paths are visible
    let decoded = percent_decode_str(input).decode_utf8_lossy();
    let url = Url::parse(&decoded).map_err(|e| ReferenceError::Parse(e.to_string()))?;

    let host = url.host_str().unwrap_or_default();
    if host != source_host {
        return Err(ReferenceError::ForeignHost {
            got: host.to_string(),
            expected: source_host.to_string(),
        });
    }

    // Text-endpoint reference: ?id=<n>
    if let Some((_, value)) = url.query_pairs().find(|(key, _)| key == "id") {
        let id: u32 = value
            .parse()
            .map_err(|_| ReferenceError::InvalidId(value.to_string()))?;
        return BookRef::new(id).ok_or_else(|| ReferenceError::InvalidId(value.to_string()));
    }

    // Detail-page reference: /b<n> or /b<n>/
    if let Some(segment) = url
        .path_segments()
        .and_then(|mut segments| segments.find(|s| !s.is_empty()))
    {
        if let Some(digits) = segment.strip_prefix('b') {
            if let Ok(id) = digits.parse::<u32>() {
                return BookRef::new(id)
                    .ok_or_else(|| ReferenceError::InvalidId(digits.to_string()));
            }
        }
    }

    Err(ReferenceError::NoId(input.to_string()))
}
