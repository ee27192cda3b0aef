//! HTTP transport with redirect-chain capture
//!
//! The remote source signals "book does not exist" by redirecting to a generic
//! landing page instead of returning a 404, so the transport never follows
//! redirects automatically: it walks the chain itself and records every hop.
//! The recorded chain is the input to the existence guard.

use crate::config::CrawlerConfig;
use crate::{HarvestError, TransportError};
use reqwest::header::LOCATION;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// One intermediate response in a redirect chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectHop {
    /// URL that answered with a redirect
    pub url: String,

    /// Redirect status code (301, 302, ...)
    pub status: u16,
}

/// Result of a fetch operation, redirect history included
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Response body bytes
    pub body: Vec<u8>,

    /// URL that produced the final (non-redirect) response
    pub final_url: Url,

    /// Final HTTP status code
    pub status: u16,

    /// Ordered redirect chain traversed before the final response
    pub redirects: Vec<RedirectHop>,
}

impl FetchResult {
    /// Response body decoded as UTF-8 (lossy)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// True if at least one redirect hop was traversed
    pub fn was_redirected(&self) -> bool {
        !self.redirects.is_empty()
    }
}

/// Builds the HTTP client used for all source requests
///
/// Redirects are disabled at the client level; `fetch` follows them manually
/// so the chain can be recorded.
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL, following redirects manually up to `max_redirects` hops
///
/// # Returns
///
/// * `Ok(FetchResult)` - Final response with the full redirect chain
/// * `Err(HarvestError::Transport)` - Network-layer failure, classified
/// * `Err(HarvestError::HttpStatus)` - Final response was 4xx/5xx
pub async fn fetch(
    client: &Client,
    url: &str,
    max_redirects: u32,
) -> Result<FetchResult, HarvestError> {
    let mut current = Url::parse(url)?;
    let mut redirects = Vec::new();

    loop {
        let response = client
            .get(current.clone())
            .send()
            .await
            .map_err(|e| classify_reqwest_error(e, current.as_str()))?;

        let status = response.status();

        if status.is_redirection() {
            if redirects.len() as u32 >= max_redirects {
                return Err(TransportError::RedirectLimit {
                    url: url.to_string(),
                }
                .into());
            }

            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| TransportError::Other {
                    url: current.to_string(),
                    message: format!("redirect {} without Location header", status),
                })?;

            redirects.push(RedirectHop {
                url: current.to_string(),
                status: status.as_u16(),
            });

            // Location may be relative; resolve against the redirecting URL
            current = current.join(location)?;
            continue;
        }

        if status.is_client_error() || status.is_server_error() {
            return Err(HarvestError::HttpStatus {
                url: current.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(e, current.as_str()))?;

        return Ok(FetchResult {
            body: body.to_vec(),
            final_url: current,
            status: status.as_u16(),
            redirects,
        });
    }
}

/// Classifies a reqwest error into the transport taxonomy
fn classify_reqwest_error(error: reqwest::Error, url: &str) -> HarvestError {
    let transport = if error.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        // reqwest folds DNS failures into connect errors; the message is the
        // only way to tell them apart
        let message = format!("{:?}", error);
        if message.contains("dns") || message.contains("resolve") {
            TransportError::Dns {
                url: url.to_string(),
            }
        } else {
            TransportError::ConnectionRefused {
                url: url.to_string(),
            }
        }
    } else {
        TransportError::Other {
            url: url.to_string(),
            message: error.to_string(),
        }
    };
    transport.into()
}
