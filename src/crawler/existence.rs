//! Existence guard: item-not-found detection from redirect metadata
//!
//! The source answers requests for missing books with a redirect to a generic
//! landing page rather than a 404. The predicate for "does this book exist"
//! therefore lives here as a single swappable policy instead of inline
//! conditionals at fetch call sites.

use crate::crawler::fetcher::FetchResult;

/// Whether the requested item exists on the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Existence {
    Exists,
    NotFound,
}

/// Redirect-based existence policy
///
/// The shipped configuration is `AnyRedirect`: any non-empty redirect chain
/// means the item does not exist. It is applied identically to detail pages
/// and text endpoints. The stricter `TwoHopLanding` variant matches the
/// two-hop pattern the source emits for detail pages and is kept for
/// comparison, not used by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectRule {
    /// Any redirect hop at all means the item is missing
    #[default]
    AnyRedirect,

    /// Exactly one interstitial hop followed by a 302 to the landing page
    TwoHopLanding,
}

impl RedirectRule {
    /// Applies the policy to a fetch result. Never errors for a normal
    /// non-redirected response.
    pub fn check(&self, fetch: &FetchResult) -> Existence {
        match self {
            Self::AnyRedirect => {
                if fetch.redirects.is_empty() {
                    Existence::Exists
                } else {
                    Existence::NotFound
                }
            }
            Self::TwoHopLanding => {
                if fetch.redirects.len() == 2 && fetch.redirects[1].status == 302 {
                    Existence::NotFound
                } else {
                    Existence::Exists
                }
            }
        }
    }
}
