//! Tululu-Harvest: a book catalog downloader
//!
//! This crate implements the acquisition pipeline for a paginated book source:
//! resolving numeric references, fetching detail pages with full redirect-chain
//! capture, detecting missing books via the source's redirect signal, parsing
//! metadata, downloading text and cover assets, and persisting the resulting
//! catalog document.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod reference;

use thiserror::Error;

/// Main error type for Tululu-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Reference error: {0}")]
    Reference(#[from] ReferenceError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Book page structure violated for {url}: {message}")]
    MalformedPage { url: String, message: String },

    #[error("Catalog store error: {0}")]
    Catalog(#[from] catalog::StoreError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Reference-resolution errors (bad ids and foreign or malformed URLs)
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Not a valid book id: {0}")]
    InvalidId(String),

    #[error("Failed to parse reference URL: {0}")]
    Parse(String),

    #[error("URL host {got} does not match source host {expected}")]
    ForeignHost { got: String, expected: String },

    #[error("URL does not encode a book id: {0}")]
    NoId(String),
}

/// Network-layer failures, classified for retry decisions
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection refused for {url}")]
    ConnectionRefused { url: String },

    #[error("DNS resolution failed for {url}")]
    Dns { url: String },

    #[error("Too many redirects from {url}")]
    RedirectLimit { url: String },

    #[error("Request failed for {url}: {message}")]
    Other { url: String, message: String },
}

impl TransportError {
    /// Returns true if this failure is connectivity-related and worth retrying
    /// the same item after a backoff wait.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::ConnectionRefused { .. } | Self::Dns { .. }
        )
    }
}

/// Result type alias for Tululu-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use catalog::{BookRecord, CatalogStore};
pub use config::Config;
pub use crawler::{Existence, FetchResult, Harvester, ItemOutcome, RedirectRule};
pub use reference::{resolve, BookRef};
