use serde::Deserialize;
use url::Url;

/// Main configuration structure for Tululu-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
}

/// Remote source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the book source (e.g., "https://tululu.org")
    #[serde(rename = "base-url")]
    pub base_url: String,
}

impl SourceConfig {
    /// Returns the host of the configured base URL.
    ///
    /// Validation guarantees the base URL parses and has a host, so this
    /// returns an empty string only for configs that bypassed validation.
    pub fn host(&self) -> String {
        Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_default()
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Backoff wait after a connectivity failure (milliseconds)
    #[serde(rename = "backoff-ms", default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Maximum redirect hops to follow before giving up
    #[serde(rename = "max-redirects", default = "default_max_redirects")]
    pub max_redirects: u32,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Destination directory for books, covers, and the catalog document
    #[serde(rename = "dest-dir")]
    pub dest_dir: String,

    /// Name of the catalog JSON document inside the destination directory
    #[serde(rename = "catalog-file", default = "default_catalog_file")]
    pub catalog_file: String,

    /// Skip downloading book text files
    #[serde(rename = "skip-text", default)]
    pub skip_text: bool,

    /// Skip downloading cover images
    #[serde(rename = "skip-covers", default)]
    pub skip_covers: bool,
}

fn default_backoff_ms() -> u64 {
    30_000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_catalog_file() -> String {
    "books.json".to_string()
}

fn default_max_redirects() -> u32 {
    10
}
