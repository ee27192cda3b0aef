use serde::{Deserialize, Serialize};

/// Durable, fully-parsed representation of one catalog item
///
/// Immutable once appended to a batch. `text_path` is present iff the text
/// asset was not skipped and the fetch succeeded; `cover_path` is present iff
/// a cover URL was found and downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Numeric source identifier
    pub id: u32,

    /// Book title; never empty
    pub title: String,

    /// Author as given in the detail-page heading
    pub author: String,

    /// Genres in page order, duplicates allowed
    pub genres: Vec<String>,

    /// Reader comments in page order
    pub comments: Vec<String>,

    /// Absolute cover image URL, when the page carried one
    pub cover_url: Option<String>,

    /// Local path of the downloaded text file
    pub text_path: Option<String>,

    /// Local path of the downloaded cover image
    pub cover_path: Option<String>,
}
