//! Book reference handling
//!
//! A `BookRef` is a resolved, validated reference to a single catalog item by
//! numeric identifier. References come either from bare integers or from URLs
//! on the configured source; one reference maps to exactly one detail page.

mod resolver;

pub use resolver::resolve;

/// Resolved reference to a single book by numeric identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BookRef {
    id: u32,
}

impl BookRef {
    /// Creates a reference for the given id; ids start at 1.
    pub fn new(id: u32) -> Option<Self> {
        if id >= 1 {
            Some(Self { id })
        } else {
            None
        }
    }

    /// The numeric book identifier
    pub fn id(&self) -> u32 {
        self.id
    }

    /// URL of the book's detail page: `{base}/b{id}/`
    pub fn detail_page_url(&self, base: &str) -> String {
        format!("{}/b{}/", base.trim_end_matches('/'), self.id)
    }

    /// URL of the book's text endpoint: `{base}/txt.php?id={id}`
    pub fn text_url(&self, base: &str) -> String {
        format!("{}/txt.php?id={}", base.trim_end_matches('/'), self.id)
    }
}

impl std::fmt::Display for BookRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "book {}", self.id)
    }
}
