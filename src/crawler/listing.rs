//! Catalog listing walker support
//!
//! Listing pages (`{base}/l{genre}/{page}`) enumerate detail-page links in
//! genre categories. The functions here are pure: URL formatting and link
//! extraction. The crawl loop in the coordinator drives the page walk and
//! applies the retry rules.

use scraper::{Html, Selector};
use url::Url;

/// URL of one listing page: `{base}/l{genre}/{page_number}`
pub fn listing_page_url(base: &str, genre: u32, page_number: u32) -> String {
    format!("{}/l{}/{}", base.trim_end_matches('/'), genre, page_number)
}

/// Extracts detail-page links from a listing page, in page order
///
/// Each book row is a `table.d_book`; its first anchor points at the book's
/// detail page. Relative hrefs resolve against the listing page's URL.
pub fn extract_book_links(html: &str, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    let Ok(table_selector) = Selector::parse("table.d_book") else {
        return links;
    };
    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for table in Html::parse_document(html).select(&table_selector) {
        let href = table
            .select(&anchor_selector)
            .next()
            .and_then(|a| a.value().attr("href"));

        if let Some(href) = href {
            if let Ok(absolute) = base_url.join(href) {
                links.push(absolute.to_string());
            }
        }
    }

    links
}
