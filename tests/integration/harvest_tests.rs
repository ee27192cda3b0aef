//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the book source and exercise the
//! full acquisition pipeline end-to-end: existence detection via redirects,
//! page parsing, asset download, the retry/backoff loop, and catalog
//! persistence.

use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tululu_harvest::catalog::CatalogStore;
use tululu_harvest::config::{Config, CrawlerConfig, OutputConfig, SourceConfig};
use tululu_harvest::crawler::Harvester;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str, dest_dir: &Path) -> Config {
    Config {
        source: SourceConfig {
            base_url: base_url.to_string(),
        },
        crawler: CrawlerConfig {
            backoff_ms: 10, // Very short for testing
            request_timeout_secs: 1,
            connect_timeout_secs: 1,
            max_redirects: 10,
        },
        output: OutputConfig {
            dest_dir: dest_dir.to_string_lossy().into_owned(),
            catalog_file: "books.json".to_string(),
            skip_text: false,
            skip_covers: false,
        },
    }
}

/// Detail-page markup in the source's shape
fn detail_page(title: &str, author: &str, cover_src: &str) -> String {
    format!(
        r##"<html><body>
        <h1>{} :: {}</h1>
        <div class="bookimage"><a href="#"><img src="{}" /></a></div>
        <span class="d_book">Genre: <a href="/l55/">Thriller</a></span>
        <div class="texts"><span class="black">Great book</span></div>
        <div class="texts"><span class="black">Could not put it down</span></div>
        </body></html>"##,
        title, author, cover_src
    )
}

/// Mounts a complete existing book: detail page, text endpoint, cover image
async fn mount_book(server: &MockServer, id: u32, title: &str, author: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/b{}/", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page(title, author, &format!("/shots/{}.jpg", id))),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .and(query_param("id", id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("Text of book {}", id)))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/shots/{}.jpg", id)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
        .mount(server)
        .await;
}

/// Mounts a missing book: the source redirects to its generic landing page
async fn mount_missing_book(server: &MockServer, id: u32) {
    Mock::given(method("GET"))
        .and(path(format!("/b{}/", id)))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/error/"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/error/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("nothing here"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_end_to_end_range_with_missing_book() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();

    // ids 1 and 3 exist, id 2 is missing
    mount_book(&server, 1, "Alibi", "J. Doe").await;
    mount_missing_book(&server, 2).await;
    mount_book(&server, 3, "Encore", "A. Writer").await;

    let config = create_test_config(&server.uri(), dest.path());
    let mut harvester = Harvester::new(config).expect("Failed to create harvester");

    let batch = harvester.run_range(1, 3).await.expect("Harvest failed");

    // Exactly two records, in order [1, 3]
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].id, 1);
    assert_eq!(batch[1].id, 3);
    assert_eq!(batch[0].title, "Alibi");
    assert_eq!(batch[0].author, "J. Doe");
    assert_eq!(batch[0].genres, vec!["Thriller".to_string()]);
    assert_eq!(batch[0].comments.len(), 2);

    // Assets landed under the destination tree
    let text_path = batch[0].text_path.as_deref().expect("text path missing");
    assert!(Path::new(text_path).exists());
    assert!(text_path.ends_with("Alibi.txt"));

    let cover_path = batch[0].cover_path.as_deref().expect("cover path missing");
    assert!(Path::new(cover_path).exists());
    assert!(cover_path.ends_with("1.jpg"));

    let stats = harvester.stats();
    assert_eq!(stats.recorded, 2);
    assert_eq!(stats.skipped, 1);

    // Persist and read back: same count, same order, same values
    let store = CatalogStore::new(dest.path().join("books.json"));
    store.save(&batch).expect("Failed to save catalog");
    let loaded = store.load().expect("Failed to load catalog");
    assert_eq!(loaded, batch);
}

#[tokio::test]
async fn test_retry_after_transient_failures() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();

    // The first two requests for the detail page stall past the client
    // timeout; the third succeeds. Mount order matters: the stalling mock is
    // consulted first until its cap is spent.
    Mock::given(method("GET"))
        .and(path("/b1/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page("Alibi", "J. Doe", "/shots/1.jpg"))
                .set_delay(Duration::from_secs(3)),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;

    mount_book(&server, 1, "Alibi", "J. Doe").await;

    let config = create_test_config(&server.uri(), dest.path());
    let mut harvester = Harvester::new(config).expect("Failed to create harvester");

    let batch = harvester.run_range(1, 1).await.expect("Harvest failed");

    // Exactly one record for the item, produced on the third attempt
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].id, 1);

    let stats = harvester.stats();
    assert_eq!(stats.retries, 2, "expected exactly two backoff waits");
    assert_eq!(stats.recorded, 1);
    assert_eq!(stats.skipped, 0);
}

#[tokio::test]
async fn test_retried_item_keeps_its_batch_position() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();

    mount_book(&server, 1, "First", "A").await;

    // id 2 times out once, then succeeds
    Mock::given(method("GET"))
        .and(path("/b2/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page("Second", "B", "/shots/2.jpg"))
                .set_delay(Duration::from_secs(3)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_book(&server, 2, "Second", "B").await;

    mount_book(&server, 3, "Third", "C").await;

    let config = create_test_config(&server.uri(), dest.path());
    let mut harvester = Harvester::new(config).expect("Failed to create harvester");

    let batch = harvester.run_range(1, 3).await.expect("Harvest failed");

    // The retried item commits in original reference order
    let ids: Vec<u32> = batch.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(harvester.stats().retries, 1);
}

#[tokio::test]
async fn test_not_found_skips_without_backoff() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();

    mount_missing_book(&server, 1).await;
    mount_book(&server, 2, "Encore", "A. Writer").await;

    let config = create_test_config(&server.uri(), dest.path());
    let mut harvester = Harvester::new(config).expect("Failed to create harvester");

    let batch = harvester.run_range(1, 2).await.expect("Harvest failed");

    // The missing book never appears; the next item is processed immediately
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].id, 2);

    let stats = harvester.stats();
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.retries, 0, "a missing book must not trigger backoff");
}

#[tokio::test]
async fn test_malformed_page_is_skipped() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();

    // Heading without the " :: " separator
    Mock::given(method("GET"))
        .and(path("/b1/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><h1>Alibi</h1></html>"))
        .mount(&server)
        .await;

    mount_book(&server, 2, "Encore", "A. Writer").await;

    let config = create_test_config(&server.uri(), dest.path());
    let mut harvester = Harvester::new(config).expect("Failed to create harvester");

    let batch = harvester.run_range(1, 2).await.expect("Harvest failed");

    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].id, 2);
    assert_eq!(harvester.stats().skipped, 1);
}

#[tokio::test]
async fn test_missing_text_is_a_skip_not_an_error() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();

    // Detail page exists, but the text endpoint redirects to the landing page
    Mock::given(method("GET"))
        .and(path("/b1/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page("Alibi", "J. Doe", "/shots/1.jpg")),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .and(query_param("id", "1"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/error/"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/error/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("nothing here"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/shots/1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), dest.path());
    let mut harvester = Harvester::new(config).expect("Failed to create harvester");

    let batch = harvester.run_range(1, 1).await.expect("Harvest failed");

    // The record survives, just without a text path
    assert_eq!(batch.len(), 1);
    assert!(batch[0].text_path.is_none());
    assert!(batch[0].cover_path.is_some());
}

#[tokio::test]
async fn test_skip_flags_suppress_asset_downloads() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();

    // Only the detail page is mounted; asset endpoints would 404 if called
    Mock::given(method("GET"))
        .and(path("/b1/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page("Alibi", "J. Doe", "/shots/1.jpg")),
        )
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri(), dest.path());
    config.output.skip_text = true;
    config.output.skip_covers = true;

    let mut harvester = Harvester::new(config).expect("Failed to create harvester");
    let batch = harvester.run_range(1, 1).await.expect("Harvest failed");

    assert_eq!(batch.len(), 1);
    assert!(batch[0].text_path.is_none());
    assert!(batch[0].cover_path.is_none());
    // The cover URL is still recorded even when the download is skipped
    assert!(batch[0].cover_url.is_some());
}

#[tokio::test]
async fn test_listing_walk_yields_links_in_page_order() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();

    // Listing page 1 links to books 3 and 1, in that order
    Mock::given(method("GET"))
        .and(path("/l55/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
            <table class="d_book"><tr><td><a href="/b3/">Three</a></td></tr></table>
            <table class="d_book"><tr><td><a href="/b1/">One</a></td></tr></table>
            </body></html>"#,
        ))
        .mount(&server)
        .await;

    // Listing page 2 is absent (redirect signal); the walk skips past it
    Mock::given(method("GET"))
        .and(path("/l55/2"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/error/"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/error/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("nothing here"))
        .mount(&server)
        .await;

    mount_book(&server, 1, "One", "A").await;
    mount_book(&server, 3, "Three", "C").await;

    let config = create_test_config(&server.uri(), dest.path());
    let mut harvester = Harvester::new(config).expect("Failed to create harvester");

    let batch = harvester
        .run_listing(55, 1, 2)
        .await
        .expect("Harvest failed");

    // Link order on the page, not id order
    let ids: Vec<u32> = batch.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![3, 1]);
}

#[tokio::test]
async fn test_hard_http_error_is_a_skip() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/b1/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    mount_book(&server, 2, "Encore", "A. Writer").await;

    let config = create_test_config(&server.uri(), dest.path());
    let mut harvester = Harvester::new(config).expect("Failed to create harvester");

    let batch = harvester.run_range(1, 2).await.expect("Harvest failed");

    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].id, 2);
    assert_eq!(harvester.stats().retries, 0, "5xx must not trigger backoff");
}

#[tokio::test]
async fn test_cover_failure_is_fatal_for_that_asset_only() {
    let server = MockServer::start().await;
    let dest = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/b1/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page("Alibi", "J. Doe", "/shots/1.jpg")),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .and(query_param("id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Text of book 1"))
        .mount(&server)
        .await;

    // Cover endpoint is broken
    Mock::given(method("GET"))
        .and(path("/shots/1.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), dest.path());
    let mut harvester = Harvester::new(config).expect("Failed to create harvester");

    let batch = harvester.run_range(1, 1).await.expect("Harvest failed");

    // The record survives with its text, just without a cover
    assert_eq!(batch.len(), 1);
    assert!(batch[0].text_path.is_some());
    assert!(batch[0].cover_path.is_none());
}
