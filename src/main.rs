//! Tululu-Harvest main entry point
//!
//! Command-line interface for the book catalog downloader.

use anyhow::bail;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tululu_harvest::catalog::CatalogStore;
use tululu_harvest::config::load_config_with_hash;
use tululu_harvest::crawler::Harvester;

/// Tululu-Harvest: a book catalog downloader
///
/// Downloads book metadata, texts, and covers from a numeric-id book source,
/// either over a linear id range or by walking genre listing pages, and
/// aggregates the results into a JSON catalog document.
#[derive(Parser, Debug)]
#[command(name = "tululu-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A book catalog downloader", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// First book id to download (id-range mode)
    #[arg(long, default_value_t = 1)]
    start_id: u32,

    /// Last book id to download (id-range mode)
    #[arg(long, default_value_t = 10)]
    end_id: u32,

    /// Walk this genre's listing pages instead of an id range
    #[arg(long)]
    genre: Option<u32>,

    /// First listing page to walk (listing mode)
    #[arg(long, default_value_t = 1)]
    start_page: u32,

    /// Last listing page to walk (listing mode)
    #[arg(long, default_value_t = 702)]
    end_page: u32,

    /// Override the destination directory from the config
    #[arg(long)]
    dest_folder: Option<String>,

    /// Override the full path of the catalog JSON document
    #[arg(long)]
    catalog_path: Option<PathBuf>,

    /// Don't download book texts
    #[arg(long)]
    skip_txt: bool,

    /// Don't download cover images
    #[arg(long)]
    skip_imgs: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be downloaded without downloading
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // Apply command-line overrides
    if let Some(dest_folder) = &cli.dest_folder {
        config.output.dest_dir = dest_folder.clone();
    }
    if cli.skip_txt {
        config.output.skip_text = true;
    }
    if cli.skip_imgs {
        config.output.skip_covers = true;
    }

    // Validate bounds before touching the network
    if cli.genre.is_some() {
        if cli.start_page > cli.end_page {
            bail!(
                "start-page {} exceeds end-page {}",
                cli.start_page,
                cli.end_page
            );
        }
    } else if cli.start_id > cli.end_id {
        bail!("start-id {} exceeds end-id {}", cli.start_id, cli.end_id);
    }

    if cli.dry_run {
        handle_dry_run(&cli, &config);
        return Ok(());
    }

    let catalog_path = cli.catalog_path.clone().unwrap_or_else(|| {
        PathBuf::from(&config.output.dest_dir).join(&config.output.catalog_file)
    });

    // Run the harvest
    let mut harvester = Harvester::new(config)?;
    let batch = match cli.genre {
        Some(genre) => {
            tracing::info!(
                "Walking genre l{} listing pages {}..={}",
                genre,
                cli.start_page,
                cli.end_page
            );
            harvester
                .run_listing(genre, cli.start_page, cli.end_page)
                .await?
        }
        None => {
            tracing::info!("Downloading ids {}..={}", cli.start_id, cli.end_id);
            harvester.run_range(cli.start_id, cli.end_id).await?
        }
    };

    // Persist the catalog document
    let store = CatalogStore::new(&catalog_path);
    store.save(&batch)?;

    let stats = harvester.stats();
    tracing::info!(
        "Harvest complete: {} recorded, {} skipped, {} retries; catalog at {}",
        stats.recorded,
        stats.skipped,
        stats.retries,
        catalog_path.display()
    );

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tululu_harvest=info,warn"),
            1 => EnvFilter::new("tululu_harvest=debug,info"),
            2 => EnvFilter::new("tululu_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the planned run
fn handle_dry_run(cli: &Cli, config: &tululu_harvest::config::Config) {
    println!("=== Tululu-Harvest Dry Run ===\n");

    println!("Source:");
    println!("  Base URL: {}", config.source.base_url);

    println!("\nCrawler:");
    println!("  Backoff: {}ms", config.crawler.backoff_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Max redirects: {}", config.crawler.max_redirects);

    println!("\nOutput:");
    println!("  Destination: {}", config.output.dest_dir);
    println!("  Catalog file: {}", config.output.catalog_file);
    println!("  Skip texts: {}", config.output.skip_text);
    println!("  Skip covers: {}", config.output.skip_covers);

    match cli.genre {
        Some(genre) => println!(
            "\n✓ Would walk genre l{} listing pages {}..={}",
            genre, cli.start_page, cli.end_page
        ),
        None => println!(
            "\n✓ Would download book ids {}..={}",
            cli.start_id, cli.end_id
        ),
    }
}
