//! Storefront Crawler main entry point
//!
//! This is the command-line interface for the storefront product crawler.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use storefront_crawler::config::{load_config_with_hash, Config};
use storefront_crawler::output::{
    generate_markdown_summary, print_statistics, print_stored_results, write_products_csv,
    CrawlStatistics,
};
use storefront_crawler::progress::CrawlEvent;
use storefront_crawler::schedule::PeriodicCrawl;
use storefront_crawler::storage::{default_key, ResultStore, SqliteResultStore};
use storefront_crawler::{Crawler, ScrapeResult};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Storefront Crawler: a bounded, polite product catalog crawler
///
/// Crawls an online store within its domain, extracts products and store
/// details, and stores the aggregated result. robots.txt, per-host request
/// spacing and page/product caps are respected.
#[derive(Parser, Debug)]
#[command(name = "storefront-crawler")]
#[command(version)]
#[command(about = "A bounded, polite product catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Store URL to crawl
    #[arg(value_name = "SEED_URL", required_unless_present_any = ["list", "show", "dry_run"])]
    seed_url: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Export products to this CSV file (overrides the config)
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Write a markdown summary to this file (overrides the config)
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,

    /// Re-crawl every N seconds until interrupted
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    every: Option<u64>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["list", "show", "every"])]
    dry_run: bool,

    /// List stored results and exit
    #[arg(long, conflicts_with_all = ["show", "every"])]
    list: bool,

    /// Print the stored result for KEY as JSON and exit
    #[arg(long, value_name = "KEY", conflicts_with = "every")]
    show: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, cli.seed_url.as_deref());
        return Ok(());
    }
    if cli.list {
        return handle_list(&config);
    }
    if let Some(key) = &cli.show {
        return handle_show(&config, key);
    }

    let Some(seed_url) = cli.seed_url.clone() else {
        bail!("A seed URL is required");
    };

    let token = CancellationToken::new();
    spawn_interrupt_handler(token.clone());

    let crawler = Crawler::from_config(&config)
        .context("Failed to build crawler")?
        .with_cancellation(token.clone());
    spawn_progress_logger(&crawler);

    let job = Arc::new(CrawlJob {
        crawler,
        seed_url,
        config,
        config_hash,
        csv: cli.csv.clone(),
        summary: cli.summary.clone(),
        quiet: cli.quiet,
    });

    match cli.every {
        Some(secs) => {
            tracing::info!("Re-crawling {} every {}s (Ctrl-C to stop)", job.seed_url, secs);
            let schedule = PeriodicCrawl::spawn(Duration::from_secs(secs), token.clone(), {
                let job = Arc::clone(&job);
                move || {
                    let job = Arc::clone(&job);
                    async move {
                        if let Err(e) = job.run().await {
                            tracing::error!("Scheduled crawl failed: {:#}", e);
                        }
                    }
                }
            });

            token.cancelled().await;
            schedule.join().await;
            Ok(())
        }
        None => {
            let result = job.run().await?;
            if !result.success {
                bail!(result.error.unwrap_or_else(|| "Crawl failed".to_string()));
            }
            Ok(())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("storefront_crawler=info,warn"),
            1 => EnvFilter::new("storefront_crawler=debug,info"),
            2 => EnvFilter::new("storefront_crawler=trace,debug"),
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

fn spawn_interrupt_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, stopping crawl");
            token.cancel();
        }
    });
}

fn spawn_progress_logger(crawler: &Crawler) {
    let mut events = crawler.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(CrawlEvent::Progress {
                    pages_visited,
                    products_found,
                    pending,
                }) => {
                    tracing::debug!(
                        "{} pages visited, {} products, {} pending",
                        pages_visited,
                        products_found,
                        pending
                    );
                }
                Ok(CrawlEvent::PageFailed { url, reason }) => {
                    tracing::debug!("Page failed: {} ({})", url, reason);
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::trace!("Progress logger lagged by {} events", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// One crawl plus everything done with its result
struct CrawlJob {
    crawler: Crawler,
    seed_url: String,
    config: Config,
    config_hash: String,
    csv: Option<PathBuf>,
    summary: Option<PathBuf>,
    quiet: bool,
}

impl CrawlJob {
    async fn run(&self) -> anyhow::Result<ScrapeResult> {
        let result = self.crawler.run(&self.seed_url).await;

        let key = default_key(&self.seed_url);
        let mut store = SqliteResultStore::new(Path::new(&self.config.output.database_path))
            .context("Failed to open result store")?;
        store
            .save(&key, &result, Some(&self.config_hash))
            .context("Failed to store result")?;
        tracing::info!(
            "Result stored under '{}' in {}",
            key,
            self.config.output.database_path
        );

        if result.success {
            let csv_path = self
                .csv
                .clone()
                .or_else(|| self.config.output.csv_path.as_ref().map(PathBuf::from));
            if let Some(path) = csv_path {
                write_products_csv(&result.products, &path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
        }

        let summary_path = self
            .summary
            .clone()
            .or_else(|| self.config.output.summary_path.as_ref().map(PathBuf::from));
        if let Some(path) = summary_path {
            generate_markdown_summary(&result, &path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Summary written to {}", path.display());
        }

        if !self.quiet {
            print_statistics(&CrawlStatistics::from_result(&result));
        }

        Ok(result)
    }
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, seed_url: Option<&str>) {
    println!("=== Storefront Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!(
        "  Minimum time between requests: {}ms",
        config.crawler.minimum_time_between_requests
    );
    match config.crawler.deadline_secs {
        Some(secs) => println!("  Deadline: {}s", secs),
        None => println!("  Deadline: none"),
    }
    println!("  Respect robots.txt: {}", config.crawler.respect_robots);

    println!("\nScrape Options:");
    println!("  Recursive: {}", config.scrape.recursive);
    println!("  Max depth: {}", config.scrape.max_depth);
    println!("  Include product pages: {}", config.scrape.include_product_pages);
    println!("  Max products: {}", config.scrape.max_products);
    println!("  Max pages to visit: {}", config.scrape.max_pages_to_visit);
    println!("  Include subdomains: {}", config.scrape.include_subdomains);
    println!("  Detect categories: {}", config.scrape.detect_categories);
    println!(
        "  Auth: {}",
        if config.scrape.auth.is_some() { "configured" } else { "none" }
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    if let Some(path) = &config.output.summary_path {
        println!("  Summary: {}", path);
    }
    if let Some(path) = &config.output.csv_path {
        println!("  CSV: {}", path);
    }

    println!("\n✓ Configuration is valid");
    if let Some(seed) = seed_url {
        println!("✓ Would crawl {} (stored as '{}')", seed, default_key(seed));
    }
}

/// Handles the --list mode: shows stored results
fn handle_list(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let store = SqliteResultStore::new(Path::new(&config.output.database_path))
        .context("Failed to open result store")?;
    let results = store.list()?;
    print_stored_results(&results);

    Ok(())
}

/// Handles the --show mode: prints one stored result as JSON
fn handle_show(config: &Config, key: &str) -> anyhow::Result<()> {
    let store = SqliteResultStore::new(Path::new(&config.output.database_path))
        .context("Failed to open result store")?;

    let Some(result) = store.load(key)? else {
        bail!("No stored result under '{}'", key);
    };
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
