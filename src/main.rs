// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Create the output folder (and the log file, if asked for)
// 3. Run the crawl with the HTTP fetcher and the disk store
// 4. Save the visited URLs and print the report
// 5. Exit with proper code (0 = pages crawled, 1 = nothing crawled, 2 = error)
// =============================================================================

mod cli;      // src/cli.rs - command-line parsing
mod crawl;    // src/crawl/ - frontier, workers and coordinator
mod fetcher;  // src/fetcher/ - HTTP fetching and link extraction
mod storage;  // src/storage/ - saving pages and results to disk

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use crawl::{Coordinator, CrawlReport, StopReason};
use fetcher::HttpFetcher;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use storage::DiskStore;
use tracing::{info, Subscriber};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let config = cli.crawl_config()?;
    let folder = cli.output_folder(&config.seed);

    // Startup failures (bad seed, unwritable folder) stop us before any
    // worker is spawned
    let store = DiskStore::create(&folder)
        .with_context(|| format!("cannot prepare output folder {}", folder.display()))?;

    let log_file = if cli.log { Some(store.log_file()?) } else { None };
    init_logging(cli.verbose, log_file.as_deref())?;

    info!(folder = %store.root().display(), "output folder ready");

    let fetcher = HttpFetcher::new(cli.request_timeout()).context("cannot build HTTP client")?;
    let store = Arc::new(store);

    println!("🔍 Crawling: {}", config.seed);
    println!("📊 Max pages: {}, workers: {}", config.max_urls, config.workers);

    let mut coordinator = Coordinator::new(config, Arc::new(fetcher), Arc::clone(&store));
    let report = coordinator.run().await?;

    let result_file = store
        .write_results(&report.visited)
        .await
        .context("cannot save crawl results")?;
    info!(path = %result_file.display(), "saved crawled urls");

    print_report(&report, cli.json)?;

    if report.visited.is_empty() {
        Ok(1)
    } else {
        Ok(0)
    }
}

// Logs always go to stderr; --log also copies them into the log file
//
// RUST_LOG overrides the level picked by --verbose.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let file = match log_file {
        Some(path) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?,
        ),
        None => None,
    };

    build_subscriber(verbose, file).init();
    Ok(())
}

fn build_subscriber(verbose: bool, log_file: Option<File>) -> impl Subscriber + Send + Sync + 'static {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("link_crawler={default_level}")));

    let console = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let file = log_file.map(|file| fmt::layer().with_writer(Arc::new(file)).with_ansi(false));

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
}

// Prints the report either as text or JSON
fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(report)?;
        println!("{}", json_output);
    } else {
        print_statistics(report);
    }
    Ok(())
}

fn print_statistics(report: &CrawlReport) {
    let stats = &report.statistics;

    println!();
    println!("======== Statistics ========");
    println!("Number of workers: {}", stats.workers);
    println!("Number of unique links crawled: {}", stats.visited);
    println!("Number of unique links discovered: {}", stats.discovered);
    println!("Number of links that cannot be crawled: {}", stats.failed);
    if stats.store_failures > 0 {
        println!("Number of pages that could not be saved: {}", stats.store_failures);
    }
    println!("Stopped because: {}", format_stop_reason(report.stop_reason));
    println!("Total time taken: {:.5}s", stats.elapsed.as_secs_f64());
    if let Some(average) = stats.average_per_page() {
        println!("Average time taken per page: {:.5}s", average.as_secs_f64());
    }

    println!();
    for (ix, url) in report.visited.iter().enumerate() {
        println!("{}. {}", ix + 1, url);
    }
}

fn format_stop_reason(reason: StopReason) -> &'static str {
    match reason {
        StopReason::LimitReached => "🎯 page limit reached",
        StopReason::Exhausted => "✅ no more links to follow",
    }
}
