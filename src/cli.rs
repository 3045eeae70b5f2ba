// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API: the struct below IS the CLI definition, and
// clap generates the parsing, --help and --version for us.
//
// Everything here is turned into a `CrawlConfig` (what the crawler needs)
// plus a few output options that only main.rs cares about.
// =============================================================================

use crate::crawl::{CrawlConfig, CrawlError, DEFAULT_MAX_URLS, DEFAULT_WORKERS};
use crate::fetcher::{normalize_seed, DEFAULT_TIMEOUT};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Parser, Debug)]
#[command(
    name = "link-crawler",
    version,
    about = "Crawl a website breadth-first and list the unique pages found",
    long_about = "link-crawler downloads the page at the starting URL, follows every <a href> it finds, \
                  and keeps going with a pool of parallel workers until it has visited the requested \
                  number of unique pages or run out of links."
)]
pub struct Cli {
    /// Starting URL (https:// is added when no scheme is given)
    ///
    /// Example: link-crawler -u news.ycombinator.com
    #[arg(short = 'u', long = "url")]
    pub url: String,

    /// Number of unique pages to crawl
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_URLS)]
    pub max_urls: usize,

    /// Number of parallel workers
    #[arg(short = 't', long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Folder for downloaded pages and results (default: the URL's host name)
    #[arg(short = 'f', long)]
    pub folder: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Show debug messages while crawling
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Also write log messages to <folder>/log/output.log
    #[arg(short = 'l', long)]
    pub log: bool,

    /// Output the report in JSON format instead of text
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    // Builds the crawl configuration, normalizing the seed URL
    pub fn crawl_config(&self) -> Result<CrawlConfig, CrawlError> {
        let seed = normalize_seed(&self.url).map_err(|source| CrawlError::InvalidSeed {
            url: self.url.clone(),
            source,
        })?;

        Ok(CrawlConfig::new(seed)
            .with_max_urls(self.max_urls)
            .with_workers(self.workers))
    }

    // Where output goes: --folder if given, otherwise a folder named after the host
    pub fn output_folder(&self, seed: &Url) -> PathBuf {
        match &self.folder {
            Some(folder) => folder.clone(),
            None => PathBuf::from(seed.host_str().unwrap_or("crawl")),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
