// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use seo_audit::config::{
    AuditConfig, DEFAULT_CONCURRENCY, DEFAULT_PAGE_BUDGET, DEFAULT_TIMEOUT_SECS,
};

// This struct represents our entire CLI application
#[derive(Parser, Debug)]
#[command(
    name = "seo-audit",
    version,
    about = "Crawl a website and score every page for on-page SEO health",
    long_about = "seo-audit crawls a website from a starting URL, extracts titles, meta tags, \
                  headings, images, canonical links and structured data from every page, \
                  scores each page and reports site-wide canonical chains and JSON-LD problems."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website and write an SEO audit report
    ///
    /// Example: seo-audit audit https://example.com --max-pages 100
    Audit {
        /// Website URL to start from (e.g., https://example.com)
        url: String,

        /// Maximum number of pages to crawl
        #[arg(long, default_value_t = DEFAULT_PAGE_BUDGET)]
        max_pages: usize,

        /// Number of pages fetched concurrently
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout: u64,

        /// Where to write the JSON report
        #[arg(long, default_value = "reports/report.json")]
        output: PathBuf,

        /// Print the report as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Pre-computed lighthouse results (JSON object: URL -> audit) to merge in
        #[arg(long)]
        lighthouse: Option<PathBuf>,

        /// Stop crawling after this many seconds and report what was fetched
        #[arg(long)]
        deadline: Option<u64>,

        /// Exit with code 1 if any page scores below this value
        #[arg(long)]
        min_score: Option<u8>,
    },
}

impl Commands {
    // Builds the pipeline configuration from the parsed flags
    pub fn audit_config(&self) -> AuditConfig {
        match self {
            Commands::Audit {
                max_pages,
                concurrency,
                timeout,
                ..
            } => AuditConfig {
                page_budget: *max_pages,
                concurrency: *concurrency,
                request_timeout: Duration::from_secs(*timeout),
                ..AuditConfig::default()
            },
        }
    }
}
