// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (to stderr, so --json output on stdout stays clean)
// 2. Parse command-line arguments using clap
// 3. Run the audit pipeline from the library
// 4. Write the JSON report and print a table or the JSON
// 5. Exit with proper code (0 = success, 1 = a page scored below --min-score,
//    2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use seo_audit::{run_audit, Report};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

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
    let config = cli.command.audit_config();

    match cli.command {
        Commands::Audit {
            url,
            output,
            json,
            lighthouse,
            deadline,
            min_score,
            ..
        } => {
            let cancel = deadline.map(|secs| cancel_after(Duration::from_secs(secs)));

            let mut report = run_audit(&url, &config, cancel).await?;

            if let Some(path) = lighthouse {
                report = report.with_external_audits(read_external_audits(&path).await?);
            }

            write_report(&report, &output).await?;
            info!(path = %output.display(), "Report written");

            print_results(&report, json)?;

            Ok(exit_code(&report, min_score))
        }
    }
}

// Returns a token that fires after `deadline`
fn cancel_after(deadline: Duration) -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(deadline).await;
        warn!(?deadline, "Deadline reached, stopping crawl");
        trigger.cancel();
    });
    token
}

// Reads a JSON object of URL -> lighthouse-style audit data
async fn read_external_audits(path: &Path) -> Result<HashMap<String, serde_json::Value>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON object of URL -> audit", path.display()))
}

async fn write_report(report: &Report, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(report)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn exit_code(report: &Report, min_score: Option<u8>) -> i32 {
    let Some(min_score) = min_score else {
        return 0;
    };

    match report.summary().lowest_score {
        Some(lowest) if lowest < min_score => 1,
        _ => 0,
    }
}

// Prints the report either as a table or JSON
fn print_results(report: &Report, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_table(report);
    }
    Ok(())
}

// Prints scores and findings as a human-readable table in the terminal
fn print_table(report: &Report) {
    println!("🔍 SEO audit of {} ({})", report.site, report.generated_at);
    println!();
    println!("{:<60} {:<7} {:<40}", "URL", "SCORE", "FIRST ISSUE");
    println!("{}", "=".repeat(107));

    let mut urls: Vec<&String> = report.pages.keys().collect();
    urls.sort();

    for url in urls {
        let record = &report.pages[url];
        let (score, reason) = match &record.score {
            Some(score) => (
                score.score.to_string(),
                score.reasons.first().map(String::as_str).unwrap_or(""),
            ),
            None => ("-".to_string(), ""),
        };

        println!("{:<60} {:<7} {:<40}", truncate(url, 57), score, reason);
    }

    println!();

    if !report.canonical_chains.is_empty() {
        println!("🔗 Canonical chains:");
        for chain in &report.canonical_chains {
            let marker = if chain.unterminated { " (loop)" } else { "" };
            println!("   {}{}", chain.urls.join(" -> "), marker);
        }
        println!();
    }

    if !report.structured_data_issues.is_empty() {
        println!("🧩 Structured data issues:");
        for (url, issues) in &report.structured_data_issues {
            let issues: Vec<String> = issues.iter().map(ToString::to_string).collect();
            println!("   {}: {}", url, issues.join(", "));
        }
        println!();
    }

    let summary = report.summary();
    println!("📊 Summary:");
    println!("   📄 Pages crawled: {}", summary.pages_crawled);
    println!("   ❌ Failed fetches: {}", summary.pages_failed);
    println!("   ⚠️  Pages with issues: {}", summary.pages_with_issues);
    println!("   ⭐ Average score: {:.1}", summary.average_score);
}

// Shortens long URLs so the table stays aligned
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}
