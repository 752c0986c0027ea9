// src/main.rs
// =============================================================================
// Entry point of the dirhound CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Install the tracing subscriber (RUST_LOG wins over --verbose)
// 3. Build the ScanConfig: JSON file (if any), then the flags on top
// 4. Load the wordlist and run the scan; Ctrl-C stops it gracefully
// 5. Print the results, optionally save a report
// 6. Exit with a meaningful code (0 = nothing found, 1 = paths found, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use dirhound::config::ScanConfig;
use dirhound::dictionary::read_wordlist_file;
use dirhound::report::render_table;
use dirhound::Scanner;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let base = match &cli.config {
        Some(path) => load_config(path)?,
        None => ScanConfig::default(),
    };
    let config = cli.apply(base);

    let words = read_wordlist_file(&cli.wordlist)
        .with_context(|| format!("Failed to read wordlist {}", cli.wordlist.display()))?;
    info!(words = words.len(), wordlist = %cli.wordlist.display(), "wordlist loaded");

    let scanner = Arc::new(Scanner::new(config, words).context("Failed to set up the scanner")?);

    // Ctrl-C cancels the session; the scan then drains and returns what it has
    let stopper = {
        let scanner = Arc::clone(&scanner);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, stopping scan");
                scanner.stop();
            }
        })
    };

    let outcome = scanner.scan(&cli.urls).await;
    stopper.abort();
    let results = outcome.context("Scan failed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", render_table(&results));
        println!();
        println!("Found {} path(s)", results.len());
    }

    if let Some(path) = &cli.output {
        scanner
            .save_results(path)
            .await
            .with_context(|| format!("Failed to save results to {}", path.display()))?;
    }

    Ok(if results.is_empty() { 0 } else { 1 })
}

fn init_logging(verbose: bool) {
    let default = if verbose { "dirhound=debug,warn" } else { "dirhound=info,warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path) -> Result<ScanConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config file {}", path.display()))
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why is the scanner in an Arc?
//    - The Ctrl-C task and the main task both need it at the same time
//    - stop() only needs &self, so no lock is required
//
// 2. Why log to stderr?
//    - stdout carries the result table or JSON, so it can be piped
//      (dirhound ... --json | jq) without log lines mixed in
// -----------------------------------------------------------------------------
