// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Load configuration (defaults, files, environment, flags)
// 3. Set up logging
// 4. Walk the repository, counting letters in matching files
// 5. Print the ranking
// 6. Exit with proper code (0 = finished, even if stopped early by a rate
//    limit or Ctrl-C; 1 = configuration problem or unexpected failure)
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli;    // src/cli.rs - command-line parsing
mod config; // src/config.rs - layered settings
mod github; // src/github/ - GitHub contents API client
mod tally;  // src/tally/ - concurrent letter counting
mod walker; // src/walker/ - recursive repository traversal

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::AppConfig;
use github::{GithubClient, RepoCoordinates};
use tally::{LetterRank, LetterTally};
use walker::{RepoWalker, WalkSummary, WalkerOptions};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    // Logging is not up yet, so config errors go straight to stderr via main()
    let config = load_config(&cli)?;
    init_logging(cli.verbose, &config.logging.level);

    let repo = RepoCoordinates::new(&config.github.owner, &config.github.repo);

    // Anonymous access works, it just runs out of quota quickly
    if config.token().is_none() {
        warn!("No GitHub token configured; anonymous requests are limited to 60 per hour");
    }

    // Build the GitHub client and hand it to the walker
    // Arc because the walker shares it between every branch of the walk
    let client = Arc::new(GithubClient::new(&config.github.api_url, config.token())?);
    let walker = RepoWalker::new(
        client,
        repo,
        WalkerOptions {
            max_concurrency: config.walker.max_concurrency,
            suffixes: config.walker.suffixes.clone(),
        },
    );
    // The tally starts empty; the walk fills it
    let tally = LetterTally::new();

    // Ctrl-C drains the walk the same way a rate limit does
    let token = CancellationToken::new();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping the walk");
            interrupt.cancel();
        }
    });

    info!(repo = %walker.repo(), "Fetching repository contents...");

    // An Err here means something unexpected broke the walk: no report
    let summary = match walker.process_repository(&tally, token).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("Error fetching repository contents: {:#}", e);
            return Ok(1);
        }
    };

    // Rate limit or Ctrl-C: we still print what we have
    if summary.cancelled {
        warn!("The walk stopped early; the counts below are partial");
    }

    print_results(walker.repo(), &summary, &tally, cli.json)?;

    info!("Processing completed.");
    Ok(0)
}

// Merges the config file/env layers with command-line flags and validates
// the result.
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;

    if let Some(owner) = &cli.owner {
        config.github.owner = owner.clone();
    }
    if let Some(repo) = &cli.repo {
        config.github.repo = repo.clone();
    }
    if let Some(url) = &cli.repo_url {
        let coords = RepoCoordinates::from_url(url)?;
        config.github.owner = coords.owner;
        config.github.repo = coords.name;
    }
    if let Some(max) = cli.max_concurrency {
        config.walker.max_concurrency = max;
    }

    config.validate()?;
    Ok(config)
}

// RUST_LOG wins; otherwise -v/-vv; otherwise the configured level.
// Logs go to stderr so stdout only carries the ranking.
fn init_logging(verbose: u8, level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new(level),
        1 => EnvFilter::new("debug,hyper=info,reqwest=info,rustls=info"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Serialize)]
struct JsonReport<'a> {
    repository: String,
    summary: &'a WalkSummary,
    letters: Vec<LetterRank>,
}

// Prints the ranking either as "Rank N" lines or JSON
fn print_results(
    repo: &RepoCoordinates,
    summary: &WalkSummary,
    tally: &LetterTally,
    json: bool,
) -> Result<()> {
    if json {
        let report = JsonReport {
            repository: repo.to_string(),
            summary,
            letters: tally.ranked(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if tally.is_empty() {
            warn!("No letters were counted");
        }
        tally.display_results();
        info!(
            "{} letters counted across {} file(s) in {} director(ies)",
            tally.total(),
            summary.files_counted,
            summary.directories
        );
    }
    Ok(())
}
