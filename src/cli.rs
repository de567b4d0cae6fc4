// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Every flag is optional: the config file and environment can supply
// everything. Flags win over both when given.
// =============================================================================

use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(
    name = "repo-letters",
    version,
    about = "Count letter frequencies across a GitHub repository's JavaScript/TypeScript files",
    long_about = "repo-letters walks every directory of a GitHub repository through the contents API, \
                  downloads the files ending in the configured suffixes (.js and .ts by default) \
                  and prints how often each letter appears, most frequent first."
)]
pub struct Cli {
    /// Extra config file (TOML, or JSON when it ends in .json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Repository owner (user or organisation)
    #[arg(long)]
    pub owner: Option<String>,

    /// Repository name
    #[arg(long)]
    pub repo: Option<String>,

    /// Repository URL, e.g. https://github.com/lodash/lodash
    ///
    /// Takes precedence over --owner and --repo
    #[arg(long, value_name = "URL")]
    pub repo_url: Option<String>,

    /// Maximum number of file downloads in flight at once
    #[arg(long, value_name = "N")]
    pub max_concurrency: Option<usize>,

    /// Print the ranking as JSON instead of "Rank N: x - count" lines
    #[arg(long)]
    pub json: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
