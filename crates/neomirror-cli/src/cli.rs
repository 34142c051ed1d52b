//! # CLI Structure and Argument Parsing
//!
//! The command-line interface is built with `clap` derive macros.
//!
//! ```bash
//! # What does the site consist of?
//! neomirror discover example
//!
//! # How big is it, and what are the heaviest files?
//! neomirror size example.neocities.org --top 5
//!
//! # Make a local copy
//! neomirror mirror https://example.neocities.org --output ./backup
//! ```
//!
//! Global options apply to every command. Crawl and HTTP settings can also
//! come from `NEOMIRROR_*` environment variables or the config file; flags
//! take precedence over both.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Main CLI structure for the `neomirror` command
#[derive(Parser, Clone, Debug)]
#[command(name = "neomirror")]
#[command(version)]
#[command(about = "neomirror - discover, size and mirror Neocities sites", long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Maximum crawl depth below the homepage (0 disables crawling)
    #[arg(long, global = true, env = "NEOMIRROR_DEPTH", value_name = "LEVELS")]
    pub depth: Option<u32>,

    /// Number of concurrent requests (clamped to 1..=64)
    #[arg(long, global = true, env = "NEOMIRROR_CONCURRENCY", value_name = "N")]
    pub concurrency: Option<usize>,

    /// User agent sent with every request
    #[arg(long, global = true, env = "NEOMIRROR_USER_AGENT", value_name = "UA")]
    pub user_agent: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, env = "NEOMIRROR_TIMEOUT", value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Retries for transient failures (connection errors, 429, 5xx)
    #[arg(long, global = true, env = "NEOMIRROR_RETRIES", value_name = "N")]
    pub retries: Option<u32>,

    /// Config file to use instead of the platform default
    #[arg(long, global = true, env = "NEOMIRROR_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Disable all ANSI colors in output (also respects `NO_COLOR` env)
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
}

/// Available subcommands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// List every URL the site is made of, classified as page or asset
    Discover {
        /// Neocities username, host name or full URL
        site: String,
    },

    /// Estimate the total size of a site
    Size {
        /// Neocities username, host name or full URL
        site: String,

        /// Number of largest files to list
        #[arg(long, value_name = "N")]
        top: Option<usize>,
    },

    /// Download a site into a local directory
    Mirror {
        /// Neocities username, host name or full URL
        site: String,

        /// Destination directory (defaults to ./<host>)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
