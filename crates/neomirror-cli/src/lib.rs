//! neomirror CLI - discover, size and mirror Neocities sites
//!
//! The binary is a thin wrapper around [`run`]; the work itself happens in
//! `neomirror-core`.
use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod output;
mod utils;

use cli::{Cli, Commands};
use utils::initialize_logging;
use utils::settings::Session;

/// Execute the neomirror CLI with the current process arguments.
///
/// # Errors
///
/// Returns an error for fatal conditions only: an unresolvable site, a broken
/// config file, an output directory that cannot be created or an HTTP client
/// that cannot be built. Partial results are reported, not returned as errors.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    execute_command(&cli).await
}

async fn execute_command(cli: &Cli) -> Result<()> {
    let format = cli.format;
    let show_progress = output::progress_enabled(format, cli.quiet);

    match &cli.command {
        Commands::Completions { shell } => {
            commands::generate(*shell);
            Ok(())
        },
        Commands::Discover { site } => {
            let session = Session::prepare(cli, site)?;
            commands::discover(&session, format).await
        },
        Commands::Size { site, top } => {
            let session = Session::prepare(cli, site)?;
            commands::size(&session, *top, format, show_progress).await
        },
        Commands::Mirror { site, output } => {
            let session = Session::prepare(cli, site)?;
            commands::mirror(&session, output.clone(), format, show_progress).await
        },
    }
}
