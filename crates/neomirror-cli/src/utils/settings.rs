//! Per-run settings assembled from the config file, environment and flags.

use anyhow::{Context, Result};
use neomirror_core::{Config, DefaultsConfig, Fetcher, HttpClient, Origin, Overrides, RunConfig};
use std::sync::Arc;
use tracing::debug;

use crate::cli::Cli;

/// Everything a command needs to talk to one site.
pub struct Session {
    /// Validated crawl and HTTP settings.
    pub run: RunConfig,
    /// File-level defaults, for settings only the CLI consumes (`top`).
    pub defaults: DefaultsConfig,
    /// Shared HTTP client.
    pub client: Arc<dyn HttpClient>,
}

impl Session {
    /// Resolve the site, load config and build the HTTP client.
    ///
    /// # Errors
    ///
    /// Fails when the site cannot be resolved to an origin, the config file
    /// is broken, a setting is out of range or the client cannot be built.
    pub fn prepare(cli: &Cli, site: &str) -> Result<Self> {
        let origin =
            Origin::resolve(site).with_context(|| format!("Cannot resolve site '{site}'"))?;
        let config = load_config(cli)?;
        let run = RunConfig::resolve(origin, &config.defaults, &overrides(cli))
            .context("Invalid settings")?;
        let client =
            Fetcher::with_settings(run.http.clone()).context("Failed to build HTTP client")?;

        debug!(
            origin = %run.origin,
            depth = run.crawl_depth,
            concurrency = run.concurrency,
            timeout_secs = run.timeout().as_secs(),
            "Resolved run settings"
        );

        Ok(Self {
            run,
            defaults: config.defaults,
            client: Arc::new(client),
        })
    }
}

/// Load the config file named by `--config`, or the platform default.
///
/// An explicitly named file must exist; the default location may be absent.
pub fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Cannot load config file {}", path.display())),
        None => Config::load().context("Cannot load config"),
    }
}

/// Flag and environment values that take precedence over the config file.
pub fn overrides(cli: &Cli) -> Overrides {
    Overrides {
        crawl_depth: cli.depth,
        concurrency: cli.concurrency,
        user_agent: cli.user_agent.clone(),
        timeout_secs: cli.timeout,
        retries: cli.retries,
    }
}
