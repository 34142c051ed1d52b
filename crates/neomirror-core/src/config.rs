//! Configuration management for neomirror.
//!
//! Settings are layered, lowest precedence first:
//!
//! 1. Built-in defaults ([`DefaultsConfig::default`])
//! 2. A TOML file (`--config FILE`, or `config.toml` in the platform config
//!    directory)
//! 3. Per-run [`Overrides`] from command-line flags and environment variables
//!
//! The merged, validated result is a [`RunConfig`], which is passed explicitly
//! to the discovery engine, the size estimator and the mirror pipeline.
//!
//! ## Example Configuration File
//!
//! ```toml
//! [defaults]
//! crawl_depth = 3
//! concurrency = 4
//! timeout_secs = 30
//! retries = 1
//! default_size_bytes = 2048
//! top = 20
//! user_agent = "my-archiver/1.0"
//! ```

use crate::fetcher::{DEFAULT_USER_AGENT, HttpSettings};
use crate::pool::MAX_CONCURRENCY;
use crate::{Error, Origin, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Deepest crawl level accepted.
pub const MAX_CRAWL_DEPTH: u32 = 10;

/// Size assumed for a URL whose size could not be determined.
pub const DEFAULT_SIZE_BYTES: u64 = 1024;

/// File name looked up in the platform config directory.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Global configuration file contents.
///
/// ## File Location
///
/// - Linux: `~/.config/neomirror/config.toml`
/// - macOS: `~/Library/Application Support/org.neomirror.neomirror/config.toml`
/// - Windows: `%APPDATA%\neomirror\neomirror\config\config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default run settings
    pub defaults: DefaultsConfig,
}

/// Run settings that apply unless overridden on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// How many link levels below the homepage to crawl.
    pub crawl_depth: u32,

    /// Maximum concurrent requests against the site.
    pub concurrency: usize,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Extra attempts for transient failures (connect errors, 429, 5xx).
    pub retries: u32,

    /// Size assumed when a probe cannot determine one.
    pub default_size_bytes: u64,

    /// Entries shown in the largest-files ranking.
    pub top: usize,

    /// Custom `User-Agent`; the built-in one is used when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            crawl_depth: 2,
            concurrency: 8,
            timeout_secs: 20,
            retries: 2,
            default_size_bytes: DEFAULT_SIZE_BYTES,
            top: 10,
            user_agent: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location, or defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the config directory cannot be determined
    /// or the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!(path = %config_path.display(), "No config file; using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file is missing, unreadable or not
    /// valid TOML for this schema.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config '{}': {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config '{}': {e}", path.display()))
        })
    }

    /// Path of the config file in the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no home directory can be determined.
    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = directories::ProjectDirs::from("org", "neomirror", "neomirror")
            .ok_or_else(|| Error::Config("Failed to determine project directories".into()))?;
        Ok(project_dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

/// Per-run values that take precedence over the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Crawl depth override.
    pub crawl_depth: Option<u32>,
    /// Concurrency override.
    pub concurrency: Option<usize>,
    /// User agent override.
    pub user_agent: Option<String>,
    /// Timeout override in seconds.
    pub timeout_secs: Option<u64>,
    /// Retry count override.
    pub retries: Option<u32>,
}

/// Fully resolved settings for one run against one origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Site being discovered or mirrored.
    pub origin: Origin,
    /// Crawl levels below the homepage.
    pub crawl_depth: u32,
    /// Maximum concurrent requests.
    pub concurrency: usize,
    /// Timeout, user agent and retry policy for the HTTP client.
    pub http: HttpSettings,
    /// Size assumed when a probe fails.
    pub default_size: u64,
}

impl RunConfig {
    /// Built-in defaults for an origin.
    #[must_use]
    pub fn new(origin: Origin) -> Self {
        let defaults = DefaultsConfig::default();
        Self {
            origin,
            crawl_depth: defaults.crawl_depth,
            concurrency: defaults.concurrency,
            http: HttpSettings {
                timeout: Duration::from_secs(defaults.timeout_secs),
                retries: defaults.retries,
                ..HttpSettings::default()
            },
            default_size: defaults.default_size_bytes,
        }
    }

    /// Merge file defaults and overrides, then validate.
    ///
    /// Concurrency is clamped into `1..=64`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the crawl depth exceeds
    /// [`MAX_CRAWL_DEPTH`], the timeout is zero, or the user agent is blank.
    pub fn resolve(origin: Origin, defaults: &DefaultsConfig, overrides: &Overrides) -> Result<Self> {
        let crawl_depth = overrides.crawl_depth.unwrap_or(defaults.crawl_depth);
        if crawl_depth > MAX_CRAWL_DEPTH {
            return Err(Error::Config(format!(
                "crawl depth {crawl_depth} exceeds the maximum of {MAX_CRAWL_DEPTH}"
            )));
        }

        let timeout_secs = overrides.timeout_secs.unwrap_or(defaults.timeout_secs);
        if timeout_secs == 0 {
            return Err(Error::Config("timeout must be at least 1 second".into()));
        }

        let requested = overrides.concurrency.unwrap_or(defaults.concurrency);
        let concurrency = requested.clamp(1, MAX_CONCURRENCY);
        if concurrency != requested {
            tracing::warn!(requested, used = concurrency, "Concurrency clamped");
        }

        let user_agent = overrides
            .user_agent
            .clone()
            .or_else(|| defaults.user_agent.clone())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        if user_agent.trim().is_empty() {
            return Err(Error::Config("user agent must not be empty".into()));
        }

        Ok(Self {
            origin,
            crawl_depth,
            concurrency,
            http: HttpSettings {
                timeout: Duration::from_secs(timeout_secs),
                user_agent,
                retries: overrides.retries.unwrap_or(defaults.retries),
                ..HttpSettings::default()
            },
            default_size: defaults.default_size_bytes,
        })
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.http.timeout
    }

    /// Time budget for one URL in a pooled batch, covering every retry
    /// attempt and the backoff sleeps between them.
    #[must_use]
    pub fn item_timeout(&self) -> Duration {
        let attempts = self.http.retries.saturating_add(1);
        self.http
            .timeout
            .saturating_mul(attempts)
            .saturating_add(Duration::from_secs(2).saturating_mul(self.http.retries))
    }
}
