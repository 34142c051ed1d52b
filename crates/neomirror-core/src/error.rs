//! Error types and handling for neomirror-core operations.
//!
//! Discovery, probing and mirroring absorb most failures locally (an
//! unavailable sitemap is just an empty source, a failed probe becomes a
//! defaulted size). The [`Error`] type covers what does escape: per-URL
//! failures reported by the HTTP client and environment-level failures that
//! abort a run.
//!
//! ## Error Categories
//!
//! - **Network**: transport failures, non-success HTTP statuses, timeouts
//! - **Input**: an origin or URL that cannot be resolved
//! - **Environment**: I/O, storage and configuration problems
//! - **Parse**: malformed documents (only surfaced by strict helpers)
//!
//! ```rust
//! use neomirror_core::Error;
//!
//! let err = Error::Timeout("https://example.neocities.org/big.png".into());
//! assert!(err.is_recoverable());
//! assert_eq!(err.category(), "timeout");
//! ```

use thiserror::Error;

/// The main error type for neomirror-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Covers reading fetched HTML back from disk and writing mirrored files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network operation failed before a response was received.
    ///
    /// Connection and timeout errors are typically recoverable.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} for '{url}'")]
    HttpStatus {
        /// URL that was requested.
        url: String,
        /// Status code returned by the server.
        status: u16,
    },

    /// Requested resource does not exist (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation exceeded its time budget.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// A document could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The site identifier could not be resolved to an origin.
    ///
    /// This is fatal: without an origin nothing can be validated.
    #[error("Invalid origin: {0}")]
    InvalidOrigin(String),

    /// A URL is malformed or uses an unsupported scheme.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mirror storage could not be prepared or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Check if the error might succeed when the operation is retried.
    ///
    /// Timeouts, connection failures, rate limiting (429) and server errors
    /// (5xx) are recoverable. Missing resources, client errors and anything
    /// environment-related are not.
    ///
    /// ```rust
    /// use neomirror_core::Error;
    ///
    /// let throttled = Error::HttpStatus { url: "https://a.neocities.org/".into(), status: 429 };
    /// assert!(throttled.is_recoverable());
    ///
    /// let gone = Error::NotFound("https://a.neocities.org/x.png".into());
    /// assert!(!gone.is_recoverable());
    /// ```
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::HttpStatus { status, .. } => *status == 429 || (500..=599).contains(status),
            Self::Timeout(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a static identifier for structured logs.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::HttpStatus { .. } => "http_status",
            Self::NotFound(_) => "not_found",
            Self::Timeout(_) => "timeout",
            Self::Parse(_) => "parse",
            Self::InvalidOrigin(_) => "invalid_origin",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Config(_) => "config",
            Self::Storage(_) => "storage",
            Self::Serialization(_) => "serialization",
            Self::Other(_) => "other",
        }
    }

    /// Whether the error means the run cannot proceed at all.
    ///
    /// Per-URL failures (network, status, timeout, parse) are never fatal;
    /// they are recorded against the URL and the batch continues.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidOrigin(_) | Self::Config(_) | Self::Storage(_)
        )
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
