//! # neomirror-core
//!
//! Core functionality for neomirror - discovery, size auditing and mirroring
//! of static websites such as those hosted on Neocities.
//!
//! The hard part is not fetching, it is knowing *what* to fetch: a sitemap
//! may be missing or stale, the homepage only links to some pages, and inner
//! pages reference assets nothing else mentions. This crate merges those
//! partial sources into one deduplicated, classified URL set and reconciles
//! what was wanted against what actually landed on disk.
//!
//! ## Architecture
//!
//! - **Origin**: the site identity every URL is validated against
//! - **Discovery**: sitemap reader, link extractor, classifier and the
//!   engine that merges them
//! - **Size**: HEAD-probe based size estimation
//! - **Mirror**: bulk fetch into a local directory plus reconciliation
//! - **Fetcher / Pool**: the HTTP client and bounded concurrent execution
//!
//! ## Quick Start
//!
//! ```no_run
//! use neomirror_core::config::RunConfig;
//! use neomirror_core::discovery::DiscoveryEngine;
//! use neomirror_core::size::SizeEstimator;
//! use neomirror_core::{Fetcher, Origin};
//! use std::sync::Arc;
//!
//! # async fn example() -> neomirror_core::Result<()> {
//! let config = RunConfig::new(Origin::resolve("example")?);
//! let client = Arc::new(Fetcher::with_settings(config.http.clone())?);
//!
//! let mut discovery = DiscoveryEngine::new(client.clone(), &config).discover().await;
//! let report = SizeEstimator::new(client, &config)
//!     .estimate(&mut discovery.set)
//!     .await;
//!
//! println!("{} URLs, {} bytes", report.len(), report.total_bytes());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Only environment-level failures surface as errors (an unresolvable
//! origin, an output directory that cannot be created, a broken config
//! file). Per-URL failures are recorded against the URL:
//!
//! ```rust
//! use neomirror_core::{Error, Origin};
//!
//! match Origin::resolve("ftp://example.com") {
//!     Ok(origin) => println!("Mirroring {origin}"),
//!     Err(e) if e.is_fatal() => eprintln!("Cannot continue: {e}"),
//!     Err(e) => eprintln!("Recoverable: {e}"),
//! }
//! ```

/// Layered configuration and the resolved per-run settings
pub mod config;
/// URL discovery: sitemap, link extraction, classification and crawl
pub mod discovery;
/// Error types and result aliases
pub mod error;
/// HTTP client abstraction and reqwest implementation
pub mod fetcher;
/// Mirror storage, bulk fetching and reconciliation
pub mod mirror;
/// Site origin resolution and URL normalization
pub mod origin;
/// Bounded-concurrency execution
pub mod pool;
/// Size estimation through HEAD probes
pub mod size;

#[cfg(test)]
mod test_support;

pub use config::{Config, DefaultsConfig, Overrides, RunConfig};
pub use discovery::{
    Confidence, ContentClass, DiscoveredSet, Discovery, DiscoveryEngine, UrlRecord, UrlSource,
};
pub use error::{Error, Result};
pub use fetcher::{FetchedBody, Fetcher, HeadInfo, HttpClient, HttpSettings};
pub use mirror::{FetchOutcome, MirrorPipeline, MirrorReport, MirrorStore, OutcomeMap, mirror_site};
pub use origin::Origin;
pub use pool::{ProgressCallback, WorkerPool};
pub use size::{SizeEntry, SizeEstimator, SizeReport};
