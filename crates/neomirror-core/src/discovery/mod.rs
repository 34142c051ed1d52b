//! URL discovery for static sites.
//!
//! Several imperfect sources are merged into one deduplicated, classified
//! [`DiscoveredSet`]:
//!
//! - [`sitemap`]: `<loc>` values from `/sitemap.xml`
//! - [`extract`]: same-origin links scraped from HTML
//! - [`engine`]: homepage fetch plus a bounded breadth-first crawl
//!
//! ## Quick Start
//!
//! ```no_run
//! use neomirror_core::config::RunConfig;
//! use neomirror_core::discovery::DiscoveryEngine;
//! use neomirror_core::{Fetcher, Origin};
//! use std::sync::Arc;
//!
//! # async fn example() -> neomirror_core::Result<()> {
//! let config = RunConfig::new(Origin::resolve("example")?);
//! let client = Arc::new(Fetcher::with_settings(config.http.clone())?);
//!
//! let discovery = DiscoveryEngine::new(client, &config).discover().await;
//! for record in &discovery.set {
//!     println!("{} [{}] via {}", record.url, record.class, record.source);
//! }
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod engine;
pub mod extract;
pub mod set;
pub mod sitemap;

pub use classify::{ContentClass, classify, classify_url};
pub use engine::{Confidence, Discovery, DiscoveryEngine, DiscoveryStats};
pub use extract::{extract_asset_links, extract_links, extract_links_from};
pub use set::{DiscoveredSet, MergeOutcome, UrlRecord, UrlSource};
pub use sitemap::{SitemapDocument, SitemapKind, fetch_sitemap_urls, read_sitemap};
