//! Site mirroring: bulk fetch of a discovered set, then reconciliation.
//!
//! ```no_run
//! use neomirror_core::config::RunConfig;
//! use neomirror_core::discovery::DiscoveryEngine;
//! use neomirror_core::mirror::{MirrorPipeline, MirrorStore, mirror_site};
//! use neomirror_core::{Fetcher, Origin};
//! use std::sync::Arc;
//!
//! # async fn example() -> neomirror_core::Result<()> {
//! let config = RunConfig::new(Origin::resolve("example")?);
//! let client = Arc::new(Fetcher::with_settings(config.http.clone())?);
//!
//! let discovery = DiscoveryEngine::new(client.clone(), &config).discover().await;
//! let store = MirrorStore::create("./example.neocities.org", config.origin.clone())?;
//! let pipeline = MirrorPipeline::new(client, store, &config);
//!
//! let report = mirror_site(&pipeline, &discovery.set).await;
//! println!("{} fetched, {} failed", report.outcomes.fetched_count(), report.outcomes.failed_count());
//! # Ok(())
//! # }
//! ```

pub mod pipeline;
pub mod reconcile;
pub mod store;

pub use pipeline::{FetchOutcome, MirrorPipeline, OutcomeMap};
pub use reconcile::{FinalReport, ReconcileReport, Reconciler, SweepReport};
pub use store::{MirrorStore, local_path};

use crate::discovery::DiscoveredSet;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Everything a mirror run produced.
#[derive(Debug, Clone, Serialize)]
pub struct MirrorReport {
    /// Mirror root directory.
    pub root: PathBuf,
    /// Per-URL outcomes, including reconciliation fetches.
    pub outcomes: OutcomeMap,
    /// Reconciliation counters.
    pub reconcile: ReconcileReport,
    /// When the bulk fetch started.
    pub started_at: DateTime<Utc>,
    /// When reconciliation finished.
    pub finished_at: DateTime<Utc>,
}

/// Fetch every URL of `set`, then run both reconciliation stages.
#[instrument(skip_all, fields(urls = set.len(), root = %pipeline.store().root().display()))]
pub async fn mirror_site(pipeline: &MirrorPipeline, set: &DiscoveredSet) -> MirrorReport {
    let started_at = Utc::now();
    let mut outcomes = OutcomeMap::new();
    let urls: Vec<String> = set.urls().map(str::to_string).collect();
    pipeline.fetch_all(urls, &mut outcomes).await;
    info!(
        fetched = outcomes.fetched_count(),
        failed = outcomes.failed_count(),
        "Bulk fetch complete"
    );

    let reconcile = Reconciler::new(pipeline).run(&mut outcomes).await;

    MirrorReport {
        root: pipeline.store().root().to_path_buf(),
        outcomes,
        reconcile,
        started_at,
        finished_at: Utc::now(),
    }
}
