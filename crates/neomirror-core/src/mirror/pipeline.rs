//! Bulk fetching of URLs into a [`MirrorStore`].

use crate::config::RunConfig;
use crate::fetcher::{FetchedBody, HttpClient};
use crate::mirror::store::MirrorStore;
use crate::pool::{ProgressCallback, WorkerPool};
use crate::{Origin, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// What happened to one URL during mirroring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Dispatched but not finished.
    NotAttempted,
    /// Body written to disk.
    Fetched {
        /// Where the body was written.
        path: PathBuf,
        /// Body length.
        bytes: u64,
        /// URL that answered, after redirects; relative links in a stored
        /// page resolve against it.
        source: String,
    },
    /// Fetch or write failed after the client's retries.
    Failed {
        /// Error description.
        reason: String,
    },
}

impl FetchOutcome {
    /// Whether the body made it to disk.
    #[must_use]
    pub const fn is_fetched(&self) -> bool {
        matches!(self, Self::Fetched { .. })
    }
}

/// Fetch outcomes keyed by normalized URL.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct OutcomeMap {
    outcomes: BTreeMap<String, FetchOutcome>,
}

impl OutcomeMap {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a URL as dispatched unless it already has an outcome.
    pub fn mark_pending(&mut self, url: &str) {
        self.outcomes
            .entry(url.to_string())
            .or_insert(FetchOutcome::NotAttempted);
    }

    /// Record the final outcome of a URL.
    ///
    /// A later failure never overwrites an earlier success.
    pub fn record(&mut self, url: &str, outcome: FetchOutcome) {
        match self.outcomes.get(url) {
            Some(existing) if existing.is_fetched() && !outcome.is_fetched() => {},
            _ => {
                self.outcomes.insert(url.to_string(), outcome);
            },
        }
    }

    /// Outcome for a URL.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<&FetchOutcome> {
        self.outcomes.get(url)
    }

    /// Whether a URL has been fetched.
    #[must_use]
    pub fn is_fetched(&self, url: &str) -> bool {
        self.outcomes.get(url).is_some_and(FetchOutcome::is_fetched)
    }

    /// All outcomes in URL order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FetchOutcome)> {
        self.outcomes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Fetched files as `(answering URL, local path)`.
    pub fn fetched(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.outcomes.iter().filter_map(|(_, outcome)| match outcome {
            FetchOutcome::Fetched { path, source, .. } => {
                Some((source.as_str(), path.as_path()))
            },
            _ => None,
        })
    }

    /// Failed URLs with their reasons.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|(url, outcome)| match outcome {
            FetchOutcome::Failed { reason } => Some((url.as_str(), reason.as_str())),
            _ => None,
        })
    }

    /// Number of URLs with any outcome.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether nothing was dispatched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of fetched URLs.
    #[must_use]
    pub fn fetched_count(&self) -> usize {
        self.fetched().count()
    }

    /// Number of failed URLs.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    /// Total bytes written.
    #[must_use]
    pub fn fetched_bytes(&self) -> u64 {
        self.outcomes
            .values()
            .filter_map(|o| match o {
                FetchOutcome::Fetched { bytes, .. } => Some(*bytes),
                _ => None,
            })
            .fold(0u64, u64::saturating_add)
    }
}

/// Downloads URLs through a bounded pool and writes them to disk.
pub struct MirrorPipeline {
    client: Arc<dyn HttpClient>,
    store: MirrorStore,
    pool: WorkerPool,
}

impl MirrorPipeline {
    /// Create a pipeline writing into `store`.
    #[must_use]
    pub fn new(client: Arc<dyn HttpClient>, store: MirrorStore, config: &RunConfig) -> Self {
        Self {
            client,
            store,
            pool: WorkerPool::new(config.concurrency).with_item_timeout(config.item_timeout()),
        }
    }

    /// Report progress as each bulk fetch completes.
    #[must_use]
    pub fn with_progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.pool = self.pool.with_progress_callback(callback);
        self
    }

    /// Destination store.
    #[must_use]
    pub const fn store(&self) -> &MirrorStore {
        &self.store
    }

    /// Origin being mirrored.
    #[must_use]
    pub const fn origin(&self) -> &Origin {
        self.store.origin()
    }

    /// HTTP client used for fetching.
    #[must_use]
    pub fn client(&self) -> &dyn HttpClient {
        self.client.as_ref()
    }

    /// Fetch every URL concurrently, recording each outcome.
    #[instrument(skip_all, fields(urls = urls.len()))]
    pub async fn fetch_all(&self, urls: Vec<String>, outcomes: &mut OutcomeMap) {
        for url in &urls {
            outcomes.mark_pending(url);
        }

        let results = self
            .pool
            .run(urls, |url| async move { self.download(&url).await })
            .await;

        for (url, result) in results {
            outcomes.record(&url, into_outcome(&url, result));
        }
    }

    /// Fetch a single URL outside the pool.
    pub async fn fetch_one(&self, url: &str) -> FetchOutcome {
        into_outcome(url, self.download(url).await)
    }

    async fn download(&self, url: &str) -> Result<FetchOutcome> {
        let body = self.client.get(url).await?;
        self.save(url, &body).await
    }

    /// Write a fetched body at the local path of the URL that answered.
    ///
    /// A redirect off the origin is stored under the requested URL instead.
    pub(crate) async fn save(&self, requested: &str, body: &FetchedBody) -> Result<FetchOutcome> {
        let target = if self.store.path_for(&body.url).is_some() {
            body.url.as_str()
        } else {
            requested
        };
        let path = self.store.write(target, &body.body).await?;
        let bytes = u64::try_from(body.body.len()).unwrap_or(u64::MAX);
        debug!(url = requested, source = target, path = %path.display(), bytes, "Mirrored");
        Ok(FetchOutcome::Fetched {
            path,
            bytes,
            source: target.to_string(),
        })
    }
}

fn into_outcome(url: &str, result: Result<FetchOutcome>) -> FetchOutcome {
    result.unwrap_or_else(|e| {
        warn!(url, error = %e, category = e.category(), "Fetch failed");
        FetchOutcome::Failed {
            reason: e.to_string(),
        }
    })
}
