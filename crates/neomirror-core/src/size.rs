//! Size auditing through metadata-only probes.
//!
//! Every discovered URL gets one HEAD request. A reported `Content-Length`
//! is taken as the size; anything else (missing header, error status,
//! transport failure, timeout) falls back to a fixed default so the total is
//! always a complete, if approximate, sum.

use crate::config::RunConfig;
use crate::discovery::classify::ContentClass;
use crate::discovery::set::DiscoveredSet;
use crate::fetcher::HttpClient;
use crate::pool::{ProgressCallback, WorkerPool};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Resolved size of one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeEntry {
    /// Normalized URL.
    pub url: String,
    /// Content class of the URL.
    pub class: ContentClass,
    /// Probed or defaulted byte size.
    pub bytes: u64,
    /// True when `bytes` is the default rather than a reported length.
    pub defaulted: bool,
    /// Why the default was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Sizes for a whole discovered set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SizeReport {
    entries: BTreeMap<String, SizeEntry>,
    total_bytes: u64,
    defaulted: usize,
}

impl SizeReport {
    /// Build a report; the total is computed from the entries.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = SizeEntry>) -> Self {
        let entries: BTreeMap<String, SizeEntry> =
            entries.into_iter().map(|e| (e.url.clone(), e)).collect();
        let total_bytes = entries.values().map(|e| e.bytes).fold(0u64, u64::saturating_add);
        let defaulted = entries.values().filter(|e| e.defaulted).count();
        Self {
            entries,
            total_bytes,
            defaulted,
        }
    }

    /// Sum of every entry's size.
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Sum of sizes for one content class.
    #[must_use]
    pub fn total_for(&self, class: ContentClass) -> u64 {
        self.entries
            .values()
            .filter(|e| e.class == class)
            .map(|e| e.bytes)
            .fold(0u64, u64::saturating_add)
    }

    /// Entries that used the default size.
    #[must_use]
    pub const fn defaulted_count(&self) -> usize {
        self.defaulted
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the report is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for a normalized URL.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<&SizeEntry> {
        self.entries.get(url)
    }

    /// Entries in URL order.
    pub fn entries(&self) -> impl Iterator<Item = &SizeEntry> {
        self.entries.values()
    }

    /// The `n` largest entries, largest first; equal sizes in URL order.
    #[must_use]
    pub fn top(&self, n: usize) -> Vec<&SizeEntry> {
        let mut ranked: Vec<&SizeEntry> = self.entries.values().collect();
        ranked.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.url.cmp(&b.url)));
        ranked.truncate(n);
        ranked
    }
}

/// Probes every URL of a set and builds a [`SizeReport`].
pub struct SizeEstimator {
    client: Arc<dyn HttpClient>,
    pool: WorkerPool,
    default_size: u64,
}

impl SizeEstimator {
    /// Create an estimator from a resolved run configuration.
    #[must_use]
    pub fn new(client: Arc<dyn HttpClient>, config: &RunConfig) -> Self {
        Self {
            client,
            pool: WorkerPool::new(config.concurrency).with_item_timeout(config.item_timeout()),
            default_size: config.default_size,
        }
    }

    /// Report progress as probes complete.
    #[must_use]
    pub fn with_progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.pool = self.pool.with_progress_callback(callback);
        self
    }

    /// Probe every URL and record the probed sizes back into the set.
    #[instrument(skip_all, fields(urls = set.len()))]
    pub async fn estimate(&self, set: &mut DiscoveredSet) -> SizeReport {
        let targets: Vec<(String, ContentClass)> =
            set.iter().map(|r| (r.url.clone(), r.class)).collect();
        let classes: BTreeMap<String, ContentClass> = targets.iter().cloned().collect();
        let urls: Vec<String> = targets.into_iter().map(|(url, _)| url).collect();

        let results = self
            .pool
            .run(urls, |url| {
                let client = Arc::clone(&self.client);
                async move { client.head(&url).await }
            })
            .await;

        let mut entries = Vec::with_capacity(results.len());
        for (url, result) in results {
            let class = classes.get(&url).copied().unwrap_or(ContentClass::Unknown);
            let (bytes, reason) = match result {
                Ok(info) if info.is_success() => match info.content_length {
                    Some(len) => (len, None),
                    None => (self.default_size, Some("no content-length".to_string())),
                },
                Ok(info) => (self.default_size, Some(format!("HTTP {}", info.status))),
                Err(e) => (self.default_size, Some(e.to_string())),
            };

            if let Some(why) = &reason {
                debug!(url = %url, reason = %why, bytes, "Using default size");
            } else {
                set.set_size(&url, bytes);
            }

            entries.push(SizeEntry {
                url,
                class,
                bytes,
                defaulted: reason.is_some(),
                reason,
            });
        }

        let report = SizeReport::from_entries(entries);
        info!(
            total_bytes = report.total_bytes(),
            defaulted = report.defaulted_count(),
            "Size estimate complete"
        );
        report
    }
}
