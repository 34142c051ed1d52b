//! Post-fetch reconciliation of the mirror against what pages reference.
//!
//! Discovery misses things: assets only referenced from inner pages the crawl
//! never reached, or files added to the homepage since discovery ran. Two
//! single-pass stages close the gap after the bulk fetch:
//!
//! - **Stage A** re-reads every mirrored page from disk and fetches the
//!   assets it references that are not fetched yet.
//! - **Stage B** fetches the live homepage again and downloads, one at a time,
//!   every linked URL whose local file is missing.

use crate::discovery::classify::{ContentClass, classify};
use crate::discovery::extract::{extract_asset_links, extract_links_from};
use crate::mirror::pipeline::{FetchOutcome, MirrorPipeline, OutcomeMap};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Counters for Stage A.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Mirrored pages re-read from disk.
    pub pages_scanned: usize,
    /// Newly referenced assets fed back to the pipeline.
    pub queued: usize,
    /// Of those, how many were fetched.
    pub fetched: usize,
}

/// Counters for Stage B.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FinalReport {
    /// Whether the live homepage could be fetched.
    pub homepage_reachable: bool,
    /// Links checked against the disk.
    pub checked: usize,
    /// Links whose local file was missing.
    pub missing: usize,
    /// Of those, how many were fetched.
    pub fetched: usize,
}

/// Both reconciliation stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Stage A counters.
    pub sweep: SweepReport,
    /// Stage B counters.
    pub final_pass: FinalReport,
}

/// Runs the reconciliation stages through a [`MirrorPipeline`].
pub struct Reconciler<'a> {
    pipeline: &'a MirrorPipeline,
}

impl<'a> Reconciler<'a> {
    /// Reconcile through `pipeline`.
    #[must_use]
    pub const fn new(pipeline: &'a MirrorPipeline) -> Self {
        Self { pipeline }
    }

    /// Run Stage A then Stage B.
    pub async fn run(&self, outcomes: &mut OutcomeMap) -> ReconcileReport {
        let sweep = self.inner_page_sweep(outcomes).await;
        let final_pass = self.final_reconciliation(outcomes).await;
        ReconcileReport { sweep, final_pass }
    }

    /// Stage A: assets referenced by mirrored pages but not yet fetched.
    #[instrument(skip_all)]
    pub async fn inner_page_sweep(&self, outcomes: &mut OutcomeMap) -> SweepReport {
        let missing = self.unfetched_page_assets(outcomes).await;
        let mut report = SweepReport {
            pages_scanned: missing.pages_scanned,
            queued: missing.urls.len(),
            fetched: 0,
        };

        if missing.urls.is_empty() {
            debug!(pages = report.pages_scanned, "Inner-page sweep found nothing new");
            return report;
        }

        let queued: Vec<String> = missing.urls.into_iter().collect();
        self.pipeline.fetch_all(queued.clone(), outcomes).await;
        report.fetched = queued.iter().filter(|u| outcomes.is_fetched(u)).count();

        info!(
            pages = report.pages_scanned,
            queued = report.queued,
            fetched = report.fetched,
            "Inner-page sweep complete"
        );
        report
    }

    /// Stage B: links on the live homepage whose local file is missing.
    #[instrument(skip_all)]
    pub async fn final_reconciliation(&self, outcomes: &mut OutcomeMap) -> FinalReport {
        let origin = self.pipeline.origin();
        let store = self.pipeline.store();
        let homepage = origin.homepage();
        let mut report = FinalReport::default();

        let body = match self.pipeline.client().get(&homepage).await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %homepage, error = %e, "Source unavailable: homepage (final pass)");
                return report;
            },
        };
        report.homepage_reachable = true;

        // The homepage itself is written if it never made it to disk
        if !store.exists(&body.url) {
            let key = origin.normalize(&homepage).unwrap_or_else(|| homepage.clone());
            let outcome = self
                .pipeline
                .save(&homepage, &body)
                .await
                .unwrap_or_else(|e| FetchOutcome::Failed {
                    reason: e.to_string(),
                });
            outcomes.record(&key, outcome);
        }

        let base = Url::parse(&body.url).unwrap_or_else(|_| origin.as_url().clone());
        let links = extract_links_from(&body.text(), origin, &base);
        report.checked = links.len();

        for link in links {
            if store.exists(&link) {
                continue;
            }
            report.missing += 1;
            let outcome = self.pipeline.fetch_one(&link).await;
            if outcome.is_fetched() {
                report.fetched += 1;
            }
            let key = origin.normalize(&link).unwrap_or(link);
            outcomes.record(&key, outcome);
        }

        info!(
            checked = report.checked,
            missing = report.missing,
            fetched = report.fetched,
            "Final reconciliation complete"
        );
        report
    }

    /// Asset URLs referenced by mirrored pages, minus those already fetched.
    async fn unfetched_page_assets(&self, outcomes: &OutcomeMap) -> PageAssets {
        let origin = self.pipeline.origin();
        let pages: Vec<(String, std::path::PathBuf)> = outcomes
            .fetched()
            .filter(|(url, path)| classify(url) == ContentClass::Page && path.is_file())
            .map(|(url, path)| (url.to_string(), path.to_path_buf()))
            .collect();

        let mut found = PageAssets::default();
        for (url, path) in pages {
            let html = match self.pipeline.store().read_text(&path).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cannot re-read mirrored page");
                    continue;
                },
            };
            found.pages_scanned += 1;

            // The answering URL keeps a directory page's trailing slash
            let page_url = Url::parse(&url).unwrap_or_else(|_| origin.as_url().clone());
            for asset in extract_asset_links(&html, origin, &page_url) {
                if let Some(key) = origin.normalize(&asset) {
                    if !outcomes.is_fetched(&key) {
                        found.urls.insert(key);
                    }
                }
            }
        }
        found
    }
}

#[derive(Debug, Default)]
struct PageAssets {
    pages_scanned: usize,
    urls: BTreeSet<String>,
}
