//! Site discovery: sitemap, homepage and a bounded crawl merged into one set.
//!
//! Sources are consulted in order and never abort the run:
//!
//! 1. `/sitemap.xml` (and any child sitemaps)
//! 2. the homepage and every same-origin link on it
//! 3. a breadth-first crawl of known pages, `crawl_depth` levels deep
//!
//! When all of them come back empty the result is a two-URL fallback
//! (`/` and `/index.html`) flagged [`Confidence::Fallback`].

use crate::config::RunConfig;
use crate::discovery::classify::{ContentClass, classify};
use crate::discovery::extract::extract_links_from;
use crate::discovery::set::{DiscoveredSet, MergeOutcome, UrlSource};
use crate::discovery::sitemap::fetch_sitemap_urls;
use crate::fetcher::{FetchedBody, HttpClient};
use crate::pool::WorkerPool;
use crate::Origin;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// How much the discovered set can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// At least one source produced URLs.
    Discovered,
    /// Every source failed; the set is a synthesized guess.
    Fallback,
}

/// Per-source counters for one discovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryStats {
    /// URLs first contributed by the sitemap.
    pub from_sitemap: usize,
    /// URLs first contributed by the homepage.
    pub from_homepage: usize,
    /// URLs first contributed by the crawl.
    pub from_crawl: usize,
    /// Pages fetched successfully during the crawl.
    pub pages_crawled: usize,
    /// Pages whose fetch failed during the crawl.
    pub pages_failed: usize,
    /// Crawl levels actually walked.
    pub levels_walked: u32,
    /// Candidates rejected as foreign-origin or unparsable.
    pub rejected: usize,
    /// Whether the homepage could be fetched.
    pub homepage_reachable: bool,
}

impl DiscoveryStats {
    fn record(&mut self, source: UrlSource, outcome: &MergeOutcome) {
        let inserted = outcome.inserted.len();
        match source {
            UrlSource::Sitemap => self.from_sitemap += inserted,
            UrlSource::Homepage => self.from_homepage += inserted,
            UrlSource::Crawl => self.from_crawl += inserted,
            UrlSource::Reextract | UrlSource::Fallback => {},
        }
        self.rejected += outcome.rejected;
    }
}

/// The result of a discovery pass.
#[derive(Debug, Clone, Serialize)]
pub struct Discovery {
    /// Every URL found.
    pub set: DiscoveredSet,
    /// Whether the set came from real sources.
    pub confidence: Confidence,
    /// Source counters.
    pub stats: DiscoveryStats,
}

impl Discovery {
    /// Whether the set is the synthesized fallback.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.confidence == Confidence::Fallback
    }
}

/// Builds the canonical [`DiscoveredSet`] for an origin.
pub struct DiscoveryEngine {
    client: Arc<dyn HttpClient>,
    origin: Origin,
    crawl_depth: u32,
    pool: WorkerPool,
}

impl DiscoveryEngine {
    /// Create an engine from a resolved run configuration.
    #[must_use]
    pub fn new(client: Arc<dyn HttpClient>, config: &RunConfig) -> Self {
        Self {
            client,
            origin: config.origin.clone(),
            crawl_depth: config.crawl_depth,
            pool: WorkerPool::new(config.concurrency).with_item_timeout(config.item_timeout()),
        }
    }

    /// Run sitemap, homepage and crawl discovery.
    ///
    /// Never fails: unavailable sources are logged and skipped, and a fully
    /// empty result is replaced by the fallback set.
    #[instrument(skip_all, fields(origin = %self.origin, depth = self.crawl_depth))]
    pub async fn discover(&self) -> Discovery {
        let mut set = DiscoveredSet::new(self.origin.clone());
        let mut stats = DiscoveryStats::default();

        let sitemap_urls = fetch_sitemap_urls(self.client.as_ref(), &self.origin).await;
        let outcome = set.merge(&sitemap_urls, UrlSource::Sitemap);
        stats.record(UrlSource::Sitemap, &outcome);
        debug!(listed = sitemap_urls.len(), added = outcome.inserted.len(), "Sitemap merged");

        let homepage = self.origin.homepage();
        match self.client.get(&homepage).await {
            Ok(body) => {
                stats.homepage_reachable = true;
                let mut urls = BTreeSet::from([homepage.clone()]);
                urls.extend(self.links_in(&body));
                let outcome = set.merge(&urls, UrlSource::Homepage);
                stats.record(UrlSource::Homepage, &outcome);
                debug!(links = urls.len(), added = outcome.inserted.len(), "Homepage merged");
            },
            Err(e) => warn!(url = %homepage, error = %e, "Source unavailable: homepage"),
        }

        let home_key = self.origin.normalize(&homepage);
        let seeds: Vec<String> = set
            .of_class(ContentClass::Page)
            .map(|r| r.url.clone())
            .filter(|u| Some(u) != home_key.as_ref())
            .collect();
        self.crawl(&mut set, seeds, &mut stats).await;

        let confidence = if set.is_empty() {
            warn!(origin = %self.origin, "Every discovery source failed; using fallback URLs");
            let fallback = [homepage, format!("{}/index.html", self.origin)];
            set.merge(fallback, UrlSource::Fallback);
            Confidence::Fallback
        } else {
            Confidence::Discovered
        };

        info!(
            total = set.len(),
            pages = set.count(ContentClass::Page),
            assets = set.count(ContentClass::Asset),
            ?confidence,
            "Discovery complete"
        );

        Discovery {
            set,
            confidence,
            stats,
        }
    }

    /// Breadth-first crawl: each level is fetched concurrently, and links are
    /// merged here, one page at a time.
    async fn crawl(&self, set: &mut DiscoveredSet, seeds: Vec<String>, stats: &mut DiscoveryStats) {
        let mut frontier = seeds;
        let mut level = 0;

        while !frontier.is_empty() && level < self.crawl_depth {
            level += 1;
            debug!(level, pages = frontier.len(), "Crawling level");

            let mut results = self
                .pool
                .run(frontier, |url| {
                    let client = Arc::clone(&self.client);
                    async move { client.get(&url).await }
                })
                .await;
            results.sort_by(|a, b| a.0.cmp(&b.0));

            let mut next = Vec::new();
            for (url, result) in results {
                match result {
                    Ok(body) => {
                        stats.pages_crawled += 1;
                        let outcome = set.merge(self.links_in(&body), UrlSource::Crawl);
                        stats.record(UrlSource::Crawl, &outcome);
                        next.extend(
                            outcome
                                .inserted
                                .into_iter()
                                .filter(|u| classify(u) == ContentClass::Page),
                        );
                    },
                    Err(e) => {
                        stats.pages_failed += 1;
                        warn!(url = %url, error = %e, "Source unavailable: crawled page");
                    },
                }
            }
            frontier = next;
        }

        stats.levels_walked = level;
    }

    /// Same-origin links in a fetched page, resolved against its own URL.
    fn links_in(&self, body: &FetchedBody) -> BTreeSet<String> {
        if body.content_type.is_some() && !body.is_html() {
            debug!(url = %body.url, content_type = ?body.content_type, "Not HTML; no links extracted");
            return BTreeSet::new();
        }
        let base = Url::parse(&body.url).unwrap_or_else(|_| self.origin.as_url().clone());
        extract_links_from(&body.text(), &self.origin, &base)
    }
}
