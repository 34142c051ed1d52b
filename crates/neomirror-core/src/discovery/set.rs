//! The deduplicated, classified set of URLs discovered for one origin.

use crate::Origin;
use crate::discovery::classify::{ContentClass, classify_url};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// Which discovery source first contributed a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlSource {
    /// Listed in `sitemap.xml` (or a child sitemap).
    Sitemap,
    /// The homepage itself or a link on it.
    Homepage,
    /// Found while crawling pages below the homepage.
    Crawl,
    /// Found by re-extracting links from mirrored files.
    Reextract,
    /// Synthesized because every source failed.
    Fallback,
}

impl UrlSource {
    /// Lowercase label used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sitemap => "sitemap",
            Self::Homepage => "homepage",
            Self::Crawl => "crawl",
            Self::Reextract => "reextract",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for UrlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discovered URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlRecord {
    /// Normalized absolute URL; the record's identity.
    pub url: String,
    /// Content class, fixed at creation.
    pub class: ContentClass,
    /// Byte size once probed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Source that first contributed the URL.
    pub source: UrlSource,
}

/// Result of merging a batch of candidate URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Normalized URLs that were not in the set before, in input order.
    pub inserted: Vec<String>,
    /// Candidates already present.
    pub duplicates: usize,
    /// Candidates rejected as unparsable or foreign-origin.
    pub rejected: usize,
}

/// Deduplicated URL records keyed by normalized URL.
///
/// The set only grows: [`DiscoveredSet::merge`] inserts, nothing removes.
/// Every member is on the set's origin.
///
/// ```rust
/// use neomirror_core::Origin;
/// use neomirror_core::discovery::{DiscoveredSet, UrlSource};
///
/// let origin = Origin::resolve("example")?;
/// let mut set = DiscoveredSet::new(origin);
///
/// let outcome = set.merge(
///     [
///         "https://example.neocities.org/a.html",
///         "http://example.neocities.org/a.html#top",
///         "https://other.neocities.org/",
///     ],
///     UrlSource::Sitemap,
/// );
/// assert_eq!(outcome.inserted.len(), 1);
/// assert_eq!(outcome.duplicates, 1);
/// assert_eq!(outcome.rejected, 1);
/// # Ok::<(), neomirror_core::Error>(())
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredSet {
    origin: Origin,
    records: BTreeMap<String, UrlRecord>,
}

impl DiscoveredSet {
    /// Empty set for an origin.
    #[must_use]
    pub const fn new(origin: Origin) -> Self {
        Self {
            origin,
            records: BTreeMap::new(),
        }
    }

    /// Origin every member belongs to.
    #[must_use]
    pub const fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Merge candidate URLs; existing records keep their original source.
    pub fn merge<I, S>(&mut self, urls: I, source: UrlSource) -> MergeOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut outcome = MergeOutcome::default();

        for candidate in urls {
            let candidate = candidate.as_ref();
            let Some(normalized) = self.origin.normalize(candidate) else {
                tracing::trace!(url = candidate, %source, "Rejected off-origin or unparsable URL");
                outcome.rejected += 1;
                continue;
            };

            if self.records.contains_key(&normalized) {
                outcome.duplicates += 1;
                continue;
            }

            let class = Url::parse(&normalized)
                .map_or(ContentClass::Unknown, |parsed| classify_url(&parsed));
            self.records.insert(
                normalized.clone(),
                UrlRecord {
                    url: normalized.clone(),
                    class,
                    size: None,
                    source,
                },
            );
            outcome.inserted.push(normalized);
        }

        outcome
    }

    /// Whether a URL (in any spelling that normalizes the same) is a member.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.origin
            .normalize(url)
            .is_some_and(|n| self.records.contains_key(&n))
    }

    /// Look up a record.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<&UrlRecord> {
        self.origin
            .normalize(url)
            .and_then(|n| self.records.get(&n))
    }

    /// Record a probed size for a member. Returns false for non-members.
    pub fn set_size(&mut self, url: &str, size: u64) -> bool {
        let Some(normalized) = self.origin.normalize(url) else {
            return false;
        };
        match self.records.get_mut(&normalized) {
            Some(record) => {
                record.size = Some(size);
                true
            },
            None => false,
        }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in URL order.
    pub fn iter(&self) -> impl Iterator<Item = &UrlRecord> {
        self.records.values()
    }

    /// Normalized URLs in URL order.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Records of one class, in URL order.
    pub fn of_class(&self, class: ContentClass) -> impl Iterator<Item = &UrlRecord> {
        self.records.values().filter(move |r| r.class == class)
    }

    /// Count records of one class.
    #[must_use]
    pub fn count(&self, class: ContentClass) -> usize {
        self.of_class(class).count()
    }

    /// Count records first contributed by one source.
    #[must_use]
    pub fn count_from(&self, source: UrlSource) -> usize {
        self.records.values().filter(|r| r.source == source).count()
    }
}

impl<'a> IntoIterator for &'a DiscoveredSet {
    type Item = &'a UrlRecord;
    type IntoIter = std::collections::btree_map::Values<'a, String, UrlRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.values()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::disallowed_macros)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set() -> DiscoveredSet {
        DiscoveredSet::new(Origin::resolve("example").unwrap())
    }

    #[test]
    fn test_merge_normalizes_and_dedupes() {
        let mut set = set();
        let outcome = set.merge(
            [
                "https://example.neocities.org/blog/",
                "https://example.neocities.org/blog",
                "http://EXAMPLE.neocities.org/blog#x",
            ],
            UrlSource::Homepage,
        );
        assert_eq!(outcome.inserted, vec!["https://example.neocities.org/blog"]);
        assert_eq!(outcome.duplicates, 2);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_merge_rejects_foreign_and_counts() {
        let mut set = set();
        let outcome = set.merge(
            ["https://evil.com/x.html", "not a url", "mailto:a@b.c"],
            UrlSource::Crawl,
        );
        assert_eq!(outcome.rejected, 3);
        assert!(set.is_empty());
    }

    #[test]
    fn test_first_source_wins() {
        let mut set = set();
        set.merge(["https://example.neocities.org/a.html"], UrlSource::Sitemap);
        set.merge(["https://example.neocities.org/a.html"], UrlSource::Homepage);
        assert_eq!(
            set.get("https://example.neocities.org/a.html").unwrap().source,
            UrlSource::Sitemap
        );
        assert_eq!(set.count_from(UrlSource::Sitemap), 1);
        assert_eq!(set.count_from(UrlSource::Homepage), 0);
    }

    #[test]
    fn test_records_are_classified_on_insert() {
        let mut set = set();
        set.merge(
            [
                "https://example.neocities.org/",
                "https://example.neocities.org/c.css",
                "https://example.neocities.org/about",
            ],
            UrlSource::Homepage,
        );
        assert_eq!(set.count(ContentClass::Page), 2);
        assert_eq!(set.count(ContentClass::Asset), 1);
        assert_eq!(
            set.get("https://example.neocities.org/c.css").unwrap().class,
            ContentClass::Asset
        );
    }

    #[test]
    fn test_set_size_only_for_members() {
        let mut set = set();
        set.merge(["https://example.neocities.org/i.png"], UrlSource::Crawl);
        assert!(set.set_size("https://example.neocities.org/i.png", 42));
        assert!(!set.set_size("https://example.neocities.org/other.png", 1));
        assert_eq!(
            set.get("https://example.neocities.org/i.png").unwrap().size,
            Some(42)
        );
    }

    #[test]
    fn test_contains_uses_identity_form() {
        let mut set = set();
        set.merge(["https://example.neocities.org/dir/"], UrlSource::Crawl);
        assert!(set.contains("http://example.neocities.org/dir"));
        assert!(!set.contains("https://example.neocities.org/dir/other"));
    }

    fn candidate() -> impl Strategy<Value = String> {
        prop_oneof![
            "(/[a-z]{1,5}){0,3}(/|\\.html|\\.png)?(#[a-z]{1,3})?"
                .prop_map(|p| format!("https://example.neocities.org{p}")),
            "(/[a-z]{1,5}){1,2}".prop_map(|p| format!("http://EXAMPLE.neocities.org{p}/")),
            "[a-z]{1,6}".prop_map(|h| format!("https://{h}.example.com/")),
        ]
    }

    proptest! {
        #[test]
        fn prop_merge_is_idempotent(batch in prop::collection::vec(candidate(), 0..30)) {
            let mut set = set();
            set.merge(&batch, UrlSource::Sitemap);
            let snapshot: Vec<UrlRecord> = set.iter().cloned().collect();

            let again = set.merge(&batch, UrlSource::Crawl);
            prop_assert!(again.inserted.is_empty());
            let after: Vec<UrlRecord> = set.iter().cloned().collect();
            prop_assert_eq!(snapshot, after);
        }

        #[test]
        fn prop_set_never_leaves_origin(batch in prop::collection::vec(candidate(), 0..30)) {
            let mut set = set();
            set.merge(&batch, UrlSource::Crawl);
            for record in set.iter() {
                let parsed = Url::parse(&record.url).unwrap();
                prop_assert!(set.origin().contains(&parsed));
            }
        }
    }
}
