//! Sitemap XML reading for site discovery.
//!
//! Sitemaps are an optional, often stale source: a missing or broken
//! `sitemap.xml` is never an error, it just contributes fewer URLs. The reader
//! collects `<loc>` values and leaves validation to the discovery engine.
//!
//! ## Quick Start
//!
//! ```rust
//! use neomirror_core::discovery::sitemap::read_sitemap;
//!
//! let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url><loc>https://example.neocities.org/a.html</loc></url>
//!   <url><loc>https://example.neocities.org/b.html</loc></url>
//! </urlset>"#;
//!
//! let doc = read_sitemap(xml);
//! assert!(!doc.is_index());
//! assert_eq!(doc.locs.len(), 2);
//! ```
//!
//! ## Sitemap Formats
//!
//! - **Standard sitemap**: `<urlset>` with `<url><loc>` entries
//! - **Sitemap index**: `<sitemapindex>` with `<sitemap><loc>` entries
//!   pointing to other sitemaps, followed by [`fetch_sitemap_urls`]

use crate::{Error, Origin, Result};
use crate::fetcher::HttpClient;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, instrument, warn};

/// Location of the sitemap relative to the origin root.
pub const SITEMAP_PATH: &str = "/sitemap.xml";

/// Maximum recursion depth for sitemap index files.
const MAX_INDEX_DEPTH: u8 = 2;

/// Maximum number of child sitemaps to fetch from an index.
const MAX_CHILD_SITEMAPS: usize = 50;

/// Root element kind of a sitemap document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    /// `<urlset>`: `<loc>` values are page/asset URLs.
    UrlSet,
    /// `<sitemapindex>`: `<loc>` values are child sitemaps.
    Index,
}

/// The `<loc>` values read from one sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapDocument {
    /// Root element kind.
    pub kind: SitemapKind,
    /// Unescaped, trimmed `<loc>` values in document order.
    pub locs: Vec<String>,
    /// Where and why the XML broke off; `locs` is partial when set.
    pub damage: Option<String>,
}

impl SitemapDocument {
    /// Whether this is a sitemap index.
    #[must_use]
    pub fn is_index(&self) -> bool {
        self.kind == SitemapKind::Index
    }

    /// Strict view of the document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when the XML was damaged, even though the
    /// `<loc>` values read before the damage are still usable.
    pub fn check(&self) -> Result<()> {
        match &self.damage {
            Some(why) => Err(Error::Parse(format!(
                "sitemap cut short after {} <loc> values: {why}",
                self.locs.len()
            ))),
            None => Ok(()),
        }
    }
}

/// Read `<loc>` values from sitemap XML.
///
/// Never fails: empty input gives no locs, and malformed XML gives whatever
/// was read before the damage.
#[must_use]
#[instrument(skip(xml), fields(xml_len = xml.len()), level = "trace")]
pub fn read_sitemap(xml: &str) -> SitemapDocument {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut kind = SitemapKind::UrlSet;
    let mut locs = Vec::new();
    let mut damage = None;
    let mut buf = Vec::new();
    let mut in_loc = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"sitemapindex" => kind = SitemapKind::Index,
                    b"loc" => in_loc = true,
                    _ => {},
                }
            },
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"loc" {
                    in_loc = false;
                }
            },
            Ok(Event::Text(e)) if in_loc => match e.unescape() {
                Ok(text) => push_loc(&mut locs, &text),
                Err(err) => {
                    debug!(error = %err, "Skipping undecodable <loc> value");
                },
            },
            Ok(Event::CData(e)) if in_loc => {
                push_loc(&mut locs, &String::from_utf8_lossy(&e));
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!(
                    error = %e,
                    position = reader.buffer_position(),
                    read = locs.len(),
                    "Sitemap XML is malformed; keeping locs read so far"
                );
                damage = Some(format!("{e} at byte {}", reader.buffer_position()));
                break;
            },
            _ => {},
        }
        buf.clear();
    }

    SitemapDocument {
        kind,
        locs,
        damage,
    }
}

fn push_loc(locs: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        locs.push(trimmed.to_string());
    }
}

/// Fetch `/sitemap.xml` for an origin and return every URL it lists.
///
/// Sitemap indexes are followed (same-origin children only, bounded depth and
/// fan-out). Any failure is logged and yields fewer URLs, never an error.
#[instrument(skip_all, fields(origin = %origin))]
pub async fn fetch_sitemap_urls(client: &dyn HttpClient, origin: &Origin) -> BTreeSet<String> {
    let url = match origin.join(SITEMAP_PATH) {
        Ok(url) => url.to_string(),
        Err(e) => {
            warn!(error = %e, "Cannot build sitemap URL");
            return BTreeSet::new();
        },
    };
    collect_recursive(client, origin, url, 0).await
}

/// Internal recursive collector.
///
/// Uses `Box::pin` so the recursive future has a known size.
fn collect_recursive<'a>(
    client: &'a dyn HttpClient,
    origin: &'a Origin,
    url: String,
    depth: u8,
) -> Pin<Box<dyn Future<Output = BTreeSet<String>> + Send + 'a>> {
    Box::pin(async move {
        if depth > MAX_INDEX_DEPTH {
            warn!(url = %url, max = MAX_INDEX_DEPTH, "Sitemap index nesting too deep; skipping");
            return BTreeSet::new();
        }

        debug!(url = %url, depth, "Fetching sitemap");
        let body = match client.get(&url).await {
            Ok(body) => body,
            Err(e) => {
                if depth == 0 {
                    warn!(url = %url, error = %e, "Source unavailable: sitemap");
                } else {
                    warn!(url = %url, error = %e, "Failed to fetch child sitemap");
                }
                return BTreeSet::new();
            },
        };

        let doc = read_sitemap(&body.text());
        if let Err(e) = doc.check() {
            warn!(url = %url, error = %e, category = e.category(), "Using partial sitemap");
        }
        if !doc.is_index() {
            return doc.locs.into_iter().collect();
        }

        let children: Vec<String> = doc
            .locs
            .into_iter()
            .filter(|loc| {
                url::Url::parse(loc).is_ok_and(|parsed| origin.contains(&parsed))
            })
            .take(MAX_CHILD_SITEMAPS)
            .collect();

        debug!(child_count = children.len(), "Fetching child sitemaps from index");

        let mut all = BTreeSet::new();
        for child in children {
            all.extend(collect_recursive(client, origin, child, depth + 1).await);
        }
        all
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::disallowed_macros)]
mod tests {
    use super::*;
    use crate::fetcher::{Fetcher, HttpSettings};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher() -> Fetcher {
        Fetcher::with_settings(HttpSettings {
            timeout: Duration::from_secs(2),
            retries: 0,
            ..HttpSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn test_reads_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <url>
            <loc> https://example.neocities.org/a.html </loc>
            <lastmod>2024-01-15</lastmod>
          </url>
          <url><loc>https://example.neocities.org/search?q=1&amp;p=2</loc></url>
        </urlset>"#;

        let doc = read_sitemap(xml);
        assert_eq!(doc.kind, SitemapKind::UrlSet);
        assert!(doc.damage.is_none());
        assert!(doc.check().is_ok());
        assert_eq!(
            doc.locs,
            vec![
                "https://example.neocities.org/a.html",
                "https://example.neocities.org/search?q=1&p=2"
            ]
        );
    }

    #[test]
    fn test_reads_index() {
        let xml = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <sitemap><loc>https://example.neocities.org/sitemap-1.xml</loc></sitemap>
        </sitemapindex>"#;
        let doc = read_sitemap(xml);
        assert!(doc.is_index());
        assert_eq!(doc.locs.len(), 1);
    }

    #[test]
    fn test_empty_and_garbage_yield_nothing() {
        assert!(read_sitemap("").locs.is_empty());
        assert!(read_sitemap("this is not xml at all").locs.is_empty());
        assert!(read_sitemap("<html><body>Not Found</body></html>").locs.is_empty());
    }

    #[test]
    fn test_malformed_keeps_partial_locs() {
        let xml = r"<urlset>
          <url><loc>https://example.neocities.org/one.html</loc></url>
          <url><loc>https://example.neocities.org/two.html</loc></url>
          <url><loc>https://example.neocities.org/three.html</oops></url>
        </urlset>";
        let doc = read_sitemap(xml);
        assert!(doc.damage.is_some());
        assert!(matches!(doc.check(), Err(Error::Parse(_))));
        assert!(doc.locs.len() >= 2);
        assert_eq!(doc.locs[0], "https://example.neocities.org/one.html");
    }

    #[test]
    fn test_cdata_loc() {
        let xml = "<urlset><url><loc><![CDATA[https://example.neocities.org/c.html]]></loc></url></urlset>";
        assert_eq!(
            read_sitemap(xml).locs,
            vec!["https://example.neocities.org/c.html"]
        );
    }

    #[tokio::test]
    async fn test_fetch_missing_sitemap_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let origin = Origin::resolve(&server.uri()).unwrap();
        let urls = fetch_sitemap_urls(&test_fetcher(), &origin).await;
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_follows_index() {
        let server = MockServer::start().await;
        let base = server.uri();

        let index = format!(
            r#"<sitemapindex>
              <sitemap><loc>{base}/pages.xml</loc></sitemap>
              <sitemap><loc>{base}/broken.xml</loc></sitemap>
              <sitemap><loc>https://elsewhere.example.com/sitemap.xml</loc></sitemap>
            </sitemapindex>"#
        );
        let pages = format!(
            "<urlset><url><loc>{base}/a.html</loc></url><url><loc>{base}/b.html</loc></url></urlset>"
        );

        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(index))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pages.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(pages))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken.xml"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let origin = Origin::resolve(&base).unwrap();
        let urls = fetch_sitemap_urls(&test_fetcher(), &origin).await;
        assert_eq!(urls.len(), 2);
        assert!(urls.contains(&format!("{base}/a.html")));
        assert!(urls.contains(&format!("{base}/b.html")));
    }
}
