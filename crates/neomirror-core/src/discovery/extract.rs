//! Link extraction from HTML documents.
//!
//! This is a best-effort textual scrape, not a DOM parse: attribute values are
//! found with regular expressions so broken markup only costs recall. Every
//! value is then filtered and resolved against the site [`Origin`].
//!
//! ## Quick Start
//!
//! ```rust
//! use neomirror_core::Origin;
//! use neomirror_core::discovery::extract::extract_links;
//!
//! let origin = Origin::resolve("example")?;
//! let html = r##"
//!   <a href="/a.html">A</a>
//!   <link rel="stylesheet" href="c.css">
//!   <a href="#top">top</a>
//!   <a href="mailto:me@example.com">mail</a>
//!   <img src="https://elsewhere.org/pic.png">
//! "##;
//!
//! let links = extract_links(html, &origin);
//! assert!(links.contains("https://example.neocities.org/a.html"));
//! assert!(links.contains("https://example.neocities.org/c.css"));
//! assert_eq!(links.len(), 2);
//! # Ok::<(), neomirror_core::Error>(())
//! ```
//!
//! ## What is scanned
//!
//! - `href`, `src`, `poster` and `data` attributes (quoted or bare)
//! - every candidate of a `srcset` attribute
//! - CSS `url(...)` references in inline styles and `<style>` blocks

use crate::Origin;
use crate::discovery::classify::{ContentClass, classify_url};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use url::Url;

/// Regex for single-URL reference attributes: `href="..."`, `src='...'`, `data=x`
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static REFERENCE_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:href|src|poster|data)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'<>`]+))"#)
        .unwrap()
});

/// Regex for `srcset` attributes (comma-separated candidates)
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static SRCSET_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bsrcset\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

/// Regex for CSS `url(...)` references
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static CSS_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\burl\(\s*(?:"([^"]*)"|'([^']*)'|([^)"'\s]+))\s*\)"#).unwrap()
});

/// Regex for a leading URL scheme (`mailto:`, `javascript:`, `https:`)
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap());

/// Extract same-origin URLs referenced by an HTML document.
///
/// Relative references are resolved against the origin root. Use
/// [`extract_links_from`] when the document's own URL is known, so
/// page-relative references under subdirectories resolve correctly.
#[must_use]
pub fn extract_links(html: &str, origin: &Origin) -> BTreeSet<String> {
    extract_links_from(html, origin, origin.as_url())
}

/// Extract same-origin URLs, resolving relative references against `page_url`.
///
/// Fragment-only values, non-http schemes (`mailto:`, `javascript:`, `tel:`,
/// `data:`...) and absolute URLs on other origins are dropped. Fragments are
/// removed from what remains; same-origin absolute URLs are otherwise kept
/// as written.
#[must_use]
pub fn extract_links_from(html: &str, origin: &Origin, page_url: &Url) -> BTreeSet<String> {
    raw_references(html)
        .iter()
        .filter_map(|raw| resolve_reference(raw, origin, page_url))
        .collect()
}

/// Extract only asset-class URLs (stylesheets, images, scripts, media...).
#[must_use]
pub fn extract_asset_links(html: &str, origin: &Origin, page_url: &Url) -> BTreeSet<String> {
    extract_links_from(html, origin, page_url)
        .into_iter()
        .filter(|link| {
            Url::parse(link).is_ok_and(|u| classify_url(&u) == ContentClass::Asset)
        })
        .collect()
}

/// Collect every raw reference value in document order (duplicates included).
fn raw_references(html: &str) -> Vec<String> {
    let mut refs = Vec::new();

    for cap in REFERENCE_ATTR_RE.captures_iter(html) {
        if let Some(value) = cap.get(1).or_else(|| cap.get(2)).or_else(|| cap.get(3)) {
            refs.push(value.as_str().to_string());
        }
    }

    for cap in SRCSET_ATTR_RE.captures_iter(html) {
        if let Some(value) = cap.get(1).or_else(|| cap.get(2)) {
            for candidate in value.as_str().split(',') {
                if let Some(url) = candidate.split_whitespace().next() {
                    refs.push(url.to_string());
                }
            }
        }
    }

    for cap in CSS_URL_RE.captures_iter(html) {
        if let Some(value) = cap.get(1).or_else(|| cap.get(2)).or_else(|| cap.get(3)) {
            refs.push(value.as_str().to_string());
        }
    }

    refs
}

/// Filter and resolve one raw attribute value.
fn resolve_reference(raw: &str, origin: &Origin, base: &Url) -> Option<String> {
    let decoded = html_escape::decode_html_entities(raw);
    let value = decoded.trim();

    if value.is_empty() || value.starts_with('#') {
        return None;
    }

    let mut resolved = if SCHEME_RE.is_match(value) {
        let lower = value.to_ascii_lowercase();
        if !(lower.starts_with("http:") || lower.starts_with("https:")) {
            return None;
        }
        Url::parse(value).ok()?
    } else {
        // Covers `/x`, `x`, `../x` and protocol-relative `//host/x`
        base.join(value).ok()?
    };

    if !origin.contains(&resolved) {
        return None;
    }

    resolved.set_fragment(None);
    Some(resolved.to_string())
}
