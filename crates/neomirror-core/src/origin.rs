//! Site origin resolution and URL normalization.
//!
//! An [`Origin`] is the scheme + host (+ explicit port) every discovered URL
//! is validated against. It is resolved once from whatever the operator typed
//! and never changes afterwards.
//!
//! ```rust
//! use neomirror_core::Origin;
//!
//! let origin = Origin::resolve("example")?;
//! assert_eq!(origin.homepage(), "https://example.neocities.org/");
//!
//! let same = origin.normalize("http://EXAMPLE.neocities.org/blog/#top");
//! assert_eq!(same.as_deref(), Some("https://example.neocities.org/blog"));
//! assert!(origin.normalize("https://other.neocities.org/").is_none());
//! # Ok::<(), neomirror_core::Error>(())
//! ```

use crate::{Error, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use url::Url;

/// Hosting domain appended to bare usernames.
pub const NEOCITIES_DOMAIN: &str = "neocities.org";

/// The canonical base of a site: scheme, host and explicit port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    base: Url,
}

impl Origin {
    /// Resolve an operator-supplied site identifier into an origin.
    ///
    /// Accepted forms:
    /// - a full URL (`https://example.neocities.org/some/page`), path ignored
    /// - a bare host (`example.neocities.org`, `my-domain.com`), assumed https
    /// - a Neocities username (`example`), expanded to `https://example.neocities.org`
    ///
    /// Loopback hosts (`localhost`, `127.0.0.1`) default to plain http.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOrigin`] when the identifier is empty, uses a
    /// non-http scheme, or does not form a valid host.
    pub fn resolve(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidOrigin("site identifier is empty".into()));
        }

        let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else if trimmed.contains("://") {
            return Err(Error::InvalidOrigin(format!(
                "unsupported scheme in '{trimmed}' (expected http or https)"
            )));
        } else if trimmed.contains('.') || trimmed.contains(':') {
            let protocol = if trimmed.starts_with("127.0.0.1") || trimmed.starts_with("localhost")
            {
                "http"
            } else {
                "https"
            };
            format!("{protocol}://{trimmed}")
        } else if is_valid_username(trimmed) {
            format!("https://{}.{NEOCITIES_DOMAIN}", trimmed.to_ascii_lowercase())
        } else {
            return Err(Error::InvalidOrigin(format!(
                "'{trimmed}' is neither a URL, a host, nor a Neocities username"
            )));
        };

        let parsed = Url::parse(&candidate)
            .map_err(|e| Error::InvalidOrigin(format!("'{trimmed}': {e}")))?;
        Self::from_url(&parsed)
    }

    /// Build an origin from an already parsed URL, discarding its path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOrigin`] for non-http schemes or host-less URLs.
    pub fn from_url(url: &Url) -> Result<Self> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidOrigin(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::InvalidOrigin(format!("'{url}' has no host")))?;

        let base = match url.port() {
            Some(port) => format!("{}://{host}:{port}/", url.scheme()),
            None => format!("{}://{host}/", url.scheme()),
        };
        let base = Url::parse(&base).map_err(|e| Error::InvalidOrigin(e.to_string()))?;
        Ok(Self { base })
    }

    /// The origin as a URL with path `/`.
    #[must_use]
    pub const fn as_url(&self) -> &Url {
        &self.base
    }

    /// Scheme of the origin (`http` or `https`).
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.base.scheme()
    }

    /// Lowercased host name.
    #[must_use]
    pub fn host(&self) -> &str {
        self.base.host_str().unwrap_or_default()
    }

    /// Explicit port, if the origin is not on the scheme's default port.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.base.port()
    }

    /// The homepage URL (`scheme://host/`).
    #[must_use]
    pub fn homepage(&self) -> String {
        self.base.to_string()
    }

    /// Resolve a path or relative reference against the origin root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the reference cannot be joined.
    pub fn join(&self, reference: &str) -> Result<Url> {
        self.base
            .join(reference)
            .map_err(|e| Error::InvalidUrl(format!("'{reference}': {e}")))
    }

    /// Whether a URL points at this site.
    ///
    /// Scheme-insensitive between http and https, host compared
    /// case-insensitively, explicit ports must match.
    #[must_use]
    pub fn contains(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
            && url
                .host_str()
                .is_some_and(|h| h.eq_ignore_ascii_case(self.host()))
            && url.port() == self.port()
    }

    /// Normalize an absolute URL string into its identity form.
    ///
    /// Returns `None` for unparsable or foreign-origin URLs. The identity form
    /// uses the origin's scheme, drops the fragment, and strips a trailing
    /// slash from every path except the root.
    #[must_use]
    pub fn normalize(&self, url: &str) -> Option<String> {
        let parsed = Url::parse(url.trim()).ok()?;
        self.normalize_url(parsed)
    }

    /// Normalize an already parsed URL. See [`Origin::normalize`].
    #[must_use]
    pub fn normalize_url(&self, mut url: Url) -> Option<String> {
        if !self.contains(&url) {
            return None;
        }
        if url.scheme() != self.scheme() {
            url.set_scheme(self.scheme()).ok()?;
        }
        url.set_fragment(None);

        let path = url.path();
        if path.len() > 1 && path.ends_with('/') {
            let trimmed = path.trim_end_matches('/').to_string();
            let trimmed = if trimmed.is_empty() {
                "/".to_string()
            } else {
                trimmed
            };
            url.set_path(&trimmed);
        }
        Some(url.to_string())
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port() {
            Some(port) => write!(f, "{}://{}:{port}", self.scheme(), self.host()),
            None => write!(f, "{}://{}", self.scheme(), self.host()),
        }
    }
}

impl Serialize for Origin {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn is_valid_username(name: &str) -> bool {
    name.len() <= 63
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::disallowed_macros)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_username() {
        let origin = Origin::resolve("Example").unwrap();
        assert_eq!(origin.host(), "example.neocities.org");
        assert_eq!(origin.scheme(), "https");
        assert_eq!(origin.to_string(), "https://example.neocities.org");
    }

    #[test]
    fn test_resolves_bare_host_and_custom_domain() {
        let origin = Origin::resolve("example.neocities.org").unwrap();
        assert_eq!(origin.homepage(), "https://example.neocities.org/");

        let custom = Origin::resolve("  my-site.net/some/page ").unwrap();
        assert_eq!(custom.homepage(), "https://my-site.net/");
    }

    #[test]
    fn test_resolves_full_url_and_drops_path() {
        let origin = Origin::resolve("http://127.0.0.1:8080/deep/page.html?x=1").unwrap();
        assert_eq!(origin.homepage(), "http://127.0.0.1:8080/");
        assert_eq!(origin.port(), Some(8080));
    }

    #[test]
    fn test_loopback_defaults_to_http() {
        let origin = Origin::resolve("127.0.0.1:9000").unwrap();
        assert_eq!(origin.scheme(), "http");
    }

    #[test]
    fn test_rejects_invalid_identifiers() {
        assert!(matches!(Origin::resolve(""), Err(Error::InvalidOrigin(_))));
        assert!(matches!(
            Origin::resolve("ftp://example.com"),
            Err(Error::InvalidOrigin(_))
        ));
        assert!(matches!(
            Origin::resolve("not a site"),
            Err(Error::InvalidOrigin(_))
        ));
    }

    #[test]
    fn test_contains_is_scheme_insensitive_but_port_sensitive() {
        let origin = Origin::resolve("example").unwrap();
        assert!(origin.contains(&Url::parse("http://example.neocities.org/a").unwrap()));
        assert!(origin.contains(&Url::parse("https://EXAMPLE.neocities.org/a").unwrap()));
        assert!(!origin.contains(&Url::parse("https://example.neocities.org:8443/a").unwrap()));
        assert!(!origin.contains(&Url::parse("https://neocities.org/").unwrap()));
        assert!(!origin.contains(&Url::parse("ftp://example.neocities.org/").unwrap()));
    }

    #[test]
    fn test_normalize_identity_form() {
        let origin = Origin::resolve("example").unwrap();
        let cases = [
            (
                "http://example.neocities.org/a.html",
                "https://example.neocities.org/a.html",
            ),
            (
                "https://example.neocities.org/blog/",
                "https://example.neocities.org/blog",
            ),
            (
                "https://example.neocities.org/x.html#section",
                "https://example.neocities.org/x.html",
            ),
            (
                "https://example.neocities.org",
                "https://example.neocities.org/",
            ),
            (
                "https://example.neocities.org/p/?q=1",
                "https://example.neocities.org/p?q=1",
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(origin.normalize(input).as_deref(), Some(expected), "{input}");
        }
    }

    #[test]
    fn test_normalize_rejects_foreign_and_garbage() {
        let origin = Origin::resolve("example").unwrap();
        assert!(origin.normalize("https://evil.example.com/").is_none());
        assert!(origin.normalize("not a url").is_none());
        assert!(origin.normalize("mailto:me@example.neocities.org").is_none());
    }

    #[test]
    fn test_serializes_as_string() {
        let origin = Origin::resolve("example").unwrap();
        let json = serde_json::to_string(&origin).unwrap();
        assert_eq!(json, "\"https://example.neocities.org\"");
    }
}
