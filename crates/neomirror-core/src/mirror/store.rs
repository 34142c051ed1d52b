//! Local storage for mirrored files.
//!
//! Every URL maps to exactly one path under the mirror root, derived from the
//! URL path alone so the mapping is stable between runs:
//!
//! | URL path           | Local path              |
//! |--------------------|-------------------------|
//! | `/`                | `index.html`            |
//! | `/blog/`           | `blog/index.html`       |
//! | `/about`           | `about.html`            |
//! | `/img/a%20b.png?v` | `img/a b.png`           |

use crate::discovery::classify::extension;
use crate::{Error, Origin, Result};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use url::Url;

const INDEX_FILE: &str = "index.html";

/// Characters replaced with `_` in local file names.
const UNSAFE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Mirror output directory for one origin.
#[derive(Debug, Clone)]
pub struct MirrorStore {
    root: PathBuf,
    origin: Origin,
}

impl MirrorStore {
    /// Open (creating if needed) the mirror directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the directory cannot be created.
    pub fn create(root: impl Into<PathBuf>, origin: Origin) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            Error::Storage(format!(
                "cannot create output directory '{}': {e}",
                root.display()
            ))
        })?;
        debug!(root = %root.display(), "Mirror directory ready");
        Ok(Self { root, origin })
    }

    /// Mirror root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Origin whose files this store holds.
    #[must_use]
    pub const fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Absolute local path for a URL, or `None` for unparsable or off-origin URLs.
    #[must_use]
    pub fn path_for(&self, url: &str) -> Option<PathBuf> {
        let parsed = Url::parse(url).ok()?;
        if !self.origin.contains(&parsed) {
            return None;
        }
        Some(self.root.join(local_path(&parsed)))
    }

    /// Whether the file for a URL already exists on disk.
    #[must_use]
    pub fn exists(&self, url: &str) -> bool {
        self.path_for(url).is_some_and(|p| p.is_file())
    }

    /// Write a URL's body to its local path, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] for off-origin URLs and [`Error::Io`]
    /// if the file cannot be written.
    #[instrument(skip(self, bytes), fields(len = bytes.len()), level = "debug")]
    pub async fn write(&self, url: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self
            .path_for(url)
            .ok_or_else(|| Error::InvalidUrl(format!("'{url}' is not on {}", self.origin)))?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Read a mirrored file back as text (invalid UTF-8 replaced).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read.
    pub async fn read_text(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Path of a URL relative to the mirror root.
///
/// Query and fragment are ignored, `.`/`..`/empty segments dropped,
/// percent-escapes decoded, and characters unsafe in file names replaced.
#[must_use]
pub fn local_path(url: &Url) -> PathBuf {
    let mut parts: Vec<String> = url
        .path_segments()
        .map(|segments| segments.filter_map(sanitize_segment).collect())
        .unwrap_or_default();

    if parts.is_empty() || url.path().ends_with('/') {
        parts.push(INDEX_FILE.to_string());
    } else if let Some(last) = parts.last_mut() {
        if extension(last).is_none() {
            last.push_str(".html");
        }
    }

    parts.iter().collect()
}

fn sanitize_segment(raw: &str) -> Option<String> {
    let decoded = urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw));
    let safe: String = decoded
        .chars()
        .map(|c| {
            if c.is_control() || UNSAFE_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();
    let safe = safe.trim();
    if safe.is_empty() || safe == "." || safe == ".." {
        None
    } else {
        Some(safe.to_string())
    }
}
