//! Content classification of discovered URLs.
//!
//! Pages are crawled for further links; assets are only downloaded. The class
//! is decided from the final path segment's extension alone, so the same URL
//! always lands in the same class.
//!
//! ```rust
//! use neomirror_core::discovery::classify::{classify, ContentClass};
//!
//! assert_eq!(classify("https://example.neocities.org/"), ContentClass::Page);
//! assert_eq!(classify("https://example.neocities.org/about"), ContentClass::Page);
//! assert_eq!(classify("https://example.neocities.org/style.CSS"), ContentClass::Asset);
//! assert_eq!(classify("not a url"), ContentClass::Unknown);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Extensions served as HTML documents.
const PAGE_EXTENSIONS: &[&str] = &["html", "htm", "xhtml", "shtml"];

/// Extensions of static files that are downloaded but never crawled.
const ASSET_EXTENSIONS: &[&str] = &[
    // images
    "jpg", "jpeg", "png", "gif", "webp", "avif", "svg", "ico", "bmp", "tif", "tiff", "apng",
    // styles, scripts, data
    "css", "js", "mjs", "json", "xml", "txt", "csv", "map", "wasm", "rss", "atom",
    // fonts
    "woff", "woff2", "ttf", "otf", "eot",
    // audio and video
    "mp3", "ogg", "wav", "flac", "m4a", "opus", "mid", "midi", "mp4", "webm", "mov", "avi", "mkv",
    // documents and archives
    "pdf", "zip", "gz", "tar", "7z", "rar", "swf", "epub",
];

/// Content class of a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentClass {
    /// An HTML page (or an extension-less path, which a static host serves as one).
    Page,
    /// A static file: image, stylesheet, script, font, media, archive...
    Asset,
    /// The URL could not be parsed far enough to find a path.
    Unknown,
}

impl ContentClass {
    /// Lowercase label used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Asset => "asset",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ContentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a URL string.
///
/// Unparsable input is [`ContentClass::Unknown`]; everything else goes
/// through [`classify_url`].
#[must_use]
pub fn classify(url: &str) -> ContentClass {
    Url::parse(url).map_or(ContentClass::Unknown, |parsed| classify_url(&parsed))
}

/// Classify a parsed URL by the extension of its final path segment.
///
/// Matching is case-insensitive. HTML-like or missing extensions are pages;
/// every other extension, listed in the asset table or not, is an asset since
/// a static site serves it as a plain file.
#[must_use]
pub fn classify_url(url: &Url) -> ContentClass {
    let Some(mut segments) = url.path_segments() else {
        return ContentClass::Unknown;
    };
    let last = segments.next_back().unwrap_or_default();

    match extension(last) {
        None => ContentClass::Page,
        Some(ext) if PAGE_EXTENSIONS.contains(&ext.as_str()) => ContentClass::Page,
        Some(ext) => {
            if !is_known_asset_extension(&ext) {
                tracing::trace!(url = %url, ext = %ext, "Unlisted extension treated as asset");
            }
            ContentClass::Asset
        },
    }
}

/// Whether an extension is in the known asset table.
#[must_use]
pub fn is_known_asset_extension(ext: &str) -> bool {
    let lower = ext.to_ascii_lowercase();
    ASSET_EXTENSIONS.contains(&lower.as_str())
}

/// Lowercased extension of a path segment.
///
/// Dotfiles (`.htaccess`) and trailing dots have no extension.
pub(crate) fn extension(segment: &str) -> Option<String> {
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
