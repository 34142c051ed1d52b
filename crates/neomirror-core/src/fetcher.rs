//! HTTP access to the target site.
//!
//! Everything that talks to the network goes through [`HttpClient`], so the
//! discovery engine, the size estimator and the mirror pipeline can be driven
//! by a scripted client in tests. [`Fetcher`] is the reqwest-backed
//! implementation with a per-request timeout and bounded retries.

use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument};

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("neomirror/", env!("CARGO_PKG_VERSION"));

/// Upper bound for a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_millis(2_000);

/// Network settings shared by every request of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// Per-request timeout (connect + transfer).
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Extra attempts after a transient failure.
    pub retries: u32,
    /// First backoff delay; doubled on every further attempt.
    pub retry_base_delay: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retries: 2,
            retry_base_delay: Duration::from_millis(250),
        }
    }
}

/// A successfully fetched response body.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    /// Final URL after redirects; relative links in the body resolve against it.
    pub url: String,
    /// HTTP status (always a success status).
    pub status: u16,
    /// `Content-Type` header, if any.
    pub content_type: Option<String>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl FetchedBody {
    /// Body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Whether the server labelled the body as HTML.
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("html"))
    }
}

/// Metadata from a HEAD request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadInfo {
    /// HTTP status code returned by the server (e.g., 200, 404)
    pub status: u16,
    /// Optional content length reported by the server via `Content-Length`
    pub content_length: Option<u64>,
}

impl HeadInfo {
    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Abstraction over the HTTP operations the crawler needs.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET a URL, failing on any non-success status.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for 404, [`Error::HttpStatus`] for other non-2xx
    /// statuses, [`Error::Timeout`] or [`Error::Network`] for transport failures.
    async fn get(&self, url: &str) -> Result<FetchedBody>;

    /// HEAD a URL. Any status is returned as-is in [`HeadInfo`].
    ///
    /// # Errors
    ///
    /// [`Error::Timeout`] or [`Error::Network`] for transport failures.
    async fn head(&self, url: &str) -> Result<HeadInfo>;
}

/// reqwest-backed [`HttpClient`] with timeouts and retry/backoff.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    settings: HttpSettings,
}

impl Fetcher {
    /// Creates a fetcher with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(HttpSettings::default())
    }

    /// Creates a fetcher with custom settings
    pub fn with_settings(settings: HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client, settings })
    }

    /// Settings this fetcher was built with.
    #[must_use]
    pub const fn settings(&self) -> &HttpSettings {
        &self.settings
    }

    async fn get_once(&self, url: &str) -> Result<FetchedBody> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(std::string::ToString::to_string);

        let final_url = response.url().to_string();
        if final_url != url {
            debug!(from = %url, to = %final_url, "Followed redirect");
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(url, e))?;

        Ok(FetchedBody {
            url: final_url,
            status: status.as_u16(),
            content_type,
            body: body.to_vec(),
        })
    }

    async fn head_once(&self, url: &str) -> Result<HeadInfo> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;
        let status = response.status().as_u16();

        // Transient statuses go through the retry loop as errors
        if status == 429 || (500..=599).contains(&status) {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());

        Ok(HeadInfo {
            status,
            content_length,
        })
    }

    /// Run `attempt` until it succeeds, fails permanently, or retries run out.
    async fn retrying<T, F, Fut>(&self, url: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
    {
        let attempts = self.settings.retries.saturating_add(1);
        let mut i = 0;
        loop {
            match attempt().await {
                Err(e) if e.is_recoverable() && i + 1 < attempts => {
                    let delay = backoff_delay(self.settings.retry_base_delay, i);
                    debug!(url, attempt = i + 1, error = %e, ?delay, "Retrying after transient failure");
                    sleep(delay).await;
                    i += 1;
                },
                other => return other,
            }
        }
    }
}

#[async_trait]
impl HttpClient for Fetcher {
    #[instrument(skip(self), level = "debug")]
    async fn get(&self, url: &str) -> Result<FetchedBody> {
        self.retrying(url, || self.get_once(url)).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn head(&self, url: &str) -> Result<HeadInfo> {
        match self.retrying(url, || self.head_once(url)).await {
            // Retries exhausted on a transient status: report it, don't fail
            Err(Error::HttpStatus { status, .. }) => Ok(HeadInfo {
                status,
                content_length: None,
            }),
            other => other,
        }
    }
}

// Note: Default is not implemented as Fetcher::new() can fail.

/// Exponential backoff: `base * 2^attempt`, capped at two seconds.
pub(crate) fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

fn transport_error(url: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(url.to_string())
    } else {
        Error::Network(err)
    }
}
