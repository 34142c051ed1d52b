//! In-memory [`HttpClient`] for unit tests.
#![allow(clippy::unwrap_used, clippy::panic, clippy::disallowed_macros)]

use crate::fetcher::{FetchedBody, HeadInfo, HttpClient};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Reply {
    Body {
        content_type: &'static str,
        body: Vec<u8>,
    },
    Status(u16),
    Timeout,
    Redirect(String),
}

#[derive(Debug, Clone, Copy)]
enum HeadReply {
    Info(HeadInfo),
    Timeout,
}

#[derive(Debug, Default)]
struct Inner {
    gets: HashMap<String, Reply>,
    heads: HashMap<String, HeadReply>,
    get_calls: HashMap<String, usize>,
    head_calls: HashMap<String, usize>,
}

/// Scripted responses keyed by exact URL; unknown URLs answer 404.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedClient {
    inner: Arc<Mutex<Inner>>,
}

#[allow(clippy::unwrap_used)]
impl ScriptedClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Serve `html` as `text/html`.
    pub(crate) fn page(self, url: &str, html: &str) -> Self {
        self.reply(
            url,
            Reply::Body {
                content_type: "text/html",
                body: html.as_bytes().to_vec(),
            },
        )
    }

    /// Serve raw bytes as `application/octet-stream`.
    pub(crate) fn asset(self, url: &str, bytes: &[u8]) -> Self {
        self.reply(
            url,
            Reply::Body {
                content_type: "application/octet-stream",
                body: bytes.to_vec(),
            },
        )
    }

    /// Answer GET for `from` with whatever `to` serves, as a followed redirect.
    pub(crate) fn redirect(self, from: &str, to: &str) -> Self {
        self.reply(from, Reply::Redirect(to.to_string()))
    }

    /// Answer GET with a status.
    pub(crate) fn status(self, url: &str, status: u16) -> Self {
        self.reply(url, Reply::Status(status))
    }

    /// Make GET time out.
    pub(crate) fn timeout(self, url: &str) -> Self {
        self.reply(url, Reply::Timeout)
    }

    /// Answer HEAD with a status and optional length.
    pub(crate) fn head(self, url: &str, status: u16, content_length: Option<u64>) -> Self {
        self.inner.lock().unwrap().heads.insert(
            url.to_string(),
            HeadReply::Info(HeadInfo {
                status,
                content_length,
            }),
        );
        self
    }

    /// Make HEAD time out.
    pub(crate) fn head_timeout(self, url: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .heads
            .insert(url.to_string(), HeadReply::Timeout);
        self
    }

    /// Number of GET requests made for a URL.
    pub(crate) fn gets(&self, url: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .get_calls
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    /// Number of HEAD requests made for a URL.
    pub(crate) fn heads(&self, url: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .head_calls
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    fn reply(self, url: &str, reply: Reply) -> Self {
        self.inner
            .lock()
            .unwrap()
            .gets
            .insert(url.to_string(), reply);
        self
    }
}

#[async_trait]
#[allow(clippy::unwrap_used)]
impl HttpClient for ScriptedClient {
    async fn get(&self, url: &str) -> Result<FetchedBody> {
        let (final_url, reply) = {
            let mut inner = self.inner.lock().unwrap();
            *inner.get_calls.entry(url.to_string()).or_default() += 1;
            match inner.gets.get(url).cloned() {
                Some(Reply::Redirect(target)) => {
                    let reply = inner.gets.get(&target).cloned();
                    (target, reply)
                },
                reply => (url.to_string(), reply),
            }
        };
        let url = final_url.as_str();
        match reply {
            Some(Reply::Body { content_type, body }) => Ok(FetchedBody {
                url: url.to_string(),
                status: 200,
                content_type: Some(content_type.to_string()),
                body,
            }),
            Some(Reply::Status(status)) => Err(Error::HttpStatus {
                url: url.to_string(),
                status,
            }),
            Some(Reply::Timeout) => Err(Error::Timeout(url.to_string())),
            Some(Reply::Redirect(_)) => Err(Error::Other(format!("redirect loop at {url}"))),
            None => Err(Error::NotFound(url.to_string())),
        }
    }

    async fn head(&self, url: &str) -> Result<HeadInfo> {
        let reply = {
            let mut inner = self.inner.lock().unwrap();
            *inner.head_calls.entry(url.to_string()).or_default() += 1;
            inner.heads.get(url).copied()
        };
        match reply {
            Some(HeadReply::Info(info)) => Ok(info),
            Some(HeadReply::Timeout) => Err(Error::Timeout(url.to_string())),
            None => Ok(HeadInfo {
                status: 404,
                content_length: None,
            }),
        }
    }
}
