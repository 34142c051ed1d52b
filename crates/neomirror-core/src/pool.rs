//! Bounded-concurrency execution of per-URL work.
//!
//! A [`WorkerPool`] runs one future per item with at most `concurrency` in
//! flight, enforces an optional per-item time budget, and hands every result
//! back to the calling task. Callers merge results serially, so no shared
//! mutable state is needed between workers.

use crate::{Error, Result};
use futures::stream::{self, StreamExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Hard ceiling for concurrent requests against one site.
pub const MAX_CONCURRENCY: usize = 64;

/// Progress callback type for reporting batch progress.
///
/// Called with (completed, total) after each item finishes.
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Runs batches of independent tasks with bounded concurrency.
///
/// ```rust
/// use neomirror_core::pool::WorkerPool;
///
/// # async fn example() {
/// let pool = WorkerPool::new(4);
/// let results = pool
///     .run(vec![1u32, 2, 3], |n| async move { Ok::<_, neomirror_core::Error>(n * 10) })
///     .await;
/// assert_eq!(results.len(), 3);
/// # }
/// ```
#[derive(Clone)]
pub struct WorkerPool {
    concurrency: usize,
    item_timeout: Option<Duration>,
    progress: Option<ProgressCallback>,
}

impl WorkerPool {
    /// Create a pool; `concurrency` is clamped to `1..=MAX_CONCURRENCY`.
    #[must_use]
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.clamp(1, MAX_CONCURRENCY),
            item_timeout: None,
            progress: None,
        }
    }

    /// Fail any single item that runs longer than `timeout`.
    #[must_use]
    pub const fn with_item_timeout(mut self, timeout: Duration) -> Self {
        self.item_timeout = Some(timeout);
        self
    }

    /// Set a progress callback.
    #[must_use]
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Set an already shared progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Get current concurrency level.
    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run `work` for every item, returning `(item, result)` pairs in
    /// completion order.
    ///
    /// An item that exceeds the time budget yields [`Error::Timeout`]; the
    /// other items are unaffected.
    pub async fn run<I, T, F, Fut>(&self, items: Vec<I>, work: F) -> Vec<(I, Result<T>)>
    where
        I: Clone + fmt::Display + Send,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T>> + Send,
    {
        if items.is_empty() {
            return Vec::new();
        }

        let total = items.len();
        let completed = Arc::new(AtomicUsize::new(0));
        let work = &work;

        stream::iter(items)
            .map(|item| {
                let completed = Arc::clone(&completed);
                let progress = self.progress.clone();
                let timeout = self.item_timeout;

                async move {
                    let key = item.clone();
                    let fut = work(item);
                    let result = match timeout {
                        Some(budget) => tokio::time::timeout(budget, fut)
                            .await
                            .unwrap_or_else(|_| Err(Error::Timeout(key.to_string()))),
                        None => fut.await,
                    };

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(cb) = progress {
                        cb(done, total);
                    }

                    (key, result)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("concurrency", &self.concurrency)
            .field("item_timeout", &self.item_timeout)
            .field("has_progress", &self.progress.is_some())
            .finish()
    }
}
