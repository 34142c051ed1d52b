//! Progress display for pooled batches

use indicatif::{ProgressBar, ProgressStyle};
use neomirror_core::ProgressCallback;
use std::sync::Arc;

/// A progress bar that may be disabled.
///
/// When disabled, [`Progress::callback`] returns `None` and nothing is drawn.
pub struct Progress {
    bar: Option<ProgressBar>,
}

impl Progress {
    /// Create a bar labelled with `message`, or a no-op when not `enabled`.
    pub fn new(enabled: bool, message: &str) -> Self {
        let bar = enabled.then(|| {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb.set_message(message.to_string());
            pb
        });
        Self { bar }
    }

    /// Callback that advances the bar; batches report `(done, total)`.
    pub fn callback(&self) -> Option<ProgressCallback> {
        let bar = self.bar.clone()?;
        let callback: ProgressCallback = Arc::new(move |done, total| {
            bar.set_length(u64::try_from(total).unwrap_or(u64::MAX));
            bar.set_position(u64::try_from(done).unwrap_or(u64::MAX));
        });
        Some(callback)
    }

    /// Remove the bar from the terminal.
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::disallowed_macros)]
mod tests {
    use super::*;

    #[test]
    fn disabled_progress_has_no_callback() {
        let progress = Progress::new(false, "Probing");
        assert!(progress.callback().is_none());
        progress.finish();
    }

    #[test]
    fn callback_tracks_batch_position() {
        let progress = Progress::new(true, "Probing");
        let callback = progress.callback().unwrap();
        callback(3, 10);

        let bar = progress.bar.as_ref().unwrap();
        assert_eq!(bar.position(), 3);
        assert_eq!(bar.length(), Some(10));
    }
}
