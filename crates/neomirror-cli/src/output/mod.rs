//! # Output Formatting
//!
//! Every command renders its report either as human-readable text (colors,
//! human byte sizes) or as a single pretty-printed JSON document:
//!
//! ```bash
//! neomirror size example --top 3
//! neomirror size example --format json | jq '.total_bytes'
//! ```
//!
//! - [`text`]: human-readable reports
//! - [`json`]: serializable views of the core reports
//! - [`progress`]: progress bars for probe and fetch batches

pub mod json;
pub mod progress;
pub mod text;

use is_terminal::IsTerminal;

pub use progress::Progress;

/// Output format options supported by the CLI
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty text output (default)
    Text,
    /// Single JSON document
    Json,
}

/// Whether progress bars should be drawn.
///
/// Only text output gets them, and only when stderr is a terminal.
pub fn progress_enabled(format: OutputFormat, quiet: bool) -> bool {
    matches!(format, OutputFormat::Text) && !quiet && std::io::stderr().is_terminal()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::disallowed_macros)]
mod tests {
    use super::*;

    #[test]
    fn json_and_quiet_never_draw_progress() {
        assert!(!progress_enabled(OutputFormat::Json, false));
        assert!(!progress_enabled(OutputFormat::Text, true));
    }
}
