//! Size command implementation

use anyhow::Result;
use neomirror_core::{DiscoveryEngine, SizeEstimator};

use crate::output::{OutputFormat, Progress, json::SizeJson, text};
use crate::utils::settings::Session;

/// Execute the size command
///
/// `top` falls back to the configured ranking length.
pub async fn execute(
    session: &Session,
    top: Option<usize>,
    format: OutputFormat,
    show_progress: bool,
) -> Result<()> {
    let mut discovery = DiscoveryEngine::new(session.client.clone(), &session.run)
        .discover()
        .await;

    let progress = Progress::new(show_progress, "Probing sizes");
    let report = SizeEstimator::new(session.client.clone(), &session.run)
        .with_progress(progress.callback())
        .estimate(&mut discovery.set)
        .await;
    progress.finish();

    let top = top.unwrap_or(session.defaults.top);
    let default_size = session.run.default_size;
    match format {
        OutputFormat::Text => println!("{}", text::size(&discovery, &report, top, default_size)),
        OutputFormat::Json => {
            let view = SizeJson::new(&discovery, &report, top, default_size);
            println!("{}", serde_json::to_string_pretty(&view)?);
        },
    }
    Ok(())
}
