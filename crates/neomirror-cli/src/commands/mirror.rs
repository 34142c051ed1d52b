//! Mirror command implementation

use anyhow::{Context, Result};
use neomirror_core::{DiscoveryEngine, MirrorPipeline, MirrorStore, mirror_site};
use std::path::PathBuf;
use tracing::warn;

use crate::output::{OutputFormat, Progress, json::MirrorJson, text};
use crate::utils::settings::Session;

/// Execute the mirror command
///
/// The output directory defaults to `./<host>` and is created before any
/// request is made.
pub async fn execute(
    session: &Session,
    output: Option<PathBuf>,
    format: OutputFormat,
    show_progress: bool,
) -> Result<()> {
    let origin = &session.run.origin;
    let root = output.unwrap_or_else(|| PathBuf::from(origin.host()));
    let store = MirrorStore::create(&root, origin.clone())
        .with_context(|| format!("Cannot prepare output directory {}", root.display()))?;

    let discovery = DiscoveryEngine::new(session.client.clone(), &session.run)
        .discover()
        .await;

    let progress = Progress::new(show_progress, "Downloading");
    let pipeline = MirrorPipeline::new(session.client.clone(), store, &session.run)
        .with_progress(progress.callback());
    let report = mirror_site(&pipeline, &discovery.set).await;
    progress.finish();

    if report.outcomes.failed_count() > 0 {
        warn!(
            failed = report.outcomes.failed_count(),
            "Some files could not be mirrored"
        );
    }

    match format {
        OutputFormat::Text => println!("{}", text::mirror(&discovery, &report)),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&MirrorJson::new(&discovery, &report))?
            );
        },
    }
    Ok(())
}
