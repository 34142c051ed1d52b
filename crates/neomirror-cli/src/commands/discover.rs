//! Discover command implementation

use anyhow::Result;
use neomirror_core::DiscoveryEngine;
use tracing::info;

use crate::output::{OutputFormat, json::DiscoverJson, text};
use crate::utils::settings::Session;

/// Execute the discover command
pub async fn execute(session: &Session, format: OutputFormat) -> Result<()> {
    let discovery = DiscoveryEngine::new(session.client.clone(), &session.run)
        .discover()
        .await;
    info!(urls = discovery.set.len(), "Discovery complete");

    match format {
        OutputFormat::Text => println!("{}", text::discovery(&discovery)),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&DiscoverJson::new(&discovery))?
            );
        },
    }
    Ok(())
}
