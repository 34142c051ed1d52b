//! neomirror CLI - discover, size and mirror Neocities sites
//!
//! This is the main entry point for the neomirror command-line interface.
//! Command implementations live in the library crate.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    neomirror_cli::run().await
}
