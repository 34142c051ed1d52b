//! Command implementations for the neomirror CLI.
//!
//! Each command resolves a [`Session`](crate::utils::settings::Session),
//! runs discovery and then its own stage on top of the discovered set.

mod completions;
mod discover;
mod mirror;
mod size;

pub use completions::generate;
pub use discover::execute as discover;
pub use mirror::execute as mirror;
pub use size::execute as size;
