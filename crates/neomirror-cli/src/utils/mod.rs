//! Shared helpers for command implementations.

pub mod logging;
pub mod settings;

pub use logging::initialize_logging;
