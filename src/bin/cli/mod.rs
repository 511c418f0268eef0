//! CLI Module Organization
//!
//! - args: CLI argument structures
//! - commands: logging setup, configuration merging and the move itself

pub mod args;
pub mod commands;

// Re-export commonly used items for convenience
pub use args::*;
pub use commands::*;
