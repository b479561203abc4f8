//! CLI interface and argument parsing
//!
//! This module turns a namespace tree into a clap command line, runs the
//! requested task and handles shell completion.

pub mod app;

// Re-export main types
pub use app::*;
