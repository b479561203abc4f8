//! Taskhook - hookable task definitions for command-line task runners
//!
//! Tasks are plain Rust closures registered in a tree of namespaces. Each task
//! can rename or alias its command-line flags, and a task marked as hookable
//! runs every same-named task found elsewhere in the tree after itself,
//! merging all of their results into one value.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;

// Re-export commonly used types
pub use error::{Result, TaskhookError};
pub use runner::{task, CallArgs, Context, Namespace, Task, TaskArgs, TaskContext};

/// Current version of Taskhook
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
