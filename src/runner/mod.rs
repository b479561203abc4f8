//! Task definition and invocation
//!
//! This module holds the task model, the namespace tree and hook registry,
//! argument binding, flag resolution and the invoker that runs hook cascades.

pub mod args;
pub mod context;
pub mod docs;
pub mod executor;
pub mod flags;
pub mod invoke;
pub mod merge;
pub mod namespace;
pub mod registry;
pub mod task;

// Re-export main types
pub use args::*;
pub use context::*;
pub use docs::*;
pub use executor::*;
pub use flags::*;
pub use merge::*;
pub use namespace::*;
pub use registry::*;
pub use task::*;
