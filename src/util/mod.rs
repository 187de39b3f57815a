//! Shared utilities

pub mod config;
pub mod diagnostic;
pub mod fs;
pub mod hash;
pub mod process;

pub use config::ToolConfig;
pub use diagnostic::Diagnostic;
pub use fs::{GlobResolver, SourceResolver};
pub use process::{CancellationToken, ProcessBuilder, ProcessError};
