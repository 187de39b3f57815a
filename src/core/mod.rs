//! Core data structures for ymake.
//!
//! This module contains the project graph produced by the front end and
//! consumed by the builder:
//! - Layered compiler configuration (`Config`)
//! - Projects, artifact kinds and tasks
//! - The workspace aggregate

pub mod config;
pub mod project;
pub mod workspace;

pub use config::Config;
pub use project::{ArtifactKind, Language, Project, Task};
pub use workspace::{Workspace, DEFAULT_DIST_DIR, DEFAULT_OBJ_DIR};
