//! ymake - a parallel, incremental build orchestrator for C and C++
//!
//! A workspace is read from a `build.ymk` file by the [`frontend`], then
//! built project by project by the [`builder`]: sources are compiled in
//! parallel on a worker pool, skipped when their preprocessed content has
//! not changed since the last successful compile, and linked into
//! executables, shared or static libraries.

pub mod builder;
pub mod core;
pub mod frontend;
pub mod util;

/// Test utilities for ymake unit tests.
///
/// Only compiled for tests. Provides a fake compiler script and workspace
/// fixtures.
#[cfg(test)]
pub mod test_support;

pub use builder::{BuildOptions, BuildReport, NativeBuilder};
pub use crate::core::{Config, Project, Workspace};
pub use frontend::FrontendError;
