//! C/C++ build orchestration.
//!
//! This module implements the compiler command synthesis, the incremental
//! build cache, the compile worker pool and the builder that drives them.

pub mod cache;
pub mod graph;
pub mod native;
pub mod report;
pub mod scheduler;
pub mod tasks;
pub mod toolchain;

pub use cache::{BuildCache, CacheEntry, CACHE_FILE_NAME};
pub use graph::{GraphError, ProjectGraph};
pub use native::{object_path, BuildOptions, CompileError, NativeBuilder, DEFAULT_CONFIGURATION};
pub use report::{BuildReport, Failure, ProjectOutcome, ProjectStatus, Stage};
pub use scheduler::Scheduler;
pub use tasks::{TaskError, TaskRunner};
pub use toolchain::{CompileCommand, Vendor};
