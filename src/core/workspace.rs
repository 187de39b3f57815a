//! Workspace - the root of the project graph.
//!
//! A Workspace is produced once by the front end and then only read by the
//! builder. Relative directories are resolved against the workspace root,
//! which is the directory containing the build file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::core::{Config, Project, Task};

/// Default output directory for linked artifacts.
pub const DEFAULT_DIST_DIR: &str = "bin";

/// Default directory for intermediate object files.
pub const DEFAULT_OBJ_DIR: &str = "build";

/// A workspace containing projects, tasks and shared configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Workspace {
    /// Workspace name
    pub name: String,

    /// Directory the build file lives in
    pub root: PathBuf,

    /// Output directory for linked artifacts
    pub dist_dir: PathBuf,

    /// Directory for intermediate object files
    pub obj_dir: PathBuf,

    /// Configuration applied to every project
    pub base_config: Config,

    /// Named configurations applied to every project
    pub configs: BTreeMap<String, Config>,

    /// Projects, in declaration order
    pub projects: Vec<Project>,

    /// Tasks, in declaration order
    pub tasks: Vec<Task>,
}

impl Default for Workspace {
    fn default() -> Self {
        Workspace {
            name: String::new(),
            root: PathBuf::from("."),
            dist_dir: PathBuf::from(DEFAULT_DIST_DIR),
            obj_dir: PathBuf::from(DEFAULT_OBJ_DIR),
            base_config: Config::default(),
            configs: BTreeMap::new(),
            projects: Vec::new(),
            tasks: Vec::new(),
        }
    }
}

impl Workspace {
    /// Create an empty workspace rooted at `root`.
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Workspace {
            name: name.into(),
            root: root.into(),
            ..Workspace::default()
        }
    }

    /// Absolute output directory for artifacts.
    pub fn dist_path(&self) -> PathBuf {
        self.root.join(&self.dist_dir)
    }

    /// Absolute directory for intermediate objects.
    pub fn obj_path(&self) -> PathBuf {
        self.root.join(&self.obj_dir)
    }

    /// Look up a project by name.
    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    /// Look up a task by name.
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Compute the merged configuration for a project.
    ///
    /// Layers, lowest precedence first:
    /// 1. the project's base config
    /// 2. the workspace base config
    /// 3. the workspace named configs, in `active` order
    /// 4. the project's named configs, in `active` order
    ///
    /// Dependency includes and link targets are added by the builder on top
    /// of this.
    pub fn effective_config(&self, project: &Project, active: &[String]) -> Config {
        let mut config = project.base_config.clone();
        config.merge(&self.base_config);

        for name in active {
            if let Some(layer) = self.configs.get(name) {
                config.merge(layer);
            }
        }

        for name in active {
            if let Some(layer) = project.configs.get(name) {
                config.merge(layer);
            }
        }

        config
    }
}
