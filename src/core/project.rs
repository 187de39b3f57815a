//! Project and task definitions - what gets built.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::config::Config;

/// The kind of artifact a project produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Executable binary
    #[default]
    Exe,

    /// Static library (.a / .lib)
    StaticLib,

    /// Shared/dynamic library (.so / .dylib / .dll)
    SharedLib,
}

impl ArtifactKind {
    /// Get the kind name as written in build files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Exe => "exe",
            ArtifactKind::StaticLib => "static",
            ArtifactKind::SharedLib => "shared",
        }
    }

    /// Whether other projects can link against this artifact.
    pub fn is_library(&self) -> bool {
        matches!(self, ArtifactKind::StaticLib | ArtifactKind::SharedLib)
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exe" => Ok(ArtifactKind::Exe),
            "static" => Ok(ArtifactKind::StaticLib),
            "shared" => Ok(ArtifactKind::SharedLib),
            other => Err(format!(
                "unknown artifact kind `{}`; expected `exe`, `static` or `shared`",
                other
            )),
        }
    }
}

/// Source language of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// C language
    C,
    /// C++ language (default)
    #[default]
    Cxx,
}

impl Language {
    /// Get the language name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cxx => "c++",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" => Ok(Language::C),
            "c++" | "cpp" | "cxx" => Ok(Language::Cxx),
            other => Err(format!(
                "unknown language `{}`; expected `c` or `c++`",
                other
            )),
        }
    }
}

/// A buildable project declared in the workspace.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Project {
    /// Project name, unique within the workspace
    pub name: String,

    /// Artifact produced by the link step
    pub kind: ArtifactKind,

    /// Source language
    pub language: Language,

    /// Base configuration layer
    pub base_config: Config,

    /// Named partial configurations (build modes, platforms)
    pub configs: BTreeMap<String, Config>,

    /// Source file patterns, relative to the workspace root
    pub sources: Vec<String>,

    /// Names of projects this project uses
    pub deps: Vec<String>,

    /// Shell commands run before compiling
    pub pre_build: Vec<String>,

    /// Shell commands run after a successful link
    pub post_build: Vec<String>,
}

impl Project {
    /// Create an empty project with the given name and kind.
    pub fn new(name: impl Into<String>, kind: ArtifactKind) -> Self {
        Project {
            name: name.into(),
            kind,
            ..Project::default()
        }
    }

    /// Include directories exported to projects that use this one.
    pub fn public_includes(&self) -> &[String] {
        &self.base_config.includes
    }
}

/// A named, independently runnable action.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Task {
    /// Task name
    pub name: String,

    /// Projects or tasks that must run first
    pub deps: Vec<String>,

    /// Shell commands, run in order
    pub commands: Vec<String>,
}

impl Task {
    /// Create an empty task.
    pub fn new(name: impl Into<String>) -> Self {
        Task {
            name: name.into(),
            ..Task::default()
        }
    }
}
