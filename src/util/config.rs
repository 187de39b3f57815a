//! Tool configuration file support.
//!
//! ymake reads two optional configuration files:
//! - Global: `~/.ymake/config.toml` - user-wide defaults
//! - Project: `<root>/.ymake/config.toml` - workspace overrides
//!
//! Project config takes precedence over global config. Command-line flags
//! take precedence over both.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the per-user and per-workspace configuration directory.
pub const CONFIG_DIR: &str = ".ymake";

/// ymake tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Build settings
    pub build: BuildSettings,
}

/// Build-related settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Number of worker threads (0 or absent = available parallelism)
    pub jobs: Option<usize>,

    /// Named configuration used when none is given on the command line
    pub configuration: Option<String>,

    /// Link a project even if some of its sources failed to compile
    pub link_on_compile_failure: Option<bool>,

    /// Per-invocation compiler timeout in seconds
    pub compile_timeout: Option<u64>,
}

impl BuildSettings {
    /// Worker count, with 0 treated as "auto".
    pub fn jobs(&self) -> Option<usize> {
        self.jobs.filter(|&n| n > 0)
    }

    /// Compiler timeout, if configured.
    pub fn compile_timeout(&self) -> Option<Duration> {
        self.compile_timeout.map(Duration::from_secs)
    }
}

impl ToolConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: ToolConfig) {
        let build = other.build;
        if build.jobs.is_some() {
            self.build.jobs = build.jobs;
        }
        if build.configuration.is_some() {
            self.build.configuration = build.configuration;
        }
        if build.link_on_compile_failure.is_some() {
            self.build.link_on_compile_failure = build.link_on_compile_failure;
        }
        if build.compile_timeout.is_some() {
            self.build.compile_timeout = build.compile_timeout;
        }
    }
}

/// Get the global ymake config directory (`~/.ymake`).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR))
}

/// Get the global config path (`~/.ymake/config.toml`).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the workspace config path (`<root>/.ymake/config.toml`).
pub fn project_config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_DIR).join("config.toml")
}

/// Load merged configuration from explicit global and project locations.
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> ToolConfig {
    let mut config = ToolConfig::default();

    if let Some(global_path) = global_path {
        config.merge(ToolConfig::load_or_default(global_path));
    }

    config.merge(ToolConfig::load_or_default(project_path));

    config
}

/// Load merged configuration for the workspace rooted at `root`.
pub fn load_for_workspace(root: &Path) -> ToolConfig {
    let global = global_config_path();
    load_config(global.as_deref(), &project_config_path(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_project_overrides_global() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = tmp.path().join("project.toml");

        std::fs::write(
            &global,
            "[build]\njobs = 2\nconfiguration = \"release\"\ncompile_timeout = 60\n",
        )
        .unwrap();
        std::fs::write(&project, "[build]\njobs = 8\n").unwrap();

        let config = load_config(Some(&global), &project);

        assert_eq!(config.build.jobs(), Some(8));
        assert_eq!(config.build.configuration.as_deref(), Some("release"));
        assert_eq!(
            config.build.compile_timeout(),
            Some(Duration::from_secs(60))
        );
        assert_eq!(config.build.link_on_compile_failure, None);
    }

    #[test]
    fn test_invalid_file_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[build\njobs = ").unwrap();

        assert_eq!(ToolConfig::load_or_default(&path), ToolConfig::default());
    }

    #[test]
    fn test_zero_jobs_means_auto() {
        let settings = BuildSettings {
            jobs: Some(0),
            ..BuildSettings::default()
        };
        assert_eq!(settings.jobs(), None);
    }
}
