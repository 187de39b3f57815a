//! Build outcomes.
//!
//! A [`BuildReport`] is what `build()` returns: one [`ProjectOutcome`] per
//! project that was considered, in build order. It serializes to JSON for
//! `ymake build --message-format json`.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::util::Diagnostic;

/// Build stage a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Setup,
    PreBuild,
    Compile,
    Link,
    PostBuild,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Setup => "setup",
            Stage::PreBuild => "pre-build",
            Stage::Compile => "compile",
            Stage::Link => "link",
            Stage::PostBuild => "post-build",
        };
        f.write_str(s)
    }
}

/// One failed step.
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub stage: Stage,
    pub message: String,
    /// Source file or artifact involved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Exit code of the failed process, when it exited normally
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl Failure {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Failure {
            stage,
            message: message.into(),
            path: None,
            exit_code: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed", self.stage)?;
        if let Some(ref path) = self.path {
            write!(f, " for {}", path.display())?;
        }
        if let Some(code) = self.exit_code {
            write!(f, " (exit code {})", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// How a project's build ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    /// Compiled (as needed) and linked
    Built,
    /// Nothing to do: no sources, or no objects to link
    Skipped,
    /// A hook, compile or link step failed
    Failed,
}

/// Result of building one project.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectOutcome {
    pub name: String,
    pub status: ProjectStatus,
    /// Number of resolved sources
    pub sources: usize,
    /// Sources found stale
    pub stale: usize,
    /// Sources compiled successfully
    pub compiled: usize,
    /// Linked artifact, when the link step ran successfully
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<Failure>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ProjectOutcome {
    pub fn new(name: impl Into<String>) -> Self {
        ProjectOutcome {
            name: name.into(),
            status: ProjectStatus::Skipped,
            sources: 0,
            stale: 0,
            compiled: 0,
            artifact: None,
            failures: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Record a failure and mark the project failed.
    pub fn fail(&mut self, failure: Failure) {
        tracing::error!("[{}] {}", self.name, failure);
        self.failures.push(failure);
        self.status = ProjectStatus::Failed;
    }

    /// Record a diagnostic and log it.
    pub fn diagnose(&mut self, diagnostic: Diagnostic) {
        let diagnostic = diagnostic.for_project(&self.name);
        diagnostic.emit();
        self.diagnostics.push(diagnostic);
    }

    /// Whether any failure was recorded.
    pub fn failed(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Result of a whole build invocation.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    /// Named configuration that was active
    pub configuration: String,
    pub projects: Vec<ProjectOutcome>,
    pub duration_ms: u128,
}

impl BuildReport {
    /// True when no project recorded a failure.
    pub fn success(&self) -> bool {
        self.projects.iter().all(|p| !p.failed())
    }

    /// Look up the outcome for a project.
    pub fn project(&self, name: &str) -> Option<&ProjectOutcome> {
        self.projects.iter().find(|p| p.name == name)
    }

    /// Total number of stale sources.
    pub fn stale(&self) -> usize {
        self.projects.iter().map(|p| p.stale).sum()
    }

    /// Total number of compiled sources.
    pub fn compiled(&self) -> usize {
        self.projects.iter().map(|p| p.compiled).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_marks_report_unsuccessful() {
        let mut ok = ProjectOutcome::new("core");
        ok.status = ProjectStatus::Built;

        let mut bad = ProjectOutcome::new("app");
        bad.fail(
            Failure::new(Stage::Compile, "compiler exited with an error")
                .with_path("/ws/src/main.cpp")
                .with_exit_code(Some(1)),
        );

        let report = BuildReport {
            configuration: "debug".into(),
            projects: vec![ok, bad],
            duration_ms: 12,
        };

        assert!(!report.success());
        assert_eq!(report.project("app").unwrap().status, ProjectStatus::Failed);
        assert_eq!(
            report.project("app").unwrap().failures[0].to_string(),
            "compile failed for /ws/src/main.cpp (exit code 1): compiler exited with an error"
        );
    }

    #[test]
    fn test_report_serializes() {
        let mut outcome = ProjectOutcome::new("net");
        outcome.status = ProjectStatus::Built;
        outcome.artifact = Some(PathBuf::from("/ws/bin/net.so"));

        let report = BuildReport {
            configuration: "release".into(),
            projects: vec![outcome],
            duration_ms: 3,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["configuration"], "release");
        assert_eq!(json["projects"][0]["status"], "built");
        assert_eq!(json["projects"][0]["artifact"], "/ws/bin/net.so");
        assert!(json["projects"][0].get("failures").is_none());
    }
}
