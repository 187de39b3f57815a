//! User-facing diagnostic messages.
//!
//! Recoverable problems found during a build (unresolved dependencies, a
//! missing compiler, an empty source set) are collected as [`Diagnostic`]s
//! on the build report and logged as they happen.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Common suggestion messages.
pub mod suggestions {
    /// Suggestion when a `use` entry names no project.
    pub const UNKNOWN_DEPENDENCY: &str = "check the `use` list against the declared projects";

    /// Suggestion when the compiler is not on PATH.
    pub const MISSING_COMPILER: &str = "set `compiler:` in the project or workspace";

    /// Suggestion when no sources matched.
    pub const NO_SOURCES: &str = "check the `src` patterns relative to the build file";

    /// Suggestion when a build fails.
    pub const BUILD_FAILED: &str = "run `ymake build --verbose` to see the compiler invocations";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Project the diagnostic belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Additional context lines
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    /// Suggested fixes
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    /// Related location (file path)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity,
            project: None,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create a new note.
    pub fn note(message: impl Into<String>) -> Self {
        Self::new(Severity::Note, message)
    }

    /// Attach the owning project.
    pub fn for_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self) -> String {
        let mut output = String::new();

        match self.project {
            Some(ref project) => {
                output.push_str(&format!("{}: [{}] {}\n", self.severity, project, self.message))
            }
            None => output.push_str(&format!("{}: {}\n", self.severity, self.message)),
        }

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        for suggestion in &self.suggestions {
            output.push_str(&format!("  help: {}\n", suggestion));
        }

        output
    }

    /// Log the diagnostic at the level matching its severity.
    pub fn emit(&self) {
        let text = self.format();
        let text = text.trim_end();
        match self.severity {
            Severity::Error => tracing::error!("{}", text),
            Severity::Warning => tracing::warn!("{}", text),
            Severity::Note => tracing::info!("{}", text),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::warning("unknown dependency `net`")
            .for_project("app")
            .with_context("`app` uses `net`, which is not declared")
            .with_suggestion(suggestions::UNKNOWN_DEPENDENCY)
            .with_location("/ws/build.ymk");

        let output = diag.format();
        assert!(output.starts_with("warning: [app] unknown dependency `net`"));
        assert!(output.contains("--> /ws/build.ymk"));
        assert!(output.contains("= `app` uses `net`"));
        assert!(output.contains("help: check the `use` list"));
    }

    #[test]
    fn test_diagnostic_serializes_without_empty_fields() {
        let diag = Diagnostic::error("link failed");
        let json = serde_json::to_value(&diag).unwrap();

        assert_eq!(json["severity"], "error");
        assert!(json.get("context").is_none());
        assert!(json.get("project").is_none());
    }
}
