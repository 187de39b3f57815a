//! Build file front end.
//!
//! Reads a `build.ymk` file into a [`Workspace`]. The language is a small
//! nested `key: value` format:
//!
//! ```text
//! workspace: demo
//! dist: "bin"
//!
//! conf: debug { defines: [DEBUG] optimize: 0 }
//!
//! project: engine {
//!     kind: shared
//!     src: ["src/*.cpp"]
//!     inc: ["include"]
//! }
//! ```
//!
//! Syntax errors are returned as [`FrontendError`], which renders with the
//! offending span through `miette`. Unknown keys are logged as warnings.

pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::Workspace;

pub use error::{ErrorKind, FrontendError};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Token, TokenKind};

/// Default build file name.
pub const BUILD_FILE: &str = "build.ymk";

/// Parse build file source. `name` labels error reports; `root` becomes the
/// workspace root.
pub fn parse_str(
    src: &str,
    name: &str,
    root: impl Into<PathBuf>,
) -> Result<Workspace, FrontendError> {
    let tokens = Lexer::new(name, src).tokenize()?;
    let mut ws = Parser::new(name, src, tokens).parse(root)?;

    if ws.name.is_empty() {
        if let Some(dir) = ws.root.file_name() {
            ws.name = dir.to_string_lossy().into_owned();
        }
    }
    Ok(ws)
}

/// Read and parse the build file at `path`.
///
/// The workspace root is the canonical directory containing the file.
/// Parse failures are returned as a [`FrontendError`] inside the
/// `anyhow::Error`.
pub fn load(path: &Path) -> Result<Workspace> {
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read build file {}", path.display()))?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let root = dir
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", dir.display()))?;

    tracing::debug!("parsing {}", path.display());
    let ws = parse_str(&src, &path.display().to_string(), root)?;
    tracing::debug!(
        "workspace `{}`: {} projects, {} tasks",
        ws.name,
        ws.projects.len(),
        ws.tasks.len()
    );
    Ok(ws)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{write_file, TWO_PROJECT_BUILD_FILE};
    use tempfile::TempDir;

    #[test]
    fn test_load_sets_canonical_root() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sub").join(BUILD_FILE);
        write_file(&path, TWO_PROJECT_BUILD_FILE);

        let ws = load(&path).unwrap();

        assert_eq!(ws.root, tmp.path().join("sub").canonicalize().unwrap());
        assert_eq!(ws.dist_path(), ws.root.join("out/bin"));
        assert_eq!(ws.projects.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = load(&tmp.path().join("nope.ymk")).unwrap_err();
        assert!(err.to_string().contains("failed to read build file"));
    }

    #[test]
    fn test_load_parse_error_downcasts() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(BUILD_FILE);
        write_file(&path, "project: a {\n  kind: \"lib\"\n}\n");

        let err = load(&path).unwrap_err();
        let frontend = err.downcast_ref::<FrontendError>().unwrap();
        assert_eq!(frontend.line, 2);
    }

    #[test]
    fn test_workspace_name_defaults_to_directory() {
        let ws = parse_str("project: a {}", "inline", "/home/user/engine").unwrap();
        assert_eq!(ws.name, "engine");
    }
}
