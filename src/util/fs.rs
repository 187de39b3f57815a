//! Filesystem utilities and source discovery.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Remove a file, if it exists.
pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("failed to remove file: {}", path.display()))?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Write a string to a file atomically: write a sibling temp file, then rename.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, contents)
        .with_context(|| format!("failed to write file: {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace file: {}", path.display()))
}

/// Canonicalize a path, but don't fail if it doesn't exist yet.
/// Returns the path as-is if canonicalization fails.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Turns source patterns into concrete files.
///
/// The builder only depends on this trait; [`GlobResolver`] is the
/// filesystem implementation used by the command line.
pub trait SourceResolver: Send + Sync {
    /// Resolve `patterns` to a sorted, deduplicated list of absolute paths.
    fn resolve(&self, patterns: &[String]) -> Vec<PathBuf>;
}

/// Resolves patterns like `src/**/*.cpp` relative to a base directory.
///
/// The wildcard-free leading components form the search root. A pattern
/// without wildcards names a single file; otherwise the root is walked
/// recursively and files whose name matches the last component are kept.
#[derive(Debug, Clone)]
pub struct GlobResolver {
    base: PathBuf,
}

impl GlobResolver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        GlobResolver { base: base.into() }
    }

    fn resolve_one(&self, pattern: &str, out: &mut Vec<PathBuf>) {
        let pattern_path = Path::new(pattern);
        let components: Vec<Component<'_>> = pattern_path
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();

        let wildcard_at = components
            .iter()
            .position(|c| has_wildcard(&c.as_os_str().to_string_lossy()));

        let Some(wildcard_at) = wildcard_at else {
            let file = self.base.join(pattern_path);
            if file.is_file() {
                out.push(normalize_path(&file));
            } else {
                tracing::debug!("source `{}` does not exist", file.display());
            }
            return;
        };

        let root: PathBuf = components[..wildcard_at].iter().collect();
        let root = self.base.join(root);
        if !root.is_dir() {
            tracing::debug!("search root `{}` does not exist", root.display());
            return;
        }

        let Some(last) = components.last() else {
            return;
        };
        let name_pattern = match glob::Pattern::new(&last.as_os_str().to_string_lossy()) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("invalid source pattern `{}`: {}", pattern, e);
                return;
            }
        };

        for entry in WalkDir::new(&root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("walk error: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if name_pattern.matches(&entry.file_name().to_string_lossy()) {
                out.push(normalize_path(entry.path()));
            }
        }
    }
}

impl SourceResolver for GlobResolver {
    fn resolve(&self, patterns: &[String]) -> Vec<PathBuf> {
        let mut results = Vec::new();
        for pattern in patterns {
            self.resolve_one(pattern, &mut results);
        }
        results.sort();
        results.dedup();
        results
    }
}

fn has_wildcard(s: &str) -> bool {
    s.contains(['*', '?', '['])
}
