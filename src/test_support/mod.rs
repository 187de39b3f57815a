//! Test utilities for ymake unit tests.
//!
//! Provides a scriptable fake compiler (Unix only) so the cache and the
//! builder can be exercised end to end without a real toolchain, plus a
//! fixed [`SourceResolver`] for tests that should not touch the filesystem.
//!
//! # Example
//!
//! ```rust,ignore
//! let tmp = TempDir::new().unwrap();
//! let cc = fake_compiler(tmp.path());
//! let ws = shared_lib_workspace(tmp.path(), &cc);
//! let report = NativeBuilder::new(&ws, options("debug")).unwrap().build().unwrap();
//! assert_eq!(invocations(&cc), vec!["preprocess ...", "compile ...", "link "]);
//! ```

pub mod fixtures;

use std::fs;
use std::path::{Path, PathBuf};

pub use fixtures::*;

use crate::util::SourceResolver;

/// Shell script standing in for a GCC-style compiler driver.
///
/// - `-E`: writes one line per `-D`, `-I`, `-O` or `-std=` argument, then
///   the source, to the `-o` file
/// - `-c`: writes an object file; fails if the source contains `FAIL`
/// - otherwise: a link, writes the `-o` file
///
/// Every call appends `<mode> <source>` to `invocations.log` next to the
/// script.
#[cfg(unix)]
const FAKE_COMPILER: &str = r#"#!/bin/sh
log="$(dirname "$0")/invocations.log"
mode=link
out=""
src=""
prev=""
seen=""
for arg in "$@"; do
  case "$arg" in
    -E) mode=preprocess ;;
    -c) mode=compile ;;
    -D*|-I*|-O*|-std=*) seen="$seen# $arg
" ;;
    *.c|*.cc|*.cpp|*.cxx) src="$arg" ;;
  esac
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  prev="$arg"
done
echo "$mode $src" >> "$log"
case "$mode" in
  preprocess)
    { printf '%s' "$seen"; cat "$src"; } > "$out"
    ;;
  compile)
    if grep -q FAIL "$src"; then
      echo "$src: error: FAIL" >&2
      exit 1
    fi
    echo "object $src" > "$out"
    ;;
  link)
    echo "linked $*" > "$out"
    ;;
esac
"#;

/// Write the fake compiler into `dir` and return its path.
#[cfg(unix)]
pub fn fake_compiler(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-gcc");
    fs::write(&path, FAKE_COMPILER).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Lines logged by the fake compiler at `compiler`, in call order.
pub fn invocations(compiler: &Path) -> Vec<String> {
    let log = compiler
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("invocations.log");
    fs::read_to_string(log)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Invocations of one mode (`preprocess`, `compile` or `link`).
pub fn invocations_of(compiler: &Path, mode: &str) -> Vec<String> {
    invocations(compiler)
        .into_iter()
        .filter(|line| line.split(' ').next() == Some(mode))
        .collect()
}

/// Write a file, creating parent directories.
pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// A resolver that returns a fixed file list regardless of patterns.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    pub files: Vec<PathBuf>,
}

impl StaticResolver {
    pub fn new(files: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut files: Vec<PathBuf> = files.into_iter().collect();
        files.sort();
        files.dedup();
        StaticResolver { files }
    }
}

impl SourceResolver for StaticResolver {
    fn resolve(&self, patterns: &[String]) -> Vec<PathBuf> {
        if patterns.is_empty() {
            Vec::new()
        } else {
            self.files.clone()
        }
    }
}
