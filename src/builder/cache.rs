//! Persistent build cache for incremental builds.
//!
//! Each source file is fingerprinted by the content of its *preprocessed*
//! output under the exact configuration it is compiled with, so edits to
//! included headers, defines, include paths or the language standard all
//! make the source stale. Entries are keyed by object path, so a source
//! shared by several projects is tracked once per project. Fingerprints
//! persist in `<root>/.ymake.cache`, one line per object:
//!
//! ```text
//! <object path> <fingerprint> <timestamp>
//! ```
//!
//! The timestamp column is written as 0 and never compared.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Result;

use crate::builder::toolchain;
use crate::core::{Config, Project};
use crate::util::fs::write_atomic;
use crate::util::hash::fingerprint_bytes;
use crate::util::process::{CancellationToken, ProcessBuilder};

/// File name of the cache, relative to the workspace root.
pub const CACHE_FILE_NAME: &str = ".ymake.cache";

/// Cached state for one object file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    /// Fingerprint of the preprocessed source
    pub fingerprint: u64,
    /// Reserved; always 0
    pub timestamp: u64,
}

/// Object path to fingerprint store, shared by compile workers.
#[derive(Debug)]
pub struct BuildCache {
    path: PathBuf,
    root: PathBuf,
    entries: Mutex<BTreeMap<PathBuf, CacheEntry>>,
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl BuildCache {
    /// Load the cache for the workspace rooted at `root`.
    ///
    /// A missing file yields an empty cache. An unreadable or corrupt file
    /// also yields an empty cache, with a warning.
    pub fn load(root: &Path) -> Self {
        let path = root.join(CACHE_FILE_NAME);

        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match parse_entries(&contents) {
                Ok(entries) => entries,
                Err(line) => {
                    tracing::warn!(
                        "ignoring corrupt build cache {} (line {})",
                        path.display(),
                        line
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("failed to read build cache {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        tracing::debug!("loaded {} cache entries from {}", entries.len(), path.display());

        BuildCache {
            path,
            root: root.to_path_buf(),
            entries: Mutex::new(entries),
            timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Bound every preprocessor invocation by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Abort preprocessor invocations when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Path of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<PathBuf, CacheEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Look up the entry for an object.
    pub fn get(&self, object: &Path) -> Option<CacheEntry> {
        self.entries().get(object).copied()
    }

    /// Number of cached objects.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether the cache has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Record a fingerprint for an object.
    pub fn update(&self, object: &Path, fingerprint: u64) {
        self.entries().insert(
            object.to_path_buf(),
            CacheEntry {
                fingerprint,
                timestamp: 0,
            },
        );
    }

    /// Drop the entry for an object so the next check reports it stale.
    pub fn forget(&self, object: &Path) {
        self.entries().remove(object);
    }

    /// Fingerprint the preprocessed form of `source` under `config`.
    ///
    /// The preprocessor writes to `scratch`, which is removed afterwards.
    /// Returns `None` if preprocessing fails or produces nothing readable.
    pub fn fingerprint(
        &self,
        project: &Project,
        config: &Config,
        source: &Path,
        scratch: &Path,
    ) -> Option<u64> {
        let cmd = toolchain::preprocess_command(project, config, source, scratch);
        tracing::debug!("preprocess: {}", cmd);

        let status = ProcessBuilder::new(&cmd.program)
            .args(&cmd.args)
            .cwd(&self.root)
            .timeout(self.timeout)
            .cancel_on(&self.cancel)
            .status();

        let fingerprint = match status {
            Ok(status) if status.success() => match fs::read(scratch) {
                Ok(content) => Some(fingerprint_bytes(&content)),
                Err(e) => {
                    tracing::debug!("no preprocessor output for {}: {}", source.display(), e);
                    None
                }
            },
            Ok(status) => {
                tracing::debug!("preprocessing {} failed: {}", source.display(), status);
                None
            }
            Err(e) => {
                tracing::debug!("preprocessing {} failed: {}", source.display(), e);
                None
            }
        };

        if let Err(e) = fs::remove_file(scratch) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::debug!("failed to remove {}: {}", scratch.display(), e);
            }
        }

        fingerprint
    }

    /// Check whether `source` must be recompiled into `object` under
    /// `config`.
    ///
    /// Stale when there is no entry for `object`, the fingerprint changed,
    /// or the preprocessor failed. A stale object with a fresh fingerprint
    /// is recorded immediately. Preprocessor output goes to a scratch file
    /// next to the object.
    pub fn needs_recompile(
        &self,
        project: &Project,
        config: &Config,
        source: &Path,
        object: &Path,
    ) -> bool {
        let scratch = object.with_extension("i");
        let Some(fingerprint) = self.fingerprint(project, config, source, &scratch) else {
            return true;
        };

        let mut entries = self.entries();
        match entries.get(object) {
            Some(entry) if entry.fingerprint == fingerprint => false,
            _ => {
                entries.insert(
                    object.to_path_buf(),
                    CacheEntry {
                        fingerprint,
                        timestamp: 0,
                    },
                );
                true
            }
        }
    }

    /// Write every entry to the cache file, sorted by path.
    pub fn save(&self) -> Result<()> {
        let contents = render_entries(&self.entries());
        write_atomic(&self.path, &contents)?;
        tracing::debug!("saved build cache to {}", self.path.display());
        Ok(())
    }
}

fn render_entries(entries: &BTreeMap<PathBuf, CacheEntry>) -> String {
    let mut out = String::new();
    for (path, entry) in entries {
        out.push_str(&format!(
            "{} {} {}\n",
            path.display(),
            entry.fingerprint,
            entry.timestamp
        ));
    }
    out
}

/// Parse cache lines. On failure, returns the 1-based number of the first
/// malformed line.
fn parse_entries(contents: &str) -> std::result::Result<BTreeMap<PathBuf, CacheEntry>, usize> {
    let mut entries = BTreeMap::new();

    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        // Split from the right so paths may contain spaces.
        let mut fields = line.rsplitn(3, ' ');
        let (Some(timestamp), Some(fingerprint), Some(path)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(idx + 1);
        };

        let (Ok(fingerprint), Ok(timestamp)) = (fingerprint.parse(), timestamp.parse()) else {
            return Err(idx + 1);
        };
        if path.is_empty() {
            return Err(idx + 1);
        }

        entries.insert(
            PathBuf::from(path),
            CacheEntry {
                fingerprint,
                timestamp,
            },
        );
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let cache = BuildCache::load(tmp.path());
        assert!(cache.is_empty());
        assert_eq!(cache.path(), tmp.path().join(CACHE_FILE_NAME));
    }

    #[test]
    fn test_save_and_reload() {
        let tmp = TempDir::new().unwrap();
        let cache = BuildCache::load(tmp.path());
        cache.update(Path::new("/ws/src/b.cpp"), 42);
        cache.update(Path::new("/ws/my sources/a.cpp"), u64::MAX);
        cache.save().unwrap();

        let text = fs::read_to_string(tmp.path().join(CACHE_FILE_NAME)).unwrap();
        assert_eq!(
            text,
            format!("/ws/my sources/a.cpp {} 0\n/ws/src/b.cpp 42 0\n", u64::MAX)
        );

        let reloaded = BuildCache::load(tmp.path());
        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded.get(Path::new("/ws/my sources/a.cpp")),
            Some(CacheEntry {
                fingerprint: u64::MAX,
                timestamp: 0
            })
        );
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CACHE_FILE_NAME),
            "/ws/a.cpp 1 0\n/ws/b.cpp not-a-number 0\n",
        )
        .unwrap();

        assert!(BuildCache::load(tmp.path()).is_empty());
    }

    #[test]
    fn test_forget_drops_entry() {
        let tmp = TempDir::new().unwrap();
        let cache = BuildCache::load(tmp.path());
        cache.update(Path::new("a.c"), 1);
        cache.forget(Path::new("a.c"));
        assert_eq!(cache.get(Path::new("a.c")), None);
    }

    #[test]
    fn test_failed_preprocess_is_stale() {
        let tmp = TempDir::new().unwrap();
        let cache = BuildCache::load(tmp.path());
        let mut project = Project::new("app", crate::core::ArtifactKind::Exe);
        project.language = crate::core::Language::C;
        let config = Config {
            compiler: "ymake-no-such-compiler".into(),
            ..Config::default()
        };
        let source = tmp.path().join("main.c");
        fs::write(&source, "int main(void) { return 0; }").unwrap();

        let object = tmp.path().join("main.o");
        assert!(cache.needs_recompile(&project, &config, &source, &object));
        assert!(cache.needs_recompile(&project, &config, &source, &object));
        // nothing was recorded
        assert!(cache.is_empty());
    }

    #[cfg(unix)]
    mod with_fake_compiler {
        use super::*;
        use crate::core::ArtifactKind;
        use crate::test_support::fake_compiler;

        fn setup() -> (TempDir, Project, Config, PathBuf) {
            let tmp = TempDir::new().unwrap();
            let compiler = fake_compiler(tmp.path());
            let source = tmp.path().join("net.cpp");
            fs::write(&source, "int answer() { return 42; }\n").unwrap();

            let project = Project::new("net", ArtifactKind::SharedLib);
            let config = Config {
                compiler: compiler.display().to_string(),
                cpp_std: Some("c++17".into()),
                defines: vec!["A".into()],
                ..Config::default()
            };
            (tmp, project, config, source)
        }

        #[test]
        fn test_unchanged_source_is_fresh() {
            let (tmp, project, config, source) = setup();
            let cache = BuildCache::load(tmp.path());
            let object = tmp.path().join("net.o");

            assert!(cache.needs_recompile(&project, &config, &source, &object));
            assert!(!cache.needs_recompile(&project, &config, &source, &object));
            assert!(!object.with_extension("i").exists());
        }

        #[test]
        fn test_fingerprint_survives_reload() {
            let (tmp, project, config, source) = setup();
            let object = tmp.path().join("net.o");

            let cache = BuildCache::load(tmp.path());
            assert!(cache.needs_recompile(&project, &config, &source, &object));
            cache.save().unwrap();

            let cache = BuildCache::load(tmp.path());
            assert!(!cache.needs_recompile(&project, &config, &source, &object));
        }

        #[test]
        fn test_config_changes_make_source_stale() {
            let (tmp, project, config, source) = setup();
            let cache = BuildCache::load(tmp.path());
            let object = tmp.path().join("net.o");
            assert!(cache.needs_recompile(&project, &config, &source, &object));

            let mut with_define = config.clone();
            with_define.defines.push("B".into());
            assert!(cache.needs_recompile(&project, &with_define, &source, &object));

            let mut with_include = with_define.clone();
            with_include.includes.push("include".into());
            assert!(cache.needs_recompile(&project, &with_include, &source, &object));

            let mut with_std = with_include.clone();
            with_std.cpp_std = Some("c++20".into());
            assert!(cache.needs_recompile(&project, &with_std, &source, &object));

            assert!(!cache.needs_recompile(&project, &with_std, &source, &object));
        }

        #[test]
        fn test_fingerprint_ignores_output_path() {
            let (tmp, project, config, source) = setup();
            let cache = BuildCache::load(tmp.path());

            let a = cache.fingerprint(&project, &config, &source, &tmp.path().join("a.i"));
            let b = cache.fingerprint(&project, &config, &source, &tmp.path().join("b.i"));
            assert!(a.is_some());
            assert_eq!(a, b);
        }

        #[test]
        fn test_objects_sharing_a_source_are_tracked_separately() {
            let (tmp, project, config, source) = setup();
            let cache = BuildCache::load(tmp.path());
            let net = tmp.path().join("net/net.o");
            let other = tmp.path().join("other/net.o");
            fs::create_dir_all(net.parent().unwrap()).unwrap();
            fs::create_dir_all(other.parent().unwrap()).unwrap();

            assert!(cache.needs_recompile(&project, &config, &source, &net));
            assert!(cache.needs_recompile(&project, &config, &source, &other));
            assert_eq!(cache.len(), 2);

            fs::write(&source, "int answer() { return 43; }\n").unwrap();
            assert!(cache.needs_recompile(&project, &config, &source, &net));
            assert!(cache.needs_recompile(&project, &config, &source, &other));
            assert!(!cache.needs_recompile(&project, &config, &source, &other));
        }

        #[test]
        fn test_source_edit_makes_source_stale() {
            let (tmp, project, config, source) = setup();
            let cache = BuildCache::load(tmp.path());
            let object = tmp.path().join("net.o");
            assert!(cache.needs_recompile(&project, &config, &source, &object));

            fs::write(&source, "int answer() { return 43; }\n").unwrap();
            assert!(cache.needs_recompile(&project, &config, &source, &object));
        }
    }
}
