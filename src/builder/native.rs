//! Native C/C++ build orchestration.
//!
//! [`NativeBuilder`] walks the workspace's projects in dependency order.
//! For each project it merges the configuration layers, wires in the
//! projects it uses, resolves sources, runs the per-source stale check and
//! compile on the worker pool, waits for the pool to drain and then links
//! on the calling thread. The build cache is flushed once at the end.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;

use crate::builder::cache::BuildCache;
use crate::builder::graph::ProjectGraph;
use crate::builder::report::{BuildReport, Failure, ProjectOutcome, ProjectStatus, Stage};
use crate::builder::scheduler::Scheduler;
use crate::builder::toolchain::{self, CompileCommand, Vendor};
use crate::core::{Config, Project, Workspace};
use crate::util::config::ToolConfig;
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::fs::{ensure_dir, GlobResolver, SourceResolver};
use crate::util::hash::short_hash;
use crate::util::process::{find_executable, CancellationToken, ProcessBuilder, ProcessError};

/// Configuration used when none is requested.
pub const DEFAULT_CONFIGURATION: &str = "debug";

/// Options for one build invocation.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Named configuration to activate (e.g. `debug`)
    pub configuration: String,
    /// Worker threads; 0 means available parallelism
    pub jobs: usize,
    /// Projects to build, with their dependencies; empty means all
    pub projects: Vec<String>,
    /// Link a project even if some of its sources failed to compile
    pub link_on_compile_failure: bool,
    /// Per-invocation timeout for compiler and linker processes
    pub compile_timeout: Option<Duration>,
    /// Show a progress bar while compiling
    pub progress: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            configuration: DEFAULT_CONFIGURATION.to_string(),
            jobs: 0,
            projects: Vec::new(),
            link_on_compile_failure: false,
            compile_timeout: None,
            progress: false,
        }
    }
}

impl BuildOptions {
    /// Options seeded from the tool configuration files.
    pub fn from_tool_config(config: &ToolConfig) -> Self {
        let build = &config.build;
        BuildOptions {
            configuration: build
                .configuration
                .clone()
                .unwrap_or_else(|| DEFAULT_CONFIGURATION.to_string()),
            jobs: build.jobs().unwrap_or(0),
            link_on_compile_failure: build.link_on_compile_failure.unwrap_or(false),
            compile_timeout: build.compile_timeout(),
            ..BuildOptions::default()
        }
    }
}

/// A source file that failed to compile.
#[derive(Debug, Error)]
#[error("failed to compile {}", source_path.display())]
pub struct CompileError {
    pub source_path: PathBuf,
    /// Exit code, when the compiler exited normally
    pub exit_code: Option<i32>,
    /// Process-level failure (spawn error, timeout, cancellation)
    #[source]
    pub cause: Option<ProcessError>,
}

impl CompileError {
    fn into_failure(self) -> Failure {
        let message = match (&self.cause, self.exit_code) {
            (Some(cause), _) => cause.to_string(),
            (None, Some(code)) => format!("compiler exited with status {}", code),
            (None, None) => "compiler was terminated by a signal".to_string(),
        };
        Failure::new(Stage::Compile, message)
            .with_path(self.source_path)
            .with_exit_code(self.exit_code)
    }
}

/// Deterministic object path for a source:
/// `<obj>/<project>/<file name>_<hash of full path>.<ext>`.
///
/// The hash keeps same-named files from different directories apart.
pub fn object_path(obj_dir: &Path, project: &str, source: &Path, vendor: Vendor) -> PathBuf {
    let file_name = source
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let hash = short_hash(&source.to_string_lossy());

    obj_dir.join(project).join(format!(
        "{}_{}.{}",
        file_name,
        hash,
        toolchain::object_extension(vendor)
    ))
}

/// One source's stale check and compile, run on a worker.
struct CompileJob {
    project: Arc<Project>,
    config: Arc<Config>,
    cache: Arc<BuildCache>,
    source: PathBuf,
    object: PathBuf,
    root: PathBuf,
    timeout: Option<Duration>,
    cancel: CancellationToken,
    stale: Arc<AtomicUsize>,
    compiled: Arc<AtomicUsize>,
    progress: ProgressBar,
}

impl CompileJob {
    fn run(self) -> Result<()> {
        let needs_compile = self
            .cache
            .needs_recompile(&self.project, &self.config, &self.source, &self.object)
            || !self.object.exists();

        if !needs_compile {
            tracing::debug!("fresh: {}", self.source.display());
            self.progress.inc(1);
            return Ok(());
        }

        self.stale.fetch_add(1, Ordering::SeqCst);

        let cmd = toolchain::compile_command(&self.project, &self.config, &self.source, &self.object);
        tracing::debug!("compile: {}", cmd);
        if let Some(name) = self.source.file_name() {
            self.progress.set_message(name.to_string_lossy().into_owned());
        }

        let result = run_command(&cmd, &self.root, self.timeout, &self.cancel);
        self.progress.inc(1);

        let error = match result {
            Ok(status) if status.success() => {
                self.compiled.fetch_add(1, Ordering::SeqCst);
                return Ok(());
            }
            Ok(status) => CompileError {
                source_path: self.source.clone(),
                exit_code: status.code(),
                cause: None,
            },
            Err(e) => CompileError {
                source_path: self.source.clone(),
                exit_code: None,
                cause: Some(e),
            },
        };

        // Retry this file next time instead of trusting its fingerprint.
        self.cache.forget(&self.object);
        Err(error.into())
    }
}

fn run_command(
    cmd: &CompileCommand,
    cwd: &Path,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> std::result::Result<std::process::ExitStatus, ProcessError> {
    ProcessBuilder::new(&cmd.program)
        .args(&cmd.args)
        .cwd(cwd)
        .timeout(timeout)
        .cancel_on(cancel)
        .status()
}

/// Builds the projects of a workspace.
pub struct NativeBuilder<'a> {
    ws: &'a Workspace,
    opts: BuildOptions,
    scheduler: Scheduler,
    cache: Arc<BuildCache>,
    cancel: CancellationToken,
    resolver: Box<dyn SourceResolver>,
}

impl<'a> NativeBuilder<'a> {
    /// Create a builder: loads the build cache and starts the worker pool.
    pub fn new(ws: &'a Workspace, opts: BuildOptions) -> Result<Self> {
        let cancel = CancellationToken::new();
        let cache = BuildCache::load(&ws.root)
            .with_timeout(opts.compile_timeout)
            .with_cancellation(cancel.clone());
        let scheduler = Scheduler::new(opts.jobs)?;

        Ok(NativeBuilder {
            ws,
            opts,
            scheduler,
            cache: Arc::new(cache),
            cancel,
            resolver: Box::new(GlobResolver::new(&ws.root)),
        })
    }

    /// Replace the source discovery strategy.
    pub fn with_resolver(mut self, resolver: Box<dyn SourceResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Token that aborts running compiler processes when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The build cache.
    pub fn cache(&self) -> &BuildCache {
        &self.cache
    }

    /// The build options.
    pub fn options(&self) -> &BuildOptions {
        &self.opts
    }

    /// Named configurations merged into every project: the host platform
    /// name, then the requested configuration.
    pub fn active_configs(&self) -> Vec<String> {
        let mut active = vec![std::env::consts::OS.to_string()];
        if self.opts.configuration != std::env::consts::OS {
            active.push(self.opts.configuration.clone());
        }
        active
    }

    fn index(&self) -> HashMap<&'a str, &'a Project> {
        self.ws
            .projects
            .iter()
            .map(|p| (p.name.as_str(), p))
            .collect()
    }

    /// Effective configuration of a project, with diagnostics about its
    /// dependencies.
    pub fn effective_config(&self, project: &Project) -> (Config, Vec<Diagnostic>) {
        let mut outcome = ProjectOutcome::new(&project.name);
        let config = self.resolve_config(project, &self.index(), &mut outcome);
        (config, outcome.diagnostics)
    }

    fn resolve_config(
        &self,
        project: &Project,
        index: &HashMap<&str, &Project>,
        outcome: &mut ProjectOutcome,
    ) -> Config {
        let mut config = self.ws.effective_config(project, &self.active_configs());

        for dep in &project.deps {
            let Some(dep_project) = index.get(dep.as_str()) else {
                outcome.diagnose(
                    Diagnostic::warning(format!("unknown dependency `{}`", dep))
                        .with_suggestion(suggestions::UNKNOWN_DEPENDENCY),
                );
                continue;
            };

            config
                .includes
                .extend(dep_project.public_includes().iter().cloned());

            if dep_project.kind.is_library() {
                config.links.push(dep.clone());
            } else {
                outcome.diagnose(Diagnostic::warning(format!(
                    "`{}` is an executable and cannot be linked",
                    dep
                )));
            }
        }

        config.lib_dirs.push(self.ws.dist_path().display().to_string());
        config
    }

    /// Build the projects selected in the options (all when none).
    ///
    /// Returns an error only for problems found before anything is built:
    /// a dependency cycle or an unknown selected project.
    pub fn build(&self) -> Result<BuildReport> {
        let selection = (!self.opts.projects.is_empty()).then_some(self.opts.projects.as_slice());
        self.build_selection(selection)
    }

    /// Build `selection` and its dependencies, or every project.
    pub fn build_selection(&self, selection: Option<&[String]>) -> Result<BuildReport> {
        let start = Instant::now();
        let index = self.index();
        let order = ProjectGraph::new(self.ws).build_order(selection)?;

        tracing::info!(
            "Building {} project(s) [{}]",
            order.len(),
            self.opts.configuration
        );

        let mut projects = Vec::with_capacity(order.len());
        for idx in order {
            if self.cancel.is_cancelled() {
                tracing::warn!("build cancelled");
                break;
            }
            projects.push(self.build_project(&self.ws.projects[idx], &index));
        }

        if let Err(e) = self.cache.save() {
            tracing::warn!("failed to save build cache: {:#}", e);
        }

        let report = BuildReport {
            configuration: self.opts.configuration.clone(),
            projects,
            duration_ms: start.elapsed().as_millis(),
        };

        tracing::info!(
            "Finished in {:.2}s ({} compiled)",
            start.elapsed().as_secs_f64(),
            report.compiled()
        );

        Ok(report)
    }

    fn build_project(&self, project: &Project, index: &HashMap<&str, &Project>) -> ProjectOutcome {
        let mut outcome = ProjectOutcome::new(&project.name);
        let config = self.resolve_config(project, index, &mut outcome);
        let (compiler, vendor) = toolchain::compiler_for(project, &config);

        if find_executable(compiler).is_none() && !Path::new(compiler).is_file() {
            outcome.diagnose(
                Diagnostic::warning(format!("compiler `{}` was not found on PATH", compiler))
                    .with_suggestion(suggestions::MISSING_COMPILER),
            );
        }

        for command in &project.pre_build {
            if let Err(failure) = self.run_hook(project, Stage::PreBuild, command) {
                outcome.fail(failure);
                return outcome;
            }
        }

        let sources = self.resolver.resolve(&project.sources);
        outcome.sources = sources.len();
        if sources.is_empty() {
            outcome.diagnose(
                Diagnostic::warning("no source files matched")
                    .with_suggestion(suggestions::NO_SOURCES),
            );
            return outcome;
        }

        let dist = self.ws.dist_path();
        let obj_root = self.ws.obj_path();
        if let Err(e) = ensure_dir(&dist).and_then(|_| ensure_dir(&obj_root.join(&project.name))) {
            outcome.fail(Failure::new(Stage::Setup, format!("{:#}", e)));
            return outcome;
        }

        tracing::info!(
            "Compiling {} ({} source(s), {})",
            project.name,
            sources.len(),
            vendor
        );

        let objects: Vec<PathBuf> = sources
            .iter()
            .map(|s| object_path(&obj_root, &project.name, s, vendor))
            .collect();

        let (stale, compiled) = self.compile_all(project, &config, &sources, &objects);
        outcome.stale = stale;
        outcome.compiled = compiled;

        for error in self.scheduler.take_failures() {
            match error.downcast::<CompileError>() {
                Ok(compile) => outcome.fail(compile.into_failure()),
                Err(other) => outcome.fail(Failure::new(Stage::Compile, format!("{:#}", other))),
            }
        }

        if outcome.failed() && !self.opts.link_on_compile_failure {
            outcome.diagnose(Diagnostic::note("not linking after compile errors"));
            return outcome;
        }

        let artifact = toolchain::artifact_path(&dist, project, vendor);
        let cmd = toolchain::link_command(project, &config, &objects, &artifact);
        tracing::info!("Linking {}", artifact.display());
        tracing::debug!("link: {}", cmd);

        match run_command(&cmd, &self.ws.root, self.opts.compile_timeout, &self.cancel) {
            Ok(status) if status.success() => outcome.artifact = Some(artifact),
            Ok(status) => {
                outcome.fail(
                    Failure::new(Stage::Link, "linker exited with an error")
                        .with_path(artifact)
                        .with_exit_code(status.code()),
                );
                return outcome;
            }
            Err(e) => {
                outcome.fail(Failure::new(Stage::Link, e.to_string()).with_path(artifact));
                return outcome;
            }
        }

        for command in &project.post_build {
            if let Err(failure) = self.run_hook(project, Stage::PostBuild, command) {
                outcome.fail(failure);
                break;
            }
        }

        if !outcome.failed() {
            outcome.status = ProjectStatus::Built;
        }
        outcome
    }

    /// Submit one job per source and wait for all of them.
    /// Returns the (stale, compiled) counts.
    fn compile_all(
        &self,
        project: &Project,
        config: &Config,
        sources: &[PathBuf],
        objects: &[PathBuf],
    ) -> (usize, usize) {
        let project = Arc::new(project.clone());
        let config = Arc::new(config.clone());
        let stale = Arc::new(AtomicUsize::new(0));
        let compiled = Arc::new(AtomicUsize::new(0));
        let progress = self.progress_bar(sources.len());

        for (source, object) in sources.iter().zip(objects) {
            let job = CompileJob {
                project: Arc::clone(&project),
                config: Arc::clone(&config),
                cache: Arc::clone(&self.cache),
                source: source.clone(),
                object: object.clone(),
                root: self.ws.root.clone(),
                timeout: self.opts.compile_timeout,
                cancel: self.cancel.clone(),
                stale: Arc::clone(&stale),
                compiled: Arc::clone(&compiled),
                progress: progress.clone(),
            };
            self.scheduler.submit(move || job.run());
        }

        self.scheduler.wait_until_idle();
        progress.finish_and_clear();

        (stale.load(Ordering::SeqCst), compiled.load(Ordering::SeqCst))
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.opts.progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        let style = ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    }

    /// Run a hook command in the workspace root. The command sees
    /// `YMAKE_PROJECT` and `YMAKE_CONFIG` in its environment.
    fn run_hook(
        &self,
        project: &Project,
        stage: Stage,
        command: &str,
    ) -> std::result::Result<(), Failure> {
        tracing::info!("Running {} hook `{}`", stage, command);

        let process = ProcessBuilder::shell(command)
            .cwd(&self.ws.root)
            .env("YMAKE_PROJECT", &project.name)
            .env("YMAKE_CONFIG", &self.opts.configuration)
            .cancel_on(&self.cancel);
        tracing::debug!("hook: {}", process.display_command());
        let status = process.status();

        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(Failure::new(stage, format!("`{}` failed", command))
                .with_exit_code(status.code())),
            Err(e) => Err(Failure::new(stage, format!("`{}`: {}", command, e))),
        }
    }
}
