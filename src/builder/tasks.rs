//! Named tasks: shell commands with project and task prerequisites.

use std::collections::HashSet;

use anyhow::{bail, Result};
use thiserror::Error;

use crate::builder::graph::GraphError;
use crate::builder::native::NativeBuilder;
use crate::builder::report::BuildReport;
use crate::core::Workspace;
use crate::util::process::ProcessBuilder;

/// A task command that did not succeed.
#[derive(Debug, Error)]
#[error(
    "task `{task}`: `{command}` failed{}",
    .exit_code.map(|c| format!(" with exit code {}", c)).unwrap_or_default()
)]
pub struct TaskError {
    pub task: String,
    pub command: String,
    pub exit_code: Option<i32>,
}

/// Runs tasks, building prerequisite projects through a [`NativeBuilder`].
///
/// Within one runner every task runs at most once and every project is
/// built at most once.
pub struct TaskRunner<'b, 'a> {
    ws: &'a Workspace,
    builder: &'b NativeBuilder<'a>,
    finished: HashSet<String>,
    built: HashSet<String>,
    active: Vec<String>,
    reports: Vec<BuildReport>,
}

impl<'b, 'a> TaskRunner<'b, 'a> {
    pub fn new(ws: &'a Workspace, builder: &'b NativeBuilder<'a>) -> Self {
        TaskRunner {
            ws,
            builder,
            finished: HashSet::new(),
            built: HashSet::new(),
            active: Vec::new(),
            reports: Vec::new(),
        }
    }

    /// Build reports of the projects built as prerequisites.
    pub fn reports(&self) -> &[BuildReport] {
        &self.reports
    }

    /// Run task `name` after its prerequisites.
    pub fn run(&mut self, name: &str) -> Result<()> {
        let ws = self.ws;
        let Some(task) = ws.task(name) else {
            bail!(GraphError::UnknownTask(name.to_string()));
        };

        if self.finished.contains(name) {
            return Ok(());
        }
        if self.active.iter().any(|t| t == name) {
            bail!(GraphError::TaskCycle(name.to_string()));
        }
        self.active.push(name.to_string());

        for dep in &task.deps {
            if ws.task(dep).is_some() {
                self.run(dep)?;
            } else if ws.project(dep).is_some() {
                self.build_project(dep)?;
            } else {
                bail!(GraphError::UnknownTaskDependency {
                    task: name.to_string(),
                    name: dep.clone(),
                });
            }
        }

        for command in &task.commands {
            tracing::info!("[{}] {}", name, command);
            let status = ProcessBuilder::shell(command)
                .cwd(&ws.root)
                .cancel_on(&self.builder.cancellation_token())
                .status()?;

            if !status.success() {
                bail!(TaskError {
                    task: name.to_string(),
                    command: command.clone(),
                    exit_code: status.code(),
                });
            }
        }

        self.active.pop();
        self.finished.insert(name.to_string());
        Ok(())
    }

    fn build_project(&mut self, name: &str) -> Result<()> {
        if self.built.contains(name) {
            return Ok(());
        }

        let selection = [name.to_string()];
        let report = self.builder.build_selection(Some(&selection))?;
        let success = report.success();
        for outcome in &report.projects {
            self.built.insert(outcome.name.clone());
        }
        self.reports.push(report);

        if !success {
            bail!("building `{}` failed", name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BuildOptions;
    use crate::core::Task;
    use tempfile::TempDir;

    fn task(name: &str, deps: &[&str], commands: &[&str]) -> Task {
        let mut t = Task::new(name);
        t.deps = deps.iter().map(|d| d.to_string()).collect();
        t.commands = commands.iter().map(|c| c.to_string()).collect();
        t
    }

    fn workspace(tmp: &TempDir, tasks: Vec<Task>) -> Workspace {
        let mut ws = Workspace::new("demo", tmp.path());
        ws.tasks = tasks;
        ws
    }

    #[test]
    fn test_unknown_task() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp, vec![]);
        let builder = NativeBuilder::new(&ws, BuildOptions::default()).unwrap();

        let err = TaskRunner::new(&ws, &builder).run("deploy").unwrap_err();
        assert_eq!(
            err.downcast_ref::<GraphError>(),
            Some(&GraphError::UnknownTask("deploy".into()))
        );
    }

    #[test]
    fn test_unknown_dependency() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp, vec![task("deploy", &["nothing"], &[])]);
        let builder = NativeBuilder::new(&ws, BuildOptions::default()).unwrap();

        let err = TaskRunner::new(&ws, &builder).run("deploy").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GraphError>(),
            Some(GraphError::UnknownTaskDependency { name, .. }) if name == "nothing"
        ));
    }

    #[test]
    fn test_task_cycle() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(
            &tmp,
            vec![task("a", &["b"], &[]), task("b", &["a"], &[])],
        );
        let builder = NativeBuilder::new(&ws, BuildOptions::default()).unwrap();

        let err = TaskRunner::new(&ws, &builder).run("a").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GraphError>(),
            Some(GraphError::TaskCycle(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_dependencies_run_once_in_order() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(
            &tmp,
            vec![
                task("gen", &[], &["echo gen >> order.txt"]),
                task("lint", &["gen"], &["echo lint >> order.txt"]),
                task("all", &["gen", "lint"], &["echo all >> order.txt"]),
            ],
        );
        let builder = NativeBuilder::new(&ws, BuildOptions::default()).unwrap();

        TaskRunner::new(&ws, &builder).run("all").unwrap();

        let order = std::fs::read_to_string(tmp.path().join("order.txt")).unwrap();
        assert_eq!(order, "gen\nlint\nall\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_first_failing_command_aborts() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(
            &tmp,
            vec![task("bad", &[], &["exit 4", "touch never.txt"])],
        );
        let builder = NativeBuilder::new(&ws, BuildOptions::default()).unwrap();

        let err = TaskRunner::new(&ws, &builder).run("bad").unwrap_err();
        let task_err = err.downcast_ref::<TaskError>().unwrap();
        assert_eq!(task_err.exit_code, Some(4));
        assert_eq!(task_err.to_string(), "task `bad`: `exit 4` failed with exit code 4");
        assert!(!tmp.path().join("never.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_project_dependency_is_built() {
        use crate::test_support::{fake_compiler, invocations_of, options, shared_lib_workspace};

        let tmp = TempDir::new().unwrap();
        let cc = fake_compiler(tmp.path());
        let mut ws = shared_lib_workspace(tmp.path(), &cc);
        ws.tasks = vec![task("ship", &["net"], &["test -f bin/net.*"])];
        let builder = NativeBuilder::new(&ws, options("debug")).unwrap();

        let mut runner = TaskRunner::new(&ws, &builder);
        runner.run("ship").unwrap();

        assert_eq!(runner.reports().len(), 1);
        assert_eq!(invocations_of(&cc, "link").len(), 1);
    }
}
