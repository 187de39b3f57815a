//! `ymake build` command

use std::io::IsTerminal;
use std::path::Path;

use anyhow::{bail, Result};

use crate::cli::{BuildArgs, MessageFormat};
use crate::commands::{build_options, GlobalArgs};
use ymake::builder::{BuildReport, NativeBuilder, ProjectStatus};
use ymake::util::diagnostic::suggestions;
use ymake::util::fs::relative_path;

pub fn execute(global: &GlobalArgs, args: BuildArgs) -> Result<()> {
    let ws = global.workspace()?;

    // CLI > tool config > defaults
    let mut opts = build_options(&ws, args.configuration);
    if let Some(jobs) = args.jobs {
        opts.jobs = jobs;
    }
    opts.projects = args.projects;
    opts.progress = args.message_format == MessageFormat::Human
        && !global.verbose
        && std::io::stderr().is_terminal();

    let builder = NativeBuilder::new(&ws, opts)?;
    let report = builder.build()?;

    match args.message_format {
        MessageFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        MessageFormat::Human => print_summary(&ws.root, &report),
    }

    if !report.success() {
        bail!("build failed\nhelp: {}", suggestions::BUILD_FAILED);
    }
    Ok(())
}

fn print_summary(root: &Path, report: &BuildReport) {
    for project in &report.projects {
        match project.status {
            ProjectStatus::Built => match project.artifact {
                Some(ref artifact) => eprintln!(
                    "    Finished `{}` -> {} ({} of {} compiled)",
                    project.name,
                    relative_path(root, artifact).display(),
                    project.compiled,
                    project.sources
                ),
                None => eprintln!("    Finished `{}`", project.name),
            },
            ProjectStatus::Skipped => eprintln!("     Skipped `{}`", project.name),
            ProjectStatus::Failed => {
                eprintln!("      Failed `{}`", project.name);
                for failure in &project.failures {
                    eprintln!("        {}", failure);
                }
            }
        }
    }
    eprintln!(
        "   Completed [{}] in {:.2}s",
        report.configuration,
        report.duration_ms as f64 / 1000.0
    );
}
