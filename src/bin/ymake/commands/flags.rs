//! `ymake flags` command

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::cli::FlagsArgs;
use crate::commands::{build_options, GlobalArgs};
use ymake::builder::toolchain::{artifact_path, compile_command, compiler_for, link_command};
use ymake::builder::{object_path, NativeBuilder};
use ymake::util::{GlobResolver, SourceResolver};

pub fn execute(global: &GlobalArgs, args: FlagsArgs) -> Result<()> {
    let ws = global.workspace()?;

    let project = ws.project(&args.project).ok_or_else(|| {
        anyhow!(
            "project `{}` not found\nhelp: declared projects: {}",
            args.project,
            ws.projects
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })?;

    let mut opts = build_options(&ws, args.configuration);
    opts.jobs = 1;
    let builder = NativeBuilder::new(&ws, opts)?;
    let (config, diagnostics) = builder.effective_config(project);
    for diagnostic in &diagnostics {
        diagnostic.emit();
    }

    let sources = GlobResolver::new(&ws.root).resolve(&project.sources);
    let source = match args.source {
        Some(path) if path.is_absolute() => path,
        Some(path) => ws.root.join(path),
        None => sources
            .first()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("<source>")),
    };

    let (_, vendor) = compiler_for(project, &config);
    let obj_dir = ws.obj_path();
    let object = object_path(&obj_dir, &project.name, &source, vendor);

    let mut objects: Vec<PathBuf> = sources
        .iter()
        .map(|s| object_path(&obj_dir, &project.name, s, vendor))
        .collect();
    if objects.is_empty() {
        objects.push(object.clone());
    }

    let artifact = artifact_path(&ws.dist_path(), project, vendor);

    println!("# `{}` [{}] ({})", project.name, builder.active_configs().join(", "), vendor);
    println!("compile: {}", compile_command(project, &config, &source, &object));
    println!("link: {}", link_command(project, &config, &objects, &artifact));

    Ok(())
}
