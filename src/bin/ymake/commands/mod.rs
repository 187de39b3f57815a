//! Command implementations

use std::path::PathBuf;

use anyhow::Result;

use ymake::builder::BuildOptions;
use ymake::core::Workspace;
use ymake::util::config::load_for_workspace;

pub mod build;
pub mod clean;
pub mod completions;
pub mod flags;
pub mod task;

/// Options shared by every command.
pub struct GlobalArgs {
    pub file: PathBuf,
    pub verbose: bool,
}

impl GlobalArgs {
    /// Parse the build file.
    pub fn workspace(&self) -> Result<Workspace> {
        ymake::frontend::load(&self.file)
    }
}

/// Build options from the tool configuration of `ws`, with the
/// configuration name overridden when given.
pub fn build_options(ws: &Workspace, configuration: Option<String>) -> BuildOptions {
    let tool_config = load_for_workspace(&ws.root);
    let mut opts = BuildOptions::from_tool_config(&tool_config);
    if let Some(name) = configuration {
        opts.configuration = name;
    }
    opts
}
