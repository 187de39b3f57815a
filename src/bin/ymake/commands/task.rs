//! `ymake task` command

use anyhow::Result;

use crate::cli::TaskArgs;
use crate::commands::{build_options, GlobalArgs};
use ymake::builder::{NativeBuilder, TaskRunner};

pub fn execute(global: &GlobalArgs, args: TaskArgs) -> Result<()> {
    let ws = global.workspace()?;
    let opts = build_options(&ws, args.configuration);

    let builder = NativeBuilder::new(&ws, opts)?;
    let mut runner = TaskRunner::new(&ws, &builder);
    runner.run(&args.name)?;

    eprintln!("    Finished task `{}`", args.name);
    Ok(())
}
