//! `ymake clean` command

use anyhow::Result;

use crate::cli::CleanArgs;
use crate::commands::GlobalArgs;
use ymake::builder::CACHE_FILE_NAME;
use ymake::util::fs::{remove_dir_all_if_exists, remove_file_if_exists};

pub fn execute(global: &GlobalArgs, args: CleanArgs) -> Result<()> {
    let ws = global.workspace()?;

    let obj_dir = ws.obj_path();
    remove_dir_all_if_exists(&obj_dir)?;
    eprintln!("     Removed {}", obj_dir.display());

    if args.cache {
        let cache = ws.root.join(CACHE_FILE_NAME);
        remove_file_if_exists(&cache)?;
        eprintln!("     Removed {}", cache.display());
    }

    Ok(())
}
