//! `stratum clean` command

use anyhow::Result;

use crate::cli::GlobalArgs;
use crate::commands::load_workspace;
use stratum::ops;

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let (_, ws) = load_workspace(global)?;

    let removed = ops::clean(&ws)?;
    if global.verbose {
        for path in &removed {
            eprintln!("     Removed {}", path.display());
        }
    }
    eprintln!("     Removed {} file(s)", removed.len());

    Ok(())
}
