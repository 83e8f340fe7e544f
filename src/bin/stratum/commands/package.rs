//! `stratum package` command

use anyhow::Result;

use crate::cli::{GlobalArgs, PackageArgs};
use crate::commands::load_workspace;
use stratum::ops::{self, PackageOptions};

pub fn execute(global: &GlobalArgs, args: PackageArgs) -> Result<()> {
    let (_, ws) = load_workspace(global)?;

    let output = ops::package(&ws, &PackageOptions { tag: args.tag })?;
    println!("{}", output.display());

    Ok(())
}
