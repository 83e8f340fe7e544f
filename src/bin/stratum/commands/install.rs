//! `stratum install` and its parts

use anyhow::Result;

use crate::cli::{GlobalArgs, InstallArgs};
use crate::commands::load_workspace;
use stratum::ops::{self, InstallOptions};

fn options(global: &GlobalArgs, args: InstallArgs) -> InstallOptions {
    InstallOptions {
        prefix: args.prefix,
        jobs: global.jobs,
        verbose: global.verbose,
    }
}

pub fn execute(global: &GlobalArgs, args: InstallArgs) -> Result<()> {
    let (gctx, ws) = load_workspace(global)?;
    ops::install(&ws, &gctx, &options(global, args))
}

pub fn execute_bin(global: &GlobalArgs, args: InstallArgs) -> Result<()> {
    let (gctx, ws) = load_workspace(global)?;
    let installed = ops::install_bin(&ws, &gctx, &options(global, args))?;
    eprintln!("   Installed {} program(s)", installed.len());
    Ok(())
}

pub fn execute_lib(global: &GlobalArgs, args: InstallArgs) -> Result<()> {
    let (gctx, ws) = load_workspace(global)?;
    let installed = ops::install_lib(&ws, &gctx, &options(global, args))?;
    eprintln!(
        "   Installed {} static librar{}",
        installed.len(),
        if installed.len() == 1 { "y" } else { "ies" }
    );
    Ok(())
}

pub fn execute_include(global: &GlobalArgs, args: InstallArgs) -> Result<()> {
    let (_, ws) = load_workspace(global)?;
    ops::install_include(&ws, &options(global, args))
}
