//! `stratum build` and the `build-*` shortcuts

use anyhow::Result;

use crate::cli::{BuildArgs, GlobalArgs};
use crate::commands::load_workspace;
use stratum::builder::Aggregate;
use stratum::ops::{self, BuildOptions};

pub fn execute(global: &GlobalArgs, args: BuildArgs) -> Result<()> {
    run(global, args.target)
}

pub fn execute_aggregate(global: &GlobalArgs, agg: Aggregate) -> Result<()> {
    run(global, agg.name().to_string())
}

fn run(global: &GlobalArgs, target: String) -> Result<()> {
    let (gctx, ws) = load_workspace(global)?;

    let opts = BuildOptions {
        target,
        jobs: global.jobs,
        verbose: global.verbose,
    };
    ops::build(&ws, &gctx, &opts)?;

    Ok(())
}
