//! `stratum report` command

use anyhow::Result;

use crate::cli::{GlobalArgs, ReportArgs};
use crate::commands::load_workspace;
use stratum::ops::{self, ReportFormat};

pub fn execute(global: &GlobalArgs, args: ReportArgs) -> Result<()> {
    let (_, ws) = load_workspace(global)?;

    let format = if args.json {
        ReportFormat::Json
    } else {
        ReportFormat::Text
    };
    print!("{}", ops::report(&ws, format)?);

    Ok(())
}
