//! Command implementations

pub mod build;
pub mod clean;
pub mod install;
pub mod package;
pub mod report;

use anyhow::Result;

use crate::cli::GlobalArgs;
use stratum::core::{BuildMode, ModulePath, Workspace};
use stratum::util::GlobalContext;

/// Locate the manifest and load the workspace in the selected mode.
pub fn load_workspace(global: &GlobalArgs) -> Result<(GlobalContext, Workspace)> {
    let gctx = GlobalContext::new()?;

    let manifest = match &global.manifest_path {
        Some(path) => gctx.cwd().join(path),
        None => gctx.find_manifest()?,
    };

    let mode = match &global.module {
        Some(module) => BuildMode::Standalone(ModulePath::new(module)),
        None => BuildMode::Project,
    };

    let ws = Workspace::load(&manifest, mode)?;
    Ok((gctx, ws))
}
