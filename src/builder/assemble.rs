//! Static-archive and shared-object assembly.
//!
//! Both assemblers delete any previous output first, so objects dropped from
//! a library never linger in it.

use std::path::{Path, PathBuf};

use crate::builder::context::BuildContext;
use crate::builder::errors::BuildError;
use crate::builder::toolchain::LinkInput;
use crate::util::fs::{ensure_parent, remove_file_if_exists};
use crate::util::paths::to_slash;

fn prepare(ctx: &BuildContext, output: &Path) -> Result<(), BuildError> {
    let abs = ctx.abs(output);
    let fail = |e: anyhow::Error| BuildError::ActionFailed {
        artifact: to_slash(output),
        command: String::new(),
        output: format!("{:#}", e),
    };
    ensure_parent(&abs).map_err(fail)?;
    remove_file_if_exists(&abs).map_err(fail)?;
    Ok(())
}

/// Archive `objects`, in order, into `output`.
pub fn archive(ctx: &BuildContext, objects: &[PathBuf], output: &Path) -> Result<(), BuildError> {
    prepare(ctx, output)?;

    let spec = ctx.toolchain().archive_command(&LinkInput {
        objects,
        archives: &[],
        output,
    });
    tracing::debug!("creating static library {}", output.display());
    ctx.run(&to_slash(output), &spec)
}

/// Link `objects` into a shared object. Archives are never inputs.
pub fn shared(ctx: &BuildContext, objects: &[PathBuf], output: &Path) -> Result<(), BuildError> {
    prepare(ctx, output)?;

    let spec = ctx.toolchain().shared_command(&LinkInput {
        objects,
        archives: &[],
        output,
    });
    tracing::debug!("creating shared library {}", output.display());
    ctx.run(&to_slash(output), &spec)
}
