//! Implementation of `stratum clean`.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::Workspace;
use crate::ops::stratum_build::artifact_graph;
use crate::util::fs::remove_file_if_exists;

/// Remove every file the build writes. Returns the removed paths.
pub fn clean(ws: &Workspace) -> Result<Vec<PathBuf>> {
    let graph = artifact_graph(ws)?;
    let mut removed = Vec::new();

    for node in graph.outputs() {
        let Some(rel) = node.path.as_deref() else {
            continue;
        };
        if remove_file_if_exists(&ws.abs(rel))? {
            tracing::debug!("removed {}", rel.display());
            removed.push(rel.to_path_buf());
        }
    }

    tracing::info!("removed {} file(s)", removed.len());
    Ok(removed)
}
