//! Native action runner.
//!
//! Brings one graph node up to date: compiles, archives, links or runs a
//! generator, after deciding whether the existing output is still fresh.

use std::collections::HashSet;
use std::path::Path;
use std::time::SystemTime;

use petgraph::graph::NodeIndex;

use crate::builder::assemble;
use crate::builder::context::BuildContext;
use crate::builder::errors::BuildError;
use crate::builder::graph::{ArtifactGraph, BuildAction, GraphNode};
use crate::builder::toolchain::{CommandSpec, CompileInput, LinkInput};
use crate::util::fs::{ensure_parent, remove_file_if_exists};

/// What happened to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// An action ran and produced the output
    Built,
    /// Output already up to date, or nothing to run
    Fresh,
}

/// Native C-family and Fortran builder.
pub struct NativeBuilder<'a> {
    ctx: &'a BuildContext,
}

impl<'a> NativeBuilder<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        NativeBuilder { ctx }
    }

    /// Bring `idx` up to date. `built` holds the nodes whose actions ran
    /// earlier in this invocation.
    pub fn run_node(
        &self,
        graph: &ArtifactGraph,
        idx: NodeIndex,
        built: &HashSet<NodeIndex>,
    ) -> Result<NodeStatus, BuildError> {
        let node = graph.node(idx);

        let Some(rel) = node.path.as_deref() else {
            return Ok(NodeStatus::Fresh);
        };

        if let BuildAction::Source = node.action {
            return if self.ctx.abs(rel).exists() {
                Ok(NodeStatus::Fresh)
            } else {
                Err(BuildError::MissingArtifact {
                    path: rel.to_path_buf(),
                })
            };
        }

        if self.is_fresh(graph, idx, rel, built) {
            tracing::trace!("{} is up to date", node.display_name());
            return Ok(NodeStatus::Fresh);
        }

        if self.ctx.verbose {
            eprintln!("{:>12} {}", verb(&node.action), node.display_name());
        }

        match self.execute(node, rel) {
            Ok(()) => Ok(NodeStatus::Built),
            Err(e) => {
                // Never leave a half-written output that looks up to date
                if let Err(rm) = remove_file_if_exists(&self.ctx.abs(rel)) {
                    tracing::warn!("{:#}", rm);
                }
                Err(e)
            }
        }
    }

    /// Output exists, no dependency was rebuilt this run, and no dependency
    /// file is newer than the output.
    fn is_fresh(
        &self,
        graph: &ArtifactGraph,
        idx: NodeIndex,
        rel: &Path,
        built: &HashSet<NodeIndex>,
    ) -> bool {
        let Some(output_time) = mtime(&self.ctx.abs(rel)) else {
            return false;
        };

        graph.dependencies(idx).all(|dep| {
            if built.contains(&dep) {
                return false;
            }
            match graph.node(dep).path.as_deref() {
                Some(dep_path) => match mtime(&self.ctx.abs(dep_path)) {
                    Some(t) => t <= output_time,
                    None => false,
                },
                None => true,
            }
        })
    }

    fn execute(&self, node: &GraphNode, rel: &Path) -> Result<(), BuildError> {
        let name = node.display_name();

        ensure_parent(&self.ctx.abs(rel)).map_err(|e| BuildError::ActionFailed {
            artifact: name.clone(),
            command: String::new(),
            output: format!("{:#}", e),
        })?;

        let tc = self.ctx.toolchain();
        match &node.action {
            BuildAction::Source | BuildAction::Phony => Ok(()),
            BuildAction::Compile { lang, source } => {
                let spec = tc.compile_command(
                    *lang,
                    &CompileInput {
                        source,
                        output: rel,
                    },
                );
                self.ctx.run(&name, &spec)
            }
            BuildAction::Archive { objects } => assemble::archive(self.ctx, objects, rel),
            BuildAction::SharedLink { objects } => assemble::shared(self.ctx, objects, rel),
            BuildAction::LinkExe {
                lang,
                objects,
                archives,
            } => {
                let spec = tc.link_exe_command(
                    *lang,
                    &LinkInput {
                        objects,
                        archives,
                        output: rel,
                    },
                );
                self.ctx.run(&name, &spec)
            }
            BuildAction::Generate { command, cwd } => {
                let Some((program, args)) = command.split_first() else {
                    return Err(BuildError::ActionFailed {
                        artifact: name,
                        command: String::new(),
                        output: "generated file has an empty command".to_string(),
                    });
                };
                let spec = CommandSpec::new(program).args(args.iter().cloned());
                self.ctx.run_in(&name, &spec, &self.ctx.abs(cwd))?;

                if self.ctx.abs(rel).exists() {
                    Ok(())
                } else {
                    Err(BuildError::ActionFailed {
                        artifact: name,
                        command: spec.display(),
                        output: "command succeeded but did not create the file".to_string(),
                    })
                }
            }
        }
    }
}

fn mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

fn verb(action: &BuildAction) -> &'static str {
    match action {
        BuildAction::Compile { .. } => "Compiling",
        BuildAction::Archive { .. } => "Archiving",
        BuildAction::SharedLink { .. } | BuildAction::LinkExe { .. } => "Linking",
        BuildAction::Generate { .. } => "Generating",
        BuildAction::Source | BuildAction::Phony => "Checking",
    }
}
