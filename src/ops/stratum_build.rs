//! Implementation of `stratum build` and the `build-*` shortcuts.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{bail, Result};
use petgraph::graph::NodeIndex;

use crate::builder::{
    ArtifactGraph, BuildAction, BuildContext, BuildError, BuildExecutor, BuildSummary,
    FullFanoutLinking, Toolchain,
};
use crate::core::{Language, Workspace};
use crate::util::config::{load_toolchain_config, project_toolchain_config_path, ToolchainConfig};
use crate::util::GlobalContext;

/// Options for the build command.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Aggregate, shorthand alias, or project-relative path
    pub target: String,

    /// Number of parallel jobs
    pub jobs: Option<usize>,

    /// Verbose output
    pub verbose: bool,
}

impl BuildOptions {
    pub fn new(target: impl Into<String>) -> Self {
        BuildOptions {
            target: target.into(),
            jobs: None,
            verbose: false,
        }
    }
}

/// Derive the artifact graph for a loaded workspace.
pub fn artifact_graph(ws: &Workspace) -> Result<ArtifactGraph> {
    Ok(ArtifactGraph::build(
        ws.plan(),
        ws.resolver(),
        &FullFanoutLinking,
        ws.mode(),
    )?)
}

/// Merged toolchain configuration for a workspace.
pub fn toolchain_config(ws: &Workspace, gctx: &GlobalContext) -> Result<ToolchainConfig> {
    load_toolchain_config(
        gctx.toolchain_config_path().as_deref(),
        &project_toolchain_config_path(ws.root()),
    )
}

/// Build one target and everything it needs.
pub fn build(ws: &Workspace, gctx: &GlobalContext, opts: &BuildOptions) -> Result<BuildSummary> {
    let graph = artifact_graph(ws)?;
    let target = graph
        .find(&opts.target)
        .ok_or_else(|| BuildError::UnknownTarget {
            name: opts.target.clone(),
        })?;

    let config = toolchain_config(ws, gctx)?;
    let ctx = BuildContext::new(ws, &config, opts.jobs).verbose(opts.verbose);

    let tools = required_tools(&graph, target, ctx.toolchain());
    let missing = ctx
        .toolchain()
        .missing_tools(tools.iter().map(|p| p.as_path()));
    if !missing.is_empty() {
        let names: Vec<String> = missing.iter().map(|p| p.display().to_string()).collect();
        bail!(
            "required tool(s) not found: {}\n\
             hint: set `cxx`, `fc` or `ar` in .stratum/toolchain.toml, or the CXX, FC and AR \
             environment variables",
            names.join(", ")
        );
    }

    tracing::info!("building `{}`", opts.target);
    BuildExecutor::new(&ctx).execute(&graph, target)
}

/// Compilers and archivers the actions under `target` will invoke.
fn required_tools(graph: &ArtifactGraph, target: NodeIndex, toolchain: &Toolchain) -> Vec<PathBuf> {
    let mut tools = BTreeSet::new();
    for idx in graph.reachable(target) {
        let tool = match &graph.node(idx).action {
            BuildAction::Compile { lang, .. } | BuildAction::LinkExe { lang, .. } => {
                toolchain.driver(*lang)
            }
            BuildAction::Archive { .. } => toolchain.archiver(),
            BuildAction::SharedLink { .. } => toolchain.driver(Language::C),
            BuildAction::Source | BuildAction::Phony | BuildAction::Generate { .. } => continue,
        };
        tools.insert(tool.to_path_buf());
    }
    tools.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BuildMode, MANIFEST_NAME};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn workspace(dir: &Path) -> Workspace {
        fs::write(
            dir.join(MANIFEST_NAME),
            "[project]\nname = \"demo\"\nmodules = [\"A\", \"gen\"]\n",
        )
        .unwrap();
        fs::create_dir_all(dir.join("A")).unwrap();
        fs::write(
            dir.join("A/module.toml"),
            "units = [\"foo\"]\nfortran_units = [\"bar\"]\nlibrary = true\nprograms = [\"main\"]\n",
        )
        .unwrap();
        fs::create_dir_all(dir.join("gen")).unwrap();
        fs::write(
            dir.join("gen/module.toml"),
            "[[generated]]\npath = \"out.txt\"\ncommand = [\"sh\", \"-c\", \"echo hi > out.txt\"]\n",
        )
        .unwrap();
        Workspace::load(&dir.join(MANIFEST_NAME), BuildMode::Project).unwrap()
    }

    #[test]
    fn test_required_tools() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(tmp.path());
        let graph = artifact_graph(&ws).unwrap();
        let tc = Toolchain::default();

        let libs = graph.find("libraries").unwrap();
        let tools = required_tools(&graph, libs, &tc);
        assert_eq!(
            tools,
            vec![
                PathBuf::from("ar"),
                PathBuf::from("c++"),
                PathBuf::from("gfortran")
            ]
        );

        let generated = graph.find("generated").unwrap();
        assert!(required_tools(&graph, generated, &tc).is_empty());
    }

    #[test]
    fn test_unknown_target() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(tmp.path());
        let gctx = GlobalContext::with_cwd(tmp.path().to_path_buf());

        let err = build(&ws, &gctx, &BuildOptions::new("nope")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<BuildError>(),
            Some(&BuildError::UnknownTarget {
                name: "nope".to_string()
            })
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_build_generated() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(tmp.path());
        let gctx = GlobalContext::with_cwd(tmp.path().to_path_buf());

        let summary = build(&ws, &gctx, &BuildOptions::new("generated")).unwrap();
        assert_eq!(summary.built, 1);
        assert!(tmp.path().join("gen/out.txt").exists());
    }
}
