//! Build context - project root, toolchain, and parallelism.

use std::path::{Path, PathBuf};

use crate::builder::errors::BuildError;
use crate::builder::toolchain::{CommandSpec, Toolchain};
use crate::core::Workspace;
use crate::util::config::ToolchainConfig;
use crate::util::process::{tool_output, ProcessBuilder};

/// Everything an action needs to run.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Project root; every command runs here
    pub root: PathBuf,

    pub toolchain: Toolchain,

    /// Parallel actions, `None` for one per CPU
    pub jobs: Option<usize>,

    /// Print each action instead of a progress bar
    pub verbose: bool,
}

impl BuildContext {
    /// Create a build context for a workspace.
    ///
    /// `jobs` overrides the configured job count.
    pub fn new(ws: &Workspace, config: &ToolchainConfig, jobs: Option<usize>) -> Self {
        BuildContext {
            root: ws.root().to_path_buf(),
            toolchain: Toolchain::from_config(config),
            jobs: jobs.or(config.toolchain.jobs),
            verbose: false,
        }
    }

    /// Enable verbose output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Absolute (or cwd-relative) path of a project-relative path.
    pub fn abs(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }

    /// Convert a CommandSpec into a ProcessBuilder rooted at the project.
    pub fn process_builder_from_spec(&self, spec: &CommandSpec) -> ProcessBuilder {
        ProcessBuilder::new(&spec.program)
            .args(&spec.args)
            .cwd(&self.root)
    }

    /// Run `spec` in `cwd` to produce `artifact`.
    ///
    /// A non-zero exit, or a program that cannot be spawned, becomes
    /// [`BuildError::ActionFailed`] carrying the tool's output verbatim.
    pub fn run_in(&self, artifact: &str, spec: &CommandSpec, cwd: &Path) -> Result<(), BuildError> {
        let cmd = self.process_builder_from_spec(spec).cwd(cwd);
        let command_line = cmd.display_command();
        tracing::debug!("running `{}`", command_line);

        let output = cmd.exec().map_err(|e| BuildError::ActionFailed {
            artifact: artifact.to_string(),
            command: command_line.clone(),
            output: format!("{:#}", e),
        })?;

        if !output.status.success() {
            return Err(BuildError::ActionFailed {
                artifact: artifact.to_string(),
                command: command_line,
                output: tool_output(&output),
            });
        }

        Ok(())
    }

    /// Run `spec` in the project root.
    pub fn run(&self, artifact: &str, spec: &CommandSpec) -> Result<(), BuildError> {
        self.run_in(artifact, spec, &self.root)
    }
}
