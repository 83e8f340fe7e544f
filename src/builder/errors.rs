//! Execution-phase errors.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Error raised while building, installing or packaging.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("`{}` does not exist", path.display())]
    #[diagnostic(
        code(stratum::build::missing_artifact),
        help("check the declarations in the owning module.toml")
    )]
    MissingArtifact { path: PathBuf },

    #[error("failed to build `{artifact}`\n  command: {command}\n{output}")]
    #[diagnostic(code(stratum::build::action_failed))]
    ActionFailed {
        artifact: String,
        command: String,
        output: String,
    },

    #[error("skipped `{artifact}` because `{dependency}` failed")]
    #[diagnostic(code(stratum::build::dependency_failed))]
    DependencyFailed { artifact: String, dependency: String },

    #[error("no target named `{name}`")]
    #[diagnostic(
        code(stratum::build::unknown_target),
        help("use an aggregate (all, libraries, programs, programs-test, generated), a shorthand name, or a project-relative path")
    )]
    UnknownTarget { name: String },

    #[error("cannot install into `{}`: {message}", path.display())]
    #[diagnostic(code(stratum::install::target))]
    InstallTarget { path: PathBuf, message: String },

    #[error("cannot package `{}`: {message}", path.display())]
    #[diagnostic(code(stratum::package::constituent))]
    Packaging { path: PathBuf, message: String },
}

impl BuildError {
    /// Name of the artifact this error is about, for summaries.
    pub fn artifact(&self) -> String {
        match self {
            BuildError::MissingArtifact { path }
            | BuildError::InstallTarget { path, .. }
            | BuildError::Packaging { path, .. } => path.display().to_string(),
            BuildError::ActionFailed { artifact, .. }
            | BuildError::DependencyFailed { artifact, .. } => artifact.clone(),
            BuildError::UnknownTarget { name } => name.clone(),
        }
    }
}
