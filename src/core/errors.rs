//! Accumulation-phase errors.
//!
//! Everything here is raised before any build action runs.

use miette::Diagnostic;
use thiserror::Error;

/// Error raised while declaring modules or finalizing the project plan.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("module `{path}` is declared more than once")]
    #[diagnostic(
        code(stratum::plan::duplicate_module),
        help("remove the repeated entry from `modules` in Stratum.toml")
    )]
    DuplicateModule { path: String },

    #[error("module `{path}` was never opened")]
    #[diagnostic(code(stratum::plan::unopened_module))]
    UnopenedModule { path: String },

    #[error("module `{path}` was opened but never closed")]
    #[diagnostic(code(stratum::plan::unclosed_module))]
    UnclosedModule { path: String },

    #[error("module `{path}` is not listed in the project")]
    #[diagnostic(
        code(stratum::plan::unknown_module),
        help("run `stratum report` to list the project's modules")
    )]
    UnknownModule { path: String },

    #[error("`{name}` in module `{module}` is declared as both {first} and {second}")]
    #[diagnostic(
        code(stratum::plan::object_name_clash),
        help("units and programs of one module share `<name>.o`; rename one of them")
    )]
    ObjectNameClash {
        module: String,
        name: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("shorthand `{alias}` would refer to both `{first}` and `{second}`")]
    #[diagnostic(
        code(stratum::plan::alias_collision),
        help("rename one of the artifacts, or build it by its full path")
    )]
    AliasCollision {
        alias: String,
        first: String,
        second: String,
    },

    #[error("input `{input}` of `{artifact}` is outside the project")]
    #[diagnostic(
        code(stratum::plan::input_outside_project),
        help("rule inputs are relative to their module and may not climb above the project root")
    )]
    InputOutsideProject { artifact: String, input: String },

    #[error("generated-file rules form a cycle through `{artifact}`")]
    #[diagnostic(code(stratum::plan::dependency_cycle))]
    DependencyCycle { artifact: String },
}
