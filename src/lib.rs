//! Stratum - a build orchestrator for multi-module C-family and Fortran
//! projects.
//!
//! This crate provides the core library functionality for Stratum:
//! module accumulation, artifact graph construction, and execution of the
//! configured toolchain over that graph.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

pub use crate::core::{
    artifact::ArtifactId, module::ModulePath, naming::BuildMode, plan::ProjectPlan,
    registry::ModuleRegistry, workspace::Workspace,
};

pub use builder::{ArtifactGraph, BuildError};
pub use util::context::GlobalContext;
