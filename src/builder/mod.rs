//! C-family and Fortran build system.
//!
//! This module turns a finalized plan into an artifact graph and drives the
//! configured toolchain over it.

pub mod alias;
pub mod assemble;
pub mod context;
pub mod errors;
pub mod executor;
pub mod graph;
pub mod native;
pub mod toolchain;

pub use context::BuildContext;
pub use errors::BuildError;
pub use executor::{BuildExecutor, BuildSummary};
pub use graph::{
    Aggregate, ArtifactGraph, BuildAction, FullFanoutLinking, GraphNode, LinkPolicy, NodeKind,
};
pub use native::NativeBuilder;
pub use toolchain::{CommandSpec, Toolchain};
