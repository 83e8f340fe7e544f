//! Core data structures for Stratum.
//!
//! This module contains the accumulation phase and the types it produces:
//! - Module identity and declaration kinds
//! - The module registry and the finalized project plan
//! - Typed artifact identifiers and the path resolver
//! - Build modes and library naming
//! - Manifests and workspace loading

pub mod artifact;
pub mod errors;
pub mod manifest;
pub mod module;
pub mod naming;
pub mod plan;
pub mod registry;
pub mod workspace;

pub use artifact::{ArtifactId, ArtifactKind, ArtifactResolver, Language, SourceExtensions};
pub use errors::PlanError;
pub use manifest::{ModuleManifest, ProjectManifest, MANIFEST_NAME, MODULE_MANIFEST_NAME};
pub use module::{DeclKind, GeneratedRule, ModulePath, QualifiedName};
pub use naming::{BuildMode, LibraryNaming};
pub use plan::{Library, ProjectPlan};
pub use registry::ModuleRegistry;
pub use workspace::Workspace;
