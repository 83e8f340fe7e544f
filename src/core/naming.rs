//! Build mode and library naming.
//!
//! The mode is chosen once, before the plan is finalized. Everything that
//! depends on it (library names, whether shorthand aliases exist) asks the
//! mode instead of re-deciding.

use serde::Serialize;

use crate::core::module::ModulePath;

/// Whole-project or single-module build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "module", rename_all = "snake_case")]
pub enum BuildMode {
    /// Every module listed in the project manifest
    Project,
    /// Only the given module, built on its own
    Standalone(ModulePath),
}

impl BuildMode {
    pub fn is_standalone(&self) -> bool {
        matches!(self, BuildMode::Standalone(_))
    }

    /// Shorthand aliases would make a standalone module's library a
    /// prerequisite of itself through `all`, so they only exist in project
    /// mode.
    pub fn aliases_enabled(&self) -> bool {
        !self.is_standalone()
    }

    /// Library naming strategy for this mode.
    pub fn naming(&self, project: &str) -> LibraryNaming {
        match self {
            BuildMode::Project => LibraryNaming::ModuleDirectory {
                fallback: project.to_string(),
            },
            BuildMode::Standalone(_) => LibraryNaming::ProjectName {
                project: project.to_string(),
            },
        }
    }
}

/// How a module's library gets its canonical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryNaming {
    /// Named after the module's directory; the root module falls back to
    /// the project name.
    ModuleDirectory { fallback: String },
    /// Named after the project.
    ProjectName { project: String },
}

impl LibraryNaming {
    pub fn library_name(&self, module: &ModulePath) -> String {
        match self {
            LibraryNaming::ModuleDirectory { fallback } => module
                .dir_name()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.clone()),
            LibraryNaming::ProjectName { project } => project.clone(),
        }
    }
}
