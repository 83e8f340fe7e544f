//! Stratum.toml and module.toml parsing.
//!
//! The project manifest lists the modules; each module directory carries a
//! `module.toml` with its seven declaration lists. Both are plain data:
//! nothing here checks that declared files exist.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::artifact::SourceExtensions;
use crate::core::errors::PlanError;
use crate::core::module::{DeclKind, GeneratedRule, ModulePath};
use crate::core::registry::ModuleRegistry;

/// Project manifest file name.
pub const MANIFEST_NAME: &str = "Stratum.toml";

/// Per-module manifest file name.
pub const MODULE_MANIFEST_NAME: &str = "module.toml";

/// The parsed Stratum.toml.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectManifest {
    pub project: ProjectSection,

    #[serde(default)]
    pub sources: SourceExtensions,

    #[serde(default)]
    pub install: InstallSection,

    #[serde(default)]
    pub dist: DistSection,
}

/// `[project]`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    /// Project name, used for standalone library names and archive names
    pub name: String,

    /// Module directories relative to the project root
    #[serde(default)]
    pub modules: Vec<String>,
}

/// `[install]`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallSection {
    /// Install prefix; relative paths are taken from the project root
    pub prefix: Option<PathBuf>,

    /// Command run in the project root after `install`
    pub post_install_hook: Vec<String>,
}

/// `[dist]`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DistSection {
    /// Extra files or directories to ship, relative to the project root
    pub extra: Vec<String>,
}

impl ProjectManifest {
    /// Load and parse a project manifest.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let manifest: ProjectManifest = toml::from_str(contents)?;
        if manifest.project.name.trim().is_empty() {
            anyhow::bail!("`project.name` must not be empty");
        }
        Ok(manifest)
    }

    /// Declared modules, normalized.
    pub fn module_paths(&self) -> Vec<ModulePath> {
        self.project.modules.iter().map(ModulePath::new).collect()
    }
}

/// A compiled unit entry: a bare name, or a table to drop the header.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UnitSpec {
    Name(String),
    Detailed {
        name: String,
        #[serde(default = "default_true")]
        header: bool,
    },
}

impl UnitSpec {
    pub fn name(&self) -> &str {
        match self {
            UnitSpec::Name(name) => name,
            UnitSpec::Detailed { name, .. } => name,
        }
    }

    pub fn has_header(&self) -> bool {
        match self {
            UnitSpec::Name(_) => true,
            UnitSpec::Detailed { header, .. } => *header,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A `[[generated]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratedSpec {
    /// Module-relative path of the produced file
    pub path: String,

    #[serde(default)]
    pub command: Vec<String>,

    #[serde(default)]
    pub inputs: Vec<String>,
}

/// The parsed module.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleManifest {
    pub headers: Vec<String>,
    pub units: Vec<UnitSpec>,
    pub fortran_units: Vec<String>,
    pub programs: Vec<String>,
    pub test_programs: Vec<String>,
    pub fortran_programs: Vec<String>,
    pub library: bool,
    pub shared_library: bool,
    pub generated: Vec<GeneratedSpec>,
}

impl ModuleManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read module manifest: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse module manifest: {}", path.display()))
    }

    /// Feed this manifest into the registry as one begin/declare/end cycle.
    pub fn declare_into(
        &self,
        registry: &mut ModuleRegistry,
        module: &ModulePath,
    ) -> Result<(), PlanError> {
        registry.begin_module(module)?;

        registry.declare(module, DeclKind::HeaderUnit, &self.headers)?;
        for unit in &self.units {
            registry.declare_unit(module, unit.name(), unit.has_header())?;
        }
        registry.declare(module, DeclKind::FortranUnit, &self.fortran_units)?;
        registry.declare(module, DeclKind::Program, &self.programs)?;
        registry.declare(module, DeclKind::TestProgram, &self.test_programs)?;
        registry.declare(module, DeclKind::FortranProgram, &self.fortran_programs)?;

        for generated in &self.generated {
            if generated.command.is_empty() && generated.inputs.is_empty() {
                registry.declare(module, DeclKind::Generated, [generated.path.as_str()])?;
            } else {
                registry.declare_generated_rule(
                    module,
                    generated.path.as_str(),
                    GeneratedRule {
                        command: generated.command.clone(),
                        inputs: generated.inputs.clone(),
                    },
                )?;
            }
        }

        if self.library || self.shared_library {
            registry.request_library(module, self.shared_library)?;
        }

        registry.end_module(module)
    }
}
