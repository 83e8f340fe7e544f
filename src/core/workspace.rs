//! Workspace - a loaded project and its finalized plan.
//!
//! Loading reads Stratum.toml, feeds every selected module's module.toml
//! through the registry and finalizes the plan. The result is read-only.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::artifact::ArtifactResolver;
use crate::core::errors::PlanError;
use crate::core::manifest::{ModuleManifest, ProjectManifest, MODULE_MANIFEST_NAME};
use crate::core::naming::BuildMode;
use crate::core::plan::ProjectPlan;
use crate::core::registry::ModuleRegistry;

/// A project root, its manifest and the finalized plan.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    manifest: ProjectManifest,
    mode: BuildMode,
    plan: ProjectPlan,
    resolver: ArtifactResolver,

    /// Manifests read while loading, relative to the root
    control_files: Vec<PathBuf>,
}

impl Workspace {
    /// Load the project whose manifest is at `manifest_path`.
    pub fn load(manifest_path: &Path, mode: BuildMode) -> Result<Self> {
        let manifest = ProjectManifest::load(manifest_path)?;
        let root = manifest_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();

        let manifest_name = manifest_path
            .file_name()
            .map(PathBuf::from)
            .context("manifest path has no file name")?;
        let mut control_files = vec![manifest_name];

        let declared = manifest.module_paths();
        let selected = match &mode {
            BuildMode::Project => declared,
            BuildMode::Standalone(module) => {
                if !declared.contains(module) {
                    return Err(PlanError::UnknownModule {
                        path: module.to_string(),
                    }
                    .into());
                }
                vec![module.clone()]
            }
        };

        let mut registry = ModuleRegistry::new(manifest.project.name.clone());
        for module in &selected {
            let rel = module.join(MODULE_MANIFEST_NAME);
            let module_manifest = ModuleManifest::load(&root.join(&rel))
                .with_context(|| format!("failed to load module `{}`", module))?;
            module_manifest.declare_into(&mut registry, module)?;
            control_files.push(rel);
        }

        let naming = mode.naming(&manifest.project.name);
        let plan = registry.finalize(&naming)?;
        let resolver = ArtifactResolver::new(manifest.sources.clone());

        control_files.sort();
        control_files.dedup();

        tracing::debug!(
            "loaded project `{}` with {} module(s)",
            plan.project(),
            plan.len()
        );

        Ok(Workspace {
            root,
            manifest,
            mode,
            plan,
            resolver,
            control_files,
        })
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &ProjectManifest {
        &self.manifest
    }

    pub fn mode(&self) -> &BuildMode {
        &self.mode
    }

    pub fn plan(&self) -> &ProjectPlan {
        &self.plan
    }

    pub fn resolver(&self) -> &ArtifactResolver {
        &self.resolver
    }

    /// Build-control files consulted while loading, relative to the root.
    pub fn control_files(&self) -> &[PathBuf] {
        &self.control_files
    }

    /// Absolute (or cwd-relative) path of a project-relative path.
    pub fn abs(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }

    /// Install prefix: an explicit override, else `[install].prefix`, else
    /// `<root>/install`. Relative prefixes are taken from the root.
    pub fn install_prefix(&self, explicit: Option<&Path>) -> PathBuf {
        let prefix = explicit
            .map(Path::to_path_buf)
            .or_else(|| self.manifest.install.prefix.clone())
            .unwrap_or_else(|| PathBuf::from("install"));
        if prefix.is_absolute() {
            prefix
        } else {
            self.root.join(prefix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::MANIFEST_NAME;
    use crate::core::module::ModulePath;
    use std::fs;
    use tempfile::TempDir;

    fn write_project(dir: &Path, modules: &[&str]) -> PathBuf {
        let list = modules
            .iter()
            .map(|m| format!("\"{}\"", m))
            .collect::<Vec<_>>()
            .join(", ");
        let manifest = dir.join(MANIFEST_NAME);
        fs::write(
            &manifest,
            format!("[project]\nname = \"demo\"\nmodules = [{}]\n", list),
        )
        .unwrap();
        manifest
    }

    fn write_module(dir: &Path, module: &str, contents: &str) {
        let path = dir.join(module);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join(MODULE_MANIFEST_NAME), contents).unwrap();
    }

    #[test]
    fn test_load_project() {
        let tmp = TempDir::new().unwrap();
        let manifest = write_project(tmp.path(), &["A", "B"]);
        write_module(tmp.path(), "A", "units = [\"foo\"]\nlibrary = true\n");
        write_module(tmp.path(), "B", "programs = [\"bar\"]\n");

        let ws = Workspace::load(&manifest, BuildMode::Project).unwrap();
        assert_eq!(ws.plan().len(), 2);
        assert_eq!(ws.plan().library(&ModulePath::new("A")).unwrap().name, "A");
        assert_eq!(
            ws.control_files(),
            &[
                PathBuf::from("A/module.toml"),
                PathBuf::from("B/module.toml"),
                PathBuf::from("Stratum.toml"),
            ]
        );
    }

    #[test]
    fn test_duplicate_module_in_manifest() {
        let tmp = TempDir::new().unwrap();
        let manifest = write_project(tmp.path(), &["x", "x/"]);
        write_module(tmp.path(), "x", "");

        let err = Workspace::load(&manifest, BuildMode::Project).unwrap_err();
        let plan_err = err.downcast_ref::<PlanError>().unwrap();
        assert!(matches!(plan_err, PlanError::DuplicateModule { .. }));
    }

    #[test]
    fn test_standalone_loads_one_module() {
        let tmp = TempDir::new().unwrap();
        let manifest = write_project(tmp.path(), &["libs/basis", "B"]);
        write_module(tmp.path(), "libs/basis", "units = [\"lsjt\"]\nlibrary = true\n");
        // B is broken, but standalone mode never reads it
        write_module(tmp.path(), "B", "programs = 3\n");

        let ws = Workspace::load(
            &manifest,
            BuildMode::Standalone(ModulePath::new("libs/basis")),
        )
        .unwrap();
        assert_eq!(ws.plan().len(), 1);
        let lib = ws.plan().library(&ModulePath::new("libs/basis")).unwrap();
        assert_eq!(lib.name, "demo");
    }

    #[test]
    fn test_standalone_unknown_module() {
        let tmp = TempDir::new().unwrap();
        let manifest = write_project(tmp.path(), &["A"]);
        write_module(tmp.path(), "A", "");

        let err = Workspace::load(&manifest, BuildMode::Standalone(ModulePath::new("Z")))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlanError>(),
            Some(PlanError::UnknownModule { .. })
        ));
    }

    #[test]
    fn test_missing_module_manifest() {
        let tmp = TempDir::new().unwrap();
        let manifest = write_project(tmp.path(), &["ghost"]);

        let err = Workspace::load(&manifest, BuildMode::Project).unwrap_err();
        assert!(format!("{:#}", err).contains("ghost"));
    }

    #[test]
    fn test_install_prefix() {
        let tmp = TempDir::new().unwrap();
        let manifest = write_project(tmp.path(), &[]);
        let ws = Workspace::load(&manifest, BuildMode::Project).unwrap();

        assert_eq!(ws.install_prefix(None), tmp.path().join("install"));
        assert_eq!(
            ws.install_prefix(Some(Path::new("/opt/x"))),
            PathBuf::from("/opt/x")
        );
    }
}
