//! ProjectPlan - the merged view of every module's declarations.
//!
//! A plan is produced once by [`ModuleRegistry::finalize`] and is read-only
//! afterwards. All collections are ordered, so two plans built from the same
//! declarations compare equal regardless of declaration order.
//!
//! [`ModuleRegistry::finalize`]: crate::core::registry::ModuleRegistry::finalize

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::core::module::{GeneratedRule, ModuleContribution, ModulePath, QualifiedName};

/// A static (and optionally shared) library owned by one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Library {
    /// Owning module
    pub module: ModulePath,
    /// Canonical name, without `lib` prefix or extension
    pub name: String,
    /// Whether a shared object is built alongside the archive
    pub shared: bool,
}

/// The project-wide build plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectPlan {
    project: String,
    modules: BTreeSet<ModulePath>,
    headers: BTreeSet<QualifiedName>,
    /// Compiled units and whether each declares a header
    units: BTreeMap<QualifiedName, bool>,
    fortran_units: BTreeSet<QualifiedName>,
    programs: BTreeSet<QualifiedName>,
    test_programs: BTreeSet<QualifiedName>,
    fortran_programs: BTreeSet<QualifiedName>,
    generated: BTreeMap<QualifiedName, Option<GeneratedRule>>,
    libraries: BTreeMap<ModulePath, Library>,
}

impl ProjectPlan {
    pub(crate) fn empty(project: impl Into<String>) -> Self {
        ProjectPlan {
            project: project.into(),
            modules: BTreeSet::new(),
            headers: BTreeSet::new(),
            units: BTreeMap::new(),
            fortran_units: BTreeSet::new(),
            programs: BTreeSet::new(),
            test_programs: BTreeSet::new(),
            fortran_programs: BTreeSet::new(),
            generated: BTreeMap::new(),
            libraries: BTreeMap::new(),
        }
    }

    /// Merge one module's contribution under its path prefix.
    pub(crate) fn merge(&mut self, module: &ModulePath, contribution: ModuleContribution) {
        let q = |name: String| QualifiedName::new(module.clone(), name);

        self.modules.insert(module.clone());
        self.headers.extend(contribution.headers.into_iter().map(q));
        self.units.extend(
            contribution
                .units
                .into_iter()
                .map(|(name, header)| (q(name), header)),
        );
        self.fortran_units
            .extend(contribution.fortran_units.into_iter().map(q));
        self.programs.extend(contribution.programs.into_iter().map(q));
        self.test_programs
            .extend(contribution.test_programs.into_iter().map(q));
        self.fortran_programs
            .extend(contribution.fortran_programs.into_iter().map(q));
        self.generated.extend(
            contribution
                .generated
                .into_iter()
                .map(|(path, rule)| (q(path), rule)),
        );
    }

    pub(crate) fn add_library(&mut self, library: Library) {
        self.libraries.insert(library.module.clone(), library);
    }

    /// Project name.
    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModulePath> {
        self.modules.iter()
    }

    pub fn headers(&self) -> impl Iterator<Item = &QualifiedName> {
        self.headers.iter()
    }

    /// Compiled units with their header flag.
    pub fn units(&self) -> impl Iterator<Item = (&QualifiedName, bool)> {
        self.units.iter().map(|(name, header)| (name, *header))
    }

    pub fn fortran_units(&self) -> impl Iterator<Item = &QualifiedName> {
        self.fortran_units.iter()
    }

    pub fn programs(&self) -> impl Iterator<Item = &QualifiedName> {
        self.programs.iter()
    }

    pub fn test_programs(&self) -> impl Iterator<Item = &QualifiedName> {
        self.test_programs.iter()
    }

    pub fn fortran_programs(&self) -> impl Iterator<Item = &QualifiedName> {
        self.fortran_programs.iter()
    }

    pub fn generated(&self) -> impl Iterator<Item = (&QualifiedName, Option<&GeneratedRule>)> {
        self.generated.iter().map(|(name, rule)| (name, rule.as_ref()))
    }

    pub fn libraries(&self) -> impl Iterator<Item = &Library> {
        self.libraries.values()
    }

    pub fn library(&self, module: &ModulePath) -> Option<&Library> {
        self.libraries.get(module)
    }

    /// Compiled units owned by `module`.
    pub fn module_units<'a>(
        &'a self,
        module: &'a ModulePath,
    ) -> impl Iterator<Item = (&'a QualifiedName, bool)> + 'a {
        self.units().filter(move |(name, _)| &name.module == module)
    }

    /// Fortran units owned by `module`.
    pub fn module_fortran_units<'a>(
        &'a self,
        module: &'a ModulePath,
    ) -> impl Iterator<Item = &'a QualifiedName> + 'a {
        self.fortran_units().filter(move |name| &name.module == module)
    }

    /// Number of declared modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
