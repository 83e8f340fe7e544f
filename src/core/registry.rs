//! Module registry - the accumulation phase.
//!
//! Modules are opened, declare their lists, and are closed; closing merges
//! the module's local set into the project plan under its path prefix.
//! Accumulation is commutative: the finalized plan does not depend on the
//! order modules were declared in.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::errors::PlanError;
use crate::core::module::{DeclKind, GeneratedRule, ModuleContribution, ModulePath};
use crate::core::naming::LibraryNaming;
use crate::core::plan::{Library, ProjectPlan};

/// Accumulator for module declarations.
#[derive(Debug)]
pub struct ModuleRegistry {
    plan: ProjectPlan,

    /// Modules between `begin_module` and `end_module`
    open: BTreeMap<ModulePath, ModuleContribution>,

    /// Every module ever opened
    seen: BTreeSet<ModulePath>,

    /// Modules that asked for a library, and whether it is also shared
    library_requests: BTreeMap<ModulePath, bool>,
}

impl ModuleRegistry {
    /// Create an empty registry for `project`.
    pub fn new(project: impl Into<String>) -> Self {
        ModuleRegistry {
            plan: ProjectPlan::empty(project),
            open: BTreeMap::new(),
            seen: BTreeSet::new(),
            library_requests: BTreeMap::new(),
        }
    }

    /// Open an empty contribution set for `path`.
    pub fn begin_module(&mut self, path: &ModulePath) -> Result<(), PlanError> {
        if !self.seen.insert(path.clone()) {
            return Err(PlanError::DuplicateModule {
                path: path.to_string(),
            });
        }
        self.open.insert(path.clone(), ModuleContribution::default());
        tracing::debug!("begin module {}", path);
        Ok(())
    }

    fn open_mut(&mut self, path: &ModulePath) -> Result<&mut ModuleContribution, PlanError> {
        self.open
            .get_mut(path)
            .ok_or_else(|| PlanError::UnopenedModule {
                path: path.to_string(),
            })
    }

    /// Append names of one declaration kind to an open module.
    pub fn declare<I, S>(&mut self, path: &ModulePath, kind: DeclKind, names: I) -> Result<(), PlanError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.open_mut(path)?.extend(kind, names);
        Ok(())
    }

    /// Declare a compiled unit, choosing whether it has a header.
    pub fn declare_unit(
        &mut self,
        path: &ModulePath,
        name: impl Into<String>,
        header: bool,
    ) -> Result<(), PlanError> {
        self.open_mut(path)?.units.insert(name.into(), header);
        Ok(())
    }

    /// Declare a generated file together with the rule that produces it.
    pub fn declare_generated_rule(
        &mut self,
        path: &ModulePath,
        file: impl Into<String>,
        rule: GeneratedRule,
    ) -> Result<(), PlanError> {
        self.open_mut(path)?.generated.insert(file.into(), Some(rule));
        Ok(())
    }

    /// Opt the module into a library, optionally with a shared object.
    pub fn request_library(&mut self, path: &ModulePath, shared: bool) -> Result<(), PlanError> {
        let contribution = self.open_mut(path)?;
        contribution.library = true;
        contribution.shared_library |= shared;
        Ok(())
    }

    /// Close `path` and merge its declarations into the plan.
    pub fn end_module(&mut self, path: &ModulePath) -> Result<(), PlanError> {
        let contribution = self
            .open
            .remove(path)
            .ok_or_else(|| PlanError::UnopenedModule {
                path: path.to_string(),
            })?;

        if let Some((name, first, second)) = contribution.object_name_clash() {
            return Err(PlanError::ObjectNameClash {
                module: path.to_string(),
                name,
                first: first.as_str(),
                second: second.as_str(),
            });
        }

        if contribution.library {
            self.library_requests
                .insert(path.clone(), contribution.shared_library);
        }

        tracing::debug!("end module {}", path);
        self.plan.merge(path, contribution);
        Ok(())
    }

    /// Finish accumulation and produce the immutable plan.
    pub fn finalize(self, naming: &LibraryNaming) -> Result<ProjectPlan, PlanError> {
        if let Some(path) = self.open.keys().next() {
            return Err(PlanError::UnclosedModule {
                path: path.to_string(),
            });
        }

        let mut plan = self.plan;
        for (module, shared) in self.library_requests {
            let name = naming.library_name(&module);
            plan.add_library(Library {
                module,
                name,
                shared,
            });
        }

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::naming::BuildMode;

    fn naming() -> LibraryNaming {
        BuildMode::Project.naming("demo")
    }

    fn declare_a(reg: &mut ModuleRegistry) {
        let a = ModulePath::new("A");
        reg.begin_module(&a).unwrap();
        reg.declare(&a, DeclKind::CompiledUnit, ["foo"]).unwrap();
        reg.declare(&a, DeclKind::HeaderUnit, ["consts"]).unwrap();
        reg.request_library(&a, false).unwrap();
        reg.end_module(&a).unwrap();
    }

    fn declare_b(reg: &mut ModuleRegistry) {
        let b = ModulePath::new("B");
        reg.begin_module(&b).unwrap();
        reg.declare(&b, DeclKind::Program, ["bar"]).unwrap();
        reg.declare(&b, DeclKind::TestProgram, ["bar_test"]).unwrap();
        reg.end_module(&b).unwrap();
    }

    fn declare_c(reg: &mut ModuleRegistry) {
        let c = ModulePath::new("libs/C");
        reg.begin_module(&c).unwrap();
        reg.declare(&c, DeclKind::FortranUnit, ["solver"]).unwrap();
        reg.declare(&c, DeclKind::FortranProgram, ["run"]).unwrap();
        reg.request_library(&c, true).unwrap();
        reg.end_module(&c).unwrap();
    }

    #[test]
    fn test_accumulation_is_commutative() {
        let orders: [[fn(&mut ModuleRegistry); 3]; 3] = [
            [declare_a, declare_b, declare_c],
            [declare_c, declare_a, declare_b],
            [declare_b, declare_c, declare_a],
        ];

        let plans: Vec<ProjectPlan> = orders
            .iter()
            .map(|order| {
                let mut reg = ModuleRegistry::new("demo");
                for declare in order {
                    declare(&mut reg);
                }
                reg.finalize(&naming()).unwrap()
            })
            .collect();

        assert_eq!(plans[0], plans[1]);
        assert_eq!(plans[1], plans[2]);
    }

    #[test]
    fn test_names_are_prefixed_by_module() {
        let mut reg = ModuleRegistry::new("demo");
        declare_a(&mut reg);
        declare_c(&mut reg);
        let plan = reg.finalize(&naming()).unwrap();

        let units: Vec<String> = plan.units().map(|(q, _)| q.to_string()).collect();
        assert_eq!(units, vec!["A/foo"]);
        let fortran: Vec<String> = plan.fortran_units().map(|q| q.to_string()).collect();
        assert_eq!(fortran, vec!["libs/C/solver"]);
    }

    #[test]
    fn test_same_name_in_two_modules_is_distinct() {
        let mut reg = ModuleRegistry::new("demo");
        for m in ["A", "B"] {
            let path = ModulePath::new(m);
            reg.begin_module(&path).unwrap();
            reg.declare(&path, DeclKind::CompiledUnit, ["util"]).unwrap();
            reg.end_module(&path).unwrap();
        }
        let plan = reg.finalize(&naming()).unwrap();
        assert_eq!(plan.units().count(), 2);
    }

    #[test]
    fn test_duplicate_begin() {
        let mut reg = ModuleRegistry::new("demo");
        let x = ModulePath::new("x");
        reg.begin_module(&x).unwrap();
        let err = reg.begin_module(&x).unwrap_err();
        assert_eq!(
            err,
            PlanError::DuplicateModule {
                path: "x".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_after_end() {
        let mut reg = ModuleRegistry::new("demo");
        let x = ModulePath::new("x");
        reg.begin_module(&x).unwrap();
        reg.end_module(&x).unwrap();
        assert!(matches!(
            reg.begin_module(&ModulePath::new("x/")),
            Err(PlanError::DuplicateModule { .. })
        ));
    }

    #[test]
    fn test_end_without_begin() {
        let mut reg = ModuleRegistry::new("demo");
        let err = reg.end_module(&ModulePath::new("y")).unwrap_err();
        assert!(matches!(err, PlanError::UnopenedModule { path } if path == "y"));
    }

    #[test]
    fn test_declare_without_begin() {
        let mut reg = ModuleRegistry::new("demo");
        let err = reg
            .declare(&ModulePath::new("y"), DeclKind::Program, ["main"])
            .unwrap_err();
        assert!(matches!(err, PlanError::UnopenedModule { .. }));
    }

    #[test]
    fn test_finalize_with_open_module() {
        let mut reg = ModuleRegistry::new("demo");
        reg.begin_module(&ModulePath::new("z")).unwrap();
        let err = reg.finalize(&naming()).unwrap_err();
        assert!(matches!(err, PlanError::UnclosedModule { path } if path == "z"));
    }

    #[test]
    fn test_object_name_clash_rejected() {
        let mut reg = ModuleRegistry::new("demo");
        let m = ModulePath::new("m");
        reg.begin_module(&m).unwrap();
        reg.declare(&m, DeclKind::CompiledUnit, ["main"]).unwrap();
        reg.declare(&m, DeclKind::Program, ["main"]).unwrap();
        let err = reg.end_module(&m).unwrap_err();
        assert!(matches!(err, PlanError::ObjectNameClash { name, .. } if name == "main"));
    }

    #[test]
    fn test_library_naming_by_mode() {
        let build = |mode: BuildMode| {
            let mut reg = ModuleRegistry::new("shell");
            let basis = ModulePath::new("libs/basis");
            reg.begin_module(&basis).unwrap();
            reg.declare(&basis, DeclKind::CompiledUnit, ["lsjt"]).unwrap();
            reg.request_library(&basis, false).unwrap();
            reg.end_module(&basis).unwrap();
            let naming = mode.naming("shell");
            reg.finalize(&naming).unwrap()
        };

        let project = build(BuildMode::Project);
        let lib = project.library(&ModulePath::new("libs/basis")).unwrap();
        assert_eq!(lib.name, "basis");

        let standalone = build(BuildMode::Standalone(ModulePath::new("libs/basis")));
        let lib = standalone.library(&ModulePath::new("libs/basis")).unwrap();
        assert_eq!(lib.name, "shell");
    }

    #[test]
    fn test_headerless_unit_and_generated_rule() {
        let mut reg = ModuleRegistry::new("demo");
        let m = ModulePath::new("data");
        reg.begin_module(&m).unwrap();
        reg.declare_unit(&m, "main_impl", false).unwrap();
        reg.declare_generated_rule(
            &m,
            "table.dat",
            GeneratedRule {
                command: vec!["./mktable".to_string()],
                inputs: vec![],
            },
        )
        .unwrap();
        reg.end_module(&m).unwrap();

        let plan = reg.finalize(&naming()).unwrap();
        let (unit, header) = plan.units().next().unwrap();
        assert_eq!(unit.to_string(), "data/main_impl");
        assert!(!header);
        let (file, rule) = plan.generated().next().unwrap();
        assert_eq!(file.to_string(), "data/table.dat");
        assert_eq!(rule.unwrap().command, vec!["./mktable"]);
    }
}
