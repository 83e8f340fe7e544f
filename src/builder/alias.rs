//! Shorthand aliases: `stratum build libfoo.a` instead of the full path.

use std::collections::BTreeMap;

use petgraph::graph::NodeIndex;

use crate::builder::graph::{Aggregate, ArtifactGraph};
use crate::core::artifact::{ArtifactKind, ArtifactResolver};
use crate::core::errors::PlanError;
use crate::util::paths::to_slash;

/// Kinds that get a shorthand name.
const ALIASED: [ArtifactKind; 4] = [
    ArtifactKind::Archive,
    ArtifactKind::SharedObject,
    ArtifactKind::Executable,
    ArtifactKind::Generated,
];

/// Register one alias per archive, shared object, program and generated
/// file, keyed by its file name.
///
/// Two artifacts with the same file name in different modules are an
/// [`PlanError::AliasCollision`]. A file name that equals its own path (root
/// module artifacts) needs no alias.
pub(crate) fn register(
    graph: &mut ArtifactGraph,
    resolver: &ArtifactResolver,
) -> Result<(), PlanError> {
    let mut wanted: BTreeMap<String, (NodeIndex, String)> = BTreeMap::new();

    for (idx, id) in graph.artifacts_of(&ALIASED) {
        let alias = resolver.base_name(id);
        let full = to_slash(&resolver.path(id));

        if let Some((_, first)) = wanted.get(&alias) {
            let (first, second) = if *first <= full {
                (first.clone(), full)
            } else {
                (full, first.clone())
            };
            return Err(PlanError::AliasCollision {
                alias,
                first,
                second,
            });
        }
        wanted.insert(alias, (idx, full));
    }

    for (alias, (target, full)) in wanted {
        if alias == full {
            continue;
        }
        if Aggregate::from_name(&alias).is_some() {
            tracing::warn!(
                "`{}` is shadowed by the aggregate of the same name; build it as `{}`",
                alias,
                full
            );
            continue;
        }
        graph.add_alias(alias, target);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::builder::graph::{ArtifactGraph, FullFanoutLinking};
    use crate::core::artifact::{ArtifactResolver, SourceExtensions};
    use crate::core::errors::PlanError;
    use crate::core::module::{DeclKind, ModulePath};
    use crate::core::naming::BuildMode;
    use crate::core::registry::ModuleRegistry;

    fn graph(modules: &[(&str, &[&str], bool)], mode: BuildMode) -> Result<ArtifactGraph, PlanError> {
        let mut reg = ModuleRegistry::new("demo");
        for (name, programs, library) in modules {
            let m = ModulePath::new(name);
            reg.begin_module(&m).unwrap();
            reg.declare(&m, DeclKind::Program, programs.iter().copied())
                .unwrap();
            if *library {
                reg.declare(&m, DeclKind::CompiledUnit, ["core"]).unwrap();
                reg.request_library(&m, false).unwrap();
            }
            reg.end_module(&m).unwrap();
        }
        let plan = reg.finalize(&mode.naming("demo")).unwrap();
        let resolver = ArtifactResolver::with_exe_suffix(SourceExtensions::default(), "");
        ArtifactGraph::build(&plan, &resolver, &FullFanoutLinking, &mode)
    }

    #[test]
    fn test_aliases_resolve_to_full_paths() {
        let g = graph(&[("libs/A", &["tool"], true)], BuildMode::Project).unwrap();

        let target = g.alias_target("libA.a").unwrap();
        assert_eq!(target.display_name(), "libs/A/libA.a");
        let target = g.alias_target("tool").unwrap();
        assert_eq!(target.display_name(), "libs/A/tool");
    }

    #[test]
    fn test_alias_collision_is_reported() {
        let err = graph(
            &[("A", &["main"], false), ("B", &["main"], false)],
            BuildMode::Project,
        )
        .unwrap_err();

        assert_eq!(
            err,
            PlanError::AliasCollision {
                alias: "main".to_string(),
                first: "A/main".to_string(),
                second: "B/main".to_string(),
            }
        );
    }

    #[test]
    fn test_no_aliases_in_standalone_mode() {
        let g = graph(
            &[("libs/A", &["tool"], true)],
            BuildMode::Standalone(ModulePath::new("libs/A")),
        )
        .unwrap();

        assert_eq!(g.aliases().count(), 0);
        assert!(g.find("libs/A/libdemo.a").is_some());
        assert!(g.find("libdemo.a").is_none());
    }

    #[test]
    fn test_root_module_needs_no_alias() {
        let g = graph(&[(".", &["main"], false)], BuildMode::Project).unwrap();
        assert_eq!(g.aliases().count(), 0);
        assert!(g.find("main").is_some());
    }
}
