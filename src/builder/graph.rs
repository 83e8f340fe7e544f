//! ArtifactGraph - the build DAG derived from a finalized plan.
//!
//! Nodes are artifacts (sources, objects, archives, executables, generated
//! files), shorthand aliases and aggregate targets. An edge `a -> b` means
//! "`a` needs `b`". Every node carries the action that produces it, so the
//! executor never looks back at the plan.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;

use crate::builder::alias;
use crate::core::artifact::{ArtifactId, ArtifactKind, ArtifactResolver, Language};
use crate::core::errors::PlanError;
use crate::core::module::QualifiedName;
use crate::core::naming::BuildMode;
use crate::core::plan::ProjectPlan;
use crate::util::paths::{normalize_relative, to_slash};

/// Named targets that group other artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Aggregate {
    /// Archives, shared objects, non-test programs, generated files
    All,
    Libraries,
    Programs,
    /// Test programs, excluded from `all`
    TestPrograms,
    Generated,
}

impl Aggregate {
    pub const ALL: [Aggregate; 5] = [
        Aggregate::All,
        Aggregate::Libraries,
        Aggregate::Programs,
        Aggregate::TestPrograms,
        Aggregate::Generated,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Aggregate::All => "all",
            Aggregate::Libraries => "libraries",
            Aggregate::Programs => "programs",
            Aggregate::TestPrograms => "programs-test",
            Aggregate::Generated => "generated",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a node stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Artifact(ArtifactId),
    Aggregate(Aggregate),
    /// Shorthand name for a single artifact
    Alias(String),
    /// Generated-rule input that is not a declared artifact
    File(PathBuf),
}

/// How a node is brought up to date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildAction {
    /// Authored file; must already exist
    Source,
    Compile {
        lang: Language,
        source: PathBuf,
    },
    Archive {
        objects: Vec<PathBuf>,
    },
    SharedLink {
        objects: Vec<PathBuf>,
    },
    LinkExe {
        lang: Language,
        objects: Vec<PathBuf>,
        archives: Vec<PathBuf>,
    },
    /// Project-defined command, run in `cwd`
    Generate {
        command: Vec<String>,
        cwd: PathBuf,
    },
    /// Nothing to run; done once its dependencies are
    Phony,
}

impl BuildAction {
    /// Whether running the action writes the node's file.
    pub fn produces_output(&self) -> bool {
        !matches!(self, BuildAction::Source | BuildAction::Phony)
    }
}

/// A node of the artifact graph.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub kind: NodeKind,
    /// Project-relative file, absent for aliases and aggregates
    pub path: Option<PathBuf>,
    pub action: BuildAction,
}

impl GraphNode {
    fn phony(kind: NodeKind) -> Self {
        GraphNode {
            kind,
            path: None,
            action: BuildAction::Phony,
        }
    }

    /// Name used in logs and error messages.
    pub fn display_name(&self) -> String {
        match (&self.kind, &self.path) {
            (NodeKind::Aggregate(agg), _) => agg.name().to_string(),
            (NodeKind::Alias(alias), _) => alias.clone(),
            (_, Some(path)) => to_slash(path),
            (NodeKind::Artifact(id), None) => id.to_string(),
            (NodeKind::File(path), None) => to_slash(path),
        }
    }
}

/// Chooses the archives a program links against.
pub trait LinkPolicy: Send + Sync {
    fn archives_for(&self, program: &QualifiedName, plan: &ProjectPlan) -> Vec<ArtifactId>;
}

/// Every program links against every archive in the project.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullFanoutLinking;

impl LinkPolicy for FullFanoutLinking {
    fn archives_for(&self, _program: &QualifiedName, plan: &ProjectPlan) -> Vec<ArtifactId> {
        plan.libraries()
            .map(|lib| ArtifactId::archive(&lib.module, &lib.name))
            .collect()
    }
}

/// The build DAG.
#[derive(Debug, Clone)]
pub struct ArtifactGraph {
    graph: DiGraph<GraphNode, ()>,
    by_path: HashMap<PathBuf, NodeIndex>,
    aggregates: BTreeMap<Aggregate, NodeIndex>,
    aliases: BTreeMap<String, NodeIndex>,
}

impl ArtifactGraph {
    /// Derive the graph from a finalized plan.
    pub fn build(
        plan: &ProjectPlan,
        resolver: &ArtifactResolver,
        policy: &dyn LinkPolicy,
        mode: &BuildMode,
    ) -> Result<Self, PlanError> {
        let mut g = ArtifactGraph {
            graph: DiGraph::new(),
            by_path: HashMap::new(),
            aggregates: BTreeMap::new(),
            aliases: BTreeMap::new(),
        };

        for agg in Aggregate::ALL {
            let idx = g.graph.add_node(GraphNode::phony(NodeKind::Aggregate(agg)));
            g.aggregates.insert(agg, idx);
        }

        // Generated files first, so a declared source that is also generated
        // resolves to the generating node.
        for (file, rule) in plan.generated() {
            let id = ArtifactId::generated(file);
            let action = match rule {
                Some(rule) => BuildAction::Generate {
                    command: rule.command.clone(),
                    cwd: PathBuf::from(file.module.as_str()),
                },
                None => BuildAction::Source,
            };
            let idx = g.add_artifact(resolver, id, action);
            g.link_aggregate(Aggregate::Generated, idx);
            g.link_aggregate(Aggregate::All, idx);
        }

        for (unit, has_header) in plan.units() {
            let obj = g.add_object(resolver, unit, Language::C);
            if has_header {
                let header = g.add_source(resolver, ArtifactId::header(unit));
                g.add_edge(obj, header);
            }
        }
        for unit in plan.fortran_units() {
            g.add_object(resolver, unit, Language::Fortran);
        }

        for lib in plan.libraries() {
            let objects: Vec<PathBuf> = plan
                .module_units(&lib.module)
                .map(|(unit, _)| resolver.path(&ArtifactId::object(unit)))
                .chain(
                    plan.module_fortran_units(&lib.module)
                        .map(|unit| resolver.path(&ArtifactId::object(unit))),
                )
                .collect();

            if objects.is_empty() {
                tracing::warn!(
                    "library `{}` in module `{}` has no compiled units",
                    lib.name,
                    lib.module
                );
            }

            let archive = g.add_artifact(
                resolver,
                ArtifactId::archive(&lib.module, &lib.name),
                BuildAction::Archive {
                    objects: objects.clone(),
                },
            );
            g.link_paths(archive, &objects);
            g.link_aggregate(Aggregate::Libraries, archive);
            g.link_aggregate(Aggregate::All, archive);

            if lib.shared {
                let shared = g.add_artifact(
                    resolver,
                    ArtifactId::shared_object(&lib.module, &lib.name),
                    BuildAction::SharedLink {
                        objects: objects.clone(),
                    },
                );
                g.link_paths(shared, &objects);
                g.link_aggregate(Aggregate::Libraries, shared);
                g.link_aggregate(Aggregate::All, shared);
            }
        }

        let programs = plan
            .programs()
            .map(|p| (p, Language::C, false))
            .chain(plan.fortran_programs().map(|p| (p, Language::Fortran, false)))
            .chain(plan.test_programs().map(|p| (p, Language::C, true)));

        for (program, lang, is_test) in programs {
            g.add_object(resolver, program, lang);
            let objects = vec![resolver.path(&ArtifactId::object(program))];
            let archives: Vec<PathBuf> = policy
                .archives_for(program, plan)
                .iter()
                .map(|id| resolver.path(id))
                .collect();

            let exe = g.add_artifact(
                resolver,
                ArtifactId::executable(program),
                BuildAction::LinkExe {
                    lang,
                    objects: objects.clone(),
                    archives: archives.clone(),
                },
            );
            g.link_paths(exe, &objects);
            g.link_paths(exe, &archives);

            if is_test {
                g.link_aggregate(Aggregate::TestPrograms, exe);
            } else {
                g.link_aggregate(Aggregate::Programs, exe);
                g.link_aggregate(Aggregate::All, exe);
            }
        }

        // Rule inputs may name any artifact above, so wire them last.
        for (file, rule) in plan.generated() {
            let Some(rule) = rule else { continue };
            let Some(&idx) = g.by_path.get(&resolver.path(&ArtifactId::generated(file))) else {
                continue;
            };
            for input in &rule.inputs {
                let path = normalize_relative(&file.module.join(input))
                    .filter(|p| !p.as_os_str().is_empty())
                    .ok_or_else(|| {
                    PlanError::InputOutsideProject {
                        artifact: file.to_string(),
                        input: input.clone(),
                    }
                })?;
                let dep = match g.by_path.get(&path) {
                    Some(&dep) => dep,
                    None => g.add_file(path),
                };
                g.add_edge(idx, dep);
            }
        }

        if mode.aliases_enabled() {
            alias::register(&mut g, resolver)?;
        }

        if let Err(cycle) = toposort(&g.graph, None) {
            return Err(PlanError::DependencyCycle {
                artifact: g.graph[cycle.node_id()].display_name(),
            });
        }

        tracing::debug!(
            "artifact graph has {} node(s) and {} edge(s)",
            g.graph.node_count(),
            g.graph.edge_count()
        );

        Ok(g)
    }

    fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        let path = node.path.clone();
        let idx = self.graph.add_node(node);
        if let Some(path) = path {
            self.by_path.insert(path, idx);
        }
        idx
    }

    fn add_artifact(
        &mut self,
        resolver: &ArtifactResolver,
        id: ArtifactId,
        action: BuildAction,
    ) -> NodeIndex {
        let path = resolver.path(&id);
        self.add_node(GraphNode {
            kind: NodeKind::Artifact(id),
            path: Some(path),
            action,
        })
    }

    /// Authored file, reusing a generated node at the same path.
    fn add_source(&mut self, resolver: &ArtifactResolver, id: ArtifactId) -> NodeIndex {
        match self.by_path.get(&resolver.path(&id)) {
            Some(&idx) => idx,
            None => self.add_artifact(resolver, id, BuildAction::Source),
        }
    }

    fn add_file(&mut self, path: PathBuf) -> NodeIndex {
        self.add_node(GraphNode {
            kind: NodeKind::File(path.clone()),
            path: Some(path),
            action: BuildAction::Source,
        })
    }

    fn add_object(
        &mut self,
        resolver: &ArtifactResolver,
        unit: &QualifiedName,
        lang: Language,
    ) -> NodeIndex {
        let source_id = ArtifactId::source(unit, lang);
        let source_path = resolver.path(&source_id);
        let source = self.add_source(resolver, source_id);
        let obj = self.add_artifact(
            resolver,
            ArtifactId::object(unit),
            BuildAction::Compile {
                lang,
                source: source_path,
            },
        );
        self.add_edge(obj, source);
        obj
    }

    pub(crate) fn add_alias(&mut self, alias: String, target: NodeIndex) {
        let idx = self
            .graph
            .add_node(GraphNode::phony(NodeKind::Alias(alias.clone())));
        self.add_edge(idx, target);
        self.aliases.insert(alias, idx);
    }

    fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        if !self.graph.contains_edge(from, to) {
            self.graph.add_edge(from, to, ());
        }
    }

    fn link_paths(&mut self, from: NodeIndex, paths: &[PathBuf]) {
        for path in paths {
            if let Some(&to) = self.by_path.get(path) {
                self.add_edge(from, to);
            }
        }
    }

    fn link_aggregate(&mut self, agg: Aggregate, to: NodeIndex) {
        let from = self.aggregates[&agg];
        self.add_edge(from, to);
    }

    /// Look a target up by aggregate name, alias, or project-relative path.
    pub fn find(&self, name: &str) -> Option<NodeIndex> {
        if let Some(agg) = Aggregate::from_name(name) {
            return Some(self.aggregates[&agg]);
        }
        if let Some(&idx) = self.aliases.get(name) {
            return Some(idx);
        }

        let mut rel = name.replace('\\', "/");
        while let Some(rest) = rel.strip_prefix("./") {
            rel = rest.to_string();
        }
        self.by_path.get(Path::new(&rel)).copied()
    }

    pub fn aggregate(&self, agg: Aggregate) -> NodeIndex {
        self.aggregates[&agg]
    }

    pub fn node(&self, idx: NodeIndex) -> &GraphNode {
        &self.graph[idx]
    }

    /// Direct dependencies of a node.
    pub fn dependencies(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(idx, Direction::Outgoing)
    }

    /// Whether `from` has a direct edge to `to`, both looked up with [`find`].
    ///
    /// [`find`]: ArtifactGraph::find
    pub fn depends_on(&self, from: &str, to: &str) -> bool {
        match (self.find(from), self.find(to)) {
            (Some(a), Some(b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// Nodes reachable from `root` (itself included).
    pub fn reachable(&self, root: NodeIndex) -> HashSet<NodeIndex> {
        let mut seen = HashSet::new();
        let mut dfs = Dfs::new(&self.graph, root);
        while let Some(idx) = dfs.next(&self.graph) {
            seen.insert(idx);
        }
        seen
    }

    /// Nodes reachable from `root`, grouped so that every node's
    /// dependencies sit in earlier levels.
    pub fn levels(&self, root: NodeIndex) -> Vec<Vec<NodeIndex>> {
        let reachable = self.reachable(root);
        let order = match toposort(&self.graph, None) {
            Ok(order) => order,
            // Cycles are rejected in `build`
            Err(_) => return Vec::new(),
        };

        let mut depth: HashMap<NodeIndex, usize> = HashMap::new();
        let mut levels: Vec<Vec<NodeIndex>> = Vec::new();

        // toposort puts dependents first
        for idx in order.into_iter().rev().filter(|i| reachable.contains(i)) {
            let level = self
                .dependencies(idx)
                .filter_map(|dep| depth.get(&dep))
                .map(|d| d + 1)
                .max()
                .unwrap_or(0);
            depth.insert(idx, level);
            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(idx);
        }

        for level in &mut levels {
            level.sort_by_key(|idx| self.graph[*idx].display_name());
        }
        levels
    }

    /// Artifacts the build writes, in path order.
    pub fn outputs(&self) -> Vec<&GraphNode> {
        let mut outputs: Vec<&GraphNode> = self
            .graph
            .node_weights()
            .filter(|n| n.action.produces_output() && n.path.is_some())
            .collect();
        outputs.sort_by(|a, b| a.path.cmp(&b.path));
        outputs
    }

    /// Artifacts of the given kinds, for the alias layer.
    pub(crate) fn artifacts_of<'a>(
        &'a self,
        kinds: &'a [ArtifactKind],
    ) -> impl Iterator<Item = (NodeIndex, &'a ArtifactId)> + 'a {
        self.graph.node_indices().filter_map(move |idx| match &self.graph[idx].kind {
            NodeKind::Artifact(id) if kinds.contains(&id.kind) => Some((idx, id)),
            _ => None,
        })
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, NodeIndex)> {
        self.aliases.iter().map(|(name, idx)| (name.as_str(), *idx))
    }

    pub fn alias_target(&self, alias: &str) -> Option<&GraphNode> {
        let idx = self.aliases.get(alias)?;
        self.dependencies(*idx).next().map(|t| &self.graph[t])
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}
