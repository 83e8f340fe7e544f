//! Build executor with progress reporting.
//!
//! Runs everything reachable from one target, level by level. Nodes of a
//! level run in parallel on a dedicated rayon pool. A failure poisons every
//! node that depends on it; unrelated branches keep going.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use petgraph::graph::NodeIndex;
use rayon::prelude::*;

use crate::builder::context::BuildContext;
use crate::builder::errors::BuildError;
use crate::builder::graph::{ArtifactGraph, BuildAction};
use crate::builder::native::{NativeBuilder, NodeStatus};

/// Outcome of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Built,
    Fresh,
    Failed(BuildError),
    /// A dependency failed or was skipped
    Skipped(String),
}

/// Counts for a finished build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Actions that ran
    pub built: usize,
    /// Outputs that were already up to date
    pub fresh: usize,
}

/// Build executor with progress tracking.
pub struct BuildExecutor<'a> {
    ctx: &'a BuildContext,
}

impl<'a> BuildExecutor<'a> {
    /// Create a new build executor.
    pub fn new(ctx: &'a BuildContext) -> Self {
        BuildExecutor { ctx }
    }

    /// Bring `target` and everything it needs up to date.
    ///
    /// Returns the first failure (in dependency order) after every
    /// independent branch has finished.
    pub fn execute(&self, graph: &ArtifactGraph, target: NodeIndex) -> Result<BuildSummary> {
        let start = Instant::now();
        let levels = graph.levels(target);

        let mut pool = rayon::ThreadPoolBuilder::new();
        if let Some(jobs) = self.ctx.jobs {
            pool = pool.num_threads(jobs);
        }
        let pool = pool.build().context("failed to start build thread pool")?;

        let total = levels
            .iter()
            .flatten()
            .filter(|idx| graph.node(**idx).action.produces_output())
            .count();
        let pb = self.progress_bar(total);

        let builder = NativeBuilder::new(self.ctx);
        let mut outcomes: HashMap<NodeIndex, Outcome> = HashMap::new();
        let mut built: HashSet<NodeIndex> = HashSet::new();
        let mut failures: Vec<BuildError> = Vec::new();

        for level in &levels {
            let results: Vec<(NodeIndex, Outcome)> = pool.install(|| {
                level
                    .par_iter()
                    .map(|&idx| {
                        let outcome = match poisoned_by(graph, idx, &outcomes) {
                            Some(dep) => Outcome::Skipped(dep),
                            None => match builder.run_node(graph, idx, &built) {
                                Ok(NodeStatus::Built) => Outcome::Built,
                                Ok(NodeStatus::Fresh) => Outcome::Fresh,
                                Err(e) => Outcome::Failed(e),
                            },
                        };
                        if let Some(pb) = &pb {
                            if graph.node(idx).action.produces_output() {
                                pb.set_message(graph.node(idx).display_name());
                                pb.inc(1);
                            }
                        }
                        (idx, outcome)
                    })
                    .collect()
            });

            for (idx, outcome) in results {
                match &outcome {
                    Outcome::Built => {
                        built.insert(idx);
                    }
                    Outcome::Failed(e) => {
                        tracing::error!("{}", e);
                        failures.push(e.clone());
                    }
                    Outcome::Skipped(dep) => {
                        tracing::debug!(
                            "{}",
                            BuildError::DependencyFailed {
                                artifact: graph.node(idx).display_name(),
                                dependency: dep.clone(),
                            }
                        );
                    }
                    Outcome::Fresh => {}
                }
                outcomes.insert(idx, outcome);
            }
        }

        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }

        if let Some(first) = failures.into_iter().next() {
            return Err(first.into());
        }

        let summary = BuildSummary {
            built: built.len(),
            fresh: outcomes
                .iter()
                .filter(|(idx, o)| {
                    **o == Outcome::Fresh
                        && !matches!(graph.node(**idx).action, BuildAction::Source | BuildAction::Phony)
                })
                .count(),
        };

        eprintln!(
            "    Finished `{}`: {} built, {} up to date in {:.2}s",
            graph.node(target).display_name(),
            summary.built,
            summary.fresh,
            start.elapsed().as_secs_f64()
        );

        Ok(summary)
    }

    fn progress_bar(&self, total: usize) -> Option<ProgressBar> {
        if self.ctx.verbose || total <= 1 {
            return None;
        }
        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    }
}

/// Name of the first dependency that failed or was skipped.
fn poisoned_by(
    graph: &ArtifactGraph,
    idx: NodeIndex,
    outcomes: &HashMap<NodeIndex, Outcome>,
) -> Option<String> {
    graph.dependencies(idx).find_map(|dep| match outcomes.get(&dep) {
        Some(Outcome::Failed(_)) => Some(graph.node(dep).display_name()),
        Some(Outcome::Skipped(root)) => Some(root.clone()),
        _ => None,
    })
}
