//! Promotion graph and pipeline-consistent environment ordering
//!
//! The deployment pipeline's promotion paths form a directed graph over
//! environment names. Ordering runs Kahn's algorithm over that graph, levels
//! every node by its longest path from a root, and sorts by level. Ties within
//! a level compare by preference rank when both names are on the preference
//! list and by name otherwise, so development still comes before staging
//! before production. Environments the pipeline never mentions are appended in
//! input order.

use crate::models::{DeploymentPipeline, PromotionTarget};
use crate::names::{NameIndex, NameKey};
use indexmap::{IndexMap, IndexSet};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;
use tracing::{debug, warn};

/// Environment names preferred, in this order, when the graph permits ties
pub const DEFAULT_ENVIRONMENT_PREFERENCE: &[&str] = &[
    "development",
    "dev",
    "test",
    "qa",
    "integration",
    "staging",
    "stage",
    "uat",
    "preprod",
    "pre-production",
    "production",
    "prod",
];

/// An outgoing promotion edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionEdge {
    /// Target environment
    pub target: NameKey,
    /// Promotion requires an approval step
    pub requires_approval: Option<bool>,
    /// Approval must be given manually
    pub is_manual_approval_required: Option<bool>,
}

/// Kahn's algorithm could not order every node
#[derive(Debug, Clone, Error)]
#[error("Promotion graph contains a cycle through: {}", stuck_names(.stuck))]
pub struct CycleError {
    /// Nodes whose in-degree never reached zero
    pub stuck: Vec<NameKey>,
}

fn stuck_names(stuck: &[NameKey]) -> String {
    stuck
        .iter()
        .map(NameKey::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Directed graph of permitted promotions
#[derive(Debug, Clone, Default)]
pub struct PromotionGraph {
    /// Adjacency list, in pipeline order
    edges: IndexMap<NameKey, Vec<PromotionEdge>>,
    /// Reverse edges for level computation
    reverse_edges: IndexMap<NameKey, Vec<NameKey>>,
    /// Every node touched by an edge
    nodes: IndexSet<NameKey>,
}

impl PromotionGraph {
    /// Build the graph from a pipeline, registering every name it mentions
    pub fn from_pipeline(pipeline: &DeploymentPipeline, names: &mut NameIndex) -> Self {
        let mut graph = Self::default();

        for path in &pipeline.promotion_paths {
            let source = names.register(&path.source_environment_ref);
            for target in &path.target_environment_refs {
                graph.add_edge(source.clone(), names.register(&target.name), target);
            }
        }

        graph
    }

    fn add_edge(&mut self, source: NameKey, target: NameKey, spec: &PromotionTarget) {
        let outgoing = self.edges.entry(source.clone()).or_default();
        if outgoing.iter().any(|e| e.target == target) {
            // Duplicate edge; the first declaration keeps its approval flags
            return;
        }

        outgoing.push(PromotionEdge {
            target: target.clone(),
            requires_approval: spec.requires_approval,
            is_manual_approval_required: spec.is_manual_approval_required,
        });
        self.reverse_edges
            .entry(target.clone())
            .or_default()
            .push(source.clone());

        self.nodes.insert(source);
        self.nodes.insert(target);
    }

    /// Whether the graph has no edges
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether a node takes part in any edge
    pub fn contains(&self, key: &NameKey) -> bool {
        self.nodes.contains(key)
    }

    /// Outgoing promotions of a node, in pipeline order
    pub fn targets(&self, key: &NameKey) -> &[PromotionEdge] {
        self.edges.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Perform topological sort (Kahn's algorithm)
    pub fn topological_sort(&self) -> Result<Vec<NameKey>, CycleError> {
        let mut in_degree: IndexMap<&NameKey, usize> =
            self.nodes.iter().map(|node| (node, 0)).collect();
        for outgoing in self.edges.values() {
            for edge in outgoing {
                if let Some(degree) = in_degree.get_mut(&edge.target) {
                    *degree += 1;
                }
            }
        }

        let mut queue: VecDeque<&NameKey> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(node, _)| *node)
            .collect();
        let mut result = Vec::with_capacity(self.nodes.len());

        while let Some(node) = queue.pop_front() {
            result.push(node.clone());

            for edge in self.targets(node) {
                if let Some(degree) = in_degree.get_mut(&edge.target) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(&edge.target);
                    }
                }
            }
        }

        if result.len() != self.nodes.len() {
            let stuck = in_degree
                .into_iter()
                .filter(|(_, degree)| *degree > 0)
                .map(|(node, _)| node.clone())
                .collect();
            return Err(CycleError { stuck });
        }

        Ok(result)
    }

    /// Longest path length from a root to each node
    pub fn levels(&self) -> HashMap<NameKey, usize> {
        fn level_of(
            node: &NameKey,
            graph: &PromotionGraph,
            levels: &mut HashMap<NameKey, usize>,
            visiting: &mut HashSet<NameKey>,
        ) -> usize {
            if let Some(&level) = levels.get(node) {
                return level;
            }

            // Only reachable on cyclic input; callers fall back before using it
            if !visiting.insert(node.clone()) {
                return 0;
            }

            let level = graph
                .reverse_edges
                .get(node)
                .map(|preds| {
                    preds
                        .iter()
                        .map(|pred| level_of(pred, graph, levels, visiting) + 1)
                        .max()
                        .unwrap_or(0)
                })
                .unwrap_or(0);

            visiting.remove(node);
            levels.insert(node.clone(), level);
            level
        }

        let mut levels = HashMap::with_capacity(self.nodes.len());
        let mut visiting = HashSet::new();
        for node in &self.nodes {
            level_of(node, self, &mut levels, &mut visiting);
        }
        levels
    }
}

/// Curated environment names used to break ordering ties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentPreference {
    ranked: Vec<NameKey>,
}

impl EnvironmentPreference {
    /// Build a preference from names, most preferred first
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ranked: Vec<NameKey> = Vec::new();
        for name in names {
            let key = NameKey::new(name.as_ref());
            if !ranked.contains(&key) {
                ranked.push(key);
            }
        }
        Self { ranked }
    }

    /// Position of a name in the list, if listed
    pub fn rank(&self, key: &NameKey) -> Option<usize> {
        self.ranked.iter().position(|k| k == key)
    }

    /// Compare two names sharing a level
    ///
    /// List positions decide only when both names are listed; any other pair
    /// compares by folded name.
    pub fn tie_break(&self, a: &NameKey, b: &NameKey) -> Ordering {
        match (self.rank(a), self.rank(b)) {
            (Some(rank_a), Some(rank_b)) => rank_a.cmp(&rank_b).then_with(|| a.cmp(b)),
            _ => a.cmp(b),
        }
    }
}

impl Default for EnvironmentPreference {
    fn default() -> Self {
        Self::new(DEFAULT_ENVIRONMENT_PREFERENCE)
    }
}

/// How the final order was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStrategy {
    /// Ordered by the promotion graph, orphans appended
    Pipeline,
    /// No usable pipeline; input order kept
    InputOrder,
    /// The pipeline had a cycle; input order kept for every environment
    InputFallback,
}

/// Result of ordering a set of environments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentOrder {
    /// Distinct environment keys, in display order
    pub keys: Vec<NameKey>,
    /// Strategy that produced `keys`
    pub strategy: OrderStrategy,
}

/// Order environment names consistently with the promotion graph
///
/// `environments` is the input order. The output contains each distinct key
/// of `environments` exactly once; graph nodes that are not environments are
/// dropped.
pub fn resolve_order(
    environments: &[NameKey],
    graph: Option<&PromotionGraph>,
    preference: &EnvironmentPreference,
) -> EnvironmentOrder {
    let mut input: IndexSet<NameKey> = IndexSet::with_capacity(environments.len());
    for key in environments {
        input.insert(key.clone());
    }

    let graph = match graph {
        Some(graph) if !graph.is_empty() => graph,
        _ => {
            return EnvironmentOrder {
                keys: input.into_iter().collect(),
                strategy: OrderStrategy::InputOrder,
            };
        }
    };

    let mut sorted = match graph.topological_sort() {
        Ok(sorted) => sorted,
        Err(cycle) => {
            warn!("{}; keeping environment input order", cycle);
            return EnvironmentOrder {
                keys: input.into_iter().collect(),
                strategy: OrderStrategy::InputFallback,
            };
        }
    };

    let levels = graph.levels();
    let level = |key: &NameKey| levels.get(key).copied().unwrap_or(0);
    // The tie-break is not transitive across listed and unlisted names, so
    // the slice sorts would be free to reorder arbitrarily
    for i in 1..sorted.len() {
        let mut j = i;
        while j > 0 {
            let (prev, cur) = (&sorted[j - 1], &sorted[j]);
            let order = level(prev)
                .cmp(&level(cur))
                .then_with(|| preference.tie_break(prev, cur));
            if order != Ordering::Greater {
                break;
            }
            sorted.swap(j - 1, j);
            j -= 1;
        }
    }
    debug!(
        "Pipeline order: {:?}",
        sorted.iter().map(NameKey::as_str).collect::<Vec<_>>()
    );

    let mut keys: Vec<NameKey> = sorted
        .into_iter()
        .filter(|key| input.contains(key))
        .collect();
    keys.extend(input.into_iter().filter(|key| !graph.contains(key)));

    EnvironmentOrder {
        keys,
        strategy: OrderStrategy::Pipeline,
    }
}
