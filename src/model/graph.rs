//! The weighted directed author graph.
//!
//! Nodes are authors. Each ordered pair (source, target) has at most one
//! edge; repeated interactions raise its weight instead of adding parallel
//! edges. Nothing is ever removed.

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use super::AuthorId;

/// A directed, weighted edge. `weight` is always at least 1.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: AuthorId,
    pub target: AuthorId,
    pub weight: u64,
}

impl Edge {
    pub fn new(source: impl Into<AuthorId>, target: impl Into<AuthorId>, weight: u64) -> Self {
        Self { source: source.into(), target: target.into(), weight }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Author interaction graph: a node set plus source → target → weight adjacency.
///
/// Serializes as sorted `nodes` and `edges` lists so checkpoints are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "GraphRepr", try_from = "GraphRepr")]
pub struct InteractionGraph {
    nodes: HashSet<AuthorId>,
    /// source → (target → weight)
    adjacency: HashMap<AuthorId, HashMap<AuthorId, u64>>,
    edge_count: usize,
}

impl InteractionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node if absent. Returns true if it was new.
    pub fn add_node(&mut self, id: &str) -> bool {
        if self.nodes.contains(id) {
            return false;
        }
        self.nodes.insert(AuthorId::from(id))
    }

    /// Record one interaction from `source` to `target`, creating either
    /// node and the edge as needed. Returns the edge's new weight.
    pub fn add_interaction(&mut self, source: &str, target: &str) -> u64 {
        self.add_weighted(source, target, 1)
    }

    /// Add `weight` interactions at once. A zero weight only ensures the nodes.
    pub fn add_weighted(&mut self, source: &str, target: &str, weight: u64) -> u64 {
        self.add_node(source);
        self.add_node(target);
        if weight == 0 {
            return self.weight(source, target).unwrap_or(0);
        }

        let out = self.adjacency.entry_ref(source).or_default();
        let slot = out.entry_ref(target).or_insert(0);
        if *slot == 0 {
            self.edge_count += 1;
        }
        *slot += weight;
        *slot
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }

    pub fn contains_edge(&self, source: &str, target: &str) -> bool {
        self.weight(source, target).is_some()
    }

    /// Weight of the edge `source → target`, if it exists.
    pub fn weight(&self, source: &str, target: &str) -> Option<u64> {
        self.adjacency.get(source)?.get(target).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Sum of all edge weights, i.e. the number of interactions recorded.
    pub fn total_weight(&self) -> u64 {
        self.edges().map(|(_, _, w)| w).sum()
    }

    /// Nodes in arbitrary order.
    pub fn nodes(&self) -> impl Iterator<Item = &AuthorId> + '_ {
        self.nodes.iter()
    }

    /// Edges in arbitrary order, as `(source, target, weight)`.
    pub fn edges(&self) -> impl Iterator<Item = (&AuthorId, &AuthorId, u64)> + '_ {
        self.adjacency
            .iter()
            .flat_map(|(src, out)| out.iter().map(move |(dst, w)| (src, dst, *w)))
    }

    /// Outgoing edges of one author, as `(target, weight)`.
    pub fn outgoing<'a>(&'a self, source: &str) -> impl Iterator<Item = (&'a AuthorId, u64)> + use<'a> {
        self.adjacency
            .get(source)
            .into_iter()
            .flat_map(|out| out.iter().map(|(dst, w)| (dst, *w)))
    }

    /// Nodes sorted by identifier.
    pub fn sorted_nodes(&self) -> Vec<&AuthorId> {
        let mut nodes: Vec<_> = self.nodes.iter().collect();
        nodes.sort_unstable();
        nodes
    }

    /// Edges sorted by (source, target).
    pub fn sorted_edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .edges()
            .map(|(s, t, w)| Edge { source: s.clone(), target: t.clone(), weight: w })
            .collect();
        edges.sort_unstable();
        edges
    }
}

// ============================================================================
// Serde representation
// ============================================================================

#[derive(Serialize, Deserialize)]
struct GraphRepr {
    nodes: Vec<AuthorId>,
    edges: Vec<Edge>,
}

impl From<InteractionGraph> for GraphRepr {
    fn from(graph: InteractionGraph) -> Self {
        let edges = graph.sorted_edges();
        let mut nodes: Vec<AuthorId> = graph.nodes.into_iter().collect();
        nodes.sort_unstable();
        GraphRepr { nodes, edges }
    }
}

impl TryFrom<GraphRepr> for InteractionGraph {
    type Error = String;

    fn try_from(repr: GraphRepr) -> std::result::Result<Self, Self::Error> {
        let mut graph = InteractionGraph::new();
        for node in &repr.nodes {
            graph.add_node(node.as_str());
        }
        for edge in &repr.edges {
            if edge.weight == 0 {
                return Err(format!("edge {} -> {} has zero weight", edge.source, edge.target));
            }
            graph.add_weighted(edge.source.as_str(), edge.target.as_str(), edge.weight);
        }
        Ok(graph)
    }
}
