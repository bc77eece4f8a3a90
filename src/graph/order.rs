//! Dependency ordering for the CPM passes.
//!
//! The input order of dependencies carries no meaning, so both passes run
//! over an explicit topological order. Cycles are broken by dropping each
//! back-edge found during the depth-first search.
//!
//! # Algorithm
//! 1. DFS from every entity in reference order. An edge into a node still on
//!    the recursion stack is a back-edge: it is excluded and reported.
//! 2. Reverse post-order gives the node order.
//! 3. Edges are sorted by their predecessor's position. Edges between two
//!    anchors of the same entity come first within that position.
//!
//! Every edge into a node then precedes every edge out of it, so the forward
//! pass sees final predecessor dates. Reversing the list gives the same
//! guarantee for the backward pass.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::{HashMap, HashSet};

use tracing::warn;

use super::ScheduleGraph;
use crate::models::{DependencyId, EntityRef};

/// Topological order of a [`ScheduleGraph`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyOrder {
    /// Entities in topological order.
    pub nodes: Vec<EntityRef>,
    /// Indices into [`ScheduleGraph::dependencies`] in forward-pass order.
    pub edges: Vec<usize>,
    /// Dependencies excluded to break cycles.
    pub broken: Vec<DependencyId>,
}

impl DependencyOrder {
    /// Whether any cycle had to be broken.
    pub fn has_cycles(&self) -> bool {
        !self.broken.is_empty()
    }

    /// Edge indices in backward-pass order.
    pub fn reversed_edges(&self) -> impl Iterator<Item = usize> + '_ {
        self.edges.iter().rev().copied()
    }
}

/// Computes the dependency order of `graph`, breaking cycles.
pub fn dependency_order(graph: &ScheduleGraph) -> DependencyOrder {
    let dependencies = graph.dependencies();

    // Adjacency: entity → outgoing edge indices (same-entity edges skipped)
    let mut adj: HashMap<EntityRef, Vec<usize>> = HashMap::new();
    for (idx, dep) in dependencies.iter().enumerate() {
        if dep.predecessor != dep.successor {
            adj.entry(dep.predecessor).or_default().push(idx);
        }
    }

    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();
    let mut post_order = Vec::with_capacity(graph.len());
    let mut back_edges = HashSet::new();

    for node in graph.references() {
        if !visited.contains(&node) {
            visit(
                node,
                graph,
                &adj,
                &mut visited,
                &mut in_stack,
                &mut post_order,
                &mut back_edges,
            );
        }
    }

    post_order.reverse();
    let nodes = post_order;
    let position: HashMap<EntityRef, usize> =
        nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();

    let mut edges: Vec<usize> = (0..dependencies.len())
        .filter(|idx| !back_edges.contains(idx))
        .collect();
    edges.sort_by_key(|&idx| {
        let dep = &dependencies[idx];
        let pos = position.get(&dep.predecessor).copied().unwrap_or(usize::MAX);
        (pos, dep.predecessor != dep.successor, idx)
    });

    let mut broken: Vec<usize> = back_edges.into_iter().collect();
    broken.sort_unstable();

    DependencyOrder {
        nodes,
        edges,
        broken: broken.into_iter().map(|idx| dependencies[idx].id).collect(),
    }
}

fn visit(
    node: EntityRef,
    graph: &ScheduleGraph,
    adj: &HashMap<EntityRef, Vec<usize>>,
    visited: &mut HashSet<EntityRef>,
    in_stack: &mut HashSet<EntityRef>,
    post_order: &mut Vec<EntityRef>,
    back_edges: &mut HashSet<usize>,
) {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(out) = adj.get(&node) {
        for &idx in out {
            let next = graph.dependencies()[idx].successor;
            if in_stack.contains(&next) {
                warn!(
                    "Dependency cycle: {} excluded from ordering; results inside the cycle are not authoritative",
                    graph.dependencies()[idx]
                );
                back_edges.insert(idx);
            } else if !visited.contains(&next) {
                visit(next, graph, adj, visited, in_stack, post_order, back_edges);
            }
        }
    }

    in_stack.remove(&node);
    post_order.push(node);
}
