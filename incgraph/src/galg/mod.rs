//! Graph algorithms
//!
//! Stateless helpers over `Digraph`, all driven by the `Walker` framework
//! except the weighted shortest path.
//!
//! | Algorithm | Notes |
//! |-----------|-------|
//! | [`strongly_connected_components`] | Tarjan on a DFS walker; one shared set per component |
//! | [`transitive_closure`] | Closing DFS; members of an SCC share one reachability set |
//! | [`transitive_reduction`] | Acyclic graphs only, fails with `NotAcyclic` |
//! | [`transitive_reduction_brute`] | Any graph, one path check per edge |
//! | [`shortest_path`] / [`weighted_shortest_path`] | BFS / Dijkstra |
//! | [`copy_induced`] | Copy of the subgraph induced by a vertex set |

mod closure;
mod path;
mod reduction;
mod scc;

pub use closure::transitive_closure;
pub use path::{has_path_avoiding, shortest_path, weighted_shortest_path};
pub use reduction::{topological_order, transitive_reduction, transitive_reduction_brute};
pub use scc::{calc_scc_map, strongly_connected_components, Component};

use crate::error::GraphError;
use crate::graph::{Digraph, VertexId};
use std::collections::{HashMap, HashSet};

/// Successors of `vertex`.
///
/// Each call starts a fresh pass; do not mutate the graph while iterating.
pub fn out_neighbours<V, E>(graph: &Digraph<V, E>, vertex: VertexId) -> impl Iterator<Item = VertexId> + '_ {
    graph
        .out_edges(vertex)
        .iter()
        .filter_map(move |edge| graph.head(*edge).ok())
}

/// Predecessors of `vertex`.
///
/// Each call starts a fresh pass; do not mutate the graph while iterating.
pub fn in_neighbours<V, E>(graph: &Digraph<V, E>, vertex: VertexId) -> impl Iterator<Item = VertexId> + '_ {
    graph
        .in_edges(vertex)
        .iter()
        .filter_map(move |edge| graph.tail(*edge).ok())
}

/// Copy the subgraph induced by `vertices` into `target`.
///
/// Returns the mapping from source to target vertex ids.
pub fn copy_induced<V: Clone, E: Clone>(
    graph: &Digraph<V, E>,
    vertices: &HashSet<VertexId>,
    target: &mut Digraph<V, E>,
) -> Result<HashMap<VertexId, VertexId>, GraphError> {
    let mut mapping = HashMap::with_capacity(vertices.len());
    let mut ordered: Vec<VertexId> = vertices.iter().copied().collect();
    ordered.sort_unstable();

    for vertex in ordered {
        let copy = target.add_vertex(graph.vertex(vertex)?.clone());
        mapping.insert(vertex, copy);
    }

    for (_, tail, head, data) in graph.edges() {
        if let (Some(&t), Some(&h)) = (mapping.get(&tail), mapping.get(&head)) {
            target.add_edge(t, h, data.clone())?;
        }
    }
    Ok(mapping)
}
