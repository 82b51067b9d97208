//! Transitive reduction
//!
//! Two variants: a linear sweep for acyclic graphs that refuses cyclic input,
//! and a brute-force one that works on anything at one path search per edge.
//! Callers pick explicitly; the acyclic one never falls back on its own.

use super::path::has_path_avoiding;
use crate::annotation::Annotation;
use crate::error::GraphError;
use crate::graph::{Digraph, EdgeId, VertexId};
use crate::walker::{Status, Visitor, Walker, WalkerInfo};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Collects DFS postorder and spots back edges
#[derive(Debug, Default)]
struct TopoSort {
    postorder: Vec<VertexId>,
    cycle: Option<VertexId>,
}

impl<V, E> Visitor<V, E> for TopoSort {
    fn see(&mut self, graph: &Digraph<V, E>, _: VertexId, _: EdgeId, to: VertexId, info: &Annotation<WalkerInfo>) {
        let open = info
            .vertex(graph, to)
            .map(|i| i.status == Status::Seen)
            .unwrap_or(false);
        if open && self.cycle.is_none() {
            self.cycle = Some(to);
        }
    }

    fn finish(&mut self, _: &Digraph<V, E>, vertex: VertexId, _: &Annotation<WalkerInfo>) {
        self.postorder.push(vertex);
    }

    fn stop(&self) -> bool {
        self.cycle.is_some()
    }
}

/// Vertices ordered so that every edge points forward.
///
/// Fails with `NotAcyclic` if the graph has a cycle (self-loops included).
pub fn topological_order<V, E>(graph: &Digraph<V, E>) -> Result<Vec<VertexId>, GraphError> {
    let mut sort = TopoSort::default();
    Walker::dfs().run(graph, &mut sort)?;
    if let Some(vertex) = sort.cycle {
        return Err(GraphError::NotAcyclic(vertex));
    }
    sort.postorder.reverse();
    Ok(sort.postorder)
}

/// Remove every edge implied by the others, for acyclic graphs.
///
/// Sweeps vertices sinks first. Each vertex considers its successors nearest
/// first in topological order and keeps an edge only if the successor is not
/// already among the descendants collected through kept edges. Returns the
/// removed `(tail, head)` pairs.
pub fn transitive_reduction<V, E>(graph: &mut Digraph<V, E>) -> Result<Vec<(VertexId, VertexId)>, GraphError> {
    let order = topological_order(graph)?;
    let position: HashMap<VertexId, usize> = order.iter().enumerate().map(|(i, v)| (*v, i)).collect();

    let mut descendants: HashMap<VertexId, HashSet<VertexId>> = HashMap::with_capacity(order.len());
    let mut superfluous = Vec::new();

    for &vertex in order.iter().rev() {
        let mut successors: Vec<(EdgeId, VertexId)> = graph
            .out_edges(vertex)
            .iter()
            .map(|edge| Ok((*edge, graph.head(*edge)?)))
            .collect::<Result<_, GraphError>>()?;
        successors.sort_unstable_by_key(|(_, head)| position[head]);

        let mut reach = HashSet::new();
        for (edge, head) in successors {
            if reach.contains(&head) {
                superfluous.push(edge);
                continue;
            }
            reach.insert(head);
            if let Some(below) = descendants.get(&head) {
                reach.extend(below.iter().copied());
            }
        }
        descendants.insert(vertex, reach);
    }

    let mut removed = Vec::with_capacity(superfluous.len());
    for edge in superfluous {
        removed.push(graph.endpoints(edge)?);
        graph.remove_edge(edge)?;
    }

    debug!(removed = removed.len(), "Transitive reduction complete");
    Ok(removed)
}

/// Remove every edge implied by the others, for any graph.
///
/// Edges are tried in index order; an edge goes if its endpoints stay
/// connected without it and without the edges already removed. Self-loops go
/// when their vertex lies on a cycle.
pub fn transitive_reduction_brute<V, E>(graph: &mut Digraph<V, E>) -> Result<Vec<(VertexId, VertexId)>, GraphError> {
    let edges: Vec<EdgeId> = graph.edge_ids().collect();
    let mut dropped: HashSet<EdgeId> = HashSet::new();

    for edge in edges {
        let (tail, head) = graph.endpoints(edge)?;
        let bypassed = has_path_avoiding(graph, tail, head, |e| e == edge || dropped.contains(&e))?;
        if bypassed {
            dropped.insert(edge);
        }
    }

    let mut ordered: Vec<EdgeId> = dropped.into_iter().collect();
    ordered.sort_unstable();
    let mut removed = Vec::with_capacity(ordered.len());
    for edge in ordered {
        removed.push(graph.endpoints(edge)?);
        graph.remove_edge(edge)?;
    }

    debug!(removed = removed.len(), "Brute-force transitive reduction complete");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galg::transitive_closure;

    fn graph(n: usize, edges: &[(usize, usize)]) -> (Digraph<(), ()>, Vec<VertexId>) {
        let mut g = Digraph::new();
        let vs: Vec<VertexId> = (0..n).map(|_| g.add_vertex(())).collect();
        for &(a, b) in edges {
            g.add_edge(vs[a], vs[b], ()).unwrap();
        }
        (g, vs)
    }

    fn edge_set(g: &Digraph<(), ()>) -> HashSet<(VertexId, VertexId)> {
        g.edges().map(|(_, t, h, _)| (t, h)).collect()
    }

    #[test]
    fn test_topological_order() {
        let (g, vs) = graph(4, &[(2, 3), (0, 2), (1, 2)]);
        let order = topological_order(&g).unwrap();
        let pos = |v: VertexId| order.iter().position(|x| *x == v).unwrap();
        assert!(pos(vs[0]) < pos(vs[2]));
        assert!(pos(vs[1]) < pos(vs[2]));
        assert!(pos(vs[2]) < pos(vs[3]));
    }

    #[test]
    fn test_linear_chain_scenario() {
        let (mut g, vs) = graph(3, &[(0, 1), (1, 2)]);
        transitive_closure(&mut g, |_, _| ()).unwrap();
        assert!(g.contains_edge(vs[0], vs[2]));

        let removed = transitive_reduction(&mut g).unwrap();
        assert_eq!(removed, vec![(vs[0], vs[2])]);
        let expected: HashSet<_> = [(vs[0], vs[1]), (vs[1], vs[2])].into_iter().collect();
        assert_eq!(edge_set(&g), expected);
    }

    #[test]
    fn test_reduction_closure_inverse() {
        // Direct successors: 0->1, 0->2, 1->3, 2->3, 3->4; plus implied 0->3, 1->4
        let direct = [(0, 1), (0, 2), (1, 3), (2, 3), (3, 4)];
        let (mut g, _) = graph(5, &[(0, 1), (0, 2), (1, 3), (2, 3), (3, 4), (0, 3), (1, 4)]);
        transitive_closure(&mut g, |_, _| ()).unwrap();
        let closed = edge_set(&g);

        transitive_reduction(&mut g).unwrap();
        let (expected, _) = graph(5, &direct);
        assert_eq!(edge_set(&g), edge_set(&expected));

        transitive_closure(&mut g, |_, _| ()).unwrap();
        assert_eq!(edge_set(&g), closed);
    }

    #[test]
    fn test_reduction_rejects_cycles() {
        let (mut g, _) = graph(3, &[(0, 1), (1, 2), (2, 0)]);
        let err = transitive_reduction(&mut g).unwrap_err();
        assert!(err.is_cycle());
        // Nothing was touched
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn test_reduction_rejects_self_loop() {
        let (mut g, vs) = graph(2, &[(0, 1), (1, 1)]);
        assert_eq!(transitive_reduction(&mut g), Err(GraphError::NotAcyclic(vs[1])));
    }

    #[test]
    fn test_brute_reduction_on_cycle() {
        // Closed 3-cycle keeps exactly one ring of three edges
        let (mut g, _) = graph(3, &[(0, 1), (1, 2), (2, 0)]);
        transitive_closure(&mut g, |_, _| ()).unwrap();
        assert_eq!(g.edge_count(), 6);
        transitive_reduction_brute(&mut g).unwrap();
        assert_eq!(g.edge_count(), 3);

        transitive_closure(&mut g, |_, _| ()).unwrap();
        assert_eq!(g.edge_count(), 6);
    }

    #[test]
    fn test_brute_matches_acyclic_on_dags() {
        let edges = [(0, 1), (1, 2), (0, 2), (2, 3), (0, 3), (4, 3)];
        let (mut a, _) = graph(5, &edges);
        let (mut b, _) = graph(5, &edges);
        transitive_reduction(&mut a).unwrap();
        transitive_reduction_brute(&mut b).unwrap();
        assert_eq!(edge_set(&a), edge_set(&b));
    }
}
