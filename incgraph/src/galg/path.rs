//! Path queries

use crate::annotation::Annotation;
use crate::error::GraphError;
use crate::graph::{Digraph, EdgeId, VertexId};
use crate::walker::{Visitor, Walker, WalkerInfo};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Stops as soon as an explored edge lands on `target`
struct Avoiding<F> {
    target: VertexId,
    skip: F,
    found: bool,
}

impl<V, E, F: Fn(EdgeId) -> bool> Visitor<V, E> for Avoiding<F> {
    fn explore(&mut self, graph: &Digraph<V, E>, _: VertexId, edge: EdgeId) -> bool {
        if (self.skip)(edge) {
            return false;
        }
        if graph.head(edge).map(|head| head == self.target).unwrap_or(false) {
            self.found = true;
        }
        true
    }

    fn stop(&self) -> bool {
        self.found
    }
}

/// Whether a non-empty path leads from `from` to `to` without using any edge
/// for which `skip` holds.
///
/// With `from == to` this asks for a cycle through `from`.
pub fn has_path_avoiding<V, E>(
    graph: &Digraph<V, E>,
    from: VertexId,
    to: VertexId,
    skip: impl Fn(EdgeId) -> bool,
) -> Result<bool, GraphError> {
    if !graph.contains_vertex(to) {
        return Err(GraphError::MissingVertex(to));
    }
    let mut visitor = Avoiding {
        target: to,
        skip,
        found: false,
    };
    Walker::bfs().run_from(graph, from, &mut visitor)?;
    Ok(visitor.found)
}

struct Seek {
    target: VertexId,
    found: bool,
}

impl<V, E> Visitor<V, E> for Seek {
    fn discover(&mut self, _: &Digraph<V, E>, vertex: VertexId, _: &Annotation<WalkerInfo>) {
        if vertex == self.target {
            self.found = true;
        }
    }

    fn stop(&self) -> bool {
        self.found
    }
}

/// Fewest-edges path from `from` to `to`, as the edges in walking order.
///
/// `None` if `to` is unreachable; an empty path if `from == to`.
pub fn shortest_path<V, E>(
    graph: &Digraph<V, E>,
    from: VertexId,
    to: VertexId,
) -> Result<Option<Vec<EdgeId>>, GraphError> {
    if !graph.contains_vertex(to) {
        return Err(GraphError::MissingVertex(to));
    }
    let mut walker = Walker::bfs();
    let mut seek = Seek {
        target: to,
        found: false,
    };
    walker.run_from(graph, from, &mut seek)?;
    if !seek.found {
        return Ok(None);
    }

    let info = walker.info();
    let mut path = Vec::new();
    let mut current = to;
    while let Some(edge) = info.vertex(graph, current)?.parent {
        path.push(edge);
        current = graph.tail(edge)?;
    }
    path.reverse();
    Ok(Some(path))
}

#[derive(Debug, Clone, Copy)]
struct State {
    cost: f64,
    vertex: VertexId,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

impl Ord for State {
    // Reversed on cost so the max-heap pops the cheapest state
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.vertex.cmp(&other.vertex))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Cheapest path from `from` to `to` under non-negative edge weights,
/// ignoring edges for which `skip` holds.
///
/// Returns the total cost and the edges in walking order, or `None` if `to`
/// cannot be reached.
pub fn weighted_shortest_path<V, E>(
    graph: &Digraph<V, E>,
    from: VertexId,
    to: VertexId,
    weight: impl Fn(EdgeId) -> f64,
    skip: impl Fn(EdgeId) -> bool,
) -> Result<Option<(f64, Vec<EdgeId>)>, GraphError> {
    for vertex in [from, to] {
        if !graph.contains_vertex(vertex) {
            return Err(GraphError::MissingVertex(vertex));
        }
    }

    let mut best: HashMap<VertexId, f64> = HashMap::new();
    let mut parent: HashMap<VertexId, EdgeId> = HashMap::new();
    let mut heap = BinaryHeap::new();
    best.insert(from, 0.0);
    heap.push(State { cost: 0.0, vertex: from });

    while let Some(State { cost, vertex }) = heap.pop() {
        if vertex == to {
            let mut path = Vec::new();
            let mut current = to;
            while current != from {
                let edge = parent[&current];
                path.push(edge);
                current = graph.tail(edge)?;
            }
            path.reverse();
            return Ok(Some((cost, path)));
        }
        if best.get(&vertex).is_some_and(|known| cost > *known) {
            continue;
        }

        for &edge in graph.out_edges(vertex) {
            if skip(edge) {
                continue;
            }
            let head = graph.head(edge)?;
            let next = cost + weight(edge);
            if best.get(&head).map_or(true, |known| next < *known) {
                best.insert(head, next);
                parent.insert(head, edge);
                heap.push(State { cost: next, vertex: head });
            }
        }
    }
    Ok(None)
}
