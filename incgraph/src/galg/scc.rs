//! Strongly connected components
//!
//! Tarjan's algorithm expressed as hooks on a depth-first `Walker`: lowlinks
//! are lowered by `see` on edges into the open stack and handed to the parent
//! in `finish`. Components come out in reverse topological order (sinks
//! first), which the closing DFS relies on.

use crate::annotation::Annotation;
use crate::error::GraphError;
use crate::graph::{Digraph, EdgeId, VertexId};
use crate::walker::{Visitor, Walker, WalkerInfo};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;

/// A strongly connected component, shared by all of its members
pub type Component = Rc<BTreeSet<VertexId>>;

/// Tarjan bookkeeping layered on a DFS walk
#[derive(Debug, Default)]
pub(crate) struct Tarjan {
    index: HashMap<VertexId, usize>,
    low: HashMap<VertexId, usize>,
    stack: Vec<VertexId>,
    on_stack: HashSet<VertexId>,
    counter: usize,
    /// Completed components, sinks first
    pub(crate) components: Vec<Vec<VertexId>>,
}

impl<V, E> Visitor<V, E> for Tarjan {
    fn discover(&mut self, _: &Digraph<V, E>, vertex: VertexId, _: &Annotation<WalkerInfo>) {
        self.index.insert(vertex, self.counter);
        self.low.insert(vertex, self.counter);
        self.counter += 1;
        self.stack.push(vertex);
        self.on_stack.insert(vertex);
    }

    fn see(&mut self, _: &Digraph<V, E>, from: VertexId, _: EdgeId, to: VertexId, _: &Annotation<WalkerInfo>) {
        if self.on_stack.contains(&to) {
            let target = self.index[&to];
            if let Some(low) = self.low.get_mut(&from) {
                *low = (*low).min(target);
            }
        }
    }

    fn finish(&mut self, graph: &Digraph<V, E>, vertex: VertexId, info: &Annotation<WalkerInfo>) {
        let low = self.low[&vertex];
        if low == self.index[&vertex] {
            let mut component = Vec::new();
            while let Some(member) = self.stack.pop() {
                self.on_stack.remove(&member);
                component.push(member);
                if member == vertex {
                    break;
                }
            }
            self.components.push(component);
        }

        let parent = info
            .vertex(graph, vertex)
            .ok()
            .and_then(|i| i.parent)
            .and_then(|edge| graph.tail(edge).ok());
        if let Some(parent) = parent {
            if let Some(parent_low) = self.low.get_mut(&parent) {
                *parent_low = (*parent_low).min(low);
            }
        }
    }
}

/// Run Tarjan over the whole graph
pub(crate) fn tarjan<V, E>(graph: &Digraph<V, E>) -> Result<Tarjan, GraphError> {
    let mut tarjan = Tarjan::default();
    Walker::dfs().run(graph, &mut tarjan)?;
    Ok(tarjan)
}

/// Partition the graph into strongly connected components, sinks first
pub fn strongly_connected_components<V, E>(graph: &Digraph<V, E>) -> Result<Vec<Component>, GraphError> {
    Ok(tarjan(graph)?
        .components
        .into_iter()
        .map(|members| Rc::new(members.into_iter().collect()))
        .collect())
}

/// Map every vertex to its component.
///
/// All members of a component map to the same `Rc`, so `Rc::ptr_eq` is a
/// same-component test.
pub fn calc_scc_map<V, E>(graph: &Digraph<V, E>) -> Result<HashMap<VertexId, Component>, GraphError> {
    let mut map = HashMap::with_capacity(graph.vertex_count());
    for component in strongly_connected_components(graph)? {
        for member in component.iter() {
            map.insert(*member, Rc::clone(&component));
        }
    }
    Ok(map)
}
