//! Transitive closure
//!
//! The closing DFS runs Tarjan and, whenever a component completes, builds
//! its "sub" set: everything reachable from it. Components finish sinks
//! first, so the sub sets of all successors already exist and the new set is
//! their union plus the successors themselves. A component with a cycle also
//! reaches its own members. All members of one component share a single
//! `Rc` set, so a cycle is closed once instead of once per member.

use super::scc::tarjan;
use crate::error::GraphError;
use crate::graph::{Digraph, EdgeId, VertexId};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use tracing::debug;

/// Add an edge `u -> v` for every pair where `v` is reachable from `u`.
///
/// `make_edge` builds the payload of each added edge. Self-loops are never
/// added. Returns the ids of the new edges; running it again adds none.
pub fn transitive_closure<V, E>(
    graph: &mut Digraph<V, E>,
    mut make_edge: impl FnMut(VertexId, VertexId) -> E,
) -> Result<Vec<EdgeId>, GraphError> {
    let subs = reachability(graph)?;

    let mut missing = Vec::new();
    for vertex in graph.vertex_ids() {
        if let Some(sub) = subs.get(&vertex) {
            for &reached in sub.iter() {
                if reached != vertex && !graph.contains_edge(vertex, reached) {
                    missing.push((vertex, reached));
                }
            }
        }
    }

    let mut added = Vec::with_capacity(missing.len());
    for (tail, head) in missing {
        added.push(graph.add_edge(tail, head, make_edge(tail, head))?);
    }

    debug!(added = added.len(), "Transitive closure complete");
    Ok(added)
}

/// Reachable set per vertex, shared within components
fn reachability<V, E>(graph: &Digraph<V, E>) -> Result<HashMap<VertexId, Rc<BTreeSet<VertexId>>>, GraphError> {
    let components = tarjan(graph)?.components;
    let mut subs: HashMap<VertexId, Rc<BTreeSet<VertexId>>> = HashMap::with_capacity(graph.vertex_count());

    for members in components {
        let mut sub = BTreeSet::new();
        let mut cyclic = members.len() > 1;

        for &member in &members {
            for &edge in graph.out_edges(member) {
                let head = graph.head(edge)?;
                if head == member {
                    cyclic = true;
                } else if let Some(head_sub) = subs.get(&head) {
                    // Completed component: a successor, not a member
                    sub.insert(head);
                    sub.extend(head_sub.iter().copied());
                }
            }
        }
        if cyclic {
            sub.extend(members.iter().copied());
        }

        let shared = Rc::new(sub);
        for member in members {
            subs.insert(member, Rc::clone(&shared));
        }
    }
    Ok(subs)
}
