//! Superfluous-edge removal
//!
//! The closed graph carries every implied inclusion. Before export the
//! inclusions implied by other ones can be dropped again; the three passes
//! differ in which of two redundant edges survives.

use super::Deducer;
use crate::class::{ClassGraph, Inclusion};
use crate::error::DeduceError;
use crate::trace::Rule;
use incgraph::galg::{calc_scc_map, has_path_avoiding, weighted_shortest_path};
use incgraph::{EdgeId, GraphError, VertexId};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::{debug, info};

/// How strongly an edge resists removal, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeeperPriority {
    /// Plain transitivity
    Transitive,
    /// Found by a structural rule
    Deduced,
    /// Input or carrying a reference
    Referenced,
}

impl KeeperPriority {
    pub fn of(inclusion: &Inclusion) -> Self {
        if inclusion.is_referenced() {
            KeeperPriority::Referenced
        } else if inclusion.origin == Rule::Transitivity {
            KeeperPriority::Transitive
        } else {
            KeeperPriority::Deduced
        }
    }

    pub fn weight(self) -> f64 {
        match self {
            KeeperPriority::Transitive => 0.0001,
            KeeperPriority::Deduced => 1.0,
            KeeperPriority::Referenced => 10000.0,
        }
    }
}

impl Deducer<'_> {
    /// Drop edges bypassed by a path, weakest first, keeping reachability.
    ///
    /// An edge costs the inverse of its keeper weight. It is only dropped if
    /// the cheapest detour costs no more than the edge itself, so a
    /// referenced edge survives a detour over deduced ones.
    ///
    /// Returns the number of removed edges.
    pub fn remove_superfluous_weighted(&mut self) -> Result<usize, DeduceError> {
        let removed = remove_weighted(&mut self.graph)?;
        info!(removed = removed.len(), mode = "weighted", "Removed superfluous inclusions");
        Ok(removed.len())
    }

    /// Drop edges bypassed by a path that only uses kept edges or removed
    /// edges of strictly higher priority.
    pub fn remove_superfluous_by_priority(&mut self) -> Result<usize, DeduceError> {
        let removed = remove_by_priority(&mut self.graph)?;
        info!(removed = removed.len(), mode = "priority", "Removed superfluous inclusions");
        Ok(removed.len())
    }

    /// Drop bypassed edges between different SCCs only; equivalences stay
    /// intact.
    pub fn remove_superfluous_between_sccs(&mut self) -> Result<usize, DeduceError> {
        let removed = remove_between_sccs(&mut self.graph)?;
        info!(removed = removed.len(), mode = "scc", "Removed superfluous inclusions");
        Ok(removed.len())
    }
}

fn remove_weighted(graph: &mut ClassGraph) -> Result<Vec<(VertexId, VertexId)>, GraphError> {
    let weights: HashMap<EdgeId, f64> = graph
        .edges()
        .map(|(edge, _, _, inclusion)| (edge, KeeperPriority::of(inclusion).weight()))
        .collect();
    let mut order: Vec<(EdgeId, f64)> = weights.iter().map(|(&e, &w)| (e, w)).collect();
    order.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));

    let cost = |edge: EdgeId| weights.get(&edge).map_or(f64::INFINITY, |w| 1.0 / w);
    let mut dropped: HashSet<EdgeId> = HashSet::new();
    for (edge, _) in order {
        let (sup, sub) = graph.endpoints(edge)?;
        let own = cost(edge);
        let detour = weighted_shortest_path(graph, sup, sub, cost, |e| e == edge || dropped.contains(&e))?;
        match detour {
            Some((total, path)) if total <= own => {
                debug!(%sup, %sub, cost = total, own, hops = path.len(), "Superfluous inclusion");
                dropped.insert(edge);
            }
            Some((total, _)) => debug!(%sup, %sub, cost = total, own, "Keeping inclusion cheaper than its detour"),
            None => {}
        }
    }
    remove_all(graph, dropped)
}

fn remove_by_priority(graph: &mut ClassGraph) -> Result<Vec<(VertexId, VertexId)>, GraphError> {
    let priorities: HashMap<EdgeId, KeeperPriority> = graph
        .edges()
        .map(|(edge, _, _, inclusion)| (edge, KeeperPriority::of(inclusion)))
        .collect();
    let mut order: Vec<(KeeperPriority, EdgeId)> = priorities.iter().map(|(&e, &p)| (p, e)).collect();
    order.sort_unstable();

    let mut dropped: HashSet<EdgeId> = HashSet::new();
    for (priority, edge) in order {
        let (sup, sub) = graph.endpoints(edge)?;
        let blocked = |e: EdgeId| e == edge || (dropped.contains(&e) && priorities[&e] <= priority);
        if has_path_avoiding(graph, sup, sub, blocked)? {
            debug!(%sup, %sub, ?priority, "Superfluous inclusion");
            dropped.insert(edge);
        }
    }
    remove_all(graph, dropped)
}

fn remove_between_sccs(graph: &mut ClassGraph) -> Result<Vec<(VertexId, VertexId)>, GraphError> {
    let sccs = calc_scc_map(graph)?;
    let mut edges: Vec<EdgeId> = graph.edge_ids().collect();
    edges.sort_unstable();

    let mut dropped: HashSet<EdgeId> = HashSet::new();
    for edge in edges {
        let (sup, sub) = graph.endpoints(edge)?;
        if Rc::ptr_eq(&sccs[&sup], &sccs[&sub]) {
            continue;
        }
        if has_path_avoiding(graph, sup, sub, |e| e == edge || dropped.contains(&e))? {
            debug!(%sup, %sub, "Superfluous inclusion");
            dropped.insert(edge);
        }
    }
    remove_all(graph, dropped)
}

fn remove_all(graph: &mut ClassGraph, dropped: HashSet<EdgeId>) -> Result<Vec<(VertexId, VertexId)>, GraphError> {
    let mut dropped: Vec<EdgeId> = dropped.into_iter().collect();
    dropped.sort_unstable();
    let mut removed = Vec::with_capacity(dropped.len());
    for edge in dropped {
        removed.push(graph.endpoints(edge)?);
        graph.remove_edge(edge)?;
    }
    Ok(removed)
}
