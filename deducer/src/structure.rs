//! Structural predicates
//!
//! Containment facts that follow from the shapes of two classes alone,
//! without looking at any inclusion edge. Forbidden-subgraph shapes are
//! decided through a `SmallGraphs` oracle.

use crate::class::{ClassGraph, Shape};
use incgraph::VertexId;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Nesting limit for recursive shape comparison
const MAX_DEPTH: usize = 32;

/// Small-graph library: induced subgraph order and complements
pub trait SmallGraphs {
    /// Whether `small` is an induced subgraph of `large` (reflexive)
    fn is_induced_subgraph(&self, small: &str, large: &str) -> bool;

    /// Name of the complement graph, if known
    fn complement(&self, graph: &str) -> Option<String>;
}

/// Explicit table of small graphs.
///
/// Only direct containments need to be listed; queries follow chains.
#[derive(Debug, Clone, Default)]
pub struct SmallGraphTable {
    /// large -> induced subgraphs listed for it
    subgraphs: BTreeMap<String, BTreeSet<String>>,
    complements: BTreeMap<String, String>,
}

impl SmallGraphTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `small` is an induced subgraph of `large`
    pub fn add_subgraph(&mut self, small: impl Into<String>, large: impl Into<String>) {
        self.subgraphs
            .entry(large.into())
            .or_default()
            .insert(small.into());
    }

    /// Record that `a` and `b` are complements of each other
    pub fn add_complement(&mut self, a: impl Into<String>, b: impl Into<String>) {
        let (a, b) = (a.into(), b.into());
        self.complements.insert(a.clone(), b.clone());
        self.complements.insert(b, a);
    }

    /// Direct containments as (small, large) pairs
    pub fn subgraph_pairs(&self) -> Vec<(String, String)> {
        self.subgraphs
            .iter()
            .flat_map(|(large, smalls)| smalls.iter().map(move |small| (small.clone(), large.clone())))
            .collect()
    }

    /// Complement pairs, each listed once
    pub fn complement_pairs(&self) -> Vec<(String, String)> {
        self.complements
            .iter()
            .filter(|(a, b)| a <= b)
            .map(|(a, b)| (a.clone(), b.clone()))
            .collect()
    }
}

impl SmallGraphs for SmallGraphTable {
    fn is_induced_subgraph(&self, small: &str, large: &str) -> bool {
        if small == large {
            return true;
        }
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([large]);
        while let Some(current) = queue.pop_front() {
            let Some(parts) = self.subgraphs.get(current) else {
                continue;
            };
            for part in parts {
                if part == small {
                    return true;
                }
                if seen.insert(part.as_str()) {
                    queue.push_back(part.as_str());
                }
            }
        }
        false
    }

    fn complement(&self, graph: &str) -> Option<String> {
        self.complements.get(graph).cloned()
    }
}

/// Shape-level view of a class database
pub struct Structure<'a> {
    graph: &'a ClassGraph,
    smallgraphs: &'a dyn SmallGraphs,
}

impl<'a> Structure<'a> {
    pub fn new(graph: &'a ClassGraph, smallgraphs: &'a dyn SmallGraphs) -> Self {
        Self { graph, smallgraphs }
    }

    fn shape(&self, vertex: VertexId) -> Option<&'a Shape> {
        self.graph.vertex(vertex).ok().map(|class| &class.shape)
    }

    /// Whether `sub` ⊆ `sup` follows from the two definitions.
    ///
    /// Sound but incomplete: `false` means "not derivable", not "disjoint".
    pub fn subclass_of(&self, sub: VertexId, sup: VertexId) -> bool {
        self.contained(sub, sup, 0)
    }

    fn contained(&self, sub: VertexId, sup: VertexId, depth: usize) -> bool {
        if sub == sup {
            return true;
        }
        if depth > MAX_DEPTH {
            return false;
        }
        let (Some(a), Some(b)) = (self.shape(sub), self.shape(sup)) else {
            return false;
        };

        match (a, b) {
            (Shape::Forbidden(s), Shape::Forbidden(t)) => return self.forbidden_contained(s, t),
            (Shape::Complement(x), Shape::Complement(y)) => return self.contained(*y, *x, depth + 1),
            (Shape::Hereditary { kind: k1, base: x }, Shape::Hereditary { kind: k2, base: y }) => {
                if k1 <= k2 && self.contained(*x, *y, depth + 1) {
                    return true;
                }
            }
            (Shape::Probe(x), Shape::Probe(y)) | (Shape::Clique(x), Shape::Clique(y)) => {
                return self.contained(*x, *y, depth + 1)
            }
            _ => {}
        }

        if let Shape::Intersect(m) = a {
            if m.contains(&sup) {
                return true;
            }
            match b {
                Shape::Intersect(n) if n.is_subset(m) => return true,
                Shape::Union(n) if !m.is_disjoint(n) => return true,
                _ => {}
            }
        }
        match b {
            Shape::Union(n) => {
                if n.contains(&sub) {
                    return true;
                }
                if let Shape::Union(m) = a {
                    if m.is_subset(n) {
                        return true;
                    }
                }
            }
            Shape::Hereditary { base, .. } | Shape::Probe(base) => {
                if *base == sub {
                    return true;
                }
            }
            _ => {}
        }
        false
    }

    /// Forbidden(S) ⊆ Forbidden(T) iff every t ∈ T contains some s ∈ S
    fn forbidden_contained(&self, s: &BTreeSet<String>, t: &BTreeSet<String>) -> bool {
        t.iter()
            .all(|large| s.iter().any(|small| self.smallgraphs.is_induced_subgraph(small, large)))
    }

    /// A graph proving that the forbidden class `sub` is not contained in the
    /// forbidden class `sup`.
    ///
    /// A graph of `sup`'s set that contains nothing from `sub`'s set lies in
    /// `sub` but not in `sup`.
    pub fn provably_not_subclass_of(&self, sub: VertexId, sup: VertexId) -> Option<String> {
        let (Some(Shape::Forbidden(s)), Some(Shape::Forbidden(t))) = (self.shape(sub), self.shape(sup)) else {
            return None;
        };
        t.iter()
            .find(|large| !s.iter().any(|small| self.smallgraphs.is_induced_subgraph(small, large)))
            .cloned()
    }

    /// Shape of the graph complement of a forbidden class: complementing
    /// every graph of F-free gives co-F-free. `None` unless every forbidden
    /// graph has a known complement.
    pub fn complement_shape(&self, vertex: VertexId) -> Option<Shape> {
        let Some(Shape::Forbidden(set)) = self.shape(vertex) else {
            return None;
        };
        set.iter()
            .map(|graph| self.smallgraphs.complement(graph))
            .collect::<Option<BTreeSet<String>>>()
            .map(Shape::Forbidden)
    }

    /// Display name of a shape
    pub fn describe(&self, shape: &Shape) -> String {
        let name = |v: &VertexId| {
            self.graph
                .vertex(*v)
                .map(|class| class.name.clone())
                .unwrap_or_else(|_| v.to_string())
        };
        let join = |set: &BTreeSet<VertexId>, op: &str| {
            set.iter()
                .map(|v| format!("({})", name(v)))
                .collect::<Vec<_>>()
                .join(op)
        };

        match shape {
            Shape::Base => String::new(),
            Shape::Forbidden(set) if set.len() == 1 => {
                format!("{}-free", set.iter().next().map(String::as_str).unwrap_or_default())
            }
            Shape::Forbidden(set) => {
                format!("{{{}}}-free", set.iter().cloned().collect::<Vec<_>>().join(","))
            }
            Shape::Complement(v) => format!("co-({})", name(v)),
            Shape::Hereditary { kind, base } => format!("{}-hereditary ({})", kind.as_str(), name(base)),
            Shape::Intersect(set) => join(set, " ∩ "),
            Shape::Union(set) => join(set, " ∪ "),
            Shape::Probe(v) => format!("probe ({})", name(v)),
            Shape::Clique(v) => format!("clique ({})", name(v)),
        }
    }
}
