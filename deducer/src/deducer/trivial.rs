//! Inclusions that follow from class definitions and the current edges.

use super::Deducer;
use crate::class::{Hereditariness, Shape};
use crate::error::DeduceError;
use crate::trace::Rule;
use incgraph::{EdgeId, VertexId};
use std::collections::{BTreeSet, HashMap, HashSet};

/// (superclass, subclass, sources)
type Candidate = (VertexId, VertexId, Vec<EdgeId>);

const LEVELS: [Hereditariness; 4] = [
    Hereditariness::Unknown,
    Hereditariness::Isometric,
    Hereditariness::Connected,
    Hereditariness::Induced,
];

impl Deducer<'_> {
    /// One round of every inclusion rule. Direct comparison only considers
    /// pairs touching `fresh`.
    ///
    /// Returns the number of inserted edges, transitive ones included.
    pub fn find_trivial_once(&mut self, fresh: &HashSet<VertexId>) -> Result<usize, DeduceError> {
        let before = self.new_edges;
        self.direct_inclusions(fresh)?;
        self.complement_inclusions()?;
        self.graph_complement_inclusions()?;
        self.union_inclusions()?;
        self.intersect_inclusions()?;
        self.hereditary_inclusions()?;
        self.mirrored_inclusions()?;
        Ok(self.new_edges - before)
    }

    fn insert_candidates(&mut self, mut candidates: Vec<Candidate>, rule: Rule) -> Result<(), DeduceError> {
        candidates.sort_unstable();
        candidates.dedup_by_key(|(sup, sub, _)| (*sup, *sub));
        for (sup, sub, sources) in candidates {
            self.add_trivial_edge(sup, sub, rule, sources)?;
        }
        Ok(())
    }

    /// Pairs with at least one fresh class, compared in both orientations
    fn direct_inclusions(&mut self, fresh: &HashSet<VertexId>) -> Result<(), DeduceError> {
        let mut fresh: Vec<VertexId> = fresh
            .iter()
            .copied()
            .filter(|&vertex| self.graph.contains_vertex(vertex))
            .collect();
        fresh.sort_unstable();
        let vertices: Vec<VertexId> = self.graph.vertex_ids().collect();
        let structure = self.structure();
        let mut candidates = Vec::new();
        for &new in &fresh {
            for &other in &vertices {
                if new == other {
                    continue;
                }
                for (sup, sub) in [(new, other), (other, new)] {
                    if !self.graph.contains_edge(sup, sub) && structure.subclass_of(sub, sup) {
                        candidates.push((sup, sub, Vec::new()));
                    }
                }
            }
        }
        self.insert_candidates(candidates, Rule::Direct)
    }

    /// A ⊇ B gives co-B ⊇ co-A
    fn complement_inclusions(&mut self) -> Result<(), DeduceError> {
        let candidates = self.complement_candidates(&self.complements, true)?;
        self.insert_candidates(candidates, Rule::Complement)
    }

    /// A ⊇ B gives co-A ⊇ co-B for graph complements
    fn graph_complement_inclusions(&mut self) -> Result<(), DeduceError> {
        let candidates = self.complement_candidates(&self.graph_complements, false)?;
        self.insert_candidates(candidates, Rule::GraphComplement)
    }

    fn complement_candidates(
        &self,
        pairs: &HashMap<VertexId, BTreeSet<VertexId>>,
        reversed: bool,
    ) -> Result<Vec<Candidate>, DeduceError> {
        let mut candidates = Vec::new();
        for (&a, images_a) in pairs {
            for &edge in self.graph.out_edges(a) {
                let b = self.graph.head(edge)?;
                let Some(images_b) = pairs.get(&b) else {
                    continue;
                };
                for &ca in images_a {
                    for &cb in images_b {
                        let (sup, sub) = if reversed { (cb, ca) } else { (ca, cb) };
                        if sup != sub && !self.graph.contains_edge(sup, sub) {
                            candidates.push((sup, sub, vec![edge]));
                        }
                    }
                }
            }
        }
        Ok(candidates)
    }

    /// X ⊇ (M1 ∪ ... ∪ Mn) once X contains every member it does not share
    fn union_inclusions(&mut self) -> Result<(), DeduceError> {
        let mut candidates = Vec::new();
        for (union, class) in self.graph.vertices() {
            let Shape::Union(members) = &class.shape else {
                continue;
            };
            for (x, other) in self.graph.vertices() {
                if x == union || self.graph.contains_edge(x, union) {
                    continue;
                }
                let rest: Vec<VertexId> = match &other.shape {
                    Shape::Union(own) => members.difference(own).copied().collect(),
                    _ => members.iter().copied().filter(|&m| m != x).collect(),
                };
                let sources: Option<Vec<EdgeId>> = rest.iter().map(|&m| self.graph.find_edge(x, m)).collect();
                if let Some(sources) = sources {
                    candidates.push((x, union, sources));
                }
            }
        }
        self.insert_candidates(candidates, Rule::Union)
    }

    /// (M1 ∩ ... ∩ Mn) ⊇ X once every member it does not share contains X
    fn intersect_inclusions(&mut self) -> Result<(), DeduceError> {
        let mut candidates = Vec::new();
        for (meet, class) in self.graph.vertices() {
            let Shape::Intersect(members) = &class.shape else {
                continue;
            };
            for (x, other) in self.graph.vertices() {
                if x == meet || self.graph.contains_edge(meet, x) {
                    continue;
                }
                let rest: Vec<VertexId> = match &other.shape {
                    Shape::Intersect(own) => members.difference(own).copied().collect(),
                    _ => members.iter().copied().filter(|&m| m != x).collect(),
                };
                let sources: Option<Vec<EdgeId>> = rest.iter().map(|&m| self.graph.find_edge(m, x)).collect();
                if let Some(sources) = sources {
                    candidates.push((meet, x, sources));
                }
            }
        }
        self.insert_candidates(candidates, Rule::Intersect)
    }

    /// Superclasses of the base closed under the same kind contain the
    /// closure; closures of related bases are related.
    fn hereditary_inclusions(&mut self) -> Result<(), DeduceError> {
        let mut candidates = Vec::new();
        for (closure, class) in self.graph.vertices() {
            let Shape::Hereditary { kind, base } = class.shape else {
                continue;
            };

            if kind != Hereditariness::Unknown {
                let mut uppers = vec![(None, base)];
                for &edge in self.graph.in_edges(base) {
                    uppers.push((Some(edge), self.graph.tail(edge)?));
                }
                for (edge, x) in uppers {
                    if x == closure || self.graph.contains_edge(x, closure) {
                        continue;
                    }
                    if self.graph.vertex(x)?.hereditariness_level() >= kind {
                        candidates.push((x, closure, edge.into_iter().collect()));
                    }
                }
            }

            for &edge in self.graph.out_edges(base) {
                let sub_base = self.graph.head(edge)?;
                for level in LEVELS.into_iter().filter(|&level| level <= kind) {
                    let shape = Shape::Hereditary { kind: level, base: sub_base };
                    if let Some(&other) = self.shapes.get(&shape) {
                        if other != closure && !self.graph.contains_edge(closure, other) {
                            candidates.push((closure, other, vec![edge]));
                        }
                    }
                }
            }
        }
        self.insert_candidates(candidates, Rule::Hereditary)
    }

    /// A ⊇ B gives probe A ⊇ probe B and clique A ⊇ clique B
    fn mirrored_inclusions(&mut self) -> Result<(), DeduceError> {
        let mut probes = Vec::new();
        let mut cliques = Vec::new();
        for (mirror, class) in self.graph.vertices() {
            let (a, is_probe) = match class.shape {
                Shape::Probe(a) => (a, true),
                Shape::Clique(a) => (a, false),
                _ => continue,
            };
            for &edge in self.graph.out_edges(a) {
                let b = self.graph.head(edge)?;
                let shape = if is_probe { Shape::Probe(b) } else { Shape::Clique(b) };
                let Some(&other) = self.shapes.get(&shape) else {
                    continue;
                };
                if other != mirror && !self.graph.contains_edge(mirror, other) {
                    let candidate = (mirror, other, vec![edge]);
                    if is_probe {
                        probes.push(candidate);
                    } else {
                        cliques.push(candidate);
                    }
                }
            }
        }
        self.insert_candidates(probes, Rule::Probe)?;
        self.insert_candidates(cliques, Rule::Clique)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{ClassGraph, GraphClass, Inclusion};
    use crate::config::DeducerConfig;
    use crate::idgen::CachedIdGenerator;
    use crate::structure::SmallGraphTable;
    use incgraph::Digraph;

    fn everything(d: &Deducer<'_>) -> HashSet<VertexId> {
        d.graph().vertex_ids().collect()
    }

    #[test]
    fn test_union_needs_every_member() {
        let mut g: ClassGraph = Digraph::new();
        let a = g.add_vertex(GraphClass::base("A"));
        let b = g.add_vertex(GraphClass::base("B"));
        let x = g.add_vertex(GraphClass::base("X"));
        let u = g.add_vertex(GraphClass::new("U", "U", Shape::Union(BTreeSet::from([a, b]))));
        g.add_edge(x, a, Inclusion::input(Default::default())).unwrap();
        let table = SmallGraphTable::new();
        let mut ids = CachedIdGenerator::default();
        let mut d = Deducer::new(g, &table, &mut ids, DeducerConfig::default());
        d.prepare().unwrap();

        let fresh = everything(&d);
        d.find_trivial_once(&fresh).unwrap();
        assert!(!d.graph().contains_edge(x, u));
        assert!(d.graph().contains_edge(u, a));
        assert!(d.graph().contains_edge(u, b));
    }

    #[test]
    fn test_intersect_inclusion() {
        let mut g: ClassGraph = Digraph::new();
        let a = g.add_vertex(GraphClass::base("A"));
        let b = g.add_vertex(GraphClass::base("B"));
        let x = g.add_vertex(GraphClass::base("X"));
        let i = g.add_vertex(GraphClass::new("I", "I", Shape::Intersect(BTreeSet::from([a, b]))));
        g.add_edge(a, x, Inclusion::input(Default::default())).unwrap();
        g.add_edge(b, x, Inclusion::input(Default::default())).unwrap();
        let table = SmallGraphTable::new();
        let mut ids = CachedIdGenerator::default();
        let mut d = Deducer::new(g, &table, &mut ids, DeducerConfig::default());
        d.prepare().unwrap();

        let fresh = everything(&d);
        d.find_trivial_once(&fresh).unwrap();
        assert!(d.graph().contains_edge(i, x));
        assert!(!d.graph().contains_edge(x, i));
    }

    #[test]
    fn test_complement_antitone() {
        let mut g: ClassGraph = Digraph::new();
        let a = g.add_vertex(GraphClass::base("A"));
        let b = g.add_vertex(GraphClass::base("B"));
        let ca = g.add_vertex(GraphClass::new("coA", "coA", Shape::Complement(a)));
        let cb = g.add_vertex(GraphClass::new("coB", "coB", Shape::Complement(b)));
        g.add_edge(a, b, Inclusion::input(Default::default())).unwrap();
        let table = SmallGraphTable::new();
        let mut ids = CachedIdGenerator::default();
        let mut d = Deducer::new(g, &table, &mut ids, DeducerConfig::default());
        d.prepare().unwrap();

        let fresh = everything(&d);
        d.find_trivial_once(&fresh).unwrap();
        assert!(d.graph().contains_edge(cb, ca));
        assert!(!d.graph().contains_edge(ca, cb));
    }

    #[test]
    fn test_direct_compares_fresh_both_ways() {
        let forbidden = |id: &str, graphs: &[&str]| {
            GraphClass::new(id, id, Shape::Forbidden(graphs.iter().map(|g| g.to_string()).collect()))
        };
        let mut g: ClassGraph = Digraph::new();
        let p5 = g.add_vertex(forbidden("P5F", &["P5"]));
        let p4 = g.add_vertex(forbidden("P4F", &["P4"]));
        let both = g.add_vertex(forbidden("BF", &["P4", "C4"]));
        let mut table = SmallGraphTable::new();
        table.add_subgraph("P4", "P5");
        let mut ids = CachedIdGenerator::default();
        let mut d = Deducer::new(g, &table, &mut ids, DeducerConfig::default());

        let fresh = HashSet::from([p5]);
        d.find_trivial_once(&fresh).unwrap();
        assert!(d.graph().contains_edge(p5, p4));
        assert!(d.graph().contains_edge(p5, both));
        // Neither side fresh
        assert!(!d.graph().contains_edge(p4, both));

        let fresh = HashSet::from([both]);
        d.find_trivial_once(&fresh).unwrap();
        assert!(d.graph().contains_edge(p4, both));
    }

    #[test]
    fn test_graph_complement_keeps_direction() {
        let mut g: ClassGraph = Digraph::new();
        let a = g.add_vertex(GraphClass::base("A"));
        let b = g.add_vertex(GraphClass::base("B"));
        let ca = g.add_vertex(GraphClass::base("coA"));
        let cb = g.add_vertex(GraphClass::base("coB"));
        let s = g.add_vertex(GraphClass::base("S").self_complementary());
        g.add_edge(a, b, Inclusion::input(Default::default())).unwrap();
        g.add_edge(s, a, Inclusion::input(Default::default())).unwrap();
        let table = SmallGraphTable::new();
        let mut ids = CachedIdGenerator::default();
        let mut d = Deducer::new(g, &table, &mut ids, DeducerConfig::default());
        d.register_graph_complement(a, ca);
        d.register_graph_complement(b, cb);
        d.register_graph_complement(s, s);
        d.prepare().unwrap();

        let fresh = HashSet::new();
        d.find_trivial_once(&fresh).unwrap();
        assert!(d.graph().contains_edge(ca, cb));
        assert!(!d.graph().contains_edge(cb, ca));
        // S ⊇ A gives co-S = S ⊇ co-A
        assert!(d.graph().contains_edge(s, ca));
        assert!(!d.graph().contains_edge(ca, s));
        let edge = d.graph().find_edge(ca, cb).unwrap();
        assert_eq!(d.graph().edge(edge).unwrap().origin, Rule::GraphComplement);
    }

    #[test]
    fn test_hereditary_closure() {
        let mut g: ClassGraph = Digraph::new();
        let base = g.add_vertex(GraphClass::base("B"));
        let sup = g.add_vertex(GraphClass::base("S").with_hereditariness(Hereditariness::Induced));
        let weak = g.add_vertex(GraphClass::base("W").with_hereditariness(Hereditariness::Isometric));
        let closure = g.add_vertex(GraphClass::new(
            "H",
            "H",
            Shape::Hereditary { kind: Hereditariness::Connected, base },
        ));
        g.add_edge(sup, base, Inclusion::input(Default::default())).unwrap();
        g.add_edge(weak, base, Inclusion::input(Default::default())).unwrap();
        let table = SmallGraphTable::new();
        let mut ids = CachedIdGenerator::default();
        let mut d = Deducer::new(g, &table, &mut ids, DeducerConfig::default());
        d.prepare().unwrap();

        let fresh = everything(&d);
        d.find_trivial_once(&fresh).unwrap();
        assert!(d.graph().contains_edge(closure, base));
        assert!(d.graph().contains_edge(sup, closure));
        assert!(!d.graph().contains_edge(weak, closure));
    }

    #[test]
    fn test_probe_follows_base() {
        let mut g: ClassGraph = Digraph::new();
        let a = g.add_vertex(GraphClass::base("A"));
        let b = g.add_vertex(GraphClass::base("B"));
        let pa = g.add_vertex(GraphClass::new("pA", "pA", Shape::Probe(a)));
        let pb = g.add_vertex(GraphClass::new("pB", "pB", Shape::Probe(b)));
        g.add_edge(a, b, Inclusion::input(Default::default())).unwrap();
        let table = SmallGraphTable::new();
        let mut ids = CachedIdGenerator::default();
        let mut d = Deducer::new(g, &table, &mut ids, DeducerConfig::default());
        d.prepare().unwrap();

        let fresh = HashSet::new();
        d.find_trivial_once(&fresh).unwrap();
        let edge = d.graph().find_edge(pa, pb).unwrap();
        assert_eq!(d.graph().edge(edge).unwrap().origin, Rule::Probe);
    }
}
