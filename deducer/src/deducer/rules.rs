//! Rules applied to newly created classes: forbidden-subgraph decomposition
//! and recomposition, mirror classes, graph-complement links and complement
//! pairs of unions and intersections.

use super::Deducer;
use crate::class::Shape;
use crate::error::DeduceError;
use crate::trace::Rule;
use incgraph::VertexId;
use std::collections::BTreeSet;

impl Deducer<'_> {
    /// Apply the class-creating rules to `frontier`
    pub(super) fn apply_rules(&mut self, frontier: &[VertexId]) -> Result<(), DeduceError> {
        for &vertex in frontier {
            if !self.graph.contains_vertex(vertex) {
                continue;
            }
            self.decompose_forbidden(vertex)?;
            self.mirror(vertex)?;
            self.link_forbidden_complement(vertex)?;
        }
        // Equivalences found since the last pass can enable recomposition of
        // older intersections
        let meets: Vec<VertexId> = self
            .graph
            .vertices()
            .filter(|(_, class)| matches!(&class.shape, Shape::Intersect(members) if members.len() >= 2))
            .map(|(vertex, _)| vertex)
            .collect();
        for meet in meets {
            self.recompose_forbidden(meet)?;
        }
        self.complement_pairs()
    }

    /// {A, B}-free = A-free ∩ B-free
    fn decompose_forbidden(&mut self, vertex: VertexId) -> Result<(), DeduceError> {
        let set = match self.shape(vertex)? {
            Shape::Forbidden(set) if set.len() >= 2 => set.clone(),
            _ => return Ok(()),
        };
        let temporary = self.temporaries.contains(&vertex);

        let mut pieces = BTreeSet::new();
        for graph in set {
            pieces.insert(self.find_or_create(Shape::Forbidden(BTreeSet::from([graph])), temporary)?);
        }
        let meet = self.find_or_create(Shape::Intersect(pieces), true)?;
        self.equate(vertex, meet, Rule::Forbidden)
    }

    /// A-free ∩ B-free = {A, B}-free, also when a member is only known to be
    /// equivalent to a forbidden class
    fn recompose_forbidden(&mut self, vertex: VertexId) -> Result<(), DeduceError> {
        let members = match self.shape(vertex)? {
            Shape::Intersect(members) if members.len() >= 2 => members.clone(),
            _ => return Ok(()),
        };
        let mut merged = BTreeSet::new();
        for member in members {
            match self.forbidden_equivalent(member)? {
                Some(set) => merged.extend(set),
                None => return Ok(()),
            }
        }
        let temporary = self.temporaries.contains(&vertex);
        let forbidden = self.find_or_create(Shape::Forbidden(merged), temporary)?;
        self.equate(vertex, forbidden, Rule::Forbidden)
    }

    /// The forbidden set of `vertex`, or of the nicest forbidden class in its
    /// SCC
    fn forbidden_equivalent(&self, vertex: VertexId) -> Result<Option<BTreeSet<String>>, DeduceError> {
        if let Shape::Forbidden(set) = self.shape(vertex)? {
            return Ok(Some(set.clone()));
        }
        let mut best: Option<(usize, VertexId, &BTreeSet<String>)> = None;
        for &edge in self.graph.out_edges(vertex) {
            let other = self.graph.head(edge)?;
            let Shape::Forbidden(set) = self.shape(other)? else {
                continue;
            };
            if !self.graph.contains_edge(other, vertex) {
                continue;
            }
            if best.map_or(true, |(len, id, _)| (set.len(), other) < (len, id)) {
                best = Some((set.len(), other, set));
            }
        }
        Ok(best.map(|(_, _, set)| set.clone()))
    }

    /// Clique-fixed classes equal their clique class, self-complementary
    /// classes are their own graph complement
    fn mirror(&mut self, vertex: VertexId) -> Result<(), DeduceError> {
        let class = self.graph.vertex(vertex)?;
        let clique_fixed = class.clique_fixed && !matches!(class.shape, Shape::Clique(_));
        let self_complementary = class.self_complementary;

        if clique_fixed {
            let clique = self.find_or_create(Shape::Clique(vertex), true)?;
            self.equate(vertex, clique, Rule::Mirror)?;
        }
        if self_complementary {
            self.register_graph_complement(vertex, vertex);
        }
        Ok(())
    }

    /// F-free and co-F-free are each other's graph complement, when every
    /// graph of F has a known complement and both classes exist
    fn link_forbidden_complement(&mut self, vertex: VertexId) -> Result<(), DeduceError> {
        let Some(shape) = self.structure().complement_shape(vertex) else {
            return Ok(());
        };
        if let Some(&counterpart) = self.shapes.get(&shape) {
            self.register_graph_complement(vertex, counterpart);
        }
        Ok(())
    }

    /// co-(A ∪ B) = co-A ∩ co-B and co-(A ∩ B) = co-A ∪ co-B, for every
    /// union or intersection without a known complement whose members all
    /// have one
    fn complement_pairs(&mut self) -> Result<(), DeduceError> {
        let mut duals = Vec::new();
        for (vertex, class) in self.graph.vertices() {
            let (members, is_union) = match &class.shape {
                Shape::Union(members) => (members, true),
                Shape::Intersect(members) => (members, false),
                _ => continue,
            };
            if self.complements.contains_key(&vertex) {
                continue;
            }
            let complemented: Option<BTreeSet<VertexId>> = members
                .iter()
                .map(|m| self.complements.get(m).and_then(|cs| cs.iter().next().copied()))
                .collect();
            if let Some(complemented) = complemented {
                let dual = if is_union {
                    Shape::Intersect(complemented)
                } else {
                    Shape::Union(complemented)
                };
                duals.push((vertex, dual));
            }
        }

        for (vertex, dual) in duals {
            let counterpart = self.find_or_create(dual, true)?;
            if counterpart != vertex {
                self.register_complement(vertex, counterpart);
            }
        }
        Ok(())
    }
}
