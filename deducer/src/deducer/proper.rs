//! Properness discovery

use super::Deducer;
use crate::class::Shape;
use crate::error::DeduceError;
use crate::trace::{Rule, TraceData};
use incgraph::EdgeId;
use tracing::debug;

impl Deducer<'_> {
    /// Mark inclusions proper until no rule finds anything new.
    ///
    /// Returns the number of edges marked by the rules; properness spread
    /// along the closure is not counted.
    pub fn find_proper_inclusions(&mut self) -> Result<usize, DeduceError> {
        let mut total = 0;
        loop {
            let mut findings = Vec::new();
            self.forbidden_properness(&mut findings)?;
            self.base_case_properness(&mut findings)?;
            self.propagated_properness(&mut findings)?;

            let mut marked = 0;
            for (edge, data) in findings {
                if self.mark_proper(edge, data)? {
                    marked += 1;
                }
            }
            total += marked;
            if marked == 0 {
                break;
            }
        }
        debug!(tier = %self.tier, marked = total, "Properness discovery complete");
        Ok(total)
    }

    /// Forbidden-subgraph comparison and witnesses below the superclass
    fn forbidden_properness(&self, findings: &mut Vec<(EdgeId, TraceData)>) -> Result<(), DeduceError> {
        let structure = self.structure();
        for (edge, sup, sub, inclusion) in self.graph.edges() {
            if inclusion.proper || !self.shape(sub)?.is_forbidden() {
                continue;
            }
            if self.shape(sup)?.is_forbidden() {
                if let Some(witness) = structure.provably_not_subclass_of(sup, sub) {
                    let data = TraceData::new(Rule::ForbiddenSyntax, vec![]).with_note(format!("witness {witness}"));
                    findings.push((edge, data));
                }
                continue;
            }
            for &below in self.graph.out_edges(sup) {
                let candidate = self.graph.head(below)?;
                if candidate == sub || !self.shape(candidate)?.is_forbidden() {
                    continue;
                }
                if let Some(witness) = structure.provably_not_subclass_of(candidate, sub) {
                    let data = TraceData::new(Rule::ForbiddenWitness, vec![below]).with_note(format!("witness {witness}"));
                    findings.push((edge, data));
                    break;
                }
            }
        }
        Ok(())
    }

    /// Known strict inclusions, unless the reverse inclusion is known
    fn base_case_properness(&self, findings: &mut Vec<(EdgeId, TraceData)>) -> Result<(), DeduceError> {
        let clique_class = self.find_class(&self.config.clique_class_id);
        for (edge, sup, sub, inclusion) in self.graph.edges() {
            if inclusion.proper || self.graph.contains_edge(sub, sup) {
                continue;
            }
            let note = match (self.shape(sup)?, self.shape(sub)?) {
                (_, Shape::Clique(_)) if Some(sup) == clique_class => "clique graphs ⊋ clique class",
                (Shape::Probe(base), _) if *base == sub => "probe class ⊋ base",
                (Shape::Hereditary { base, .. }, _) if *base == sub => "hereditary closure ⊋ base",
                _ => continue,
            };
            findings.push((edge, TraceData::new(Rule::BaseCase, vec![]).with_note(note)));
        }
        Ok(())
    }

    /// Properness carried over to set and graph complements and from probe
    /// classes to their bases
    fn propagated_properness(&self, findings: &mut Vec<(EdgeId, TraceData)>) -> Result<(), DeduceError> {
        for (edge, sup, sub, inclusion) in self.graph.edges() {
            if !inclusion.proper {
                continue;
            }

            if let (Some(complements_sup), Some(complements_sub)) =
                (self.complements.get(&sup), self.complements.get(&sub))
            {
                for &ca in complements_sup {
                    for &cb in complements_sub {
                        if let Some(mirrored) = self.graph.find_edge(cb, ca) {
                            if !self.graph.edge(mirrored)?.proper {
                                findings.push((mirrored, TraceData::new(Rule::Complement, vec![edge])));
                            }
                        }
                    }
                }
            }

            if let (Some(images_sup), Some(images_sub)) =
                (self.graph_complements.get(&sup), self.graph_complements.get(&sub))
            {
                for &ca in images_sup {
                    for &cb in images_sub {
                        if let Some(image) = self.graph.find_edge(ca, cb) {
                            if !self.graph.edge(image)?.proper {
                                findings.push((image, TraceData::new(Rule::GraphComplement, vec![edge])));
                            }
                        }
                    }
                }
            }

            if let (Shape::Probe(a), Shape::Probe(b)) = (self.shape(sup)?, self.shape(sub)?) {
                if let Some(bases) = self.graph.find_edge(*a, *b) {
                    if !self.graph.edge(bases)?.proper {
                        findings.push((bases, TraceData::new(Rule::Probe, vec![edge])));
                    }
                }
            }
        }
        Ok(())
    }
}
