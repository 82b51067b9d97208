//! Consistency checks of a finished deduction
//!
//! Findings are warnings: they point at suspicious seed data or at classes
//! the rules could not tell apart, and never abort a run.

use super::Deducer;
use crate::error::DeduceError;
use incgraph::galg::{calc_scc_map, Component};
use incgraph::VertexId;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;
use tracing::{info, warn};

/// A logical inconsistency found after deduction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanityWarning {
    /// Seed classes that were not equivalent became equivalent
    SccMerged { classes: Vec<String> },
    /// Equivalent seed classes are no longer equivalent
    SccSplit { classes: Vec<String> },
    /// An inclusion between forbidden classes the forbidden graphs don't
    /// confirm
    UnconfirmedForbiddenInclusion { sup: String, sub: String },
    /// A proper inclusion between forbidden classes without a witness graph
    MissingWitness { sup: String, sub: String },
    /// A proper inclusion whose reverse also holds
    ProperCycle { sup: String, sub: String },
}

impl fmt::Display for SanityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SanityWarning::SccMerged { classes } => {
                write!(f, "classes became equivalent: {}", classes.join(", "))
            }
            SanityWarning::SccSplit { classes } => {
                write!(f, "classes are no longer equivalent: {}", classes.join(", "))
            }
            SanityWarning::UnconfirmedForbiddenInclusion { sup, sub } => {
                write!(f, "{sup} ⊇ {sub} is not confirmed by the forbidden graphs")
            }
            SanityWarning::MissingWitness { sup, sub } => {
                write!(f, "{sup} ⊋ {sub} has no witness graph")
            }
            SanityWarning::ProperCycle { sup, sub } => {
                write!(f, "{sup} ⊋ {sub} but also {sub} ⊇ {sup}")
            }
        }
    }
}

/// Warnings of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanityReport {
    warnings: Vec<SanityWarning>,
}

impl SanityReport {
    pub fn push(&mut self, warning: SanityWarning) {
        warn!(warning = %warning, "Sanity check failed");
        self.warnings.push(warning);
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn warnings(&self) -> &[SanityWarning] {
        &self.warnings
    }

    pub fn iter(&self) -> impl Iterator<Item = &SanityWarning> + '_ {
        self.warnings.iter()
    }
}

impl Deducer<'_> {
    /// Run every check on the current graph; temporary classes are skipped.
    pub fn sanity_check(&mut self) -> Result<&SanityReport, DeduceError> {
        let mut report = SanityReport::default();
        self.check_equivalences(&mut report)?;
        self.check_forbidden(&mut report)?;
        self.check_proper_cycles(&mut report)?;
        info!(warnings = report.len(), "Sanity checks complete");
        self.report = report;
        Ok(&self.report)
    }

    fn class_ids(&self, vertices: &BTreeSet<VertexId>) -> Result<Vec<String>, DeduceError> {
        vertices
            .iter()
            .map(|&v| Ok(self.graph.vertex(v)?.id.clone()))
            .collect()
    }

    /// Compare the SCCs of the seed classes before and after deduction
    fn check_equivalences(&self, report: &mut SanityReport) -> Result<(), DeduceError> {
        let current = calc_scc_map(&self.graph)?;

        for component in distinct(&current) {
            let seeds: BTreeSet<VertexId> = component
                .iter()
                .copied()
                .filter(|v| self.initial_sccs.contains_key(v) && !self.temporaries.contains(v))
                .collect();
            let before: BTreeSet<*const BTreeSet<VertexId>> =
                seeds.iter().map(|v| Rc::as_ptr(&self.initial_sccs[v])).collect();
            if before.len() > 1 {
                report.push(SanityWarning::SccMerged { classes: self.class_ids(&seeds)? });
            }
        }

        for component in distinct(&self.initial_sccs) {
            let present: BTreeSet<VertexId> = component
                .iter()
                .copied()
                .filter(|v| current.contains_key(v))
                .collect();
            let after: BTreeSet<*const BTreeSet<VertexId>> =
                present.iter().map(|v| Rc::as_ptr(&current[v])).collect();
            if after.len() > 1 {
                report.push(SanityWarning::SccSplit { classes: self.class_ids(&present)? });
            }
        }
        Ok(())
    }

    fn check_forbidden(&self, report: &mut SanityReport) -> Result<(), DeduceError> {
        let structure = self.structure();
        for (_, sup, sub, inclusion) in self.graph.edges() {
            if self.temporaries.contains(&sup) || self.temporaries.contains(&sub) {
                continue;
            }
            if !self.shape(sup)?.is_forbidden() || !self.shape(sub)?.is_forbidden() {
                continue;
            }
            let names = || -> Result<(String, String), DeduceError> {
                Ok((self.graph.vertex(sup)?.id.clone(), self.graph.vertex(sub)?.id.clone()))
            };
            if !structure.subclass_of(sub, sup) {
                let (sup, sub) = names()?;
                report.push(SanityWarning::UnconfirmedForbiddenInclusion { sup, sub });
            }
            if inclusion.proper && structure.provably_not_subclass_of(sup, sub).is_none() {
                let (sup, sub) = names()?;
                report.push(SanityWarning::MissingWitness { sup, sub });
            }
        }
        Ok(())
    }

    fn check_proper_cycles(&self, report: &mut SanityReport) -> Result<(), DeduceError> {
        for (_, sup, sub, inclusion) in self.graph.edges() {
            if !inclusion.proper || self.temporaries.contains(&sup) || self.temporaries.contains(&sub) {
                continue;
            }
            if self.graph.contains_edge(sub, sup) {
                report.push(SanityWarning::ProperCycle {
                    sup: self.graph.vertex(sup)?.id.clone(),
                    sub: self.graph.vertex(sub)?.id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Each component of an SCC map once, ordered by smallest member
fn distinct(map: &HashMap<VertexId, Component>) -> Vec<Component> {
    let mut components: Vec<Component> = Vec::new();
    let mut firsts: Vec<VertexId> = map
        .iter()
        .filter(|(vertex, component)| component.iter().next() == Some(*vertex))
        .map(|(vertex, _)| *vertex)
        .collect();
    firsts.sort_unstable();
    for first in firsts {
        components.push(Rc::clone(&map[&first]));
    }
    components
}
