//! Deduction engine
//!
//! Derives everything that follows from a seed database: the transitive
//! closure, new inclusions and new classes from the structural rules, and the
//! properness of inclusions. The working graph is kept transitively closed at
//! all times: every edge insertion also inserts the edges it implies.
//!
//! Input edges are processed by confidence tier. Edges below the highest tier
//! are held back, the rest is deduced to a fixpoint, then the next tier's
//! edges are put back and deduction continues on top of the closed graph.
//!
//! | Step | Where |
//! |------|-------|
//! | tiering, edge insertion, properness spreading | this module |
//! | frontier rules (decomposition, mirrors, complement pairs) | `rules` |
//! | direct and compositional inclusions | `trivial` |
//! | properness discovery | `proper` |
//! | equivalent forbidden classes, temporary pruning | `tempify` |
//! | consistency checks | `sanity` |
//! | superfluous-edge removal | `reduce` |
//!
//! Two complement relations are kept apart. `Shape::Complement` is the set
//! complement: it reverses inclusions and obeys De Morgan. Graph complements
//! (the class of complements of a class's graphs) preserve inclusions and
//! link self-complementary classes to themselves and F-free to co-F-free.

mod proper;
mod reduce;
mod rules;
mod sanity;
mod tempify;
mod trivial;

pub use reduce::KeeperPriority;
pub use sanity::{SanityReport, SanityWarning};

use crate::class::{ClassGraph, Confidence, GraphClass, Inclusion, Shape};
use crate::config::DeducerConfig;
use crate::error::DeduceError;
use crate::idgen::IdGenerator;
use crate::refs::RefSink;
use crate::structure::{SmallGraphs, Structure};
use crate::trace::{Rule, Trace, TraceData};
use incgraph::galg::{calc_scc_map, transitive_closure, Component};
use incgraph::{EdgeId, VertexId};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

/// An edge next to an inserted one: the connecting edge (none for the
/// endpoint itself) and the vertex it leads to
type Link = (Option<EdgeId>, VertexId);

/// An input edge held back until its confidence tier is processed
#[derive(Debug, Clone)]
struct Uncertain {
    sup: VertexId,
    sub: VertexId,
    inclusion: Inclusion,
}

/// The deduction engine; owns the working graph for the duration of a run
pub struct Deducer<'a> {
    graph: ClassGraph,
    smallgraphs: &'a dyn SmallGraphs,
    ids: &'a mut dyn IdGenerator,
    config: DeducerConfig,
    /// Scaffolding classes dropped by `remove_temporaries`
    temporaries: HashSet<VertexId>,
    /// Classes of the seed graph
    seed: HashSet<VertexId>,
    /// One class per non-base shape
    shapes: HashMap<Shape, VertexId>,
    /// Known complement pairs, both directions
    complements: HashMap<VertexId, BTreeSet<VertexId>>,
    /// Graph-complement images: `b` holds the complements of the graphs in
    /// `a`. Both directions; a self-complementary class is its own image.
    graph_complements: HashMap<VertexId, BTreeSet<VertexId>>,
    trace: Option<Trace>,
    tier: Confidence,
    uncertains: Vec<Uncertain>,
    /// Edges inserted so far, for fixpoint detection
    new_edges: usize,
    /// Classes created since the frontier was last taken
    created: Vec<VertexId>,
    initial_sccs: HashMap<VertexId, Component>,
    report: SanityReport,
}

impl<'a> Deducer<'a> {
    pub fn new(
        graph: ClassGraph,
        smallgraphs: &'a dyn SmallGraphs,
        ids: &'a mut dyn IdGenerator,
        config: DeducerConfig,
    ) -> Self {
        let mut shapes = HashMap::new();
        let mut complements = HashMap::new();
        for (vertex, class) in graph.vertices() {
            if class.shape != Shape::Base {
                shapes.entry(class.shape.clone()).or_insert(vertex);
            }
            if let Shape::Complement(of) = class.shape {
                pair_complements(&mut complements, vertex, of);
            }
        }

        Self {
            seed: graph.vertex_ids().collect(),
            trace: config.trace.then(Trace::new),
            graph,
            smallgraphs,
            ids,
            config,
            temporaries: HashSet::new(),
            shapes,
            complements,
            graph_complements: HashMap::new(),
            tier: Confidence::Highest,
            uncertains: Vec::new(),
            new_edges: 0,
            created: Vec::new(),
            initial_sccs: HashMap::new(),
            report: SanityReport::default(),
        }
    }

    /// Run the whole deduction.
    ///
    /// Returns the sanity report; warnings never abort the run.
    pub fn find_trivial_inclusions(&mut self) -> Result<SanityReport, DeduceError> {
        info!(
            classes = self.graph.vertex_count(),
            inclusions = self.graph.edge_count(),
            "Starting deduction"
        );
        self.prepare()?;
        loop {
            self.find_trivial_inclusions_one_level()?;
            if !self.lower_tier()? {
                break;
            }
        }
        self.tempify()?;
        if self.config.sanity {
            self.sanity_check()?;
        }
        info!(
            classes = self.graph.vertex_count(),
            inclusions = self.graph.edge_count(),
            temporaries = self.temporaries.len(),
            warnings = self.report.len(),
            "Deduction complete"
        );
        Ok(self.report.clone())
    }

    /// Snapshot the input SCCs, hold back edges below the highest tier and
    /// close the rest.
    pub fn prepare(&mut self) -> Result<(), DeduceError> {
        self.initial_sccs = calc_scc_map(&self.graph)?;

        let held: Vec<EdgeId> = self
            .graph
            .edges()
            .filter(|(_, _, _, inclusion)| inclusion.confidence < Confidence::Highest)
            .map(|(edge, _, _, _)| edge)
            .collect();
        for edge in held {
            let (sup, sub) = self.graph.endpoints(edge)?;
            let inclusion = self.graph.remove_edge(edge)?;
            self.uncertains.push(Uncertain { sup, sub, inclusion });
        }

        let inputs: Vec<(EdgeId, bool)> = self.graph.edges().map(|(e, _, _, i)| (e, i.proper)).collect();
        for &(edge, _) in &inputs {
            self.record(edge, TraceData::new(Rule::Input, vec![]))?;
        }

        let added = transitive_closure(&mut self.graph, |_, _| {
            Inclusion::deduced(Rule::Transitivity, Confidence::Highest)
        })?;
        for &edge in &added {
            self.record(
                edge,
                TraceData::new(Rule::Transitivity, vec![]).with_note("closure of the seed"),
            )?;
        }
        self.new_edges += added.len();

        for (edge, proper) in inputs {
            if proper {
                self.record_proper(edge, TraceData::new(Rule::Input, vec![]))?;
                self.spread_proper(edge)?;
            }
        }

        self.tier = Confidence::Highest;
        self.created = self.graph.vertex_ids().collect();
        info!(
            tier = %self.tier,
            inclusions = self.graph.edge_count(),
            closure = added.len(),
            held_back = self.uncertains.len(),
            "Prepared seed graph"
        );
        Ok(())
    }

    /// Deduce to a fixpoint at the current tier
    pub fn find_trivial_inclusions_one_level(&mut self) -> Result<(), DeduceError> {
        let mut frontier = std::mem::take(&mut self.created);
        let mut pass = 0;
        loop {
            pass += 1;
            let edges_before = self.new_edges;

            self.apply_rules(&frontier)?;
            let mut fresh: HashSet<VertexId> = frontier.iter().copied().collect();
            fresh.extend(self.created.iter().copied());
            self.find_trivial_once(&fresh)?;

            let created = std::mem::take(&mut self.created);
            let added = self.new_edges - edges_before;
            debug!(tier = %self.tier, pass, created = created.len(), added, "Deduction pass");
            if created.is_empty() && added == 0 {
                break;
            }
            frontier = created;
        }
        self.find_proper_inclusions()?;
        Ok(())
    }

    /// Move on to the highest tier still held back.
    ///
    /// Returns false when nothing is left.
    pub fn lower_tier(&mut self) -> Result<bool, DeduceError> {
        let Some(next) = self.uncertains.iter().map(|u| u.inclusion.confidence).max() else {
            return Ok(false);
        };
        let (now, later): (Vec<Uncertain>, Vec<Uncertain>) = std::mem::take(&mut self.uncertains)
            .into_iter()
            .partition(|u| u.inclusion.confidence == next);
        self.uncertains = later;
        self.tier = next;
        info!(
            tier = %next,
            restored = now.len(),
            remaining = self.uncertains.len(),
            "Lowering confidence tier"
        );

        for held in now {
            self.restore(held)?;
        }
        Ok(true)
    }

    /// Put a held back edge into the graph with its properness and refs
    fn restore(&mut self, held: Uncertain) -> Result<(), DeduceError> {
        let Uncertain { sup, sub, inclusion } = held;
        match self.graph.find_edge(sup, sub) {
            Some(edge) => {
                // Already deduced at a higher tier
                let proper = inclusion.proper;
                let existing = self.graph.edge_mut(edge)?;
                existing.origin = Rule::Input;
                for reference in inclusion.refs {
                    if !existing.refs.contains(&reference) {
                        existing.refs.push(reference);
                    }
                }
                if proper {
                    self.set_proper(edge, Rule::Input, vec![])?;
                }
            }
            None => {
                self.insert_edge(sup, sub, inclusion, TraceData::new(Rule::Input, vec![]))?;
            }
        }
        Ok(())
    }

    /// Insert `sup -> sub` found by `rule` from `sources`, keeping the graph
    /// transitively closed.
    ///
    /// Self-edges and existing edges are ignored. The confidence is the
    /// lowest among the sources, or the current tier without sources.
    pub fn add_trivial_edge(
        &mut self,
        sup: VertexId,
        sub: VertexId,
        rule: Rule,
        sources: Vec<EdgeId>,
    ) -> Result<Option<EdgeId>, DeduceError> {
        if sup == sub || self.graph.contains_edge(sup, sub) {
            return Ok(None);
        }
        let confidence = self.confidence_of(&sources)?;
        self.insert_edge(
            sup,
            sub,
            Inclusion::deduced(rule, confidence),
            TraceData::new(rule, sources),
        )
    }

    /// Insert an edge and every edge it implies through the existing ones
    fn insert_edge(
        &mut self,
        sup: VertexId,
        sub: VertexId,
        inclusion: Inclusion,
        data: TraceData,
    ) -> Result<Option<EdgeId>, DeduceError> {
        if sup == sub || self.graph.contains_edge(sup, sub) {
            return Ok(None);
        }
        let proper = inclusion.proper;
        let edge = self.graph.add_edge(sup, sub, inclusion)?;
        self.new_edges += 1;
        if proper {
            self.record_proper(edge, data.clone())?;
        }
        self.record(edge, data)?;

        let (uppers, lowers) = self.neighbourhood(sup, sub)?;
        for &(up, a) in &uppers {
            for &(down, b) in &lowers {
                if (up.is_none() && down.is_none()) || a == b {
                    continue;
                }
                let sources: Vec<EdgeId> = [up, Some(edge), down].into_iter().flatten().collect();
                let mut confidence = Confidence::Highest;
                let mut derived_proper = false;
                for &source in &sources {
                    let inclusion = self.graph.edge(source)?;
                    confidence = confidence.min(inclusion.confidence);
                    derived_proper |= inclusion.proper;
                }

                match self.graph.find_edge(a, b) {
                    Some(existing) => {
                        if derived_proper && !self.graph.edge(existing)?.proper {
                            self.graph.edge_mut(existing)?.proper = true;
                            self.record_proper(existing, TraceData::new(Rule::Transitivity, sources))?;
                        }
                    }
                    None => {
                        let mut derived = Inclusion::deduced(Rule::Transitivity, confidence);
                        derived.proper = derived_proper;
                        let derived_edge = self.graph.add_edge(a, b, derived)?;
                        self.new_edges += 1;
                        if derived_proper {
                            self.record_proper(derived_edge, TraceData::new(Rule::Transitivity, sources.clone()))?;
                        }
                        self.record(derived_edge, TraceData::new(Rule::Transitivity, sources))?;
                    }
                }
            }
        }
        Ok(Some(edge))
    }

    /// Mark an edge proper and spread properness along the closure.
    ///
    /// Returns false if it already was proper. Properness is never undone.
    pub fn set_proper(&mut self, edge: EdgeId, rule: Rule, sources: Vec<EdgeId>) -> Result<bool, DeduceError> {
        self.mark_proper(edge, TraceData::new(rule, sources))
    }

    fn mark_proper(&mut self, edge: EdgeId, data: TraceData) -> Result<bool, DeduceError> {
        if self.graph.edge(edge)?.proper {
            return Ok(false);
        }
        self.graph.edge_mut(edge)?.proper = true;
        self.record_proper(edge, data)?;
        self.spread_proper(edge)?;
        Ok(true)
    }

    /// a ⊋ b makes every x ⊇ a ⊋ b ⊇ y proper
    fn spread_proper(&mut self, edge: EdgeId) -> Result<usize, DeduceError> {
        let (sup, sub) = self.graph.endpoints(edge)?;
        let (uppers, lowers) = self.neighbourhood(sup, sub)?;
        let mut marked = 0;
        for &(up, a) in &uppers {
            for &(down, b) in &lowers {
                if (up.is_none() && down.is_none()) || a == b {
                    continue;
                }
                let Some(derived) = self.graph.find_edge(a, b) else {
                    continue;
                };
                if !self.graph.edge(derived)?.proper {
                    self.graph.edge_mut(derived)?.proper = true;
                    let sources = [up, Some(edge), down].into_iter().flatten().collect();
                    self.record_proper(derived, TraceData::new(Rule::Transitivity, sources))?;
                    marked += 1;
                }
            }
        }
        Ok(marked)
    }

    /// `sup` with its superclasses, `sub` with its subclasses
    fn neighbourhood(&self, sup: VertexId, sub: VertexId) -> Result<(Vec<Link>, Vec<Link>), DeduceError> {
        let mut uppers = vec![(None, sup)];
        for &edge in self.graph.in_edges(sup) {
            uppers.push((Some(edge), self.graph.tail(edge)?));
        }
        let mut lowers = vec![(None, sub)];
        for &edge in self.graph.out_edges(sub) {
            lowers.push((Some(edge), self.graph.head(edge)?));
        }
        Ok((uppers, lowers))
    }

    fn confidence_of(&self, sources: &[EdgeId]) -> Result<Confidence, DeduceError> {
        if sources.is_empty() {
            return Ok(self.tier);
        }
        let mut confidence = Confidence::Highest;
        for &source in sources {
            confidence = confidence.min(self.graph.edge(source)?.confidence);
        }
        Ok(confidence)
    }

    /// The class with `shape`, created if missing.
    ///
    /// New classes composed of a temporary class are temporary as well.
    /// Temporary classes get a placeholder id; asking for an existing
    /// temporary class as non-temporary promotes it and assigns a real id.
    fn find_or_create(&mut self, shape: Shape, temporary: bool) -> Result<VertexId, DeduceError> {
        let scaffold = temporary || self.has_temporary_member(&shape);

        if let Some(&vertex) = self.shapes.get(&shape) {
            if !scaffold && self.temporaries.remove(&vertex) {
                let class = self.graph.vertex(vertex)?;
                let id = self.ids.next_id(&class.name);
                debug!(class = %class.name, id = %id, "Promoted temporary class");
                self.graph.vertex_mut(vertex)?.id = id;
            }
            return Ok(vertex);
        }

        let name = self.structure().describe(&shape);
        let id = if scaffold {
            format!("tmp_{}", self.graph.vertex_bound())
        } else {
            self.ids.next_id(&name)
        };
        debug!(class = %name, id = %id, temporary = scaffold, "Created class");

        let vertex = self.graph.add_vertex(GraphClass::new(id, name, shape.clone()));
        if let Shape::Complement(of) = shape {
            self.register_complement(vertex, of);
        }
        self.shapes.insert(shape, vertex);
        if scaffold {
            self.temporaries.insert(vertex);
        }
        self.created.push(vertex);
        Ok(vertex)
    }

    fn has_temporary_member(&self, shape: &Shape) -> bool {
        shape.members().iter().any(|m| self.temporaries.contains(m))
    }

    fn register_complement(&mut self, a: VertexId, b: VertexId) {
        pair_complements(&mut self.complements, a, b);
    }

    fn register_graph_complement(&mut self, a: VertexId, b: VertexId) {
        pair_complements(&mut self.graph_complements, a, b);
    }

    /// Insert both directions of an equivalence
    fn equate(&mut self, a: VertexId, b: VertexId, rule: Rule) -> Result<(), DeduceError> {
        self.add_trivial_edge(a, b, rule, vec![])?;
        self.add_trivial_edge(b, a, rule, vec![])?;
        Ok(())
    }

    fn shape(&self, vertex: VertexId) -> Result<&Shape, DeduceError> {
        Ok(&self.graph.vertex(vertex)?.shape)
    }

    fn structure(&self) -> Structure<'_> {
        Structure::new(&self.graph, self.smallgraphs)
    }

    fn record(&mut self, edge: EdgeId, data: TraceData) -> Result<(), DeduceError> {
        if let Some(trace) = self.trace.as_mut() {
            trace.record(&self.graph, edge, data)?;
        }
        Ok(())
    }

    fn record_proper(&mut self, edge: EdgeId, data: TraceData) -> Result<(), DeduceError> {
        if let Some(trace) = self.trace.as_mut() {
            trace.record_proper(&self.graph, edge, data)?;
        }
        Ok(())
    }

    /// Stamp every unreferenced deduced edge with the justification of its
    /// rule. Returns the number of stamped edges.
    pub fn stamp_references(&mut self) -> Result<usize, DeduceError> {
        let stamps = self.references();
        for (edge, reference) in &stamps {
            self.graph.add_ref(*edge, reference)?;
        }
        info!(stamped = stamps.len(), "Stamped references");
        Ok(stamps.len())
    }

    /// Like `stamp_references`, into an external sink
    pub fn stamp_references_into(&self, sink: &mut dyn RefSink) -> Result<usize, DeduceError> {
        let stamps = self.references();
        for (edge, reference) in &stamps {
            sink.add_ref(*edge, reference)?;
        }
        Ok(stamps.len())
    }

    fn references(&self) -> Vec<(EdgeId, String)> {
        let name = |v: VertexId| self.graph.vertex(v).map(|c| c.id.clone()).unwrap_or_default();
        self.graph
            .edges()
            .filter(|(_, _, _, inclusion)| inclusion.refs.is_empty())
            .filter_map(|(edge, _, _, inclusion)| {
                let base = inclusion.origin.reference()?;
                let detail = self
                    .trace
                    .as_ref()
                    .and_then(|trace| trace.why(&self.graph, edge))
                    .filter(|data| !data.sources.is_empty())
                    .map(|data| {
                        data.sources
                            .iter()
                            .filter_map(|s| self.graph.endpoints(*s).ok())
                            .map(|(a, b)| format!("{} ⊇ {}", name(a), name(b)))
                            .collect::<Vec<_>>()
                            .join(", ")
                    });
                Some(match detail {
                    Some(detail) => (edge, format!("{base} of {detail}")),
                    None => (edge, base.to_string()),
                })
            })
            .collect()
    }

    pub fn graph(&self) -> &ClassGraph {
        &self.graph
    }

    pub fn into_graph(self) -> ClassGraph {
        self.graph
    }

    pub fn config(&self) -> &DeducerConfig {
        &self.config
    }

    /// Confidence tier currently processed
    pub fn tier(&self) -> Confidence {
        self.tier
    }

    pub fn is_temporary(&self, vertex: VertexId) -> bool {
        self.temporaries.contains(&vertex)
    }

    pub fn temporaries(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.temporaries.iter().copied()
    }

    /// The class indexed for a (non-base) shape
    pub fn vertex_for(&self, shape: &Shape) -> Option<VertexId> {
        self.shapes.get(shape).copied()
    }

    /// The class with a given id
    pub fn find_class(&self, id: &str) -> Option<VertexId> {
        self.graph.vertices().find(|(_, c)| c.id == id).map(|(v, _)| v)
    }

    pub fn report(&self) -> &SanityReport {
        &self.report
    }

    pub fn trace(&self) -> Option<&Trace> {
        self.trace.as_ref()
    }

    /// Provenance chain of an edge; `None` without tracing
    pub fn explain(&self, edge: EdgeId) -> Option<String> {
        self.trace.as_ref().map(|trace| trace.explain(&self.graph, edge))
    }

    /// Provenance chain of an edge's properness; `None` without tracing
    pub fn explain_proper(&self, edge: EdgeId) -> Option<String> {
        self.trace.as_ref().map(|trace| trace.explain_proper(&self.graph, edge))
    }
}

fn pair_complements(map: &mut HashMap<VertexId, BTreeSet<VertexId>>, a: VertexId, b: VertexId) {
    map.entry(a).or_default().insert(b);
    map.entry(b).or_default().insert(a);
}
