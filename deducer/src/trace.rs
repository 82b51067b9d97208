//! Provenance of deduced inclusions
//!
//! Every inclusion carries the `Rule` that created it. With tracing enabled
//! the deducer additionally records, per edge, the edges a rule used, once for
//! the existence of the edge and once for its properness. The records live in
//! `Annotation`s so the class model itself stays untouched.

use crate::class::ClassGraph;
use incgraph::{Annotation, EdgeId, GraphError, VertexId};
use std::collections::HashSet;
use std::fmt::Write;

/// Deduction rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Read from the seed
    Input,
    /// Composition of two inclusions
    Transitivity,
    /// Structural comparison of two shapes
    Direct,
    /// Set complements: co(A) ⊇ co(B) from B ⊇ A
    Complement,
    Union,
    Intersect,
    Hereditary,
    Probe,
    Clique,
    /// A forbidden class equals the intersection of its single-graph pieces
    Forbidden,
    /// Clique-fixed classes equal their clique class
    Mirror,
    /// Graph-complement images of an inclusion: A ⊇ B gives co-A ⊇ co-B
    GraphComplement,
    /// Complement of a union is the intersection of complements and vice versa
    ComplementPair,
    /// Properness by comparing forbidden sets
    ForbiddenSyntax,
    /// Properness from a forbidden subclass outside the smaller class
    ForbiddenWitness,
    /// Fixed properness facts
    BaseCase,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::Input => "input",
            Rule::Transitivity => "transitivity",
            Rule::Direct => "direct",
            Rule::Complement => "complement",
            Rule::Union => "union",
            Rule::Intersect => "intersect",
            Rule::Hereditary => "hereditary",
            Rule::Probe => "probe",
            Rule::Clique => "clique",
            Rule::Forbidden => "forbidden",
            Rule::Mirror => "mirror",
            Rule::GraphComplement => "graph-complement",
            Rule::ComplementPair => "complement-pair",
            Rule::ForbiddenSyntax => "forbidden-syntax",
            Rule::ForbiddenWitness => "forbidden-witness",
            Rule::BaseCase => "base-case",
        }
    }

    /// Human readable justification stamped on edges created by this rule.
    ///
    /// Input and plain transitivity edges get none.
    pub fn reference(&self) -> Option<&'static str> {
        match self {
            Rule::Input | Rule::Transitivity => None,
            Rule::Direct => Some("trivial: direct from the definitions"),
            Rule::Complement => Some("trivial: derived via complement"),
            Rule::Union => Some("trivial: derived via union"),
            Rule::Intersect => Some("trivial: derived via intersection"),
            Rule::Hereditary => Some("trivial: derived via hereditary closure"),
            Rule::Probe => Some("trivial: derived via probe classes"),
            Rule::Clique => Some("trivial: derived via clique graphs"),
            Rule::Forbidden => Some("trivial: forbidden subgraph decomposition"),
            Rule::Mirror => Some("trivial: class is closed under taking clique graphs"),
            Rule::GraphComplement => Some("trivial: derived via graph complements"),
            Rule::ComplementPair => Some("trivial: De Morgan"),
            Rule::ForbiddenSyntax => Some("trivial: forbidden subgraph comparison"),
            Rule::ForbiddenWitness => Some("trivial: forbidden subgraph witness"),
            Rule::BaseCase => Some("trivial: known strict inclusion"),
        }
    }
}

/// Why an edge exists, or why it is proper
#[derive(Debug, Clone, PartialEq)]
pub struct TraceData {
    pub rule: Rule,
    /// Edges the rule combined
    pub sources: Vec<EdgeId>,
    pub note: Option<String>,
}

impl TraceData {
    pub fn new(rule: Rule, sources: Vec<EdgeId>) -> Self {
        Self {
            rule,
            sources,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Provenance records of one deduction run
#[derive(Debug, Default)]
pub struct Trace {
    why: Annotation<TraceData>,
    why_proper: Annotation<TraceData>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record why `edge` exists. The first record wins.
    pub fn record(&mut self, graph: &ClassGraph, edge: EdgeId, data: TraceData) -> Result<(), GraphError> {
        if !self.why.has_edge(edge) {
            self.why.set_edge(graph, edge, data)?;
        }
        Ok(())
    }

    /// Record why `edge` is proper. The first record wins.
    pub fn record_proper(&mut self, graph: &ClassGraph, edge: EdgeId, data: TraceData) -> Result<(), GraphError> {
        if !self.why_proper.has_edge(edge) {
            self.why_proper.set_edge(graph, edge, data)?;
        }
        Ok(())
    }

    pub fn why(&self, graph: &ClassGraph, edge: EdgeId) -> Option<&TraceData> {
        self.why.edge(graph, edge).ok()
    }

    pub fn why_proper(&self, graph: &ClassGraph, edge: EdgeId) -> Option<&TraceData> {
        self.why_proper.edge(graph, edge).ok()
    }

    /// Render the chain of records behind the existence of `edge`
    pub fn explain(&self, graph: &ClassGraph, edge: EdgeId) -> String {
        let mut out = String::new();
        self.render(graph, edge, false, 0, &mut HashSet::new(), &mut out);
        out
    }

    /// Render the chain of records behind the properness of `edge`
    pub fn explain_proper(&self, graph: &ClassGraph, edge: EdgeId) -> String {
        let mut out = String::new();
        self.render(graph, edge, true, 0, &mut HashSet::new(), &mut out);
        out
    }

    fn render(
        &self,
        graph: &ClassGraph,
        edge: EdgeId,
        proper: bool,
        depth: usize,
        visited: &mut HashSet<(EdgeId, bool)>,
        out: &mut String,
    ) {
        let indent = "  ".repeat(depth);
        let Ok((sup, sub)) = graph.endpoints(edge) else {
            let _ = writeln!(out, "{indent}{edge} (removed)");
            return;
        };
        let name = |v: VertexId| graph.vertex(v).map(|c| c.id.as_str()).unwrap_or("?");
        let relation = if proper { "⊋" } else { "⊇" };
        let _ = write!(out, "{indent}{} {relation} {}", name(sup), name(sub));

        if !visited.insert((edge, proper)) {
            let _ = writeln!(out, " (see above)");
            return;
        }

        let data = if proper {
            self.why_proper(graph, edge)
        } else {
            self.why(graph, edge)
        };
        let Some(data) = data else {
            let _ = writeln!(out, " [untraced]");
            return;
        };
        let _ = write!(out, " [{}]", data.rule.as_str());
        if let Some(note) = &data.note {
            let _ = write!(out, " {note}");
        }
        out.push('\n');

        for &source in &data.sources {
            // Properness chains mix proper and plain links
            let source_proper = proper
                && graph.edge(source).map(|i| i.proper).unwrap_or(false)
                && self.why_proper(graph, source).is_some();
            self.render(graph, source, source_proper, depth + 1, visited, out);
        }
    }
}
