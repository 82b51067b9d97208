//! Class and inclusion model
//!
//! A class database is a `Digraph` whose vertices are graph classes and whose
//! edges are inclusions pointing from the superclass to the subclass.

use crate::trace::Rule;
use incgraph::{Digraph, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The class database
pub type ClassGraph = Digraph<GraphClass, Inclusion>;

/// Reliability of an inclusion, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Unpublished,
    Low,
    Medium,
    #[default]
    Highest,
}

impl Confidence {
    pub const LOWEST: Confidence = Confidence::Unpublished;

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Unpublished => "unpublished",
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::Highest => "highest",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of subgraph a class is closed under.
///
/// Ordered by strength: isometric subgraphs are connected induced subgraphs,
/// which are induced subgraphs. A class closed under a stronger notion is
/// closed under every weaker one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hereditariness {
    #[default]
    Unknown,
    Isometric,
    Connected,
    Induced,
}

impl Hereditariness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hereditariness::Unknown => "unknown",
            Hereditariness::Isometric => "isometric",
            Hereditariness::Connected => "connected",
            Hereditariness::Induced => "induced",
        }
    }
}

/// How a class is defined
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Defined outside the database
    Base,
    /// Graphs without an induced subgraph from the set (small-graph names)
    Forbidden(BTreeSet<String>),
    /// Complements of the graphs in a class
    Complement(VertexId),
    /// Closure of a class under taking subgraphs of a kind
    Hereditary { kind: Hereditariness, base: VertexId },
    Intersect(BTreeSet<VertexId>),
    Union(BTreeSet<VertexId>),
    Probe(VertexId),
    Clique(VertexId),
}

impl Shape {
    /// Classes this shape is composed of
    pub fn members(&self) -> Vec<VertexId> {
        match self {
            Shape::Base | Shape::Forbidden(_) => Vec::new(),
            Shape::Complement(v) | Shape::Probe(v) | Shape::Clique(v) => vec![*v],
            Shape::Hereditary { base, .. } => vec![*base],
            Shape::Intersect(set) | Shape::Union(set) => set.iter().copied().collect(),
        }
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Shape::Forbidden(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Base => "base",
            Shape::Forbidden(_) => "forbidden",
            Shape::Complement(_) => "complement",
            Shape::Hereditary { .. } => "hereditary",
            Shape::Intersect(_) => "intersect",
            Shape::Union(_) => "union",
            Shape::Probe(_) => "probe",
            Shape::Clique(_) => "clique",
        }
    }
}

/// A vertex of the class database.
///
/// Classes are told apart by their vertex id, never by comparing shapes:
/// structurally equal classes may coexist for a while during deduction.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphClass {
    pub id: String,
    pub name: String,
    pub shape: Shape,
    pub hereditariness: Hereditariness,
    pub self_complementary: bool,
    pub clique_fixed: bool,
}

impl GraphClass {
    pub fn new(id: impl Into<String>, name: impl Into<String>, shape: Shape) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            shape,
            hereditariness: Hereditariness::Unknown,
            self_complementary: false,
            clique_fixed: false,
        }
    }

    /// A class without structure; the id doubles as the name
    pub fn base(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(id.clone(), id, Shape::Base)
    }

    pub fn with_hereditariness(mut self, hereditariness: Hereditariness) -> Self {
        self.hereditariness = hereditariness;
        self
    }

    pub fn self_complementary(mut self) -> Self {
        self.self_complementary = true;
        self
    }

    pub fn clique_fixed(mut self) -> Self {
        self.clique_fixed = true;
        self
    }

    /// Strongest subgraph notion the class is known to be closed under.
    ///
    /// Forbidden-subgraph classes are always induced-hereditary; a hereditary
    /// closure is at least as hereditary as its kind.
    pub fn hereditariness_level(&self) -> Hereditariness {
        match &self.shape {
            Shape::Forbidden(_) => Hereditariness::Induced,
            Shape::Hereditary { kind, .. } => self.hereditariness.max(*kind),
            _ => self.hereditariness,
        }
    }
}

/// An edge `super -> sub` asserting super ⊇ sub
#[derive(Debug, Clone, PartialEq)]
pub struct Inclusion {
    /// Strict inclusion
    pub proper: bool,
    pub confidence: Confidence,
    /// Literature or provenance references
    pub refs: Vec<String>,
    /// Rule that created the edge
    pub origin: Rule,
}

impl Inclusion {
    /// An inclusion read from the seed
    pub fn input(confidence: Confidence) -> Self {
        Self {
            proper: false,
            confidence,
            refs: Vec::new(),
            origin: Rule::Input,
        }
    }

    /// An inclusion found during deduction
    pub fn deduced(origin: Rule, confidence: Confidence) -> Self {
        Self {
            proper: false,
            confidence,
            refs: Vec::new(),
            origin,
        }
    }

    pub fn proper(mut self) -> Self {
        self.proper = true;
        self
    }

    pub fn with_ref(mut self, reference: impl Into<String>) -> Self {
        self.refs.push(reference.into());
        self
    }

    /// Whether the edge rests on something besides deduction
    pub fn is_referenced(&self) -> bool {
        !self.refs.is_empty() || self.origin == Rule::Input
    }
}
