//! Error types for graph operations.

use crate::graph::{EdgeId, VertexId};
use thiserror::Error;

/// Errors raised by graph, annotation and walker operations.
///
/// Everything except `NotAcyclic` is a structural error: the caller handed in a
/// vertex or edge the graph does not know, or broke a uniqueness assumption.
/// `NotAcyclic` is kept apart so callers can fall back to an algorithm that
/// tolerates cycles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Vertex is not (or no longer) part of the graph.
    #[error("Vertex {0} is not in the graph")]
    MissingVertex(VertexId),

    /// Edge is not (or no longer) part of the graph.
    #[error("Edge {0} is not in the graph")]
    MissingEdge(EdgeId),

    /// An edge between the same ordered pair already exists.
    #[error("Edge {tail} -> {head} already exists")]
    DuplicateEdge { tail: VertexId, head: VertexId },

    /// Annotation holds no data for a vertex that is in the graph.
    #[error("No annotation data for vertex {0}")]
    MissingVertexData(VertexId),

    /// Annotation holds no data for an edge that is in the graph.
    #[error("No annotation data for edge {0}")]
    MissingEdgeData(EdgeId),

    /// Lazy creation was requested from an annotation without a factory.
    #[error("Annotation has no factory")]
    NoFactory,

    /// An algorithm requiring an acyclic graph found a cycle.
    #[error("Graph is not acyclic: cycle through {0}")]
    NotAcyclic(VertexId),
}

impl GraphError {
    /// Create a duplicate edge error.
    pub fn duplicate_edge(tail: VertexId, head: VertexId) -> Self {
        Self::DuplicateEdge { tail, head }
    }

    /// Whether this error signals a cycle rather than a structural problem.
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::NotAcyclic(_))
    }
}
