//! Side-table annotations
//!
//! An `Annotation<D>` attaches data of type `D` to vertices and edges of a
//! `Digraph` without touching the graph's own payloads. Storage is two dense
//! vectors indexed like the graph arena. Lookups take the graph they refer to
//! and fail for vertices or edges that are not in it, so data of a removed
//! vertex can never be read back through a live id.

use crate::error::GraphError;
use crate::graph::{Digraph, EdgeId, VertexId};
use std::fmt;

type Factory<D> = Box<dyn Fn() -> D>;

/// Auxiliary per-vertex and per-edge data
pub struct Annotation<D> {
    vertices: Vec<Option<D>>,
    edges: Vec<Option<D>>,
    factory: Option<Factory<D>>,
}

impl<D> Default for Annotation<D> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            factory: None,
        }
    }
}

impl<D: fmt::Debug> fmt::Debug for Annotation<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Annotation")
            .field("vertices", &self.vertices)
            .field("edges", &self.edges)
            .field("factory", &self.factory.is_some())
            .finish()
    }
}

impl<D> Annotation<D> {
    /// Create an annotation without a factory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an annotation whose `*_or_create` accessors use `factory`
    pub fn with_factory(factory: impl Fn() -> D + 'static) -> Self {
        Self {
            factory: Some(Box::new(factory)),
            ..Self::default()
        }
    }

    /// Replace the factory
    pub fn set_factory(&mut self, factory: impl Fn() -> D + 'static) {
        self.factory = Some(Box::new(factory));
    }

    /// Data of a vertex
    pub fn vertex<V, E>(&self, graph: &Digraph<V, E>, vertex: VertexId) -> Result<&D, GraphError> {
        if !graph.contains_vertex(vertex) {
            return Err(GraphError::MissingVertex(vertex));
        }
        self.vertices
            .get(vertex.index())
            .and_then(Option::as_ref)
            .ok_or(GraphError::MissingVertexData(vertex))
    }

    /// Mutable data of a vertex
    pub fn vertex_mut<V, E>(
        &mut self,
        graph: &Digraph<V, E>,
        vertex: VertexId,
    ) -> Result<&mut D, GraphError> {
        if !graph.contains_vertex(vertex) {
            return Err(GraphError::MissingVertex(vertex));
        }
        self.vertices
            .get_mut(vertex.index())
            .and_then(Option::as_mut)
            .ok_or(GraphError::MissingVertexData(vertex))
    }

    /// Data of a vertex, created through the factory on first access
    pub fn vertex_or_create<V, E>(
        &mut self,
        graph: &Digraph<V, E>,
        vertex: VertexId,
    ) -> Result<&mut D, GraphError> {
        if !graph.contains_vertex(vertex) {
            return Err(GraphError::MissingVertex(vertex));
        }
        let slot = slot_for(&mut self.vertices, vertex.index());
        if slot.is_none() {
            let factory = self.factory.as_ref().ok_or(GraphError::NoFactory)?;
            *slot = Some(factory());
        }
        slot.as_mut().ok_or(GraphError::MissingVertexData(vertex))
    }

    /// Store data for a vertex
    pub fn set_vertex<V, E>(
        &mut self,
        graph: &Digraph<V, E>,
        vertex: VertexId,
        data: D,
    ) -> Result<(), GraphError> {
        if !graph.contains_vertex(vertex) {
            return Err(GraphError::MissingVertex(vertex));
        }
        *slot_for(&mut self.vertices, vertex.index()) = Some(data);
        Ok(())
    }

    /// Whether data is stored for a vertex (regardless of graph membership)
    pub fn has_vertex(&self, vertex: VertexId) -> bool {
        matches!(self.vertices.get(vertex.index()), Some(Some(_)))
    }

    /// Drop the data of a vertex
    pub fn forget_vertex(&mut self, vertex: VertexId) -> Option<D> {
        self.vertices.get_mut(vertex.index()).and_then(Option::take)
    }

    /// Data of an edge
    pub fn edge<V, E>(&self, graph: &Digraph<V, E>, edge: EdgeId) -> Result<&D, GraphError> {
        if !graph.contains_edge_id(edge) {
            return Err(GraphError::MissingEdge(edge));
        }
        self.edges
            .get(edge.index())
            .and_then(Option::as_ref)
            .ok_or(GraphError::MissingEdgeData(edge))
    }

    /// Mutable data of an edge
    pub fn edge_mut<V, E>(&mut self, graph: &Digraph<V, E>, edge: EdgeId) -> Result<&mut D, GraphError> {
        if !graph.contains_edge_id(edge) {
            return Err(GraphError::MissingEdge(edge));
        }
        self.edges
            .get_mut(edge.index())
            .and_then(Option::as_mut)
            .ok_or(GraphError::MissingEdgeData(edge))
    }

    /// Data of an edge, created through the factory on first access
    pub fn edge_or_create<V, E>(
        &mut self,
        graph: &Digraph<V, E>,
        edge: EdgeId,
    ) -> Result<&mut D, GraphError> {
        if !graph.contains_edge_id(edge) {
            return Err(GraphError::MissingEdge(edge));
        }
        let slot = slot_for(&mut self.edges, edge.index());
        if slot.is_none() {
            let factory = self.factory.as_ref().ok_or(GraphError::NoFactory)?;
            *slot = Some(factory());
        }
        slot.as_mut().ok_or(GraphError::MissingEdgeData(edge))
    }

    /// Store data for an edge
    pub fn set_edge<V, E>(&mut self, graph: &Digraph<V, E>, edge: EdgeId, data: D) -> Result<(), GraphError> {
        if !graph.contains_edge_id(edge) {
            return Err(GraphError::MissingEdge(edge));
        }
        *slot_for(&mut self.edges, edge.index()) = Some(data);
        Ok(())
    }

    /// Whether data is stored for an edge (regardless of graph membership)
    pub fn has_edge(&self, edge: EdgeId) -> bool {
        matches!(self.edges.get(edge.index()), Some(Some(_)))
    }

    /// Drop the data of an edge
    pub fn forget_edge(&mut self, edge: EdgeId) -> Option<D> {
        self.edges.get_mut(edge.index()).and_then(Option::take)
    }

    /// All stored values, vertices first
    pub fn values(&self) -> impl Iterator<Item = &D> + '_ {
        self.vertices.iter().chain(self.edges.iter()).flatten()
    }

    /// All stored values, mutably
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut D> + '_ {
        self.vertices.iter_mut().chain(self.edges.iter_mut()).flatten()
    }

    /// Values stored for edges only
    pub fn edge_values_mut(&mut self) -> impl Iterator<Item = &mut D> + '_ {
        self.edges.iter_mut().flatten()
    }

    /// Drop everything, keeping the factory
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
    }
}

fn slot_for<D>(slots: &mut Vec<Option<D>>, index: usize) -> &mut Option<D> {
    if slots.len() <= index {
        slots.resize_with(index + 1, || None);
    }
    &mut slots[index]
}
