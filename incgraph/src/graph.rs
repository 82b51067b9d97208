//! Arena directed graph
//!
//! Vertices and edges live in slot vectors and are referred to by `VertexId`
//! and `EdgeId`. Indices are never reused, so an id that outlives its vertex
//! simply stops resolving. At most one edge exists per ordered vertex pair and
//! a pair index gives O(1) `find_edge`.

use crate::error::GraphError;
use std::collections::HashMap;
use std::fmt;

/// Stable index of a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(usize);

impl VertexId {
    /// Position of this vertex in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Stable index of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(usize);

impl EdgeId {
    /// Position of this edge in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct VertexSlot<V> {
    data: V,
    outgoing: Vec<EdgeId>,
    incoming: Vec<EdgeId>,
}

#[derive(Debug, Clone)]
struct EdgeSlot<E> {
    tail: VertexId,
    head: VertexId,
    data: E,
}

/// Directed graph without parallel edges
#[derive(Debug, Clone)]
pub struct Digraph<V, E> {
    vertices: Vec<Option<VertexSlot<V>>>,
    edges: Vec<Option<EdgeSlot<E>>>,
    /// (tail, head) -> edge
    pairs: HashMap<(VertexId, VertexId), EdgeId>,
    vertex_count: usize,
}

impl<V, E> Default for Digraph<V, E> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            pairs: HashMap::new(),
            vertex_count: 0,
        }
    }
}

impl<V, E> Digraph<V, E> {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex carrying `data`
    pub fn add_vertex(&mut self, data: V) -> VertexId {
        let id = VertexId(self.vertices.len());
        self.vertices.push(Some(VertexSlot {
            data,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }));
        self.vertex_count += 1;
        id
    }

    /// Add the edge `tail -> head`.
    ///
    /// Fails if either endpoint is unknown or the edge already exists.
    pub fn add_edge(&mut self, tail: VertexId, head: VertexId, data: E) -> Result<EdgeId, GraphError> {
        if !self.contains_vertex(tail) {
            return Err(GraphError::MissingVertex(tail));
        }
        if !self.contains_vertex(head) {
            return Err(GraphError::MissingVertex(head));
        }
        if self.pairs.contains_key(&(tail, head)) {
            return Err(GraphError::duplicate_edge(tail, head));
        }

        let id = EdgeId(self.edges.len());
        self.edges.push(Some(EdgeSlot { tail, head, data }));
        self.pairs.insert((tail, head), id);
        self.slot_mut(tail)?.outgoing.push(id);
        self.slot_mut(head)?.incoming.push(id);
        Ok(id)
    }

    /// Remove an edge, returning its payload
    pub fn remove_edge(&mut self, edge: EdgeId) -> Result<E, GraphError> {
        let slot = self
            .edges
            .get_mut(edge.0)
            .and_then(Option::take)
            .ok_or(GraphError::MissingEdge(edge))?;

        self.pairs.remove(&(slot.tail, slot.head));
        self.slot_mut(slot.tail)?.outgoing.retain(|e| *e != edge);
        self.slot_mut(slot.head)?.incoming.retain(|e| *e != edge);
        Ok(slot.data)
    }

    /// Remove a vertex and every edge touching it, returning its payload
    pub fn remove_vertex(&mut self, vertex: VertexId) -> Result<V, GraphError> {
        let incident: Vec<EdgeId> = {
            let slot = self.slot(vertex)?;
            slot.outgoing.iter().chain(slot.incoming.iter()).copied().collect()
        };
        for edge in incident {
            // A self-loop shows up twice
            if self.contains_edge_id(edge) {
                self.remove_edge(edge)?;
            }
        }

        let slot = self.vertices[vertex.0]
            .take()
            .ok_or(GraphError::MissingVertex(vertex))?;
        self.vertex_count -= 1;
        Ok(slot.data)
    }

    /// Check if a vertex is in the graph
    pub fn contains_vertex(&self, vertex: VertexId) -> bool {
        matches!(self.vertices.get(vertex.0), Some(Some(_)))
    }

    /// Check if an edge id is in the graph
    pub fn contains_edge_id(&self, edge: EdgeId) -> bool {
        matches!(self.edges.get(edge.0), Some(Some(_)))
    }

    /// Check if the edge `tail -> head` exists
    pub fn contains_edge(&self, tail: VertexId, head: VertexId) -> bool {
        self.pairs.contains_key(&(tail, head))
    }

    /// Find the edge `tail -> head`
    pub fn find_edge(&self, tail: VertexId, head: VertexId) -> Option<EdgeId> {
        self.pairs.get(&(tail, head)).copied()
    }

    /// Payload of a vertex
    pub fn vertex(&self, vertex: VertexId) -> Result<&V, GraphError> {
        Ok(&self.slot(vertex)?.data)
    }

    /// Mutable payload of a vertex
    pub fn vertex_mut(&mut self, vertex: VertexId) -> Result<&mut V, GraphError> {
        Ok(&mut self.slot_mut(vertex)?.data)
    }

    /// Payload of an edge
    pub fn edge(&self, edge: EdgeId) -> Result<&E, GraphError> {
        Ok(&self.edge_slot(edge)?.data)
    }

    /// Mutable payload of an edge
    pub fn edge_mut(&mut self, edge: EdgeId) -> Result<&mut E, GraphError> {
        self.edges
            .get_mut(edge.0)
            .and_then(Option::as_mut)
            .map(|slot| &mut slot.data)
            .ok_or(GraphError::MissingEdge(edge))
    }

    /// `(tail, head)` of an edge
    pub fn endpoints(&self, edge: EdgeId) -> Result<(VertexId, VertexId), GraphError> {
        let slot = self.edge_slot(edge)?;
        Ok((slot.tail, slot.head))
    }

    /// Tail (superclass side) of an edge
    pub fn tail(&self, edge: EdgeId) -> Result<VertexId, GraphError> {
        Ok(self.edge_slot(edge)?.tail)
    }

    /// Head (subclass side) of an edge
    pub fn head(&self, edge: EdgeId) -> Result<VertexId, GraphError> {
        Ok(self.edge_slot(edge)?.head)
    }

    /// Outgoing edges of a vertex; empty for unknown vertices
    pub fn out_edges(&self, vertex: VertexId) -> &[EdgeId] {
        self.slot(vertex)
            .map(|slot| slot.outgoing.as_slice())
            .unwrap_or(&[])
    }

    /// Incoming edges of a vertex; empty for unknown vertices
    pub fn in_edges(&self, vertex: VertexId) -> &[EdgeId] {
        self.slot(vertex)
            .map(|slot| slot.incoming.as_slice())
            .unwrap_or(&[])
    }

    /// Ids of all vertices in index order
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| VertexId(i))
    }

    /// Ids of all edges in index order
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| EdgeId(i))
    }

    /// All vertices with their payloads
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &V)> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|s| (VertexId(i), &s.data)))
    }

    /// All edges as `(id, tail, head, payload)`
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, VertexId, VertexId, &E)> + '_ {
        self.edges.iter().enumerate().filter_map(|(i, slot)| {
            slot.as_ref()
                .map(|s| (EdgeId(i), s.tail, s.head, &s.data))
        })
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.pairs.len()
    }

    /// Upper bound (exclusive) of vertex indices handed out so far
    pub fn vertex_bound(&self) -> usize {
        self.vertices.len()
    }

    /// Upper bound (exclusive) of edge indices handed out so far
    pub fn edge_bound(&self) -> usize {
        self.edges.len()
    }

    fn slot(&self, vertex: VertexId) -> Result<&VertexSlot<V>, GraphError> {
        self.vertices
            .get(vertex.0)
            .and_then(Option::as_ref)
            .ok_or(GraphError::MissingVertex(vertex))
    }

    fn slot_mut(&mut self, vertex: VertexId) -> Result<&mut VertexSlot<V>, GraphError> {
        self.vertices
            .get_mut(vertex.0)
            .and_then(Option::as_mut)
            .ok_or(GraphError::MissingVertex(vertex))
    }

    fn edge_slot(&self, edge: EdgeId) -> Result<&EdgeSlot<E>, GraphError> {
        self.edges
            .get(edge.0)
            .and_then(Option::as_ref)
            .ok_or(GraphError::MissingEdge(edge))
    }
}
