//! Incgraph - directed graphs for inclusion databases
//!
//! The building blocks used by the deduction engine:
//! - `Digraph`: arena graph with stable vertex/edge indices and O(1) edge lookup
//! - `Annotation`: side table attaching transient data to vertices and edges
//! - `Walker`: BFS/DFS state machine with pluggable direction and hooks
//! - `galg`: SCCs, transitive closure/reduction, shortest paths

pub mod annotation;
pub mod error;
pub mod galg;
pub mod graph;
pub mod walker;

pub use annotation::Annotation;
pub use error::GraphError;
pub use graph::{Digraph, EdgeId, VertexId};
pub use walker::{Direction, InitCode, Order, Status, Visitor, Walker, WalkerInfo};
