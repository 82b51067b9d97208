//! Reference stamping

use crate::class::ClassGraph;
use incgraph::{EdgeId, GraphError};

/// Receiver of human readable justifications for inclusions
pub trait RefSink {
    fn add_ref(&mut self, edge: EdgeId, reference: &str) -> Result<(), GraphError>;
}

impl RefSink for ClassGraph {
    /// Appends to the inclusion's references unless already present
    fn add_ref(&mut self, edge: EdgeId, reference: &str) -> Result<(), GraphError> {
        let inclusion = self.edge_mut(edge)?;
        if !inclusion.refs.iter().any(|r| r == reference) {
            inclusion.refs.push(reference.to_string());
        }
        Ok(())
    }
}
