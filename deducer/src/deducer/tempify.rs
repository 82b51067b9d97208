//! Pruning of redundant classes created during deduction

use super::Deducer;
use crate::class::Shape;
use crate::error::DeduceError;
use incgraph::galg::strongly_connected_components;
use incgraph::VertexId;
use std::collections::HashSet;
use tracing::{debug, info};

impl Deducer<'_> {
    /// Among equivalent forbidden-subgraph classes keep only the nicest:
    /// the seed classes if there are any, otherwise the one with the fewest
    /// forbidden graphs. The others, and every class composed of a
    /// temporary class, become temporary. Seed classes never do.
    ///
    /// Returns the number of newly marked classes.
    pub fn tempify(&mut self) -> Result<usize, DeduceError> {
        let before = self.temporaries.len();

        for component in strongly_connected_components(&self.graph)? {
            if component.len() < 2 {
                continue;
            }
            let mut forbidden: Vec<(usize, VertexId)> = Vec::new();
            for &vertex in component.iter() {
                if self.temporaries.contains(&vertex) {
                    continue;
                }
                if let Shape::Forbidden(set) = self.shape(vertex)? {
                    forbidden.push((set.len(), vertex));
                }
            }
            if forbidden.len() < 2 {
                continue;
            }

            let seeds: HashSet<VertexId> = forbidden
                .iter()
                .map(|&(_, vertex)| vertex)
                .filter(|vertex| self.seed.contains(vertex))
                .collect();
            let keep: HashSet<VertexId> = if seeds.is_empty() {
                forbidden.iter().min().map(|&(_, vertex)| vertex).into_iter().collect()
            } else {
                seeds
            };
            for (_, vertex) in forbidden {
                if !keep.contains(&vertex) {
                    debug!(class = %self.graph.vertex(vertex)?.name, "Equivalent forbidden class marked temporary");
                    self.temporaries.insert(vertex);
                }
            }
        }

        loop {
            let spread: Vec<VertexId> = self
                .graph
                .vertices()
                .filter(|(vertex, class)| {
                    !self.temporaries.contains(vertex)
                        && !self.seed.contains(vertex)
                        && class.shape.members().iter().any(|m| self.temporaries.contains(m))
                })
                .map(|(vertex, _)| vertex)
                .collect();
            if spread.is_empty() {
                break;
            }
            self.temporaries.extend(spread);
        }

        let marked = self.temporaries.len() - before;
        info!(marked, temporaries = self.temporaries.len(), "Tempify complete");
        Ok(marked)
    }

    /// Delete every temporary class with its edges.
    ///
    /// Returns the number of removed classes.
    pub fn remove_temporaries(&mut self) -> Result<usize, DeduceError> {
        let mut doomed: Vec<VertexId> = self.temporaries.drain().collect();
        doomed.sort_unstable();
        let mut removed = 0;
        for vertex in doomed {
            if self.graph.contains_vertex(vertex) {
                self.graph.remove_vertex(vertex)?;
                removed += 1;
            }
        }

        let graph = &self.graph;
        self.shapes.retain(|_, vertex| graph.contains_vertex(*vertex));
        for pairs in [&mut self.complements, &mut self.graph_complements] {
            pairs.retain(|vertex, paired| {
                paired.retain(|other| graph.contains_vertex(*other));
                graph.contains_vertex(*vertex) && !paired.is_empty()
            });
        }
        self.created.retain(|vertex| graph.contains_vertex(*vertex));

        info!(
            removed,
            classes = self.graph.vertex_count(),
            inclusions = self.graph.edge_count(),
            "Removed temporary classes"
        );
        Ok(removed)
    }
}
