//! Error types for the deduction engine.

use incgraph::GraphError;
use thiserror::Error;

/// Errors that abort a deduction run or the loading of a seed.
///
/// Logical inconsistencies in the deduced database are not errors; they are
/// collected as `SanityWarning`s and the run completes.
#[derive(Error, Debug)]
pub enum DeduceError {
    /// Structural graph error: missing vertex/edge or a broken uniqueness
    /// assumption. Indicates a corrupt seed graph or a bug.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// A class id referenced by the seed does not exist.
    #[error("Unknown class: {0}")]
    UnknownClass(String),

    /// The seed is malformed (duplicate ids, self-inclusions, ...).
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DeduceError {
    /// Create an unknown class error.
    pub fn unknown_class(id: impl Into<String>) -> Self {
        Self::UnknownClass(id.into())
    }

    /// Create an invalid seed error.
    pub fn invalid_seed(msg: impl Into<String>) -> Self {
        Self::InvalidSeed(msg.into())
    }
}
