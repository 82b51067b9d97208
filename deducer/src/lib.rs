//! Inclusion deduction for a database of graph classes
//!
//! Classes are defined by their shape (forbidden induced subgraphs,
//! complements, unions, intersections, hereditary closures, probe and clique
//! classes) and related by inclusion edges pointing from the superclass to the
//! subclass. The [`Deducer`] closes a seed database under transitivity and
//! the structural rules, finds proper inclusions, prunes redundant classes and
//! reports inconsistencies.

pub mod class;
pub mod config;
pub mod deducer;
pub mod error;
pub mod idgen;
pub mod refs;
pub mod seed;
pub mod structure;
pub mod trace;

pub use class::{ClassGraph, Confidence, GraphClass, Hereditariness, Inclusion, Shape};
pub use config::{DeducerConfig, ReduceMode, RunSettings};
pub use deducer::{Deducer, KeeperPriority, SanityReport, SanityWarning};
pub use error::DeduceError;
pub use idgen::{CachedIdGenerator, IdGenerator};
pub use refs::RefSink;
pub use seed::SeedFile;
pub use structure::{SmallGraphTable, SmallGraphs, Structure};
pub use trace::{Rule, Trace, TraceData};
