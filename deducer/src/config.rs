//! Configuration from environment variables.

use std::env;
use std::path::PathBuf;
use tracing::warn;

/// Default id of the class of clique graphs.
const DEFAULT_CLIQUE_CLASS: &str = "gc_141";

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeducerConfig {
    /// Keep provenance records for every deduced edge.
    pub trace: bool,
    /// Id of the class of clique graphs, used by the clique properness rule.
    pub clique_class_id: String,
    /// Run the sanity checks after deduction.
    pub sanity: bool,
}

impl Default for DeducerConfig {
    fn default() -> Self {
        Self {
            trace: false,
            clique_class_id: DEFAULT_CLIQUE_CLASS.to_string(),
            sanity: true,
        }
    }
}

impl DeducerConfig {
    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DEDUCER_TRACE`: record provenance (default: false)
    /// - `DEDUCER_CLIQUE_CLASS`: id of the clique graphs class (default: gc_141)
    /// - `DEDUCER_SANITY`: run sanity checks (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            trace: env_flag("DEDUCER_TRACE", defaults.trace),
            clique_class_id: env::var("DEDUCER_CLIQUE_CLASS").unwrap_or(defaults.clique_class_id),
            sanity: env_flag("DEDUCER_SANITY", defaults.sanity),
        }
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

/// Superfluous-edge pass applied before export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReduceMode {
    #[default]
    None,
    /// Keeper-weighted shortest paths
    Weighted,
    /// Strict per-priority BFS
    Priority,
    /// Only edges between different SCCs
    Scc,
}

impl ReduceMode {
    /// Parse a mode name (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "none" | "" => Some(Self::None),
            "weighted" => Some(Self::Weighted),
            "priority" => Some(Self::Priority),
            "scc" => Some(Self::Scc),
            _ => None,
        }
    }

    /// Parse from `DEDUCER_REDUCE`, defaulting to `none` if unset or invalid.
    fn from_env() -> Self {
        let value = env::var("DEDUCER_REDUCE").unwrap_or_default();
        Self::parse(&value).unwrap_or_else(|| {
            warn!(value = %value, "Invalid DEDUCER_REDUCE, defaulting to 'none'");
            Self::None
        })
    }
}

/// Settings of the `deducer` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub seed: PathBuf,
    /// Result file; stdout if unset
    pub output: Option<PathBuf>,
    pub id_cache: Option<PathBuf>,
    pub reduce: ReduceMode,
}

impl RunSettings {
    /// Load from environment variables, with the seed path optionally given
    /// on the command line.
    ///
    /// # Environment Variables
    ///
    /// - `DEDUCER_SEED`: seed JSON path (required unless passed as argument)
    /// - `DEDUCER_OUTPUT`: result JSON path (default: stdout)
    /// - `DEDUCER_ID_CACHE`: id cache JSON path (default: none)
    /// - `DEDUCER_REDUCE`: none, weighted, priority or scc (default: none)
    pub fn from_env(seed_arg: Option<String>) -> Option<Self> {
        let seed = seed_arg.or_else(|| env::var("DEDUCER_SEED").ok())?;
        Some(Self {
            seed: PathBuf::from(seed),
            output: env::var("DEDUCER_OUTPUT").ok().map(PathBuf::from),
            id_cache: env::var("DEDUCER_ID_CACHE").ok().map(PathBuf::from),
            reduce: ReduceMode::from_env(),
        })
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(value) => match value.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                warn!(variable = name, value = %value, default, "Invalid boolean, using default");
                default
            }
        },
        Err(_) => default,
    }
}
