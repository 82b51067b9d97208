//! Ids for synthesized classes

use crate::error::DeduceError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Default prefix of generated ids.
const DEFAULT_PREFIX: &str = "AUTO_";

/// Source of stable ids for classes created during deduction
pub trait IdGenerator {
    /// Id for the class displayed as `display`; the same display string
    /// always gets the same id.
    fn next_id(&mut self, display: &str) -> String;
}

/// Id generator remembering every assignment so ids survive across runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedIdGenerator {
    prefix: String,
    next: u64,
    /// display -> id
    assigned: BTreeMap<String, String>,
}

impl Default for CachedIdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl CachedIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
            assigned: BTreeMap::new(),
        }
    }

    /// Load a cache written by `save`; a missing file gives a fresh generator
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DeduceError> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "No id cache found, starting fresh");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let generator: Self = serde_json::from_str(&text)?;
        info!(path = %path.display(), ids = generator.assigned.len(), "Loaded id cache");
        Ok(generator)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DeduceError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), text)?;
        debug!(path = %path.as_ref().display(), ids = self.assigned.len(), "Saved id cache");
        Ok(())
    }

    /// Make sure a generated id never collides with `id`
    pub fn reserve(&mut self, id: &str) {
        let number = id
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.parse::<u64>().ok());
        if let Some(n) = number {
            self.next = self.next.max(n + 1);
        }
    }

    /// Number of remembered assignments
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

impl IdGenerator for CachedIdGenerator {
    fn next_id(&mut self, display: &str) -> String {
        if let Some(id) = self.assigned.get(display) {
            return id.clone();
        }
        let id = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        self.assigned.insert(display.to_string(), id.clone());
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_display_same_id() {
        let mut ids = CachedIdGenerator::default();
        let a = ids.next_id("co-(A)");
        let b = ids.next_id("co-(B)");
        assert_ne!(a, b);
        assert_eq!(ids.next_id("co-(A)"), a);
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_reserve_skips_taken_ids() {
        let mut ids = CachedIdGenerator::new("gc_");
        ids.reserve("gc_41");
        ids.reserve("gc_7");
        ids.reserve("other");
        assert_eq!(ids.next_id("x"), "gc_42");
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("deducer-ids-{}.json", std::process::id()));
        let mut ids = CachedIdGenerator::default();
        let first = ids.next_id("probe (A)");
        ids.save(&path).unwrap();

        let mut loaded = CachedIdGenerator::load(&path).unwrap();
        assert_eq!(loaded, ids);
        assert_eq!(loaded.next_id("probe (A)"), first);
        assert_ne!(loaded.next_id("probe (B)"), first);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let ids = CachedIdGenerator::load("/nonexistent/deducer/ids.json").unwrap();
        assert!(ids.is_empty());
    }
}
