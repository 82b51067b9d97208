//! JSON seed files
//!
//! A seed lists the small-graph table, the classes (shapes reference other
//! classes by id) and the known inclusions. The same format is written back
//! for the deduced database.

use crate::class::{ClassGraph, Confidence, GraphClass, Hereditariness, Inclusion, Shape};
use crate::error::DeduceError;
use crate::structure::SmallGraphTable;
use incgraph::{Digraph, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Small-graph containments and complements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SmallGraphSeed {
    /// `(small, large)`: small is an induced subgraph of large
    #[serde(default)]
    pub subgraphs: Vec<(String, String)>,
    #[serde(default)]
    pub complements: Vec<(String, String)>,
}

impl SmallGraphSeed {
    pub fn table(&self) -> SmallGraphTable {
        let mut table = SmallGraphTable::new();
        for (small, large) in &self.subgraphs {
            table.add_subgraph(small.as_str(), large.as_str());
        }
        for (a, b) in &self.complements {
            table.add_complement(a.as_str(), b.as_str());
        }
        table
    }

    pub fn from_table(table: &SmallGraphTable) -> Self {
        Self {
            subgraphs: table.subgraph_pairs(),
            complements: table.complement_pairs(),
        }
    }
}

/// Shape of a seed class; composite shapes name their members by id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeedShape {
    #[default]
    Base,
    Forbidden { graphs: BTreeSet<String> },
    Complement { of: String },
    Hereditary { level: Hereditariness, of: String },
    Intersect { of: BTreeSet<String> },
    Union { of: BTreeSet<String> },
    Probe { of: String },
    Clique { of: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedClass {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub shape: SeedShape,
    #[serde(default)]
    pub hereditariness: Hereditariness,
    #[serde(default)]
    pub self_complementary: bool,
    #[serde(default)]
    pub clique_fixed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedInclusion {
    #[serde(rename = "super")]
    pub sup: String,
    pub sub: String,
    #[serde(default)]
    pub proper: bool,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub refs: Vec<String>,
}

/// A whole seed (or result) file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub smallgraphs: SmallGraphSeed,
    pub classes: Vec<SeedClass>,
    #[serde(default)]
    pub inclusions: Vec<SeedInclusion>,
}

impl SeedFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DeduceError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let seed: Self = serde_json::from_str(&text)?;
        info!(
            path = %path.display(),
            classes = seed.classes.len(),
            inclusions = seed.inclusions.len(),
            "Loaded seed"
        );
        Ok(seed)
    }

    pub fn to_json(&self) -> Result<String, DeduceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the class database.
    ///
    /// Classes are added first so shapes may reference classes listed later.
    /// Repeated inclusions between the same pair are merged.
    pub fn build(&self) -> Result<ClassGraph, DeduceError> {
        let mut graph: ClassGraph = Digraph::new();
        let mut index: HashMap<&str, VertexId> = HashMap::with_capacity(self.classes.len());

        for class in &self.classes {
            let name = class.name.clone().unwrap_or_else(|| class.id.clone());
            let vertex = graph.add_vertex(GraphClass {
                id: class.id.clone(),
                name,
                shape: Shape::Base,
                hereditariness: class.hereditariness,
                self_complementary: class.self_complementary,
                clique_fixed: class.clique_fixed,
            });
            if index.insert(class.id.as_str(), vertex).is_some() {
                return Err(DeduceError::invalid_seed(format!("duplicate class id {}", class.id)));
            }
        }

        let resolve = |id: &str| {
            index
                .get(id)
                .copied()
                .ok_or_else(|| DeduceError::unknown_class(id))
        };
        let resolve_set = |ids: &BTreeSet<String>| -> Result<BTreeSet<VertexId>, DeduceError> {
            if ids.is_empty() {
                return Err(DeduceError::invalid_seed("empty member set"));
            }
            ids.iter().map(|id| resolve(id.as_str())).collect()
        };

        for class in &self.classes {
            let shape = match &class.shape {
                SeedShape::Base => continue,
                SeedShape::Forbidden { graphs } if graphs.is_empty() => {
                    return Err(DeduceError::invalid_seed(format!("{} forbids nothing", class.id)))
                }
                SeedShape::Forbidden { graphs } => Shape::Forbidden(graphs.clone()),
                SeedShape::Complement { of } => Shape::Complement(resolve(of.as_str())?),
                SeedShape::Hereditary { level, of } => Shape::Hereditary {
                    kind: *level,
                    base: resolve(of.as_str())?,
                },
                SeedShape::Intersect { of } => Shape::Intersect(resolve_set(of)?),
                SeedShape::Union { of } => Shape::Union(resolve_set(of)?),
                SeedShape::Probe { of } => Shape::Probe(resolve(of.as_str())?),
                SeedShape::Clique { of } => Shape::Clique(resolve(of.as_str())?),
            };
            let vertex = resolve(class.id.as_str())?;
            graph.vertex_mut(vertex)?.shape = shape;
        }

        for seed in &self.inclusions {
            let sup = resolve(seed.sup.as_str())?;
            let sub = resolve(seed.sub.as_str())?;
            if sup == sub {
                return Err(DeduceError::invalid_seed(format!("{} includes itself", seed.sup)));
            }

            match graph.find_edge(sup, sub) {
                Some(edge) => {
                    debug!(sup = %seed.sup, sub = %seed.sub, "Merging repeated inclusion");
                    let inclusion = graph.edge_mut(edge)?;
                    inclusion.proper |= seed.proper;
                    inclusion.confidence = inclusion.confidence.max(seed.confidence);
                    for reference in &seed.refs {
                        if !inclusion.refs.contains(reference) {
                            inclusion.refs.push(reference.clone());
                        }
                    }
                }
                None => {
                    let mut inclusion = Inclusion::input(seed.confidence);
                    inclusion.proper = seed.proper;
                    inclusion.refs = seed.refs.clone();
                    graph.add_edge(sup, sub, inclusion)?;
                }
            }
        }

        Ok(graph)
    }

    /// Describe a class database in seed form
    pub fn export(graph: &ClassGraph, smallgraphs: SmallGraphSeed) -> Result<Self, DeduceError> {
        let id = |v: VertexId| -> Result<String, DeduceError> { Ok(graph.vertex(v)?.id.clone()) };
        let ids = |set: &BTreeSet<VertexId>| -> Result<BTreeSet<String>, DeduceError> {
            set.iter().map(|v| id(*v)).collect()
        };

        let mut classes = Vec::with_capacity(graph.vertex_count());
        for (_, class) in graph.vertices() {
            let shape = match &class.shape {
                Shape::Base => SeedShape::Base,
                Shape::Forbidden(graphs) => SeedShape::Forbidden { graphs: graphs.clone() },
                Shape::Complement(v) => SeedShape::Complement { of: id(*v)? },
                Shape::Hereditary { kind, base } => SeedShape::Hereditary {
                    level: *kind,
                    of: id(*base)?,
                },
                Shape::Intersect(set) => SeedShape::Intersect { of: ids(set)? },
                Shape::Union(set) => SeedShape::Union { of: ids(set)? },
                Shape::Probe(v) => SeedShape::Probe { of: id(*v)? },
                Shape::Clique(v) => SeedShape::Clique { of: id(*v)? },
            };
            classes.push(SeedClass {
                id: class.id.clone(),
                name: Some(class.name.clone()),
                shape,
                hereditariness: class.hereditariness,
                self_complementary: class.self_complementary,
                clique_fixed: class.clique_fixed,
            });
        }

        let mut inclusions = Vec::with_capacity(graph.edge_count());
        for (_, sup, sub, inclusion) in graph.edges() {
            inclusions.push(SeedInclusion {
                sup: id(sup)?,
                sub: id(sub)?,
                proper: inclusion.proper,
                confidence: inclusion.confidence,
                refs: inclusion.refs.clone(),
            });
        }

        Ok(Self {
            smallgraphs,
            classes,
            inclusions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::SmallGraphs;

    const SEED: &str = r#"{
        "smallgraphs": {
            "subgraphs": [["P4", "P5"]],
            "complements": [["C4", "2K2"]]
        },
        "classes": [
            { "id": "gc_1", "name": "perfect" },
            { "id": "gc_2", "shape": { "kind": "forbidden", "graphs": ["P4"] } },
            { "id": "gc_3", "shape": { "kind": "union", "of": ["gc_1", "gc_2"] } },
            { "id": "gc_4", "shape": { "kind": "hereditary", "level": "induced", "of": "gc_5" } },
            { "id": "gc_5", "self_complementary": true }
        ],
        "inclusions": [
            { "super": "gc_1", "sub": "gc_2", "proper": true, "refs": ["ref_1"] },
            { "super": "gc_1", "sub": "gc_2", "confidence": "low", "refs": ["ref_2"] },
            { "super": "gc_4", "sub": "gc_5", "confidence": "medium" }
        ]
    }"#;

    #[test]
    fn test_build() {
        let seed: SeedFile = serde_json::from_str(SEED).unwrap();
        let graph = seed.build().unwrap();
        assert_eq!(graph.vertex_count(), 5);
        assert_eq!(graph.edge_count(), 2);

        let ids: HashMap<String, VertexId> = graph.vertices().map(|(v, c)| (c.id.clone(), v)).collect();
        let union = graph.vertex(ids["gc_3"]).unwrap();
        assert_eq!(
            union.shape,
            Shape::Union([ids["gc_1"], ids["gc_2"]].into_iter().collect())
        );
        assert_eq!(graph.vertex(ids["gc_1"]).unwrap().name, "perfect");
        assert_eq!(graph.vertex(ids["gc_2"]).unwrap().name, "gc_2");
        assert!(graph.vertex(ids["gc_5"]).unwrap().self_complementary);

        // Repeated inclusion merged
        let e = graph.find_edge(ids["gc_1"], ids["gc_2"]).unwrap();
        let merged = graph.edge(e).unwrap();
        assert!(merged.proper);
        assert_eq!(merged.confidence, Confidence::Highest);
        assert_eq!(merged.refs, vec!["ref_1".to_string(), "ref_2".to_string()]);

        let table = seed.smallgraphs.table();
        assert!(table.is_induced_subgraph("P4", "P5"));
        assert_eq!(table.complement("2K2").as_deref(), Some("C4"));
    }

    #[test]
    fn test_unknown_class() {
        let seed = SeedFile {
            classes: vec![SeedClass {
                id: "gc_1".into(),
                name: None,
                shape: SeedShape::Probe { of: "gc_9".into() },
                hereditariness: Hereditariness::Unknown,
                self_complementary: false,
                clique_fixed: false,
            }],
            ..SeedFile::default()
        };
        assert!(matches!(seed.build(), Err(DeduceError::UnknownClass(id)) if id == "gc_9"));
    }

    #[test]
    fn test_rejects_duplicates_and_self_inclusions() {
        let base = |id: &str| SeedClass {
            id: id.into(),
            name: None,
            shape: SeedShape::Base,
            hereditariness: Hereditariness::Unknown,
            self_complementary: false,
            clique_fixed: false,
        };
        let duplicate = SeedFile {
            classes: vec![base("a"), base("a")],
            ..SeedFile::default()
        };
        assert!(matches!(duplicate.build(), Err(DeduceError::InvalidSeed(_))));

        let looping = SeedFile {
            classes: vec![base("a")],
            inclusions: vec![SeedInclusion {
                sup: "a".into(),
                sub: "a".into(),
                proper: false,
                confidence: Confidence::Highest,
                refs: vec![],
            }],
            ..SeedFile::default()
        };
        assert!(matches!(looping.build(), Err(DeduceError::InvalidSeed(_))));
    }

    #[test]
    fn test_export_round_trip() {
        let seed: SeedFile = serde_json::from_str(SEED).unwrap();
        let graph = seed.build().unwrap();
        let exported = SeedFile::export(&graph, seed.smallgraphs.clone()).unwrap();
        let rebuilt = exported.build().unwrap();

        assert_eq!(rebuilt.vertex_count(), graph.vertex_count());
        assert_eq!(rebuilt.edge_count(), graph.edge_count());
        let json = exported.to_json().unwrap();
        assert!(json.contains("\"super\": \"gc_1\""));
        assert!(json.contains("\"kind\": \"hereditary\""));
    }
}
