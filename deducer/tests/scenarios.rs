//! End-to-end deduction runs on small seed databases.

use std::collections::{BTreeSet, HashSet};

use deducer::{
    CachedIdGenerator, ClassGraph, Confidence, Deducer, DeducerConfig, GraphClass, Inclusion, Rule,
    SanityWarning, SeedFile, Shape, SmallGraphTable,
};
use incgraph::galg::transitive_reduction;
use incgraph::{Digraph, VertexId};

fn forbidden(id: &str, graphs: &[&str]) -> GraphClass {
    let set = graphs.iter().map(|g| g.to_string()).collect();
    GraphClass::new(id, id, Shape::Forbidden(set))
}

fn forbidden_shape(graphs: &[&str]) -> Shape {
    Shape::Forbidden(graphs.iter().map(|g| g.to_string()).collect())
}

fn edge_set(graph: &ClassGraph) -> BTreeSet<(String, String)> {
    graph
        .edges()
        .map(|(_, sup, sub, _)| {
            (
                graph.vertex(sup).unwrap().id.clone(),
                graph.vertex(sub).unwrap().id.clone(),
            )
        })
        .collect()
}

fn pairs(list: &[(&str, &str)]) -> BTreeSet<(String, String)> {
    list.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
}

fn assert_closed(graph: &ClassGraph) {
    for (_, a, b, _) in graph.edges() {
        for &next in graph.out_edges(b) {
            let c = graph.head(next).unwrap();
            if c != a {
                assert!(graph.contains_edge(a, c), "{a} -> {b} -> {c} not closed");
            }
        }
    }
}

fn chain() -> (ClassGraph, Vec<VertexId>) {
    let mut g: ClassGraph = Digraph::new();
    let v: Vec<VertexId> = ["A", "B", "C"].iter().map(|id| g.add_vertex(GraphClass::base(*id))).collect();
    g.add_edge(v[0], v[1], Inclusion::input(Confidence::Highest)).unwrap();
    g.add_edge(v[1], v[2], Inclusion::input(Confidence::Highest)).unwrap();
    (g, v)
}

#[test]
fn test_linear_chain_closure_and_reduction() {
    let (g, v) = chain();
    let table = SmallGraphTable::new();
    let mut ids = CachedIdGenerator::default();
    let mut d = Deducer::new(g, &table, &mut ids, DeducerConfig::default());
    d.find_trivial_inclusions().unwrap();
    assert!(d.graph().contains_edge(v[0], v[2]));

    let mut graph = d.into_graph();
    let removed = transitive_reduction(&mut graph).unwrap();
    assert_eq!(removed, vec![(v[0], v[2])]);
    assert_eq!(edge_set(&graph), pairs(&[("A", "B"), ("B", "C")]));
}

#[test]
fn test_union_rule() {
    let mut g: ClassGraph = Digraph::new();
    let a = g.add_vertex(GraphClass::base("A"));
    let b = g.add_vertex(GraphClass::base("B"));
    let u = g.add_vertex(GraphClass::new("U", "U", Shape::Union(BTreeSet::from([a, b]))));
    let x = g.add_vertex(GraphClass::base("X"));
    g.add_edge(a, x, Inclusion::input(Confidence::Highest)).unwrap();
    g.add_edge(b, x, Inclusion::input(Confidence::Highest)).unwrap();
    let table = SmallGraphTable::new();
    let mut ids = CachedIdGenerator::default();
    let mut d = Deducer::new(g, &table, &mut ids, DeducerConfig::default());

    d.prepare().unwrap();
    let fresh: HashSet<VertexId> = d.graph().vertex_ids().collect();
    d.find_trivial_once(&fresh).unwrap();

    assert!(d.graph().contains_edge(u, x));
    assert!(!d.graph().contains_edge(x, u));
}

#[test]
fn test_complement_rule_adds_nothing_else() {
    let mut g: ClassGraph = Digraph::new();
    let a = g.add_vertex(GraphClass::base("A"));
    let b = g.add_vertex(GraphClass::base("B"));
    g.add_vertex(GraphClass::new("coA", "coA", Shape::Complement(a)));
    g.add_vertex(GraphClass::new("coB", "coB", Shape::Complement(b)));
    g.add_edge(a, b, Inclusion::input(Confidence::Highest)).unwrap();
    let table = SmallGraphTable::new();
    let mut ids = CachedIdGenerator::default();
    let mut d = Deducer::new(g, &table, &mut ids, DeducerConfig::default().with_trace(true));

    let report = d.find_trivial_inclusions().unwrap();
    assert!(report.is_clean());
    assert_eq!(d.remove_temporaries().unwrap(), 0);
    assert_eq!(edge_set(d.graph()), pairs(&[("A", "B"), ("coB", "coA")]));

    assert_eq!(d.stamp_references().unwrap(), 1);
    let graph = d.into_graph();
    let stamped = graph
        .edges()
        .find(|(_, _, _, inclusion)| !inclusion.refs.is_empty())
        .map(|(_, _, _, inclusion)| inclusion.refs.clone())
        .unwrap();
    assert_eq!(stamped, vec!["trivial: derived via complement of A ⊇ B".to_string()]);
}

#[test]
fn test_confidence_tiering() {
    let mut g: ClassGraph = Digraph::new();
    let a = g.add_vertex(GraphClass::base("A"));
    let b = g.add_vertex(GraphClass::base("B"));
    let c = g.add_vertex(GraphClass::base("C"));
    g.add_edge(a, b, Inclusion::input(Confidence::Highest)).unwrap();
    g.add_edge(b, c, Inclusion::input(Confidence::Unpublished).proper().with_ref("preprint"))
        .unwrap();
    let table = SmallGraphTable::new();
    let mut ids = CachedIdGenerator::default();
    let mut d = Deducer::new(g, &table, &mut ids, DeducerConfig::default().with_trace(true));

    d.prepare().unwrap();
    assert!(!d.graph().contains_edge(b, c));
    assert!(!d.graph().contains_edge(a, c));

    d.find_trivial_inclusions_one_level().unwrap();
    assert!(d.lower_tier().unwrap());
    assert_eq!(d.tier(), Confidence::Unpublished);
    d.find_trivial_inclusions_one_level().unwrap();
    assert!(!d.lower_tier().unwrap());

    let graph = d.graph();
    let bc = graph.edge(graph.find_edge(b, c).unwrap()).unwrap();
    assert!(bc.proper);
    assert_eq!(bc.refs, vec!["preprint".to_string()]);
    assert_eq!(bc.confidence, Confidence::Unpublished);

    let ac_edge = graph.find_edge(a, c).unwrap();
    let ac = graph.edge(ac_edge).unwrap();
    assert!(ac.proper);
    assert_eq!(ac.confidence, Confidence::Unpublished);

    let explanation = d.explain(ac_edge).unwrap();
    assert!(explanation.starts_with("A ⊇ C [transitivity]"));
    assert!(explanation.contains("\n  A ⊇ B [input]"));
    assert!(explanation.contains("\n  B ⊇ C [input]"));
}

#[test]
fn test_forbidden_decomposition() {
    let mut g: ClassGraph = Digraph::new();
    let f = g.add_vertex(forbidden("F", &["C4", "P4"]));
    let table = SmallGraphTable::new();
    let mut ids = CachedIdGenerator::default();
    let mut d = Deducer::new(g, &table, &mut ids, DeducerConfig::default());

    let report = d.find_trivial_inclusions().unwrap();
    assert!(report.is_clean(), "{:?}", report.warnings());

    let c4 = d.vertex_for(&forbidden_shape(&["C4"])).unwrap();
    let p4 = d.vertex_for(&forbidden_shape(&["P4"])).unwrap();
    let meet = d.vertex_for(&Shape::Intersect(BTreeSet::from([c4, p4]))).unwrap();
    assert!(d.is_temporary(meet));
    assert!(d.graph().contains_edge(f, meet));
    assert!(d.graph().contains_edge(meet, f));
    assert_closed(d.graph());

    assert_eq!(d.remove_temporaries().unwrap(), 1);
    let graph = d.graph();
    assert_eq!(graph.vertex_count(), 3);
    for piece in [c4, p4] {
        let edge = graph.find_edge(piece, f).unwrap();
        assert!(graph.edge(edge).unwrap().proper);
    }
    assert!(!graph.contains_edge(c4, p4));
    assert!(!graph.contains_edge(p4, c4));
}

#[test]
fn test_tempify_keeps_nicest_forbidden_class() {
    let mut g: ClassGraph = Digraph::new();
    let p = g.add_vertex(forbidden("P", &["P4"]));
    let c = g.add_vertex(forbidden("C", &["C4"]));
    let c5 = g.add_vertex(forbidden("C5F", &["C5"]));
    let i1 = g.add_vertex(GraphClass::new("I1", "I1", Shape::Intersect(BTreeSet::from([p, c]))));
    let i2 = g.add_vertex(GraphClass::new("I2", "I2", Shape::Intersect(BTreeSet::from([p, c, c5]))));
    let mut table = SmallGraphTable::new();
    table.add_subgraph("P4", "C5");
    let mut ids = CachedIdGenerator::default();
    let mut d = Deducer::new(g, &table, &mut ids, DeducerConfig::default());

    let report = d.find_trivial_inclusions().unwrap();
    assert_closed(d.graph());

    let m1 = d.vertex_for(&forbidden_shape(&["P4", "C4"])).unwrap();
    let m2 = d.vertex_for(&forbidden_shape(&["P4", "C4", "C5"])).unwrap();
    assert!(!d.is_temporary(m1));
    assert!(d.is_temporary(m2));
    assert!(!d.is_temporary(i1));
    assert!(!d.is_temporary(i2));
    assert_eq!(d.graph().vertex(m1).unwrap().name, "{C4,P4}-free");

    // I1 and I2 were unrelated in the seed
    assert!(report
        .iter()
        .any(|w| *w == SanityWarning::SccMerged { classes: vec!["I1".to_string(), "I2".to_string()] }));

    let c5p = d.graph().find_edge(c5, p).unwrap();
    assert!(d.graph().edge(c5p).unwrap().proper);

    d.remove_temporaries().unwrap();
    assert!(d.vertex_for(&forbidden_shape(&["P4", "C4", "C5"])).is_none());
    assert!(d.graph().contains_edge(m1, i2));
    assert!(d.graph().contains_edge(i2, m1));
    assert_closed(d.graph());
}

#[test]
fn test_wrong_seed_inclusion_is_reported() {
    let mut g: ClassGraph = Digraph::new();
    let c4 = g.add_vertex(forbidden("C4F", &["C4"]));
    let p4 = g.add_vertex(forbidden("P4F", &["P4"]));
    g.add_edge(c4, p4, Inclusion::input(Confidence::Highest)).unwrap();
    let table = SmallGraphTable::new();
    let mut ids = CachedIdGenerator::default();
    let mut d = Deducer::new(g, &table, &mut ids, DeducerConfig::default());

    let report = d.find_trivial_inclusions().unwrap();
    assert!(report.iter().any(|w| *w
        == SanityWarning::UnconfirmedForbiddenInclusion {
            sup: "C4F".to_string(),
            sub: "P4F".to_string()
        }));
}

#[test]
fn test_equivalent_seed_classes_are_reported() {
    let mut g: ClassGraph = Digraph::new();
    let first = g.add_vertex(forbidden("F1", &["C4"]));
    let second = g.add_vertex(forbidden("F2", &["C4"]));
    let table = SmallGraphTable::new();
    let mut ids = CachedIdGenerator::default();
    let mut d = Deducer::new(g, &table, &mut ids, DeducerConfig::default());

    let report = d.find_trivial_inclusions().unwrap();
    assert_eq!(
        report.warnings(),
        &[SanityWarning::SccMerged { classes: vec!["F1".to_string(), "F2".to_string()] }]
    );
    assert!(!d.is_temporary(first));
    assert!(!d.is_temporary(second));
}

#[test]
fn test_reduction_passes() {
    let (g, v) = chain();
    let table = SmallGraphTable::new();

    let mut ids = CachedIdGenerator::default();
    let mut d = Deducer::new(g.clone(), &table, &mut ids, DeducerConfig::default());
    d.find_trivial_inclusions().unwrap();
    assert_eq!(d.remove_superfluous_by_priority().unwrap(), 1);
    assert!(!d.graph().contains_edge(v[0], v[2]));

    let mut ids = CachedIdGenerator::default();
    let mut d = Deducer::new(g.clone(), &table, &mut ids, DeducerConfig::default());
    d.find_trivial_inclusions().unwrap();
    assert_eq!(d.remove_superfluous_weighted().unwrap(), 1);
    assert_eq!(edge_set(d.graph()), pairs(&[("A", "B"), ("B", "C")]));

    let mut ids = CachedIdGenerator::default();
    let mut d = Deducer::new(g, &table, &mut ids, DeducerConfig::default());
    d.find_trivial_inclusions().unwrap();
    assert_eq!(d.remove_superfluous_between_sccs().unwrap(), 1);
}

#[test]
fn test_self_complementary_classes_stay_apart() {
    let mut g: ClassGraph = Digraph::new();
    let perfect = g.add_vertex(GraphClass::base("perfect").self_complementary());
    let cograph = g.add_vertex(GraphClass::base("cograph").self_complementary());
    let e = g
        .add_edge(perfect, cograph, Inclusion::input(Confidence::Highest).proper())
        .unwrap();
    let table = SmallGraphTable::new();
    let mut ids = CachedIdGenerator::default();
    let mut d = Deducer::new(g, &table, &mut ids, DeducerConfig::default());

    let report = d.find_trivial_inclusions().unwrap();
    assert!(report.is_clean(), "{:?}", report.warnings());
    assert!(!d.graph().contains_edge(cograph, perfect));
    assert!(d.graph().edge(e).unwrap().proper);
    assert_eq!(d.graph().vertex_count(), 2);
}

#[test]
fn test_forbidden_graph_complements() {
    let mut g: ClassGraph = Digraph::new();
    let p5 = g.add_vertex(forbidden("P5F", &["P5"]));
    let p4 = g.add_vertex(forbidden("P4F", &["P4"]));
    let house = g.add_vertex(forbidden("houseF", &["house"]));
    let mut table = SmallGraphTable::new();
    table.add_subgraph("P4", "P5");
    table.add_complement("P5", "house");
    table.add_complement("P4", "P4");
    let mut ids = CachedIdGenerator::default();
    let mut d = Deducer::new(g, &table, &mut ids, DeducerConfig::default());

    let report = d.find_trivial_inclusions().unwrap();
    assert!(!report.iter().any(|w| matches!(w, SanityWarning::SccMerged { .. })));

    let graph = d.graph();
    let direct = graph.find_edge(p5, p4).unwrap();
    assert!(graph.edge(direct).unwrap().proper);
    // Complementing every graph keeps the direction
    let image = graph.find_edge(house, p4).unwrap();
    assert_eq!(graph.edge(image).unwrap().origin, Rule::GraphComplement);
    assert!(graph.edge(image).unwrap().proper);
    assert!(!graph.contains_edge(p4, house));
    assert!(!graph.contains_edge(p4, p5));
}

#[test]
fn test_seed_file_run() {
    let json = r#"{
        "smallgraphs": { "subgraphs": [["P4", "C5"]], "complements": [["C5", "C5"]] },
        "classes": [
            { "id": "gc_1", "name": "C5-free", "shape": { "kind": "forbidden", "graphs": ["C5"] } },
            { "id": "gc_2", "name": "P4-free", "shape": { "kind": "forbidden", "graphs": ["P4"] } },
            { "id": "gc_3", "name": "co-(P4-free)", "shape": { "kind": "complement", "of": "gc_2" } },
            { "id": "gc_4", "name": "co-(C5-free)", "shape": { "kind": "complement", "of": "gc_1" } }
        ],
        "inclusions": []
    }"#;
    let seed: SeedFile = serde_json::from_str(json).unwrap();
    let graph = seed.build().unwrap();
    let table = seed.smallgraphs.table();
    let mut ids = CachedIdGenerator::default();
    let mut d = Deducer::new(graph, &table, &mut ids, DeducerConfig::default());

    d.find_trivial_inclusions().unwrap();
    d.remove_temporaries().unwrap();
    d.stamp_references().unwrap();
    let graph = d.into_graph();

    let edges = edge_set(&graph);
    assert!(edges.contains(&("gc_1".to_string(), "gc_2".to_string())));
    // Set complements reverse the inclusion
    assert!(edges.contains(&("gc_3".to_string(), "gc_4".to_string())));
    assert!(!edges.contains(&("gc_4".to_string(), "gc_3".to_string())));
    // The set complement of C5-free is not C5-free
    assert!(!edges.contains(&("gc_1".to_string(), "gc_4".to_string())));
    assert!(!edges.contains(&("gc_4".to_string(), "gc_1".to_string())));

    let exported = SeedFile::export(&graph, seed.smallgraphs.clone()).unwrap();
    assert_eq!(exported.classes.len(), graph.vertex_count());
    let rebuilt = exported.build().unwrap();
    assert_eq!(edge_set(&rebuilt), edges);
}
