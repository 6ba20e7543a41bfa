use std::collections::BTreeSet;

use pipewatch::graph::env::{EnvValue, KEY_BATCH_NUMBER, KEY_INIT_MODEL_CLASS_NUM};
use pipewatch::graph::{Graph, Node};
use pipewatch::types::NodeKind;
use pipewatch_test_utils::{builders::job_graph_of, init_tracing};

fn job(path: &str) -> Node {
    Node::new(path, NodeKind::Job)
}

#[test]
fn fan_out_is_a_single_component() {
    init_tracing();
    let graph = job_graph_of(&[("A", "B"), ("A", "C")]);

    assert_eq!(graph.find_origins(), vec!["A".to_string()]);

    let components = graph.split_connected();
    assert_eq!(components.len(), 1);

    let paths: BTreeSet<&str> = components[0].paths().collect();
    assert_eq!(paths, BTreeSet::from(["A", "B", "C"]));
}

#[test]
fn shared_downstream_node_reconciles_origin_scans() {
    init_tracing();
    // Two unrelated origins converging on C; a naive per-origin split would
    // place C in only one of them.
    let graph = job_graph_of(&[("A", "C"), ("B", "C"), ("C", "D")]);

    assert_eq!(graph.find_origins().len(), 2);

    let components = graph.split_connected();
    assert_eq!(components.len(), 1);
    assert_eq!(components[0].len(), 4);
}

#[test]
fn split_covers_cycle_only_components() {
    init_tracing();
    let mut graph = job_graph_of(&[("A", "B"), ("B", "A")]);
    graph.insert(job("C")).unwrap();

    // The A<->B cycle has no origin; it must still appear in the partition.
    let components = graph.split_connected();
    let union: BTreeSet<String> = components
        .iter()
        .flat_map(|c| c.paths().map(str::to_string))
        .collect();
    assert_eq!(
        union,
        BTreeSet::from(["A".to_string(), "B".to_string(), "C".to_string()])
    );
    assert_eq!(components.len(), 2);
}

#[test]
fn merge_on_shared_node_unions_edges() {
    init_tracing();
    let mut left = job_graph_of(&[("A", "B")]);
    let right = job_graph_of(&[("D", "B")]);

    assert!(left.merge(&right));
    assert_eq!(left.len(), 3);

    let b = left.node("B").unwrap();
    let preds: BTreeSet<&str> = b.predecessors().iter().map(String::as_str).collect();
    assert_eq!(preds, BTreeSet::from(["A", "D"]));
}

#[test]
fn merge_of_disjoint_graphs_is_refused() {
    init_tracing();
    let mut left = job_graph_of(&[("A", "B")]);
    let right = job_graph_of(&[("X", "Y")]);

    assert!(!left.merge(&right));
    assert_eq!(left.len(), 2);
}

#[test]
fn remove_node_preserves_reachability() {
    init_tracing();
    let graph = job_graph_of(&[
        ("P1", "N"),
        ("P2", "N"),
        ("N", "S1"),
        ("N", "S2"),
    ]);

    let mut contracted = graph.clone();
    contracted.remove_node("N", false).unwrap();

    for p in ["P1", "P2"] {
        for s in ["S1", "S2"] {
            assert!(
                contracted.node(p).unwrap().has_edge_to(s),
                "{p} should reach {s} directly after contraction"
            );
        }
    }
    assert!(!contracted.contains("N"));
    for node in contracted.iter() {
        assert!(!node.has_edge_to("N"));
        assert!(!node.predecessors().iter().any(|p| p == "N"));
    }
}

#[test]
fn remove_node_can_advance_pending_values() {
    init_tracing();
    let mut graph = Graph::new();
    let mut split = Node::new("Select/job003/particles_split1.star", NodeKind::File);
    split.env.stage(KEY_BATCH_NUMBER, EnvValue::Number(1));
    graph.insert(split).unwrap();
    graph.insert(job("Class2D/job004")).unwrap();
    graph
        .link(
            "Select/job003/particles_split1.star",
            "Class2D/job004",
            Default::default(),
            None,
        )
        .unwrap();

    graph
        .remove_node("Select/job003/particles_split1.star", true)
        .unwrap();

    let downstream = graph.node("Class2D/job004").unwrap();
    assert_eq!(downstream.env.batch_number, Some(1));
}

#[test]
fn remove_node_forwards_pending_to_successor_stores() {
    init_tracing();
    let mut graph = Graph::new();
    let mut class_file = Node::new("InitialModel/job010/run_class1.mrc", NodeKind::File);
    class_file
        .env
        .stage(KEY_INIT_MODEL_CLASS_NUM, EnvValue::Number(1));
    graph.insert(class_file).unwrap();
    graph.insert(job("Class3D/job011")).unwrap();
    graph
        .link(
            "InitialModel/job010/run_class1.mrc",
            "Class3D/job011",
            Default::default(),
            None,
        )
        .unwrap();

    graph
        .remove_node("InitialModel/job010/run_class1.mrc", false)
        .unwrap();

    // Without advancing, the value stays pending on the successor rather
    // than landing in its environment; a later flush applies it.
    let downstream = graph.node("Class3D/job011").unwrap();
    assert_eq!(downstream.env.init_model_class_num, None);
    assert_eq!(
        downstream.env.pending().get(KEY_INIT_MODEL_CLASS_NUM),
        Some(&EnvValue::Number(1))
    );
}

#[test]
fn edge_share_lists_restrict_forwarding_on_removal() {
    init_tracing();
    let mut graph = Graph::new();
    let mut split = Node::new("Select/job003/particles_split2.star", NodeKind::File);
    split.env.stage(KEY_BATCH_NUMBER, EnvValue::Number(2));
    graph.insert(split).unwrap();
    graph.insert(job("Class2D/job004")).unwrap();
    graph.insert(job("Extract/job005")).unwrap();
    graph
        .link(
            "Select/job003/particles_split2.star",
            "Class2D/job004",
            Default::default(),
            None,
        )
        .unwrap();
    graph
        .link(
            "Select/job003/particles_split2.star",
            "Extract/job005",
            Default::default(),
            Some(vec!["some_other_key".to_string()]),
        )
        .unwrap();

    graph
        .remove_node("Select/job003/particles_split2.star", false)
        .unwrap();

    assert!(graph
        .node("Class2D/job004")
        .unwrap()
        .env
        .has_pending(KEY_BATCH_NUMBER));
    assert!(!graph
        .node("Extract/job005")
        .unwrap()
        .env
        .has_pending(KEY_BATCH_NUMBER));
}

#[test]
fn explore_is_deterministic_preorder() {
    init_tracing();
    let graph = job_graph_of(&[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")]);

    let order = graph.explore("A").unwrap();
    assert_eq!(order, vec!["A", "B", "D", "C"]);

    // Unchanged graph, identical traversal.
    assert_eq!(graph.explore("A").unwrap(), order);
}

#[test]
fn explore_rejects_unknown_origin() {
    init_tracing();
    let graph = job_graph_of(&[("A", "B")]);
    assert!(graph.explore("nope").is_err());
}

#[test]
fn ancestor_checks_follow_outgoing_edges_only() {
    init_tracing();
    let graph = job_graph_of(&[("A", "B"), ("B", "C")]);

    assert!(graph.is_ancestor_of("A", "C").unwrap());
    assert!(!graph.is_ancestor_of("C", "A").unwrap());
    // A node is not its own ancestor without a cycle.
    assert!(!graph.is_ancestor_of("B", "B").unwrap());

    let cyclic = job_graph_of(&[("A", "B"), ("B", "A")]);
    assert!(cyclic.is_ancestor_of("A", "A").unwrap());
}

#[test]
fn linked_nodes_round_trip_through_the_index() {
    init_tracing();
    let graph = job_graph_of(&[("P", "Q")]);

    let p = graph.node("P").unwrap();
    let first_successor = p.successors().next().unwrap();
    assert_eq!(graph.index_of("Q"), graph.index_of(first_successor));
}

#[test]
fn linking_is_idempotent_and_unlinking_is_forgiving() {
    init_tracing();
    let mut graph = job_graph_of(&[("A", "B")]);

    let added = graph.link("A", "B", Default::default(), None).unwrap();
    assert!(!added);
    assert_eq!(graph.node("A").unwrap().outgoing().len(), 1);

    // Removing an edge that is not there is not an error.
    graph.unlink("B", "A").unwrap();
    graph.unlink("A", "B").unwrap();
    assert!(graph.node("B").unwrap().predecessors().is_empty());
}

#[test]
fn node_equality_is_by_path() {
    init_tracing();
    let a = job("Import/job001");
    let mut b = job("Import/job001");
    b.link_to("MotionCorr/job002", Default::default(), None);

    assert_eq!(a, b);
    assert_eq!(a, *"Import/job001");
}
