use crate::graph::{Graph, INVALID_EDGE};

fn out_targets(graph: &Graph<i32>, node: i32) -> Vec<(i32, i32)> {
    let mut edges: Vec<(i32, i32)> = graph
        .out_edges(node)
        .map(|(_, e)| (e.dst, e.label))
        .collect();
    edges.sort_unstable();
    edges
}

#[test]
fn add_nodes_and_edges() {
    let mut graph: Graph<i32> = Graph::new();
    let a = graph.add_node();
    let b = graph.add_node();
    let c = graph.add_node();
    graph.add_edge(a, b, 1);
    graph.add_edge(a, c, 2);
    graph.add_edge(b, c, 3);

    assert_eq!(graph.num_nodes(), 3);
    assert_eq!(graph.out_degree(a), 2);
    assert_eq!(graph.in_degree(c), 2);
    assert_eq!(out_targets(&graph, a), vec![(b, 1), (c, 2)]);
    assert!(graph.well_formed());
}

#[test]
fn chains_yield_most_recent_first() {
    let mut graph: Graph<i32> = Graph::with_nodes(2);
    graph.add_edge(0, 1, 10);
    graph.add_edge(0, 1, 20);
    let labels: Vec<i32> = graph.out_edges(0).map(|(_, e)| e.label).collect();
    assert_eq!(labels, vec![20, 10]);
}

#[test]
fn remove_edge_unlinks_both_sides() {
    let mut graph: Graph<i32> = Graph::with_nodes(3);
    let e0 = graph.add_edge(0, 1, 1);
    let e1 = graph.add_edge(0, 2, 2);
    graph.remove_edge(e0);

    assert_eq!(graph.out_degree(0), 1);
    assert_eq!(graph.in_degree(1), 0);
    assert_eq!(graph.first_in_edge(1), INVALID_EDGE);
    assert_eq!(graph.first_out_edge(0), e1);
    assert!(graph.well_formed());

    graph.remove_edge(e1);
    assert_eq!(graph.out_degree(0), 0);
    assert!(graph.well_formed());
}

#[test]
fn next_edge_from_to_scans_parallel_edges() {
    let mut graph: Graph<i32> = Graph::with_nodes(2);
    let e0 = graph.add_edge(0, 1, 1);
    let e1 = graph.add_edge(0, 1, 2);

    let first = graph.next_edge_from_to(0, 1, INVALID_EDGE);
    assert_eq!(first, e1);
    let second = graph.next_edge_from_to(0, 1, first);
    assert_eq!(second, e0);
    assert_eq!(graph.next_edge_from_to(0, 1, second), INVALID_EDGE);
    assert_eq!(graph.next_edge_from_to(1, 0, INVALID_EDGE), INVALID_EDGE);
}

#[test]
fn coalesce_rewires_both_sides() {
    // 0 -> 1 -> 3, 2 -> 1; merge 1 into 0.
    let mut graph: Graph<i32> = Graph::with_nodes(4);
    graph.add_edge(0, 1, 1);
    graph.add_edge(1, 3, 2);
    graph.add_edge(2, 1, 3);
    graph.coalesce(0, 1);

    assert_eq!(graph.out_degree(1), 0);
    assert_eq!(graph.in_degree(1), 0);
    assert_eq!(out_targets(&graph, 0), vec![(3, 2)]);
    assert_eq!(out_targets(&graph, 2), vec![(0, 3)]);
    assert!(graph.well_formed());
}

#[test]
fn coalesce_drops_self_loops() {
    // 1 has a self-loop and an edge back to 0; both disappear.
    let mut graph: Graph<i32> = Graph::with_nodes(2);
    graph.add_edge(0, 1, 1);
    graph.add_edge(1, 1, 2);
    graph.add_edge(1, 0, 3);
    graph.coalesce(0, 1);

    assert_eq!(graph.out_degree(0), 0);
    assert_eq!(graph.in_degree(0), 0);
    assert_eq!(graph.out_degree(1), 0);
    assert_eq!(graph.in_degree(1), 0);
    assert!(graph.well_formed());
}

#[test]
fn simplify_drops_unreachable_nodes() {
    // 0 -> 1 -> 2, 3 -> 1 (3 unreachable from 0), 4 isolated.
    let mut graph: Graph<i32> = Graph::with_nodes(5);
    graph.add_edge(0, 1, 1);
    graph.add_edge(1, 2, 2);
    graph.add_edge(3, 1, 3);
    let (out, mapping, roots) = graph.simplify(&[0]);

    assert_eq!(roots, vec![0]);
    assert_eq!(out.num_nodes(), 3);
    assert_eq!(mapping[0], 0);
    assert_eq!(mapping[1], 1);
    assert_eq!(mapping[2], 2);
    assert_eq!(mapping[3], -1);
    assert_eq!(mapping[4], -1);
    assert_eq!(out_targets(&out, 0), vec![(1, 1)]);
    assert_eq!(out_targets(&out, 1), vec![(2, 2)]);
    assert!(out.well_formed());
}

#[test]
fn simplify_keeps_multiple_roots() {
    let mut graph: Graph<i32> = Graph::with_nodes(3);
    graph.add_edge(1, 2, 1);
    let (out, _, roots) = graph.simplify(&[0, 1]);
    assert_eq!(out.num_nodes(), 3);
    assert_eq!(roots, vec![0, 1]);
}
