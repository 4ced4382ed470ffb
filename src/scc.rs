//! Strongly connected components via Kosaraju's two-pass algorithm
//!
//! Stateless: every call walks the graph from scratch in O(V+E). The
//! caller is expected to hold whatever lock guards the graph for the
//! duration of the call, which makes the `&Graph` borrow a consistent
//! snapshot.
//!
//! Both passes use an explicit frame stack rather than recursion so that
//! deep path graphs cannot overflow the thread stack.

use crate::graph::Graph;

/// Compute all strongly connected components of `graph`.
///
/// Components come out in the reverse-topological order Kosaraju's second
/// pass discovers them. For a fixed graph the partition is deterministic:
/// roots are taken in increasing vertex id and adjacency lists are walked
/// in insertion order.
pub fn compute_sccs(graph: &Graph) -> Vec<Vec<usize>> {
    let n = graph.vertex_count();
    let mut finish_order = Vec::with_capacity(n);
    let mut visited = vec![false; n];

    // Pass 1: DFS on the forward graph, recording finish order.
    for root in 0..n {
        if !visited[root] {
            fill_order(graph, root, &mut visited, &mut finish_order);
        }
    }

    // A fresh reversed adjacency; the live graph is never mutated.
    let transpose = transpose(graph);

    // Pass 2: pop vertices in reverse finish order, each unassigned one
    // roots a component collected over the transpose.
    let mut assigned = vec![false; n];
    let mut sccs = Vec::new();
    for &v in finish_order.iter().rev() {
        if !assigned[v] {
            sccs.push(collect_component(&transpose, v, &mut assigned));
        }
    }
    sccs
}

/// Iterative DFS pushing each vertex once all its descendants finished.
fn fill_order(graph: &Graph, root: usize, visited: &mut [bool], finish_order: &mut Vec<usize>) {
    let mut stack = vec![(root, 0usize)];
    visited[root] = true;
    while let Some(frame) = stack.last_mut() {
        let (v, next) = *frame;
        let neighbors = graph.out_neighbors(v);
        if next < neighbors.len() {
            frame.1 += 1;
            let w = neighbors[next];
            if !visited[w] {
                visited[w] = true;
                stack.push((w, 0));
            }
        } else {
            finish_order.push(v);
            stack.pop();
        }
    }
}

fn transpose(graph: &Graph) -> Vec<Vec<usize>> {
    let n = graph.vertex_count();
    let mut rev = vec![Vec::new(); n];
    for u in 0..n {
        for &v in graph.out_neighbors(u) {
            rev[v].push(u);
        }
    }
    rev
}

fn collect_component(transpose: &[Vec<usize>], root: usize, assigned: &mut [bool]) -> Vec<usize> {
    let mut component = Vec::new();
    let mut stack = vec![root];
    assigned[root] = true;
    while let Some(v) = stack.pop() {
        component.push(v);
        for &w in &transpose[v] {
            if !assigned[w] {
                assigned[w] = true;
                stack.push(w);
            }
        }
    }
    component
}
