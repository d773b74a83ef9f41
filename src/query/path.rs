//! Shortest-path and all-paths search between two individuals, and
//! lowest-common-ancestor queries (C9).

use std::collections::{HashMap, HashSet};

use crate::graph::edge::EdgeKind;
use crate::graph::Graph;

use super::traverse::{ancestors, graph_neighbors};

/// The composition of edge kinds along a path, per spec.md §9's open
/// question: a path is `Blood` or `Marital` only if every edge along it is
/// of that kind; any mix is reported as `Mixed`. This is a different axis
/// from [`super::relationship::classify`], which picks a single dominant
/// relationship rather than describing the path itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathKind {
    Blood,
    Marital,
    Mixed,
}

fn edge_kind_between(graph: &Graph, a: u32, b: u32) -> Option<EdgeKind> {
    if let Some(e) = graph.out_edges(a).into_iter().find(|e| e.to == b) {
        return Some(e.kind);
    }
    graph.in_edges(a).into_iter().find(|e| e.from == b).map(|e| e.kind)
}

fn classify_path(graph: &Graph, path: &[u32]) -> PathKind {
    let mut saw_blood = false;
    let mut saw_marital = false;
    for pair in path.windows(2) {
        if let Some(kind) = edge_kind_between(graph, pair[0], pair[1]) {
            saw_blood |= kind.is_blood();
            saw_marital |= kind.is_marital();
        }
    }
    match (saw_blood, saw_marital) {
        (true, true) => PathKind::Mixed,
        (false, true) => PathKind::Marital,
        _ => PathKind::Blood,
    }
}

/// Finds the shortest path between `from` and `to` using a bidirectional
/// BFS: the smaller of the two frontiers is always expanded next, which
/// keeps the search roughly symmetric regardless of which endpoint is
/// passed first (tested as a symmetry invariant).
#[must_use]
pub fn shortest_path(graph: &Graph, from: u32, to: u32) -> Option<(Vec<u32>, PathKind)> {
    if from == to {
        return Some((vec![from], PathKind::Blood));
    }

    let mut parent_f: HashMap<u32, u32> = HashMap::from([(from, from)]);
    let mut parent_b: HashMap<u32, u32> = HashMap::from([(to, to)]);
    let mut layer_f = vec![from];
    let mut layer_b = vec![to];

    loop {
        if layer_f.is_empty() || layer_b.is_empty() {
            return None;
        }
        let meeting = if layer_f.len() <= layer_b.len() {
            expand(graph, &mut layer_f, &mut parent_f, &parent_b)
        } else {
            expand(graph, &mut layer_b, &mut parent_b, &parent_f)
        };
        if let Some(meeting) = meeting {
            let path = reconstruct(&parent_f, &parent_b, meeting);
            let kind = classify_path(graph, &path);
            return Some((path, kind));
        }
    }
}

fn expand(
    graph: &Graph,
    layer: &mut Vec<u32>,
    parent: &mut HashMap<u32, u32>,
    other_parent: &HashMap<u32, u32>,
) -> Option<u32> {
    let mut next_layer = Vec::new();
    for &id in layer.iter() {
        for neighbor in graph_neighbors(graph, id) {
            if parent.contains_key(&neighbor) {
                continue;
            }
            parent.insert(neighbor, id);
            if other_parent.contains_key(&neighbor) {
                *layer = next_layer;
                return Some(neighbor);
            }
            next_layer.push(neighbor);
        }
    }
    *layer = next_layer;
    None
}

fn reconstruct(parent_f: &HashMap<u32, u32>, parent_b: &HashMap<u32, u32>, meeting: u32) -> Vec<u32> {
    let mut front = vec![meeting];
    let mut cur = meeting;
    while let Some(&p) = parent_f.get(&cur) {
        if p == cur {
            break;
        }
        front.push(p);
        cur = p;
    }
    front.reverse();

    let mut back = Vec::new();
    let mut cur = meeting;
    while let Some(&p) = parent_b.get(&cur) {
        if p == cur {
            break;
        }
        back.push(p);
        cur = p;
    }

    front.extend(back);
    front
}

/// Finds every simple path between `from` and `to` up to `max_depth` hops,
/// via bounded depth-first search. Stops enumerating once `max_results`
/// paths have been found.
#[must_use]
pub fn all_paths(graph: &Graph, from: u32, to: u32, max_depth: usize, max_results: usize) -> Vec<Vec<u32>> {
    let mut results = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![from];
    visited.insert(from);
    dfs_all_paths(graph, from, to, max_depth, max_results, &mut visited, &mut stack, &mut results);
    results
}

#[allow(clippy::too_many_arguments)]
fn dfs_all_paths(
    graph: &Graph,
    current: u32,
    target: u32,
    max_depth: usize,
    max_results: usize,
    visited: &mut HashSet<u32>,
    stack: &mut Vec<u32>,
    results: &mut Vec<Vec<u32>>,
) {
    if results.len() >= max_results {
        return;
    }
    if current == target {
        results.push(stack.clone());
        return;
    }
    if stack.len() > max_depth {
        return;
    }
    for neighbor in graph_neighbors(graph, current) {
        if results.len() >= max_results {
            return;
        }
        if visited.contains(&neighbor) {
            continue;
        }
        visited.insert(neighbor);
        stack.push(neighbor);
        dfs_all_paths(graph, neighbor, target, max_depth, max_results, visited, stack, results);
        stack.pop();
        visited.remove(&neighbor);
    }
}

/// The closest common ancestor(s) of `a` and `b`, with each ancestor's
/// combined depth (`depth_a + depth_b`). Ties (more than one ancestor at
/// the same minimal combined depth) are all returned.
#[must_use]
pub fn common_ancestors(graph: &Graph, a: u32, b: u32) -> Vec<(u32, u32)> {
    let ancestors_a: HashMap<u32, u32> = ancestors(graph, a, None).into_iter().collect();
    let ancestors_b: HashMap<u32, u32> = ancestors(graph, b, None).into_iter().collect();
    let mut shared: Vec<(u32, u32)> = ancestors_a
        .iter()
        .filter_map(|(&id, &da)| ancestors_b.get(&id).map(|&db| (id, da + db)))
        .collect();
    shared.sort_by_key(|&(_, total)| total);
    shared
}

/// The lowest common ancestor(s): the subset of [`common_ancestors`] at the
/// minimal combined depth.
#[must_use]
pub fn lowest_common_ancestors(graph: &Graph, a: u32, b: u32) -> Vec<u32> {
    let shared = common_ancestors(graph, a, b);
    let Some(&(_, min_depth)) = shared.first() else {
        return Vec::new();
    };
    shared
        .into_iter()
        .take_while(|&(_, d)| d == min_depth)
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_graph, GraphBuilderOptions};
    use crate::record::parse_serial;

    fn line_graph() -> Graph {
        let text = "0 @A@ INDI\n1 NAME A\n1 FAMS @F1@\n\
0 @B@ INDI\n1 NAME B\n1 FAMC @F1@\n1 FAMS @F2@\n\
0 @C@ INDI\n1 NAME C\n1 FAMC @F2@\n\
0 @F1@ FAM\n1 HUSB @A@\n1 CHIL @B@\n\
0 @F2@ FAM\n1 HUSB @B@\n1 CHIL @C@\n";
        let (tree, _) = parse_serial(text).unwrap();
        build_graph(&tree, &GraphBuilderOptions::new()).0
    }

    #[test]
    fn shortest_path_length_is_symmetric() {
        let graph = line_graph();
        let a = graph.id_for_xref("@A@").unwrap();
        let c = graph.id_for_xref("@C@").unwrap();
        let (forward, _) = shortest_path(&graph, a, c).unwrap();
        let (backward, _) = shortest_path(&graph, c, a).unwrap();
        assert_eq!(forward.len(), backward.len());
    }

    #[test]
    fn lca_is_idempotent() {
        let graph = line_graph();
        let a = graph.id_for_xref("@A@").unwrap();
        let c = graph.id_for_xref("@C@").unwrap();
        let first = lowest_common_ancestors(&graph, a, c);
        let second = lowest_common_ancestors(&graph, a, c);
        assert_eq!(first, second);
        assert_eq!(first, vec![a]);
    }

    #[test]
    fn all_paths_includes_the_direct_line() {
        let graph = line_graph();
        let a = graph.id_for_xref("@A@").unwrap();
        let c = graph.id_for_xref("@C@").unwrap();
        let paths = all_paths(&graph, a, c, 5, 10);
        assert!(!paths.is_empty());
        assert!(paths.iter().any(|p| p.first() == Some(&a) && p.last() == Some(&c)));
    }
}
