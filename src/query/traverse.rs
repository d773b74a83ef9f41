//! Ancestor/descendant traversal and the shared "what are this person's
//! relatives" neighbor functions the rest of the query engine builds on.

use std::collections::{HashMap, VecDeque};

use crate::graph::edge::EdgeKind;
use crate::graph::Graph;

/// Every `INDI -> INDI` edge kind the query engine treats as a family
/// relationship, as opposed to a reference edge (`NOTE`/`SOUR`/`REPO`) or
/// `HAS_EVENT`.
const FAMILY_EDGE_KINDS: &[EdgeKind] = &[
    EdgeKind::Parent,
    EdgeKind::Child,
    EdgeKind::Sibling,
    EdgeKind::Spouse,
];

/// An individual's direct parents, preferring derived `Parent` edges and
/// falling back to `FAMC` + the family's `HUSB`/`WIFE` when derived edges
/// weren't built.
#[must_use]
pub fn parents_of(graph: &Graph, id: u32) -> Vec<u32> {
    let out = graph.out_edges(id);
    let derived: Vec<u32> = out
        .iter()
        .filter(|e| e.kind == EdgeKind::Parent)
        .map(|e| e.to)
        .collect();
    if !derived.is_empty() {
        return derived;
    }
    out.iter()
        .filter(|e| e.kind == EdgeKind::Famc)
        .flat_map(|e| graph.out_edges(e.to))
        .filter(|fe| matches!(fe.kind, EdgeKind::Husb | EdgeKind::Wife))
        .map(|fe| fe.to)
        .collect()
}

/// An individual's direct children, preferring derived `Child` edges and
/// falling back to `FAMS` + the family's `CHIL` list.
#[must_use]
pub fn children_of(graph: &Graph, id: u32) -> Vec<u32> {
    let out = graph.out_edges(id);
    let derived: Vec<u32> = out
        .iter()
        .filter(|e| e.kind == EdgeKind::Child)
        .map(|e| e.to)
        .collect();
    if !derived.is_empty() {
        return derived;
    }
    out.iter()
        .filter(|e| e.kind == EdgeKind::Fams)
        .flat_map(|e| graph.out_edges(e.to))
        .filter(|fe| fe.kind == EdgeKind::Chil)
        .map(|fe| fe.to)
        .collect()
}

/// An individual's siblings (sharing at least one parental family),
/// preferring derived `Sibling` edges.
#[must_use]
pub fn siblings_of(graph: &Graph, id: u32) -> Vec<u32> {
    let out = graph.out_edges(id);
    let derived: Vec<u32> = out
        .iter()
        .filter(|e| e.kind == EdgeKind::Sibling)
        .map(|e| e.to)
        .collect();
    if !derived.is_empty() {
        return derived;
    }
    out.iter()
        .filter(|e| e.kind == EdgeKind::Famc)
        .flat_map(|e| graph.out_edges(e.to))
        .filter(|fe| fe.kind == EdgeKind::Chil && fe.to != id)
        .map(|fe| fe.to)
        .collect()
}

/// An individual's spouses, preferring derived `Spouse` edges.
#[must_use]
pub fn spouses_of(graph: &Graph, id: u32) -> Vec<u32> {
    let out = graph.out_edges(id);
    let derived: Vec<u32> = out
        .iter()
        .filter(|e| e.kind == EdgeKind::Spouse)
        .map(|e| e.to)
        .collect();
    if !derived.is_empty() {
        return derived;
    }
    out.iter()
        .filter(|e| e.kind == EdgeKind::Fams)
        .flat_map(|e| graph.out_edges(e.to))
        .filter(|fe| matches!(fe.kind, EdgeKind::Husb | EdgeKind::Wife) && fe.to != id)
        .map(|fe| fe.to)
        .collect()
}

/// Every neighbor reachable via a family-relevant edge, in either
/// direction, used by shortest-path search.
#[must_use]
pub fn family_neighbors(graph: &Graph, id: u32) -> Vec<u32> {
    let mut out: Vec<u32> = graph
        .out_edges(id)
        .into_iter()
        .filter(|e| FAMILY_EDGE_KINDS.contains(&e.kind))
        .map(|e| e.to)
        .collect();
    out.extend(
        graph
            .in_edges(id)
            .into_iter()
            .filter(|e| FAMILY_EDGE_KINDS.contains(&e.kind))
            .map(|e| e.from),
    );
    out.extend(parents_of(graph, id));
    out.extend(children_of(graph, id));
    out.extend(siblings_of(graph, id));
    out.extend(spouses_of(graph, id));
    out.sort_unstable();
    out.dedup();
    out
}

/// Every neighbor reachable via any edge, in either direction, with no
/// restriction to family-relevant kinds. Used by [`super::path`] for
/// shortest-path/all-paths search, which per spec.md §4.9 runs over "the
/// undirected view of the graph" rather than the individual-to-individual
/// "family view" [`family_neighbors`] exposes to `metrics.rs`: a path
/// between two individuals linked only through a shared `FAM` record must
/// actually traverse that `FAM` node, not hop across it.
#[must_use]
pub fn graph_neighbors(graph: &Graph, id: u32) -> Vec<u32> {
    let mut out: Vec<u32> = graph.out_edges(id).into_iter().map(|e| e.to).collect();
    out.extend(graph.in_edges(id).into_iter().map(|e| e.from));
    out.sort_unstable();
    out.dedup();
    out
}

/// Breadth-first search outward from `start` using `next` as the neighbor
/// function, returning `(id, depth)` pairs in discovery order. `start`
/// itself is not included.
fn bfs(graph: &Graph, start: u32, max_depth: Option<u32>, next: impl Fn(&Graph, u32) -> Vec<u32>) -> Vec<(u32, u32)> {
    let mut depth_of: HashMap<u32, u32> = HashMap::new();
    depth_of.insert(start, 0);
    let mut queue = VecDeque::new();
    queue.push_back(start);
    let mut out = Vec::new();

    while let Some(id) = queue.pop_front() {
        let depth = depth_of[&id];
        if max_depth.is_some_and(|max| depth >= max) {
            continue;
        }
        for neighbor in next(graph, id) {
            if depth_of.contains_key(&neighbor) {
                continue;
            }
            depth_of.insert(neighbor, depth + 1);
            out.push((neighbor, depth + 1));
            queue.push_back(neighbor);
        }
    }
    out
}

/// Every ancestor of `start`, with generation depth (1 = parent, 2 =
/// grandparent, ...), optionally bounded by `max_depth` generations.
#[must_use]
pub fn ancestors(graph: &Graph, start: u32, max_depth: Option<u32>) -> Vec<(u32, u32)> {
    bfs(graph, start, max_depth, parents_of)
}

/// Every descendant of `start`, with generation depth, optionally bounded
/// by `max_depth` generations.
#[must_use]
pub fn descendants(graph: &Graph, start: u32, max_depth: Option<u32>) -> Vec<(u32, u32)> {
    bfs(graph, start, max_depth, children_of)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_graph, GraphBuilderOptions};
    use crate::record::parse_serial;

    fn three_generation_graph() -> Graph {
        let text = "0 @I1@ INDI\n1 NAME Grandparent\n1 FAMS @F1@\n\
0 @I2@ INDI\n1 NAME Parent\n1 FAMC @F1@\n1 FAMS @F2@\n\
0 @I3@ INDI\n1 NAME Child\n1 FAMC @F2@\n\
0 @F1@ FAM\n1 HUSB @I1@\n1 CHIL @I2@\n\
0 @F2@ FAM\n1 HUSB @I2@\n1 CHIL @I3@\n";
        let (tree, _) = parse_serial(text).unwrap();
        build_graph(&tree, &GraphBuilderOptions::new()).0
    }

    #[test]
    fn ancestors_reach_across_two_generations() {
        let graph = three_generation_graph();
        let child = graph.id_for_xref("@I3@").unwrap();
        let grandparent = graph.id_for_xref("@I1@").unwrap();
        let result = ancestors(&graph, child, None);
        assert!(result.iter().any(|&(id, depth)| id == grandparent && depth == 2));
    }

    #[test]
    fn descendants_respect_max_depth() {
        let graph = three_generation_graph();
        let grandparent = graph.id_for_xref("@I1@").unwrap();
        let result = descendants(&graph, grandparent, Some(1));
        assert_eq!(result.len(), 1);
    }
}
