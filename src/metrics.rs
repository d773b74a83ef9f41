//! Graph-theoretic analytics (C11): degree distribution, centrality,
//! diameter, connected components, density, and longest path, all computed
//! directly against the in-memory graph (C5) — this module never touches
//! the hybrid store.
//!
//! Betweenness/closeness centrality, diameter, and longest path run an
//! all-pairs shortest-path sweep (one BFS per individual), an O(V·(V+E))
//! workload meant for offline analysis rather than interactive queries.
//! Each accepts an optional [`Deadline`] and returns a [`Metric::Truncated`]
//! partial result if time runs out mid-sweep, rather than blocking
//! indefinitely on a large graph.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

use crate::graph::node::NodeKind;
use crate::graph::Graph;
use crate::query::traverse::family_neighbors;

/// A wall-clock budget for a long-running metrics computation.
#[derive(Clone, Copy, Debug)]
pub struct Deadline(Instant);

impl Deadline {
    /// A deadline `duration` from now.
    #[must_use]
    pub fn after(duration: Duration) -> Self {
        Deadline(Instant::now() + duration)
    }

    fn expired(self) -> bool {
        Instant::now() >= self.0
    }
}

/// The outcome of a deadline-aware computation.
#[derive(Clone, Debug, PartialEq)]
pub enum Metric<T> {
    /// The computation ran to completion.
    Complete(T),
    /// The deadline expired first; `T` reflects only the individuals
    /// processed before expiry.
    Truncated(T),
}

impl<T> Metric<T> {
    /// Unwraps to the inner value regardless of whether it's partial.
    pub fn into_inner(self) -> T {
        match self {
            Metric::Complete(v) | Metric::Truncated(v) => v,
        }
    }

    /// `true` if the deadline expired before the computation finished.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        matches!(self, Metric::Truncated(_))
    }
}

fn individual_ids(graph: &Graph) -> Vec<u32> {
    graph
        .all_nodes()
        .iter()
        .filter(|n| n.kind() == NodeKind::Individual)
        .map(|n| n.internal_id)
        .collect()
}

/// In/out degree of a single node, counting every edge kind (not just the
/// family-relevant ones `family_neighbors` restricts itself to). O(1).
#[must_use]
pub fn degree(graph: &Graph, id: u32) -> (usize, usize) {
    (graph.in_edges(id).len(), graph.out_edges(id).len())
}

/// The undirected family-view degree of every individual (parents, children,
/// siblings, spouses — see [`family_neighbors`]), bucketed into a histogram
/// keyed by degree.
#[must_use]
pub fn degree_distribution(graph: &Graph) -> HashMap<usize, usize> {
    let mut histogram = HashMap::new();
    for id in individual_ids(graph) {
        let degree = family_neighbors(graph, id).len();
        *histogram.entry(degree).or_insert(0) += 1;
    }
    histogram
}

fn bfs_distances(graph: &Graph, start: u32) -> HashMap<u32, u32> {
    let mut dist = HashMap::new();
    dist.insert(start, 0);
    let mut queue = VecDeque::from([start]);
    while let Some(id) = queue.pop_front() {
        let d = dist[&id];
        for neighbor in family_neighbors(graph, id) {
            if dist.contains_key(&neighbor) {
                continue;
            }
            dist.insert(neighbor, d + 1);
            queue.push_back(neighbor);
        }
    }
    dist
}

/// Every maximal connected component of the undirected family view, as sets
/// of individual ids.
#[must_use]
pub fn connected_components(graph: &Graph, deadline: Option<Deadline>) -> Metric<Vec<Vec<u32>>> {
    let mut seen = HashSet::new();
    let mut components = Vec::new();
    for id in individual_ids(graph) {
        if seen.contains(&id) {
            continue;
        }
        if deadline.is_some_and(Deadline::expired) {
            return Metric::Truncated(components);
        }
        let reached = bfs_distances(graph, id);
        let mut component: Vec<u32> = reached.keys().copied().collect();
        component.sort_unstable();
        seen.extend(component.iter().copied());
        components.push(component);
    }
    Metric::Complete(components)
}

/// Closeness centrality per individual: `(reachable - 1) / sum(distances)`,
/// `0.0` for an isolated individual.
#[must_use]
pub fn closeness_centrality(graph: &Graph, deadline: Option<Deadline>) -> Metric<HashMap<u32, f64>> {
    let ids = individual_ids(graph);
    let mut scores = HashMap::new();
    for &id in &ids {
        if deadline.is_some_and(Deadline::expired) {
            return Metric::Truncated(scores);
        }
        let distances = bfs_distances(graph, id);
        let sum: u32 = distances.values().copied().filter(|&d| d > 0).sum();
        let reached = distances.len().saturating_sub(1);
        let score = if sum == 0 { 0.0 } else { f64::from(reached as u32) / f64::from(sum) };
        scores.insert(id, score);
    }
    Metric::Complete(scores)
}

/// Betweenness centrality per individual via Brandes' algorithm: one BFS
/// plus one dependency-accumulation pass per source node.
#[must_use]
pub fn betweenness_centrality(graph: &Graph, deadline: Option<Deadline>) -> Metric<HashMap<u32, f64>> {
    let ids = individual_ids(graph);
    let mut scores: HashMap<u32, f64> = ids.iter().map(|&id| (id, 0.0)).collect();

    for &source in &ids {
        if deadline.is_some_and(Deadline::expired) {
            return Metric::Truncated(scores);
        }

        let mut sigma: HashMap<u32, f64> = HashMap::from([(source, 1.0)]);
        let mut dist: HashMap<u32, i64> = HashMap::from([(source, 0)]);
        let mut predecessors: HashMap<u32, Vec<u32>> = HashMap::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([source]);

        while let Some(v) = queue.pop_front() {
            order.push(v);
            for w in family_neighbors(graph, v) {
                if !dist.contains_key(&w) {
                    dist.insert(w, dist[&v] + 1);
                    queue.push_back(w);
                }
                if dist[&w] == dist[&v] + 1 {
                    *sigma.entry(w).or_insert(0.0) += sigma[&v];
                    predecessors.entry(w).or_default().push(v);
                }
            }
        }

        let mut delta: HashMap<u32, f64> = HashMap::new();
        for &w in order.iter().rev() {
            for &v in predecessors.get(&w).map(Vec::as_slice).unwrap_or(&[]) {
                let contribution = (sigma[&v] / sigma[&w]) * (1.0 + delta.get(&w).copied().unwrap_or(0.0));
                *delta.entry(v).or_insert(0.0) += contribution;
            }
            if w != source {
                *scores.entry(w).or_insert(0.0) += delta.get(&w).copied().unwrap_or(0.0);
            }
        }
    }

    // Each shortest path between an unordered pair is counted once in each
    // direction during the full sweep.
    for value in scores.values_mut() {
        *value /= 2.0;
    }
    Metric::Complete(scores)
}

/// The graph's diameter (the longest shortest path between any two
/// individuals in the same component) together with one path that attains
/// it.
#[must_use]
pub fn diameter(graph: &Graph, deadline: Option<Deadline>) -> Metric<Option<(u32, Vec<u32>)>> {
    let ids = individual_ids(graph);
    let mut best: Option<(u32, u32, u32)> = None; // (distance, from, to)

    for &id in &ids {
        if deadline.is_some_and(Deadline::expired) {
            let result = best.map(|(d, from, to)| (d, reconstruct_bfs_path(graph, from, to)));
            return Metric::Truncated(result);
        }
        let distances = bfs_distances(graph, id);
        if let Some((&farthest, &d)) = distances.iter().max_by_key(|&(_, &d)| d) {
            let better = match best {
                None => true,
                Some((best_d, _, _)) => d > best_d,
            };
            if better {
                best = Some((d, id, farthest));
            }
        }
    }

    Metric::Complete(best.map(|(d, from, to)| (d, reconstruct_bfs_path(graph, from, to))))
}

fn reconstruct_bfs_path(graph: &Graph, from: u32, to: u32) -> Vec<u32> {
    let mut parent: HashMap<u32, u32> = HashMap::from([(from, from)]);
    let mut queue = VecDeque::from([from]);
    while let Some(v) = queue.pop_front() {
        if v == to {
            break;
        }
        for w in family_neighbors(graph, v) {
            if parent.contains_key(&w) {
                continue;
            }
            parent.insert(w, v);
            queue.push_back(w);
        }
    }
    let mut path = vec![to];
    let mut cur = to;
    while let Some(&p) = parent.get(&cur) {
        if p == cur {
            break;
        }
        path.push(p);
        cur = p;
    }
    path.reverse();
    path
}

/// The longest shortest path found in the graph, i.e. the path attaining
/// the [`diameter`]. An alias kept distinct from `diameter` because callers
/// that only want the path (not the distance) read more clearly this way.
#[must_use]
pub fn longest_path(graph: &Graph, deadline: Option<Deadline>) -> Metric<Vec<u32>> {
    match diameter(graph, deadline) {
        Metric::Complete(result) => Metric::Complete(result.map(|(_, path)| path).unwrap_or_default()),
        Metric::Truncated(result) => Metric::Truncated(result.map(|(_, path)| path).unwrap_or_default()),
    }
}

/// The actual-to-possible edge ratio over the undirected family view:
/// `actual_edges / (n * (n - 1) / 2)`. `0.0` for a graph with fewer than
/// two individuals.
#[must_use]
pub fn density(graph: &Graph) -> f64 {
    let ids = individual_ids(graph);
    let n = ids.len();
    if n < 2 {
        return 0.0;
    }
    let mut seen_pairs = HashSet::new();
    for &id in &ids {
        for neighbor in family_neighbors(graph, id) {
            let pair = (id.min(neighbor), id.max(neighbor));
            seen_pairs.insert(pair);
        }
    }
    let possible = (n * (n - 1)) / 2;
    seen_pairs.len() as f64 / possible as f64
}

/// Mean undirected family-view degree across all individuals.
#[must_use]
pub fn average_degree(graph: &Graph) -> f64 {
    let ids = individual_ids(graph);
    if ids.is_empty() {
        return 0.0;
    }
    let total: usize = ids.iter().map(|&id| family_neighbors(graph, id).len()).sum();
    total as f64 / ids.len() as f64
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
    fn degree_distribution_counts_each_individual_once() {
        let graph = three_generation_graph();
        let histogram = degree_distribution(&graph);
        let total: usize = histogram.values().sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn diameter_spans_the_full_chain() {
        let graph = three_generation_graph();
        let result = diameter(&graph, None).into_inner();
        let (distance, path) = result.unwrap();
        assert_eq!(distance, 2);
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn connected_components_finds_a_single_component() {
        let graph = three_generation_graph();
        let components = connected_components(&graph, None).into_inner();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].len(), 3);
    }

    #[test]
    fn isolated_individual_is_its_own_component() {
        let graph = three_generation_graph();
        graph.add_node("@I9@".to_string(), crate::graph::node::NodeData::Individual(Default::default())).unwrap();
        let components = connected_components(&graph, None).into_inner();
        assert_eq!(components.len(), 2);
    }

    #[test]
    fn an_already_expired_deadline_truncates_immediately() {
        let graph = three_generation_graph();
        let expired = Deadline::after(Duration::from_secs(0));
        std::thread::sleep(Duration::from_millis(5));
        let result = connected_components(&graph, Some(expired));
        assert!(result.is_truncated());
    }

    #[test]
    fn betweenness_is_zero_for_a_two_node_graph() {
        let text = "0 @I1@ INDI\n1 NAME A\n1 FAMS @F1@\n0 @I2@ INDI\n1 NAME B\n1 FAMC @F1@\n0 @F1@ FAM\n1 HUSB @I1@\n1 CHIL @I2@\n";
        let (tree, _) = parse_serial(text).unwrap();
        let (graph, _) = build_graph(&tree, &GraphBuilderOptions::new());
        let scores = betweenness_centrality(&graph, None).into_inner();
        assert!(scores.values().all(|&v| v == 0.0));
    }

    #[test]
    fn density_matches_the_chain_edge_ratio() {
        // 3 individuals in a chain: 2 of the 3 possible undirected pairs are connected.
        let graph = three_generation_graph();
        assert!((density(&graph) - (2.0 / 3.0)).abs() < f64::EPSILON);
    }
}
