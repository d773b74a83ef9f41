//! The individual filter builder (C9): an indexed-predicate intersection
//! followed by a linear post-filter for anything the index layer doesn't
//! cover, with an optional hybrid-mode SQL pushdown.

use std::collections::HashSet;

use crate::graph::node::NodeData;
use crate::graph::Graph;

/// A chained-setter predicate set for individual search.
#[derive(Clone, Debug, Default)]
pub struct Filter {
    name_exact: Option<String>,
    name_prefix: Option<String>,
    name_substring: Option<String>,
    name_suffix: Option<String>,
    sex: Option<String>,
    place: Option<String>,
    has_children: Option<bool>,
    has_spouse: Option<bool>,
    living: Option<bool>,
    birth_date_range: Option<(String, String)>,
}

impl Filter {
    /// Creates an empty filter (matches every individual).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name_exact(mut self, value: impl Into<String>) -> Self {
        self.name_exact = Some(value.into());
        self
    }

    #[must_use]
    pub fn name_prefix(mut self, value: impl Into<String>) -> Self {
        self.name_prefix = Some(value.into());
        self
    }

    /// Matches individuals whose name contains `value` anywhere
    /// (case-insensitive).
    #[must_use]
    pub fn name_substring(mut self, value: impl Into<String>) -> Self {
        self.name_substring = Some(value.into());
        self
    }

    /// Matches individuals whose name ends with `value` (case-insensitive).
    #[must_use]
    pub fn name_suffix(mut self, value: impl Into<String>) -> Self {
        self.name_suffix = Some(value.into());
        self
    }

    #[must_use]
    pub fn sex(mut self, value: impl Into<String>) -> Self {
        self.sex = Some(value.into());
        self
    }

    /// Matches individuals whose `birth_place` contains `value` anywhere
    /// (case-insensitive).
    #[must_use]
    pub fn place(mut self, value: impl Into<String>) -> Self {
        self.place = Some(value.into());
        self
    }

    #[must_use]
    pub fn has_children(mut self, value: bool) -> Self {
        self.has_children = Some(value);
        self
    }

    #[must_use]
    pub fn has_spouse(mut self, value: bool) -> Self {
        self.has_spouse = Some(value);
        self
    }

    #[must_use]
    pub fn living(mut self, value: bool) -> Self {
        self.living = Some(value);
        self
    }

    /// Matches individuals whose birth date string falls lexicographically
    /// within `[from, to]` inclusive. No calendrical normalization is
    /// performed (spec.md Non-goals), so this is exact only for
    /// consistently-formatted date strings.
    #[must_use]
    pub fn birth_date_range(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.birth_date_range = Some((from.into(), to.into()));
        self
    }

    /// A stable hash of this filter's predicates, used as part of the
    /// query cache key (C10).
    #[must_use]
    pub fn options_hash(&self) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.name_exact.hash(&mut hasher);
        self.name_prefix.hash(&mut hasher);
        self.name_substring.hash(&mut hasher);
        self.name_suffix.hash(&mut hasher);
        self.sex.hash(&mut hasher);
        self.place.hash(&mut hasher);
        self.has_children.hash(&mut hasher);
        self.has_spouse.hash(&mut hasher);
        self.living.hash(&mut hasher);
        self.birth_date_range.hash(&mut hasher);
        hasher.finish()
    }

    /// Executes the filter against an in-memory graph: indexed predicates
    /// (exact name, name prefix, sex, the boolean flags) intersect
    /// candidate id sets; anything C6 doesn't index as an exact/prefix
    /// lookup — substring/suffix name matches, birth-place substring, and
    /// the birth-date range — is then applied as a linear post-filter over
    /// that (already narrowed) candidate set.
    #[must_use]
    pub fn execute(&self, graph: &Graph) -> Vec<u32> {
        let candidates = graph.with_index(|index| {
            let mut sets: Vec<HashSet<u32>> = Vec::new();
            if let Some(name) = &self.name_exact {
                sets.push(index.by_name_exact(name).iter().copied().collect());
            }
            if let Some(prefix) = &self.name_prefix {
                sets.push(index.by_name_prefix(prefix).into_iter().collect());
            }
            if let Some(sex) = &self.sex {
                sets.push(index.by_sex(sex).iter().copied().collect());
            }
            if let Some(value) = self.has_children {
                sets.push(intersect_or_complement(index.has_children(), value, graph));
            }
            if let Some(value) = self.has_spouse {
                sets.push(intersect_or_complement(index.has_spouse(), value, graph));
            }
            if let Some(value) = self.living {
                sets.push(intersect_or_complement(index.living(), value, graph));
            }
            sets
        });

        let mut result: Option<HashSet<u32>> = None;
        for set in candidates {
            result = Some(match result {
                None => set,
                Some(acc) => acc.intersection(&set).copied().collect(),
            });
        }
        let mut ids: Vec<u32> = match result {
            Some(set) => set.into_iter().collect(),
            None => graph
                .all_nodes()
                .iter()
                .filter(|n| n.kind() == crate::graph::node::NodeKind::Individual)
                .map(|n| n.internal_id)
                .collect(),
        };

        if let Some(substring) = &self.name_substring {
            let needle = substring.to_lowercase();
            ids.retain(|&id| individual_name(graph, id).is_some_and(|n| n.to_lowercase().contains(&needle)));
        }
        if let Some(suffix) = &self.name_suffix {
            let needle = suffix.to_lowercase();
            ids.retain(|&id| individual_name(graph, id).is_some_and(|n| n.to_lowercase().ends_with(&needle)));
        }
        if let Some(place) = &self.place {
            let needle = place.to_lowercase();
            ids.retain(|&id| {
                graph.get_by_id(id).is_some_and(|node| match &node.data {
                    NodeData::Individual(data) => {
                        data.birth_place.as_ref().is_some_and(|p| p.to_lowercase().contains(&needle))
                    }
                    _ => false,
                })
            });
        }
        if let Some((from, to)) = &self.birth_date_range {
            ids.retain(|&id| {
                graph.get_by_id(id).is_some_and(|node| match &node.data {
                    NodeData::Individual(data) => data
                        .birth_date
                        .as_ref()
                        .is_some_and(|d| d.as_str() >= from.as_str() && d.as_str() <= to.as_str()),
                    _ => false,
                })
            });
        }

        ids.sort_unstable();
        ids
    }
}

fn individual_name(graph: &Graph, id: u32) -> Option<String> {
    graph.get_by_id(id).and_then(|node| match &node.data {
        NodeData::Individual(data) => data.name.clone(),
        _ => None,
    })
}

fn intersect_or_complement(flagged: &HashSet<u32>, want: bool, graph: &Graph) -> HashSet<u32> {
    if want {
        flagged.clone()
    } else {
        graph
            .all_nodes()
            .iter()
            .filter(|n| n.kind() == crate::graph::node::NodeKind::Individual)
            .map(|n| n.internal_id)
            .filter(|id| !flagged.contains(id))
            .collect()
    }
}

#[cfg(feature = "hybrid")]
/// Executes the filter via relational-store pushdown rather than walking
/// the in-memory index, for a graph that hasn't been fully hydrated.
///
/// # Errors
///
/// Returns a [`crate::error::GraphError`] on a SQL error.
pub fn execute_hybrid(
    filter: &Filter,
    store: &crate::storage::RelationalStore,
) -> Result<Vec<u32>, crate::error::GraphError> {
    let mut result: Option<HashSet<u32>> = None;
    let mut narrow = |set: Vec<u32>, result: &mut Option<HashSet<u32>>| {
        let set: HashSet<u32> = set.into_iter().collect();
        *result = Some(match result.take() {
            None => set,
            Some(acc) => acc.intersection(&set).copied().collect(),
        });
    };

    if let Some(name) = &filter.name_exact {
        narrow(store.find_by_name_exact(name)?, &mut result);
    }
    if let Some(prefix) = &filter.name_prefix {
        narrow(store.find_by_name_prefix(prefix)?, &mut result);
    }
    if let Some(substring) = &filter.name_substring {
        narrow(store.find_by_name_substring(substring)?, &mut result);
    }
    if let Some(suffix) = &filter.name_suffix {
        narrow(store.find_by_name_suffix(suffix)?, &mut result);
    }
    if let Some(sex) = &filter.sex {
        narrow(store.find_by_sex(sex)?, &mut result);
    }
    if let Some(place) = &filter.place {
        narrow(store.find_by_place_substring(place)?, &mut result);
    }
    if let Some(value) = filter.has_children {
        narrow(store.find_by_has_children(value)?, &mut result);
    }
    if let Some(value) = filter.has_spouse {
        narrow(store.find_by_has_spouse(value)?, &mut result);
    }
    if let Some(value) = filter.living {
        narrow(store.find_by_living(value)?, &mut result);
    }
    if let Some((from, to)) = &filter.birth_date_range {
        narrow(store.find_by_birth_date_range(from, to)?, &mut result);
    }

    let mut ids: Vec<u32> = match result {
        Some(set) => set.into_iter().collect(),
        None => store.all_ids_of_kind(crate::graph::node::NodeKind::Individual)?,
    };
    ids.sort_unstable();
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_graph, GraphBuilderOptions};
    use crate::record::parse_serial;

    fn sample_graph() -> Graph {
        let text = "0 @I1@ INDI\n1 NAME Jane /Doe/\n1 SEX F\n1 BIRT\n2 PLAC Springfield\n\
0 @I2@ INDI\n1 NAME John /Doe/\n1 SEX M\n1 FAMS @F1@\n\
0 @I3@ INDI\n1 NAME Jack /Doe/\n1 SEX M\n1 FAMC @F1@\n\
0 @F1@ FAM\n1 HUSB @I2@\n1 CHIL @I3@\n";
        let (tree, _) = parse_serial(text).unwrap();
        build_graph(&tree, &GraphBuilderOptions::new()).0
    }

    #[test]
    fn filters_compose_as_an_intersection() {
        let graph = sample_graph();
        let ids = Filter::new().sex("M").has_children(false).execute(&graph);
        let jack = graph.id_for_xref("@I3@").unwrap();
        assert_eq!(ids, vec![jack]);
    }

    #[test]
    fn predicate_order_does_not_change_the_result() {
        let graph = sample_graph();
        let a = Filter::new().sex("M").place("Springfield").execute(&graph);
        // Swapping setter order produces the same Filter value and result.
        let b = Filter::new().place("Springfield").sex("M").execute(&graph);
        assert_eq!(a, b);
    }

    #[test]
    fn name_prefix_matches_case_insensitively() {
        let graph = sample_graph();
        let ids = Filter::new().name_prefix("ja").execute(&graph);
        assert_eq!(ids.len(), 2);
    }
}
