//! The query result cache (C10): a bounded LRU keyed by operation name,
//! participant xrefs, and a predicate hash, wholesale-invalidated on any
//! graph mutation rather than tracked per-entry.

use std::hash::{Hash, Hasher};

use crate::cache::BoundedCache;

/// Identifies one cached query's inputs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryCacheKey {
    operation: String,
    participants: Vec<String>,
    options_hash: u64,
}

impl QueryCacheKey {
    /// Builds a key from an operation name, the xrefs of every individual
    /// involved (order matters, since e.g. `shortest_path(a, b)` and
    /// `shortest_path(b, a)` are cached separately), and a predicate hash
    /// from the options that shaped the query (see [`crate::query::filter::Filter::options_hash`]).
    #[must_use]
    pub fn new(operation: impl Into<String>, participants: &[&str], options_hash: u64) -> Self {
        QueryCacheKey {
            operation: operation.into(),
            participants: participants.iter().map(|s| (*s).to_string()).collect(),
            options_hash,
        }
    }

    /// A key for a predicate-free operation (e.g. `ancestors_of(a)`).
    #[must_use]
    pub fn simple(operation: impl Into<String>, participants: &[&str]) -> Self {
        Self::new(operation, participants, 0)
    }
}

/// A bounded cache of query results, keyed by [`QueryCacheKey`].
///
/// Cached values are `String`-serialized by the caller (typically a JSON
/// blob of the result) since the cache itself is generic over participants
/// but the result shapes vary per operation; this mirrors how the relational
/// store treats results as opaque payloads.
pub struct QueryCache {
    inner: BoundedCache<QueryCacheKey, String>,
}

impl QueryCache {
    /// Creates a cache holding at most `capacity` query results.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        QueryCache {
            inner: BoundedCache::new(capacity),
        }
    }

    /// Returns a cached result, if present.
    #[must_use]
    pub fn get(&self, key: &QueryCacheKey) -> Option<String> {
        self.inner.get(key)
    }

    /// Caches a result under `key`.
    pub fn put(&self, key: QueryCacheKey, value: String) {
        self.inner.put(key, value);
    }

    /// Drops every cached result. Call after any `AddNode`/`RemoveNode`/
    /// `AddEdge`/`RemoveEdge` mutation, since a cached path or relationship
    /// result has no cheap way to tell whether the mutation affected it.
    pub fn invalidate_all(&self) {
        self.inner.clear();
    }

    /// Number of results currently cached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// A stable hash of an arbitrary hashable options value, for use as a
/// [`QueryCacheKey`]'s `options_hash`.
pub fn hash_options<T: Hash>(value: &T) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_participant_order_is_a_distinct_key() {
        let cache = QueryCache::new(10);
        let forward = QueryCacheKey::simple("shortest_path", &["@A@", "@B@"]);
        let backward = QueryCacheKey::simple("shortest_path", &["@B@", "@A@"]);
        cache.put(forward.clone(), "forward-result".to_string());
        assert!(cache.get(&backward).is_none());
        assert_eq!(cache.get(&forward), Some("forward-result".to_string()));
    }

    #[test]
    fn invalidate_all_clears_every_entry() {
        let cache = QueryCache::new(10);
        cache.put(QueryCacheKey::simple("ancestors", &["@A@"]), "x".to_string());
        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
