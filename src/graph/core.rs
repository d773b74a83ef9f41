//! The graph core (C5): typed nodes and edges behind a single
//! `parking_lot::RwLock`, per spec.md §4.5/§5 "single RWMutex guards all
//! graph maps."

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::GraphError;

use super::edge::{Edge, EdgeKind};
use super::index::GraphIndex;
use super::node::{IndividualData, Node, NodeData, NodeKind};

/// A nullable per-graph debug sink (spec.md §9 "Debug logging is routed
/// through a per-graph sink"), distinct from the crate's ambient `log`
/// facade used for operational diagnostics.
pub type DebugSink = Arc<dyn Fn(&str) + Send + Sync>;

pub(crate) struct GraphInner {
    /// Slot 0 is always `None`; internal ids are 1-based.
    nodes: Vec<Option<Node>>,
    xref_to_id: HashMap<String, u32>,
    out_edges: HashMap<u32, Vec<Edge>>,
    in_edges: HashMap<u32, Vec<Edge>>,
    index: GraphIndex,
    debug_sink: Option<DebugSink>,
}

impl GraphInner {
    fn new() -> Self {
        GraphInner {
            nodes: vec![None],
            xref_to_id: HashMap::new(),
            out_edges: HashMap::new(),
            in_edges: HashMap::new(),
            index: GraphIndex::new(),
            debug_sink: None,
        }
    }

    fn debug(&self, msg: &str) {
        if let Some(sink) = &self.debug_sink {
            sink(msg);
        }
    }
}

/// The in-memory genealogy graph.
///
/// Cheaply cloneable: clones share the same lock and storage, so passing a
/// `Graph` into the query engine or cache layer doesn't copy graph state.
#[derive(Clone)]
pub struct Graph {
    pub(crate) inner: Arc<RwLock<GraphInner>>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Graph {
            inner: Arc::new(RwLock::new(GraphInner::new())),
        }
    }

    /// Installs a debug sink that receives a line of text for notable
    /// internal events (node/edge mutation, relationship reindexing).
    pub fn set_debug_sink(&self, sink: Option<DebugSink>) {
        self.inner.write().debug_sink = sink;
    }

    /// Number of live (non-tombstoned) nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.inner.read().nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Number of edges across the whole graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.read().out_edges.values().map(Vec::len).sum()
    }

    /// Looks up a node by xref.
    #[must_use]
    pub fn get_by_xref(&self, xref: &str) -> Option<Node> {
        let inner = self.inner.read();
        let id = *inner.xref_to_id.get(xref)?;
        inner.nodes[id as usize].clone()
    }

    /// Looks up a node by internal id.
    #[must_use]
    pub fn get_by_id(&self, id: u32) -> Option<Node> {
        let inner = self.inner.read();
        inner.nodes.get(id as usize).and_then(Clone::clone)
    }

    /// Resolves an xref to its internal id.
    #[must_use]
    pub fn id_for_xref(&self, xref: &str) -> Option<u32> {
        self.inner.read().xref_to_id.get(xref).copied()
    }

    /// Outgoing edges from a node, empty if the node has none or doesn't
    /// exist.
    #[must_use]
    pub fn out_edges(&self, id: u32) -> Vec<Edge> {
        self.inner.read().out_edges.get(&id).cloned().unwrap_or_default()
    }

    /// Incoming edges to a node.
    #[must_use]
    pub fn in_edges(&self, id: u32) -> Vec<Edge> {
        self.inner.read().in_edges.get(&id).cloned().unwrap_or_default()
    }

    /// Adds a new node under a fresh xref.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::AlreadyExists`] if the xref is already in use.
    pub fn add_node(&self, xref: String, data: NodeData) -> Result<u32, GraphError> {
        let mut inner = self.inner.write();
        if inner.xref_to_id.contains_key(&xref) {
            return Err(GraphError::AlreadyExists { what: xref });
        }
        let id = u32::try_from(inner.nodes.len()).expect("node count fits in u32");
        if let NodeData::Individual(data) = &data {
            inner.index.on_add_individual(id, data);
        }
        inner.xref_to_id.insert(xref.clone(), id);
        inner.nodes.push(Some(Node {
            internal_id: id,
            xref: xref.clone(),
            data,
        }));
        inner.debug(&format!("add_node {xref} -> {id}"));
        Ok(id)
    }

    /// Removes a node and every edge incident to it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the xref doesn't exist.
    pub fn remove_node(&self, xref: &str) -> Result<(), GraphError> {
        let mut inner = self.inner.write();
        let Some(&id) = inner.xref_to_id.get(xref) else {
            return Err(GraphError::NodeNotFound {
                xref: xref.to_string(),
            });
        };

        let out = inner.out_edges.remove(&id).unwrap_or_default();
        let inc = inner.in_edges.remove(&id).unwrap_or_default();
        for edge in out.iter().chain(inc.iter()) {
            let other = if edge.from == id { edge.to } else { edge.from };
            if let Some(others_out) = inner.out_edges.get_mut(&other) {
                others_out.retain(|e| e.id() != edge.id());
            }
            if let Some(others_in) = inner.in_edges.get_mut(&other) {
                others_in.retain(|e| e.id() != edge.id());
            }
        }

        inner.xref_to_id.remove(xref);
        if let Some(Some(node)) = inner.nodes.get(id as usize) {
            if let NodeData::Individual(data) = &node.data {
                let data = data.clone();
                inner.index.on_remove_individual(id, &data);
            }
        }
        inner.nodes[id as usize] = None;
        inner.debug(&format!("remove_node {xref}"));
        Ok(())
    }

    /// Adds a directed edge between two existing nodes.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if either endpoint doesn't
    /// exist, or [`GraphError::AlreadyExists`] if the identical edge
    /// (same kind and endpoints) is already present.
    pub fn add_edge(&self, kind: EdgeKind, from: u32, to: u32) -> Result<(), GraphError> {
        let mut inner = self.inner.write();
        if inner.nodes.get(from as usize).and_then(Option::as_ref).is_none() {
            return Err(GraphError::NodeNotFound {
                xref: from.to_string(),
            });
        }
        if inner.nodes.get(to as usize).and_then(Option::as_ref).is_none() {
            return Err(GraphError::NodeNotFound {
                xref: to.to_string(),
            });
        }
        let edge = Edge::new(kind, from, to);
        let id = edge.id();
        if inner
            .out_edges
            .get(&from)
            .is_some_and(|v| v.iter().any(|e| e.id() == id))
        {
            return Err(GraphError::AlreadyExists { what: id });
        }
        inner.out_edges.entry(from).or_default().push(edge.clone());
        inner.in_edges.entry(to).or_default().push(edge);

        self.update_relationship_flag_for_edge(&mut inner, kind, from, to, true);
        inner.debug(&format!("add_edge {id}"));
        Ok(())
    }

    /// Removes a specific directed edge.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EdgeNotFound`] if no matching edge exists.
    pub fn remove_edge(&self, kind: EdgeKind, from: u32, to: u32) -> Result<(), GraphError> {
        let mut inner = self.inner.write();
        let edge = Edge::new(kind, from, to);
        let id = edge.id();
        let Some(out) = inner.out_edges.get_mut(&from) else {
            return Err(GraphError::EdgeNotFound { id });
        };
        let before = out.len();
        out.retain(|e| e.id() != id);
        if out.len() == before {
            return Err(GraphError::EdgeNotFound { id });
        }
        if let Some(inc) = inner.in_edges.get_mut(&to) {
            inc.retain(|e| e.id() != id);
        }
        self.update_relationship_flag_for_edge(&mut inner, kind, from, to, false);
        inner.debug(&format!("remove_edge {id}"));
        Ok(())
    }

    fn update_relationship_flag_for_edge(
        &self,
        inner: &mut GraphInner,
        kind: EdgeKind,
        from: u32,
        to: u32,
        _added: bool,
    ) {
        match kind {
            // `from` is the family, `to` the child: the flag belongs to the
            // family's HUSB/WIFE, not to the family node itself.
            EdgeKind::Chil => {
                let has_any = inner
                    .out_edges
                    .get(&from)
                    .is_some_and(|es| es.iter().any(|e| e.kind == EdgeKind::Chil));
                let parents: Vec<u32> = inner
                    .out_edges
                    .get(&from)
                    .map(|es| {
                        es.iter()
                            .filter(|e| matches!(e.kind, EdgeKind::Husb | EdgeKind::Wife))
                            .map(|e| e.to)
                            .collect()
                    })
                    .unwrap_or_default();
                for parent in parents {
                    inner.index.set_has_children(parent, has_any);
                }
                let _ = to;
            }
            // `from` is the individual, `to` the family they're a spouse in.
            EdgeKind::Fams => {
                let has_any = inner
                    .out_edges
                    .get(&from)
                    .is_some_and(|es| es.iter().any(|e| e.kind == EdgeKind::Fams));
                inner.index.set_has_spouse(from, has_any);
            }
            _ => {}
        }
    }

    /// Recomputes `has_children`/`has_spouse` flags for every individual
    /// from the current edge set, holding the lock for the entire pass so
    /// no mutation is observed mid-reindex (spec.md §9 open question).
    pub fn reindex_relationship_flags(&self) {
        let mut inner = self.inner.write();
        let ids: Vec<u32> = inner
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| {
                let n = n.as_ref()?;
                (n.kind() == NodeKind::Individual).then_some(i as u32)
            })
            .collect();
        for id in ids {
            let linked_families: Vec<u32> = inner
                .out_edges
                .get(&id)
                .map(|es| es.iter().filter(|e| e.kind == EdgeKind::Fams).map(|e| e.to).collect())
                .unwrap_or_default();
            let has_children = linked_families.iter().any(|fam| {
                inner
                    .out_edges
                    .get(fam)
                    .is_some_and(|es| es.iter().any(|e| e.kind == EdgeKind::Chil))
            });
            inner.index.set_has_children(id, has_children);
            inner.index.set_has_spouse(id, !linked_families.is_empty());
        }
        inner.debug("reindex_relationship_flags complete");
    }

    /// Read-only access to the secondary index set, for the query engine.
    pub fn with_index<R>(&self, f: impl FnOnce(&GraphIndex) -> R) -> R {
        let inner = self.inner.read();
        f(&inner.index)
    }

    /// Returns every live node, in internal id order.
    #[must_use]
    pub fn all_nodes(&self) -> Vec<Node> {
        self.inner.read().nodes.iter().flatten().cloned().collect()
    }
}

pub(crate) fn individual_data_mut<'a>(node: &'a mut Node) -> Option<&'a mut IndividualData> {
    match &mut node.data {
        NodeData::Individual(data) => Some(data),
        _ => None,
    }
}
