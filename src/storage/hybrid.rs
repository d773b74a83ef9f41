//! Ties the relational index and the embedded KV store together into the
//! four-step hybrid build pipeline of spec.md §4.7:
//!
//! 1. relational pass — every node gets a row in `nodes`/`xref_mapping`
//! 2. KV node serialization — every node's full payload is written to `kv`
//! 3. edge computation — every node's outgoing edges are written to `kv`
//! 4. flag update pass — `has_children`/`has_spouse` are recomputed and
//!    written back to the relational rows
//!
//! The relational store is the existence source of truth; a KV store that
//! is behind (or missing entirely) can always be rebuilt by re-running this
//! pipeline over the in-memory graph.

use std::path::Path;

use crate::error::GraphError;
use crate::graph::edge::EdgeKind;
use crate::graph::node::{NodeData, NodeKind};
use crate::graph::Graph;

use super::kv::KvStore;
use super::relational::{NodeRow, RelationalStore};

/// The combined relational + KV store backing a hybrid-mode graph.
pub struct HybridStore {
    pub relational: RelationalStore,
    pub kv: KvStore,
}

impl HybridStore {
    /// Opens (creating if necessary) both halves of the store under `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] if either half fails to open.
    pub fn open(dir: &Path) -> Result<Self, GraphError> {
        std::fs::create_dir_all(dir)?;
        let relational = RelationalStore::open(&dir.join("index.sqlite3"))?;
        let kv = KvStore::open(&dir.join("kv"))?;
        Ok(HybridStore { relational, kv })
    }

    /// Opens a temporary, test-only store backed by an in-memory SQLite
    /// connection and a temporary sled database.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] if either half fails to open.
    pub fn open_temporary() -> Result<Self, GraphError> {
        Ok(HybridStore {
            relational: RelationalStore::open_in_memory()?,
            kv: KvStore::open_temporary()?,
        })
    }

    /// Runs the full four-step build pipeline against an in-memory graph,
    /// persisting it into this store.
    ///
    /// # Errors
    ///
    /// Returns the first [`GraphError`] encountered; the store may be left
    /// partially written (callers writing to a fresh, empty store directory
    /// can simply retry by rebuilding from the in-memory graph).
    pub fn build(&self, graph: &Graph) -> Result<(), GraphError> {
        let nodes = graph.all_nodes();

        for node in &nodes {
            self.relational.upsert_node(&node_row(node))?;
        }
        log::debug!("hybrid build: relational pass wrote {} rows", nodes.len());

        for node in &nodes {
            self.kv.put_node(node)?;
        }
        log::debug!("hybrid build: kv node pass wrote {} blobs", nodes.len());

        for node in &nodes {
            let edges = graph.out_edges(node.internal_id);
            self.kv.put_out_edges(node.internal_id, &edges)?;
        }
        log::debug!("hybrid build: kv edge pass complete");

        for node in &nodes {
            if node.kind() != NodeKind::Individual {
                continue;
            }
            // `Chil` edges run FAM -> INDI, so an individual's own
            // out-edges never carry one directly; has_children is derived
            // through the families this individual belongs to (`Fams`),
            // the same resolution `Graph::reindex_relationship_flags` uses.
            let out = graph.out_edges(node.internal_id);
            let has_children = out
                .iter()
                .filter(|e| e.kind == EdgeKind::Fams)
                .any(|e| graph.out_edges(e.to).iter().any(|fe| fe.kind == EdgeKind::Chil));
            let has_spouse = out.iter().any(|e| e.kind == EdgeKind::Fams);
            self.relational
                .update_flags(node.internal_id, has_children, has_spouse)?;
        }
        log::debug!("hybrid build: flag update pass complete");

        self.kv.flush()?;
        Ok(())
    }
}

fn node_row(node: &crate::graph::node::Node) -> NodeRow {
    let now = chrono::Utc::now().timestamp();
    let mut row = NodeRow {
        internal_id: node.internal_id,
        xref: node.xref.clone(),
        kind: kind_tag(node.kind()),
        created_at: now,
        updated_at: now,
        ..Default::default()
    };
    if let NodeData::Individual(data) = &node.data {
        row.name = data.name.clone();
        row.sex = data.sex.clone();
        row.birth_date = data.birth_date.clone();
        row.birth_place = data.birth_place.clone();
        row.living = data.living;
    }
    row
}

fn kind_tag(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Individual => "INDI",
        NodeKind::Family => "FAM",
        NodeKind::Note => "NOTE",
        NodeKind::Source => "SOUR",
        NodeKind::Repository => "REPO",
        NodeKind::Event => "EVEN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_graph, GraphBuilderOptions};
    use crate::record::parse_serial;

    #[test]
    fn build_pipeline_round_trips_through_both_halves() {
        let text = "0 @I1@ INDI\n1 NAME Jane /Doe/\n1 SEX F\n1 FAMS @F1@\n\
0 @I2@ INDI\n1 NAME John /Doe/\n1 FAMS @F1@\n\
0 @F1@ FAM\n1 HUSB @I2@\n1 WIFE @I1@\n";
        let (tree, _) = parse_serial(text).unwrap();
        let (graph, _) = build_graph(&tree, &GraphBuilderOptions::new());

        let store = HybridStore::open_temporary().unwrap();
        store.build(&graph).unwrap();

        let jane_id = graph.id_for_xref("@I1@").unwrap();
        assert_eq!(store.relational.resolve_xref("@I1@").unwrap(), Some(jane_id));
        let node = store.kv.get_node(jane_id).unwrap().unwrap();
        assert_eq!(node.xref, "@I1@");
        let edges = store.kv.get_out_edges(jane_id).unwrap();
        assert!(edges.iter().any(|e| e.kind == EdgeKind::Fams));
    }
}
