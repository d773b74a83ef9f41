//! The embedded KV half of the hybrid store (C7): `node:{id}` and
//! `edges:{id}:out` blobs, each prefixed with a 4-byte magic and a 1-byte
//! format version so a future format change can be detected on open
//! instead of silently misreading old data.

use crate::error::GraphError;
use crate::graph::edge::Edge;
use crate::graph::node::Node;

const MAGIC: [u8; 4] = *b"GGK1";
const VERSION: u8 = 1;

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, GraphError> {
    let body =
        bincode::serialize(value).map_err(|e| GraphError::StoreInitError(e.to_string()))?;
    let mut out = Vec::with_capacity(5 + body.len());
    out.extend_from_slice(&MAGIC);
    out.push(VERSION);
    out.extend_from_slice(&body);
    Ok(out)
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, GraphError> {
    if bytes.len() < 5 || bytes[0..4] != MAGIC {
        return Err(GraphError::StoreInitError(
            "corrupt KV record: bad magic".to_string(),
        ));
    }
    let found = bytes[4];
    if found != VERSION {
        return Err(GraphError::StoreVersionMismatch {
            found,
            expected: VERSION,
        });
    }
    bincode::deserialize(&bytes[5..]).map_err(|e| GraphError::StoreInitError(e.to_string()))
}

fn node_key(id: u32) -> String {
    format!("node:{id}")
}

fn out_edges_key(id: u32) -> String {
    format!("edges:{id}:out")
}

/// The embedded KV half of the hybrid store.
pub struct KvStore {
    db: sled::Db,
}

impl KvStore {
    /// Opens (creating if necessary) the sled database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] if the database can't be
    /// opened.
    pub fn open(path: &std::path::Path) -> Result<Self, GraphError> {
        let db = sled::open(path)?;
        Ok(KvStore { db })
    }

    /// Opens a temporary in-memory-backed database, for tests.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] if sled's config fails to
    /// build.
    pub fn open_temporary() -> Result<Self, GraphError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()?;
        Ok(KvStore { db })
    }

    /// Writes a node's full payload.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on an I/O or encoding error.
    pub fn put_node(&self, node: &Node) -> Result<(), GraphError> {
        self.db.insert(node_key(node.internal_id), encode(node)?)?;
        Ok(())
    }

    /// Reads back a node's full payload, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreVersionMismatch`] if the stored record's
    /// version byte doesn't match what this build understands, or
    /// [`GraphError::StoreInitError`] on a corrupt or unreadable record.
    pub fn get_node(&self, id: u32) -> Result<Option<Node>, GraphError> {
        match self.db.get(node_key(id))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Deletes a node's blob.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on an I/O error.
    pub fn delete_node(&self, id: u32) -> Result<(), GraphError> {
        self.db.remove(node_key(id))?;
        Ok(())
    }

    /// Writes a node's outgoing edge list.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on an I/O or encoding error.
    pub fn put_out_edges(&self, id: u32, edges: &[Edge]) -> Result<(), GraphError> {
        self.db
            .insert(out_edges_key(id), encode(&edges.to_vec())?)?;
        Ok(())
    }

    /// Reads back a node's outgoing edge list. A missing key means "no
    /// edges", not an error (§4.7: missing KV edges mean empty).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreVersionMismatch`] or
    /// [`GraphError::StoreInitError`] as in [`KvStore::get_node`].
    pub fn get_out_edges(&self, id: u32) -> Result<Vec<Edge>, GraphError> {
        match self.db.get(out_edges_key(id))? {
            Some(bytes) => decode(&bytes),
            None => Ok(Vec::new()),
        }
    }

    /// Deletes a node's outgoing edge list blob.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on an I/O error.
    pub fn delete_out_edges(&self, id: u32) -> Result<(), GraphError> {
        self.db.remove(out_edges_key(id))?;
        Ok(())
    }

    /// Flushes pending writes to disk.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on an I/O error.
    pub fn flush(&self) -> Result<(), GraphError> {
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::edge::EdgeKind;
    use crate::graph::node::{NodeData, NoteData};

    fn sample_node(id: u32) -> Node {
        Node {
            internal_id: id,
            xref: format!("@N{id}@"),
            data: NodeData::Note(NoteData {
                text: "hello".to_string(),
            }),
        }
    }

    #[test]
    fn round_trips_node_and_edges() {
        let store = KvStore::open_temporary().unwrap();
        let node = sample_node(1);
        store.put_node(&node).unwrap();
        assert_eq!(store.get_node(1).unwrap(), Some(node));

        let edges = vec![Edge::new(EdgeKind::Note, 1, 2)];
        store.put_out_edges(1, &edges).unwrap();
        assert_eq!(store.get_out_edges(1).unwrap(), edges);
    }

    #[test]
    fn missing_edges_is_empty_not_an_error() {
        let store = KvStore::open_temporary().unwrap();
        assert_eq!(store.get_out_edges(42).unwrap(), Vec::new());
    }

    #[test]
    fn rejects_bad_version_byte() {
        let store = KvStore::open_temporary().unwrap();
        let mut bad = Vec::new();
        bad.extend_from_slice(&MAGIC);
        bad.push(VERSION + 1);
        store.db.insert(node_key(7), bad).unwrap();
        let err = store.get_node(7).unwrap_err();
        assert!(matches!(err, GraphError::StoreVersionMismatch { .. }));
    }
}
