//! The relational half of the hybrid store (C7): a SQLite index over node
//! identity, denormalized search fields, and connected-component ids.
//!
//! Existence of a row in `nodes` is the store's source of truth; the KV
//! store (`super::kv`) holds derived, reproducible blobs and is safe to
//! rebuild from this table after a crash (§4.7 crash/recovery contract).

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::GraphError;
use crate::graph::node::NodeKind;

/// 256 MiB, the mmap window spec.md §6 asks for.
const MMAP_SIZE_BYTES: i64 = 256 * 1024 * 1024;

// Column names here are part of the external contract (spec.md §6: "column
// names are part of the contract; external tools may read this store
// directly") and must not be renamed casually.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS nodes (
    id           INTEGER PRIMARY KEY,
    xref         TEXT NOT NULL UNIQUE,
    type         TEXT NOT NULL,
    name         TEXT,
    name_lower   TEXT,
    birth_date   TEXT,
    birth_place  TEXT,
    sex          TEXT,
    has_children INTEGER NOT NULL DEFAULT 0,
    has_spouse   INTEGER NOT NULL DEFAULT 0,
    living       INTEGER NOT NULL DEFAULT 0,
    created_at   INTEGER NOT NULL,
    updated_at   INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS xref_mapping (
    xref    TEXT PRIMARY KEY,
    node_id INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS components (
    node_id      INTEGER PRIMARY KEY,
    component_id INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_nodes_type ON nodes(type);
CREATE INDEX IF NOT EXISTS idx_nodes_name ON nodes(type, name_lower);
CREATE INDEX IF NOT EXISTS idx_nodes_birth_date ON nodes(birth_date);
CREATE INDEX IF NOT EXISTS idx_nodes_place ON nodes(birth_place);
CREATE INDEX IF NOT EXISTS idx_nodes_sex ON nodes(type, sex);
CREATE INDEX IF NOT EXISTS idx_nodes_flags ON nodes(has_children, has_spouse);
CREATE INDEX IF NOT EXISTS idx_nodes_name_lower_birth_date ON nodes(name_lower, birth_date);
CREATE INDEX IF NOT EXISTS idx_nodes_birth_place_birth_date ON nodes(birth_place, birth_date);
CREATE INDEX IF NOT EXISTS idx_components_component ON components(component_id);
";

/// One row of the `nodes` table, independent of the full [`super::super::graph::Node`]
/// payload carried in the KV store.
#[derive(Clone, Debug, Default)]
pub struct NodeRow {
    pub internal_id: u32,
    pub xref: String,
    pub kind: &'static str,
    pub name: Option<String>,
    pub sex: Option<String>,
    pub birth_date: Option<String>,
    pub birth_place: Option<String>,
    pub living: bool,
    pub has_children: bool,
    pub has_spouse: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

fn kind_str(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Individual => "INDI",
        NodeKind::Family => "FAM",
        NodeKind::Note => "NOTE",
        NodeKind::Source => "SOUR",
        NodeKind::Repository => "REPO",
        NodeKind::Event => "EVEN",
    }
}

/// The relational index half of the hybrid store.
pub struct RelationalStore {
    conn: Connection,
}

impl RelationalStore {
    /// Opens (creating if necessary) the SQLite file at `path`, applies the
    /// WAL/NORMAL/mmap pragmas from §6, and ensures the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] if the file can't be opened or
    /// the schema can't be applied.
    pub fn open(path: &std::path::Path) -> Result<Self, GraphError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "mmap_size", MMAP_SIZE_BYTES)?;
        conn.execute_batch(SCHEMA)?;
        Ok(RelationalStore { conn })
    }

    /// Opens an in-memory store, useful for tests.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] if the schema can't be applied.
    pub fn open_in_memory() -> Result<Self, GraphError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(RelationalStore { conn })
    }

    /// Inserts or replaces a node row.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on a SQL error.
    pub fn upsert_node(&self, row: &NodeRow) -> Result<(), GraphError> {
        let name_lower = row.name.as_ref().map(|n| n.to_lowercase());
        self.conn.execute(
            "INSERT INTO nodes (id, xref, type, name, name_lower, birth_date, birth_place, \
             sex, has_children, has_spouse, living, created_at, updated_at) \
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13) \
             ON CONFLICT(id) DO UPDATE SET \
             xref=excluded.xref, type=excluded.type, name=excluded.name, \
             name_lower=excluded.name_lower, birth_date=excluded.birth_date, \
             birth_place=excluded.birth_place, sex=excluded.sex, \
             has_children=excluded.has_children, has_spouse=excluded.has_spouse, \
             living=excluded.living, updated_at=excluded.updated_at",
            params![
                row.internal_id,
                row.xref,
                row.kind,
                row.name,
                name_lower,
                row.birth_date,
                row.birth_place,
                row.sex,
                row.has_children,
                row.has_spouse,
                row.living,
                row.created_at,
                row.updated_at,
            ],
        )?;
        self.conn.execute(
            "INSERT INTO xref_mapping (xref, node_id) VALUES (?1, ?2) \
             ON CONFLICT(xref) DO UPDATE SET node_id=excluded.node_id",
            params![row.xref, row.internal_id],
        )?;
        Ok(())
    }

    /// Deletes a node row and its xref mapping and component assignment.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on a SQL error.
    pub fn delete_node(&self, internal_id: u32) -> Result<(), GraphError> {
        self.conn.execute("DELETE FROM nodes WHERE id = ?1", params![internal_id])?;
        self.conn.execute(
            "DELETE FROM xref_mapping WHERE node_id = ?1",
            params![internal_id],
        )?;
        self.conn.execute(
            "DELETE FROM components WHERE node_id = ?1",
            params![internal_id],
        )?;
        Ok(())
    }

    /// Resolves an xref to an internal id.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on a SQL error.
    pub fn resolve_xref(&self, xref: &str) -> Result<Option<u32>, GraphError> {
        Ok(self
            .conn
            .query_row(
                "SELECT node_id FROM xref_mapping WHERE xref = ?1",
                params![xref],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Updates the `has_children`/`has_spouse` flags for a node (the final
    /// pass of the hybrid build pipeline).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on a SQL error.
    pub fn update_flags(&self, internal_id: u32, has_children: bool, has_spouse: bool) -> Result<(), GraphError> {
        self.conn.execute(
            "UPDATE nodes SET has_children = ?2, has_spouse = ?3 WHERE id = ?1",
            params![internal_id, has_children, has_spouse],
        )?;
        Ok(())
    }

    /// Records a node's connected-component id.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on a SQL error.
    pub fn set_component(&self, internal_id: u32, component_id: u32) -> Result<(), GraphError> {
        self.conn.execute(
            "INSERT INTO components (node_id, component_id) VALUES (?1, ?2) \
             ON CONFLICT(node_id) DO UPDATE SET component_id=excluded.component_id",
            params![internal_id, component_id],
        )?;
        Ok(())
    }

    /// Individuals whose `name` matches exactly.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on a SQL error.
    pub fn find_by_name_exact(&self, name: &str) -> Result<Vec<u32>, GraphError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM nodes WHERE type = 'INDI' AND name = ?1")?;
        let rows = stmt
            .query_map(params![name], |row| row.get(0))?
            .collect::<Result<Vec<u32>, _>>()?;
        Ok(rows)
    }

    /// Individuals whose `name` starts with `prefix` (case-insensitive).
    /// Falls back to a `LIKE` scan rather than FTS5, since FTS5 isn't
    /// guaranteed compiled into every `rusqlite` build configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on a SQL error.
    pub fn find_by_name_prefix(&self, prefix: &str) -> Result<Vec<u32>, GraphError> {
        let pattern = like_pattern(prefix, "{}%");
        self.name_lower_like(&pattern)
    }

    /// Individuals whose `name` contains `substring` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on a SQL error.
    pub fn find_by_name_substring(&self, substring: &str) -> Result<Vec<u32>, GraphError> {
        let pattern = like_pattern(substring, "%{}%");
        self.name_lower_like(&pattern)
    }

    /// Individuals whose `name` ends with `suffix` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on a SQL error.
    pub fn find_by_name_suffix(&self, suffix: &str) -> Result<Vec<u32>, GraphError> {
        let pattern = like_pattern(suffix, "%{}");
        self.name_lower_like(&pattern)
    }

    fn name_lower_like(&self, pattern: &str) -> Result<Vec<u32>, GraphError> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM nodes WHERE type = 'INDI' AND name_lower LIKE ?1 ESCAPE '\\'",
        )?;
        let rows = stmt
            .query_map(params![pattern], |row| row.get(0))?
            .collect::<Result<Vec<u32>, _>>()?;
        Ok(rows)
    }

    /// Individuals recorded at a given `birth_place`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on a SQL error.
    pub fn find_by_place(&self, place: &str) -> Result<Vec<u32>, GraphError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM nodes WHERE type = 'INDI' AND birth_place = ?1")?;
        let rows = stmt
            .query_map(params![place], |row| row.get(0))?
            .collect::<Result<Vec<u32>, _>>()?;
        Ok(rows)
    }

    /// Individuals whose `birth_place` contains `substring` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on a SQL error.
    pub fn find_by_place_substring(&self, substring: &str) -> Result<Vec<u32>, GraphError> {
        let pattern = like_pattern(substring, "%{}%");
        let mut stmt = self.conn.prepare(
            "SELECT id FROM nodes WHERE type = 'INDI' AND lower(birth_place) LIKE ?1 ESCAPE '\\'",
        )?;
        let rows = stmt
            .query_map(params![pattern], |row| row.get(0))?
            .collect::<Result<Vec<u32>, _>>()?;
        Ok(rows)
    }

    /// Individuals with a given `sex` value.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on a SQL error.
    pub fn find_by_sex(&self, sex: &str) -> Result<Vec<u32>, GraphError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM nodes WHERE type = 'INDI' AND sex = ?1")?;
        let rows = stmt
            .query_map(params![sex], |row| row.get(0))?
            .collect::<Result<Vec<u32>, _>>()?;
        Ok(rows)
    }

    /// Individuals flagged `has_children`/`has_spouse`/`living` (or the
    /// negation of each, when `value` is `false`).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on a SQL error.
    pub fn find_by_has_children(&self, value: bool) -> Result<Vec<u32>, GraphError> {
        self.find_by_flag("has_children", value)
    }

    /// See [`Self::find_by_has_children`].
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on a SQL error.
    pub fn find_by_has_spouse(&self, value: bool) -> Result<Vec<u32>, GraphError> {
        self.find_by_flag("has_spouse", value)
    }

    /// See [`Self::find_by_has_children`].
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on a SQL error.
    pub fn find_by_living(&self, value: bool) -> Result<Vec<u32>, GraphError> {
        self.find_by_flag("living", value)
    }

    fn find_by_flag(&self, column: &str, value: bool) -> Result<Vec<u32>, GraphError> {
        let sql = format!("SELECT id FROM nodes WHERE type = 'INDI' AND {column} = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![value], |row| row.get(0))?
            .collect::<Result<Vec<u32>, _>>()?;
        Ok(rows)
    }

    /// Individuals whose `birth_date` string falls lexicographically within
    /// `[from, to]` inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on a SQL error.
    pub fn find_by_birth_date_range(&self, from: &str, to: &str) -> Result<Vec<u32>, GraphError> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM nodes WHERE type = 'INDI' AND birth_date >= ?1 AND birth_date <= ?2",
        )?;
        let rows = stmt
            .query_map(params![from, to], |row| row.get(0))?
            .collect::<Result<Vec<u32>, _>>()?;
        Ok(rows)
    }

    /// All internal ids of a given node kind, for a full hybrid-mode scan.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StoreInitError`] on a SQL error.
    pub fn all_ids_of_kind(&self, kind: NodeKind) -> Result<Vec<u32>, GraphError> {
        let mut stmt = self.conn.prepare("SELECT id FROM nodes WHERE type = ?1")?;
        let rows = stmt
            .query_map(params![kind_str(kind)], |row| row.get(0))?
            .collect::<Result<Vec<u32>, _>>()?;
        Ok(rows)
    }
}

/// Builds a case-insensitive `LIKE` pattern from `value`, escaping SQLite's
/// own wildcards before substituting into `shape` (e.g. `"{}%"`).
fn like_pattern(value: &str, shape: &str) -> String {
    let escaped = value.to_lowercase().replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    shape.replacen("{}", &escaped, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_node_row() {
        let store = RelationalStore::open_in_memory().unwrap();
        store
            .upsert_node(&NodeRow {
                internal_id: 1,
                xref: "@I1@".to_string(),
                kind: "INDI",
                name: Some("Jane /Doe/".to_string()),
                sex: Some("F".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(store.resolve_xref("@I1@").unwrap(), Some(1));
        assert_eq!(store.find_by_name_exact("Jane /Doe/").unwrap(), vec![1]);
        assert_eq!(store.find_by_name_prefix("Jane").unwrap(), vec![1]);
    }

    #[test]
    fn delete_clears_all_tables() {
        let store = RelationalStore::open_in_memory().unwrap();
        store
            .upsert_node(&NodeRow {
                internal_id: 1,
                xref: "@I1@".to_string(),
                kind: "INDI",
                ..Default::default()
            })
            .unwrap();
        store.delete_node(1).unwrap();
        assert_eq!(store.resolve_xref("@I1@").unwrap(), None);
    }
}
