//! Typed directed edges (C5).
//!
//! Every edge carries a deterministic string id (`from:kind:to`) so a
//! hybrid KV store can serialize and recover it without needing to mint a
//! fresh id on every rebuild (§4.7's crash/recovery contract: existence of
//! the relational row is the source of truth, the KV blob is derived and
//! reproducible).

use std::collections::BTreeMap;
use std::fmt;

use crate::record::Value;

/// The directed relationship an edge represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(any(feature = "json", feature = "hybrid"), derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeKind {
    /// `FAM -> INDI`, the family's husband.
    Husb,
    /// `FAM -> INDI`, the family's wife.
    Wife,
    /// `FAM -> INDI`, a family's child.
    Chil,
    /// `INDI -> FAM`, reverse of a spousal membership.
    Fams,
    /// `INDI -> FAM`, reverse of a child membership.
    Famc,
    /// `* -> NOTE`, a note reference.
    Note,
    /// `* -> SOUR`, a source citation reference.
    Sour,
    /// `SOUR -> REPO`, a repository reference.
    Repo,
    /// `INDI|FAM -> Event`, an owned event.
    HasEvent,
    /// Derived: `INDI -> INDI`, a biological or adoptive parent.
    Parent,
    /// Derived: `INDI -> INDI`, the reverse of [`EdgeKind::Parent`].
    Child,
    /// Derived: `INDI -> INDI`, a shared-parent sibling.
    Sibling,
    /// Derived: `INDI -> INDI`, a shared-family spouse.
    Spouse,
}

impl EdgeKind {
    /// The short tag used in an edge's deterministic id and in the relational
    /// schema's `edge_type` column.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            EdgeKind::Husb => "HUSB",
            EdgeKind::Wife => "WIFE",
            EdgeKind::Chil => "CHIL",
            EdgeKind::Fams => "FAMS",
            EdgeKind::Famc => "FAMC",
            EdgeKind::Note => "NOTE",
            EdgeKind::Sour => "SOUR",
            EdgeKind::Repo => "REPO",
            EdgeKind::HasEvent => "HAS_EVENT",
            EdgeKind::Parent => "PARENT",
            EdgeKind::Child => "CHILD",
            EdgeKind::Sibling => "SIBLING",
            EdgeKind::Spouse => "SPOUSE",
        }
    }

    /// `true` for edges that encode a blood relationship (used by
    /// relationship classification and path typing).
    #[must_use]
    pub fn is_blood(self) -> bool {
        matches!(
            self,
            EdgeKind::Chil | EdgeKind::Famc | EdgeKind::Parent | EdgeKind::Child | EdgeKind::Sibling
        )
    }

    /// `true` for edges that encode a marital relationship.
    #[must_use]
    pub fn is_marital(self) -> bool {
        matches!(
            self,
            EdgeKind::Husb | EdgeKind::Wife | EdgeKind::Fams | EdgeKind::Spouse
        )
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A single directed edge between two nodes, addressed by internal id.
///
/// Mirrors spec.md §4.7's `EdgeData = {fromID, toID, type, familyID?,
/// direction, properties}` KV contract: `direction` is implicit in
/// `from`/`to` (every edge here is already the directed, stored form, never
/// the synthesized reverse), but `family` and `properties` are carried
/// explicitly so the KV blob and the relational `edges` table stay
/// equivalent.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(any(feature = "json", feature = "hybrid"), derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    pub kind: EdgeKind,
    pub from: u32,
    pub to: u32,
    /// The family this edge belongs to, where one exists. For
    /// `HUSB`/`WIFE`/`CHIL` the family is the `FAM` node at `from`; for
    /// `FAMS`/`FAMC` it's the `FAM` node at `to`. `None` for note/source/
    /// event edges and for the derived relationship edges, none of which
    /// are scoped to a single family.
    pub family: Option<u32>,
    /// Open-ended edge metadata (currently always empty: no edge kind yet
    /// parses substructures of its own, but the field keeps the serialized
    /// shape stable if one does).
    pub properties: BTreeMap<String, Value>,
}

impl Edge {
    /// Creates an edge between two internal ids. `family` is derived from
    /// `kind`/`from`/`to` where the edge's own endpoints identify the
    /// family; `properties` starts empty.
    #[must_use]
    pub fn new(kind: EdgeKind, from: u32, to: u32) -> Self {
        let family = match kind {
            EdgeKind::Husb | EdgeKind::Wife | EdgeKind::Chil => Some(from),
            EdgeKind::Fams | EdgeKind::Famc => Some(to),
            _ => None,
        };
        Edge { kind, from, to, family, properties: BTreeMap::new() }
    }

    /// The edge's deterministic id, `from:KIND:to`.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}:{}:{}", self.from, self.kind.tag(), self.to)
    }
}
