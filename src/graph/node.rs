//! Typed graph nodes (C5): one variant per record kind the graph
//! materializes, plus `Event`, which `HAS_EVENT` edges point at.

use std::collections::BTreeMap;

use crate::record::{EventType, Value};

/// The five record-backed node kinds plus the synthesized `Event` kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(any(feature = "json", feature = "hybrid"), derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    Individual,
    Family,
    Note,
    Source,
    Repository,
    Event,
}

/// Per-kind payload. Anything not pulled out into a dedicated field lives in
/// `properties`, the dynamic open-tag map from spec.md §9.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(any(feature = "json", feature = "hybrid"), derive(serde::Serialize, serde::Deserialize))]
pub enum NodeData {
    Individual(IndividualData),
    Family(FamilyData),
    Note(NoteData),
    Source(SourceData),
    Repository(RepositoryData),
    Event(EventData),
}

impl NodeData {
    /// The [`NodeKind`] this payload belongs to.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Individual(_) => NodeKind::Individual,
            NodeData::Family(_) => NodeKind::Family,
            NodeData::Note(_) => NodeKind::Note,
            NodeData::Source(_) => NodeKind::Source,
            NodeData::Repository(_) => NodeKind::Repository,
            NodeData::Event(_) => NodeKind::Event,
        }
    }
}

/// An individual's denormalized, queryable fields.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(any(feature = "json", feature = "hybrid"), derive(serde::Serialize, serde::Deserialize))]
pub struct IndividualData {
    pub name: Option<String>,
    pub sex: Option<String>,
    pub birth_date: Option<String>,
    pub birth_place: Option<String>,
    pub death_date: Option<String>,
    pub death_place: Option<String>,
    /// `true` when the individual has no `DEAT` event and no death date;
    /// a coarse liveness proxy, not a birth-date-driven age calculation
    /// (spec.md Non-goals: authoritative date arithmetic).
    pub living: bool,
    pub properties: BTreeMap<String, Value>,
}

/// A family's denormalized fields; membership itself lives in edges
/// (`HUSB`/`WIFE`/`CHIL`), not here.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(any(feature = "json", feature = "hybrid"), derive(serde::Serialize, serde::Deserialize))]
pub struct FamilyData {
    pub marriage_date: Option<String>,
    pub marriage_place: Option<String>,
    pub properties: BTreeMap<String, Value>,
}

/// A standalone or inline-promoted note's text.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(any(feature = "json", feature = "hybrid"), derive(serde::Serialize, serde::Deserialize))]
pub struct NoteData {
    pub text: String,
}

/// A source citation record's denormalized fields.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(any(feature = "json", feature = "hybrid"), derive(serde::Serialize, serde::Deserialize))]
pub struct SourceData {
    pub title: Option<String>,
    pub author: Option<String>,
    pub properties: BTreeMap<String, Value>,
}

/// A repository record's denormalized fields.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(any(feature = "json", feature = "hybrid"), derive(serde::Serialize, serde::Deserialize))]
pub struct RepositoryData {
    pub name: Option<String>,
    pub properties: BTreeMap<String, Value>,
}

/// A synthesized event node, materialized from an `INDI`/`FAM` event
/// substructure and reachable from its owner via `HAS_EVENT`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(any(feature = "json", feature = "hybrid"), derive(serde::Serialize, serde::Deserialize))]
pub struct EventData {
    pub event_type: EventType,
    pub date: Option<String>,
    pub place: Option<String>,
    pub description: Option<String>,
    pub properties: BTreeMap<String, Value>,
}

/// A single graph node: its process-local `internal_id`, its stable
/// `xref`, and its typed payload.
///
/// `internal_id` is assigned monotonically starting at 1; 0 is reserved to
/// mean "invalid" and is never handed out (spec.md §3 node identity
/// invariant).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(any(feature = "json", feature = "hybrid"), derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub internal_id: u32,
    pub xref: String,
    pub data: NodeData,
}

impl Node {
    /// The node's kind.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }
}
