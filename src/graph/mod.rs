//! The graph core (C5) and its secondary index layer (C6).

pub mod core;
pub mod edge;
pub mod index;
pub mod node;

pub use core::{DebugSink, Graph};
pub use edge::{Edge, EdgeKind};
pub use index::GraphIndex;
pub use node::{
    EventData, FamilyData, IndividualData, Node, NodeData, NodeKind, NoteData, RepositoryData,
    SourceData,
};
