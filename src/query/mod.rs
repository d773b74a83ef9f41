//! The query engine (C9/C10): individual search, ancestry/descent
//! traversal, relationship and path classification, and the result cache
//! that sits in front of all of it.

pub mod cache;
pub mod filter;
pub mod path;
pub mod relationship;
pub mod traverse;

pub use cache::{QueryCache, QueryCacheKey};
pub use filter::Filter;
pub use path::PathKind;
pub use relationship::Relationship;
