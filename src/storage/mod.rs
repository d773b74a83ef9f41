//! Hybrid storage (C7): a relational index paired with an embedded KV
//! store, gated behind the `hybrid` feature.

pub mod hybrid;
pub mod kv;
pub mod relational;

pub use hybrid::HybridStore;
pub use kv::KvStore;
pub use relational::{NodeRow, RelationalStore};
