//! # Data Module
//!
//! In-memory representation of the chain state.
//!
//! ## Design
//! - **Sorted sparse sets:** rows and columns hold sorted `u32` indices, so
//!   equal contents hash and compare equal without normalization.
//! - **Copy-on-insert keys:** the multiset index only stores `RowKey`
//!   snapshots and never aliases live storage.
//! - **One mutation path:** every toggle goes through `SparseMatrix`, which
//!   keeps row, column and edge views consistent.
//! - **Ordered sequences:** `MultiGraph` rows keep their order and may
//!   repeat a column; they are keyed as given, never sorted.

pub mod edge;
pub mod storage;

pub use edge::{Edge, EdgeSet};
pub use storage::{Bipartite, EqCounts, MultiGraph, MultisetIndex, RowKey, RowStorage, ScratchCounts, SparseMatrix};
