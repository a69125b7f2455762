//! # Matrix Storage
//!
//! ## Role
//! Sparse storage for the chain state.
//!
//! - `sparse`: sorted index sets (`RowStorage`) and by-value snapshots (`RowKey`)
//! - `matrix`: the `SparseMatrix` with row, column and edge views kept in sync
//! - `multigraph`: ordered rows with repeated columns, for sequence datasets
//! - `multiset`: identical-row counts keyed by `RowKey`

pub mod matrix;
pub mod multigraph;
pub mod multiset;
pub mod sparse;

pub use matrix::SparseMatrix;
pub use multigraph::MultiGraph;
pub use multiset::{EqCounts, MultisetIndex, ScratchCounts};
pub use sparse::{RowKey, RowStorage};

/// Read-only view of a bipartite state: rows on the left, columns on the
/// right, margins fixed for the lifetime of a chain.
pub trait Bipartite {
    fn n_rows(&self) -> usize;

    fn n_cols(&self) -> usize;

    /// Total number of edges, parallel edges counted separately
    fn n_edges(&self) -> usize;

    fn row_sums(&self) -> &[u32];

    fn col_sums(&self) -> &[u32];

    /// Column of every edge of row `r`, once per edge. This is also the
    /// content identical-row counting compares.
    fn row_entries(&self, r: usize) -> &[u32];
}

impl Bipartite for SparseMatrix {
    fn n_rows(&self) -> usize {
        SparseMatrix::n_rows(self)
    }

    fn n_cols(&self) -> usize {
        SparseMatrix::n_cols(self)
    }

    fn n_edges(&self) -> usize {
        SparseMatrix::n_edges(self)
    }

    fn row_sums(&self) -> &[u32] {
        SparseMatrix::row_sums(self)
    }

    fn col_sums(&self) -> &[u32] {
        SparseMatrix::col_sums(self)
    }

    fn row_entries(&self, r: usize) -> &[u32] {
        self.rows()[r].indices()
    }
}

impl Bipartite for MultiGraph {
    fn n_rows(&self) -> usize {
        MultiGraph::n_rows(self)
    }

    fn n_cols(&self) -> usize {
        MultiGraph::n_cols(self)
    }

    fn n_edges(&self) -> usize {
        MultiGraph::n_edges(self)
    }

    fn row_sums(&self) -> &[u32] {
        MultiGraph::row_sums(self)
    }

    fn col_sums(&self) -> &[u32] {
        MultiGraph::col_sums(self)
    }

    fn row_entries(&self, r: usize) -> &[u32] {
        &self.rows()[r]
    }
}
