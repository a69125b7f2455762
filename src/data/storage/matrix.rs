//! # Sparse Bit-Matrix
//!
//! ## Role
//! The chain state: a fixed `n_rows × n_cols` 0/1 matrix kept three ways at
//! once (row-major sets, column-major sets, the global edge set).
//!
//! ## Invariants
//! - Row and column sums are cached at construction and never change.
//! - `is_set(r, c)` ⇔ `c ∈ rows[r]` ⇔ `r ∈ cols[c]` ⇔ `(r, c) ∈ edges`.
//! - The only mutation entry points are [`SparseMatrix::swap_edges`] and
//!   [`SparseMatrix::apply_trade`]; both validate before touching anything,
//!   so a rejected move leaves every view unchanged.

use crate::data::edge::{Edge, EdgeSet};
use crate::data::storage::sparse::RowStorage;
use crate::error::{Result, SwapError};
use crate::model::proposal::{Axis, CurveballTrade, EdgeSwap};

/// Sparse 0/1 matrix with fixed margins
#[derive(Clone, Debug)]
pub struct SparseMatrix {
    rows: Vec<RowStorage>,
    cols: Vec<RowStorage>,
    row_sums: Vec<u32>,
    col_sums: Vec<u32>,
    edges: EdgeSet,
}

impl SparseMatrix {
    /// Empty matrix of the given shape
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            rows: vec![RowStorage::new(); n_rows],
            cols: vec![RowStorage::new(); n_cols],
            row_sums: vec![0; n_rows],
            col_sums: vec![0; n_cols],
            edges: EdgeSet::new(),
        }
    }

    /// Build from per-row column indices. Duplicates within a row collapse.
    pub fn from_rows(n_cols: usize, rows: Vec<Vec<u32>>) -> Result<Self> {
        let n_rows = rows.len();
        check_dimensions(n_rows, n_cols)?;
        let mut edges = Vec::new();
        for (r, row) in rows.into_iter().enumerate() {
            for c in row {
                edges.push(Edge::new(r as u32, c));
            }
        }
        Self::from_edges(n_rows, n_cols, edges)
    }

    /// Build from a list of 1-positions
    pub fn from_edges(n_rows: usize, n_cols: usize, edges: impl IntoIterator<Item = Edge>) -> Result<Self> {
        check_dimensions(n_rows, n_cols)?;

        let mut row_idx: Vec<Vec<u32>> = vec![Vec::new(); n_rows];
        let mut col_idx: Vec<Vec<u32>> = vec![Vec::new(); n_cols];
        let mut edge_set = EdgeSet::new();

        for edge in edges {
            if edge.row_usize() >= n_rows {
                return Err(SwapError::invalid_matrix(format!(
                    "row index {} out of range for {} rows",
                    edge.row, n_rows
                )));
            }
            if edge.col_usize() >= n_cols {
                return Err(SwapError::invalid_matrix(format!(
                    "column index {} out of range for {} columns",
                    edge.col, n_cols
                )));
            }
            if edge_set.insert(edge) {
                row_idx[edge.row_usize()].push(edge.col);
                col_idx[edge.col_usize()].push(edge.row);
            }
        }

        let rows: Vec<RowStorage> = row_idx.into_iter().map(RowStorage::from_indices).collect();
        let cols: Vec<RowStorage> = col_idx.into_iter().map(RowStorage::from_indices).collect();
        let row_sums = rows.iter().map(|r| r.len() as u32).collect();
        let col_sums = cols.iter().map(|c| c.len() as u32).collect();

        Ok(Self {
            rows,
            cols,
            row_sums,
            col_sums,
            edges: edge_set,
        })
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.cols.len()
    }

    /// Number of ones
    #[inline]
    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn is_set(&self, row: u32, col: u32) -> bool {
        self.edges.contains(&Edge::new(row, col))
    }

    #[inline]
    pub fn row(&self, row: u32) -> &RowStorage {
        &self.rows[row as usize]
    }

    #[inline]
    pub fn col(&self, col: u32) -> &RowStorage {
        &self.cols[col as usize]
    }

    /// Sorted column indices of the ones in `row`
    #[inline]
    pub fn row_nonzero(&self, row: u32) -> &[u32] {
        self.rows[row as usize].indices()
    }

    /// Sorted row indices of the ones in `col`
    #[inline]
    pub fn col_nonzero(&self, col: u32) -> &[u32] {
        self.cols[col as usize].indices()
    }

    #[inline]
    pub fn row_sum(&self, row: u32) -> u32 {
        self.row_sums[row as usize]
    }

    #[inline]
    pub fn col_sum(&self, col: u32) -> u32 {
        self.col_sums[col as usize]
    }

    pub fn row_sums(&self) -> &[u32] {
        &self.row_sums
    }

    pub fn col_sums(&self) -> &[u32] {
        &self.col_sums
    }

    pub fn edges(&self) -> &EdgeSet {
        &self.edges
    }

    pub fn rows(&self) -> &[RowStorage] {
        &self.rows
    }

    pub fn cols(&self) -> &[RowStorage] {
        &self.cols
    }

    /// Per-row column indices (inverse of `from_rows`)
    pub fn to_rows(&self) -> Vec<Vec<u32>> {
        self.rows.iter().map(|r| r.indices().to_vec()).collect()
    }

    /// Check that `swap` can be applied to the current state
    pub fn ensure_swappable(&self, swap: &EdgeSwap) -> Result<()> {
        let (first, second) = (swap.first, swap.second);
        if first.row == second.row || first.col == second.col {
            return Err(SwapError::invariant(format!(
                "swap {:?} <-> {:?} shares a row or column",
                first, second
            )));
        }
        for edge in [first, second] {
            if edge.row_usize() >= self.n_rows() || edge.col_usize() >= self.n_cols() {
                return Err(SwapError::invariant(format!("swap edge {:?} outside the matrix", edge)));
            }
            if !self.edges.contains(&edge) {
                return Err(SwapError::invariant(format!("swap removes absent edge {:?}", edge)));
            }
        }
        let (new_first, new_second) = swap.new_edges();
        for edge in [new_first, new_second] {
            if self.edges.contains(&edge) {
                return Err(SwapError::invariant(format!("swap inserts existing edge {:?}", edge)));
            }
        }
        Ok(())
    }

    /// Replace `(r1,c1),(r2,c2)` by `(r1,c2),(r2,c1)`.
    ///
    /// Validated first; on error nothing has been mutated.
    pub fn swap_edges(&mut self, swap: &EdgeSwap) -> Result<()> {
        self.ensure_swappable(swap)?;
        self.toggle(swap);
        Ok(())
    }

    /// Check that every elementary swap of `trade` is applicable and that
    /// together they produce the proposed contents.
    ///
    /// The elementary swaps of a trade touch pairwise distinct positions, so
    /// checking each against the current state is sufficient.
    pub fn ensure_tradeable(&self, trade: &CurveballTrade) -> Result<()> {
        for swap in &trade.swaps {
            self.ensure_swappable(swap)?;
        }

        let (first, second) = self.traded_contents(trade);
        if first != trade.new_first || second != trade.new_second {
            return Err(SwapError::invariant(format!(
                "{:?} trade of {} and {} does not reach the proposed contents",
                trade.axis, trade.first, trade.second
            )));
        }
        Ok(())
    }

    /// Contents of the traded pair once every elementary swap is applied
    fn traded_contents(&self, trade: &CurveballTrade) -> (Vec<u32>, Vec<u32>) {
        let (first, second) = trade.current_contents(self);
        let (mut first, mut second) = (first.to_vec(), second.to_vec());
        for swap in &trade.swaps {
            let (given, taken) = match trade.axis {
                Axis::Row => (swap.first.col, swap.second.col),
                Axis::Col => (swap.first.row, swap.second.row),
            };
            first.retain(|&x| x != given);
            first.push(taken);
            second.retain(|&x| x != taken);
            second.push(given);
        }
        first.sort_unstable();
        second.sort_unstable();
        (first, second)
    }

    /// Apply a curveball trade as its sequence of elementary swaps.
    ///
    /// Validated first; on error nothing has been mutated.
    pub fn apply_trade(&mut self, trade: &CurveballTrade) -> Result<()> {
        self.ensure_tradeable(trade)?;
        for swap in &trade.swaps {
            self.toggle(swap);
        }
        Ok(())
    }

    fn toggle(&mut self, swap: &EdgeSwap) {
        let (new_first, new_second) = swap.new_edges();
        for edge in [swap.first, swap.second] {
            self.set(edge, false);
        }
        for edge in [new_first, new_second] {
            self.set(edge, true);
        }
    }

    fn set(&mut self, edge: Edge, bit: bool) {
        self.rows[edge.row_usize()].set(edge.col, bit);
        self.cols[edge.col_usize()].set(edge.row, bit);
        if bit {
            self.edges.insert(edge);
        } else {
            self.edges.remove(&edge);
        }
    }

    /// Recompute sums and cross-check all three views
    pub fn verify_invariants(&self, expected_row_sums: &[u32], expected_col_sums: &[u32]) -> Result<()> {
        if expected_row_sums.len() != self.n_rows() || expected_col_sums.len() != self.n_cols() {
            return Err(SwapError::invariant("expected margins do not match the matrix shape"));
        }

        for (r, row) in self.rows.iter().enumerate() {
            if row.len() as u32 != expected_row_sums[r] {
                return Err(SwapError::invariant(format!(
                    "row {} sum drifted from {} to {}",
                    r,
                    expected_row_sums[r],
                    row.len()
                )));
            }
        }
        for (c, col) in self.cols.iter().enumerate() {
            if col.len() as u32 != expected_col_sums[c] {
                return Err(SwapError::invariant(format!(
                    "column {} sum drifted from {} to {}",
                    c,
                    expected_col_sums[c],
                    col.len()
                )));
            }
        }

        let total: usize = self.rows.iter().map(RowStorage::len).sum();
        if total != self.edges.len() {
            return Err(SwapError::invariant(format!(
                "edge set holds {} edges but rows hold {}",
                self.edges.len(),
                total
            )));
        }
        for edge in self.edges.iter() {
            if !self.rows[edge.row_usize()].contains(edge.col) || !self.cols[edge.col_usize()].contains(edge.row) {
                return Err(SwapError::invariant(format!("edge {:?} missing from row/column views", edge)));
            }
        }
        Ok(())
    }
}

/// Row and column indices must fit in `u32`
pub(crate) fn check_dimensions(n_rows: usize, n_cols: usize) -> Result<()> {
    if n_rows > u32::MAX as usize || n_cols > u32::MAX as usize {
        return Err(SwapError::invalid_matrix(format!(
            "dimensions {}x{} exceed the u32 index range",
            n_rows, n_cols
        )));
    }
    Ok(())
}

impl PartialEq for SparseMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.n_cols() == other.n_cols() && self.rows == other.rows
    }
}

impl Eq for SparseMatrix {}
