//! # Bipartite Multigraph
//!
//! ## Role
//! Chain state for sequence datasets. Each row is a sequence of column ids
//! (itemsets) in order; a column may appear several times in one row, so
//! entries are edge multiplicities rather than bits.
//!
//! ## Invariants
//! - Row sums are sequence lengths, column sums are occurrence counts; both
//!   are fixed at construction.
//! - `cols[c]` lists row `r` exactly as many times as `c` occurs in
//!   `rows[r]`.
//! - An exchange replaces one occurrence in place, so the order of every
//!   other element of a sequence is untouched.

use std::collections::HashMap;

use crate::data::storage::matrix::check_dimensions;
use crate::error::{Result, SwapError};
use crate::model::proposal::EdgeSwap;

/// Ordered multigraph with fixed margins
#[derive(Clone, Debug)]
pub struct MultiGraph {
    rows: Vec<Vec<u32>>,
    cols: Vec<Vec<u32>>,
    row_sums: Vec<u32>,
    col_sums: Vec<u32>,
    n_edges: usize,
}

impl MultiGraph {
    /// Build from per-row column sequences
    pub fn from_sequences(n_cols: usize, rows: Vec<Vec<u32>>) -> Result<Self> {
        check_dimensions(rows.len(), n_cols)?;

        let mut cols: Vec<Vec<u32>> = vec![Vec::new(); n_cols];
        for (r, row) in rows.iter().enumerate() {
            for &c in row {
                let Some(col) = cols.get_mut(c as usize) else {
                    return Err(SwapError::invalid_matrix(format!(
                        "column index {} out of range for {} columns",
                        c, n_cols
                    )));
                };
                col.push(r as u32);
            }
        }

        let row_sums: Vec<u32> = rows.iter().map(|r| r.len() as u32).collect();
        let col_sums: Vec<u32> = cols.iter().map(|c| c.len() as u32).collect();
        let n_edges = rows.iter().map(Vec::len).sum();

        Ok(Self {
            rows,
            cols,
            row_sums,
            col_sums,
            n_edges,
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

    #[inline]
    pub fn n_edges(&self) -> usize {
        self.n_edges
    }

    /// Column sequence of `row`, in order
    #[inline]
    pub fn row(&self, row: u32) -> &[u32] {
        &self.rows[row as usize]
    }

    /// Rows holding `col`, one entry per occurrence
    #[inline]
    pub fn col(&self, col: u32) -> &[u32] {
        &self.cols[col as usize]
    }

    pub fn row_sums(&self) -> &[u32] {
        &self.row_sums
    }

    pub fn col_sums(&self) -> &[u32] {
        &self.col_sums
    }

    pub fn rows(&self) -> &[Vec<u32>] {
        &self.rows
    }

    /// Check that `swap` can be applied: `first` and `second` lie in
    /// different rows and columns, and each row holds its own column but not
    /// the other's.
    pub fn ensure_exchangeable(&self, swap: &EdgeSwap) -> Result<()> {
        let (first, second) = (swap.first, swap.second);
        if first.row == second.row || first.col == second.col {
            return Err(SwapError::invariant(format!(
                "exchange {:?} <-> {:?} shares a row or column",
                first, second
            )));
        }
        for edge in [first, second] {
            if edge.row_usize() >= self.n_rows() || edge.col_usize() >= self.n_cols() {
                return Err(SwapError::invariant(format!("exchange edge {:?} outside the graph", edge)));
            }
        }
        let row1 = self.row(first.row);
        let row2 = self.row(second.row);
        if !row1.contains(&first.col) || !row2.contains(&second.col) {
            return Err(SwapError::invariant(format!(
                "exchange {:?} <-> {:?} moves an absent edge",
                first, second
            )));
        }
        if row1.contains(&second.col) || row2.contains(&first.col) {
            return Err(SwapError::invariant(format!(
                "exchange {:?} <-> {:?} would duplicate a column in a row",
                first, second
            )));
        }
        Ok(())
    }

    /// Contents of the two rows after `swap`, without mutating anything
    pub fn exchanged_rows(&self, swap: &EdgeSwap) -> (Vec<u32>, Vec<u32>) {
        let (first, second) = (swap.first, swap.second);
        let mut new1 = self.row(first.row).to_vec();
        let mut new2 = self.row(second.row).to_vec();
        replace_first(&mut new1, first.col, second.col);
        replace_first(&mut new2, second.col, first.col);
        (new1, new2)
    }

    /// Row `r1` trades one occurrence of `c1` for `c2`, row `r2` one `c2`
    /// for `c1`, each in place.
    ///
    /// Validated first; on error nothing has been mutated.
    pub fn exchange(&mut self, swap: &EdgeSwap) -> Result<()> {
        self.ensure_exchangeable(swap)?;
        let (first, second) = (swap.first, swap.second);
        replace_first(&mut self.rows[first.row_usize()], first.col, second.col);
        replace_first(&mut self.rows[second.row_usize()], second.col, first.col);
        replace_first(&mut self.cols[first.col_usize()], first.row, second.row);
        replace_first(&mut self.cols[second.col_usize()], second.row, first.row);
        Ok(())
    }

    /// Recompute margins and cross-check the row and column views
    pub fn verify_invariants(&self, expected_row_sums: &[u32], expected_col_sums: &[u32]) -> Result<()> {
        if expected_row_sums.len() != self.n_rows() || expected_col_sums.len() != self.n_cols() {
            return Err(SwapError::invariant("expected margins do not match the graph shape"));
        }
        for (r, row) in self.rows.iter().enumerate() {
            if row.len() as u32 != expected_row_sums[r] {
                return Err(SwapError::invariant(format!(
                    "row {} length drifted from {} to {}",
                    r,
                    expected_row_sums[r],
                    row.len()
                )));
            }
        }
        for (c, col) in self.cols.iter().enumerate() {
            if col.len() as u32 != expected_col_sums[c] {
                return Err(SwapError::invariant(format!(
                    "column {} multiplicity drifted from {} to {}",
                    c,
                    expected_col_sums[c],
                    col.len()
                )));
            }
        }

        let mut by_row: HashMap<(u32, u32), u32> = HashMap::new();
        for (r, row) in self.rows.iter().enumerate() {
            for &c in row {
                *by_row.entry((r as u32, c)).or_insert(0) += 1;
            }
        }
        let mut by_col: HashMap<(u32, u32), u32> = HashMap::new();
        for (c, col) in self.cols.iter().enumerate() {
            for &r in col {
                *by_col.entry((r, c as u32)).or_insert(0) += 1;
            }
        }
        if by_row != by_col {
            return Err(SwapError::invariant("row and column views of the multigraph disagree"));
        }
        Ok(())
    }
}

/// Overwrite the first `from` in `seq` with `to`
fn replace_first(seq: &mut [u32], from: u32, to: u32) {
    if let Some(slot) = seq.iter_mut().find(|x| **x == from) {
        *slot = to;
    }
}

/// Distinct values of `a` that do not occur in `b`, ascending
pub fn distinct_difference(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out: Vec<u32> = a.iter().copied().filter(|x| !b.contains(x)).collect();
    out.sort_unstable();
    out.dedup();
    out
}

impl PartialEq for MultiGraph {
    fn eq(&self, other: &Self) -> bool {
        self.n_cols() == other.n_cols() && self.rows == other.rows
    }
}

impl Eq for MultiGraph {}
