//! # Equivalence-Tracked Chain State
//!
//! The matrix together with its row multiset index and the running log
//! equivalence count. Every mutation goes through this type so that the
//! three never disagree: index keys of all touched rows are removed before
//! the matrix changes and re-added from the new contents afterwards.

use crate::data::storage::{MultisetIndex, SparseMatrix};
use crate::error::{Result, SwapError};
use crate::model::equivalence::{log_num_equiv_adj_matrices, log_num_equiv_matrices, BatchDelta};
use crate::model::proposal::{Axis, CurveballTrade, EdgeSwap, SwapSelector};

/// Relative tolerance when re-checking the running log count
pub(crate) const LOG_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Debug)]
pub struct BjdmState {
    matrix: SparseMatrix,
    index: MultisetIndex,
    selector: SwapSelector,
    row_sums: Vec<u32>,
    col_sums: Vec<u32>,
    log_current: f64,
}

impl BjdmState {
    /// Take ownership of a private copy of the start matrix
    pub fn new(matrix: SparseMatrix) -> Self {
        let index = MultisetIndex::from_rows(&matrix);
        let log_current = log_num_equiv_matrices(&matrix, &index);
        Self {
            selector: SwapSelector::new(&matrix),
            row_sums: matrix.row_sums().to_vec(),
            col_sums: matrix.col_sums().to_vec(),
            matrix,
            index,
            log_current,
        }
    }

    #[inline]
    pub fn matrix(&self) -> &SparseMatrix {
        &self.matrix
    }

    #[inline]
    pub fn index(&self) -> &MultisetIndex {
        &self.index
    }

    #[inline]
    pub fn selector(&self) -> &SwapSelector {
        &self.selector
    }

    #[inline]
    pub fn log_current(&self) -> f64 {
        self.log_current
    }

    /// Log count from scratch, for verification
    pub fn recomputed_log(&self) -> f64 {
        log_num_equiv_matrices(&self.matrix, &self.index)
    }

    /// Log equivalence count of the matrix `swap` leads to
    pub fn evaluate_swap(&self, swap: &EdgeSwap) -> f64 {
        let (row1, row2, new1, new2) = self.swapped_rows(swap);
        log_num_equiv_adj_matrices(self.log_current, &self.index, row1, row2, &new1, &new2)
    }

    /// Current and prospective contents of the two rows a swap touches
    fn swapped_rows(&self, swap: &EdgeSwap) -> (&[u32], &[u32], Vec<u32>, Vec<u32>) {
        let (e1, e2) = (swap.first, swap.second);
        let row1 = self.matrix.row(e1.row);
        let row2 = self.matrix.row(e2.row);
        (
            row1.indices(),
            row2.indices(),
            row1.with_moved(e1.col, e2.col),
            row2.with_moved(e2.col, e1.col),
        )
    }

    /// Log equivalence count of the matrix `trade` leads to.
    ///
    /// A row trade replaces two whole rows at once. A column trade changes
    /// one pair of rows per elementary swap, folded in order.
    pub fn evaluate_trade(&self, trade: &CurveballTrade) -> f64 {
        match trade.axis {
            Axis::Row => {
                let row1 = self.matrix.row_nonzero(trade.first);
                let row2 = self.matrix.row_nonzero(trade.second);
                log_num_equiv_adj_matrices(
                    self.log_current,
                    &self.index,
                    row1,
                    row2,
                    &trade.new_first,
                    &trade.new_second,
                )
            }
            Axis::Col => {
                let mut batch = BatchDelta::new(&self.index, self.log_current);
                for swap in &trade.swaps {
                    let (row1, row2, new1, new2) = self.swapped_rows(swap);
                    batch.fold(row1, row2, &new1, &new2);
                }
                batch.finish()
            }
        }
    }

    /// Apply a swap whose adjacent log count was already evaluated
    pub fn apply_swap(&mut self, swap: &EdgeSwap, log_adjacent: f64) -> Result<()> {
        self.matrix.ensure_swappable(swap)?;
        let rows = [swap.first.row, swap.second.row];
        self.update_rows(&rows, |m| m.swap_edges(swap))?;
        self.log_current = log_adjacent;
        Ok(())
    }

    /// Apply a curveball trade whose adjacent log count was already evaluated
    pub fn apply_trade(&mut self, trade: &CurveballTrade, log_adjacent: f64) -> Result<()> {
        self.matrix.ensure_tradeable(trade)?;
        let rows = trade.touched_rows();
        self.update_rows(&rows, |m| m.apply_trade(trade))?;
        self.log_current = log_adjacent;
        Ok(())
    }

    fn update_rows<F>(&mut self, rows: &[u32], mutate: F) -> Result<()>
    where
        F: FnOnce(&mut SparseMatrix) -> Result<()>,
    {
        for &r in rows {
            self.index.decrement(self.matrix.row_nonzero(r))?;
        }
        mutate(&mut self.matrix)?;
        for &r in rows {
            self.index.increment(self.matrix.row_nonzero(r));
        }
        Ok(())
    }

    /// Full consistency check: margins, edge set, index, running log count
    pub fn verify(&self) -> Result<()> {
        self.matrix.verify_invariants(&self.row_sums, &self.col_sums)?;

        if MultisetIndex::from_rows(&self.matrix) != self.index {
            return Err(SwapError::invariant("multiset index out of sync with matrix rows"));
        }

        let recomputed = self.recomputed_log();
        if (recomputed - self.log_current).abs() > LOG_TOLERANCE * recomputed.abs().max(1.0) {
            return Err(SwapError::invariant(format!(
                "running log equivalence count {} differs from recomputed {}",
                self.log_current, recomputed
            )));
        }
        Ok(())
    }

    pub fn into_matrix(self) -> SparseMatrix {
        self.matrix
    }
}
