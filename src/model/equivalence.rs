//! # Equivalence Counts
//!
//! ## Role
//! Log of the number of matrices that encode the same dataset (row
//! orderings that cannot be told apart), and its O(1) update for a proposed
//! pair of row replacements. The Metropolis-Hastings correction divides by
//! this count so the chain is uniform over datasets rather than matrices.
//!
//! ## Formula
//! For each row-sum group of size `n_s`:
//!
//! ```text
//! log(n_s!) − Σ_{distinct rows v, |v| = s} log(count(v)!)
//! ```
//!
//! `count(v)` includes the row itself. Swaps never change row sums, so the
//! group sizes are constant and only the identical-row terms move. For a
//! sequence multigraph `v` ranges over ordered sequences and `|v|` is the
//! sequence length; the formula is otherwise the same.

use std::collections::BTreeMap;

use crate::data::storage::multiset::{EqCounts, MultisetIndex, ScratchCounts};
use crate::data::storage::Bipartite;

/// `ln(n!)`
pub fn log_factorial(n: u64) -> f64 {
    (2..=n).map(|k| (k as f64).ln()).sum()
}

/// Full log-number of equivalent matrices (or multigraphs). Computed once
/// per chain.
pub fn log_num_equiv_matrices<B: Bipartite + ?Sized>(state: &B, index: &MultisetIndex) -> f64 {
    let mut group_sizes: BTreeMap<u32, u64> = BTreeMap::new();
    for &s in state.row_sums() {
        *group_sizes.entry(s).or_insert(0) += 1;
    }
    let groups: f64 = group_sizes.values().map(|&n| log_factorial(n)).sum();
    groups - log_identical_row_orderings(index)
}

/// `Σ_v log(count(v)!)` over distinct row contents, summed in key order
pub fn log_identical_row_orderings(index: &MultisetIndex) -> f64 {
    let mut entries: Vec<_> = index.iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
    entries.iter().map(|&(_, c)| log_factorial(c as u64)).sum()
}

/// Log equivalence count after replacing `row1`/`row2` by `new1`/`new2`.
///
/// Must be evaluated before the index is mutated. When `row1 == new2` the
/// two rows merely exchange contents and the count is unchanged.
pub fn log_num_equiv_adj_matrices<C: EqCounts + ?Sized>(
    log_current: f64,
    counts: &C,
    row1: &[u32],
    row2: &[u32],
    new1: &[u32],
    new2: &[u32],
) -> f64 {
    if row1 == new2 {
        return log_current;
    }
    log_current + (counts.count(row1) as f64).ln() + (counts.count(row2) as f64).ln()
        - (counts.count(new1) as f64).ln_1p()
        - (counts.count(new2) as f64).ln_1p()
}

/// `min(1, exp(log_current − log_adjacent))`, clamped to `[0, 1]`
pub fn acceptance_probability(log_current: f64, log_adjacent: f64) -> f64 {
    if log_current == log_adjacent {
        return 1.0;
    }
    let p = (log_current - log_adjacent).exp();
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

/// Running log equivalence count over a sequence of row replacements.
///
/// Each fold sees the counts left behind by the previous ones through a
/// scratch overlay; the live index is never touched.
pub struct BatchDelta<'a> {
    scratch: ScratchCounts<'a>,
    log: f64,
}

impl<'a> BatchDelta<'a> {
    pub fn new(index: &'a MultisetIndex, log_current: f64) -> Self {
        Self {
            scratch: ScratchCounts::new(index),
            log: log_current,
        }
    }

    /// Fold one pair of row replacements
    pub fn fold(&mut self, row1: &[u32], row2: &[u32], new1: &[u32], new2: &[u32]) {
        self.log = log_num_equiv_adj_matrices(self.log, &self.scratch, row1, row2, new1, new2);
        self.scratch.decrement(row1);
        self.scratch.decrement(row2);
        self.scratch.increment(new1);
        self.scratch.increment(new2);
    }

    pub fn finish(self) -> f64 {
        self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::storage::{MultiGraph, SparseMatrix};

    fn recompute(rows: Vec<Vec<u32>>, n_cols: usize) -> f64 {
        let m = SparseMatrix::from_rows(n_cols, rows).unwrap();
        log_num_equiv_matrices(&m, &MultisetIndex::from_rows(&m))
    }

    #[test]
    fn test_log_factorial() {
        assert_eq!(log_factorial(0), 0.0);
        assert_eq!(log_factorial(1), 0.0);
        assert!((log_factorial(5) - 120f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_full_count() {
        // sums {2: 3 rows}, {1: 1 row}; rows {0,1} twice
        let log = recompute(vec![vec![0, 1], vec![0, 1], vec![1, 2], vec![2]], 3);
        let expected = 6f64.ln() - 2f64.ln();
        assert!((log - expected).abs() < 1e-12);

        // all rows distinct: n_s! per group
        let log = recompute(vec![vec![0], vec![1], vec![2]], 3);
        assert!((log - 6f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_exchange_is_identity() {
        let index = MultisetIndex::from_vectors([&[0u32, 1][..], &[1, 2][..]]);
        let log = 1.2345;
        let adj = log_num_equiv_adj_matrices(log, &index, &[0, 1], &[1, 2], &[1, 2], &[0, 1]);
        assert_eq!(adj, log);
    }

    #[test]
    fn test_adjacent_matches_recompute() {
        // swap (0,1),(2,3): row 0 {0,1} -> {0,3}, row 2 {2,3} -> {1,2}
        let before = vec![vec![0, 1], vec![0, 1], vec![2, 3], vec![0, 2]];
        let after = vec![vec![0, 3], vec![0, 1], vec![1, 2], vec![0, 2]];
        let m = SparseMatrix::from_rows(4, before).unwrap();
        let index = MultisetIndex::from_rows(&m);
        let log = log_num_equiv_matrices(&m, &index);
        assert!((log - 12f64.ln()).abs() < 1e-12);

        let adj = log_num_equiv_adj_matrices(log, &index, &[0, 1], &[2, 3], &[0, 3], &[1, 2]);
        assert!((adj - recompute(after, 4)).abs() < 1e-12);
        assert!((adj - 24f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_acceptance_probability() {
        assert_eq!(acceptance_probability(3.0, 3.0), 1.0);
        assert_eq!(acceptance_probability(3.0, 1.0), 1.0);
        let p = acceptance_probability(1.0, 3.0);
        assert!(p > 0.0 && p < 1.0);
        assert!((p - (-2f64).exp()).abs() < 1e-15);
        assert_eq!(acceptance_probability(0.0, f64::INFINITY), 0.0);
    }

    #[test]
    fn test_batch_delta_matches_recompute() {
        // column trade between 0 and 1 split into two elementary swaps:
        // row 0 {0,2} -> {1,2}, row 1 {1} -> {0}; then row 2 {0} -> {1}, row 3 {1,2} -> {0,2}
        let m = SparseMatrix::from_rows(3, vec![vec![0, 2], vec![1], vec![0], vec![1, 2]]).unwrap();
        let index = MultisetIndex::from_rows(&m);
        let log = log_num_equiv_matrices(&m, &index);

        let mut batch = BatchDelta::new(&index, log);
        batch.fold(&[0, 2], &[1], &[1, 2], &[0]);
        let midway = recompute(vec![vec![1, 2], vec![0], vec![0], vec![1, 2]], 3);
        assert!((batch.log - midway).abs() < 1e-12);

        batch.fold(&[0], &[1, 2], &[1], &[0, 2]);
        let after = recompute(vec![vec![1, 2], vec![0], vec![1], vec![0, 2]], 3);
        assert!((batch.finish() - after).abs() < 1e-12);
    }

    #[test]
    fn test_sequence_count() {
        // lengths {2: [0,1], [1,0], [0,1]}, {1: [2]}; order matters
        let g = MultiGraph::from_sequences(3, vec![vec![0, 1], vec![1, 0], vec![0, 1], vec![2]]).unwrap();
        let index = MultisetIndex::from_rows(&g);
        let log = log_num_equiv_matrices(&g, &index);
        assert!((log - 3f64.ln()).abs() < 1e-12);

        // row 0 trades its 0 for the 2 of row 3: [0,1] -> [2,1], [2] -> [0]
        let adj = log_num_equiv_adj_matrices(log, &index, &[0, 1], &[2], &[2, 1], &[0]);
        let after = MultiGraph::from_sequences(3, vec![vec![2, 1], vec![1, 0], vec![0, 1], vec![0]]).unwrap();
        assert!((adj - log_num_equiv_matrices(&after, &MultisetIndex::from_rows(&after))).abs() < 1e-12);
        assert!((adj - 6f64.ln()).abs() < 1e-12);
    }
}
