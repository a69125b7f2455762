//! # Structural Statistics
//!
//! Summaries of a chain state used to watch a chain: the bipartite joint
//! degree matrix (BJDM), the distance between two BJDMs, and small-motif
//! counts. Everything here reads through [`Bipartite`], so matrices and
//! sequence multigraphs share one implementation; parallel edges count once
//! per occurrence.

use std::collections::{BTreeMap, HashMap};

use crate::data::storage::Bipartite;

/// Joint degree matrix flattened row-major.
///
/// Entry `(r-1) * max_col_sum + (c-1)` counts edges joining a row of sum `r`
/// to a column of sum `c`. With `normalize` the counts are divided by the
/// number of edges.
pub fn bjdm_vector<B: Bipartite + ?Sized>(state: &B, normalize: bool) -> Vec<f64> {
    let (row_sums, col_sums) = (state.row_sums(), state.col_sums());
    let mut counts: BTreeMap<(u32, u32), u64> = BTreeMap::new();
    let (mut max_row, mut max_col) = (0u32, 0u32);
    for r in 0..state.n_rows() {
        let rs = row_sums[r];
        for &c in state.row_entries(r) {
            let cs = col_sums[c as usize];
            *counts.entry((rs, cs)).or_insert(0) += 1;
            max_row = max_row.max(rs);
            max_col = max_col.max(cs);
        }
    }

    let width = max_col as usize;
    let mut out = vec![0.0; max_row as usize * width];
    let total = state.n_edges() as f64;
    for ((rs, cs), n) in counts {
        let slot = (rs as usize - 1) * width + (cs as usize - 1);
        out[slot] = if normalize { n as f64 / total } else { n as f64 };
    }
    out
}

/// 1-D earth mover's distance between two histograms.
///
/// Mass is carried left to right; the shorter input is treated as
/// zero-padded.
pub fn emd_distance(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().max(b.len());
    let mut carried = 0.0;
    let mut total = 0.0;
    for i in 0..n {
        let ai = a.get(i).copied().unwrap_or(0.0);
        let bi = b.get(i).copied().unwrap_or(0.0);
        carried = ai + carried - bi;
        total += carried.abs();
    }
    total
}

/// Caterpillars (3-paths): `Σ_edges (rowSum − 1)(colSum − 1)`
pub fn caterpillar_count<B: Bipartite + ?Sized>(state: &B) -> u64 {
    let (row_sums, col_sums) = (state.row_sums(), state.col_sums());
    (0..state.n_rows())
        .map(|r| {
            let rs = row_sums[r] as u64;
            state
                .row_entries(r)
                .iter()
                .map(|&c| rs.saturating_sub(1) * (col_sums[c as usize] as u64).saturating_sub(1))
                .sum::<u64>()
        })
        .sum()
}

/// Butterflies (K2,2) on the distinct edges: every pair of columns shared by
/// `k` rows closes `C(k, 2)` of them.
pub fn butterfly_count<B: Bipartite + ?Sized>(state: &B) -> u64 {
    let mut wedges: HashMap<(u32, u32), u64> = HashMap::new();
    for r in 0..state.n_rows() {
        let mut cols = state.row_entries(r).to_vec();
        cols.sort_unstable();
        cols.dedup();
        for i in 0..cols.len() {
            for &c in &cols[i + 1..] {
                *wedges.entry((cols[i], c)).or_insert(0) += 1;
            }
        }
    }
    wedges.values().map(|&k| k * k.saturating_sub(1) / 2).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::storage::{MultiGraph, SparseMatrix};

    fn matrix(n_cols: usize, rows: Vec<Vec<u32>>) -> SparseMatrix {
        SparseMatrix::from_rows(n_cols, rows).unwrap()
    }

    #[test]
    fn test_bjdm_vector() {
        // row sums 2,1; column sums 2,1
        let m = matrix(2, vec![vec![0, 1], vec![0]]);
        assert_eq!(bjdm_vector(&m, false), vec![0.0, 1.0, 1.0, 1.0]);
        let norm = bjdm_vector(&m, true);
        assert!((norm.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(bjdm_vector(&SparseMatrix::new(2, 2), true).is_empty());
    }

    #[test]
    fn test_emd_distance() {
        assert_eq!(emd_distance(&[0.5, 0.5], &[0.5, 0.5]), 0.0);
        assert!((emd_distance(&[1.0, 0.0, 0.0], &[0.0, 0.0, 1.0]) - 2.0).abs() < 1e-12);
        assert!((emd_distance(&[1.0], &[0.0, 1.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_caterpillars() {
        let m = matrix(2, vec![vec![0, 1], vec![0]]);
        // (0,0): 1*1, (0,1): 1*0, (1,0): 0*1
        assert_eq!(caterpillar_count(&m), 1);
    }

    #[test]
    fn test_butterflies() {
        let full = matrix(3, vec![vec![0, 1, 2], vec![0, 1, 2]]);
        assert_eq!(butterfly_count(&full), 3);

        let full3 = matrix(2, vec![vec![0, 1], vec![0, 1], vec![0, 1]]);
        assert_eq!(butterfly_count(&full3), 3);

        let diagonal = matrix(2, vec![vec![0], vec![1]]);
        assert_eq!(butterfly_count(&diagonal), 0);
    }

    #[test]
    fn test_multigraph_statistics() {
        // row 0 holds column 0 twice
        let g = MultiGraph::from_sequences(2, vec![vec![0, 1, 0], vec![0]]).unwrap();
        // row sums 3,1; column sums 3,1
        assert_eq!(bjdm_vector(&g, false), vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 2.0]);
        // (0,0) twice at 2*2, (0,1) at 2*0, (1,0) at 0*2
        assert_eq!(caterpillar_count(&g), 8);
        // repeated columns collapse, so no pair of rows shares two columns
        assert_eq!(butterfly_count(&g), 0);

        let shared = MultiGraph::from_sequences(2, vec![vec![1, 0, 1], vec![0, 1]]).unwrap();
        assert_eq!(butterfly_count(&shared), 1);
    }
}
