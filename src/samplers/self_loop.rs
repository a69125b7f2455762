//! # Self-Loop Samplers
//!
//! Uniform edge-pair chains. Two edges are drawn uniformly (with
//! replacement); if they cannot be swapped the iteration is a self-loop.
//! Valid proposals are always applied, there is no acceptance step.

use crate::data::storage::SparseMatrix;
use crate::error::Result;
use crate::model::bjdm::BjdmState;
use crate::model::proposal::{is_equal_sum_swappable, is_swappable, uniform_edge_pair, EdgeSwap, Proposal};
use crate::samplers::{Acceptance, ChainRng, SwapChain};

/// Self-loop GMMT: any swappable pair
pub struct GmmtChain {
    matrix: SparseMatrix,
    row_sums: Vec<u32>,
    col_sums: Vec<u32>,
    retry_budget: usize,
}

impl GmmtChain {
    pub fn new(matrix: SparseMatrix, retry_budget: usize) -> Self {
        Self {
            row_sums: matrix.row_sums().to_vec(),
            col_sums: matrix.col_sums().to_vec(),
            matrix,
            retry_budget,
        }
    }
}

impl SwapChain for GmmtChain {
    type Move = EdgeSwap;
    type State = SparseMatrix;

    fn propose(&self, rng: &mut ChainRng) -> Proposal<EdgeSwap> {
        uniform_edge_pair(&self.matrix, rng, self.retry_budget, is_swappable)
    }

    fn evaluate(&self, _swap: &EdgeSwap) -> Acceptance {
        Acceptance::Always
    }

    fn apply(&mut self, swap: EdgeSwap, _log_adjacent: Option<f64>) -> Result<()> {
        self.matrix.swap_edges(&swap)
    }

    fn matrix(&self) -> &SparseMatrix {
        &self.matrix
    }

    fn into_matrix(self) -> SparseMatrix {
        self.matrix
    }

    fn verify(&self) -> Result<()> {
        self.matrix.verify_invariants(&self.row_sums, &self.col_sums)
    }
}

/// Self-loop BJDM: swappable pairs sharing a row sum or a column sum.
///
/// Keeps the multiset index and log count current even though acceptance
/// does not use them, so the final log count is reported like the
/// Metropolis chains'.
pub struct SelfLoopBjdmChain {
    state: BjdmState,
    retry_budget: usize,
}

impl SelfLoopBjdmChain {
    pub fn new(matrix: SparseMatrix, retry_budget: usize) -> Self {
        Self {
            state: BjdmState::new(matrix),
            retry_budget,
        }
    }

    pub fn state(&self) -> &BjdmState {
        &self.state
    }
}

impl SwapChain for SelfLoopBjdmChain {
    type Move = EdgeSwap;
    type State = SparseMatrix;

    fn propose(&self, rng: &mut ChainRng) -> Proposal<EdgeSwap> {
        uniform_edge_pair(self.state.matrix(), rng, self.retry_budget, is_equal_sum_swappable)
    }

    fn evaluate(&self, _swap: &EdgeSwap) -> Acceptance {
        Acceptance::Always
    }

    fn apply(&mut self, swap: EdgeSwap, _log_adjacent: Option<f64>) -> Result<()> {
        let log_adjacent = self.state.evaluate_swap(&swap);
        self.state.apply_swap(&swap, log_adjacent)
    }

    fn matrix(&self) -> &SparseMatrix {
        self.state.matrix()
    }

    fn into_matrix(self) -> SparseMatrix {
        self.state.into_matrix()
    }

    fn verify(&self) -> Result<()> {
        self.state.verify()
    }

    fn log_current(&self) -> Option<f64> {
        Some(self.state.log_current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::stats::bjdm_vector;
    use crate::samplers::{ChainOptions, ChainRunner, StepOutcome};

    fn staircase() -> SparseMatrix {
        SparseMatrix::from_rows(4, vec![vec![0], vec![0, 1], vec![1, 2, 3], vec![2, 3], vec![0, 3]]).unwrap()
    }

    #[test]
    fn test_gmmt_never_rejects() {
        let options = ChainOptions {
            check_invariants: true,
            ..ChainOptions::default()
        };
        let mut runner = ChainRunner::new(GmmtChain::new(staircase(), 1), 13, options);
        for _ in 0..1_000 {
            assert_ne!(runner.step().unwrap(), StepOutcome::Rejected);
        }
        let stats = runner.stats();
        assert_eq!(stats.proposed, stats.accepted);
        assert!(stats.accepted > 0);
        assert_eq!(stats.steps, stats.accepted + stats.no_candidates);
    }

    #[test]
    fn test_self_loop_bjdm_keeps_bjdm() {
        let m = staircase();
        let start = bjdm_vector(&m, false);
        let options = ChainOptions {
            retry_budget: 3,
            check_invariants: true,
        };
        let mut runner = ChainRunner::new(SelfLoopBjdmChain::new(m, 3), 17, options);
        for _ in 0..1_000 {
            runner.step().unwrap();
        }
        assert_eq!(bjdm_vector(runner.chain().matrix(), false), start);
        let state = runner.chain().state();
        assert!((state.log_current() - state.recomputed_log()).abs() < 1e-9);
    }
}
