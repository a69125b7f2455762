//! # BJDM Sampler
//!
//! Equal-sum pair swaps: a random row (or column) and a partner with the same
//! sum exchange one private element each. Swaps between rows of equal sum,
//! or columns of equal sum, keep the bipartite joint degree matrix fixed.

use crate::data::storage::SparseMatrix;
use crate::error::Result;
use crate::model::bjdm::BjdmState;
use crate::model::proposal::{EdgeSwap, Proposal};
use crate::samplers::{Acceptance, ChainRng, SwapChain};

pub struct BjdmChain {
    state: BjdmState,
}

impl BjdmChain {
    pub fn new(matrix: SparseMatrix) -> Self {
        Self {
            state: BjdmState::new(matrix),
        }
    }

    pub fn state(&self) -> &BjdmState {
        &self.state
    }
}

impl SwapChain for BjdmChain {
    type Move = EdgeSwap;
    type State = SparseMatrix;

    fn propose(&self, rng: &mut ChainRng) -> Proposal<EdgeSwap> {
        self.state.selector().equal_sum_swap(self.state.matrix(), rng)
    }

    fn evaluate(&self, swap: &EdgeSwap) -> Acceptance {
        Acceptance::Metropolis {
            log_current: self.state.log_current(),
            log_adjacent: self.state.evaluate_swap(swap),
        }
    }

    fn apply(&mut self, swap: EdgeSwap, log_adjacent: Option<f64>) -> Result<()> {
        let log_adjacent = match log_adjacent {
            Some(log) => log,
            None => self.state.evaluate_swap(&swap),
        };
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

    #[test]
    fn test_bjdm_is_invariant() {
        let m = SparseMatrix::from_rows(
            5,
            vec![vec![0, 1, 2], vec![1, 3], vec![0, 4], vec![2, 3, 4], vec![1]],
        )
        .unwrap();
        let start = bjdm_vector(&m, false);

        let options = ChainOptions {
            check_invariants: true,
            ..ChainOptions::default()
        };
        let mut runner = ChainRunner::new(BjdmChain::new(m), 11, options);
        for _ in 0..2_000 {
            runner.step().unwrap();
        }
        assert_eq!(bjdm_vector(runner.chain().matrix(), false), start);
        assert!(runner.stats().accepted > 0);
    }

    #[test]
    fn test_rigid_matrix_never_moves() {
        // one row, one column: no partner on either axis
        let m = SparseMatrix::from_rows(1, vec![vec![0]]).unwrap();
        let mut runner = ChainRunner::new(BjdmChain::new(m), 5, ChainOptions::default());
        for _ in 0..50 {
            assert_eq!(runner.step().unwrap(), StepOutcome::NoCandidate);
        }
    }
}
