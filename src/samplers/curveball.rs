//! # Curveball Sampler
//!
//! Equal-sum pairs trade any number of private elements per step. A row
//! trade replaces two rows at once; a column trade is realized as a chain of
//! elementary swaps over distinct rows and its log count is folded swap by
//! swap.

use crate::data::storage::SparseMatrix;
use crate::error::Result;
use crate::model::bjdm::BjdmState;
use crate::model::proposal::{CurveballTrade, Proposal};
use crate::samplers::{Acceptance, ChainRng, SwapChain};

pub struct CurveballChain {
    state: BjdmState,
}

impl CurveballChain {
    pub fn new(matrix: SparseMatrix) -> Self {
        Self {
            state: BjdmState::new(matrix),
        }
    }

    pub fn state(&self) -> &BjdmState {
        &self.state
    }
}

impl SwapChain for CurveballChain {
    type Move = CurveballTrade;
    type State = SparseMatrix;

    fn propose(&self, rng: &mut ChainRng) -> Proposal<CurveballTrade> {
        self.state.selector().curveball_trade(self.state.matrix(), rng)
    }

    fn evaluate(&self, trade: &CurveballTrade) -> Acceptance {
        Acceptance::Metropolis {
            log_current: self.state.log_current(),
            log_adjacent: self.state.evaluate_trade(trade),
        }
    }

    fn apply(&mut self, trade: CurveballTrade, log_adjacent: Option<f64>) -> Result<()> {
        let log_adjacent = match log_adjacent {
            Some(log) => log,
            None => self.state.evaluate_trade(&trade),
        };
        self.state.apply_trade(&trade, log_adjacent)
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
