//! # Sequence Samplers
//!
//! ALICE-S and ALICE-C walk over sequence datasets. A pair of rows (or
//! columns) exchanges one element from each side of its distinct-value
//! difference, in place, so sequence lengths, itemset multiplicities and
//! the order of every untouched element survive. Both correct for
//! equivalent orderings of identical sequences with Metropolis-Hastings.

use crate::data::storage::MultiGraph;
use crate::error::Result;
use crate::model::proposal::{EdgeSwap, Proposal};
use crate::model::sequence::SequenceState;
use crate::samplers::{Acceptance, ChainRng, SwapChain};

/// ALICE-S: uniform same-sum pairs
pub struct AliceSChain {
    state: SequenceState,
}

impl AliceSChain {
    pub fn new(graph: MultiGraph) -> Self {
        Self {
            state: SequenceState::new(graph),
        }
    }

    pub fn state(&self) -> &SequenceState {
        &self.state
    }
}

impl SwapChain for AliceSChain {
    type Move = EdgeSwap;
    type State = MultiGraph;

    fn propose(&self, rng: &mut ChainRng) -> Proposal<EdgeSwap> {
        self.state.selector().uniform_exchange(self.state.graph(), rng)
    }

    fn evaluate(&self, swap: &EdgeSwap) -> Acceptance {
        metropolis(&self.state, swap)
    }

    fn apply(&mut self, swap: EdgeSwap, log_adjacent: Option<f64>) -> Result<()> {
        apply_exchange(&mut self.state, swap, log_adjacent)
    }

    fn matrix(&self) -> &MultiGraph {
        self.state.graph()
    }

    fn into_matrix(self) -> MultiGraph {
        self.state.into_graph()
    }

    fn verify(&self) -> Result<()> {
        self.state.verify()
    }

    fn log_current(&self) -> Option<f64> {
        Some(self.state.log_current())
    }
}

/// ALICE-C: sum groups weighted by `n(n+1)/2`, rows with replacement
pub struct AliceCChain {
    state: SequenceState,
}

impl AliceCChain {
    pub fn new(graph: MultiGraph) -> Self {
        Self {
            state: SequenceState::new(graph),
        }
    }

    pub fn state(&self) -> &SequenceState {
        &self.state
    }
}

impl SwapChain for AliceCChain {
    type Move = EdgeSwap;
    type State = MultiGraph;

    fn propose(&self, rng: &mut ChainRng) -> Proposal<EdgeSwap> {
        self.state.selector().weighted_exchange(self.state.graph(), rng)
    }

    fn evaluate(&self, swap: &EdgeSwap) -> Acceptance {
        metropolis(&self.state, swap)
    }

    fn apply(&mut self, swap: EdgeSwap, log_adjacent: Option<f64>) -> Result<()> {
        apply_exchange(&mut self.state, swap, log_adjacent)
    }

    fn matrix(&self) -> &MultiGraph {
        self.state.graph()
    }

    fn into_matrix(self) -> MultiGraph {
        self.state.into_graph()
    }

    fn verify(&self) -> Result<()> {
        self.state.verify()
    }

    fn log_current(&self) -> Option<f64> {
        Some(self.state.log_current())
    }
}

fn metropolis(state: &SequenceState, swap: &EdgeSwap) -> Acceptance {
    Acceptance::Metropolis {
        log_current: state.log_current(),
        log_adjacent: state.evaluate_exchange(swap),
    }
}

fn apply_exchange(state: &mut SequenceState, swap: EdgeSwap, log_adjacent: Option<f64>) -> Result<()> {
    let log_adjacent = match log_adjacent {
        Some(log) => log,
        None => state.evaluate_exchange(&swap),
    };
    state.apply_exchange(&swap, log_adjacent)
}
