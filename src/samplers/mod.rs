//! # Swap Samplers
//!
//! ## Role
//! Markov chains over matrices (and sequence multigraphs) with fixed
//! margins, and the single loop that drives all of them.
//!
//! ## Chain Loop
//! Each iteration:
//! 1. `propose` a move from the RNG stream (may yield no candidate or a
//!    self-loop, both counted as iterations)
//! 2. `evaluate` it without mutating anything
//! 3. Metropolis-Hastings chains accept with `min(1, exp(log_cur − log_adj))`;
//!    uniform chains apply every valid proposal
//! 4. `apply` mutates matrix, edge set and multiset index together
//!
//! ## Samplers
//! - [`BjdmChain`]: equal-sum pair swaps with the equivalence correction
//! - [`CurveballChain`]: curveball trades with the equivalence correction
//! - [`GmmtChain`]: uniform edge pairs, unconditional
//! - [`SelfLoopBjdmChain`]: uniform edge pairs restricted to equal sums
//! - [`AliceSChain`], [`AliceCChain`]: element exchanges between sequences,
//!   with the equivalence correction over ordered rows

pub mod alice;
pub mod bjdm;
pub mod curveball;
pub mod observer;
pub mod self_loop;

use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};

use crate::data::storage::{Bipartite, MultiGraph, SparseMatrix};
use crate::error::{Result, SwapError};
use crate::model::equivalence::acceptance_probability;
use crate::model::proposal::Proposal;
use crate::model::stats::caterpillar_count;

pub use alice::{AliceCChain, AliceSChain};
pub use bjdm::BjdmChain;
pub use curveball::CurveballChain;
pub use observer::{ChainObserver, DistanceObserver, StructuralObserver};
pub use self_loop::{GmmtChain, SelfLoopBjdmChain};

/// Fixed, documented generator: identical seeds give identical chains on
/// every platform.
pub type ChainRng = Xoshiro256PlusPlus;

/// Which transition family to run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SamplerKind {
    /// Equal-sum pair swaps with Metropolis-Hastings correction
    Bjdm,
    /// Curveball trades with Metropolis-Hastings correction
    Curveball,
    /// Uniform edge-pair swaps, applied unconditionally
    Gmmt,
    /// Uniform edge-pair swaps restricted to equal row or column sums
    SelfLoopBjdm,
    /// Sequence exchanges between uniform same-sum pairs
    AliceS,
    /// Sequence exchanges between pairs from weighted sum groups
    AliceC,
}

impl SamplerKind {
    pub fn name(self) -> &'static str {
        match self {
            SamplerKind::Bjdm => "bjdm",
            SamplerKind::Curveball => "curveball",
            SamplerKind::Gmmt => "gmmt",
            SamplerKind::SelfLoopBjdm => "self-loop-bjdm",
            SamplerKind::AliceS => "alice-s",
            SamplerKind::AliceC => "alice-c",
        }
    }

    /// Runs on sequence datasets rather than transactional ones
    pub fn is_sequence(self) -> bool {
        matches!(self, SamplerKind::AliceS | SamplerKind::AliceC)
    }
}

impl std::fmt::Display for SamplerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-chain knobs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainOptions {
    /// Draws per iteration for uniform edge-pair chains
    pub retry_budget: usize,
    /// Re-verify every invariant after each accepted transition
    pub check_invariants: bool,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            retry_budget: 1,
            check_invariants: false,
        }
    }
}

/// How a proposed move is to be accepted
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Acceptance {
    /// Apply unconditionally
    Always,
    /// Metropolis-Hastings on the log equivalence counts
    Metropolis { log_current: f64, log_adjacent: f64 },
}

/// What one iteration did
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepOutcome {
    NoCandidate,
    SelfLoop,
    Rejected,
    Accepted,
}

/// Iteration counters for one chain
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStats {
    pub steps: u64,
    pub proposed: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub self_loops: u64,
    pub no_candidates: u64,
}

impl ChainStats {
    fn record(&mut self, outcome: StepOutcome) {
        self.steps += 1;
        match outcome {
            StepOutcome::NoCandidate => self.no_candidates += 1,
            StepOutcome::SelfLoop => self.self_loops += 1,
            StepOutcome::Rejected => {
                self.proposed += 1;
                self.rejected += 1;
            }
            StepOutcome::Accepted => {
                self.proposed += 1;
                self.accepted += 1;
            }
        }
    }

    /// Accepted over proposed (0 with no proposals)
    pub fn acceptance_rate(&self) -> f64 {
        if self.proposed == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposed as f64
        }
    }
}

/// A chain state that can propose, evaluate and apply moves
pub trait SwapChain {
    type Move;
    /// What the chain walks over: a matrix or a multigraph
    type State: Bipartite + Clone;

    /// Draw a candidate from the RNG stream
    fn propose(&self, rng: &mut ChainRng) -> Proposal<Self::Move>;

    /// Acceptance rule for `mv`; never mutates
    fn evaluate(&self, mv: &Self::Move) -> Acceptance;

    /// Apply an accepted move. `log_adjacent` is the evaluated log count for
    /// Metropolis chains.
    fn apply(&mut self, mv: Self::Move, log_adjacent: Option<f64>) -> Result<()>;

    fn matrix(&self) -> &Self::State;

    fn into_matrix(self) -> Self::State;

    /// Full invariant check
    fn verify(&self) -> Result<()>;

    /// Running log equivalence count, for chains that track one
    fn log_current(&self) -> Option<f64> {
        None
    }
}

/// Drives one chain with its own generator
pub struct ChainRunner<C: SwapChain> {
    chain: C,
    rng: ChainRng,
    options: ChainOptions,
    stats: ChainStats,
}

impl<C: SwapChain> ChainRunner<C> {
    pub fn new(chain: C, seed: u64, options: ChainOptions) -> Self {
        Self {
            chain,
            rng: ChainRng::seed_from_u64(seed),
            options,
            stats: ChainStats::default(),
        }
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn stats(&self) -> &ChainStats {
        &self.stats
    }

    /// One iteration of the chain loop
    pub fn step(&mut self) -> Result<StepOutcome> {
        let outcome = match self.chain.propose(&mut self.rng) {
            Proposal::NoCandidate => StepOutcome::NoCandidate,
            Proposal::SelfLoop => StepOutcome::SelfLoop,
            Proposal::Move(mv) => match self.chain.evaluate(&mv) {
                Acceptance::Always => {
                    self.chain.apply(mv, None)?;
                    StepOutcome::Accepted
                }
                Acceptance::Metropolis {
                    log_current,
                    log_adjacent,
                } => {
                    let p = acceptance_probability(log_current, log_adjacent);
                    let u: f64 = self.rng.random();
                    if u <= p {
                        self.chain.apply(mv, Some(log_adjacent))?;
                        StepOutcome::Accepted
                    } else {
                        StepOutcome::Rejected
                    }
                }
            },
        };

        if outcome == StepOutcome::Accepted && self.options.check_invariants {
            self.chain.verify()?;
        }
        self.stats.record(outcome);
        Ok(outcome)
    }

    /// Run `num_swaps` iterations, reporting each to `observer`
    pub fn run(&mut self, num_swaps: u64, observer: &mut dyn ChainObserver<C::State>) -> Result<()> {
        for step in 0..num_swaps {
            observer.on_step_start(step);
            let outcome = self.step()?;
            observer.on_step_end(step, outcome, self.chain.matrix());
        }
        Ok(())
    }

    pub fn finish(self) -> (C, ChainStats) {
        (self.chain, self.stats)
    }
}

/// Result of one chain
#[derive(Clone, Debug)]
pub struct ChainOutput<S = SparseMatrix> {
    /// Final state
    pub matrix: S,
    pub stats: ChainStats,
    /// Final running log equivalence count, for chains that track one
    pub log_equiv: Option<f64>,
    /// Caterpillar count of the final state
    pub caterpillars: u64,
    /// Degree hint supplied by the caller, if any
    pub degree: Option<u64>,
}

/// Sample one matrix with default options
pub fn sample(kind: SamplerKind, matrix: &SparseMatrix, num_swaps: u64, seed: u64) -> Result<SparseMatrix> {
    let out = run_sampler(kind, matrix, num_swaps, seed, &ChainOptions::default(), &mut ())?;
    Ok(out.matrix)
}

/// Sample one matrix, recording the caller's degree hint in the output.
/// The hint does not influence the chain.
pub fn sample_with_degree(
    kind: SamplerKind,
    matrix: &SparseMatrix,
    degree: u64,
    num_swaps: u64,
    seed: u64,
) -> Result<ChainOutput> {
    let mut out = run_sampler(kind, matrix, num_swaps, seed, &ChainOptions::default(), &mut ())?;
    out.degree = Some(degree);
    Ok(out)
}

/// Sample one matrix while feeding `observer` (timers, distance and
/// structural sinks)
pub fn sample_instrumented(
    kind: SamplerKind,
    matrix: &SparseMatrix,
    num_swaps: u64,
    seed: u64,
    observer: &mut dyn ChainObserver,
) -> Result<ChainOutput> {
    run_sampler(kind, matrix, num_swaps, seed, &ChainOptions::default(), observer)
}

/// Build the chain for `kind` on a private copy of `matrix` and run it
pub fn run_sampler(
    kind: SamplerKind,
    matrix: &SparseMatrix,
    num_swaps: u64,
    seed: u64,
    options: &ChainOptions,
    observer: &mut dyn ChainObserver,
) -> Result<ChainOutput> {
    let _span = info_span!("chain", sampler = %kind, num_swaps, seed).entered();
    match kind {
        SamplerKind::Bjdm => drive(BjdmChain::new, matrix, num_swaps, seed, options, observer),
        SamplerKind::Curveball => drive(CurveballChain::new, matrix, num_swaps, seed, options, observer),
        SamplerKind::Gmmt => drive(
            |m| GmmtChain::new(m, options.retry_budget),
            matrix,
            num_swaps,
            seed,
            options,
            observer,
        ),
        SamplerKind::SelfLoopBjdm => drive(
            |m| SelfLoopBjdmChain::new(m, options.retry_budget),
            matrix,
            num_swaps,
            seed,
            options,
            observer,
        ),
        SamplerKind::AliceS | SamplerKind::AliceC => Err(SwapError::config(format!(
            "{} samples sequence datasets, not transactional ones",
            kind
        ))),
    }
}

/// Build the sequence chain for `kind` on a private copy of `graph` and run it
pub fn run_sequence_sampler(
    kind: SamplerKind,
    graph: &MultiGraph,
    num_swaps: u64,
    seed: u64,
    options: &ChainOptions,
    observer: &mut dyn ChainObserver<MultiGraph>,
) -> Result<ChainOutput<MultiGraph>> {
    let _span = info_span!("chain", sampler = %kind, num_swaps, seed).entered();
    match kind {
        SamplerKind::AliceS => drive(AliceSChain::new, graph, num_swaps, seed, options, observer),
        SamplerKind::AliceC => drive(AliceCChain::new, graph, num_swaps, seed, options, observer),
        _ => Err(SwapError::config(format!(
            "{} samples transactional datasets, not sequences",
            kind
        ))),
    }
}

/// A start state the sampling pipeline can run chains from
pub trait SampleInput: Bipartite + Clone + Send + Sync + Sized {
    fn run_chain(
        &self,
        kind: SamplerKind,
        num_swaps: u64,
        seed: u64,
        options: &ChainOptions,
        observer: &mut dyn ChainObserver<Self>,
    ) -> Result<ChainOutput<Self>>;
}

impl SampleInput for SparseMatrix {
    fn run_chain(
        &self,
        kind: SamplerKind,
        num_swaps: u64,
        seed: u64,
        options: &ChainOptions,
        observer: &mut dyn ChainObserver<Self>,
    ) -> Result<ChainOutput<Self>> {
        run_sampler(kind, self, num_swaps, seed, options, observer)
    }
}

impl SampleInput for MultiGraph {
    fn run_chain(
        &self,
        kind: SamplerKind,
        num_swaps: u64,
        seed: u64,
        options: &ChainOptions,
        observer: &mut dyn ChainObserver<Self>,
    ) -> Result<ChainOutput<Self>> {
        run_sequence_sampler(kind, self, num_swaps, seed, options, observer)
    }
}

fn drive<C, F>(
    build: F,
    start: &C::State,
    num_swaps: u64,
    seed: u64,
    options: &ChainOptions,
    observer: &mut dyn ChainObserver<C::State>,
) -> Result<ChainOutput<C::State>>
where
    C: SwapChain,
    F: FnOnce(C::State) -> C,
{
    let setup_start = Instant::now();
    let chain = info_span!("setup").in_scope(|| build(start.clone()));
    observer.on_setup(setup_start.elapsed(), chain.matrix());

    let mut runner = ChainRunner::new(chain, seed, options.clone());
    runner.run(num_swaps, observer)?;

    let (chain, stats) = runner.finish();
    let log_equiv = chain.log_current();
    let caterpillars = caterpillar_count(chain.matrix());
    observer.on_finish(chain.matrix(), caterpillars);

    debug!(
        accepted = stats.accepted,
        proposed = stats.proposed,
        self_loops = stats.self_loops,
        no_candidates = stats.no_candidates,
        "chain finished"
    );

    Ok(ChainOutput {
        matrix: chain.into_matrix(),
        stats,
        log_equiv,
        caterpillars,
        degree: None,
    })
}
