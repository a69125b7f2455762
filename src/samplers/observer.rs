//! # Chain Observers
//!
//! Pure sinks fed by the chain loop. Observers only read the chain state
//! and never change what the chain does, so an instrumented run produces
//! the same sample as a plain one with the same seed.
//!
//! The state type defaults to [`SparseMatrix`]; sequence chains feed a
//! [`MultiGraph`](crate::data::storage::MultiGraph) instead.

use std::time::Duration;

use crate::data::storage::{Bipartite, SparseMatrix};
use crate::model::stats::{bjdm_vector, emd_distance};
use crate::samplers::StepOutcome;

/// Default spacing of distance samples, in iterations
pub const DEFAULT_DISTANCE_EVERY: u64 = 100;

pub trait ChainObserver<S: ?Sized = SparseMatrix> {
    /// Chain built; `setup` is the time spent building it
    fn on_setup(&mut self, _setup: Duration, _state: &S) {}

    fn on_step_start(&mut self, _step: u64) {}

    fn on_step_end(&mut self, _step: u64, _outcome: StepOutcome, _state: &S) {}

    /// Last iteration done; `caterpillars` is the terminal structural statistic
    fn on_finish(&mut self, _state: &S, _caterpillars: u64) {}
}

impl<S: ?Sized> ChainObserver<S> for () {}

impl<S: ?Sized, A: ChainObserver<S>, B: ChainObserver<S>> ChainObserver<S> for (A, B) {
    fn on_setup(&mut self, setup: Duration, state: &S) {
        self.0.on_setup(setup, state);
        self.1.on_setup(setup, state);
    }

    fn on_step_start(&mut self, step: u64) {
        self.0.on_step_start(step);
        self.1.on_step_start(step);
    }

    fn on_step_end(&mut self, step: u64, outcome: StepOutcome, state: &S) {
        self.0.on_step_end(step, outcome, state);
        self.1.on_step_end(step, outcome, state);
    }

    fn on_finish(&mut self, state: &S, caterpillars: u64) {
        self.0.on_finish(state, caterpillars);
        self.1.on_finish(state, caterpillars);
    }
}

impl<S: ?Sized, T: ChainObserver<S> + ?Sized> ChainObserver<S> for &mut T {
    fn on_setup(&mut self, setup: Duration, state: &S) {
        (**self).on_setup(setup, state);
    }

    fn on_step_start(&mut self, step: u64) {
        (**self).on_step_start(step);
    }

    fn on_step_end(&mut self, step: u64, outcome: StepOutcome, state: &S) {
        (**self).on_step_end(step, outcome, state);
    }

    fn on_finish(&mut self, state: &S, caterpillars: u64) {
        (**self).on_finish(state, caterpillars);
    }
}

/// Earth mover's distance between the current and the starting normalized
/// BJDM vector, sampled every `every` iterations (iteration 0 included)
#[derive(Clone, Debug)]
pub struct DistanceObserver {
    every: u64,
    start: Vec<f64>,
    distances: Vec<(u64, f64)>,
}

impl DistanceObserver {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            start: Vec::new(),
            distances: Vec::new(),
        }
    }

    /// `(iteration, distance)` pairs in order
    pub fn distances(&self) -> &[(u64, f64)] {
        &self.distances
    }

    pub fn max_distance(&self) -> f64 {
        self.distances.iter().map(|&(_, d)| d).fold(0.0, f64::max)
    }
}

impl Default for DistanceObserver {
    fn default() -> Self {
        Self::new(DEFAULT_DISTANCE_EVERY)
    }
}

impl<S: Bipartite + ?Sized> ChainObserver<S> for DistanceObserver {
    fn on_setup(&mut self, _setup: Duration, state: &S) {
        self.start = bjdm_vector(state, true);
        self.distances.clear();
    }

    fn on_step_end(&mut self, step: u64, _outcome: StepOutcome, state: &S) {
        if step % self.every == 0 {
            let current = bjdm_vector(state, true);
            self.distances.push((step, emd_distance(&current, &self.start)));
        }
    }
}

/// Terminal caterpillar count
#[derive(Clone, Debug, Default)]
pub struct StructuralObserver {
    caterpillars: Option<u64>,
}

impl StructuralObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn caterpillars(&self) -> Option<u64> {
        self.caterpillars
    }
}

impl<S: ?Sized> ChainObserver<S> for StructuralObserver {
    fn on_finish(&mut self, _state: &S, caterpillars: u64) {
        self.caterpillars = Some(caterpillars);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::stats::caterpillar_count;
    use crate::samplers::{sample, sample_instrumented, SamplerKind};

    fn matrix() -> SparseMatrix {
        SparseMatrix::from_rows(4, vec![vec![0], vec![0, 1], vec![1, 2, 3], vec![2, 3], vec![0, 3]]).unwrap()
    }

    #[test]
    fn test_distance_sampling() {
        let m = matrix();
        let mut distance = DistanceObserver::new(100);
        sample_instrumented(SamplerKind::Bjdm, &m, 1_000, 4, &mut distance).unwrap();

        let steps: Vec<u64> = distance.distances().iter().map(|&(s, _)| s).collect();
        assert_eq!(steps, (0..10).map(|i| i * 100).collect::<Vec<_>>());
        // BJDM swaps never change the joint degree matrix
        assert!(distance.max_distance() < 1e-12);
    }

    #[test]
    fn test_gmmt_distance_is_nonnegative() {
        let m = matrix();
        let mut distance = DistanceObserver::new(10);
        sample_instrumented(SamplerKind::Gmmt, &m, 500, 4, &mut distance).unwrap();
        assert_eq!(distance.distances().len(), 50);
        assert!(distance.distances().iter().all(|&(_, d)| d >= 0.0));
    }

    #[test]
    fn test_observers_do_not_change_sample() {
        let m = matrix();
        let mut observers = (DistanceObserver::default(), StructuralObserver::new());
        let out = sample_instrumented(SamplerKind::Curveball, &m, 400, 9, &mut observers).unwrap();
        let plain = sample(SamplerKind::Curveball, &m, 400, 9).unwrap();
        assert_eq!(out.matrix, plain);
        assert_eq!(observers.1.caterpillars(), Some(caterpillar_count(&plain)));
    }
}
