//! # Step Timer
//!
//! Setup time plus per-iteration wall times for one chain, with order
//! statistics over the iterations. Plugs into the chain loop as an observer.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::samplers::{ChainObserver, StepOutcome};

#[derive(Clone, Debug, Default)]
pub struct StepTimer {
    enabled: bool,
    setup: Option<Duration>,
    started: Option<Instant>,
    /// Step durations in milliseconds
    times: Vec<f64>,
}

impl StepTimer {
    /// A disabled timer records nothing
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub fn save_setup(&mut self, setup: Duration) {
        if self.enabled {
            self.setup = Some(setup);
        }
    }

    pub fn start(&mut self) {
        if self.enabled {
            self.started = Some(Instant::now());
        }
    }

    pub fn stop(&mut self) {
        if let Some(t0) = self.started.take() {
            self.times.push(t0.elapsed().as_secs_f64() * 1e3);
        }
    }

    pub fn setup(&self) -> Option<Duration> {
        self.setup
    }

    pub fn n_steps(&self) -> usize {
        self.times.len()
    }

    pub fn min(&self) -> Option<f64> {
        self.times.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.times.iter().copied().reduce(f64::max)
    }

    /// Percentile in `(0, 100]` of the recorded step times.
    ///
    /// Position `p (n + 1) / 100` in the sorted sample, linearly
    /// interpolated and clamped to the extremes.
    pub fn percentile(&self, p: f64) -> Option<f64> {
        if self.times.is_empty() || !(p > 0.0 && p <= 100.0) {
            return None;
        }
        let mut sorted = self.times.clone();
        sorted.sort_unstable_by(f64::total_cmp);
        Some(percentile_sorted(&sorted, p))
    }

    pub fn summary(&self) -> Option<TimingSummary> {
        if self.times.is_empty() {
            return None;
        }
        let mut sorted = self.times.clone();
        sorted.sort_unstable_by(f64::total_cmp);
        Some(TimingSummary {
            setup_ms: self.setup.map(|d| d.as_secs_f64() * 1e3),
            min_ms: sorted[0],
            p10_ms: percentile_sorted(&sorted, 10.0),
            q1_ms: percentile_sorted(&sorted, 25.0),
            median_ms: percentile_sorted(&sorted, 50.0),
            q3_ms: percentile_sorted(&sorted, 75.0),
            p90_ms: percentile_sorted(&sorted, 90.0),
            max_ms: sorted[sorted.len() - 1],
        })
    }
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let pos = p * (n as f64 + 1.0) / 100.0;
    if pos < 1.0 {
        return sorted[0];
    }
    if pos >= n as f64 {
        return sorted[n - 1];
    }
    let lower = sorted[pos.floor() as usize - 1];
    let upper = sorted[pos.floor() as usize];
    lower + (pos - pos.floor()) * (upper - lower)
}

/// Order statistics of one chain's step times
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimingSummary {
    pub setup_ms: Option<f64>,
    pub min_ms: f64,
    pub p10_ms: f64,
    pub q1_ms: f64,
    pub median_ms: f64,
    pub q3_ms: f64,
    pub p90_ms: f64,
    pub max_ms: f64,
}

impl<S: ?Sized> ChainObserver<S> for StepTimer {
    fn on_setup(&mut self, setup: Duration, _state: &S) {
        self.save_setup(setup);
    }

    fn on_step_start(&mut self, _step: u64) {
        self.start();
    }

    fn on_step_end(&mut self, _step: u64, _outcome: StepOutcome, _state: &S) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer_with(times: &[f64]) -> StepTimer {
        StepTimer {
            enabled: true,
            times: times.to_vec(),
            ..StepTimer::default()
        }
    }

    #[test]
    fn test_percentiles() {
        let t = timer_with(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(t.min(), Some(1.0));
        assert_eq!(t.max(), Some(4.0));
        // pos = 0.5 * 5 = 2.5 -> between 2 and 3
        assert_eq!(t.percentile(50.0), Some(2.5));
        assert_eq!(t.percentile(10.0), Some(1.0));
        assert_eq!(t.percentile(100.0), Some(4.0));
        assert_eq!(t.percentile(0.0), None);
    }

    #[test]
    fn test_disabled_records_nothing() {
        let mut t = StepTimer::new(false);
        t.save_setup(Duration::from_millis(5));
        t.start();
        t.stop();
        assert_eq!(t.n_steps(), 0);
        assert_eq!(t.setup(), None);
        assert!(t.summary().is_none());
    }

    #[test]
    fn test_records_steps() {
        let mut t = StepTimer::new(true);
        t.save_setup(Duration::from_millis(2));
        for _ in 0..3 {
            t.start();
            t.stop();
        }
        // stop without start is ignored
        t.stop();
        assert_eq!(t.n_steps(), 3);
        let summary = t.summary().unwrap();
        assert!((summary.setup_ms.unwrap() - 2.0).abs() < 1e-9);
        assert!(summary.min_ms <= summary.median_ms && summary.median_ms <= summary.max_ms);
    }
}
