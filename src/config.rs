//! # Configuration
//!
//! ## Role
//! CLI argument parsing and validation.
//!
//! ## Swap count
//! `--num-swaps` wins when given; otherwise the chain runs
//! `--swaps-factor × (number of ones)` iterations, rounded up. For sequence
//! datasets the ones are the sequence elements.
//!
//! ## Dataset format
//! The ALICE samplers (`alice-s`, `alice-c`) read sequence files; every
//! other sampler reads transactional files.
//!
//! ## Example CLI
//! ```bash
//! marginswap --dataset retail.dat --out samples/retail --sampler curveball \
//!     --num-samples 64 --swaps-factor 2 --seed 1 --nthreads 8
//! marginswap --dataset bike.seq --out samples/bike --sampler alice-c --butterflies \
//!     --report bike.json
//! ```

use std::path::PathBuf;

use clap::Parser;

use crate::error::{Result, SwapError};
use crate::samplers::{ChainOptions, SamplerKind};

#[derive(Parser, Debug, Clone)]
#[command(name = "marginswap", version, about = "Random 0/1 matrices with the row and column sums of a dataset")]
pub struct Config {
    /// Observed dataset: one transaction per line, or one sequence per line
    /// for the ALICE samplers
    #[arg(long)]
    pub dataset: PathBuf,

    /// Output prefix; sample i is written to `{out}_{i}.dat`
    #[arg(long)]
    pub out: PathBuf,

    /// Transition family
    #[arg(long, value_enum, default_value_t = SamplerKind::Bjdm)]
    pub sampler: SamplerKind,

    /// Number of independent samples
    #[arg(long, default_value_t = 1)]
    pub num_samples: usize,

    /// Chain iterations per sample (overrides --swaps-factor)
    #[arg(long)]
    pub num_swaps: Option<u64>,

    /// Chain iterations per one in the matrix
    #[arg(long, default_value_t = 2.0)]
    pub swaps_factor: f64,

    /// Master seed; sample i uses seed + i
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Worker threads (default: all cores)
    #[arg(long)]
    pub nthreads: Option<usize>,

    /// Edge-pair draws per iteration for uniform samplers
    #[arg(long, default_value_t = 1)]
    pub retry_budget: usize,

    /// Verify every invariant after each accepted transition
    #[arg(long)]
    pub check_invariants: bool,

    /// Degree hint recorded in the report
    #[arg(long)]
    pub degree: Option<u64>,

    /// Write a JSON run report here
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Record per-step timings in the report
    #[arg(long)]
    pub timing: bool,

    /// Count butterflies of every sample for the report
    #[arg(long)]
    pub butterflies: bool,

    /// Enable span profiling output
    #[arg(long)]
    pub profile: bool,
}

impl Config {
    /// Parse from `std::env::args` and validate
    pub fn parse_and_validate() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.dataset.exists() {
            return Err(SwapError::FileNotFound {
                path: self.dataset.clone(),
            });
        }
        if self.num_samples == 0 {
            return Err(SwapError::config("--num-samples must be positive"));
        }
        if self.num_swaps.is_none() && !(self.swaps_factor.is_finite() && self.swaps_factor >= 0.0) {
            return Err(SwapError::config(format!(
                "--swaps-factor must be a non-negative number, got {}",
                self.swaps_factor
            )));
        }
        if self.nthreads == Some(0) {
            return Err(SwapError::config("--nthreads must be positive"));
        }
        if self.retry_budget == 0 {
            return Err(SwapError::config("--retry-budget must be positive"));
        }
        Ok(())
    }

    /// Worker threads to use
    pub fn nthreads(&self) -> usize {
        self.nthreads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Chain iterations for a matrix with `n_edges` ones
    pub fn num_swaps(&self, n_edges: usize) -> u64 {
        self.num_swaps
            .unwrap_or_else(|| (self.swaps_factor * n_edges as f64).ceil() as u64)
    }

    pub fn chain_options(&self) -> ChainOptions {
        ChainOptions {
            retry_budget: self.retry_budget,
            check_invariants: self.check_invariants,
        }
    }

    /// Output file of sample `i`
    pub fn sample_path(&self, i: usize) -> PathBuf {
        let mut name = self.out.as_os_str().to_os_string();
        name.push(format!("_{}.dat", i));
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("marginswap").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let c = parse(&["--dataset", "in.dat", "--out", "out/s"]);
        assert_eq!(c.sampler, SamplerKind::Bjdm);
        assert_eq!(c.num_samples, 1);
        assert_eq!(c.retry_budget, 1);
        assert_eq!(c.num_swaps(10), 20);
        assert_eq!(c.sample_path(3), PathBuf::from("out/s_3.dat"));
    }

    #[test]
    fn test_num_swaps_override() {
        let c = parse(&[
            "--dataset", "in.dat", "--out", "o", "--num-swaps", "7", "--swaps-factor", "5",
        ]);
        assert_eq!(c.num_swaps(1000), 7);

        let c = parse(&["--dataset", "in.dat", "--out", "o", "--swaps-factor", "0.5"]);
        assert_eq!(c.num_swaps(3), 2);
    }

    #[test]
    fn test_sampler_names() {
        let c = parse(&["--dataset", "d", "--out", "o", "--sampler", "self-loop-bjdm"]);
        assert_eq!(c.sampler, SamplerKind::SelfLoopBjdm);
        let c = parse(&["--dataset", "d", "--out", "o", "--sampler", "alice-s", "--butterflies"]);
        assert_eq!(c.sampler, SamplerKind::AliceS);
        assert!(c.butterflies);
    }

    #[test]
    fn test_validate() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("in.dat");
        std::fs::write(&data, "1 2\n").unwrap();
        let data = data.to_str().unwrap();

        assert!(parse(&["--dataset", data, "--out", "o"]).validate().is_ok());
        assert!(parse(&["--dataset", data, "--out", "o", "--num-samples", "0"]).validate().is_err());
        assert!(parse(&["--dataset", data, "--out", "o", "--retry-budget", "0"]).validate().is_err());
        assert!(matches!(
            parse(&["--dataset", "/missing.dat", "--out", "o"]).validate(),
            Err(SwapError::FileNotFound { .. })
        ));
    }
}
