//! # Sampling Pipeline
//!
//! Orchestrates a null-model run:
//! 1. Load the observed dataset (transactional, or sequences for the ALICE
//!    samplers)
//! 2. Derive the iteration count from the number of ones
//! 3. Run one independent chain per sample on a dedicated rayon pool of
//!    `--nthreads` workers, each on its own copy of the observed state with
//!    seed `master + i`
//! 4. Write every sample with the dataset's labels
//! 5. Optionally write a JSON run report
//!
//! Samples are collected in index order, so output does not depend on the
//! number of threads.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use tracing::{info_span, instrument};

use crate::config::Config;
use crate::data::storage::{MultisetIndex, SparseMatrix};
use crate::error::Result;
use crate::io::{Dataset, SequenceDataset};
use crate::model::equivalence::log_num_equiv_matrices;
use crate::model::stats::butterfly_count;
use crate::samplers::{ChainOptions, ChainOutput, ChainStats, SampleInput, SamplerKind};
use crate::utils::threading::{build_thread_pool, Progress};
use crate::utils::{StepTimer, TimingSummary};

/// Seed of sample `index` under master seed `master`
#[inline]
pub fn derive_seed(master: u64, index: usize) -> u64 {
    master.wrapping_add(index as u64)
}

/// One finished chain and its optional timings
#[derive(Clone, Debug)]
pub struct SampleResult<S = SparseMatrix> {
    pub index: usize,
    pub seed: u64,
    pub output: ChainOutput<S>,
    pub timing: Option<TimingSummary>,
}

/// Run `num_samples` independent chains on the current rayon pool
pub fn sample_many<S: SampleInput>(
    kind: SamplerKind,
    observed: &S,
    num_samples: usize,
    num_swaps: u64,
    master_seed: u64,
    options: &ChainOptions,
    timing: bool,
) -> Result<Vec<SampleResult<S>>> {
    let progress = Progress::new(num_samples);
    let report_every = (num_samples / 10).max(1);

    (0..num_samples)
        .into_par_iter()
        .map(|index| -> Result<SampleResult<S>> {
            let seed = derive_seed(master_seed, index);
            let mut timer = StepTimer::new(timing);
            let output = observed.run_chain(kind, num_swaps, seed, options, &mut timer)?;

            let done = progress.tick();
            if done % report_every == 0 || done == progress.total() {
                eprintln!("  Sampled {}/{}", done, progress.total());
            }
            Ok(SampleResult {
                index,
                seed,
                output,
                timing: timer.summary(),
            })
        })
        .collect()
}

/// Per-sample entry of the run report
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SampleReport {
    pub index: usize,
    pub seed: u64,
    pub path: PathBuf,
    pub stats: ChainStats,
    pub log_equiv: Option<f64>,
    pub caterpillars: u64,
    /// Butterfly count of the sample, with `--butterflies`
    #[serde(default)]
    pub butterflies: Option<u64>,
    pub timing: Option<TimingSummary>,
}

/// Summary of a whole run, written as JSON with `--report`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub sampler: SamplerKind,
    pub dataset: PathBuf,
    /// Transactions, or sequences
    pub n_transactions: usize,
    /// Items, or distinct itemsets
    pub n_items: usize,
    /// Ones, or sequence elements
    pub n_ones: usize,
    pub num_swaps: u64,
    pub master_seed: u64,
    pub degree: Option<u64>,
    pub log_equiv_observed: f64,
    pub samples: Vec<SampleReport>,
}

impl RunReport {
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

pub struct SamplingPipeline {
    config: Config,
}

impl SamplingPipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    #[instrument(skip_all, fields(sampler = %self.config.sampler, num_samples = self.config.num_samples))]
    pub fn run(&mut self) -> Result<RunReport> {
        let pool = build_thread_pool(self.config.nthreads())?;

        if self.config.sampler.is_sequence() {
            eprintln!("Loading sequence dataset...");
            let dataset = SequenceDataset::read(&self.config.dataset)?;
            eprintln!(
                "  {} sequences, {} itemsets, {} elements",
                dataset.n_sequences(),
                dataset.n_itemsets(),
                dataset.graph.n_edges()
            );
            let shape = (dataset.n_sequences(), dataset.n_itemsets());
            self.sample_and_write(&pool, &dataset.graph, shape, |path, graph| dataset.write(path, graph))
        } else {
            eprintln!("Loading dataset...");
            let dataset = Dataset::read(&self.config.dataset)?;
            eprintln!(
                "  {} transactions, {} items, {} ones",
                dataset.n_transactions(),
                dataset.n_items(),
                dataset.matrix.n_edges()
            );
            let shape = (dataset.n_transactions(), dataset.n_items());
            self.sample_and_write(&pool, &dataset.matrix, shape, |path, matrix| dataset.write(path, matrix))
        }
    }

    fn sample_and_write<S, W>(
        &self,
        pool: &ThreadPool,
        observed: &S,
        (n_rows, n_cols): (usize, usize),
        write: W,
    ) -> Result<RunReport>
    where
        S: SampleInput,
        W: Fn(&Path, &S) -> Result<()>,
    {
        let n_ones = observed.n_edges();
        let num_swaps = self.config.num_swaps(n_ones);
        let log_equiv_observed = log_num_equiv_matrices(observed, &MultisetIndex::from_rows(observed));

        eprintln!(
            "Sampling {} datasets with {} ({} iterations each, {} threads)...",
            self.config.num_samples,
            self.config.sampler,
            num_swaps,
            pool.current_num_threads()
        );
        let options = self.config.chain_options();
        let results = pool.install(|| {
            sample_many(
                self.config.sampler,
                observed,
                self.config.num_samples,
                num_swaps,
                self.config.seed,
                &options,
                self.config.timing,
            )
        })?;

        eprintln!("Writing samples to {:?}_*", self.config.out);
        let mut samples = Vec::with_capacity(results.len());
        info_span!("write_samples").in_scope(|| -> Result<()> {
            for result in results {
                let path = self.config.sample_path(result.index);
                write(&path, &result.output.matrix)?;
                let butterflies = self.config.butterflies.then(|| butterfly_count(&result.output.matrix));
                samples.push(SampleReport {
                    index: result.index,
                    seed: result.seed,
                    path,
                    stats: result.output.stats,
                    log_equiv: result.output.log_equiv,
                    caterpillars: result.output.caterpillars,
                    butterflies,
                    timing: result.timing,
                });
            }
            Ok(())
        })?;

        let report = RunReport {
            sampler: self.config.sampler,
            dataset: self.config.dataset.clone(),
            n_transactions: n_rows,
            n_items: n_cols,
            n_ones,
            num_swaps,
            master_seed: self.config.seed,
            degree: self.config.degree,
            log_equiv_observed,
            samples,
        };

        if let Some(path) = &self.config.report {
            eprintln!("Writing report to {:?}", path);
            report.write_json(path)?;
        }
        Ok(report)
    }
}
