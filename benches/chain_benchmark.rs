//! Criterion benchmarks for the chain samplers.
//!
//! - Iteration throughput of each sampler on a synthetic dataset
//! - Iteration throughput of the sequence samplers on synthetic sequences
//! - Full recomputation of the log equivalence count

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use marginswap::model::equivalence::log_num_equiv_matrices;
use marginswap::samplers::{run_sampler, run_sequence_sampler, ChainOptions, SamplerKind};
use marginswap::{MultiGraph, MultisetIndex, SparseMatrix};

const STEPS: u64 = 1_000;

/// Transactions of a few common lengths over a skewed item distribution
fn synthetic(n_rows: usize, n_cols: usize, seed: u64) -> SparseMatrix {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let rows = (0..n_rows)
        .map(|_| {
            let len = [3usize, 5, 8][rng.random_range(0..3)];
            let mut row: Vec<u32> = Vec::with_capacity(len);
            while row.len() < len {
                let skew: f64 = rng.random();
                let c = ((skew * skew) * n_cols as f64) as u32;
                if !row.contains(&c) {
                    row.push(c);
                }
            }
            row
        })
        .collect();
    SparseMatrix::from_rows(n_cols, rows).unwrap()
}

/// Sequences of a few lengths over skewed itemsets, repeats allowed
fn synthetic_sequences(n_rows: usize, n_cols: usize, seed: u64) -> MultiGraph {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let rows = (0..n_rows)
        .map(|_| {
            let len = [2usize, 4, 6][rng.random_range(0..3)];
            (0..len)
                .map(|_| {
                    let skew: f64 = rng.random();
                    ((skew * skew) * n_cols as f64) as u32
                })
                .collect()
        })
        .collect();
    MultiGraph::from_sequences(n_cols, rows).unwrap()
}

fn bench_samplers(c: &mut Criterion) {
    let matrix = synthetic(500, 100, 1);
    let options = ChainOptions::default();

    let mut group = c.benchmark_group("sampler_steps");
    group.throughput(Throughput::Elements(STEPS));
    for kind in [SamplerKind::Bjdm, SamplerKind::Curveball, SamplerKind::Gmmt, SamplerKind::SelfLoopBjdm] {
        group.bench_with_input(BenchmarkId::from_parameter(kind), &kind, |b, &kind| {
            b.iter(|| run_sampler(kind, black_box(&matrix), STEPS, 7, &options, &mut ()).unwrap());
        });
    }
    group.finish();
}

fn bench_sequence_samplers(c: &mut Criterion) {
    let graph = synthetic_sequences(500, 80, 3);
    let options = ChainOptions::default();

    let mut group = c.benchmark_group("sequence_sampler_steps");
    group.throughput(Throughput::Elements(STEPS));
    for kind in [SamplerKind::AliceS, SamplerKind::AliceC] {
        group.bench_with_input(BenchmarkId::from_parameter(kind), &kind, |b, &kind| {
            b.iter(|| run_sequence_sampler(kind, black_box(&graph), STEPS, 7, &options, &mut ()).unwrap());
        });
    }
    group.finish();
}

fn bench_log_equiv(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_equiv_recompute");
    for n_rows in [100usize, 1_000] {
        let matrix = synthetic(n_rows, 100, 2);
        let index = MultisetIndex::from_rows(&matrix);
        group.bench_with_input(BenchmarkId::from_parameter(n_rows), &n_rows, |b, _| {
            b.iter(|| log_num_equiv_matrices(black_box(&matrix), black_box(&index)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_samplers, bench_sequence_samplers, bench_log_equiv);
criterion_main!(benches);
