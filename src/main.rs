//! # Marginswap: Margin-Preserving Random Datasets
//!
//! Samples random transactional datasets with the same transaction lengths
//! and item supports as an observed one, or random sequence datasets with
//! the same sequence lengths and itemset multiplicities.
//!
//! ## Usage
//! ```bash
//! # 16 samples with the BJDM sampler, 2 iterations per one
//! marginswap --dataset retail.dat --out samples/retail --num-samples 16
//!
//! # Curveball, fixed iteration count, JSON report with step timings
//! marginswap --dataset retail.dat --out samples/retail --sampler curveball \
//!     --num-swaps 1000000 --report run.json --timing
//!
//! # Sequence dataset with ALICE-C and butterfly counts in the report
//! marginswap --dataset bike.seq --out samples/bike --sampler alice-c \
//!     --butterflies --report run.json
//!
//! # With profiling output
//! marginswap --dataset retail.dat --out samples/retail --profile
//! ```

use std::time::Instant;

use anyhow::Context;

use marginswap::config::Config;
use marginswap::pipelines::SamplingPipeline;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing subscriber for hierarchical profiling output
fn init_profiling() {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(false)
                .with_timer(fmt::time::uptime()),
        )
        .init();
}

fn run() -> anyhow::Result<()> {
    let start = Instant::now();

    // Parse and validate configuration
    let config = Config::parse_and_validate().context("invalid arguments")?;

    // Initialize profiling if requested
    if config.profile || std::env::var_os("RUST_LOG").is_some() {
        init_profiling();
        if config.profile {
            eprintln!("=== Profiling enabled ===\n");
        }
    }

    let n_threads = config.nthreads();

    eprintln!("Marginswap v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("Threads: {}", n_threads);
    eprintln!("Sampler: {}", config.sampler);
    eprintln!("Input: {:?}", config.dataset);

    let dataset = config.dataset.clone();
    let mut pipeline = SamplingPipeline::new(config);
    let report = pipeline
        .run()
        .with_context(|| format!("sampling from {:?} failed", dataset))?;

    let accepted: u64 = report.samples.iter().map(|s| s.stats.accepted).sum();
    let proposed: u64 = report.samples.iter().map(|s| s.stats.proposed).sum();
    eprintln!(
        "\nAccepted {}/{} proposed transitions over {} samples",
        accepted,
        proposed,
        report.samples.len()
    );

    let elapsed = start.elapsed();
    eprintln!("Completed in {:.2}s", elapsed.as_secs_f64());

    Ok(())
}
