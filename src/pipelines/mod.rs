//! # Pipeline Module
//!
//! High-level orchestration: dataset in, sampled datasets and a run report
//! out.

pub mod sampling;

pub use sampling::{derive_seed, sample_many, RunReport, SamplingPipeline};
