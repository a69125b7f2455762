//! # Marginswap Library
//!
//! Markov-chain samplers of 0/1 matrices (transactional datasets) with the
//! row and column sums of an observed one, and of sequence multigraphs with
//! the sequence lengths and itemset multiplicities of an observed sequence
//! dataset. The samples form a null model for testing whether mined
//! patterns are explained by the margins alone.
//!
//! ## Modules
//! - `config`: CLI argument parsing and validation
//! - `data`: Sparse matrix, sequence multigraph, edge set and row multiset index
//! - `error`: Error types and result aliases
//! - `io`: Transactional and sequence dataset reading/writing
//! - `model`: Equivalence counts, proposals, structural statistics
//! - `samplers`: The chain loop and its transition families
//! - `pipelines`: Parallel multi-sample orchestration
//! - `utils`: Thread pools and step timing

pub mod config;
pub mod data;
pub mod error;
pub mod io;
pub mod model;
pub mod pipelines;
pub mod samplers;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use data::{Bipartite, Edge, EdgeSet, MultiGraph, MultisetIndex, RowKey, RowStorage, SparseMatrix};
pub use error::{Result, SwapError};
pub use io::{Dataset, SequenceDataset};
pub use model::{Axis, BjdmState, CurveballTrade, EdgeSwap, Proposal, SequenceState};
pub use pipelines::SamplingPipeline;
pub use samplers::{
    run_sequence_sampler, sample, sample_instrumented, sample_with_degree, ChainObserver, ChainOptions, ChainOutput,
    ChainStats, SampleInput, SamplerKind,
};
pub use utils::StepTimer;
