//! # I/O Module
//!
//! Reading observed datasets and writing sampled ones.
//!
//! - `dataset`: transactional files, one transaction of items per line
//! - `sequence`: sequence files, itemsets closed by `-1` and sequences by `-2`

pub mod dataset;
pub mod sequence;

pub use dataset::Dataset;
pub use sequence::SequenceDataset;
