//! # Model Module
//!
//! The sampler's mathematics, independent of how chains are driven.
//!
//! - `equivalence`: log number of equivalent matrices and its O(1) update
//! - `proposal`: candidate selection (equal-sum swaps, curveball trades,
//!   uniform edge pairs)
//! - `bjdm`: matrix + multiset index + running log count, mutated together
//! - `sequence`: multigraph + ordered-row index + running log count, with
//!   the ALICE pair selection
//! - `stats`: BJDM vector, earth mover's distance, motif counts

pub mod bjdm;
pub mod equivalence;
pub mod proposal;
pub mod sequence;
pub mod stats;

pub use bjdm::BjdmState;
pub use proposal::{Axis, CurveballTrade, EdgeSwap, Proposal, SwapSelector};
pub use sequence::{SequenceSelector, SequenceState};
