//! # Utilities Module
//!
//! ## Role
//! Cross-cutting helpers that don't belong in domain-specific modules.
//!
//! ## Sub-modules
//! - `threading`: Rayon thread pool configuration and shared progress
//! - `timer`: Setup and per-step timing of a chain

pub mod threading;
pub mod timer;

pub use timer::{StepTimer, TimingSummary};
