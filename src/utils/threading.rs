//! # Threading Configuration
//!
//! Bounded rayon pools for running independent chains in parallel.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, SwapError};

/// Create a pool with `n_threads` named workers
pub fn build_thread_pool(n_threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads.max(1))
        .thread_name(|i| format!("marginswap-worker-{}", i))
        .build()
        .map_err(|e| SwapError::config(format!("Failed to create thread pool: {}", e)))
}

/// Completion counter shared by parallel workers
#[derive(Debug)]
pub struct Progress {
    done: AtomicUsize,
    total: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            done: AtomicUsize::new(0),
            total,
        }
    }

    /// Mark one unit finished; returns the number finished so far
    pub fn tick(&self) -> usize {
        self.done.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn total(&self) -> usize {
        self.total
    }
}
