//! # Row Multiset Index
//!
//! Content → number of rows with that content. The count for a row's own
//! content always includes the row itself, so it is at least 1 for any row
//! currently in the matrix and 0 for a candidate row nobody has yet.
//!
//! Keys are compared as given: sorted index sets for matrices, ordered
//! sequences (repeats allowed) for multigraphs.

use std::collections::HashMap;

use crate::data::storage::sparse::RowKey;
use crate::data::storage::Bipartite;
use crate::error::{Result, SwapError};

/// Read access to identical-row counts
pub trait EqCounts {
    fn count(&self, row: &[u32]) -> u32;
}

/// Live multiset of row contents
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultisetIndex {
    counts: HashMap<RowKey, u32>,
}

impl MultisetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the rows of a matrix or multigraph
    pub fn from_rows<B: Bipartite + ?Sized>(state: &B) -> Self {
        Self::from_vectors((0..state.n_rows()).map(|r| state.row_entries(r)))
    }

    /// Index arbitrary row contents
    pub fn from_vectors<'a>(vectors: impl IntoIterator<Item = &'a [u32]>) -> Self {
        let mut index = Self::new();
        for v in vectors {
            index.increment(v);
        }
        index
    }

    /// Add one row with content `row`. A key is copied out of the slice on
    /// first insertion only.
    pub fn increment(&mut self, row: &[u32]) {
        if let Some(count) = self.counts.get_mut(row) {
            *count += 1;
        } else {
            self.counts.insert(RowKey::from(row), 1);
        }
    }

    /// Remove one row with content `row`; the key disappears at zero
    pub fn decrement(&mut self, row: &[u32]) -> Result<()> {
        match self.counts.get_mut(row) {
            Some(count) if *count > 1 => {
                *count -= 1;
                Ok(())
            }
            Some(_) => {
                self.counts.remove(row);
                Ok(())
            }
            None => Err(SwapError::invariant(format!(
                "multiset index has no row {:?} to remove",
                row
            ))),
        }
    }

    /// Number of distinct row contents
    pub fn n_distinct(&self) -> usize {
        self.counts.len()
    }

    /// Total number of rows indexed
    pub fn n_total(&self) -> u64 {
        self.counts.values().map(|&c| c as u64).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RowKey, u32)> + '_ {
        self.counts.iter().map(|(k, &c)| (k, c))
    }
}

impl EqCounts for MultisetIndex {
    #[inline]
    fn count(&self, row: &[u32]) -> u32 {
        self.counts.get(row).copied().unwrap_or(0)
    }
}

/// Shadow overlay over a live index.
///
/// Records signed adjustments so a batch of row replacements can be
/// evaluated without touching the live counts.
#[derive(Debug)]
pub struct ScratchCounts<'a> {
    base: &'a MultisetIndex,
    delta: HashMap<RowKey, i64>,
}

impl<'a> ScratchCounts<'a> {
    pub fn new(base: &'a MultisetIndex) -> Self {
        Self {
            base,
            delta: HashMap::new(),
        }
    }

    pub fn increment(&mut self, row: &[u32]) {
        self.adjust(row, 1);
    }

    pub fn decrement(&mut self, row: &[u32]) {
        self.adjust(row, -1);
    }

    fn adjust(&mut self, row: &[u32], by: i64) {
        if let Some(d) = self.delta.get_mut(row) {
            *d += by;
        } else {
            self.delta.insert(RowKey::from(row), by);
        }
    }
}

impl EqCounts for ScratchCounts<'_> {
    fn count(&self, row: &[u32]) -> u32 {
        let base = self.base.count(row) as i64;
        let delta = self.delta.get(row).copied().unwrap_or(0);
        let count = base + delta;
        debug_assert!(count >= 0, "overlay count of {:?} is negative ({})", row, count);
        u32::try_from(count).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::storage::SparseMatrix;

    #[test]
    fn test_counts() {
        let m = SparseMatrix::from_rows(3, vec![vec![0, 1], vec![0, 1], vec![2], vec![]]).unwrap();
        let index = MultisetIndex::from_rows(&m);
        assert_eq!(index.count(&[0, 1]), 2);
        assert_eq!(index.count(&[2]), 1);
        assert_eq!(index.count(&[]), 1);
        assert_eq!(index.count(&[1, 2]), 0);
        assert_eq!(index.n_distinct(), 3);
        assert_eq!(index.n_total(), 4);
    }

    #[test]
    fn test_increment_decrement() {
        let mut index = MultisetIndex::new();
        index.increment(&[3, 4]);
        index.increment(&[3, 4]);
        index.decrement(&[3, 4]).unwrap();
        assert_eq!(index.count(&[3, 4]), 1);
        index.decrement(&[3, 4]).unwrap();
        assert_eq!(index.count(&[3, 4]), 0);
        assert_eq!(index.n_distinct(), 0);

        let err = index.decrement(&[3, 4]).unwrap_err();
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_scratch_overlay() {
        let index = MultisetIndex::from_vectors([&[0u32][..], &[0][..], &[1][..]]);
        let mut scratch = ScratchCounts::new(&index);
        scratch.decrement(&[0]);
        scratch.increment(&[2]);
        scratch.increment(&[2]);
        assert_eq!(scratch.count(&[0]), 1);
        assert_eq!(scratch.count(&[1]), 1);
        assert_eq!(scratch.count(&[2]), 2);
        // live index untouched
        assert_eq!(index.count(&[0]), 2);
        assert_eq!(index.count(&[2]), 0);
    }

    #[test]
    fn test_sequences_count_by_order() {
        let index = MultisetIndex::from_vectors([&[2u32, 0, 2][..], &[2, 0, 2][..], &[0, 2, 2][..]]);
        assert_eq!(index.count(&[2, 0, 2]), 2);
        assert_eq!(index.count(&[0, 2, 2]), 1);
        assert_eq!(index.count(&[2, 2, 0]), 0);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "negative")]
    fn test_scratch_underflow_is_caught() {
        let index = MultisetIndex::from_vectors([&[0u32][..]]);
        let mut scratch = ScratchCounts::new(&index);
        scratch.decrement(&[0]);
        scratch.decrement(&[0]);
        let _ = scratch.count(&[0]);
    }
}
