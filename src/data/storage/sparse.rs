//! # Sparse Index Sets
//!
//! Live row/column contents (`RowStorage`) and their frozen by-value
//! snapshots (`RowKey`).
//!
//! The multiset index keys on content, while the matrix mutates rows in
//! place. Keeping the two as separate types means the index can never hold
//! a reference into storage that is later mutated: a `RowKey` is only ever
//! created by copying.

use std::borrow::Borrow;
use std::sync::Arc;

/// Mutable sparse set of nonzero indices of one row (or column).
///
/// Indices are kept sorted and unique so that two storages with the same
/// content compare equal and hash identically.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RowStorage {
    indices: Vec<u32>,
}

impl RowStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from arbitrary indices (sorted and deduplicated here)
    pub fn from_indices(mut indices: Vec<u32>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    /// Membership (binary search)
    #[inline]
    pub fn contains(&self, idx: u32) -> bool {
        self.indices.binary_search(&idx).is_ok()
    }

    /// Insert `idx`. Returns false if already present.
    pub fn insert(&mut self, idx: u32) -> bool {
        match self.indices.binary_search(&idx) {
            Ok(_) => false,
            Err(pos) => {
                self.indices.insert(pos, idx);
                true
            }
        }
    }

    /// Remove `idx`. Returns false if absent.
    pub fn remove(&mut self, idx: u32) -> bool {
        match self.indices.binary_search(&idx) {
            Ok(pos) => {
                self.indices.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Set or clear one bit
    pub fn set(&mut self, idx: u32, bit: bool) -> bool {
        if bit {
            self.insert(idx)
        } else {
            self.remove(idx)
        }
    }

    /// Sorted nonzero indices
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Frozen copy of the current content
    pub fn key(&self) -> RowKey {
        RowKey::from_sorted(self.indices.clone())
    }

    /// Content after removing `remove` and adding `insert`, without
    /// touching `self`. Used to evaluate candidate rows.
    pub fn with_moved(&self, remove: u32, insert: u32) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.indices.len());
        let mut pending = Some(insert);
        for &idx in &self.indices {
            if idx == remove {
                continue;
            }
            if let Some(ins) = pending {
                if ins < idx {
                    out.push(ins);
                    pending = None;
                } else if ins == idx {
                    pending = None;
                }
            }
            out.push(idx);
        }
        if let Some(ins) = pending {
            out.push(ins);
        }
        out
    }

    /// Sorted `self \ other`
    pub fn difference(&self, other: &RowStorage) -> Vec<u32> {
        sorted_difference(&self.indices, &other.indices)
    }

    /// Sorted `self ∩ other`
    pub fn intersection(&self, other: &RowStorage) -> Vec<u32> {
        let (a, b) = (&self.indices, &other.indices);
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        out
    }

    /// `|self ∩ other|` without allocating
    pub fn intersection_len(&self, other: &RowStorage) -> usize {
        let (a, b) = (&self.indices, &other.indices);
        let (mut i, mut j, mut n) = (0, 0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    n += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        n
    }
}

/// `a \ b` for strictly increasing slices
pub fn sorted_difference(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() {
        if j >= b.len() || a[i] < b[j] {
            out.push(a[i]);
            i += 1;
        } else if a[i] == b[j] {
            i += 1;
            j += 1;
        } else {
            j += 1;
        }
    }
    out
}

/// Immutable snapshot of a row's content, compared and hashed by value.
///
/// Borrows as `[u32]`, so index lookups with a live row's slice never
/// allocate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(Arc<[u32]>);

impl RowKey {
    /// Wrap indices that are already sorted and unique
    pub fn from_sorted(indices: Vec<u32>) -> Self {
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]), "RowKey indices must be strictly increasing");
        Self(indices.into())
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Copies the slice as is. Sequence rows are ordered but not sorted, and
/// two sequences are only identical when their orders match.
impl From<&[u32]> for RowKey {
    fn from(indices: &[u32]) -> Self {
        Self(indices.into())
    }
}

impl Borrow<[u32]> for RowKey {
    fn borrow(&self) -> &[u32] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_row_storage() {
        let mut row = RowStorage::from_indices(vec![7, 2, 5, 2]);
        assert_eq!(row.indices(), &[2, 5, 7]);
        assert!(row.contains(5));
        assert!(!row.contains(3));

        assert!(row.insert(3));
        assert!(!row.insert(3));
        assert!(row.remove(7));
        assert!(!row.remove(7));
        assert_eq!(row.indices(), &[2, 3, 5]);
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn test_key_is_a_copy() {
        let mut row = RowStorage::from_indices(vec![1, 4]);
        let key = row.key();
        row.set(9, true);
        row.set(1, false);
        assert_eq!(key.indices(), &[1, 4]);
        assert_eq!(row.indices(), &[4, 9]);
    }

    #[test]
    fn test_key_lookup_by_slice() {
        let mut counts: HashMap<RowKey, u32> = HashMap::new();
        counts.insert(RowKey::from_sorted(vec![0, 3]), 2);

        let live = RowStorage::from_indices(vec![3, 0]);
        assert_eq!(counts.get(live.indices()), Some(&2));
        assert_eq!(counts.get(&[0u32, 4][..]), None);
    }

    #[test]
    fn test_sequence_keys_keep_order() {
        let a = RowKey::from(&[3u32, 1, 3][..]);
        let b = RowKey::from(&[1u32, 3, 3][..]);
        assert_ne!(a, b);
        assert_eq!(a.indices(), &[3, 1, 3]);
    }

    #[test]
    fn test_with_moved() {
        let row = RowStorage::from_indices(vec![1, 4, 6]);
        assert_eq!(row.with_moved(4, 5), vec![1, 5, 6]);
        assert_eq!(row.with_moved(1, 0), vec![0, 4, 6]);
        assert_eq!(row.with_moved(6, 9), vec![1, 4, 9]);
        assert_eq!(row.with_moved(1, 8), vec![4, 6, 8]);
        // the live row is untouched
        assert_eq!(row.indices(), &[1, 4, 6]);
    }

    #[test]
    fn test_set_operations() {
        let a = RowStorage::from_indices(vec![0, 2, 3, 5]);
        let b = RowStorage::from_indices(vec![2, 4, 5, 6]);
        assert_eq!(a.difference(&b), vec![0, 3]);
        assert_eq!(b.difference(&a), vec![4, 6]);
        assert_eq!(a.intersection(&b), vec![2, 5]);
        assert_eq!(a.intersection_len(&b), 2);
        assert!(a.difference(&a).is_empty());
    }
}
