//! # Edges and the Global Edge Set
//!
//! An edge is a `(row, col)` coordinate holding a 1. The matrix owns one
//! [`EdgeSet`] that mirrors its nonzero entries.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A `(row, col)` position with value 1
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Edge {
    pub row: u32,
    pub col: u32,
}

impl Edge {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    pub fn row_usize(self) -> usize {
        self.row as usize
    }

    pub fn col_usize(self) -> usize {
        self.col as usize
    }
}

impl From<(u32, u32)> for Edge {
    fn from((row, col): (u32, u32)) -> Self {
        Self { row, col }
    }
}

/// Indexed edge set.
///
/// Dense `Vec` of edges plus a position map, so membership, insertion,
/// removal and uniform sampling are all O(1). Removal swaps the last edge
/// into the freed slot; the order of `edges` is therefore a deterministic
/// function of the operation sequence.
#[derive(Clone, Debug, Default)]
pub struct EdgeSet {
    edges: Vec<Edge>,
    positions: HashMap<Edge, usize>,
}

impl EdgeSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    #[inline]
    pub fn contains(&self, edge: &Edge) -> bool {
        self.positions.contains_key(edge)
    }

    /// Insert an edge. Returns false if it was already present.
    pub fn insert(&mut self, edge: Edge) -> bool {
        if self.positions.contains_key(&edge) {
            return false;
        }
        self.positions.insert(edge, self.edges.len());
        self.edges.push(edge);
        true
    }

    /// Remove an edge. Returns false if it was absent.
    pub fn remove(&mut self, edge: &Edge) -> bool {
        let Some(pos) = self.positions.remove(edge) else {
            return false;
        };
        self.edges.swap_remove(pos);
        if let Some(moved) = self.edges.get(pos) {
            self.positions.insert(*moved, pos);
        }
        true
    }

    /// Draw one edge uniformly at random
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Edge> {
        if self.edges.is_empty() {
            return None;
        }
        Some(self.edges[rng.random_range(0..self.edges.len())])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter()
    }
}

impl FromIterator<Edge> for EdgeSet {
    fn from_iter<I: IntoIterator<Item = Edge>>(iter: I) -> Self {
        let mut set = EdgeSet::new();
        for edge in iter {
            set.insert(edge);
        }
        set
    }
}
