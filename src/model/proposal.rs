//! # Swap Candidates
//!
//! ## Role
//! Turns the RNG stream into candidate transitions. Nothing here mutates the
//! matrix: a proposal is a plain value that a chain later evaluates and
//! applies.
//!
//! ## Families
//! - **Equal-sum pair swap (BJDM):** two rows (or columns) with the same sum
//!   exchange one element each.
//! - **Curveball trade:** the same pair redistributes all of its private
//!   elements at once.
//! - **Uniform edge pair (GMMT / self-loop BJDM):** two edges drawn
//!   uniformly; invalid pairs are retried up to a fixed budget.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::edge::Edge;
use crate::data::storage::sparse::sorted_difference;
use crate::data::storage::SparseMatrix;

/// Whether a proposal pairs rows or columns
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Row,
    Col,
}

impl Axis {
    /// Fair coin
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.random::<bool>() {
            Axis::Row
        } else {
            Axis::Col
        }
    }
}

/// Outcome of one selection attempt
#[derive(Clone, Debug, PartialEq)]
pub enum Proposal<T> {
    /// A transition to evaluate
    Move(T),
    /// The draw would leave the matrix unchanged
    SelfLoop,
    /// No candidate could be drawn (empty axis, exhausted retries)
    NoCandidate,
}

/// Two edges to remove; the replacements are `(r1,c2)` and `(r2,c1)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeSwap {
    pub first: Edge,
    pub second: Edge,
}

impl EdgeSwap {
    pub fn new(first: Edge, second: Edge) -> Self {
        Self { first, second }
    }

    /// Edges inserted by the swap
    #[inline]
    pub fn new_edges(&self) -> (Edge, Edge) {
        (
            Edge::new(self.first.row, self.second.col),
            Edge::new(self.second.row, self.first.col),
        )
    }
}

/// Redistribution of the private elements of two equal-sum rows or columns
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurveballTrade {
    pub axis: Axis,
    pub first: u32,
    pub second: u32,
    /// Full sorted contents after the trade
    pub new_first: Vec<u32>,
    pub new_second: Vec<u32>,
    /// Elementary swaps realizing the trade, on pairwise distinct positions
    pub swaps: Vec<EdgeSwap>,
}

impl CurveballTrade {
    /// Build the trade that gives `first` the contents `new_first` and
    /// `second` the contents `new_second`.
    ///
    /// `gained` are the elements `first` receives, `lost` those it hands
    /// over; the c-th of each form one elementary swap.
    pub fn between(
        matrix: &SparseMatrix,
        axis: Axis,
        first: u32,
        second: u32,
        new_first: Vec<u32>,
        new_second: Vec<u32>,
    ) -> Self {
        let (old_first, old_second) = match axis {
            Axis::Row => (matrix.row_nonzero(first), matrix.row_nonzero(second)),
            Axis::Col => (matrix.col_nonzero(first), matrix.col_nonzero(second)),
        };
        let gained = sorted_difference(&new_first, old_first);
        let lost = sorted_difference(&new_second, old_second);
        debug_assert_eq!(gained.len(), lost.len());

        let swaps = lost
            .iter()
            .zip(&gained)
            .map(|(&l, &g)| match axis {
                Axis::Row => EdgeSwap::new(Edge::new(first, l), Edge::new(second, g)),
                Axis::Col => EdgeSwap::new(Edge::new(l, first), Edge::new(g, second)),
            })
            .collect();

        Self {
            axis,
            first,
            second,
            new_first,
            new_second,
            swaps,
        }
    }

    /// Current contents of the two traded rows/columns
    pub fn current_contents<'m>(&self, matrix: &'m SparseMatrix) -> (&'m [u32], &'m [u32]) {
        match self.axis {
            Axis::Row => (matrix.row_nonzero(self.first), matrix.row_nonzero(self.second)),
            Axis::Col => (matrix.col_nonzero(self.first), matrix.col_nonzero(self.second)),
        }
    }

    /// Rows whose content changes, sorted and unique
    pub fn touched_rows(&self) -> Vec<u32> {
        let mut rows = match self.axis {
            Axis::Row => vec![self.first, self.second],
            Axis::Col => self.swaps.iter().flat_map(|s| [s.first.row, s.second.row]).collect(),
        };
        rows.sort_unstable();
        rows.dedup();
        rows
    }
}

/// Elements bucketed by sum, with the list of elements that have a partner
#[derive(Clone, Debug, Default)]
pub struct SumGroups {
    groups: Vec<Vec<u32>>,
    /// `(group, position within group)` per element
    slots: Vec<(usize, usize)>,
    /// Elements whose group has at least two members, ascending
    samplable: Vec<u32>,
}

impl SumGroups {
    pub fn from_sums(sums: &[u32]) -> Self {
        let mut by_sum: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        for (i, &s) in sums.iter().enumerate() {
            by_sum.entry(s).or_default().push(i as u32);
        }

        let groups: Vec<Vec<u32>> = by_sum.into_values().collect();
        let mut slots = vec![(0, 0); sums.len()];
        let mut samplable = Vec::new();
        for (g, members) in groups.iter().enumerate() {
            for (pos, &e) in members.iter().enumerate() {
                slots[e as usize] = (g, pos);
                if members.len() > 1 {
                    samplable.push(e);
                }
            }
        }
        samplable.sort_unstable();

        Self {
            groups,
            slots,
            samplable,
        }
    }

    pub fn n_samplable(&self) -> usize {
        self.samplable.len()
    }

    pub fn n_groups(&self) -> usize {
        self.groups.len()
    }

    /// Uniform first element among samplable ones, then a uniform distinct
    /// partner from its group. No rejection loop.
    pub fn sample_pair<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(u32, u32)> {
        if self.samplable.is_empty() {
            return None;
        }
        let first = self.samplable[rng.random_range(0..self.samplable.len())];
        let (g, pos) = self.slots[first as usize];
        let members = &self.groups[g];
        let mut j = rng.random_range(0..members.len() - 1);
        if j >= pos {
            j += 1;
        }
        Some((first, members[j]))
    }
}

/// Equal-sum pair selection over both axes
#[derive(Clone, Debug)]
pub struct SwapSelector {
    row_groups: SumGroups,
    col_groups: SumGroups,
}

impl SwapSelector {
    pub fn new(matrix: &SparseMatrix) -> Self {
        Self {
            row_groups: SumGroups::from_sums(matrix.row_sums()),
            col_groups: SumGroups::from_sums(matrix.col_sums()),
        }
    }

    fn groups(&self, axis: Axis) -> &SumGroups {
        match axis {
            Axis::Row => &self.row_groups,
            Axis::Col => &self.col_groups,
        }
    }

    fn pair<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(Axis, u32, u32)> {
        let axis = Axis::random(rng);
        let (a, b) = self.groups(axis).sample_pair(rng)?;
        Some((axis, a, b))
    }

    /// BJDM proposal: exchange one private element of each side
    pub fn equal_sum_swap<R: Rng + ?Sized>(&self, matrix: &SparseMatrix, rng: &mut R) -> Proposal<EdgeSwap> {
        let Some((axis, a, b)) = self.pair(rng) else {
            return Proposal::NoCandidate;
        };
        let (va, vb) = match axis {
            Axis::Row => (matrix.row(a), matrix.row(b)),
            Axis::Col => (matrix.col(a), matrix.col(b)),
        };

        let only_a = va.difference(vb);
        if only_a.is_empty() {
            return Proposal::SelfLoop;
        }
        let only_b = vb.difference(va);
        let f1 = only_a[rng.random_range(0..only_a.len())];
        let f2 = only_b[rng.random_range(0..only_b.len())];

        Proposal::Move(match axis {
            Axis::Row => EdgeSwap::new(Edge::new(a, f1), Edge::new(b, f2)),
            Axis::Col => EdgeSwap::new(Edge::new(f1, a), Edge::new(f2, b)),
        })
    }

    /// Curveball proposal: redistribute all private elements of the pair
    pub fn curveball_trade<R: Rng + ?Sized>(&self, matrix: &SparseMatrix, rng: &mut R) -> Proposal<CurveballTrade> {
        let Some((axis, a, b)) = self.pair(rng) else {
            return Proposal::NoCandidate;
        };
        let (va, vb) = match axis {
            Axis::Row => (matrix.row(a), matrix.row(b)),
            Axis::Col => (matrix.col(a), matrix.col(b)),
        };

        let only_a = va.difference(vb);
        if only_a.is_empty() {
            return Proposal::SelfLoop;
        }
        let only_b = vb.difference(va);
        let shared = va.intersection(vb);

        let pool: Vec<u32> = only_a.iter().chain(&only_b).copied().collect();
        let mut to_first = vec![false; pool.len()];
        for i in rand::seq::index::sample(rng, pool.len(), only_a.len()) {
            to_first[i] = true;
        }

        let mut new_first = shared.clone();
        let mut new_second = shared;
        for (&e, &pick) in pool.iter().zip(&to_first) {
            if pick {
                new_first.push(e);
            } else {
                new_second.push(e);
            }
        }
        new_first.sort_unstable();
        new_second.sort_unstable();

        if new_first.as_slice() == va.indices() {
            return Proposal::SelfLoop;
        }
        Proposal::Move(CurveballTrade::between(matrix, axis, a, b, new_first, new_second))
    }
}

/// Two distinct rows, two distinct columns, both cross positions empty
pub fn is_swappable(matrix: &SparseMatrix, e1: Edge, e2: Edge) -> bool {
    e1.row != e2.row && e1.col != e2.col && !matrix.is_set(e1.row, e2.col) && !matrix.is_set(e2.row, e1.col)
}

/// `is_swappable` restricted to pairs sharing a row sum or a column sum
pub fn is_equal_sum_swappable(matrix: &SparseMatrix, e1: Edge, e2: Edge) -> bool {
    is_swappable(matrix, e1, e2)
        && (matrix.row_sum(e1.row) == matrix.row_sum(e2.row) || matrix.col_sum(e1.col) == matrix.col_sum(e2.col))
}

/// Draw edge pairs uniformly (with replacement) until `accept` holds or
/// `retry_budget` draws have been spent.
pub fn uniform_edge_pair<R, F>(matrix: &SparseMatrix, rng: &mut R, retry_budget: usize, accept: F) -> Proposal<EdgeSwap>
where
    R: Rng + ?Sized,
    F: Fn(&SparseMatrix, Edge, Edge) -> bool,
{
    if matrix.n_edges() < 2 {
        return Proposal::NoCandidate;
    }
    for _ in 0..retry_budget.max(1) {
        let (Some(e1), Some(e2)) = (matrix.edges().sample(rng), matrix.edges().sample(rng)) else {
            return Proposal::NoCandidate;
        };
        if accept(matrix, e1, e2) {
            return Proposal::Move(EdgeSwap::new(e1, e2));
        }
    }
    Proposal::NoCandidate
}
