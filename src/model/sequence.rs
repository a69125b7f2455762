//! # Sequence Chain State
//!
//! ## Role
//! The multigraph of a sequence dataset together with its ordered-row
//! multiset index and the running log equivalence count, mutated as one.
//!
//! ## Pair Selection
//! - **Uniform (ALICE-S):** a random row (or column) with a same-sum
//!   partner, then a uniform distinct partner.
//! - **Weighted (ALICE-C):** a sum group drawn with weight `n(n+1)/2`,
//!   then two rows with replacement, or two distinct columns.
//!
//! Either way the pair exchanges one element from each side of its
//! distinct-value difference; an empty side is a self-loop.

use rand::Rng;
use std::collections::BTreeMap;

use crate::data::edge::Edge;
use crate::data::storage::multigraph::distinct_difference;
use crate::data::storage::{MultiGraph, MultisetIndex};
use crate::error::{Result, SwapError};
use crate::model::bjdm::LOG_TOLERANCE;
use crate::model::equivalence::{log_num_equiv_adj_matrices, log_num_equiv_matrices};
use crate::model::proposal::{Axis, EdgeSwap, Proposal, SumGroups};

/// Sum groups drawn with probability proportional to `n(n+1)/2`
#[derive(Clone, Debug, Default)]
pub struct WeightedSums {
    groups: Vec<Vec<u32>>,
    /// Cumulative normalized weights; the last entry is 1 up to rounding
    cumulative: Vec<f64>,
}

impl WeightedSums {
    pub fn from_sums(sums: &[u32]) -> Self {
        let mut by_sum: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        for (i, &s) in sums.iter().enumerate() {
            by_sum.entry(s).or_default().push(i as u32);
        }
        let groups: Vec<Vec<u32>> = by_sum.into_values().collect();

        let weights: Vec<f64> = groups.iter().map(|g| (g.len() * (g.len() + 1)) as f64 / 2.0).collect();
        let total: f64 = weights.iter().sum();
        let mut acc = 0.0;
        let cumulative = weights
            .iter()
            .map(|w| {
                acc += w / total;
                acc
            })
            .collect();

        Self { groups, cumulative }
    }

    /// Members of a group drawn by weight
    pub fn sample_group<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&[u32]> {
        if self.groups.is_empty() {
            return None;
        }
        let p: f64 = rng.random();
        let g = self.cumulative.partition_point(|&c| c < p).min(self.groups.len() - 1);
        Some(&self.groups[g])
    }

    /// Two members of one weighted group: with replacement when `distinct`
    /// is false, otherwise two different members (none if the group is a
    /// singleton).
    pub fn sample_pair<R: Rng + ?Sized>(&self, rng: &mut R, distinct: bool) -> Option<(u32, u32)> {
        let members = self.sample_group(rng)?;
        let i = rng.random_range(0..members.len());
        if !distinct {
            return Some((members[i], members[rng.random_range(0..members.len())]));
        }
        if members.len() < 2 {
            return None;
        }
        let mut j = rng.random_range(0..members.len() - 1);
        if j >= i {
            j += 1;
        }
        Some((members[i], members[j]))
    }
}

/// Pair selection over both axes of a multigraph
#[derive(Clone, Debug)]
pub struct SequenceSelector {
    row_groups: SumGroups,
    col_groups: SumGroups,
    row_weighted: WeightedSums,
    col_weighted: WeightedSums,
}

impl SequenceSelector {
    pub fn new(graph: &MultiGraph) -> Self {
        Self {
            row_groups: SumGroups::from_sums(graph.row_sums()),
            col_groups: SumGroups::from_sums(graph.col_sums()),
            row_weighted: WeightedSums::from_sums(graph.row_sums()),
            col_weighted: WeightedSums::from_sums(graph.col_sums()),
        }
    }

    /// ALICE-S proposal
    pub fn uniform_exchange<R: Rng + ?Sized>(&self, graph: &MultiGraph, rng: &mut R) -> Proposal<EdgeSwap> {
        let axis = Axis::random(rng);
        let groups = match axis {
            Axis::Row => &self.row_groups,
            Axis::Col => &self.col_groups,
        };
        match groups.sample_pair(rng) {
            Some((a, b)) => exchange_between(graph, axis, a, b, rng),
            None => Proposal::NoCandidate,
        }
    }

    /// ALICE-C proposal
    pub fn weighted_exchange<R: Rng + ?Sized>(&self, graph: &MultiGraph, rng: &mut R) -> Proposal<EdgeSwap> {
        let axis = Axis::random(rng);
        let pair = match axis {
            Axis::Row => self.row_weighted.sample_pair(rng, false),
            Axis::Col => self.col_weighted.sample_pair(rng, true),
        };
        match pair {
            Some((a, b)) => exchange_between(graph, axis, a, b, rng),
            None => Proposal::NoCandidate,
        }
    }
}

/// One uniform element from each side of the distinct-value difference of
/// `a` and `b`
fn exchange_between<R: Rng + ?Sized>(graph: &MultiGraph, axis: Axis, a: u32, b: u32, rng: &mut R) -> Proposal<EdgeSwap> {
    let (va, vb) = match axis {
        Axis::Row => (graph.row(a), graph.row(b)),
        Axis::Col => (graph.col(a), graph.col(b)),
    };
    let only_a = distinct_difference(va, vb);
    let only_b = distinct_difference(vb, va);
    if only_a.is_empty() || only_b.is_empty() {
        return Proposal::SelfLoop;
    }
    let x = only_a[rng.random_range(0..only_a.len())];
    let y = only_b[rng.random_range(0..only_b.len())];

    Proposal::Move(match axis {
        Axis::Row => EdgeSwap::new(Edge::new(a, x), Edge::new(b, y)),
        Axis::Col => EdgeSwap::new(Edge::new(x, a), Edge::new(y, b)),
    })
}

#[derive(Clone, Debug)]
pub struct SequenceState {
    graph: MultiGraph,
    index: MultisetIndex,
    selector: SequenceSelector,
    row_sums: Vec<u32>,
    col_sums: Vec<u32>,
    log_current: f64,
}

impl SequenceState {
    /// Take ownership of a private copy of the start graph
    pub fn new(graph: MultiGraph) -> Self {
        let index = MultisetIndex::from_rows(&graph);
        let log_current = log_num_equiv_matrices(&graph, &index);
        Self {
            selector: SequenceSelector::new(&graph),
            row_sums: graph.row_sums().to_vec(),
            col_sums: graph.col_sums().to_vec(),
            graph,
            index,
            log_current,
        }
    }

    #[inline]
    pub fn graph(&self) -> &MultiGraph {
        &self.graph
    }

    #[inline]
    pub fn index(&self) -> &MultisetIndex {
        &self.index
    }

    #[inline]
    pub fn selector(&self) -> &SequenceSelector {
        &self.selector
    }

    #[inline]
    pub fn log_current(&self) -> f64 {
        self.log_current
    }

    pub fn recomputed_log(&self) -> f64 {
        log_num_equiv_matrices(&self.graph, &self.index)
    }

    /// Log equivalence count of the graph `swap` leads to
    pub fn evaluate_exchange(&self, swap: &EdgeSwap) -> f64 {
        let (new1, new2) = self.graph.exchanged_rows(swap);
        log_num_equiv_adj_matrices(
            self.log_current,
            &self.index,
            self.graph.row(swap.first.row),
            self.graph.row(swap.second.row),
            &new1,
            &new2,
        )
    }

    /// Apply an exchange whose adjacent log count was already evaluated
    pub fn apply_exchange(&mut self, swap: &EdgeSwap, log_adjacent: f64) -> Result<()> {
        self.graph.ensure_exchangeable(swap)?;
        let rows = [swap.first.row, swap.second.row];
        for &r in &rows {
            self.index.decrement(self.graph.row(r))?;
        }
        self.graph.exchange(swap)?;
        for &r in &rows {
            self.index.increment(self.graph.row(r));
        }
        self.log_current = log_adjacent;
        Ok(())
    }

    /// Full consistency check: margins, both views, index, running log count
    pub fn verify(&self) -> Result<()> {
        self.graph.verify_invariants(&self.row_sums, &self.col_sums)?;

        if MultisetIndex::from_rows(&self.graph) != self.index {
            return Err(SwapError::invariant("multiset index out of sync with sequence rows"));
        }

        let recomputed = self.recomputed_log();
        if (recomputed - self.log_current).abs() > LOG_TOLERANCE * recomputed.abs().max(1.0) {
            return Err(SwapError::invariant(format!(
                "running log equivalence count {} differs from recomputed {}",
                self.log_current, recomputed
            )));
        }
        Ok(())
    }

    pub fn into_graph(self) -> MultiGraph {
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EqCounts;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn graph() -> MultiGraph {
        MultiGraph::from_sequences(4, vec![vec![0, 1], vec![1, 0], vec![0, 1], vec![2, 3, 2], vec![3, 2, 1]]).unwrap()
    }

    #[test]
    fn test_weighted_sums() {
        // sums 2: 3 members (weight 6), 3: 2 members (weight 3)
        let weighted = WeightedSums::from_sums(&[2, 2, 2, 3, 3]);
        assert_eq!(weighted.cumulative.len(), 2);
        assert!((weighted.cumulative[0] - 6.0 / 9.0).abs() < 1e-12);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
        for _ in 0..100 {
            let (a, b) = weighted.sample_pair(&mut rng, true).unwrap();
            assert_ne!(a, b);
            assert_eq!(a < 3, b < 3);
        }
        assert_eq!(WeightedSums::from_sums(&[1]).sample_pair(&mut rng, true), None);
        assert_eq!(WeightedSums::from_sums(&[1]).sample_pair(&mut rng, false), Some((0, 0)));
    }

    #[test]
    fn test_proposals_are_exchangeable() {
        let g = graph();
        let selector = SequenceSelector::new(&g);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(8);
        let mut moves = 0;
        for _ in 0..400 {
            for proposal in [selector.uniform_exchange(&g, &mut rng), selector.weighted_exchange(&g, &mut rng)] {
                if let Proposal::Move(swap) = proposal {
                    g.ensure_exchangeable(&swap).unwrap();
                    moves += 1;
                }
            }
        }
        assert!(moves > 0);
    }

    #[test]
    fn test_same_values_is_self_loop() {
        // rows hold the same values in different orders and multiplicities
        let g = MultiGraph::from_sequences(2, vec![vec![0, 0, 1], vec![1, 0, 1]]).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
        assert_eq!(exchange_between(&g, Axis::Row, 0, 1, &mut rng), Proposal::SelfLoop);
        assert_eq!(exchange_between(&g, Axis::Row, 0, 0, &mut rng), Proposal::SelfLoop);
    }

    #[test]
    fn test_apply_exchange_keeps_index() {
        let mut s = SequenceState::new(graph());
        // row 0 [0,1] gives its 0 for the first 2 of row 3 [2,3,2]
        let swap = EdgeSwap::new(Edge::new(0, 0), Edge::new(3, 2));
        let adj = s.evaluate_exchange(&swap);
        s.apply_exchange(&swap, adj).unwrap();

        assert_eq!(s.graph().row(0), &[2, 1]);
        assert_eq!(s.graph().row(3), &[0, 3, 2]);
        assert_eq!(s.index().count(&[0, 1]), 1);
        assert_eq!(s.index().count(&[2, 1]), 1);
        s.verify().unwrap();
    }

    #[test]
    fn test_invalid_exchange_leaves_state() {
        let mut s = SequenceState::new(graph());
        let log = s.log_current();
        // row 0 already holds column 1
        let swap = EdgeSwap::new(Edge::new(0, 0), Edge::new(1, 1));
        assert!(s.apply_exchange(&swap, 0.0).is_err());
        assert_eq!(s.log_current(), log);
        s.verify().unwrap();
    }

    #[test]
    fn test_verify_catches_stale_log() {
        let mut s = SequenceState::new(graph());
        s.log_current -= 0.5;
        assert!(s.verify().unwrap_err().is_invariant_violation());
    }
}
