//! Sorted Set
//!
//! Members are unique and each carries a floating point score. Two indexes are
//! kept in lockstep:
//!
//! ```text
//!   scores: HashMap<member, score>          O(1) score lookup
//!   order:  BTreeSet<(score, member)>       ordered traversal, ranges, ranks
//! ```
//!
//! Ordering is ascending by score, with ties broken by comparing member bytes
//! lexicographically, so range results are fully deterministic.

use crate::storage::clamp_range;
use bytes::Bytes;
use ordered_float::OrderedFloat;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedSet {
    scores: HashMap<Bytes, f64>,
    order: BTreeSet<(OrderedFloat<f64>, Bytes)>,
}

impl SortedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `member` or updates its score.
    ///
    /// Returns `true` if the member was newly added.
    pub fn set_score(&mut self, member: Bytes, score: f64) -> bool {
        match self.scores.insert(member.clone(), score) {
            Some(old) => {
                if old.to_bits() != score.to_bits() {
                    self.order.remove(&(OrderedFloat(old), member.clone()));
                    self.order.insert((OrderedFloat(score), member));
                }
                false
            }
            None => {
                self.order.insert((OrderedFloat(score), member));
                true
            }
        }
    }

    pub fn score(&self, member: &[u8]) -> Option<f64> {
        self.scores.get(member).copied()
    }

    /// Removes `member` from both indexes. Returns whether it was present.
    pub fn remove(&mut self, member: &[u8]) -> bool {
        match self.scores.remove_entry(member) {
            Some((member, score)) => {
                self.order.remove(&(OrderedFloat(score), member));
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Zero-based position of `member` in ascending order.
    pub fn rank(&self, member: &[u8]) -> Option<usize> {
        let score = self.score(member)?;
        let key = (OrderedFloat(score), Bytes::copy_from_slice(member));
        Some(self.order.range(..key).count())
    }

    /// Members between the `start` and `stop` ranks, both inclusive.
    ///
    /// Negative indexes count from the end, `-1` being the highest ranked
    /// member. Out of range bounds are clamped.
    pub fn range(&self, start: i64, stop: i64) -> Vec<(Bytes, f64)> {
        let Some((from, to)) = clamp_range(self.len(), start, stop) else {
            return Vec::new();
        };

        self.order
            .iter()
            .skip(from)
            .take(to - from + 1)
            .map(|(score, member)| (member.clone(), score.into_inner()))
            .collect()
    }

    /// All members in ascending `(score, member)` order.
    pub fn iter(&self) -> impl Iterator<Item = (&Bytes, f64)> + '_ {
        self.order
            .iter()
            .map(|(score, member)| (member, score.into_inner()))
    }
}

/// Formats a score with the fewest digits that parse back to the same value,
/// never using exponent notation: `3.5`, `1`, `0.1`, `-2.25`, `inf`.
pub fn format_score(score: f64) -> String {
    format!("{}", score)
}
