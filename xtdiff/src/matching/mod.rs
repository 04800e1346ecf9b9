//! Tree matching.
//!
//! This module builds a correspondence between the nodes of two trees. The
//! correspondence is injective in both directions; nodes left unmatched on
//! the left side are implicit deletions, and on the right side implicit
//! insertions. The script builder consumes the mapping together with both
//! trees.

mod matcher;

pub use matcher::Matcher;

use rustc_hash::FxHashMap;

use crate::tree::NodeId;

/// A single matched node pair with its similarity score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPair {
    /// Node in the left tree.
    pub left: NodeId,
    /// Node in the right tree.
    pub right: NodeId,
    /// Similarity score in `[0, 1]` at the time the pair was accepted.
    pub score: f64,
}

/// An injective correspondence between two trees.
///
/// Each left node maps to at most one right node and vice versa.
#[derive(Debug, Clone, Default)]
pub struct NodeMapping {
    pairs: Vec<MatchPair>,
    l2r: FxHashMap<NodeId, NodeId>,
    r2l: FxHashMap<NodeId, NodeId>,
}

impl NodeMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a matched pair.
    ///
    /// # Panics
    /// Panics if either node is already mapped; the matcher never offers a
    /// consumed node twice.
    pub fn add(&mut self, left: NodeId, right: NodeId, score: f64) {
        let prev_l = self.l2r.insert(left, right);
        let prev_r = self.r2l.insert(right, left);
        assert!(
            prev_l.is_none() && prev_r.is_none(),
            "node matched twice: {:?} <-> {:?}",
            left,
            right
        );
        self.pairs.push(MatchPair { left, right, score });
    }

    /// Returns the right-side partner of a left node.
    pub fn partner_of_left(&self, left: NodeId) -> Option<NodeId> {
        self.l2r.get(&left).copied()
    }

    /// Returns the left-side partner of a right node.
    pub fn partner_of_right(&self, right: NodeId) -> Option<NodeId> {
        self.r2l.get(&right).copied()
    }

    /// Returns true if the left node is mapped.
    pub fn has_left(&self, left: NodeId) -> bool {
        self.l2r.contains_key(&left)
    }

    /// Returns true if the right node is mapped.
    pub fn has_right(&self, right: NodeId) -> bool {
        self.r2l.contains_key(&right)
    }

    /// Returns the matched pairs in the order they were accepted.
    pub fn pairs(&self) -> &[MatchPair] {
        &self.pairs
    }

    /// Returns the number of matched pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if nothing is matched.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
