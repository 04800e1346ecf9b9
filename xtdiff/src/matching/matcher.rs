//! The four-pass node matcher.
//!
//! Builds a best-effort correspondence between two trees:
//!
//! 1. Exact-subtree pass: pair up subtrees with equal fingerprints, largest
//!    first, after confirming deep equality; every descendant pair is
//!    matched along with the roots of the pair.
//! 2. Leaf-similarity pass: greedily pair remaining childless nodes that
//!    share a tag, by descending signature similarity above a threshold.
//! 3. Bottom-up propagation: pair remaining internal nodes by the fraction
//!    of their descendants already matched to each other, deepest first, so
//!    structural agreement propagates toward the roots.
//! 4. Whatever stays unmatched is an implicit deletion (left) or insertion
//!    (right); additionally, the two roots are matched to each other if
//!    nothing else claimed them, keeping the edit script total.
//!
//! Ambiguities are always broken the same way: prefer pairs whose parents
//! are already matched, then pairs that keep their sibling index, then
//! document order. Candidate enumeration only ever walks vectors built in
//! document order, so the outcome is deterministic.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::matching::NodeMapping;
use crate::textdiff::similarity;
use crate::tree::fingerprint::{fingerprint_tree, Fingerprint};
use crate::tree::{NodeId, Tree};
use crate::DiffOptions;

/// Precomputed per-tree lookup tables.
struct TreeIndex {
    /// Pre-order (document order) node list.
    doc_order: Vec<NodeId>,
    /// Document-order position by raw node index.
    order_of: Vec<usize>,
    depth: Vec<usize>,
    /// Subtree size including the node itself.
    size: Vec<usize>,
    /// Highest document-order position inside the subtree.
    last: Vec<usize>,
}

impl TreeIndex {
    fn build(tree: &Tree) -> Self {
        let doc_order = tree.document_order();
        let max = doc_order.iter().map(|id| id.index()).max().unwrap_or(0);
        let mut order_of = vec![usize::MAX; max + 1];
        for (i, &id) in doc_order.iter().enumerate() {
            order_of[id.index()] = i;
        }
        let mut depth = vec![0usize; max + 1];
        for &id in &doc_order {
            if let Some(p) = tree.node(id).parent() {
                depth[id.index()] = depth[p.index()] + 1;
            }
        }
        let mut size = vec![1usize; max + 1];
        let mut last = vec![0usize; max + 1];
        for &id in &tree.post_order() {
            let mut s = 1;
            let mut lst = order_of[id.index()];
            for &c in tree.node(id).children() {
                s += size[c.index()];
                lst = lst.max(last[c.index()]);
            }
            size[id.index()] = s;
            last[id.index()] = lst;
        }
        TreeIndex {
            doc_order,
            order_of,
            depth,
            size,
            last,
        }
    }

    fn order(&self, id: NodeId) -> usize {
        self.order_of[id.index()]
    }

    /// True if `node` is a proper descendant of `anc`.
    fn is_descendant(&self, anc: NodeId, node: NodeId) -> bool {
        let o = self.order(node);
        o > self.order(anc) && o <= self.last[anc.index()]
    }

    /// The descendants of `id` in document order.
    fn descendants(&self, id: NodeId) -> &[NodeId] {
        let o = self.order(id);
        &self.doc_order[o + 1..self.last[id.index()] + 1]
    }
}

/// Builds a [`NodeMapping`] between two trees.
pub struct Matcher<'a> {
    left: &'a Tree,
    right: &'a Tree,
    options: &'a DiffOptions,
    lindex: TreeIndex,
    rindex: TreeIndex,
    lfp: Vec<Fingerprint>,
    rfp: Vec<Fingerprint>,
    mapping: NodeMapping,
}

impl<'a> Matcher<'a> {
    /// Creates a matcher over two trees; the thresholds come from `options`.
    pub fn new(left: &'a Tree, right: &'a Tree, options: &'a DiffOptions) -> Self {
        Matcher {
            left,
            right,
            options,
            lindex: TreeIndex::build(left),
            rindex: TreeIndex::build(right),
            lfp: fingerprint_tree(left),
            rfp: fingerprint_tree(right),
            mapping: NodeMapping::new(),
        }
    }

    /// Runs all passes and returns the finished mapping.
    pub fn run(mut self) -> NodeMapping {
        self.match_exact_subtrees();
        self.match_leaves();
        self.match_internal();
        self.match_roots();
        debug!(pairs = self.mapping.len(), "matching complete");
        self.mapping
    }

    /// A root may only ever match the other root.
    fn root_compatible(&self, l: NodeId, r: NodeId) -> bool {
        (l == self.left.root()) == (r == self.right.root())
    }

    /// Deterministic candidate ranking; smaller sorts first.
    fn candidate_rank(&self, l: NodeId, r: NodeId) -> (bool, bool, usize) {
        let parents_matched = match (self.left.node(l).parent(), self.right.node(r).parent()) {
            (Some(lp), Some(rp)) => self.mapping.partner_of_left(lp) == Some(rp),
            _ => false,
        };
        let same_index = self.left.child_index(l) == self.right.child_index(r);
        (!parents_matched, !same_index, self.rindex.order(r))
    }

    /// Pass 1: equal-fingerprint subtrees, largest first, deep equality
    /// confirmed before acceptance.
    fn match_exact_subtrees(&mut self) {
        let mut buckets: FxHashMap<Fingerprint, Vec<NodeId>> = FxHashMap::default();
        for &r in &self.rindex.doc_order {
            buckets.entry(self.rfp[r.index()]).or_default().push(r);
        }

        let mut lorder = self.lindex.doc_order.clone();
        lorder.sort_by(|a, b| {
            self.lindex.size[b.index()]
                .cmp(&self.lindex.size[a.index()])
                .then(self.lindex.order(*a).cmp(&self.lindex.order(*b)))
        });

        for l in lorder {
            if self.mapping.has_left(l) {
                continue;
            }
            let Some(candidates) = buckets.get(&self.lfp[l.index()]) else {
                continue;
            };
            let mut viable: Vec<NodeId> = candidates
                .iter()
                .copied()
                .filter(|&r| !self.mapping.has_right(r) && self.root_compatible(l, r))
                .collect();
            viable.sort_by_key(|&r| self.candidate_rank(l, r));
            for r in viable {
                // Hash equality is a candidate signal only.
                if self.left.subtree_equal(l, self.right, r) {
                    self.match_subtree(l, r);
                    break;
                }
            }
        }
        debug!(pairs = self.mapping.len(), "exact-subtree pass done");
    }

    /// Matches `l` and `r` along with every corresponding descendant pair.
    fn match_subtree(&mut self, l: NodeId, r: NodeId) {
        self.mapping.add(l, r, 1.0);
        let lc = self.left.node(l).children().to_vec();
        let rc = self.right.node(r).children().to_vec();
        for (cl, cr) in lc.into_iter().zip(rc) {
            self.match_subtree(cl, cr);
        }
    }

    /// Pass 2: remaining leaves sharing a tag, by descending signature
    /// similarity. Quadratic in the unmatched-leaf count, by design.
    fn match_leaves(&mut self) {
        let lleaves: Vec<NodeId> = self
            .lindex
            .doc_order
            .iter()
            .copied()
            .filter(|&id| !self.mapping.has_left(id) && self.left.node(id).children().is_empty())
            .collect();
        let rleaves: Vec<NodeId> = self
            .rindex
            .doc_order
            .iter()
            .copied()
            .filter(|&id| !self.mapping.has_right(id) && self.right.node(id).children().is_empty())
            .collect();
        let lsig: Vec<String> = lleaves.iter().map(|&id| signature(self.left, id)).collect();
        let rsig: Vec<String> = rleaves.iter().map(|&id| signature(self.right, id)).collect();

        let mut candidates: Vec<(f64, (bool, bool, usize), usize, usize)> = Vec::new();
        for (i, &l) in lleaves.iter().enumerate() {
            for (j, &r) in rleaves.iter().enumerate() {
                if self.left.node(l).tag() != self.right.node(r).tag()
                    || !self.root_compatible(l, r)
                {
                    continue;
                }
                let score = similarity(&lsig[i], &rsig[j]);
                if score >= self.options.leaf_threshold {
                    candidates.push((score, self.candidate_rank(l, r), i, j));
                }
            }
        }
        candidates.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
                .then_with(|| a.3.cmp(&b.3))
        });
        for (score, _, i, j) in candidates {
            let (l, r) = (lleaves[i], rleaves[j]);
            if !self.mapping.has_left(l) && !self.mapping.has_right(r) {
                self.mapping.add(l, r, score);
            }
        }
        debug!(pairs = self.mapping.len(), "leaf-similarity pass done");
    }

    /// Pass 3: remaining internal nodes, deepest first, scored by the
    /// fraction of descendants already matched into the candidate.
    fn match_internal(&mut self) {
        let mut internal: Vec<NodeId> = self
            .lindex
            .doc_order
            .iter()
            .copied()
            .filter(|&id| !self.mapping.has_left(id) && !self.left.node(id).children().is_empty())
            .collect();
        internal.sort_by(|a, b| {
            self.lindex.depth[b.index()]
                .cmp(&self.lindex.depth[a.index()])
                .then(self.lindex.order(*a).cmp(&self.lindex.order(*b)))
        });

        for l in internal {
            let ndl = self.lindex.size[l.index()] - 1;
            // cross-tag flag, score, rank, candidate
            let mut candidates: Vec<(bool, f64, (bool, bool, usize), NodeId)> = Vec::new();
            for &r in &self.rindex.doc_order {
                if self.mapping.has_right(r) || !self.root_compatible(l, r) {
                    continue;
                }
                let ndr = self.rindex.size[r.index()] - 1;
                if ndl == 0 || ndr == 0 {
                    continue;
                }
                let mut overlap = 0usize;
                for &dl in self.lindex.descendants(l) {
                    if let Some(p) = self.mapping.partner_of_left(dl) {
                        if self.rindex.is_descendant(r, p) {
                            overlap += 1;
                        }
                    }
                }
                let score = overlap as f64 / ndl.max(ndr) as f64;
                if score >= self.options.node_threshold {
                    let cross = self.left.node(l).tag() != self.right.node(r).tag();
                    candidates.push((cross, score, self.candidate_rank(l, r), r));
                }
            }
            // Same-tag candidates win over cross-tag ones regardless of score.
            candidates.sort_by(|a, b| {
                a.0.cmp(&b.0)
                    .then_with(|| b.1.total_cmp(&a.1))
                    .then_with(|| a.2.cmp(&b.2))
            });
            if let Some(&(_, score, _, r)) = candidates.first() {
                self.mapping.add(l, r, score);
            }
        }
        debug!(pairs = self.mapping.len(), "bottom-up pass done");
    }

    /// The roots are matched to each other when nothing else claimed them.
    fn match_roots(&mut self) {
        if !self.mapping.has_left(self.left.root()) {
            self.mapping.add(self.left.root(), self.right.root(), 0.0);
        }
    }
}

/// Flat text a leaf is compared by: tag, sorted `key:value` attribute pairs,
/// text and tail, space-joined.
fn signature(tree: &Tree, id: NodeId) -> String {
    let node = tree.node(id);
    let mut parts: Vec<String> = vec![node.tag().to_string()];
    let mut attrs: Vec<_> = node.attrs().iter().collect();
    attrs.sort();
    for (k, v) in attrs {
        parts.push(format!("{}:{}", k, v));
    }
    for content in [node.text(), node.tail()] {
        if let Some(content) = content {
            let trimmed = content.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{parse_str, Normalize};

    fn matched(left: &str, right: &str) -> (Tree, Tree, NodeMapping) {
        let l = parse_str(left, Normalize::TAGS).unwrap();
        let r = parse_str(right, Normalize::TAGS).unwrap();
        let options = DiffOptions::default();
        let mapping = Matcher::new(&l, &r, &options).run();
        (l, r, mapping)
    }

    #[test]
    fn test_identical_trees_fully_matched() {
        let (l, _r, mapping) = matched(
            "<doc><story><section><para>First</para></section></story></doc>",
            "<doc><story><section><para>First</para></section></story></doc>",
        );
        assert_eq!(mapping.len(), l.node_count());
        for id in l.document_order() {
            assert!(mapping.has_left(id));
        }
    }

    #[test]
    fn test_leaf_text_change_keeps_match() {
        let (l, r, mapping) = matched("<a><b>x</b></a>", "<a><b>y</b></a>");
        let lb = l.document_order()[1];
        let rb = r.document_order()[1];
        assert_eq!(mapping.partner_of_left(lb), Some(rb));
        assert_eq!(mapping.partner_of_left(l.root()), Some(r.root()));
    }

    #[test]
    fn test_cross_tag_leaves_do_not_match() {
        let (l, r, mapping) = matched("<a><b/></a>", "<a><c/></a>");
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.partner_of_left(l.root()), Some(r.root()));
    }

    #[test]
    fn test_exact_pass_prefers_same_sibling_index() {
        let (l, r, mapping) = matched("<a><b/><b/></a>", "<a><b/><b/><b/></a>");
        let lo = l.document_order();
        let ro = r.document_order();
        assert_eq!(mapping.partner_of_left(lo[1]), Some(ro[1]));
        assert_eq!(mapping.partner_of_left(lo[2]), Some(ro[2]));
        assert!(!mapping.has_right(ro[3]));
    }

    #[test]
    fn test_bottom_up_propagation_matches_renamed_container() {
        let (l, r, mapping) = matched(
            "<r><div><p>one two three</p><p>four five six</p></div></r>",
            "<r><section><p>one two three</p><p>four five six</p></section></r>",
        );
        let ldiv = l.document_order()[1];
        let rsection = r.document_order()[1];
        assert_eq!(mapping.partner_of_left(ldiv), Some(rsection));
        assert_eq!(mapping.len(), l.node_count());
    }

    #[test]
    fn test_reordered_children_all_match() {
        let (l, r, mapping) = matched("<a><b/><c/></a>", "<a><c/><b/></a>");
        assert_eq!(mapping.len(), 3);
        let lo = l.document_order();
        let ro = r.document_order();
        // b <-> b, c <-> c regardless of position
        assert_eq!(mapping.partner_of_left(lo[1]), Some(ro[2]));
        assert_eq!(mapping.partner_of_left(lo[2]), Some(ro[1]));
    }

    #[test]
    fn test_entirely_different_trees_only_roots_forced() {
        let (l, r, mapping) = matched(
            "<a><b>one</b></a>",
            "<x><y>completely different</y></x>",
        );
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.partner_of_left(l.root()), Some(r.root()));
    }

    #[test]
    fn test_moved_subtree_matches_across_parents() {
        let (l, r, mapping) = matched(
            "<r><x><b>long enough text</b></x></r>",
            "<r><b>long enough text</b></r>",
        );
        let lo = l.document_order();
        let ro = r.document_order();
        let lb = lo[2];
        let rb = ro[1];
        assert_eq!(mapping.partner_of_left(lb), Some(rb));
        // The old wrapper stays unmatched.
        assert!(!mapping.has_left(lo[1]));
    }

    #[test]
    fn test_determinism() {
        let left = "<a><b>one</b><b>two</b><c x='1'/><c x='2'/></a>";
        let right = "<a><c x='2'/><b>two</b><b>one</b><c x='1'/></a>";
        let (_, _, first) = matched(left, right);
        let (_, _, second) = matched(left, right);
        assert_eq!(first.pairs(), second.pairs());
    }
}
