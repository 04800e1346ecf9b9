//! Edit script generation.
//!
//! Consumes both trees plus the node mapping and emits the ordered action
//! sequence. The builder keeps a working tree (a clone of the left tree) and
//! applies every action to it the moment it is emitted; all addresses are
//! computed from the working tree at emission time, which makes replay
//! addressability hold by construction.
//!
//! Emission order: one breadth-first walk of the right tree handling
//! insertions, per-pair updates, inter-parent moves and sibling alignment,
//! followed by all deletions in reverse document order. Matched nodes escape
//! a doomed subtree through their own move before the subtree is deleted.
//!
//! Because the working tree is a clone of the left arena, a left `NodeId` is
//! also its node's id in the working tree; ids stay stable across mutation.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::lcs::longest_common_subsequence;
use crate::matching::NodeMapping;
use crate::script::{Action, DiffResult};
use crate::textdiff::{diff_text, TextOp};
use crate::tree::{NodeId, NodePath, Tree};
use crate::DiffOptions;

pub(crate) fn build_script(
    left: &Tree,
    right: &Tree,
    mapping: &NodeMapping,
    options: &DiffOptions,
) -> DiffResult {
    let mut builder = ScriptBuilder::new(left, right, mapping, options);
    builder.run();
    debug!(actions = builder.out.len(), "script emission complete");
    DiffResult::from_actions(builder.out)
}

struct ScriptBuilder<'a> {
    right: &'a Tree,
    mapping: &'a NodeMapping,
    options: &'a DiffOptions,
    /// Clone of the left tree that every emitted action is applied to.
    work: Tree,
    /// Working-tree image of each right node: the matched left node, or the
    /// node created for an insertion.
    w_of_r: FxHashMap<NodeId, NodeId>,
    r_of_w: FxHashMap<NodeId, NodeId>,
    /// Chawathe's in-order marks, per side.
    in_order_w: FxHashSet<NodeId>,
    in_order_r: FxHashSet<NodeId>,
    out: Vec<Action>,
    /// Left tree document order, for the deletion phase.
    left_doc_order: Vec<NodeId>,
}

impl<'a> ScriptBuilder<'a> {
    fn new(
        left: &'a Tree,
        right: &'a Tree,
        mapping: &'a NodeMapping,
        options: &'a DiffOptions,
    ) -> Self {
        let mut w_of_r = FxHashMap::default();
        let mut r_of_w = FxHashMap::default();
        for pair in mapping.pairs() {
            w_of_r.insert(pair.right, pair.left);
            r_of_w.insert(pair.left, pair.right);
        }
        ScriptBuilder {
            right,
            mapping,
            options,
            work: left.clone(),
            w_of_r,
            r_of_w,
            in_order_w: FxHashSet::default(),
            in_order_r: FxHashSet::default(),
            out: Vec::new(),
            left_doc_order: left.document_order(),
        }
    }

    fn run(&mut self) {
        for r in self.right.breadth_first() {
            let w = if self.mapping.has_right(r) {
                let w = self.image(r);
                self.emit_updates(w, r);
                self.emit_move_if_needed(w, r);
                w
            } else {
                self.emit_insert(r)
            };
            self.align_children(w, r);
        }
        self.emit_deletes();
    }

    fn image(&self, r: NodeId) -> NodeId {
        *self
            .w_of_r
            .get(&r)
            .expect("right node processed before its image exists")
    }

    fn path(&self, w: NodeId) -> NodePath {
        NodePath::of(&self.work, w)
    }

    /// Chawathe's find-pos: the destination index for the node matching `r`,
    /// derived from the rightmost in-order left-sibling of `r`.
    fn find_pos(&self, r: NodeId) -> usize {
        let Some(rparent) = self.right.node(r).parent() else {
            return 0;
        };
        let mut anchor = None;
        for &sibling in self.right.node(rparent).children() {
            if sibling == r {
                break;
            }
            if self.in_order_r.contains(&sibling) {
                anchor = Some(sibling);
            }
        }
        match anchor {
            None => 0,
            Some(v) => {
                let u = self.image(v);
                let index = self
                    .work
                    .child_index(u)
                    .expect("in-order sibling image must be attached");
                index + 1
            }
        }
    }

    /// Emits an insertion for the unmatched right node `r` plus follow-up
    /// updates for its attributes and content; returns the created node.
    fn emit_insert(&mut self, r: NodeId) -> NodeId {
        let rparent = self
            .right
            .node(r)
            .parent()
            .expect("roots are always matched, an inserted node has a parent");
        let target = self.image(rparent);
        let position = self.find_pos(r);
        let tag = self.right.node(r).tag().to_string();
        self.out.push(Action::InsertNode {
            target: self.path(target),
            tag: tag.clone(),
            position,
        });
        let w = self.work.insert_child(target, position, tag);
        self.w_of_r.insert(r, w);
        self.r_of_w.insert(w, r);
        self.in_order_r.insert(r);
        self.in_order_w.insert(w);
        self.emit_updates(w, r);
        w
    }

    /// Emits whatever updates are needed to make the working node `w` carry
    /// the same tag, attributes, text and tail as the right node `r`.
    fn emit_updates(&mut self, w: NodeId, r: NodeId) {
        let rnode = self.right.node(r);

        if self.work.node(w).tag() != rnode.tag() {
            let tag = rnode.tag().to_string();
            self.out.push(Action::UpdateTag {
                node: self.path(w),
                tag: tag.clone(),
            });
            self.work.set_tag(w, tag);
        }

        // Attribute sets, in the right node's attribute order.
        for (name, value) in rnode.attrs() {
            if self.work.node(w).attr(name) != Some(value.as_str()) {
                self.out.push(Action::UpdateAttrib {
                    node: self.path(w),
                    name: name.clone(),
                    value: value.clone(),
                });
                self.work.set_attr(w, name.clone(), value.clone());
            }
        }
        // Attribute removals, in the working node's attribute order.
        let stale: Vec<String> = self
            .work
            .node(w)
            .attrs()
            .iter()
            .map(|(k, _)| k.clone())
            .filter(|k| rnode.attr(k).is_none())
            .collect();
        for name in stale {
            self.out.push(Action::DeleteAttrib {
                node: self.path(w),
                name: name.clone(),
            });
            self.work.remove_attr(w, &name);
        }

        let new_text = rnode.text().map(str::to_string);
        if self.work.node(w).text() != new_text.as_deref() {
            let runs = self.text_runs(self.work.node(w).text(), new_text.as_deref());
            self.out.push(Action::UpdateText {
                node: self.path(w),
                text: new_text.clone(),
                runs,
            });
            self.work.set_text(w, new_text);
        }

        let new_tail = rnode.tail().map(str::to_string);
        if self.work.node(w).tail() != new_tail.as_deref() {
            let runs = self.text_runs(self.work.node(w).tail(), new_tail.as_deref());
            self.out.push(Action::UpdateTail {
                node: self.path(w),
                text: new_tail.clone(),
                runs,
            });
            self.work.set_tail(w, new_tail);
        }
    }

    fn text_runs(&self, old: Option<&str>, new: Option<&str>) -> Option<Vec<TextOp>> {
        if !self.options.fine_grained_text {
            return None;
        }
        Some(diff_text(old.unwrap_or(""), new.unwrap_or("")))
    }

    /// A matched node whose parent mapping changed is always a move.
    fn emit_move_if_needed(&mut self, w: NodeId, r: NodeId) {
        let Some(rparent) = self.right.node(r).parent() else {
            return;
        };
        let target = self.image(rparent);
        let current = self
            .work
            .node(w)
            .parent()
            .expect("only the root has no parent and the root never moves");
        if current != target {
            // Addresses resolve against the pre-move state; the destination
            // index is counted after the node is detached.
            let node = self.path(w);
            let target_path = self.path(target);
            self.work.remove_subtree(w);
            let position = self.find_pos(r);
            self.out.push(Action::MoveNode {
                node,
                target: target_path,
                position,
            });
            self.work.move_node(w, target, position);
            self.in_order_w.insert(w);
            self.in_order_r.insert(r);
        }
    }

    /// Reorders the mutually matched children of a pair with the minimal
    /// number of moves: children on the longest common subsequence of the
    /// two sibling orders stay put, every other matched child moves once.
    fn align_children(&mut self, w: NodeId, r: NodeId) {
        let wkids: Vec<NodeId> = self
            .work
            .node(w)
            .children()
            .iter()
            .copied()
            .filter(|c| {
                self.r_of_w
                    .get(c)
                    .is_some_and(|rc| self.right.node(*rc).parent() == Some(r))
            })
            .collect();
        let rkids: Vec<NodeId> = self
            .right
            .node(r)
            .children()
            .iter()
            .copied()
            .filter(|c| {
                self.w_of_r
                    .get(c)
                    .is_some_and(|wc| self.work.node(*wc).parent() == Some(w))
            })
            .collect();
        if wkids.is_empty() || rkids.is_empty() {
            return;
        }

        let lcs = longest_common_subsequence(&wkids, &rkids, |a, b| self.r_of_w.get(a) == Some(b));
        for &(x, y) in &lcs {
            self.in_order_w.insert(wkids[x]);
            self.in_order_r.insert(rkids[y]);
        }

        // Reposition the rest in target order; each lands directly after its
        // rightmost already-ordered left sibling.
        for &rc in &rkids {
            if self.in_order_r.contains(&rc) {
                continue;
            }
            let wc = self.w_of_r[&rc];
            let node = self.path(wc);
            let target_path = self.path(w);
            self.work.remove_subtree(wc);
            let position = self.find_pos(rc);
            self.out.push(Action::MoveNode {
                node,
                target: target_path,
                position,
            });
            self.work.move_node(wc, w, position);
            self.in_order_w.insert(wc);
            self.in_order_r.insert(rc);
        }
    }

    /// Deletes every topmost unmatched left subtree, deepest and rightmost
    /// first so sibling indices stay valid within the pass.
    fn emit_deletes(&mut self) {
        let doomed: Vec<NodeId> = self
            .left_doc_order
            .iter()
            .rev()
            .copied()
            .filter(|&l| {
                if self.mapping.has_left(l) {
                    return false;
                }
                // Subsumed by an ancestor's own deletion?
                match self.work.node(l).parent() {
                    Some(p) => self.mapping.has_left(p),
                    None => false,
                }
            })
            .collect();
        for l in doomed {
            self.out.push(Action::DeleteNode { node: self.path(l) });
            self.work.remove_subtree(l);
        }
    }
}
