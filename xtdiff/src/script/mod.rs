//! Edit script types.
//!
//! An edit script is an ordered sequence of [`Action`]s; the order is
//! semantically load-bearing. Every action addresses nodes through a
//! [`NodePath`] that resolves against the tree state at the point the action
//! is applied, so a script replayed strictly in order never references an
//! already-deleted or not-yet-inserted node.

mod apply;
mod builder;

pub use apply::apply;
pub(crate) use builder::build_script;

use crate::textdiff::TextOp;
use crate::tree::NodePath;

/// A single primitive edit operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Insert a new, bare element under `target` at `position`. Attributes
    /// and content follow as separate update actions.
    InsertNode {
        /// Parent of the new node.
        target: NodePath,
        /// Element tag of the new node.
        tag: String,
        /// Child index within the parent.
        position: usize,
    },
    /// Delete `node` and its whole subtree.
    DeleteNode {
        /// The node to remove.
        node: NodePath,
    },
    /// Detach `node` and reinsert it under `target` at `position`.
    MoveNode {
        /// The node to relocate, addressed at its current position.
        node: NodePath,
        /// The new parent, addressed before the node is detached.
        target: NodePath,
        /// Child index within the new parent, counted after the node is
        /// detached.
        position: usize,
    },
    /// Replace the element tag of `node`.
    UpdateTag {
        /// The node to rename.
        node: NodePath,
        /// The new tag.
        tag: String,
    },
    /// Set an attribute, creating it if absent.
    UpdateAttrib {
        /// The owning node.
        node: NodePath,
        /// Attribute key.
        name: String,
        /// New attribute value.
        value: String,
    },
    /// Remove an attribute.
    DeleteAttrib {
        /// The owning node.
        node: NodePath,
        /// Attribute key.
        name: String,
    },
    /// Replace the text before the first child.
    UpdateText {
        /// The owning node.
        node: NodePath,
        /// The new text, `None` to clear.
        text: Option<String>,
        /// Character-level runs, present when fine-grained text updates were
        /// requested. Consumers that cannot express partial patches use
        /// `text` instead.
        runs: Option<Vec<TextOp>>,
    },
    /// Replace the text after the node's closing point.
    UpdateTail {
        /// The owning node.
        node: NodePath,
        /// The new tail, `None` to clear.
        text: Option<String>,
        /// Character-level runs, as for [`Action::UpdateText`].
        runs: Option<Vec<TextOp>>,
    },
}

/// An ordered edit script transforming one tree into another.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffResult {
    actions: Vec<Action>,
}

impl DiffResult {
    pub(crate) fn from_actions(actions: Vec<Action>) -> Self {
        DiffResult { actions }
    }

    /// Returns the actions in application order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Returns the number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns true when the trees were found identical.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Iterates over the actions in application order.
    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }
}

impl<'a> IntoIterator for &'a DiffResult {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}
