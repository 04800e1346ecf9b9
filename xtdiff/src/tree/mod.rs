//! Arena tree model for parsed documents.
//!
//! A [`Tree`] owns a flat arena of [`Node`] records addressed by [`NodeId`].
//! Children are stored as index lists and the parent as a back index, so the
//! natural parent/child reference cycle never turns into an ownership cycle
//! and two trees are always independently freeable.
//!
//! Trees are read-only inputs for the duration of a diff call; the mutating
//! methods exist for tree construction and for the script builder's working
//! copy. Detached nodes stay in the arena as unreachable tombstones, which
//! keeps every `NodeId` stable for the lifetime of the tree.

pub mod fingerprint;
mod path;

pub use path::NodePath;

use crate::error::{Error, Result};
use rustc_hash::FxHashSet;

/// Index of a node within its [`Tree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node of every tree.
    pub const ROOT: NodeId = NodeId(0);

    /// Returns the raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single element record.
///
/// `text` is the character content before the first child; `tail` is the
/// content after this node's closing point, owned by this node.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) tag: String,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) text: Option<String>,
    pub(crate) tail: Option<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    fn new(tag: String) -> Self {
        Node {
            tag,
            attrs: Vec::new(),
            text: None,
            tail: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Returns the element tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the attributes in document order.
    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    /// Returns the value of the named attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the text before the first child.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Returns the text after this node's closing point.
    pub fn tail(&self) -> Option<&str> {
        self.tail.as_deref()
    }

    /// Returns the parent, `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the children in document order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// An ordered, labeled document tree backed by an index arena.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Creates a tree consisting of a single root element.
    pub fn new(tag: impl Into<String>) -> Self {
        Tree {
            nodes: vec![Node::new(tag.into())],
        }
    }

    /// Returns the root node id.
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Returns the node record for `id`.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Returns the number of nodes reachable from the root.
    pub fn node_count(&self) -> usize {
        self.document_order().len()
    }

    /// Appends a new child element under `parent` and returns its id.
    pub fn add_child(&mut self, parent: NodeId, tag: impl Into<String>) -> NodeId {
        let index = self.nodes[parent.0].children.len();
        self.insert_child(parent, index, tag)
    }

    /// Inserts a new child element under `parent` at `index` (clamped to the
    /// current child count) and returns its id.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, tag: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut node = Node::new(tag.into());
        node.parent = Some(parent);
        self.nodes.push(node);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, id);
        id
    }

    /// Replaces the element tag of `id`.
    pub fn set_tag(&mut self, id: NodeId, tag: impl Into<String>) {
        self.nodes[id.0].tag = tag.into();
    }

    /// Sets or replaces an attribute value. New keys are appended, existing
    /// keys keep their position.
    pub fn set_attr(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let attrs = &mut self.nodes[id.0].attrs;
        match attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => attrs.push((name, value)),
        }
    }

    /// Removes an attribute; returns whether it was present.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> bool {
        let attrs = &mut self.nodes[id.0].attrs;
        match attrs.iter().position(|(k, _)| k == name) {
            Some(pos) => {
                attrs.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Sets the text before the first child.
    pub fn set_text(&mut self, id: NodeId, text: Option<String>) {
        self.nodes[id.0].text = text;
    }

    /// Sets the text after this node's closing point.
    pub fn set_tail(&mut self, id: NodeId, tail: Option<String>) {
        self.nodes[id.0].tail = tail;
    }

    /// Returns the position of `id` among its parent's children.
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.nodes[id.0].parent?;
        self.nodes[parent.0].children.iter().position(|&c| c == id)
    }

    /// Detaches `id` from its parent. The subtree stays in the arena as an
    /// unreachable tombstone so ids remain stable.
    pub fn remove_subtree(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent {
            let children = &mut self.nodes[parent.0].children;
            if let Some(pos) = children.iter().position(|&c| c == id) {
                children.remove(pos);
            }
            self.nodes[id.0].parent = None;
        }
    }

    /// Moves `id` under `new_parent` at `index` (clamped after detachment).
    pub fn move_node(&mut self, id: NodeId, new_parent: NodeId, index: usize) {
        self.remove_subtree(id);
        self.nodes[id.0].parent = Some(new_parent);
        let children = &mut self.nodes[new_parent.0].children;
        let index = index.min(children.len());
        children.insert(index, id);
    }

    /// Deep-copies the subtree rooted at `src` and inserts the copy under
    /// `parent` at `index`. Returns the copy's root id.
    pub fn duplicate_subtree(&mut self, src: NodeId, parent: NodeId, index: usize) -> NodeId {
        let copy = self.duplicate_under(src, parent);
        let children = &mut self.nodes[parent.0].children;
        // duplicate_under appended the copy; reposition it
        children.pop();
        let index = index.min(children.len());
        children.insert(index, copy);
        copy
    }

    fn duplicate_under(&mut self, src: NodeId, parent: NodeId) -> NodeId {
        let (tag, attrs, text, tail, kids) = {
            let n = &self.nodes[src.0];
            (
                n.tag.clone(),
                n.attrs.clone(),
                n.text.clone(),
                n.tail.clone(),
                n.children.clone(),
            )
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            tag,
            attrs,
            text,
            tail,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        for kid in kids {
            self.duplicate_under(kid, id);
        }
        id
    }

    /// Returns true if `ancestor` is a proper ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.nodes[id.0].parent;
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.nodes[p.0].parent;
        }
        false
    }

    /// Returns the depth of `id` (0 for the root).
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.nodes[id.0].parent;
        while let Some(p) = current {
            depth += 1;
            current = self.nodes[p.0].parent;
        }
        depth
    }

    /// Document order (pre-order): a node before its children, children left
    /// to right.
    pub fn document_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            for &child in self.nodes[id.0].children.iter().rev() {
                stack.push(child);
            }
        }
        order
    }

    /// Post-order: children before their parent.
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        self.post_order_into(self.root(), &mut order);
        order
    }

    fn post_order_into(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.nodes[id.0].children {
            self.post_order_into(child, out);
        }
        out.push(id);
    }

    /// Breadth-first order: the root, then each level left to right.
    pub fn breadth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut queue = std::collections::VecDeque::from([self.root()]);
        while let Some(id) = queue.pop_front() {
            order.push(id);
            queue.extend(self.nodes[id.0].children.iter().copied());
        }
        order
    }

    /// Validates the structural input contract: consistent parent/child
    /// links, no node reachable twice, unique attribute keys.
    pub fn validate(&self) -> Result<()> {
        let mut seen = FxHashSet::default();
        let mut stack = vec![self.root()];
        if self.nodes[self.root().0].parent.is_some() {
            return Err(Error::InvalidInput("root has a parent".into()));
        }
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                return Err(Error::InvalidInput(format!(
                    "node {} is reachable through more than one path",
                    id.0
                )));
            }
            let node = &self.nodes[id.0];
            let mut keys = FxHashSet::default();
            for (k, _) in &node.attrs {
                if !keys.insert(k.as_str()) {
                    return Err(Error::InvalidInput(format!(
                        "duplicate attribute '{}' on <{}>",
                        k, node.tag
                    )));
                }
            }
            for &child in &node.children {
                if child.0 >= self.nodes.len() {
                    return Err(Error::InvalidInput(format!(
                        "child index {} out of bounds",
                        child.0
                    )));
                }
                if self.nodes[child.0].parent != Some(id) {
                    return Err(Error::InvalidInput(format!(
                        "child {} does not point back to its parent {}",
                        child.0, id.0
                    )));
                }
                stack.push(child);
            }
        }
        Ok(())
    }

    /// Structural deep equality of two subtrees: tag, attributes (compared as
    /// key/value sets), text, tail and children, recursively. This is the
    /// confirmation step behind fingerprint equality.
    pub fn subtree_equal(&self, a: NodeId, other: &Tree, b: NodeId) -> bool {
        let na = &self.nodes[a.0];
        let nb = &other.nodes[b.0];
        if na.tag != nb.tag
            || na.text != nb.text
            || na.tail != nb.tail
            || na.children.len() != nb.children.len()
            || !attrs_equal(&na.attrs, &nb.attrs)
        {
            return false;
        }
        na.children
            .iter()
            .zip(&nb.children)
            .all(|(&ca, &cb)| self.subtree_equal(ca, other, cb))
    }

    /// Canonical whole-tree equality: like [`Tree::subtree_equal`] from the
    /// roots. Attribute order is not significant.
    pub fn canonical_eq(&self, other: &Tree) -> bool {
        self.subtree_equal(self.root(), other, other.root())
    }
}

fn attrs_equal(a: &[(String, String)], b: &[(String, String)]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut sa: Vec<_> = a.iter().collect();
    let mut sb: Vec<_> = b.iter().collect();
    sa.sort();
    sb.sort();
    sa == sb
}
