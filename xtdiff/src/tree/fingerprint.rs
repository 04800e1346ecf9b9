//! Subtree fingerprints.
//!
//! Computes, bottom-up, a structural MD5 hash per node (tag, sorted
//! attributes, ordered child hashes) and a content hash that additionally
//! folds in text and tail. Equal fingerprints let the matcher discard
//! subtree-equality candidates in O(1) instead of O(size); they are a
//! candidate signal only and are always confirmed by
//! [`Tree::subtree_equal`](crate::tree::Tree::subtree_equal) before a match
//! is accepted.

use md5::{Digest, Md5};

use crate::tree::{NodeId, Tree};

/// The structural and content hashes of one subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// Hash of tag, sorted attributes and ordered child structure hashes.
    pub structure: [u8; 16],
    /// Like `structure`, plus text and tail.
    pub content: [u8; 16],
}

/// Computes the fingerprint of every node reachable from the root, indexed
/// by raw [`NodeId`].
pub fn fingerprint_tree(tree: &Tree) -> Vec<Fingerprint> {
    let mut table = vec![Fingerprint::default(); max_id(tree) + 1];
    fingerprint_subtree(tree, tree.root(), &mut table);
    table
}

fn max_id(tree: &Tree) -> usize {
    tree.document_order()
        .iter()
        .map(|id| id.index())
        .max()
        .unwrap_or(0)
}

fn fingerprint_subtree(tree: &Tree, id: NodeId, table: &mut Vec<Fingerprint>) -> Fingerprint {
    let node = tree.node(id);

    let mut structure = Md5::new();
    let mut content = Md5::new();
    for hasher in [&mut structure, &mut content] {
        hasher.update(node.tag().as_bytes());
        hasher.update([0u8]);
        let mut attrs: Vec<_> = node.attrs().iter().collect();
        attrs.sort();
        for (k, v) in attrs {
            hasher.update(k.as_bytes());
            hasher.update([1u8]);
            hasher.update(v.as_bytes());
            hasher.update([2u8]);
        }
    }
    // Field markers keep e.g. text "ab" + tail "c" distinct from "a" + "bc".
    content.update([3u8]);
    if let Some(text) = node.text() {
        content.update(text.as_bytes());
    }
    content.update([4u8]);
    if let Some(tail) = node.tail() {
        content.update(tail.as_bytes());
    }
    content.update([5u8]);

    for &child in node.children() {
        let child_fp = fingerprint_subtree(tree, child, table);
        structure.update(child_fp.structure);
        content.update(child_fp.content);
    }

    let fp = Fingerprint {
        structure: structure.finalize().into(),
        content: content.finalize().into(),
    };
    if table.len() <= id.index() {
        table.resize(id.index() + 1, Fingerprint::default());
    }
    table[id.index()] = fp;
    fp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{parse_str, Normalize};

    fn fp(xml: &str) -> (Tree, Vec<Fingerprint>) {
        let tree = parse_str(xml, Normalize::TAGS).unwrap();
        let table = fingerprint_tree(&tree);
        (tree, table)
    }

    #[test]
    fn test_identical_subtrees_hash_equal() {
        let (a, fa) = fp("<r><s><p>text</p></s></r>");
        let (b, fb) = fp("<r><s><p>text</p></s></r>");
        assert_eq!(fa[a.root().index()], fb[b.root().index()]);
    }

    #[test]
    fn test_text_change_keeps_structure_hash() {
        let (a, fa) = fp("<r><p>one</p></r>");
        let (b, fb) = fp("<r><p>two</p></r>");
        let ra = fa[a.root().index()];
        let rb = fb[b.root().index()];
        assert_eq!(ra.structure, rb.structure);
        assert_ne!(ra.content, rb.content);
    }

    #[test]
    fn test_tag_change_breaks_both_hashes() {
        let (a, fa) = fp("<r><p/></r>");
        let (b, fb) = fp("<r><q/></r>");
        let ra = fa[a.root().index()];
        let rb = fb[b.root().index()];
        assert_ne!(ra.structure, rb.structure);
        assert_ne!(ra.content, rb.content);
    }

    #[test]
    fn test_attribute_order_is_not_significant() {
        let (a, fa) = fp(r#"<r x="1" y="2"/>"#);
        let (b, fb) = fp(r#"<r y="2" x="1"/>"#);
        assert_eq!(fa[a.root().index()], fb[b.root().index()]);
    }

    #[test]
    fn test_child_order_is_significant() {
        let (a, fa) = fp("<r><p/><q/></r>");
        let (b, fb) = fp("<r><q/><p/></r>");
        assert_ne!(fa[a.root().index()].structure, fb[b.root().index()].structure);
    }

    #[test]
    fn test_text_tail_boundary_is_unambiguous() {
        let mut a = Tree::new("r");
        let ca = a.add_child(a.root(), "c");
        a.set_text(ca, Some("ab".into()));
        a.set_tail(ca, Some("c".into()));

        let mut b = Tree::new("r");
        let cb = b.add_child(b.root(), "c");
        b.set_text(cb, Some("a".into()));
        b.set_tail(cb, Some("bc".into()));

        let fa = fingerprint_tree(&a);
        let fb = fingerprint_tree(&b);
        assert_ne!(fa[ca.index()].content, fb[cb.index()].content);
    }
}
