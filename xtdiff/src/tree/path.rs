//! Structured node addresses.
//!
//! A [`NodePath`] addresses a node the way the edit script talks about it:
//! `/doc/section[2]/para[1]`. The root segment carries no index; every other
//! segment is a tag plus a 1-based position among same-tag siblings. Paths
//! are resolved against the tree state at the point the owning action is
//! applied, never against a stale snapshot.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::tree::{NodeId, Tree};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PathSegment {
    tag: String,
    /// 1-based position among same-tag siblings; unused for the root.
    index: usize,
}

/// The address of a node, from the root down.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodePath {
    segments: Vec<PathSegment>,
}

impl NodePath {
    /// Computes the address of `id` in `tree`.
    pub fn of(tree: &Tree, id: NodeId) -> NodePath {
        let mut segments = Vec::new();
        let mut current = id;
        loop {
            let node = tree.node(current);
            match node.parent() {
                None => {
                    segments.push(PathSegment {
                        tag: node.tag().to_string(),
                        index: 1,
                    });
                    break;
                }
                Some(parent) => {
                    let mut index = 0;
                    for &sibling in tree.node(parent).children() {
                        if tree.node(sibling).tag() == node.tag() {
                            index += 1;
                        }
                        if sibling == current {
                            break;
                        }
                    }
                    segments.push(PathSegment {
                        tag: node.tag().to_string(),
                        index,
                    });
                    current = parent;
                }
            }
        }
        segments.reverse();
        NodePath { segments }
    }

    /// Resolves this address against `tree`, returning `None` when any
    /// segment does not exist in the current tree state.
    pub fn resolve(&self, tree: &Tree) -> Option<NodeId> {
        let mut segments = self.segments.iter();
        let root_seg = segments.next()?;
        if tree.node(tree.root()).tag() != root_seg.tag {
            return None;
        }
        let mut current = tree.root();
        for seg in segments {
            let mut found = None;
            let mut nth = 0;
            for &child in tree.node(current).children() {
                if tree.node(child).tag() == seg.tag {
                    nth += 1;
                    if nth == seg.index {
                        found = Some(child);
                        break;
                    }
                }
            }
            current = found?;
        }
        Some(current)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i == 0 {
                write!(f, "/{}", seg.tag)?;
            } else {
                write!(f, "/{}[{}]", seg.tag, seg.index)?;
            }
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix('/')
            .ok_or_else(|| Error::InvalidPath(s.to_string()))?;
        let mut segments = Vec::new();
        for (i, part) in rest.split('/').enumerate() {
            if part.is_empty() {
                return Err(Error::InvalidPath(s.to_string()));
            }
            let (tag, index) = match part.find('[') {
                Some(open) => {
                    let close = part
                        .strip_suffix(']')
                        .ok_or_else(|| Error::InvalidPath(s.to_string()))?;
                    let index: usize = close[open + 1..]
                        .parse()
                        .map_err(|_| Error::InvalidPath(s.to_string()))?;
                    (&part[..open], index)
                }
                None if i == 0 => (part, 1),
                None => return Err(Error::InvalidPath(s.to_string())),
            };
            if tag.is_empty() || index == 0 {
                return Err(Error::InvalidPath(s.to_string()));
            }
            segments.push(PathSegment {
                tag: tag.to_string(),
                index,
            });
        }
        Ok(NodePath { segments })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tree {
        let mut t = Tree::new("doc");
        let story = t.add_child(t.root(), "story");
        let s1 = t.add_child(story, "section");
        t.add_child(s1, "para");
        let s2 = t.add_child(story, "section");
        t.add_child(s2, "para");
        t
    }

    #[test]
    fn test_display() {
        let t = sample();
        let order = t.document_order();
        assert_eq!(NodePath::of(&t, t.root()).to_string(), "/doc");
        assert_eq!(NodePath::of(&t, order[2]).to_string(), "/doc/story[1]/section[1]");
        assert_eq!(NodePath::of(&t, order[4]).to_string(), "/doc/story[1]/section[2]");
        assert_eq!(
            NodePath::of(&t, order[5]).to_string(),
            "/doc/story[1]/section[2]/para[1]"
        );
    }

    #[test]
    fn test_roundtrip_through_resolve() {
        let t = sample();
        for id in t.document_order() {
            let path = NodePath::of(&t, id);
            assert_eq!(path.resolve(&t), Some(id), "path {}", path);
        }
    }

    #[test]
    fn test_resolve_missing() {
        let t = sample();
        let path: NodePath = "/doc/story[1]/section[3]".parse().unwrap();
        assert_eq!(path.resolve(&t), None);
        let path: NodePath = "/other".parse().unwrap();
        assert_eq!(path.resolve(&t), None);
    }

    #[test]
    fn test_parse() {
        let path: NodePath = "/doc/story[1]/section[2]".parse().unwrap();
        assert_eq!(path.to_string(), "/doc/story[1]/section[2]");
        assert!("doc/story".parse::<NodePath>().is_err());
        assert!("/doc/story".parse::<NodePath>().is_err());
        assert!("/doc/story[0]".parse::<NodePath>().is_err());
        assert!("/doc//story[1]".parse::<NodePath>().is_err());
    }

    #[test]
    fn test_mixed_tags_count_separately() {
        let mut t = Tree::new("a");
        t.add_child(t.root(), "x");
        let y = t.add_child(t.root(), "y");
        let x2 = t.add_child(t.root(), "x");
        assert_eq!(NodePath::of(&t, y).to_string(), "/a/y[1]");
        assert_eq!(NodePath::of(&t, x2).to_string(), "/a/x[2]");
    }
}
