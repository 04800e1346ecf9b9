//! Edit script replay.
//!
//! Applies a [`DiffResult`] to a tree, producing the patched tree. This is
//! the same mutation path the builder drives while emitting, so a script
//! replayed here reconstructs the right-hand tree exactly; it also serves
//! callers that want to carry a document forward by patch.

use crate::error::{Error, Result};
use crate::script::{Action, DiffResult};
use crate::tree::{NodeId, NodePath, Tree};

/// Replays `result` against `tree` and returns the transformed copy.
///
/// The input tree is not modified. Every address must resolve against the
/// tree state at its point in the sequence; a miss is [`Error::InvalidPath`].
pub fn apply(result: &DiffResult, tree: &Tree) -> Result<Tree> {
    let mut work = tree.clone();
    for action in result {
        apply_action(&mut work, action)?;
    }
    Ok(work)
}

fn resolve(work: &Tree, path: &NodePath) -> Result<NodeId> {
    path.resolve(work)
        .ok_or_else(|| Error::InvalidPath(path.to_string()))
}

fn apply_action(work: &mut Tree, action: &Action) -> Result<()> {
    match action {
        Action::InsertNode {
            target,
            tag,
            position,
        } => {
            let parent = resolve(work, target)?;
            work.insert_child(parent, *position, tag.clone());
        }
        Action::DeleteNode { node } => {
            let id = resolve(work, node)?;
            if work.node(id).parent().is_none() {
                return Err(Error::InvalidInput("cannot delete the root".into()));
            }
            work.remove_subtree(id);
        }
        Action::MoveNode {
            node,
            target,
            position,
        } => {
            let id = resolve(work, node)?;
            let parent = resolve(work, target)?;
            if id == parent || work.is_ancestor(id, parent) {
                return Err(Error::InvalidInput(format!(
                    "move of {} into its own subtree",
                    node
                )));
            }
            work.move_node(id, parent, *position);
        }
        Action::UpdateTag { node, tag } => {
            let id = resolve(work, node)?;
            work.set_tag(id, tag.clone());
        }
        Action::UpdateAttrib { node, name, value } => {
            let id = resolve(work, node)?;
            work.set_attr(id, name.clone(), value.clone());
        }
        Action::DeleteAttrib { node, name } => {
            let id = resolve(work, node)?;
            if !work.remove_attr(id, name) {
                return Err(Error::InvalidPath(format!("{}/@{}", node, name)));
            }
        }
        Action::UpdateText { node, text, .. } => {
            let id = resolve(work, node)?;
            work.set_text(id, text.clone());
        }
        Action::UpdateTail { node, text, .. } => {
            let id = resolve(work, node)?;
            work.set_tail(id, text.clone());
        }
    }
    Ok(())
}
