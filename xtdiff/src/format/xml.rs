//! Annotated-tree formatter.
//!
//! Renders the edit script as markup mirroring the left tree: inserted
//! nodes carry `diff:insert`, deleted nodes stay in place carrying
//! `diff:delete`, a move leaves a `<diff:delete reason="moved">` copy behind
//! and marks the relocated node, renames and attribute edits get marker
//! attributes, and fine-grained text updates become inline
//! `<diff:insert>`/`<diff:delete>` span elements.
//!
//! Marker elements use the `diff:` prefix, so they never collide with real
//! tags during path resolution; positional inserts count real children
//! only.

use crate::error::{Error, Result};
use crate::format::Formatter;
use crate::script::{Action, DiffResult};
use crate::textdiff::TextOp;
use crate::tree::{NodeId, NodePath, Tree};
use crate::xml::{to_string, PrinterOptions};

const DIFF_NAMESPACE: &str = "urn:xtdiff:diff";

const INSERT_TAG: &str = "diff:insert";
const DELETE_TAG: &str = "diff:delete";

/// The annotated-tree formatter.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlFormatter {
    pretty: bool,
}

impl XmlFormatter {
    /// Creates the formatter; `pretty` lays out element-only content.
    pub fn new(pretty: bool) -> Self {
        XmlFormatter { pretty }
    }

    fn handle(&self, work: &mut Tree, action: &Action) -> Result<()> {
        match action {
            Action::InsertNode {
                target,
                tag,
                position,
            } => {
                let parent = resolve(work, target)?;
                let index = annotated_index(work, parent, *position);
                let id = work.insert_child(parent, index, tag.clone());
                work.set_attr(id, "diff:insert", "true");
            }
            Action::DeleteNode { node } => {
                let id = resolve(work, node)?;
                work.set_attr(id, "diff:delete", "true");
            }
            Action::MoveNode {
                node,
                target,
                position,
            } => {
                let id = resolve(work, node)?;
                let parent = resolve(work, target)?;
                // Leave a marked copy at the old position.
                if let (Some(old_parent), Some(old_index)) =
                    (work.node(id).parent(), work.child_index(id))
                {
                    let ghost = work.insert_child(old_parent, old_index, DELETE_TAG);
                    work.set_attr(ghost, "reason", "moved");
                    work.duplicate_subtree(id, ghost, 0);
                }
                // The position is counted after detachment, real children only.
                work.remove_subtree(id);
                let index = annotated_index(work, parent, *position);
                work.move_node(id, parent, index);
                work.set_attr(id, "diff:insert", "moved");
            }
            Action::UpdateTag { node, tag } => {
                let id = resolve(work, node)?;
                let old = work.node(id).tag().to_string();
                work.set_tag(id, tag.clone());
                work.set_attr(id, "diff:rename", old);
            }
            Action::UpdateAttrib { node, name, value } => {
                let id = resolve(work, node)?;
                work.set_attr(id, name.clone(), value.clone());
                if !is_inserted(work, id) {
                    append_marker(work, id, "diff:update-attr", name);
                }
            }
            Action::DeleteAttrib { node, name } => {
                let id = resolve(work, node)?;
                work.remove_attr(id, name);
                append_marker(work, id, "diff:delete-attr", name);
            }
            Action::UpdateText { node, text, runs } => {
                let id = resolve(work, node)?;
                match runs {
                    Some(runs) => render_text_runs(work, id, runs),
                    None => {
                        if !is_inserted(work, id) {
                            let old = work.node(id).text().unwrap_or("").to_string();
                            work.set_attr(id, "diff:update-text", old);
                        }
                        work.set_text(id, text.clone());
                    }
                }
            }
            Action::UpdateTail { node, text, runs } => {
                let id = resolve(work, node)?;
                match (runs, work.node(id).parent()) {
                    (Some(runs), Some(_)) => render_tail_runs(work, id, runs),
                    _ => {
                        if !is_inserted(work, id) {
                            let old = work.node(id).tail().unwrap_or("").to_string();
                            work.set_attr(id, "diff:update-text-after", old);
                        }
                        work.set_tail(id, text.clone());
                    }
                }
            }
        }
        Ok(())
    }
}

impl Formatter for XmlFormatter {
    fn format(&self, result: &DiffResult, left: &Tree) -> Result<String> {
        let mut work = left.clone();
        for action in result {
            self.handle(&mut work, action)?;
        }
        work.set_attr(work.root(), "xmlns:diff", DIFF_NAMESPACE);
        Ok(to_string(
            &work,
            PrinterOptions {
                pretty: self.pretty,
                declaration: false,
            },
        ))
    }
}

fn resolve(work: &Tree, path: &NodePath) -> Result<NodeId> {
    path.resolve(work)
        .ok_or_else(|| Error::InvalidPath(path.to_string()))
}

fn is_marker(work: &Tree, id: NodeId) -> bool {
    work.node(id).tag().starts_with("diff:")
}

fn is_inserted(work: &Tree, id: NodeId) -> bool {
    work.node(id).attr("diff:insert").is_some()
}

/// Maps a position counted over real children onto the annotated child
/// list, skipping marker elements.
fn annotated_index(work: &Tree, parent: NodeId, position: usize) -> usize {
    let children = work.node(parent).children();
    let mut real = 0;
    for (i, &child) in children.iter().enumerate() {
        if real == position {
            return i;
        }
        if !is_marker(work, child) {
            real += 1;
        }
    }
    children.len()
}

/// Accumulates names in a semicolon-joined marker attribute.
fn append_marker(work: &mut Tree, id: NodeId, marker: &str, name: &str) {
    let value = match work.node(id).attr(marker) {
        Some(existing) => format!("{existing};{name}"),
        None => name.to_string(),
    };
    work.set_attr(id, marker, value);
}

/// Renders text runs as inline span elements before the first real child.
fn render_text_runs(work: &mut Tree, id: NodeId, runs: &[TextOp]) {
    work.set_text(id, None);
    let mut marker: Option<NodeId> = None;
    let mut index = 0;
    for op in runs {
        match op {
            TextOp::Equal(s) => match marker {
                None => append_text(work, id, s),
                Some(m) => append_tail(work, m, s),
            },
            TextOp::Delete(s) => {
                let m = work.insert_child(id, index, DELETE_TAG);
                work.set_text(m, Some(s.clone()));
                index += 1;
                marker = Some(m);
            }
            TextOp::Insert(s) => {
                let m = work.insert_child(id, index, INSERT_TAG);
                work.set_text(m, Some(s.clone()));
                index += 1;
                marker = Some(m);
            }
        }
    }
}

/// Renders tail runs as span elements following the node.
fn render_tail_runs(work: &mut Tree, id: NodeId, runs: &[TextOp]) {
    let parent = work
        .node(id)
        .parent()
        .expect("tail runs are only rendered below the root");
    work.set_tail(id, None);
    let mut carrier = id;
    let mut index = work
        .child_index(id)
        .expect("node with a parent has a child index")
        + 1;
    for op in runs {
        match op {
            TextOp::Equal(s) => append_tail(work, carrier, s),
            TextOp::Delete(s) => {
                let m = work.insert_child(parent, index, DELETE_TAG);
                work.set_text(m, Some(s.clone()));
                index += 1;
                carrier = m;
            }
            TextOp::Insert(s) => {
                let m = work.insert_child(parent, index, INSERT_TAG);
                work.set_text(m, Some(s.clone()));
                index += 1;
                carrier = m;
            }
        }
    }
}

fn append_text(work: &mut Tree, id: NodeId, s: &str) {
    let combined = match work.node(id).text() {
        Some(existing) => format!("{existing}{s}"),
        None => s.to_string(),
    };
    work.set_text(id, Some(combined));
}

fn append_tail(work: &mut Tree, id: NodeId, s: &str) {
    let combined = match work.node(id).tail() {
        Some(existing) => format!("{existing}{s}"),
        None => s.to_string(),
    };
    work.set_tail(id, Some(combined));
}
