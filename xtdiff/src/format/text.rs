//! Machine-readable action log.
//!
//! One line per action, stable form: `[verb, arg, arg, ...]`. String values
//! are double-quoted with backslash escapes; absent text is rendered as
//! `null`. The output is what the command line tool prints by default.

use crate::error::Result;
use crate::format::Formatter;
use crate::script::{Action, DiffResult};
use crate::tree::Tree;

/// The action-log formatter.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffFormatter;

impl DiffFormatter {
    /// Creates the formatter.
    pub fn new() -> Self {
        DiffFormatter
    }

    fn line(action: &Action) -> String {
        match action {
            Action::InsertNode {
                target,
                tag,
                position,
            } => format!("[insert, {target}, {tag}, {position}]"),
            Action::DeleteNode { node } => format!("[delete, {node}]"),
            Action::MoveNode {
                node,
                target,
                position,
            } => format!("[move, {node}, {target}, {position}]"),
            Action::UpdateTag { node, tag } => format!("[rename, {node}, {tag}]"),
            Action::UpdateAttrib { node, name, value } => {
                format!("[update-attribute, {node}, {name}, {}]", quote(value))
            }
            Action::DeleteAttrib { node, name } => {
                format!("[delete-attribute, {node}, {name}]")
            }
            Action::UpdateText { node, text, .. } => {
                format!("[update-text, {node}, {}]", quote_opt(text.as_deref()))
            }
            Action::UpdateTail { node, text, .. } => {
                format!("[update-text-after, {node}, {}]", quote_opt(text.as_deref()))
            }
        }
    }
}

impl Formatter for DiffFormatter {
    fn format(&self, result: &DiffResult, _left: &Tree) -> Result<String> {
        let lines: Vec<String> = result.iter().map(Self::line).collect();
        Ok(lines.join("\n"))
    }
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn quote_opt(value: Option<&str>) -> String {
    match value {
        Some(v) => quote(v),
        None => "null".to_string(),
    }
}
