//! Formatter seam.
//!
//! A [`Formatter`] consumes a [`DiffResult`] (and the left tree, for
//! context) and produces a serialized representation. The diff core depends
//! only on the action contract; it never inspects a formatter's internals.
//! Two built-in implementations exist: the machine-readable action log
//! ([`DiffFormatter`]) and the annotated-tree markup ([`XmlFormatter`]).

mod text;
mod xml;

pub use text::DiffFormatter;
pub use xml::XmlFormatter;

use crate::error::Result;
use crate::script::DiffResult;
use crate::tree::Tree;

/// Renders an edit script.
pub trait Formatter {
    /// Produces the serialized representation of `result`. `left` is the
    /// unmodified left tree; formatters that only echo actions may ignore
    /// it.
    fn format(&self, result: &DiffResult, left: &Tree) -> Result<String>;
}

/// Looks up a built-in formatter by name (`diff` or `xml`).
pub fn by_name(name: &str, pretty: bool) -> Option<Box<dyn Formatter>> {
    match name {
        "diff" => Some(Box::new(DiffFormatter::new())),
        "xml" => Some(Box::new(XmlFormatter::new(pretty))),
        _ => None,
    }
}
