//! # xtdiff — structural XML diffing
//!
//! Computes a structural difference between two ordered, labeled trees and
//! produces a minimal, replayable edit script: node insertions, deletions,
//! moves, renames, attribute and text updates, and sibling reorderings.
//!
//! The pipeline is a pure, synchronous batch computation: two [`Tree`]
//! values go through fingerprinting and the four-pass [`Matcher`], the
//! resulting [`NodeMapping`] drives the script builder, and the ordered
//! [`DiffResult`] comes back to the caller. Replaying the result against the
//! left tree with [`apply`] reconstructs the right tree; identical inputs
//! and options always produce identical scripts.
//!
//! # Example
//!
//! ```
//! use xtdiff::{diff_texts, DiffOptions};
//!
//! let result = diff_texts("<a><b/></a>", "<a/>", &DiffOptions::default()).unwrap();
//! assert_eq!(result.len(), 1);
//! ```
//!
//! Markup parsing and serialization live in [`xml`] and are collaborators of
//! the core, not part of it; any source able to produce a [`Tree`] can be
//! diffed. Rendering is behind the [`Formatter`] seam.

pub mod constants;
pub mod error;
pub mod format;
pub mod lcs;
pub mod matching;
pub mod script;
pub mod textdiff;
pub mod tree;
pub mod xml;

pub use error::{Error, Result};
pub use format::{DiffFormatter, Formatter, XmlFormatter};
pub use matching::{MatchPair, Matcher, NodeMapping};
pub use script::{apply, Action, DiffResult};
pub use textdiff::{diff_text, similarity, TextOp};
pub use tree::{Node, NodeId, NodePath, Tree};
pub use xml::{parse_file, parse_str, Normalize};

use std::path::Path;

/// Tuning knobs for a single diff call.
///
/// Passed explicitly into every call; there is no ambient configuration.
/// The defaults are the documented constants in [`constants`].
#[derive(Debug, Clone, Copy)]
pub struct DiffOptions {
    /// Minimum signature similarity for matching two leaves.
    pub leaf_threshold: f64,
    /// Minimum matched-descendant overlap for matching two internal nodes.
    pub node_threshold: f64,
    /// Attach character-level runs to text updates instead of whole-value
    /// substitution only.
    pub fine_grained_text: bool,
    /// Whitespace handling applied when this options value is used to parse.
    pub normalize: Normalize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        DiffOptions {
            leaf_threshold: constants::LEAF_SIMILARITY_THRESHOLD,
            node_threshold: constants::NODE_SIMILARITY_THRESHOLD,
            fine_grained_text: false,
            normalize: Normalize::TAGS,
        }
    }
}

/// Diffs two trees and returns the edit script transforming `left` into
/// `right`.
///
/// Both trees are validated against the input contract first; the inputs are
/// never modified. For any two valid trees a script is produced — matching
/// and script generation are total.
pub fn diff_trees(left: &Tree, right: &Tree, options: &DiffOptions) -> Result<DiffResult> {
    left.validate()?;
    right.validate()?;
    let mapping = Matcher::new(left, right, options).run();
    Ok(script::build_script(left, right, &mapping, options))
}

/// Parses two XML strings and diffs them.
pub fn diff_texts(left: &str, right: &str, options: &DiffOptions) -> Result<DiffResult> {
    let left = parse_str(left, options.normalize)?;
    let right = parse_str(right, options.normalize)?;
    diff_trees(&left, &right, options)
}

/// Parses two XML files and diffs them.
pub fn diff_files<P: AsRef<Path>>(left: P, right: P, options: &DiffOptions) -> Result<DiffResult> {
    let left = parse_file(left, options.normalize)?;
    let right = parse_file(right, options.normalize)?;
    diff_trees(&left, &right, options)
}
