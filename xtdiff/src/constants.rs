//! Default configuration constants.
//!
//! These are the documented defaults behind [`crate::DiffOptions::default`].
//! Every threshold is passed explicitly into the matcher and builder; nothing
//! here is read as ambient state.

/// Minimum signature similarity for two leaf nodes to be considered the same
/// node ($F$ in the matching literature).
pub const LEAF_SIMILARITY_THRESHOLD: f64 = 0.5;

/// Minimum matched-descendant overlap for two internal nodes to be matched
/// ($T$ in the matching literature).
pub const NODE_SIMILARITY_THRESHOLD: f64 = 0.5;

/// Equal runs shorter than this many characters, surrounded by edits on both
/// sides, are folded into those edits during semantic cleanup of a text diff.
pub const SEMANTIC_CLEANUP_THRESHOLD: usize = 4;
