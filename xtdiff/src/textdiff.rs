//! Character-level text differencing.
//!
//! Produces an ordered run sequence of equal/delete/insert operations that
//! transforms one string into another, driven by the shortest-edit-script
//! search in [`crate::lcs`]. Raw runs are post-processed: adjacent runs of
//! one kind are merged, and a semantic cleanup pass folds tiny equal runs
//! that sit between edits so the result does not fragment into
//! single-character noise when a coarser boundary is available.

use crate::constants::SEMANTIC_CLEANUP_THRESHOLD;
use crate::lcs::longest_common_subsequence;

/// One run of a character-level diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextOp {
    /// Characters present in both strings.
    Equal(String),
    /// Characters present only in the old string.
    Delete(String),
    /// Characters present only in the new string.
    Insert(String),
}

impl TextOp {
    /// Returns the run's character content.
    pub fn text(&self) -> &str {
        match self {
            TextOp::Equal(s) | TextOp::Delete(s) | TextOp::Insert(s) => s,
        }
    }

    fn is_edit(&self) -> bool {
        !matches!(self, TextOp::Equal(_))
    }
}

/// Computes the run sequence transforming `old` into `new`.
///
/// Replaying the runs (keep equals, drop deletes, emit inserts) always
/// reconstructs `new` exactly.
pub fn diff_text(old: &str, new: &str) -> Vec<TextOp> {
    let a: Vec<char> = old.chars().collect();
    let b: Vec<char> = new.chars().collect();
    let pairs = longest_common_subsequence(&a, &b, |x, y| x == y);

    let mut ops = Vec::new();
    let mut i = 0;
    let mut j = 0;
    for (x, y) in pairs {
        if x > i {
            ops.push(TextOp::Delete(a[i..x].iter().collect()));
        }
        if y > j {
            ops.push(TextOp::Insert(b[j..y].iter().collect()));
        }
        ops.push(TextOp::Equal(a[x].to_string()));
        i = x + 1;
        j = y + 1;
    }
    if i < a.len() {
        ops.push(TextOp::Delete(a[i..].iter().collect()));
    }
    if j < b.len() {
        ops.push(TextOp::Insert(b[j..].iter().collect()));
    }

    merge_runs(&mut ops);
    cleanup_semantic(&mut ops);
    ops
}

/// Similarity ratio of two strings in `[0, 1]`: twice the matched character
/// count over the total length. Two empty strings are identical (1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    let ca: Vec<char> = a.chars().collect();
    let cb: Vec<char> = b.chars().collect();
    let total = ca.len() + cb.len();
    if total == 0 {
        return 1.0;
    }
    let matched = longest_common_subsequence(&ca, &cb, |x, y| x == y).len();
    2.0 * matched as f64 / total as f64
}

/// Merges adjacent runs of the same kind.
fn merge_runs(ops: &mut Vec<TextOp>) {
    let mut merged: Vec<TextOp> = Vec::with_capacity(ops.len());
    for op in ops.drain(..) {
        match (merged.last_mut(), op) {
            (Some(TextOp::Equal(acc)), TextOp::Equal(s))
            | (Some(TextOp::Delete(acc)), TextOp::Delete(s))
            | (Some(TextOp::Insert(acc)), TextOp::Insert(s)) => acc.push_str(&s),
            (_, op) => merged.push(op),
        }
    }
    *ops = merged;
}

/// Folds equal runs shorter than [`SEMANTIC_CLEANUP_THRESHOLD`] that are
/// surrounded by edits on both sides into those edits. The replayed result
/// is unchanged; the run boundaries get coarser.
pub fn cleanup_semantic(ops: &mut Vec<TextOp>) {
    let n = ops.len();
    let mut out: Vec<TextOp> = Vec::with_capacity(n);
    let mut pending_del = String::new();
    let mut pending_ins = String::new();

    let flush = |out: &mut Vec<TextOp>, del: &mut String, ins: &mut String| {
        if !del.is_empty() {
            out.push(TextOp::Delete(std::mem::take(del)));
        }
        if !ins.is_empty() {
            out.push(TextOp::Insert(std::mem::take(ins)));
        }
    };

    for (idx, op) in ops.drain(..).enumerate() {
        match op {
            TextOp::Delete(s) => pending_del.push_str(&s),
            TextOp::Insert(s) => pending_ins.push_str(&s),
            TextOp::Equal(s) => {
                let has_edit_before = !pending_del.is_empty() || !pending_ins.is_empty();
                let has_edit_after = idx + 1 < n;
                let small = s.chars().count() < SEMANTIC_CLEANUP_THRESHOLD;
                if small && has_edit_before && has_edit_after {
                    // Deleted on one side, re-inserted on the other.
                    pending_del.push_str(&s);
                    pending_ins.push_str(&s);
                } else {
                    flush(&mut out, &mut pending_del, &mut pending_ins);
                    out.push(TextOp::Equal(s));
                }
            }
        }
    }
    flush(&mut out, &mut pending_del, &mut pending_ins);
    *ops = out;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Replays a run sequence: equals and inserts survive, deletes vanish.
    fn reconstruct(ops: &[TextOp]) -> String {
        let mut out = String::new();
        for op in ops {
            match op {
                TextOp::Equal(s) | TextOp::Insert(s) => out.push_str(s),
                TextOp::Delete(_) => {}
            }
        }
        out
    }

    /// The old side of a run sequence: equals and deletes.
    fn old_side(ops: &[TextOp]) -> String {
        let mut out = String::new();
        for op in ops {
            match op {
                TextOp::Equal(s) | TextOp::Delete(s) => out.push_str(s),
                TextOp::Insert(_) => {}
            }
        }
        out
    }

    #[test]
    fn test_equal_strings() {
        assert_eq!(
            diff_text("same", "same"),
            vec![TextOp::Equal("same".to_string())]
        );
        assert_eq!(diff_text("", ""), Vec::<TextOp>::new());
    }

    #[test]
    fn test_plain_replacement() {
        assert_eq!(
            diff_text("The cat in the hat", "The dog in the hat"),
            vec![
                TextOp::Equal("The ".to_string()),
                TextOp::Delete("cat".to_string()),
                TextOp::Insert("dog".to_string()),
                TextOp::Equal(" in the hat".to_string()),
            ]
        );
    }

    #[test]
    fn test_pure_insert_and_delete() {
        assert_eq!(
            diff_text("", "abc"),
            vec![TextOp::Insert("abc".to_string())]
        );
        assert_eq!(
            diff_text("abc", ""),
            vec![TextOp::Delete("abc".to_string())]
        );
    }

    #[test]
    fn test_semantic_cleanup_folds_small_equalities() {
        // The lone common "a" is not a useful boundary.
        assert_eq!(
            diff_text("XXXaYYY", "PPPaQQQ"),
            vec![
                TextOp::Delete("XXXaYYY".to_string()),
                TextOp::Insert("PPPaQQQ".to_string()),
            ]
        );
    }

    #[test]
    fn test_semantic_cleanup_keeps_boundary_equalities() {
        // Leading and trailing equal runs are never folded.
        assert_eq!(
            diff_text("abXcd", "abYcd"),
            vec![
                TextOp::Equal("ab".to_string()),
                TextOp::Delete("X".to_string()),
                TextOp::Insert("Y".to_string()),
                TextOp::Equal("cd".to_string()),
            ]
        );
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        let sim = similarity("b x", "b y");
        assert!((sim - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_reconstruction() {
        let cases = [
            ("hello world", "hello there"),
            ("", "fresh"),
            ("stale", ""),
            ("a quick brown fox", "the quick red fox jumps"),
            ("aaaa", "aa"),
        ];
        for (old, new) in cases {
            let ops = diff_text(old, new);
            assert_eq!(reconstruct(&ops), new, "{:?} -> {:?}", old, new);
            assert_eq!(old_side(&ops), old, "{:?} -> {:?}", old, new);
        }
    }

    proptest! {
        #[test]
        fn prop_runs_reconstruct_both_sides(old in ".{0,40}", new in ".{0,40}") {
            let ops = diff_text(&old, &new);
            prop_assert_eq!(reconstruct(&ops), new);
            prop_assert_eq!(old_side(&ops), old);
        }
    }
}
