//! End-to-end scenarios: diff two documents, inspect the script, and replay
//! it against the left tree to verify the reconstruction guarantee.

use xtdiff::{
    apply, diff_files, diff_texts, parse_str, Action, DiffOptions, Normalize,
};

fn options() -> DiffOptions {
    DiffOptions::default()
}

/// Diffs two documents and checks that replaying the script against the
/// left tree yields a tree canonically equal to the right one.
fn assert_round_trip(left: &str, right: &str) -> usize {
    let opts = options();
    let ltree = parse_str(left, opts.normalize).unwrap();
    let rtree = parse_str(right, opts.normalize).unwrap();
    let result = diff_texts(left, right, &opts).unwrap();
    let patched = apply(&result, &ltree).unwrap();
    assert!(
        patched.canonical_eq(&rtree),
        "replay mismatch for {left} -> {right}\nscript: {result:#?}"
    );
    result.len()
}

#[test]
fn identity_diff_is_empty() {
    let docs = [
        "<a/>",
        "<a><b/><c/></a>",
        r#"<doc><story id="s"><para>First paragraph</para><para>Last</para></story></doc>"#,
        "<a>text<b/>tail</a>",
    ];
    for doc in docs {
        let result = diff_texts(doc, doc, &options()).unwrap();
        assert!(result.is_empty(), "diff({doc}, {doc}) = {result:?}");
    }
}

#[test]
fn sibling_swap_is_one_move() {
    let result = diff_texts("<a><b/><c/></a>", "<a><c/><b/></a>", &options()).unwrap();
    assert_eq!(result.len(), 1);
    assert!(matches!(result.actions()[0], Action::MoveNode { .. }));
    assert_round_trip("<a><b/><c/></a>", "<a><c/><b/></a>");
}

#[test]
fn leaf_text_change_is_one_update() {
    let result = diff_texts("<a><b>x</b></a>", "<a><b>y</b></a>", &options()).unwrap();
    assert_eq!(result.len(), 1);
    let Action::UpdateText { node, text, .. } = &result.actions()[0] else {
        panic!("expected UpdateText, got {:?}", result.actions()[0]);
    };
    assert_eq!(node.to_string(), "/a/b[1]");
    assert_eq!(text.as_deref(), Some("y"));
    assert_round_trip("<a><b>x</b></a>", "<a><b>y</b></a>");
}

#[test]
fn child_appearing_is_one_insert() {
    let result = diff_texts("<a/>", "<a><b/></a>", &options()).unwrap();
    assert_eq!(result.len(), 1);
    let Action::InsertNode {
        target,
        tag,
        position,
    } = &result.actions()[0]
    else {
        panic!("expected InsertNode, got {:?}", result.actions()[0]);
    };
    assert_eq!(target.to_string(), "/a");
    assert_eq!(tag, "b");
    assert_eq!(*position, 0);
    assert_round_trip("<a/>", "<a><b/></a>");
}

#[test]
fn child_vanishing_is_one_delete() {
    let result = diff_texts("<a><b/></a>", "<a/>", &options()).unwrap();
    assert_eq!(result.len(), 1);
    let Action::DeleteNode { node } = &result.actions()[0] else {
        panic!("expected DeleteNode, got {:?}", result.actions()[0]);
    };
    assert_eq!(node.to_string(), "/a/b[1]");
    assert_round_trip("<a><b/></a>", "<a/>");
}

#[test]
fn attribute_change_is_one_update() {
    let result = diff_texts(r#"<a foo="1"/>"#, r#"<a foo="2"/>"#, &options()).unwrap();
    assert_eq!(result.len(), 1);
    let Action::UpdateAttrib { node, name, value } = &result.actions()[0] else {
        panic!("expected UpdateAttrib, got {:?}", result.actions()[0]);
    };
    assert_eq!(node.to_string(), "/a");
    assert_eq!(name, "foo");
    assert_eq!(value, "2");
    assert_round_trip(r#"<a foo="1"/>"#, r#"<a foo="2"/>"#);
}

#[test]
fn move_count_is_sibling_count_minus_lcs() {
    // [b c d e] -> [b d c e]: the longest common subsequence keeps three
    // children in place, so exactly one move remains.
    let result = diff_texts(
        "<a><b/><c/><d/><e/></a>",
        "<a><b/><d/><c/><e/></a>",
        &options(),
    )
    .unwrap();
    let moves = result
        .iter()
        .filter(|a| matches!(a, Action::MoveNode { .. }))
        .count();
    assert_eq!(moves, 1);
    assert_eq!(result.len(), 1);
    assert_round_trip("<a><b/><c/><d/><e/></a>", "<a><b/><d/><c/><e/></a>");
}

#[test]
fn determinism() {
    let left = r#"<doc><s n="1"><p>alpha beta</p><p>gamma</p></s><s n="2"/></doc>"#;
    let right = r#"<doc><s n="2"><p>gamma</p></s><s n="1"><p>alpha betas</p></s></doc>"#;
    let first = diff_texts(left, right, &options()).unwrap();
    let second = diff_texts(left, right, &options()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn round_trips() {
    let cases = [
        // reorders
        ("<a><b/><c/></a>", "<a><c/><b/></a>"),
        ("<a><b/><c/><d/><e/></a>", "<a><e/><d/><c/><b/></a>"),
        // content edits
        ("<a><b>x</b></a>", "<a><b>y</b></a>"),
        ("<a>t1<b/>t2</a>", "<a>T1<b/>T2</a>"),
        (
            r#"<a><b x="1" y="2">hello world</b></a>"#,
            r#"<a><b y="2" z="3">hello world</b></a>"#,
        ),
        // structure edits
        ("<a/>", r#"<a><b id="1">hi</b>t</a>"#),
        ("<r><x><b>stable text</b></x></r>", "<r><b>stable text</b></r>"),
        ("<r><b>stable text</b></r>", "<r><x><b>stable text</b></x></r>"),
        // container split, as in a document edit
        (
            "<document><story><section><para>First paragraph</para>\
             <para>Last paragraph</para></section></story></document>",
            "<document><story><section><para>First paragraph</para></section>\
             <section><para>Last paragraph</para></section></story></document>",
        ),
        // rename plus churn
        (
            r#"<a><div x="1"><p>one two three</p></div></a>"#,
            r#"<a><section x="9" z="3"><p>one two three</p></section></a>"#,
        ),
        // list editing
        (
            "<root><ul><li>one</li><li>two</li><li>three</li></ul><p>footer</p></root>",
            "<root><p>footer</p><ul><li>three</li><li>one</li><li>two2</li><li>four</li></ul></root>",
        ),
        // nothing in common
        ("<a><b>one</b></a>", "<x><y>unrelated</y></x>"),
        // empty vs populated root
        ("<a/>", "<a><b/><c><d/></c></a>"),
        ("<a><b/><c><d/></c></a>", "<a/>"),
    ];
    for (left, right) in cases {
        assert_round_trip(left, right);
        // And the reverse direction.
        assert_round_trip(right, left);
    }
}

#[test]
fn fine_grained_round_trips_too() {
    let opts = DiffOptions {
        fine_grained_text: true,
        ..DiffOptions::default()
    };
    let left = "<a><b>The cat in the hat</b>tail one</a>";
    let right = "<a><b>The dog in the hat</b>tail two</a>";
    let ltree = parse_str(left, opts.normalize).unwrap();
    let rtree = parse_str(right, opts.normalize).unwrap();
    let result = diff_texts(left, right, &opts).unwrap();
    let patched = apply(&result, &ltree).unwrap();
    assert!(patched.canonical_eq(&rtree));
}

#[test]
fn diff_files_end_to_end() {
    let dir = std::env::temp_dir();
    let left_path = dir.join("xtdiff-test-left.xml");
    let right_path = dir.join("xtdiff-test-right.xml");
    std::fs::write(&left_path, "<a><b>x</b></a>").unwrap();
    std::fs::write(&right_path, "<a><b>y</b></a>").unwrap();

    let result = diff_files(&left_path, &right_path, &options()).unwrap();
    assert_eq!(result.len(), 1);

    std::fs::remove_file(&left_path).ok();
    std::fs::remove_file(&right_path).ok();
}

#[test]
fn whitespace_normalization_hides_layout_changes() {
    let left = "<a>\n  <b>x</b>\n</a>";
    let right = "<a><b>x</b></a>";
    let result = diff_texts(left, right, &options()).unwrap();
    assert!(result.is_empty());

    // With whitespace preserved the layout difference is real.
    let opts = DiffOptions {
        normalize: Normalize::NONE,
        ..DiffOptions::default()
    };
    let result = diff_texts(left, right, &opts).unwrap();
    assert!(!result.is_empty());
}

#[test]
fn invalid_markup_is_reported_not_diffed() {
    assert!(diff_texts("<a><b></a>", "<a/>", &options()).is_err());
    assert!(diff_texts("", "<a/>", &options()).is_err());
}
