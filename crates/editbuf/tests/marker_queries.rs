//! Marker store integration tests
//!
//! Covers anchor remapping across edits, query ordering, folds, and
//! bookmarks, all driven through the editor mutation path.

use editbuf::{Marker, MarkerAnchor, MarkerKind, TextEditor, TextSegment};

fn segment_of(marker: &Marker) -> TextSegment {
    marker.segment().unwrap()
}

#[test]
fn test_markers_survive_edits_around_them() {
    let mut editor = TextEditor::from_text("fn main() { body }");
    let id = editor.add_marker(
        MarkerAnchor::Segment(TextSegment::new(12, 4)),
        MarkerKind::Error {
            message: String::from("unused variable"),
        },
    );

    // Insertion before the marker shifts it.
    editor.insert(0, "pub ").unwrap();
    assert_eq!(segment_of(editor.markers().get(id).unwrap()), TextSegment::new(16, 4));

    // Insertion strictly inside grows it.
    editor.insert(18, "xx").unwrap();
    assert_eq!(segment_of(editor.markers().get(id).unwrap()), TextSegment::new(16, 6));

    // Deletion after it leaves it alone.
    editor.remove(TextSegment::new(23, 2)).unwrap();
    assert_eq!(segment_of(editor.markers().get(id).unwrap()), TextSegment::new(16, 6));
}

#[test]
fn test_marker_inside_deleted_range_is_dropped() {
    let mut editor = TextEditor::from_text("abcdefgh");
    let inner = editor.add_marker(
        MarkerAnchor::Segment(TextSegment::new(3, 2)),
        MarkerKind::Warning {
            message: String::from("shadowed binding"),
        },
    );
    let straddling = editor.add_marker(
        MarkerAnchor::Segment(TextSegment::new(1, 6)),
        MarkerKind::Underline,
    );

    editor.remove(TextSegment::new(2, 4)).unwrap();

    assert!(editor.markers().get(inner).is_none());
    // The straddling marker shrinks by the removed overlap.
    assert_eq!(
        segment_of(editor.markers().get(straddling).unwrap()),
        TextSegment::new(1, 2)
    );
}

#[test]
fn test_queries_return_insertion_order() {
    let mut editor = TextEditor::from_text("0123456789");
    let first = editor.add_marker(
        MarkerAnchor::Segment(TextSegment::new(2, 6)),
        MarkerKind::Link {
            url: String::from("https://example.com"),
        },
    );
    let second = editor.add_marker(
        MarkerAnchor::Segment(TextSegment::new(0, 4)),
        MarkerKind::Error {
            message: String::from("unused variable"),
        },
    );
    let third = editor.add_marker(
        MarkerAnchor::Segment(TextSegment::new(3, 1)),
        MarkerKind::GrayOut,
    );

    let at: Vec<_> = editor.markers_at(3).map(|m| m.id).collect();
    assert_eq!(at, vec![first, second, third]);

    let overlapping: Vec<_> = editor
        .markers_in(TextSegment::new(4, 3))
        .map(|m| m.id)
        .collect();
    assert_eq!(overlapping, vec![first]);
}

#[test]
fn test_remove_marker_is_idempotent() {
    let mut editor = TextEditor::from_text("abc");
    let id = editor.add_marker(
        MarkerAnchor::Segment(TextSegment::new(0, 1)),
        MarkerKind::SmartTag,
    );

    assert!(editor.remove_marker(id));
    assert!(!editor.remove_marker(id));
    assert!(editor.markers().is_empty());
}

#[test]
fn test_fold_collapse_and_queries() {
    let mut editor = TextEditor::from_text("fn a() {\n    body\n}\nfn b() {}\n");
    let fold = editor.add_marker(
        MarkerAnchor::Segment(TextSegment::new(7, 13)),
        MarkerKind::fold(),
    );
    editor.add_marker(
        MarkerAnchor::Segment(TextSegment::new(7, 13)),
        MarkerKind::Warning {
            message: String::from("shadowed binding"),
        },
    );

    // Fold queries ignore non-fold markers over the same range.
    let containing: Vec<_> = editor.foldings_containing(10).map(|m| m.id).collect();
    assert_eq!(containing, vec![fold]);
    assert_eq!(editor.foldings_in(TextSegment::new(0, 9)).count(), 1);

    assert!(editor.set_fold_collapsed(fold, true));
    match &editor.markers().get(fold).unwrap().kind {
        MarkerKind::Fold { collapsed, placeholder } => {
            assert!(*collapsed);
            assert_eq!(placeholder, "...");
        }
        other => panic!("expected fold marker, got {other:?}"),
    }

    // Collapsing a non-fold marker reports failure.
    let warning = editor
        .markers_at(8)
        .find(|m| !m.kind.is_fold())
        .map(|m| m.id)
        .unwrap();
    assert!(!editor.set_fold_collapsed(warning, false));
}

#[test]
fn test_bookmarks_follow_line_insertions_and_removals() {
    let mut editor = TextEditor::from_text("one\ntwo\nthree\n");
    editor.set_bookmarked(2, true);
    assert!(editor.is_bookmarked(2));

    // A new line above pushes the bookmark down.
    editor.insert(0, "zero\n").unwrap();
    assert!(!editor.is_bookmarked(2));
    assert!(editor.is_bookmarked(3));

    // Removing that line pulls it back.
    editor.remove(TextSegment::new(0, 5)).unwrap();
    assert!(editor.is_bookmarked(2));

    // Deleting the bookmarked line's text leaves the bookmark on the line
    // that takes its place.
    let line = editor.get_line(2).unwrap();
    editor
        .remove(TextSegment::new(line.offset, line.length + line.delimiter_length))
        .unwrap();
    assert_eq!(editor.get_line(2).unwrap().length, 5);
    assert!(editor.is_bookmarked(2));
    assert!(!editor.is_bookmarked(3));
}

#[test]
#[should_panic(expected = "cannot be attached")]
fn test_line_kind_on_segment_anchor_panics() {
    let mut editor = TextEditor::from_text("abc");
    editor.add_marker(
        MarkerAnchor::Segment(TextSegment::new(0, 1)),
        MarkerKind::Bookmark,
    );
}
