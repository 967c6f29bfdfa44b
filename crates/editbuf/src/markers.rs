//! Text segment and line marker store.
//!
//! Markers are decorative/semantic annotations attached either to an offset
//! range (bracket matches, errors, links, folds, underline effects) or to a
//! whole line (bookmarks). The store owns every marker, keeps insertion
//! order for queries, and remaps marker ranges across edits. It holds no
//! rendering logic; the hosting editor emits a redraw request after each
//! add/remove.

use crate::segment::TextSegment;

/// Opaque handle for a marker owned by a [`MarkerStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(u64);

impl MarkerId {
    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// What a marker is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerAnchor {
    /// An offset range in the document.
    Segment(TextSegment),
    /// A whole line, by 1-based line number.
    Line(usize),
}

/// The anchor class a marker kind requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorClass {
    /// Must be attached to an offset range.
    Segment,
    /// Must be attached to a line.
    Line,
}

/// The concrete capability/appearance variants a marker can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerKind {
    /// Matching-bracket highlight.
    BracketMatch,
    /// Error annotation (squiggle/gutter in the host).
    Error {
        /// Human-readable message.
        message: String,
    },
    /// Warning annotation.
    Warning {
        /// Human-readable message.
        message: String,
    },
    /// Clickable URL link.
    Link {
        /// Link target.
        url: String,
    },
    /// Smart-tag anchor (host shows a popup affordance).
    SmartTag,
    /// Foldable region.
    Fold {
        /// Placeholder text shown while collapsed (e.g. `"..."`).
        placeholder: String,
        /// Whether the region is currently collapsed.
        collapsed: bool,
    },
    /// Generic underline effect.
    Underline,
    /// Generic gray-out/dim effect.
    GrayOut,
    /// Line bookmark.
    Bookmark,
}

impl MarkerKind {
    /// A fold region with the default placeholder, initially expanded.
    pub fn fold() -> Self {
        Self::Fold {
            placeholder: String::from("..."),
            collapsed: false,
        }
    }

    /// The anchor class this kind requires. `Bookmark` is line-attached;
    /// every other kind addresses an offset range.
    pub fn anchor_class(&self) -> AnchorClass {
        match self {
            Self::Bookmark => AnchorClass::Line,
            _ => AnchorClass::Segment,
        }
    }

    /// Whether this is a fold marker.
    pub fn is_fold(&self) -> bool {
        matches!(self, Self::Fold { .. })
    }
}

/// A single marker: id, anchor, and kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Store-assigned handle.
    pub id: MarkerId,
    /// Where the marker is attached.
    pub anchor: MarkerAnchor,
    /// Concrete variant.
    pub kind: MarkerKind,
}

impl Marker {
    /// The marker's segment, for segment-anchored markers.
    pub fn segment(&self) -> Option<TextSegment> {
        match self.anchor {
            MarkerAnchor::Segment(segment) => Some(segment),
            MarkerAnchor::Line(_) => None,
        }
    }

    /// The marker's line number, for line-anchored markers.
    pub fn line(&self) -> Option<usize> {
        match self.anchor {
            MarkerAnchor::Segment(_) => None,
            MarkerAnchor::Line(line) => Some(line),
        }
    }
}

/// Owns all markers of one document, in insertion order.
///
/// Queries return lazy iterators in insertion order; callers filter by kind.
/// Remapping across edits follows standard splice semantics: markers before
/// the edit keep their offsets, markers after shift by the net delta, and a
/// marker whose range is entirely destroyed by a deletion is dropped.
pub struct MarkerStore {
    markers: Vec<Marker>,
    next_id: u64,
}

impl MarkerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            markers: Vec::new(),
            next_id: 0,
        }
    }

    /// Add a marker, returning its handle.
    ///
    /// # Panics
    ///
    /// Panics when the kind's required anchor class does not match the
    /// supplied anchor (a line kind on a segment or vice versa). This is a
    /// caller bug, checked at this boundary, not inside queries.
    pub fn add(&mut self, anchor: MarkerAnchor, kind: MarkerKind) -> MarkerId {
        let compatible = matches!(
            (kind.anchor_class(), &anchor),
            (AnchorClass::Segment, MarkerAnchor::Segment(_))
                | (AnchorClass::Line, MarkerAnchor::Line(_))
        );
        assert!(
            compatible,
            "marker kind {kind:?} cannot be attached to {anchor:?}"
        );

        let id = MarkerId(self.next_id);
        self.next_id += 1;
        self.markers.push(Marker { id, anchor, kind });
        id
    }

    /// Remove a marker by handle. Idempotent: returns `false` (and leaves
    /// the store unchanged) when the marker is not present.
    pub fn remove(&mut self, id: MarkerId) -> bool {
        if let Some(pos) = self.markers.iter().position(|m| m.id == id) {
            self.markers.remove(pos);
            true
        } else {
            false
        }
    }

    /// Look up a marker by handle.
    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    /// Number of markers in the store.
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Whether the store holds no markers.
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Drop all markers.
    pub fn clear(&mut self) {
        self.markers.clear();
    }

    /// All markers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    /// Segment markers whose range contains `offset`, in insertion order.
    pub fn markers_at(&self, offset: usize) -> impl Iterator<Item = &Marker> {
        self.markers
            .iter()
            .filter(move |m| m.segment().is_some_and(|s| s.contains(offset)))
    }

    /// Segment markers whose range overlaps `segment`, in insertion order.
    pub fn markers_in(&self, segment: TextSegment) -> impl Iterator<Item = &Marker> {
        self.markers
            .iter()
            .filter(move |m| m.segment().is_some_and(|s| s.overlaps(&segment)))
    }

    /// Line markers attached to the given 1-based line, in insertion order.
    pub fn markers_on_line(&self, line: usize) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(move |m| m.line() == Some(line))
    }

    /// All fold markers, in insertion order.
    pub fn foldings(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(|m| m.kind.is_fold())
    }

    /// Fold markers whose range contains `offset`.
    pub fn foldings_containing(&self, offset: usize) -> impl Iterator<Item = &Marker> {
        self.markers_at(offset).filter(|m| m.kind.is_fold())
    }

    /// Fold markers whose range overlaps `segment`.
    pub fn foldings_in(&self, segment: TextSegment) -> impl Iterator<Item = &Marker> {
        self.markers_in(segment).filter(|m| m.kind.is_fold())
    }

    /// Collapse or expand a fold marker. Returns `false` when `id` does not
    /// refer to a fold marker in the store.
    pub fn set_fold_collapsed(&mut self, id: MarkerId, value: bool) -> bool {
        for marker in &mut self.markers {
            if marker.id == id {
                if let MarkerKind::Fold { collapsed, .. } = &mut marker.kind {
                    *collapsed = value;
                    return true;
                }
                return false;
            }
        }
        false
    }

    /// Whether the given line carries a bookmark marker.
    pub fn is_bookmarked(&self, line: usize) -> bool {
        self.markers_on_line(line)
            .any(|m| matches!(m.kind, MarkerKind::Bookmark))
    }

    /// Set or clear the bookmark flag on a line.
    pub fn set_bookmarked(&mut self, line: usize, value: bool) {
        if value {
            if !self.is_bookmarked(line) {
                self.add(MarkerAnchor::Line(line), MarkerKind::Bookmark);
            }
        } else {
            self.markers.retain(|m| {
                !(m.line() == Some(line) && matches!(m.kind, MarkerKind::Bookmark))
            });
        }
    }

    /// Remap markers for an insertion of `length` chars at `offset`.
    ///
    /// Segment markers anchored at `>= offset` shift by `+length`; a marker
    /// spanning the insertion point grows; markers strictly before are
    /// unchanged. Line markers below the edited line shift by the number of
    /// inserted line breaks.
    pub fn update_for_insertion(
        &mut self,
        offset: usize,
        length: usize,
        edit_line: usize,
        inserted_line_breaks: usize,
    ) {
        if length == 0 {
            return;
        }
        for marker in &mut self.markers {
            match &mut marker.anchor {
                MarkerAnchor::Segment(segment) => {
                    if segment.offset >= offset {
                        segment.offset += length;
                    } else if segment.end_offset() > offset {
                        segment.length += length;
                    }
                }
                MarkerAnchor::Line(line) => {
                    if inserted_line_breaks > 0 && *line > edit_line {
                        *line += inserted_line_breaks;
                    }
                }
            }
        }
    }

    /// Remap markers for a deletion of the chars covered by `removed`.
    ///
    /// Markers after the range shift back; markers whose range is entirely
    /// inside the deletion are dropped; straddling markers shrink. Line
    /// markers on lines merged away by the deletion are dropped, and lines
    /// below shift up by the number of removed line breaks.
    pub fn update_for_deletion(
        &mut self,
        removed: TextSegment,
        edit_line: usize,
        removed_line_breaks: usize,
    ) {
        if removed.is_empty() {
            return;
        }
        let (start, end) = (removed.offset, removed.end_offset());
        let delta = removed.length;

        self.markers.retain_mut(|marker| match &mut marker.anchor {
            MarkerAnchor::Segment(segment) => {
                let (s, e) = (segment.offset, segment.end_offset());
                if e <= start {
                    // Entirely before the deletion.
                } else if s >= end {
                    segment.offset -= delta;
                } else if s >= start && e <= end {
                    // Entirely destroyed by the deletion.
                    return false;
                } else if s < start && e > end {
                    segment.length -= delta;
                } else if s < start {
                    segment.length = start - s;
                } else {
                    segment.offset = start;
                    segment.length = e - end;
                }
                true
            }
            MarkerAnchor::Line(line) => {
                if removed_line_breaks == 0 || *line <= edit_line {
                    true
                } else if *line <= edit_line + removed_line_breaks {
                    // The line was merged into the edit line.
                    false
                } else {
                    *line -= removed_line_breaks;
                    true
                }
            }
        });
    }
}

impl Default for MarkerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment_anchor(offset: usize, length: usize) -> MarkerAnchor {
        MarkerAnchor::Segment(TextSegment::new(offset, length))
    }

    #[test]
    fn test_overlapping_markers_in_insertion_order() {
        let mut store = MarkerStore::new();
        let m1 = store.add(segment_anchor(0, 5), MarkerKind::Underline);
        let m2 = store.add(segment_anchor(3, 5), MarkerKind::BracketMatch);

        let at: Vec<MarkerId> = store.markers_at(4).map(|m| m.id).collect();
        assert_eq!(at, vec![m1, m2]);

        let at: Vec<MarkerId> = store.markers_at(6).map(|m| m.id).collect();
        assert_eq!(at, vec![m2]);
    }

    #[test]
    fn test_markers_in_range() {
        let mut store = MarkerStore::new();
        let m1 = store.add(segment_anchor(0, 5), MarkerKind::Underline);
        store.add(segment_anchor(20, 5), MarkerKind::Underline);

        let hits: Vec<MarkerId> = store
            .markers_in(TextSegment::new(4, 10))
            .map(|m| m.id)
            .collect();
        assert_eq!(hits, vec![m1]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = MarkerStore::new();
        let id = store.add(segment_anchor(0, 3), MarkerKind::SmartTag);

        assert!(store.remove(id));
        assert!(!store.remove(id));
        assert!(store.is_empty());
    }

    #[test]
    #[should_panic(expected = "cannot be attached")]
    fn test_bookmark_on_segment_is_usage_error() {
        let mut store = MarkerStore::new();
        store.add(segment_anchor(0, 3), MarkerKind::Bookmark);
    }

    #[test]
    #[should_panic(expected = "cannot be attached")]
    fn test_fold_on_line_is_usage_error() {
        let mut store = MarkerStore::new();
        store.add(MarkerAnchor::Line(1), MarkerKind::fold());
    }

    #[test]
    fn test_fold_queries_restrict_to_folds() {
        let mut store = MarkerStore::new();
        store.add(segment_anchor(0, 10), MarkerKind::Underline);
        let fold = store.add(segment_anchor(2, 6), MarkerKind::fold());

        let hits: Vec<MarkerId> = store.foldings_containing(3).map(|m| m.id).collect();
        assert_eq!(hits, vec![fold]);

        let hits: Vec<MarkerId> = store
            .foldings_in(TextSegment::new(0, 4))
            .map(|m| m.id)
            .collect();
        assert_eq!(hits, vec![fold]);
    }

    #[test]
    fn test_set_fold_collapsed() {
        let mut store = MarkerStore::new();
        let underline = store.add(segment_anchor(0, 3), MarkerKind::Underline);
        let fold = store.add(segment_anchor(0, 3), MarkerKind::fold());

        assert!(store.set_fold_collapsed(fold, true));
        assert!(matches!(
            store.get(fold).unwrap().kind,
            MarkerKind::Fold { collapsed: true, .. }
        ));

        assert!(!store.set_fold_collapsed(underline, true));
    }

    #[test]
    fn test_bookmarks() {
        let mut store = MarkerStore::new();
        assert!(!store.is_bookmarked(2));

        store.set_bookmarked(2, true);
        assert!(store.is_bookmarked(2));

        // Setting again does not duplicate.
        store.set_bookmarked(2, true);
        assert_eq!(store.markers_on_line(2).count(), 1);

        store.set_bookmarked(2, false);
        assert!(!store.is_bookmarked(2));
    }

    #[test]
    fn test_insertion_shifts_markers() {
        let mut store = MarkerStore::new();
        let before = store.add(segment_anchor(0, 3), MarkerKind::Underline);
        let spanning = store.add(segment_anchor(4, 4), MarkerKind::Underline);
        let after = store.add(segment_anchor(10, 3), MarkerKind::Underline);

        store.update_for_insertion(5, 2, 1, 0);

        assert_eq!(store.get(before).unwrap().segment().unwrap(), TextSegment::new(0, 3));
        assert_eq!(store.get(spanning).unwrap().segment().unwrap(), TextSegment::new(4, 6));
        assert_eq!(store.get(after).unwrap().segment().unwrap(), TextSegment::new(12, 3));
    }

    #[test]
    fn test_deletion_drops_destroyed_markers() {
        let mut store = MarkerStore::new();
        let before = store.add(segment_anchor(0, 3), MarkerKind::Underline);
        let inside = store.add(segment_anchor(6, 2), MarkerKind::Underline);
        let straddle = store.add(segment_anchor(4, 8), MarkerKind::Underline);
        let after = store.add(segment_anchor(15, 3), MarkerKind::Underline);

        store.update_for_deletion(TextSegment::new(5, 5), 1, 0);

        assert_eq!(store.get(before).unwrap().segment().unwrap(), TextSegment::new(0, 3));
        assert!(store.get(inside).is_none());
        assert_eq!(store.get(straddle).unwrap().segment().unwrap(), TextSegment::new(4, 3));
        assert_eq!(store.get(after).unwrap().segment().unwrap(), TextSegment::new(10, 3));
    }

    #[test]
    fn test_line_markers_follow_line_delta() {
        let mut store = MarkerStore::new();
        store.set_bookmarked(3, true);

        // One line break inserted on line 1 pushes the bookmark down.
        store.update_for_insertion(0, 1, 1, 1);
        assert!(store.is_bookmarked(4));

        // Deleting that break pulls it back up.
        store.update_for_deletion(TextSegment::new(0, 1), 1, 1);
        assert!(store.is_bookmarked(3));
    }

    #[test]
    fn test_line_marker_on_merged_line_is_dropped() {
        let mut store = MarkerStore::new();
        store.set_bookmarked(2, true);

        // A deletion on line 1 that removes one line break merges line 2 away.
        store.update_for_deletion(TextSegment::new(0, 4), 1, 1);
        assert!(!store.is_bookmarked(1));
        assert!(!store.is_bookmarked(2));
        assert!(store.is_empty());
    }
}
