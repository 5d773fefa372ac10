// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Segment identity within one bus tree.
//!
//! Identifiers are tree-relative: an `Interior` index only means something
//! together with the tree it was taken from. Equality is structural, which is
//! exactly what selection storage wants.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::geom::{Axis, Point, Rect};
use crate::model::ids::{LinkId, PadId};

/// Stable local index of an interior segment within its tree.
///
/// Indices are never reused while the tree lives; mutations mint fresh ones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SegmentIx(u32);

impl SegmentIx {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SegmentIx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// A position within a bus tree.
///
/// - `Interior`: a routing segment between two corners.
/// - `StartDrop`: the attachment at the source node.
/// - `EndDrop`: the attachment at one target link's landing.
/// - `Direct`: the whole tree, when it has no internal corners at all (a
///   direct tree carries exactly one link, so the marker needs no payload).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum SegmentId {
    Interior(SegmentIx),
    StartDrop,
    EndDrop(LinkId),
    Direct,
}

impl SegmentId {
    pub fn is_drop(&self) -> bool {
        matches!(self, Self::StartDrop | Self::EndDrop(_))
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interior(ix) => write!(f, "seg:{}", ix.value()),
            Self::StartDrop => f.write_str("drop:start"),
            Self::EndDrop(link) => write!(f, "drop:end:{link}"),
            Self::Direct => f.write_str("direct"),
        }
    }
}

/// One interior segment: a straight run between two corner points.
///
/// `parent == None` means the segment attaches to the tree's root drop, so its
/// start point must equal the tree's root point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeSegment {
    parent: Option<SegmentIx>,
    start: Point,
    end: Point,
}

impl TreeSegment {
    pub fn new(parent: Option<SegmentIx>, start: Point, end: Point) -> Self {
        Self { parent, start, end }
    }

    pub fn parent(&self) -> Option<SegmentIx> {
        self.parent
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    pub(crate) fn set_parent(&mut self, parent: Option<SegmentIx>) {
        self.parent = parent;
    }

    pub(crate) fn set_start(&mut self, start: Point) {
        self.start = start;
    }

    pub(crate) fn set_end(&mut self, end: Point) {
        self.end = end;
    }

    pub fn axis(&self) -> Option<Axis> {
        self.start.axis_to(self.end)
    }

    pub fn is_zero_length(&self) -> bool {
        self.start.coincident(self.end)
    }

    pub fn is_orthogonal(&self) -> bool {
        self.is_zero_length() || self.axis().is_some()
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Rectangle spanned by the run (degenerate for axis-aligned segments).
    pub fn bounds(&self) -> Rect {
        Rect::from_corners(self.start, self.end)
    }
}

/// The landing of one member link: where the tree leaves its last corner (or
/// the root, for direct trees) and reaches the target pad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeDrop {
    landing_pad: PadId,
    end_point: Point,
    attach: Option<SegmentIx>,
}

impl TreeDrop {
    pub fn new(landing_pad: PadId, end_point: Point, attach: Option<SegmentIx>) -> Self {
        Self { landing_pad, end_point, attach }
    }

    pub fn landing_pad(&self) -> PadId {
        self.landing_pad
    }

    pub fn end_point(&self) -> Point {
        self.end_point
    }

    pub fn attach(&self) -> Option<SegmentIx> {
        self.attach
    }

    pub(crate) fn set_attach(&mut self, attach: Option<SegmentIx>) {
        self.attach = attach;
    }

    pub(crate) fn set_end_point(&mut self, end_point: Point) {
        self.end_point = end_point;
    }

    pub(crate) fn set_landing_pad(&mut self, pad: PadId) {
        self.landing_pad = pad;
    }
}

#[cfg(test)]
mod tests {
    use super::{SegmentId, SegmentIx, TreeSegment};
    use crate::model::geom::{Axis, Point};
    use crate::model::ids::LinkId;

    #[test]
    fn segment_id_equality_is_structural() {
        assert_eq!(
            SegmentId::Interior(SegmentIx::new(3)),
            SegmentId::Interior(SegmentIx::new(3))
        );
        assert_ne!(SegmentId::EndDrop(LinkId::new(1)), SegmentId::EndDrop(LinkId::new(2)));
        assert_ne!(SegmentId::StartDrop, SegmentId::Direct);
    }

    #[test]
    fn segment_orthogonality() {
        let flat = TreeSegment::new(None, Point::new(0.0, 0.0), Point::new(40.0, 0.0));
        assert!(flat.is_orthogonal());
        assert_eq!(flat.axis(), Some(Axis::Horizontal));

        let diag = TreeSegment::new(None, Point::new(0.0, 0.0), Point::new(40.0, 20.0));
        assert!(!diag.is_orthogonal());
        assert_eq!(diag.axis(), None);

        let degenerate = TreeSegment::new(None, Point::new(5.0, 5.0), Point::new(5.0, 5.0));
        assert!(degenerate.is_zero_length());
        assert!(degenerate.is_orthogonal());
    }
}
