// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Shared-geometry bus trees.
//!
//! A bus tree carries every link fanning out of one source: the root is the
//! source attachment, leaves are per-link target drops, interior corners are
//! routing points. Trees live in a [`TreeArena`] and are addressed by
//! `TreeId`; link ids map to tree ids in the owning layout, never to tree
//! references (cloning a layout for undo must not alias live trees).

pub mod mutate;
pub mod segment;
pub mod segset;


use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::geom::{run_cells, GridCell, Point, Rect};
use crate::model::ids::{LinkId, NodeId, PadId, TreeId};
use segment::{SegmentId, SegmentIx, TreeDrop, TreeSegment};

pub use mutate::{SplitOutcome, TreeOpError};
pub use segset::SegmentSet;

/// One straight piece of tree geometry, used by occupancy rendering, hit
/// testing, and the repair pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryRun {
    pub id: SegmentId,
    pub start: Point,
    pub end: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusTree {
    source: NodeId,
    launch_pad: PadId,
    root_point: Point,
    segments: BTreeMap<SegmentIx, TreeSegment>,
    drops: BTreeMap<LinkId, TreeDrop>,
    next_ix: u32,
}

impl BusTree {
    /// A direct tree: no interior corners, one link straight to its target.
    pub fn new_direct(
        source: NodeId,
        launch_pad: PadId,
        root_point: Point,
        link: LinkId,
        landing_pad: PadId,
        end_point: Point,
    ) -> Self {
        let mut drops = BTreeMap::new();
        drops.insert(link, TreeDrop::new(landing_pad, end_point, None));
        Self {
            source,
            launch_pad,
            root_point,
            segments: BTreeMap::new(),
            drops,
            next_ix: 0,
        }
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn launch_pad(&self) -> PadId {
        self.launch_pad
    }

    pub fn root_point(&self) -> Point {
        self.root_point
    }

    pub(crate) fn set_root(&mut self, source: NodeId, launch_pad: PadId, root_point: Point) {
        self.source = source;
        self.launch_pad = launch_pad;
        self.root_point = root_point;
    }

    pub fn segments(&self) -> &BTreeMap<SegmentIx, TreeSegment> {
        &self.segments
    }

    pub fn drops(&self) -> &BTreeMap<LinkId, TreeDrop> {
        &self.drops
    }

    pub fn segment(&self, ix: SegmentIx) -> Option<&TreeSegment> {
        self.segments.get(&ix)
    }

    pub(crate) fn segment_mut(&mut self, ix: SegmentIx) -> Option<&mut TreeSegment> {
        self.segments.get_mut(&ix)
    }

    pub fn drop_for(&self, link: LinkId) -> Option<&TreeDrop> {
        self.drops.get(&link)
    }

    pub(crate) fn drop_mut(&mut self, link: LinkId) -> Option<&mut TreeDrop> {
        self.drops.get_mut(&link)
    }

    pub fn links(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.drops.keys().copied()
    }

    pub fn link_count(&self) -> usize {
        self.drops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drops.is_empty()
    }

    /// Zero interior segments. Valid only with exactly one drop.
    pub fn is_direct(&self) -> bool {
        self.segments.is_empty()
    }

    pub(crate) fn add_segment(
        &mut self,
        parent: Option<SegmentIx>,
        start: Point,
        end: Point,
    ) -> SegmentIx {
        let ix = SegmentIx::new(self.next_ix);
        self.next_ix += 1;
        self.segments.insert(ix, TreeSegment::new(parent, start, end));
        ix
    }

    pub(crate) fn insert_drop(&mut self, link: LinkId, drop: TreeDrop) {
        self.drops.insert(link, drop);
    }

    pub(crate) fn remove_drop(&mut self, link: LinkId) -> Option<TreeDrop> {
        self.drops.remove(&link)
    }

    pub(crate) fn remove_segment_raw(&mut self, ix: SegmentIx) -> Option<TreeSegment> {
        self.segments.remove(&ix)
    }

    /// Direct children of `parent` (`None` = children of the root drop).
    pub fn children_of(&self, parent: Option<SegmentIx>) -> Vec<SegmentIx> {
        self.segments
            .iter()
            .filter_map(|(ix, seg)| (seg.parent() == parent).then_some(*ix))
            .collect()
    }

    /// Drops whose attachment is `attach`.
    pub fn drops_on(&self, attach: Option<SegmentIx>) -> Vec<LinkId> {
        self.drops
            .iter()
            .filter_map(|(link, drop)| (drop.attach() == attach).then_some(*link))
            .collect()
    }

    /// Root-distance of a segment (root children are depth 0).
    ///
    /// Panics on an unknown index: segment identities are tree-relative and
    /// passing a foreign one is a caller bug.
    pub fn depth_of(&self, ix: SegmentIx) -> usize {
        let mut depth = 0;
        let mut cursor = self.segments.get(&ix).expect("segment belongs to this tree");
        while let Some(parent) = cursor.parent() {
            depth += 1;
            cursor = self.segments.get(&parent).expect("parent segment exists");
        }
        depth
    }

    /// The subtree rooted at `ix`, including `ix` itself.
    pub fn descendants(&self, ix: SegmentIx) -> BTreeSet<SegmentIx> {
        let mut result = BTreeSet::new();
        let mut frontier = vec![ix];
        while let Some(current) = frontier.pop() {
            if !result.insert(current) {
                continue;
            }
            frontier.extend(self.children_of(Some(current)));
        }
        result
    }

    pub fn is_descendant(&self, candidate: SegmentIx, of: SegmentIx) -> bool {
        self.descendants(of).contains(&candidate)
    }

    /// The point where a segment identity attaches to the tree.
    pub fn attach_point(&self, id: SegmentId) -> Option<Point> {
        match id {
            SegmentId::Interior(ix) => self.segments.get(&ix).map(|seg| seg.end()),
            SegmentId::StartDrop | SegmentId::Direct => Some(self.root_point),
            SegmentId::EndDrop(link) => {
                let drop = self.drops.get(&link)?;
                match drop.attach() {
                    Some(ix) => self.segments.get(&ix).map(|seg| seg.end()),
                    None => Some(self.root_point),
                }
            }
        }
    }

    /// Every straight run of the tree: interior segments first (sorted by
    /// index), then end drops (sorted by link), then the direct marker run for
    /// direct trees. Deterministic order keeps hit testing reproducible.
    pub fn geometry(&self) -> Vec<GeometryRun> {
        let mut runs = Vec::with_capacity(self.segments.len() + self.drops.len());
        if self.is_direct() {
            for drop in self.drops.values() {
                runs.push(GeometryRun {
                    id: SegmentId::Direct,
                    start: self.root_point,
                    end: drop.end_point(),
                });
            }
            return runs;
        }
        for (ix, seg) in &self.segments {
            runs.push(GeometryRun { id: SegmentId::Interior(*ix), start: seg.start(), end: seg.end() });
        }
        for (link, drop) in &self.drops {
            let start = match drop.attach() {
                Some(ix) => self
                    .segments
                    .get(&ix)
                    .expect("drop attaches to existing segment")
                    .end(),
                None => self.root_point,
            };
            runs.push(GeometryRun { id: SegmentId::EndDrop(*link), start, end: drop.end_point() });
        }
        runs
    }

    /// Grid cells covered by the tree's trace.
    pub fn trace_cells(&self) -> BTreeSet<GridCell> {
        let mut cells = BTreeSet::new();
        for run in self.geometry() {
            cells.extend(run_cells(run.start, run.end));
        }
        cells
    }

    /// Bounding rectangle of one named run, `None` when the identity does not
    /// resolve on this tree.
    pub fn run_bounds(&self, id: SegmentId) -> Option<Rect> {
        match id {
            SegmentId::Interior(ix) => {
                let seg = self.segments.get(&ix)?;
                Some(Rect::from_corners(seg.start(), seg.end()))
            }
            SegmentId::StartDrop => Some(Rect::from_corners(self.root_point, self.root_point)),
            SegmentId::EndDrop(link) => {
                let drop = self.drops.get(&link)?;
                let start = self.attach_point(id)?;
                Some(Rect::from_corners(start, drop.end_point()))
            }
            SegmentId::Direct => {
                if !self.is_direct() {
                    return None;
                }
                let drop = self.drops.values().next()?;
                Some(Rect::from_corners(self.root_point, drop.end_point()))
            }
        }
    }

    /// Bounding rectangle of all tree geometry.
    pub fn bounds(&self) -> Option<Rect> {
        let mut bounds: Option<Rect> = None;
        for run in self.geometry() {
            let run_bounds = Rect::from_corners(run.start, run.end);
            bounds = Some(match bounds {
                Some(b) => b.union(&run_bounds),
                None => run_bounds,
            });
        }
        bounds
    }

    /// Whether every run (segments and drops) is axis-aligned.
    pub fn is_fully_orthogonal(&self) -> bool {
        self.geometry()
            .iter()
            .all(|run| run.start.coincident(run.end) || run.start.axis_to(run.end).is_some())
    }

    /// Structural well-formedness, used by tests and debug assertions.
    ///
    /// Checks: parent indices exist and are acyclic, child starts meet parent
    /// ends, root children start at the root point, drop attachments exist,
    /// and the zero-segment form carries exactly one drop.
    pub fn validate(&self) -> Result<(), TreeInvariantError> {
        if self.is_direct() && self.drops.len() != 1 {
            return Err(TreeInvariantError::DirectWithManyLinks { links: self.drops.len() });
        }
        for (ix, seg) in &self.segments {
            match seg.parent() {
                None => {
                    if !seg.start().coincident(self.root_point) {
                        return Err(TreeInvariantError::DetachedSegment { segment: *ix });
                    }
                }
                Some(parent) => {
                    let Some(parent_seg) = self.segments.get(&parent) else {
                        return Err(TreeInvariantError::MissingParent { segment: *ix, parent });
                    };
                    if !seg.start().coincident(parent_seg.end()) {
                        return Err(TreeInvariantError::DetachedSegment { segment: *ix });
                    }
                }
            }
            // Acyclicity: walking up must terminate within segment count.
            let mut hops = 0;
            let mut cursor = Some(*ix);
            while let Some(current) = cursor {
                cursor = self.segments.get(&current).and_then(|seg| seg.parent());
                hops += 1;
                if hops > self.segments.len() {
                    return Err(TreeInvariantError::ParentCycle { segment: *ix });
                }
            }
        }
        for (link, drop) in &self.drops {
            if let Some(attach) = drop.attach() {
                if !self.segments.contains_key(&attach) {
                    return Err(TreeInvariantError::MissingAttachment { link: *link, attach });
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeInvariantError {
    DirectWithManyLinks { links: usize },
    MissingParent { segment: SegmentIx, parent: SegmentIx },
    DetachedSegment { segment: SegmentIx },
    ParentCycle { segment: SegmentIx },
    MissingAttachment { link: LinkId, attach: SegmentIx },
}

impl fmt::Display for TreeInvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectWithManyLinks { links } => {
                write!(f, "direct tree must carry exactly one link (has {links})")
            }
            Self::MissingParent { segment, parent } => {
                write!(f, "segment {segment} references missing parent {parent}")
            }
            Self::DetachedSegment { segment } => {
                write!(f, "segment {segment} does not start at its parent's end")
            }
            Self::ParentCycle { segment } => {
                write!(f, "segment {segment} sits on a parent cycle")
            }
            Self::MissingAttachment { link, attach } => {
                write!(f, "drop for link {link} references missing segment {attach}")
            }
        }
    }
}

impl std::error::Error for TreeInvariantError {}

/// All bus trees of one layout, addressed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeArena {
    trees: BTreeMap<TreeId, BusTree>,
}

impl TreeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> impl Iterator<Item = TreeId> + '_ {
        self.trees.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TreeId, &BusTree)> {
        self.trees.iter().map(|(id, tree)| (*id, tree))
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn tree(&self, id: TreeId) -> Option<&BusTree> {
        self.trees.get(&id)
    }

    pub fn tree_mut(&mut self, id: TreeId) -> Option<&mut BusTree> {
        self.trees.get_mut(&id)
    }

    pub fn insert(&mut self, id: TreeId, tree: BusTree) {
        let previous = self.trees.insert(id, tree);
        assert!(previous.is_none(), "tree id {id} already present in arena");
    }

    /// Retires a tree id, e.g. after its last member link was deleted or it
    /// was absorbed into another tree.
    pub fn remove(&mut self, id: TreeId) -> Option<BusTree> {
        self.trees.remove(&id)
    }
}
