// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Intersection resolution: pointer coordinates to model elements.
//!
//! Hit-test order is significant and fixed: collapsed regions first (they
//! mask their contents and short-circuit everything else), then optionally
//! nodes, then overlay modules, then links (one hit per shared tree), then
//! remaining nodes, then free notes. Results are [`Intersection`] values, the
//! unit both of hit-testing output and of the stored selection.

pub mod state;


use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::model::facts::{NetworkFacts, ShapeFacts};
use crate::model::geom::{Point, Rect, GRID_UNIT};
use crate::model::ids::{ModuleId, NodeId, NoteId, PadId, RegionId, TreeId};
use crate::model::layout::Layout;
use crate::tree::SegmentSet;

pub use state::SelectionSet;

/// Identity of a selectable layout object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ObjectKey {
    Region(RegionId),
    Node(NodeId),
    Module(ModuleId),
    Tree(TreeId),
    Note(NoteId),
}

/// A sub-group label attached to an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelRef {
    Region(RegionId),
    Module(ModuleId),
}

/// The part of an object a hit resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubIdentity {
    /// Tree segments under the pointer; the mergeable case.
    Segments(SegmentSet),
    /// Connection-point candidates on a node, nearest first.
    Pads(SmallVec<[PadId; 4]>),
    /// An explicit label; labels never participate in merging.
    Label(LabelRef),
}

/// One hit-test result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intersection {
    pub object: ObjectKey,
    pub sub: Option<SubIdentity>,
    /// Pointer distance to the hit geometry, for tie-breaking.
    pub distance: f64,
    /// Whether two intersections on this object combine via segment-set
    /// algebra instead of replacing each other.
    pub can_merge: bool,
}

impl Intersection {
    pub fn plain(object: ObjectKey, distance: f64) -> Self {
        Self { object, sub: None, distance, can_merge: false }
    }

    pub fn segments(set: SegmentSet, distance: f64) -> Self {
        Self {
            object: ObjectKey::Tree(set.tree()),
            sub: Some(SubIdentity::Segments(set)),
            distance,
            can_merge: true,
        }
    }

    pub fn is_label(&self) -> bool {
        matches!(self.sub, Some(SubIdentity::Label(_)))
    }

    pub fn segment_set(&self) -> Option<&SegmentSet> {
        match &self.sub {
            Some(SubIdentity::Segments(set)) => Some(set),
            _ => None,
        }
    }
}

/// How the opaque overlay masks hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskingLevel {
    /// Everything is clickable.
    #[default]
    None,
    /// Only members of explicitly revealed modules are clickable.
    RevealedOnly,
    /// Only members of the currently shown module set are clickable.
    ShownMembersOnly,
}

/// Resolves points and marquee rectangles against one layout.
pub struct HitTester<'a> {
    layout: &'a Layout,
    network: &'a dyn NetworkFacts,
    shapes: &'a dyn ShapeFacts,
    masking: MaskingLevel,
    revealed: BTreeSet<ModuleId>,
    shown: BTreeSet<ModuleId>,
    nodes_first: bool,
    tolerance: f64,
}

impl<'a> HitTester<'a> {
    pub fn new(
        layout: &'a Layout,
        network: &'a dyn NetworkFacts,
        shapes: &'a dyn ShapeFacts,
    ) -> Self {
        Self {
            layout,
            network,
            shapes,
            masking: MaskingLevel::None,
            revealed: BTreeSet::new(),
            shown: BTreeSet::new(),
            nodes_first: false,
            tolerance: GRID_UNIT / 2.0,
        }
    }

    pub fn with_masking(
        mut self,
        masking: MaskingLevel,
        revealed: BTreeSet<ModuleId>,
        shown: BTreeSet<ModuleId>,
    ) -> Self {
        self.masking = masking;
        self.revealed = revealed;
        self.shown = shown;
        self
    }

    /// Test nodes before modules and links (pad picking during link drawing).
    pub fn nodes_first(mut self, nodes_first: bool) -> Self {
        self.nodes_first = nodes_first;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Nodes exempt from the opacity mask, per the active masking level.
    fn unmasked_nodes(&self) -> BTreeSet<NodeId> {
        let active = match self.masking {
            MaskingLevel::None => return BTreeSet::new(),
            MaskingLevel::RevealedOnly => &self.revealed,
            MaskingLevel::ShownMembersOnly => &self.shown,
        };
        active
            .iter()
            .flat_map(|module| self.network.module_members(*module))
            .collect()
    }

    fn node_masked(&self, node: NodeId, unmasked: &BTreeSet<NodeId>, selected: &SelectionSet) -> bool {
        if self.masking == MaskingLevel::None {
            return false;
        }
        // Selected elements stay clickable under any mask, so they can be
        // deselected.
        if selected.contains(&ObjectKey::Node(node)) {
            return false;
        }
        !unmasked.contains(&node)
    }

    fn tree_masked(
        &self,
        tree_id: TreeId,
        unmasked: &BTreeSet<NodeId>,
        selected: &SelectionSet,
    ) -> bool {
        if self.masking == MaskingLevel::None {
            return false;
        }
        if selected.contains(&ObjectKey::Tree(tree_id)) {
            return false;
        }
        let Some(tree) = self.layout.trees().tree(tree_id) else {
            return true;
        };
        // A tree is clickable if any endpoint of a member link is.
        if unmasked.contains(&tree.source()) {
            return false;
        }
        !tree.links().any(|link| unmasked.contains(&self.network.link_target(link)))
    }

    /// Resolves a point to the topmost intersection, or `None` on empty space.
    pub fn hit(&self, point: Point, selected: &SelectionSet) -> Option<Intersection> {
        let unmasked = self.unmasked_nodes();

        // Collapsed regions swallow everything inside them.
        for region in self.network.collapsed_regions() {
            if let Some(bounds) = self.shapes.region_bounds(region) {
                if bounds.contains(point) {
                    return Some(Intersection::plain(
                        ObjectKey::Region(region),
                        point.distance(bounds.center()),
                    ));
                }
            }
        }

        if self.nodes_first {
            if let Some(hit) = self.hit_node(point, &unmasked, selected) {
                return Some(hit);
            }
        }

        if let Some(hit) = self.hit_module(point) {
            return Some(hit);
        }

        if let Some(hit) = self.hit_link(point, &unmasked, selected) {
            return Some(hit);
        }

        if !self.nodes_first {
            if let Some(hit) = self.hit_node(point, &unmasked, selected) {
                return Some(hit);
            }
        }

        self.hit_note(point, selected)
    }

    fn hit_node(
        &self,
        point: Point,
        unmasked: &BTreeSet<NodeId>,
        selected: &SelectionSet,
    ) -> Option<Intersection> {
        let mut best: Option<Intersection> = None;
        for node in self.layout.node_positions().keys() {
            if self.node_masked(*node, unmasked, selected) {
                continue;
            }
            let bounds = self.shapes.node_bounds(*node);
            if !bounds.contains(point) {
                continue;
            }
            let distance = point.distance(bounds.center());
            if best.as_ref().map_or(true, |hit| distance < hit.distance) {
                let pads = self.shapes.pad_candidates(*node, point);
                best = Some(Intersection {
                    object: ObjectKey::Node(*node),
                    sub: Some(SubIdentity::Pads(pads)),
                    distance,
                    can_merge: false,
                });
            }
        }
        best
    }

    fn hit_module(&self, point: Point) -> Option<Intersection> {
        let opaque = self.masking != MaskingLevel::None;
        for (module, shape) in self.layout.modules() {
            if point.distance(shape.name_point()) <= self.tolerance {
                return Some(Intersection {
                    object: ObjectKey::Module(*module),
                    sub: Some(SubIdentity::Label(LabelRef::Module(*module))),
                    distance: point.distance(shape.name_point()),
                    can_merge: false,
                });
            }
            if shape.bounds().on_boundary(point, self.tolerance) {
                return Some(Intersection::plain(ObjectKey::Module(*module), 0.0));
            }
            // The interior is only a hit when the opaque overlay is active;
            // otherwise clicks fall through to the content underneath.
            if opaque && shape.bounds().contains(point) {
                return Some(Intersection::plain(
                    ObjectKey::Module(*module),
                    point.distance(shape.bounds().center()),
                ));
            }
        }
        None
    }

    /// One hit per tree, however many logical links run through the clicked
    /// segment.
    fn hit_link(
        &self,
        point: Point,
        unmasked: &BTreeSet<NodeId>,
        selected: &SelectionSet,
    ) -> Option<Intersection> {
        let mut best: Option<Intersection> = None;
        for (tree_id, tree) in self.layout.trees().iter() {
            if self.tree_masked(tree_id, unmasked, selected) {
                continue;
            }
            let mut closest: Option<(f64, SegmentSet)> = None;
            for run in tree.geometry() {
                let distance = point.distance_to_segment(run.start, run.end);
                if distance > self.tolerance {
                    continue;
                }
                if closest.as_ref().map_or(true, |(d, _)| distance < *d) {
                    closest = Some((distance, SegmentSet::single(tree_id, run.id)));
                }
            }
            if let Some((distance, set)) = closest {
                if best.as_ref().map_or(true, |hit| distance < hit.distance) {
                    best = Some(Intersection::segments(set, distance));
                }
            }
        }
        best
    }

    fn hit_note(&self, point: Point, selected: &SelectionSet) -> Option<Intersection> {
        for (note, position) in self.layout.notes() {
            if self.masking != MaskingLevel::None && !selected.contains(&ObjectKey::Note(*note)) {
                continue;
            }
            let distance = point.distance(*position);
            if distance <= self.tolerance {
                return Some(Intersection::plain(ObjectKey::Note(*note), distance));
            }
        }
        None
    }

    /// Everything inside a marquee rectangle: nodes whose footprint the rect
    /// contains, plus one intersection per tree with every contained run.
    pub fn marquee(&self, rect: Rect, selected: &SelectionSet) -> Vec<Intersection> {
        let unmasked = self.unmasked_nodes();
        let mut hits = Vec::new();

        for node in self.layout.node_positions().keys() {
            if self.node_masked(*node, &unmasked, selected) {
                continue;
            }
            if rect.contains_rect(&self.shapes.node_bounds(*node)) {
                hits.push(Intersection::plain(ObjectKey::Node(*node), 0.0));
            }
        }

        for (tree_id, tree) in self.layout.trees().iter() {
            if self.tree_masked(tree_id, &unmasked, selected) {
                continue;
            }
            let mut set = SegmentSet::new(tree_id);
            for run in tree.geometry() {
                if rect.contains(run.start) && rect.contains(run.end) {
                    set.insert(run.id);
                }
            }
            if !set.is_empty() {
                hits.push(Intersection::segments(set, 0.0));
            }
        }

        hits
    }
}
