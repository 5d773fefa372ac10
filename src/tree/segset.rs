// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Segment sets: the mergeable sub-selection unit.
//!
//! A segment set is scoped to one tree; combining sets from different trees is
//! a caller bug, not a recoverable condition. `merge`, `intersect` and
//! `intersect_complement` are the primitives behind multi-click and
//! shift-click selection.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::segment::SegmentId;
use super::BusTree;
use crate::model::ids::TreeId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSet {
    tree: TreeId,
    members: BTreeSet<SegmentId>,
}

impl SegmentSet {
    pub fn new(tree: TreeId) -> Self {
        Self { tree, members: BTreeSet::new() }
    }

    pub fn single(tree: TreeId, member: SegmentId) -> Self {
        let mut members = BTreeSet::new();
        members.insert(member);
        Self { tree, members }
    }

    pub fn from_members(tree: TreeId, members: impl IntoIterator<Item = SegmentId>) -> Self {
        Self { tree, members: members.into_iter().collect() }
    }

    /// Every segment and end drop of `tree`, each exactly once; the start
    /// drop only when `include_root_drop` is set. Selecting "the whole link"
    /// differs from selecting "the whole tree including the shared trunk",
    /// hence the asymmetry.
    pub fn full_intersection(tree_id: TreeId, tree: &BusTree, include_root_drop: bool) -> Self {
        let mut members = BTreeSet::new();
        if tree.is_direct() {
            members.insert(SegmentId::Direct);
            return Self { tree: tree_id, members };
        }
        for ix in tree.segments().keys() {
            members.insert(SegmentId::Interior(*ix));
        }
        for link in tree.links() {
            members.insert(SegmentId::EndDrop(link));
        }
        if include_root_drop {
            members.insert(SegmentId::StartDrop);
        }
        Self { tree: tree_id, members }
    }

    pub fn tree(&self) -> TreeId {
        self.tree
    }

    pub fn members(&self) -> &BTreeSet<SegmentId> {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.members.contains(&id)
    }

    pub fn insert(&mut self, id: SegmentId) -> bool {
        self.members.insert(id)
    }

    fn assert_same_tree(&self, other: &SegmentSet) {
        assert_eq!(
            self.tree, other.tree,
            "segment sets belong to different trees ({} vs {})",
            self.tree, other.tree
        );
    }

    /// Union.
    pub fn merge(&self, other: &SegmentSet) -> SegmentSet {
        self.assert_same_tree(other);
        SegmentSet {
            tree: self.tree,
            members: self.members.union(&other.members).copied().collect(),
        }
    }

    /// Set intersection.
    pub fn intersect(&self, other: &SegmentSet) -> SegmentSet {
        self.assert_same_tree(other);
        SegmentSet {
            tree: self.tree,
            members: self.members.intersection(&other.members).copied().collect(),
        }
    }

    /// Members present in exactly one of the two sets.
    ///
    /// Re-clicking a point whose current selection partially overlaps the new
    /// hit inverts the shared portion; this is that inversion.
    pub fn intersect_complement(&self, other: &SegmentSet) -> SegmentSet {
        self.assert_same_tree(other);
        SegmentSet {
            tree: self.tree,
            members: self
                .members
                .symmetric_difference(&other.members)
                .copied()
                .collect(),
        }
    }

    /// Whether the two sets share at least one member.
    pub fn overlaps(&self, other: &SegmentSet) -> bool {
        self.assert_same_tree(other);
        self.members.intersection(&other.members).next().is_some()
    }

    /// Drops members that no longer exist on `tree` (after repair or
    /// compression rewrote segment indices).
    pub fn retain_valid(&mut self, tree: &BusTree) {
        self.members.retain(|member| match member {
            SegmentId::Interior(ix) => tree.segment(*ix).is_some(),
            SegmentId::StartDrop => !tree.is_direct(),
            SegmentId::EndDrop(link) => !tree.is_direct() && tree.drop_for(*link).is_some(),
            SegmentId::Direct => tree.is_direct(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::SegmentSet;
    use crate::model::geom::Point;
    use crate::model::ids::{LinkId, NodeId, PadId, TreeId};
    use crate::tree::segment::{SegmentId, SegmentIx};
    use crate::tree::BusTree;

    fn tree_id() -> TreeId {
        TreeId::new(0)
    }

    fn seg(ix: u32) -> SegmentId {
        SegmentId::Interior(SegmentIx::new(ix))
    }

    #[test]
    fn merge_is_union() {
        let a = SegmentSet::from_members(tree_id(), [seg(1), seg(2)]);
        let b = SegmentSet::from_members(tree_id(), [seg(2), seg(3)]);
        let merged = a.merge(&b);
        assert_eq!(merged.members().len(), 3);
        assert!(merged.contains(seg(1)) && merged.contains(seg(2)) && merged.contains(seg(3)));
    }

    #[test]
    fn intersect_keeps_common_members_only() {
        let a = SegmentSet::from_members(tree_id(), [seg(1), seg(2)]);
        let b = SegmentSet::from_members(tree_id(), [seg(2), seg(3)]);
        let both = a.intersect(&b);
        assert_eq!(both.members().len(), 1);
        assert!(both.contains(seg(2)));
    }

    #[test]
    fn intersect_complement_drops_shared_members() {
        let a = SegmentSet::from_members(tree_id(), [seg(1), seg(2)]);
        let b = SegmentSet::from_members(tree_id(), [seg(2), seg(3)]);
        let exactly_one = a.intersect_complement(&b);
        assert!(exactly_one.contains(seg(1)));
        assert!(exactly_one.contains(seg(3)));
        assert!(!exactly_one.contains(seg(2)));
    }

    #[test]
    #[should_panic(expected = "different trees")]
    fn cross_tree_algebra_is_a_caller_bug() {
        let a = SegmentSet::single(TreeId::new(0), seg(1));
        let b = SegmentSet::single(TreeId::new(1), seg(1));
        let _ = a.merge(&b);
    }

    #[test]
    fn full_intersection_counts_every_piece_once() {
        let mut tree = BusTree::new_direct(
            NodeId::new(0),
            PadId::new(0),
            Point::new(0.0, 0.0),
            LinkId::new(10),
            PadId::new(0),
            Point::new(100.0, 0.0),
        );
        // Direct tree: just the marker.
        let direct = SegmentSet::full_intersection(tree_id(), &tree, true);
        assert_eq!(direct.members().len(), 1);
        assert!(direct.contains(SegmentId::Direct));

        // Give it a trunk and a second link.
        let trunk = tree.add_segment(None, Point::new(0.0, 0.0), Point::new(50.0, 0.0));
        tree.drop_mut(LinkId::new(10)).expect("drop").set_attach(Some(trunk));
        tree.insert_drop(
            LinkId::new(11),
            crate::tree::segment::TreeDrop::new(PadId::new(1), Point::new(50.0, 40.0), Some(trunk)),
        );

        let without_root = SegmentSet::full_intersection(tree_id(), &tree, false);
        assert_eq!(without_root.members().len(), 3);

        let with_root = SegmentSet::full_intersection(tree_id(), &tree, true);
        assert_eq!(with_root.members().len(), 4);
        assert!(with_root.contains(SegmentId::StartDrop));
    }
}
