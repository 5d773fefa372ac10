// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Structural mutations on bus trees.
//!
//! Everything here preserves total link membership: no mutation gains or
//! loses a member link, and every mutation leaves untouched geometry exactly
//! where it was. Recoverable misuse (unknown ids) comes back as
//! [`TreeOpError`]; genuine caller bugs (merging a tree into itself,
//! duplicate link membership) panic.

use std::collections::BTreeMap;
use std::fmt;

use crate::model::geom::Point;
use crate::model::ids::{IdSource, LinkId, NodeId, PadId, TreeId};

use super::segment::{SegmentId, SegmentIx, TreeDrop};
use super::{BusTree, TreeArena};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeOpError {
    UnknownTree(TreeId),
    UnknownSegment(SegmentId),
    UnknownLink(LinkId),
    NotDirect(TreeId),
}

impl fmt::Display for TreeOpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTree(id) => write!(f, "unknown tree {id}"),
            Self::UnknownSegment(id) => write!(f, "unknown segment {id}"),
            Self::UnknownLink(id) => write!(f, "unknown link {id}"),
            Self::NotDirect(id) => write!(f, "tree {id} is not in direct form"),
        }
    }
}

impl std::error::Error for TreeOpError {}

/// What a split produced: the new downstream tree plus the full link-to-tree
/// assignment after the split (moved links map to `new_tree`, the inbound
/// link maps to the original tree).
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutcome {
    pub new_tree: TreeId,
    pub assignments: BTreeMap<LinkId, TreeId>,
}

/// Where and how to insert a new interior node into a tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitSpec {
    /// Split position within the tree.
    pub at: SegmentId,
    /// The node being inserted.
    pub new_node: NodeId,
    /// Launch point of the new downstream tree on the new node.
    pub new_root_point: Point,
    pub new_launch_pad: PadId,
    /// The surviving link from the original source into the new node.
    pub inbound_link: LinkId,
    pub inbound_landing_pad: PadId,
    /// Landing point of the inbound link on the new node.
    pub inbound_end_point: Point,
}

impl BusTree {
    /// Inserts a corner: the segment `a..b` becomes `a..p` plus a fresh child
    /// `p..b` which inherits the original's children and drops.
    pub fn split_segment_at_point(&mut self, ix: SegmentIx, point: Point) -> Option<SegmentIx> {
        let seg = *self.segment(ix)?;
        let new_ix = self.add_segment(Some(ix), point, seg.end());

        let moved_children: Vec<SegmentIx> = self
            .children_of(Some(ix))
            .into_iter()
            .filter(|child| *child != new_ix)
            .collect();
        for child in moved_children {
            self.segment_mut(child)
                .expect("child segment exists")
                .set_parent(Some(new_ix));
        }
        for link in self.drops_on(Some(ix)) {
            self.drop_mut(link).expect("drop exists").set_attach(Some(new_ix));
        }

        self.segment_mut(ix).expect("segment exists").set_end(point);
        Some(new_ix)
    }

    /// Removes the corner at the end of `ix` by fusing `ix` with its only
    /// child. Refused (false) when the corner still fans out: more than one
    /// child, or drops attached at the corner.
    pub fn remove_corner(&mut self, ix: SegmentIx) -> bool {
        if self.segment(ix).is_none() {
            return false;
        }
        let children = self.children_of(Some(ix));
        if children.len() != 1 || !self.drops_on(Some(ix)).is_empty() {
            return false;
        }
        let child = children[0];
        let child_seg = *self.segment(child).expect("child segment exists");

        for grandchild in self.children_of(Some(child)) {
            self.segment_mut(grandchild)
                .expect("grandchild segment exists")
                .set_parent(Some(ix));
        }
        for link in self.drops_on(Some(child)) {
            self.drop_mut(link).expect("drop exists").set_attach(Some(ix));
        }
        self.segment_mut(ix).expect("segment exists").set_end(child_seg.end());
        self.remove_segment_raw(child);
        true
    }

    /// Splices out a segment, reattaching its children and drops to its
    /// parent. Intended for zero-length segments; for non-degenerate ones the
    /// children jump to the parent's end point.
    pub fn splice_out_segment(&mut self, ix: SegmentIx) -> bool {
        let Some(seg) = self.segment(ix).copied() else {
            return false;
        };
        let parent = seg.parent();
        let join = match parent {
            Some(parent_ix) => self.segment(parent_ix).expect("parent exists").end(),
            None => self.root_point(),
        };
        for child in self.children_of(Some(ix)) {
            let child_seg = self.segment_mut(child).expect("child exists");
            child_seg.set_parent(parent);
            child_seg.set_start(join);
        }
        for link in self.drops_on(Some(ix)) {
            self.drop_mut(link).expect("drop exists").set_attach(parent);
        }
        self.remove_segment_raw(ix);
        true
    }

    /// Attaches one standalone link to this tree at the chosen segment.
    ///
    /// A direct tree is first converted to the segmented form so there is a
    /// trunk to attach to. Panics if `link` is already a member (membership
    /// claims must be disjoint).
    pub fn merge_single_to_tree_at_segment(
        &mut self,
        at: SegmentId,
        link: LinkId,
        landing_pad: PadId,
        end_point: Point,
    ) -> Result<(), TreeOpError> {
        assert!(
            self.drop_for(link).is_none(),
            "link {link} is already a member of this tree"
        );
        if self.is_direct() {
            self.split_no_segment_bus();
        }
        let attach = match at {
            SegmentId::Interior(ix) => {
                if self.segment(ix).is_none() {
                    return Err(TreeOpError::UnknownSegment(at));
                }
                Some(ix)
            }
            SegmentId::StartDrop => None,
            SegmentId::EndDrop(other) => match self.drop_for(other) {
                Some(drop) => drop.attach(),
                None => return Err(TreeOpError::UnknownSegment(at)),
            },
            // The direct marker now names the materialized trunk.
            SegmentId::Direct => self.children_of(None).first().copied(),
        };
        self.insert_drop(link, TreeDrop::new(landing_pad, end_point, attach));
        Ok(())
    }

    /// Reparents the subtree rooted at `moved` under `new_parent`.
    ///
    /// Refused (None) when `new_parent` sits inside the moved subtree (a
    /// cycle) or when `moved` is attached to the tree root. On success the
    /// moved segment's start snaps to the new parent's end, which is returned.
    pub fn move_segment_on_tree(
        &mut self,
        moved: SegmentIx,
        new_parent: SegmentIx,
    ) -> Option<Point> {
        let seg = self.segment(moved)?;
        seg.parent()?;
        let target = self.segment(new_parent)?;
        let join = target.end();
        if self.is_descendant(new_parent, moved) {
            return None;
        }
        let seg = self.segment_mut(moved).expect("segment exists");
        seg.set_parent(Some(new_parent));
        seg.set_start(join);
        Some(join)
    }

    /// Collapses a single-link tree to the corner-less direct form.
    ///
    /// False when more than one link still shares the tree.
    pub fn make_direct(&mut self) -> bool {
        if self.link_count() != 1 {
            return false;
        }
        let segments: Vec<SegmentIx> = self.segments().keys().copied().collect();
        for ix in segments {
            self.remove_segment_raw(ix);
        }
        let link = self.links().next().expect("exactly one link");
        self.drop_mut(link).expect("drop exists").set_attach(None);
        true
    }

    /// The reverse of [`BusTree::make_direct`]: materializes one trunk
    /// segment ending at the midpoint of the direct run and hangs the drop
    /// off it. Returns the trunk's index, or None when the tree already has
    /// segments.
    pub fn split_no_segment_bus(&mut self) -> Option<SegmentIx> {
        if !self.is_direct() {
            return None;
        }
        let link = self.links().next().expect("direct tree has one link");
        let end = self.drop_for(link).expect("drop exists").end_point();
        let root = self.root_point();
        let trunk = self.add_segment(None, root, root.midpoint(end));
        self.drop_mut(link).expect("drop exists").set_attach(Some(trunk));
        Some(trunk)
    }
}

impl TreeArena {
    /// Inserts a new interior node into a tree (`insertNodeInTree`): the
    /// subtree below the split position becomes a new tree rooted at the new
    /// node, descendant links are reassigned to it, and the inbound link into
    /// the new node takes their place on the original tree.
    pub fn split_at(
        &mut self,
        ids: &mut IdSource,
        tree_id: TreeId,
        spec: &SplitSpec,
    ) -> Result<SplitOutcome, TreeOpError> {
        let tree = self.tree(tree_id).ok_or(TreeOpError::UnknownTree(tree_id))?;

        // Validate the split position before mutating anything.
        match spec.at {
            SegmentId::Interior(ix) => {
                if tree.segment(ix).is_none() {
                    return Err(TreeOpError::UnknownSegment(spec.at));
                }
            }
            SegmentId::EndDrop(link) => {
                if tree.drop_for(link).is_none() {
                    return Err(TreeOpError::UnknownSegment(spec.at));
                }
            }
            SegmentId::StartDrop => {}
            SegmentId::Direct => {
                if !tree.is_direct() {
                    return Err(TreeOpError::NotDirect(tree_id));
                }
            }
        }

        let new_tree_id = ids.next_tree();
        let tree = self.tree_mut(tree_id).expect("tree exists (validated)");
        let mut assignments = BTreeMap::new();

        let new_tree = match spec.at {
            SegmentId::EndDrop(link) => {
                // One link moves; it becomes a direct tree out of the new node.
                let drop = tree.remove_drop(link).expect("drop exists (validated)");
                let attach = drop.attach();
                tree.insert_drop(
                    spec.inbound_link,
                    TreeDrop::new(spec.inbound_landing_pad, spec.inbound_end_point, attach),
                );
                assignments.insert(link, new_tree_id);
                BusTree::new_direct(
                    spec.new_node,
                    spec.new_launch_pad,
                    spec.new_root_point,
                    link,
                    drop.landing_pad(),
                    drop.end_point(),
                )
            }
            SegmentId::Interior(ix) => {
                let moved = tree.descendants(ix);
                let mut new_tree = BusTree::new_stub(
                    spec.new_node,
                    spec.new_launch_pad,
                    spec.new_root_point,
                );
                let mut remap: BTreeMap<SegmentIx, SegmentIx> = BTreeMap::new();

                // Children of the split segment become root children of the
                // new tree; deeper structure is copied parent-first.
                let mut order: Vec<SegmentIx> = Vec::new();
                let mut frontier: Vec<SegmentIx> = tree.children_of(Some(ix));
                while let Some(current) = frontier.pop() {
                    order.push(current);
                    frontier.extend(tree.children_of(Some(current)));
                }
                for old_ix in &order {
                    let seg = *tree.segment(*old_ix).expect("segment exists");
                    let new_parent = seg.parent().filter(|p| *p != ix).map(|p| {
                        *remap.get(&p).expect("parent copied before child")
                    });
                    let start = if seg.parent() == Some(ix) { spec.new_root_point } else { seg.start() };
                    let new_ix = new_tree.add_segment(new_parent, start, seg.end());
                    remap.insert(*old_ix, new_ix);
                }

                // Drops at or below the split point move with the subtree.
                let moved_links: Vec<LinkId> = tree
                    .drops()
                    .iter()
                    .filter_map(|(link, drop)| {
                        drop.attach()
                            .map(|attach| moved.contains(&attach))
                            .unwrap_or(false)
                            .then_some(*link)
                    })
                    .collect();
                for link in moved_links {
                    let drop = tree.remove_drop(link).expect("drop exists");
                    let attach = drop.attach().expect("moved drop had an attachment");
                    let new_attach = remap.get(&attach).copied();
                    // Drops attached at the split segment itself now leave
                    // straight from the new root.
                    new_tree.insert_drop(
                        link,
                        TreeDrop::new(drop.landing_pad(), drop.end_point(), new_attach),
                    );
                    assignments.insert(link, new_tree_id);
                }

                // A split at a pure fan point moves drops but no segments.
                // Several root-attached drops would claim the direct form, so
                // they get a shared trunk to the old junction instead.
                if new_tree.segments().is_empty() && new_tree.drops().len() > 1 {
                    let junction = tree.segment(ix).expect("segment exists").end();
                    let trunk = new_tree.add_segment(None, spec.new_root_point, junction);
                    let fanned: Vec<LinkId> = new_tree.links().collect();
                    for link in fanned {
                        new_tree.drop_mut(link).expect("drop exists").set_attach(Some(trunk));
                    }
                }

                for old_ix in order {
                    tree.remove_segment_raw(old_ix);
                }
                tree.insert_drop(
                    spec.inbound_link,
                    TreeDrop::new(spec.inbound_landing_pad, spec.inbound_end_point, Some(ix)),
                );
                new_tree
            }
            SegmentId::StartDrop | SegmentId::Direct => {
                // The entire tree moves below the new node; the original
                // shrinks to a direct link into it.
                let mut new_tree = BusTree::new_stub(
                    spec.new_node,
                    spec.new_launch_pad,
                    spec.new_root_point,
                );
                let mut remap: BTreeMap<SegmentIx, SegmentIx> = BTreeMap::new();
                let mut order: Vec<SegmentIx> = Vec::new();
                let mut frontier: Vec<SegmentIx> = tree.children_of(None);
                while let Some(current) = frontier.pop() {
                    order.push(current);
                    frontier.extend(tree.children_of(Some(current)));
                }
                for old_ix in &order {
                    let seg = *tree.segment(*old_ix).expect("segment exists");
                    let new_parent =
                        seg.parent().map(|p| *remap.get(&p).expect("parent copied before child"));
                    let start = if seg.parent().is_none() { spec.new_root_point } else { seg.start() };
                    let new_ix = new_tree.add_segment(new_parent, start, seg.end());
                    remap.insert(*old_ix, new_ix);
                }
                let moved_links: Vec<LinkId> = tree.links().collect();
                for link in moved_links {
                    let drop = tree.remove_drop(link).expect("drop exists");
                    let new_attach = drop.attach().map(|attach| {
                        *remap.get(&attach).expect("attachment segment was copied")
                    });
                    new_tree.insert_drop(
                        link,
                        TreeDrop::new(drop.landing_pad(), drop.end_point(), new_attach),
                    );
                    assignments.insert(link, new_tree_id);
                }
                let order_copy: Vec<SegmentIx> = tree.segments().keys().copied().collect();
                for ix in order_copy {
                    tree.remove_segment_raw(ix);
                }
                tree.insert_drop(
                    spec.inbound_link,
                    TreeDrop::new(spec.inbound_landing_pad, spec.inbound_end_point, None),
                );
                new_tree
            }
        };

        assignments.insert(spec.inbound_link, tree_id);
        debug_assert!(new_tree.validate().is_ok(), "split produced a malformed tree");
        debug_assert!(
            self.tree(tree_id).expect("tree exists").validate().is_ok(),
            "split left the original tree malformed"
        );
        self.insert(new_tree_id, new_tree);
        Ok(SplitOutcome { new_tree: new_tree_id, assignments })
    }

    /// Absorbs tree `src` into `dst` at the chosen segment of `dst`; the
    /// absorbed tree's id is retired from the arena.
    ///
    /// A connector segment bridges the attach point and the absorbed tree's
    /// root when they differ. Panics when `dst == src` or when the trees'
    /// membership claims overlap.
    pub fn merge_tree_to_tree_at_segment(
        &mut self,
        dst: TreeId,
        at: SegmentId,
        src: TreeId,
    ) -> Result<(), TreeOpError> {
        assert_ne!(dst, src, "cannot merge tree {dst} into itself");
        if self.tree(src).is_none() {
            return Err(TreeOpError::UnknownTree(src));
        }
        let dst_tree = self.tree(dst).ok_or(TreeOpError::UnknownTree(dst))?;

        let attach = match at {
            SegmentId::Interior(ix) => {
                if dst_tree.segment(ix).is_none() {
                    return Err(TreeOpError::UnknownSegment(at));
                }
                Some(ix)
            }
            SegmentId::StartDrop => None,
            SegmentId::EndDrop(link) => match dst_tree.drop_for(link) {
                Some(drop) => drop.attach(),
                None => return Err(TreeOpError::UnknownSegment(at)),
            },
            SegmentId::Direct => None,
        };

        let absorbed = self.remove(src).expect("src tree exists (checked)");
        let dst_tree = self.tree_mut(dst).expect("dst tree exists (checked)");
        for link in absorbed.links() {
            assert!(
                dst_tree.drop_for(link).is_none(),
                "link {link} claimed by both trees in merge"
            );
        }
        if dst_tree.is_direct() {
            dst_tree.split_no_segment_bus();
        }
        let attach = match at {
            SegmentId::Direct => dst_tree.children_of(None).first().copied(),
            _ => attach,
        };

        let join = match attach {
            Some(ix) => dst_tree.segment(ix).expect("attach segment exists").end(),
            None => dst_tree.root_point(),
        };

        // Bridge to the absorbed root unless it already sits on the join.
        let bridge = if join.coincident(absorbed.root_point()) {
            attach
        } else {
            Some(dst_tree.add_segment(attach, join, absorbed.root_point()))
        };

        let mut remap: BTreeMap<SegmentIx, SegmentIx> = BTreeMap::new();
        let mut order: Vec<SegmentIx> = Vec::new();
        let mut frontier: Vec<SegmentIx> = absorbed.children_of(None);
        while let Some(current) = frontier.pop() {
            order.push(current);
            frontier.extend(absorbed.children_of(Some(current)));
        }
        for old_ix in &order {
            let seg = *absorbed.segment(*old_ix).expect("segment exists");
            let new_parent = match seg.parent() {
                Some(p) => Some(*remap.get(&p).expect("parent copied before child")),
                None => bridge,
            };
            let new_ix = dst_tree.add_segment(new_parent, seg.start(), seg.end());
            remap.insert(*old_ix, new_ix);
        }
        for (link, drop) in absorbed.drops() {
            let new_attach = match drop.attach() {
                Some(attach) => Some(*remap.get(&attach).expect("attachment copied")),
                None => bridge,
            };
            dst_tree.insert_drop(
                *link,
                TreeDrop::new(drop.landing_pad(), drop.end_point(), new_attach),
            );
        }
        debug_assert!(dst_tree.validate().is_ok(), "merge produced a malformed tree");
        Ok(())
    }
}

impl BusTree {
    /// A tree with a root but neither segments nor drops yet; only mutation
    /// internals may observe this state.
    pub(crate) fn new_stub(source: NodeId, launch_pad: PadId, root_point: Point) -> Self {
        Self {
            source,
            launch_pad,
            root_point,
            segments: BTreeMap::new(),
            drops: BTreeMap::new(),
            next_ix: 0,
        }
    }
}
