// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The layout aggregate: everything the engine owns for one diagram.
//!
//! Node positions, region labels, notes and overlay-module shapes are plain
//! coordinates; link geometry lives in the bus-tree arena, with link ids
//! mapping to tree ids. The aggregate supports structural clone and equality,
//! which is all an external undo collaborator needs for snapshots.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::grid::{GridStrictness, OccupancyGrid};
use crate::model::change::LayoutChange;
use crate::model::facts::ShapeFacts;
use crate::model::geom::{Point, Rect};
use crate::model::ids::{IdSource, LinkId, ModuleId, NodeId, NoteId, PadId, RegionId, TreeId};
use crate::tree::mutate::{SplitOutcome, SplitSpec};
use crate::tree::segment::SegmentId;
use crate::tree::{BusTree, TreeArena, TreeOpError};

/// One overlay module's drawn shape: the boundary rectangle plus where its
/// name badge sits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModuleShape {
    bounds: Rect,
    name_point: Point,
}

impl ModuleShape {
    pub fn new(bounds: Rect, name_point: Point) -> Self {
        Self { bounds, name_point }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn name_point(&self) -> Point {
        self.name_point
    }

    pub(crate) fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    pub(crate) fn set_name_point(&mut self, name_point: Point) {
        self.name_point = name_point;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    trees: TreeArena,
    link_to_tree: BTreeMap<LinkId, TreeId>,
    node_positions: BTreeMap<NodeId, Point>,
    region_labels: BTreeMap<RegionId, Point>,
    notes: BTreeMap<NoteId, Point>,
    modules: BTreeMap<ModuleId, ModuleShape>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trees(&self) -> &TreeArena {
        &self.trees
    }

    pub fn trees_mut(&mut self) -> &mut TreeArena {
        &mut self.trees
    }

    pub fn link_to_tree(&self) -> &BTreeMap<LinkId, TreeId> {
        &self.link_to_tree
    }

    pub fn tree_for_link(&self, link: LinkId) -> Option<TreeId> {
        self.link_to_tree.get(&link).copied()
    }

    pub(crate) fn link_to_tree_mut(&mut self) -> &mut BTreeMap<LinkId, TreeId> {
        &mut self.link_to_tree
    }

    pub fn node_positions(&self) -> &BTreeMap<NodeId, Point> {
        &self.node_positions
    }

    pub(crate) fn node_positions_mut(&mut self) -> &mut BTreeMap<NodeId, Point> {
        &mut self.node_positions
    }

    pub fn region_labels(&self) -> &BTreeMap<RegionId, Point> {
        &self.region_labels
    }

    pub(crate) fn region_labels_mut(&mut self) -> &mut BTreeMap<RegionId, Point> {
        &mut self.region_labels
    }

    pub fn notes(&self) -> &BTreeMap<NoteId, Point> {
        &self.notes
    }

    pub(crate) fn notes_mut(&mut self) -> &mut BTreeMap<NoteId, Point> {
        &mut self.notes
    }

    pub fn modules(&self) -> &BTreeMap<ModuleId, ModuleShape> {
        &self.modules
    }

    pub(crate) fn modules_mut(&mut self) -> &mut BTreeMap<ModuleId, ModuleShape> {
        &mut self.modules
    }

    pub fn set_node_position(&mut self, node: NodeId, position: Point) -> Option<LayoutChange> {
        let before = self.node_positions.insert(node, position);
        before.map(|before| LayoutChange::NodePosition { node, before, after: position })
    }

    pub fn set_region_label(&mut self, region: RegionId, position: Point) {
        self.region_labels.insert(region, position);
    }

    pub fn set_note(&mut self, note: NoteId, position: Point) {
        self.notes.insert(note, position);
    }

    pub fn set_module(&mut self, module: ModuleId, shape: ModuleShape) {
        self.modules.insert(module, shape);
    }

    /// Lays out the first link from a source as a direct tree.
    pub fn place_direct_link(
        &mut self,
        ids: &mut IdSource,
        link: LinkId,
        source: NodeId,
        launch_pad: PadId,
        root_point: Point,
        landing_pad: PadId,
        end_point: Point,
    ) -> (TreeId, Vec<LayoutChange>) {
        assert!(
            !self.link_to_tree.contains_key(&link),
            "link {link} already has tree geometry"
        );
        let tree_id = ids.next_tree();
        let tree = BusTree::new_direct(source, launch_pad, root_point, link, landing_pad, end_point);
        self.trees.insert(tree_id, tree.clone());
        self.link_to_tree.insert(link, tree_id);
        (
            tree_id,
            vec![
                LayoutChange::Tree { tree: tree_id, before: None, after: Some(tree) },
                LayoutChange::LinkAssignment { link, before: None, after: Some(tree_id) },
            ],
        )
    }

    /// Attaches a new standalone link to an existing tree at a segment.
    pub fn merge_link_into_tree(
        &mut self,
        tree_id: TreeId,
        at: SegmentId,
        link: LinkId,
        landing_pad: PadId,
        end_point: Point,
    ) -> Result<Vec<LayoutChange>, TreeOpError> {
        let tree = self.trees.tree(tree_id).ok_or(TreeOpError::UnknownTree(tree_id))?;
        let before = tree.clone();
        let tree = self.trees.tree_mut(tree_id).expect("tree exists (checked)");
        tree.merge_single_to_tree_at_segment(at, link, landing_pad, end_point)?;
        let after = tree.clone();
        self.link_to_tree.insert(link, tree_id);
        Ok(vec![
            LayoutChange::Tree { tree: tree_id, before: Some(before), after: Some(after) },
            LayoutChange::LinkAssignment { link, before: None, after: Some(tree_id) },
        ])
    }

    /// Absorbs tree `src` into `dst` at a segment of `dst` and retires `src`.
    pub fn merge_trees(
        &mut self,
        dst: TreeId,
        at: SegmentId,
        src: TreeId,
    ) -> Result<Vec<LayoutChange>, TreeOpError> {
        let dst_before =
            self.trees.tree(dst).cloned().ok_or(TreeOpError::UnknownTree(dst))?;
        let src_before =
            self.trees.tree(src).cloned().ok_or(TreeOpError::UnknownTree(src))?;
        let moved_links: Vec<LinkId> = src_before.links().collect();

        self.trees.merge_tree_to_tree_at_segment(dst, at, src)?;

        let mut changes = vec![
            LayoutChange::Tree {
                tree: dst,
                before: Some(dst_before),
                after: Some(self.trees.tree(dst).expect("dst exists").clone()),
            },
            LayoutChange::Tree { tree: src, before: Some(src_before), after: None },
        ];
        for link in moved_links {
            let previous = self.link_to_tree.insert(link, dst);
            changes.push(LayoutChange::LinkAssignment { link, before: previous, after: Some(dst) });
        }
        Ok(changes)
    }

    /// Inserts a new interior node into a tree and reassigns downstream links
    /// to the resulting new tree.
    pub fn insert_node_in_tree(
        &mut self,
        ids: &mut IdSource,
        tree_id: TreeId,
        spec: &SplitSpec,
    ) -> Result<(SplitOutcome, Vec<LayoutChange>), TreeOpError> {
        let before = self.trees.tree(tree_id).cloned().ok_or(TreeOpError::UnknownTree(tree_id))?;
        let outcome = self.trees.split_at(ids, tree_id, spec)?;

        let mut changes = vec![
            LayoutChange::Tree {
                tree: tree_id,
                before: Some(before),
                after: Some(self.trees.tree(tree_id).expect("tree exists").clone()),
            },
            LayoutChange::Tree {
                tree: outcome.new_tree,
                before: None,
                after: Some(self.trees.tree(outcome.new_tree).expect("new tree exists").clone()),
            },
        ];
        for (link, tree) in &outcome.assignments {
            let previous = self.link_to_tree.insert(*link, *tree);
            changes.push(LayoutChange::LinkAssignment {
                link: *link,
                before: previous,
                after: Some(*tree),
            });
        }
        Ok((outcome, changes))
    }

    /// Removes one link's geometry; the tree dies with its last member.
    pub fn remove_link(&mut self, link: LinkId) -> Vec<LayoutChange> {
        let Some(tree_id) = self.link_to_tree.remove(&link) else {
            return Vec::new();
        };
        let mut changes = vec![LayoutChange::LinkAssignment {
            link,
            before: Some(tree_id),
            after: None,
        }];
        let tree = self.trees.tree_mut(tree_id).expect("assigned tree exists");
        let before = tree.clone();
        tree.remove_drop(link);
        if tree.is_empty() {
            self.trees.remove(tree_id);
            changes.push(LayoutChange::Tree { tree: tree_id, before: Some(before), after: None });
        } else {
            // A lone surviving link may collapse to the direct form later;
            // the repair pass decides, not link removal.
            changes.push(LayoutChange::Tree {
                tree: tree_id,
                before: Some(before),
                after: Some(self.trees.tree(tree_id).expect("tree exists").clone()),
            });
        }
        changes
    }

    /// Bounding rectangle of everything laid out, expanded to node footprints.
    pub fn bounds(&self, shapes: &dyn ShapeFacts) -> Option<Rect> {
        let mut bounds: Option<Rect> = None;
        let mut extend = |rect: Rect| {
            bounds = Some(match bounds {
                Some(existing) => existing.union(&rect),
                None => rect,
            });
        };
        for node in self.node_positions.keys() {
            extend(shapes.node_bounds(*node));
        }
        for (_, tree) in self.trees.iter() {
            if let Some(tree_bounds) = tree.bounds() {
                extend(tree_bounds);
            }
        }
        for position in self.region_labels.values().chain(self.notes.values()) {
            extend(Rect::from_corners(*position, *position));
        }
        for module in self.modules.values() {
            extend(module.bounds());
        }
        bounds
    }

    /// Rebuilds the occupancy grid from the current state. `skip_tree` leaves
    /// one tree out, for repairing that tree against everything else.
    pub fn occupancy_grid(
        &self,
        shapes: &dyn ShapeFacts,
        strictness: GridStrictness,
        skip_tree: Option<TreeId>,
    ) -> OccupancyGrid {
        let mut grid = OccupancyGrid::new(strictness);
        for node in self.node_positions.keys() {
            grid.render_node(shapes.node_bounds(*node));
        }
        for (tree_id, tree) in self.trees.iter() {
            if Some(tree_id) == skip_tree {
                continue;
            }
            grid.render_tree(tree);
        }
        for module in self.modules.values() {
            grid.render_module(module.bounds());
        }
        grid
    }

    /// Rows and columns overlay-module boundaries sit on. These must survive
    /// compression even when nothing else occupies them.
    pub fn module_exclusions(&self) -> (BTreeSet<i32>, BTreeSet<i32>) {
        let mut rows = BTreeSet::new();
        let mut cols = BTreeSet::new();
        for module in self.modules.values() {
            let bounds = module.bounds();
            rows.insert(*bounds.grid_rows().start());
            rows.insert(*bounds.grid_rows().end());
            cols.insert(*bounds.grid_cols().start());
            cols.insert(*bounds.grid_cols().end());
        }
        (rows, cols)
    }
}

#[cfg(test)]
mod tests {
    use super::Layout;
    use crate::model::change::LayoutChange;
    use crate::model::geom::Point;
    use crate::model::ids::{IdSource, LinkId, NodeId, PadId};

    #[test]
    fn place_then_remove_link_round_trips_tree_lifecycle() {
        let mut layout = Layout::new();
        let mut ids = IdSource::new();
        let link = LinkId::new(5);

        let (tree_id, changes) = layout.place_direct_link(
            &mut ids,
            link,
            NodeId::new(1),
            PadId::new(0),
            Point::new(0.0, 0.0),
            PadId::new(0),
            Point::new(100.0, 0.0),
        );
        assert_eq!(changes.len(), 2);
        assert_eq!(layout.tree_for_link(link), Some(tree_id));

        let removal = layout.remove_link(link);
        assert_eq!(layout.tree_for_link(link), None);
        assert!(layout.trees().tree(tree_id).is_none());
        assert!(removal
            .iter()
            .any(|change| matches!(change, LayoutChange::Tree { after: None, .. })));
    }

    #[test]
    fn structural_clone_is_independent() {
        let mut layout = Layout::new();
        let mut ids = IdSource::new();
        layout.place_direct_link(
            &mut ids,
            LinkId::new(1),
            NodeId::new(1),
            PadId::new(0),
            Point::new(0.0, 0.0),
            PadId::new(0),
            Point::new(50.0, 0.0),
        );
        let snapshot = layout.clone();
        assert_eq!(snapshot, layout);

        layout.remove_link(LinkId::new(1));
        assert_ne!(snapshot, layout);
        assert_eq!(snapshot.link_to_tree().len(), 1);
    }
}
