// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! End-to-end scenarios: build a pathway through the public surface, repair
//! it, compress it, and resolve selections against the result.

use std::collections::{BTreeMap, BTreeSet};

use smallvec::{smallvec, SmallVec};

use galatea::compress::{compress_layout, compression_candidates, expand_layout, reverse_expansion};
use galatea::model::{
    IdSource, Layout, LinkId, ModuleId, ModuleShape, NetworkFacts, NodeId, PadId, Point, Rect,
    RegionId, ShapeFacts, TreeId, GRID_UNIT,
};
use galatea::progress::{ProgressRange, SilentMonitor};
use galatea::repair::repair_layout;
use galatea::select::{HitTester, ObjectKey, SelectionSet};
use galatea::tree::segment::SegmentId;

#[derive(Default)]
struct Pathway {
    node_points: BTreeMap<NodeId, Point>,
    links: BTreeMap<LinkId, (NodeId, NodeId)>,
}

impl NetworkFacts for Pathway {
    fn link_source(&self, link: LinkId) -> NodeId {
        self.links[&link].0
    }

    fn link_target(&self, link: LinkId) -> NodeId {
        self.links[&link].1
    }

    fn launch_pad(&self, _link: LinkId) -> PadId {
        PadId::new(0)
    }

    fn landing_pad(&self, _link: LinkId) -> PadId {
        PadId::new(0)
    }

    fn node_region(&self, _node: NodeId) -> Option<RegionId> {
        None
    }

    fn collapsed_regions(&self) -> BTreeSet<RegionId> {
        BTreeSet::new()
    }

    fn module_members(&self, _module: ModuleId) -> BTreeSet<NodeId> {
        BTreeSet::new()
    }
}

impl ShapeFacts for Pathway {
    fn node_bounds(&self, node: NodeId) -> Rect {
        let center = self.node_points[&node];
        let half = GRID_UNIT / 2.0;
        Rect::new(
            center.x() - half,
            center.y() - half,
            center.x() + half,
            center.y() + half,
        )
    }

    fn pad_point(&self, node: NodeId, _pad: PadId) -> Point {
        self.node_points[&node]
    }

    fn pad_candidates(&self, _node: NodeId, _point: Point) -> SmallVec<[PadId; 4]> {
        smallvec![PadId::new(0)]
    }

    fn region_bounds(&self, _region: RegionId) -> Option<Rect> {
        None
    }
}

/// One source at the origin fanning out to two targets through a shared tree,
/// with the drops still diagonal (as after an interactive edit).
fn fan_out() -> (Layout, Pathway, TreeId) {
    let mut layout = Layout::new();
    let mut ids = IdSource::new();
    let mut pathway = Pathway::default();

    let source = NodeId::new(1);
    let t1 = NodeId::new(2);
    let t2 = NodeId::new(3);
    for (node, point) in [
        (source, Point::new(0.0, 0.0)),
        (t1, Point::new(160.0, -60.0)),
        (t2, Point::new(160.0, 60.0)),
    ] {
        pathway.node_points.insert(node, point);
        layout.set_node_position(node, point);
    }

    let l1 = LinkId::new(10);
    let l2 = LinkId::new(11);
    pathway.links.insert(l1, (source, t1));
    pathway.links.insert(l2, (source, t2));

    let (tree_id, _) = layout.place_direct_link(
        &mut ids,
        l1,
        source,
        PadId::new(0),
        Point::new(0.0, 0.0),
        PadId::new(0),
        Point::new(160.0, -60.0),
    );
    layout
        .merge_link_into_tree(tree_id, SegmentId::Direct, l2, PadId::new(0), Point::new(160.0, 60.0))
        .expect("merge second link");

    (layout, pathway, tree_id)
}

#[test]
fn repair_orthogonalizes_and_settles() {
    let (mut layout, pathway, tree_id) = fan_out();
    assert!(!layout.trees().tree(tree_id).expect("tree").is_fully_orthogonal());

    let report = repair_layout(&mut layout, &pathway, &mut SilentMonitor, ProgressRange::full())
        .expect("not cancelled");
    assert_eq!(report.unrepairable, 0);
    assert_eq!(report.ortho_failed, 0);

    let tree = layout.trees().tree(tree_id).expect("tree");
    assert!(tree.is_fully_orthogonal());
    assert!(tree.validate().is_ok());

    // A second pass finds nothing left to do.
    let snapshot = layout.clone();
    repair_layout(&mut layout, &pathway, &mut SilentMonitor, ProgressRange::full())
        .expect("not cancelled");
    assert_eq!(layout, snapshot);
}

#[test]
fn compression_round_trips_through_expansion() {
    let (mut layout, pathway, _) = fan_out();
    repair_layout(&mut layout, &pathway, &mut SilentMonitor, ProgressRange::full())
        .expect("not cancelled");
    let snapshot = layout.clone();

    let (changes, reversal) = expand_layout(
        &mut layout,
        &pathway,
        &[0, 3],
        &[2],
        2,
        true,
        &mut SilentMonitor,
        ProgressRange::full(),
    )
    .expect("not cancelled");
    assert!(!changes.is_empty());
    reverse_expansion(
        &mut layout,
        &pathway,
        &reversal.expect("captured"),
        &mut SilentMonitor,
        ProgressRange::full(),
    )
    .expect("not cancelled");

    assert_eq!(layout, snapshot);
}

#[test]
fn module_required_rows_survive_compression() {
    let (mut layout, pathway, _) = fan_out();
    repair_layout(&mut layout, &pathway, &mut SilentMonitor, ProgressRange::full())
        .expect("not cancelled");

    // An overlay module floating below the pathway, with empty rows between.
    let module = ModuleId::new(1);
    let bounds = Rect::new(0.0, 120.0, 120.0, 200.0);
    layout.set_module(module, ModuleShape::new(bounds, Point::new(0.0, 120.0)));

    let (rows, cols) = compression_candidates(&layout, &pathway);
    let boundary_rows: Vec<i32> =
        vec![*bounds.grid_rows().start(), *bounds.grid_rows().end()];
    for row in &boundary_rows {
        assert!(!rows.contains(row), "module boundary row {row} must be kept");
    }

    compress_layout(&mut layout, &rows, &cols, &mut SilentMonitor, ProgressRange::full())
        .expect("not cancelled");
    let shape = layout.modules().get(&module).expect("module");
    assert_eq!(
        shape.bounds().height(),
        bounds.height(),
        "compression must not squeeze the module itself"
    );
}

#[test]
fn selection_survives_the_whole_pipeline() {
    let (mut layout, pathway, tree_id) = fan_out();
    repair_layout(&mut layout, &pathway, &mut SilentMonitor, ProgressRange::full())
        .expect("not cancelled");

    let mut selection = SelectionSet::new();
    selection.select_all(&layout);
    // Three nodes plus one shared tree.
    assert_eq!(selection.len(), 4);

    // Compress, then drop the stale segment references.
    let (rows, cols) = compression_candidates(&layout, &pathway);
    compress_layout(&mut layout, &rows, &cols, &mut SilentMonitor, ProgressRange::full())
        .expect("not cancelled");
    selection.revalidate(&layout);
    assert!(selection.contains(&ObjectKey::Tree(tree_id)));

    // The tree is still hittable at its (shifted) root.
    let root = layout.trees().tree(tree_id).expect("tree").root_point();
    let tester = HitTester::new(&layout, &pathway, &pathway);
    let hit = tester.hit(root, &selection).expect("hit");
    assert_eq!(hit.object, ObjectKey::Tree(tree_id));
}
