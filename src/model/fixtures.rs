// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Shared test fixtures: a small in-memory network/shape collaborator and a
//! toy pathway layout used across the repair, compression and selection
//! suites.

use std::collections::{BTreeMap, BTreeSet};

use smallvec::{smallvec, SmallVec};

use crate::model::facts::{NetworkFacts, ShapeFacts};
use crate::model::geom::{Point, Rect, GRID_UNIT};
use crate::model::ids::{IdSource, LinkId, ModuleId, NodeId, PadId, RegionId, TreeId};
use crate::model::layout::{Layout, ModuleShape};
use crate::tree::segment::TreeDrop;

/// Node footprints are one grid cell square, centered on the node position.
pub(crate) const NODE_HALF: f64 = GRID_UNIT / 2.0;

#[derive(Debug, Default, Clone)]
pub(crate) struct TestFacts {
    pub links: BTreeMap<LinkId, (NodeId, NodeId)>,
    pub node_points: BTreeMap<NodeId, Point>,
    pub regions: BTreeMap<NodeId, RegionId>,
    pub collapsed: BTreeSet<RegionId>,
    pub region_shapes: BTreeMap<RegionId, Rect>,
    pub modules: BTreeMap<ModuleId, BTreeSet<NodeId>>,
}

impl NetworkFacts for TestFacts {
    fn link_source(&self, link: LinkId) -> NodeId {
        self.links.get(&link).expect("known link").0
    }

    fn link_target(&self, link: LinkId) -> NodeId {
        self.links.get(&link).expect("known link").1
    }

    fn launch_pad(&self, _link: LinkId) -> PadId {
        PadId::new(0)
    }

    fn landing_pad(&self, _link: LinkId) -> PadId {
        PadId::new(0)
    }

    fn node_region(&self, node: NodeId) -> Option<RegionId> {
        self.regions.get(&node).copied()
    }

    fn collapsed_regions(&self) -> BTreeSet<RegionId> {
        self.collapsed.clone()
    }

    fn module_members(&self, module: ModuleId) -> BTreeSet<NodeId> {
        self.modules.get(&module).cloned().unwrap_or_default()
    }
}

impl ShapeFacts for TestFacts {
    fn node_bounds(&self, node: NodeId) -> Rect {
        let center = *self.node_points.get(&node).expect("known node");
        Rect::new(
            center.x() - NODE_HALF,
            center.y() - NODE_HALF,
            center.x() + NODE_HALF,
            center.y() + NODE_HALF,
        )
    }

    fn pad_point(&self, node: NodeId, _pad: PadId) -> Point {
        *self.node_points.get(&node).expect("known node")
    }

    fn pad_candidates(&self, _node: NodeId, _point: Point) -> SmallVec<[PadId; 4]> {
        smallvec![PadId::new(0), PadId::new(1)]
    }

    fn region_bounds(&self, region: RegionId) -> Option<Rect> {
        self.region_shapes.get(&region).copied()
    }
}

/// One source feeding two targets through a shared trunk:
///
/// ```text
///   S(0,0) --trunk--> (60,0) --> T1(120,-40)
///                         \----> T2(120,40)
/// ```
///
/// Returns the layout, the collaborator facts and the shared tree id.
pub(crate) fn fan_out_fixture() -> (Layout, TestFacts, TreeId) {
    let mut layout = Layout::new();
    let mut ids = IdSource::new();
    let mut facts = TestFacts::default();

    let source = NodeId::new(1);
    let t1 = NodeId::new(2);
    let t2 = NodeId::new(3);
    facts.node_points.insert(source, Point::new(0.0, 0.0));
    facts.node_points.insert(t1, Point::new(120.0, -40.0));
    facts.node_points.insert(t2, Point::new(120.0, 40.0));
    layout.set_node_position(source, Point::new(0.0, 0.0));
    layout.set_node_position(t1, Point::new(120.0, -40.0));
    layout.set_node_position(t2, Point::new(120.0, 40.0));

    let l1 = LinkId::new(10);
    let l2 = LinkId::new(11);
    facts.links.insert(l1, (source, t1));
    facts.links.insert(l2, (source, t2));

    let (tree_id, _) = layout.place_direct_link(
        &mut ids,
        l1,
        source,
        PadId::new(0),
        Point::new(0.0, 0.0),
        PadId::new(0),
        Point::new(120.0, -40.0),
    );
    {
        let tree = layout.trees_mut().tree_mut(tree_id).expect("tree exists");
        let trunk = tree.add_segment(None, Point::new(0.0, 0.0), Point::new(60.0, 0.0));
        tree.drop_mut(l1).expect("drop").set_attach(Some(trunk));
        tree.insert_drop(l2, TreeDrop::new(PadId::new(0), Point::new(120.0, 40.0), Some(trunk)));
    }
    layout.link_to_tree_mut().insert(l2, tree_id);

    (layout, facts, tree_id)
}

/// A fixture with an overlay module whose boundary crosses otherwise-empty
/// rows, for the compression-exclusion scenario.
pub(crate) fn module_fixture() -> (Layout, TestFacts, ModuleId) {
    let (mut layout, mut facts, _) = fan_out_fixture();
    let module = ModuleId::new(1);
    let shape = ModuleShape::new(
        Rect::new(-40.0, 80.0, 160.0, 160.0),
        Point::new(-40.0, 80.0),
    );
    layout.set_module(module, shape);
    facts.modules.insert(module, BTreeSet::new());
    (layout, facts, module)
}
