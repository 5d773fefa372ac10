// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Synthetic pathway layouts for the repair benchmarks.

use std::collections::{BTreeMap, BTreeSet};

use smallvec::{smallvec, SmallVec};

use galatea::model::{
    IdSource, Layout, LinkId, ModuleId, NetworkFacts, NodeId, PadId, Point, Rect, RegionId,
    ShapeFacts, GRID_UNIT,
};
use galatea::tree::segment::SegmentId;

pub struct BenchFacts {
    node_points: BTreeMap<NodeId, Point>,
    links: BTreeMap<LinkId, (NodeId, NodeId)>,
}

impl NetworkFacts for BenchFacts {
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

impl ShapeFacts for BenchFacts {
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

#[derive(Clone, Copy)]
pub enum Case {
    Small,
    MediumFan,
    LargeGrid,
}

impl Case {
    fn shape(self) -> (u32, u32) {
        match self {
            Case::Small => (4, 2),
            Case::MediumFan => (16, 4),
            Case::LargeGrid => (48, 6),
        }
    }
}

/// A column of source nodes, each fanning out to `targets_per_source` targets
/// through one shared tree with diagonal (unrepaired) drops.
pub fn fixture(case: Case) -> (Layout, BenchFacts) {
    let (sources, targets_per_source) = case.shape();
    let mut layout = Layout::new();
    let mut ids = IdSource::new();
    let mut node_points = BTreeMap::new();
    let mut links = BTreeMap::new();

    let mut next_node = 0u32;
    let mut next_link = 0u32;
    let row_pitch = 8.0 * GRID_UNIT;
    let fan_pitch = 4.0 * GRID_UNIT;

    for s in 0..sources {
        let source = NodeId::new(next_node);
        next_node += 1;
        let source_point = Point::new(0.0, s as f64 * row_pitch);
        node_points.insert(source, source_point);
        layout.set_node_position(source, source_point);

        let mut tree = None;
        for t in 0..targets_per_source {
            let target = NodeId::new(next_node);
            next_node += 1;
            // Offset in both axes so every drop starts out diagonal.
            let target_point = Point::new(
                20.0 * GRID_UNIT + t as f64 * fan_pitch,
                s as f64 * row_pitch + (t as f64 - 1.0) * fan_pitch,
            );
            node_points.insert(target, target_point);
            layout.set_node_position(target, target_point);

            let link = LinkId::new(next_link);
            next_link += 1;
            links.insert(link, (source, target));

            match tree {
                None => {
                    let (tree_id, _) = layout.place_direct_link(
                        &mut ids,
                        link,
                        source,
                        PadId::new(0),
                        source_point,
                        PadId::new(0),
                        target_point,
                    );
                    tree = Some(tree_id);
                }
                Some(tree_id) => {
                    layout
                        .merge_link_into_tree(
                            tree_id,
                            SegmentId::Direct,
                            link,
                            PadId::new(0),
                            target_point,
                        )
                        .expect("merge into fresh tree");
                }
            }
        }
    }

    (layout, BenchFacts { node_points, links })
}
