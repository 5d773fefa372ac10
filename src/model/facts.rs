// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Read-only collaborator surfaces.
//!
//! The engine owns geometry, nothing else. Network structure (who links to
//! whom, who belongs to which region or overlay module) and shape metrics
//! (node footprints, pad positions) are facts supplied by the surrounding
//! application; the engine only ever asks, never tells.

use std::collections::BTreeSet;

use smallvec::SmallVec;

use crate::model::geom::{Point, Rect};
use crate::model::ids::{LinkId, ModuleId, NodeId, PadId, RegionId};

/// Network-model facts: identities and memberships.
pub trait NetworkFacts {
    fn link_source(&self, link: LinkId) -> NodeId;
    fn link_target(&self, link: LinkId) -> NodeId;
    fn launch_pad(&self, link: LinkId) -> PadId;
    fn landing_pad(&self, link: LinkId) -> PadId;

    /// Region a node belongs to, if any.
    fn node_region(&self, node: NodeId) -> Option<RegionId>;

    /// Regions currently collapsed to a glyph; their contents are masked.
    fn collapsed_regions(&self) -> BTreeSet<RegionId>;

    /// Members of one overlay module.
    fn module_members(&self, module: ModuleId) -> BTreeSet<NodeId>;
}

/// Shape-rendering facts: bounds and connection points only, never painting.
pub trait ShapeFacts {
    /// Footprint of a node in world coordinates.
    fn node_bounds(&self, node: NodeId) -> Rect;

    /// World position of one connection point.
    fn pad_point(&self, node: NodeId, pad: PadId) -> Point;

    /// Connection points near `point`, best first, for pad picking during
    /// selection. Short by construction; four covers the common shapes.
    fn pad_candidates(&self, node: NodeId, point: Point) -> SmallVec<[PadId; 4]>;

    /// Bounding shape of a region, if the region is drawn at all.
    fn region_bounds(&self, region: RegionId) -> Option<Rect>;
}
