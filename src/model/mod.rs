// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model: typed ids, geometry, collaborator traits, the layout
//! aggregate and its change records.

pub mod change;
pub mod facts;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod geom;
pub mod ids;
pub mod layout;

pub use change::LayoutChange;
pub use facts::{NetworkFacts, ShapeFacts};
pub use geom::{Axis, GridCell, Point, Rect, COORD_EPS, GRID_UNIT};
pub use ids::{
    Id, IdSource, LinkId, ModuleId, NodeId, NoteId, PadId, RegionId, TreeId,
};
pub use layout::{Layout, ModuleShape};
