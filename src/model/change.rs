// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Property-change records.
//!
//! The engine never keeps an undo stack. Every mutating entry point returns
//! the before/after value pairs it committed; the external undo collaborator
//! stores them and can reapply either side. `None` on the before side means
//! the object was created, `None` on the after side that it was destroyed.

use serde::{Deserialize, Serialize};

use crate::model::geom::{Point, Rect};
use crate::model::ids::{LinkId, ModuleId, NodeId, NoteId, RegionId, TreeId};
use crate::tree::BusTree;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayoutChange {
    Tree {
        tree: TreeId,
        before: Option<BusTree>,
        after: Option<BusTree>,
    },
    LinkAssignment {
        link: LinkId,
        before: Option<TreeId>,
        after: Option<TreeId>,
    },
    NodePosition {
        node: NodeId,
        before: Point,
        after: Point,
    },
    RegionLabel {
        region: RegionId,
        before: Point,
        after: Point,
    },
    NoteLocation {
        note: NoteId,
        before: Point,
        after: Point,
    },
    ModuleShape {
        module: ModuleId,
        before: Rect,
        after: Rect,
    },
}

impl LayoutChange {
    /// The same change with before/after swapped, for reapplying backwards.
    pub fn inverted(&self) -> LayoutChange {
        match self.clone() {
            Self::Tree { tree, before, after } => Self::Tree { tree, before: after, after: before },
            Self::LinkAssignment { link, before, after } => {
                Self::LinkAssignment { link, before: after, after: before }
            }
            Self::NodePosition { node, before, after } => {
                Self::NodePosition { node, before: after, after: before }
            }
            Self::RegionLabel { region, before, after } => {
                Self::RegionLabel { region, before: after, after: before }
            }
            Self::NoteLocation { note, before, after } => {
                Self::NoteLocation { note, before: after, after: before }
            }
            Self::ModuleShape { module, before, after } => {
                Self::ModuleShape { module, before: after, after: before }
            }
        }
    }
}
