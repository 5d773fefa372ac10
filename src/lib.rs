// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Galatea — layout engine for orthogonally routed pathway diagrams.
//!
//! Link geometry lives in shared bus trees; the engine repairs and
//! orthogonalizes their routing, compresses and expands the coordinate grid,
//! and resolves pointer coordinates to model elements. Rendering, the network
//! data model, persistence and undo are external collaborators.

pub mod compress;
pub mod grid;
pub mod model;
pub mod progress;
pub mod repair;
pub mod select;
pub mod tree;

#[cfg(test)]
mod tests {
    #[test]
    fn sanity() {
        assert_eq!(2 + 2, 4);
    }
}
