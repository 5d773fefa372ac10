// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Grid compression and expansion.
//!
//! Compression removes empty grid rows and columns: every laid-out element
//! strictly beyond a removed index shifts by one grid unit per removed index
//! below/left of it. Expansion is the exact mirror, inserting `multiplier`
//! empty rows/columns after chosen indices, and can capture a reversal record
//! so the insertion can later be undone cell-exactly as long as nothing new
//! moved into the inserted bands.

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::grid::GridStrictness;
use crate::model::change::LayoutChange;
use crate::model::facts::ShapeFacts;
use crate::model::geom::{GridCell, Point, Rect, GRID_UNIT};
use crate::model::layout::Layout;
use crate::progress::{checkpoint, Cancelled, ProgressMonitor, ProgressRange};

/// A uniform row/column shift: each element moves by `step` world units per
/// marker index strictly below (rows) or left of (columns) its own cell.
struct GridShift {
    rows: Vec<i32>,
    cols: Vec<i32>,
    step: f64,
}

impl GridShift {
    fn new(rows: &[i32], cols: &[i32], step: f64) -> Self {
        let mut rows = rows.to_vec();
        rows.sort_unstable();
        rows.dedup();
        let mut cols = cols.to_vec();
        cols.sort_unstable();
        cols.dedup();
        Self { rows, cols, step }
    }

    fn shift_point(&self, p: Point) -> Point {
        let cell = p.grid_cell();
        let below = self.rows.iter().filter(|r| **r < cell.row()).count();
        let left = self.cols.iter().filter(|c| **c < cell.col()).count();
        p.offset(left as f64 * self.step, below as f64 * self.step)
    }

    /// Corners shift independently: a rectangle spanning removed indices
    /// shrinks, which is exactly what module shapes over emptied bands want.
    fn shift_rect(&self, rect: Rect) -> Rect {
        let min = self.shift_point(Point::new(rect.min_x(), rect.min_y()));
        let max = self.shift_point(Point::new(rect.max_x(), rect.max_y()));
        Rect::from_corners(min, max)
    }

    fn is_noop(&self) -> bool {
        self.rows.is_empty() && self.cols.is_empty()
    }
}

/// Applies a shift to every positioned element, returning one change record
/// per element that actually moved.
///
/// Cancellation is checked between element classes; a class that has started
/// shifting always finishes, so the layout never holds a half-moved class.
fn apply_shift(
    layout: &mut Layout,
    shift: &GridShift,
    monitor: &mut dyn ProgressMonitor,
    range: ProgressRange,
) -> Result<Vec<LayoutChange>, Cancelled> {
    let mut changes = Vec::new();
    if shift.is_noop() {
        checkpoint(monitor, range.at(1.0))?;
        return Ok(changes);
    }

    checkpoint(monitor, range.at(0.0))?;
    let nodes: Vec<_> = layout.node_positions().iter().map(|(n, p)| (*n, *p)).collect();
    for (node, before) in nodes {
        let after = shift.shift_point(before);
        if !after.coincident(before) {
            layout.node_positions_mut().insert(node, after);
            changes.push(LayoutChange::NodePosition { node, before, after });
        }
    }

    checkpoint(monitor, range.at(0.2))?;
    let tree_ids: Vec<_> = layout.trees().ids().collect();
    for tree_id in tree_ids {
        let tree = layout.trees().tree(tree_id).expect("tree exists");
        let before = tree.clone();
        let tree = layout.trees_mut().tree_mut(tree_id).expect("tree exists");
        tree.set_root(
            before.source(),
            before.launch_pad(),
            shift.shift_point(before.root_point()),
        );
        let segment_ixs: Vec<_> = tree.segments().keys().copied().collect();
        for ix in segment_ixs {
            let seg = tree.segment_mut(ix).expect("segment exists");
            let (start, end) = (seg.start(), seg.end());
            seg.set_start(shift.shift_point(start));
            seg.set_end(shift.shift_point(end));
        }
        let links: Vec<_> = tree.links().collect();
        for link in links {
            let drop = tree.drop_mut(link).expect("drop exists");
            let end = drop.end_point();
            drop.set_end_point(shift.shift_point(end));
        }
        let after = layout.trees().tree(tree_id).expect("tree exists").clone();
        if after != before {
            changes.push(LayoutChange::Tree {
                tree: tree_id,
                before: Some(before),
                after: Some(after),
            });
        }
    }

    checkpoint(monitor, range.at(0.4))?;
    let labels: Vec<_> = layout.region_labels().iter().map(|(r, p)| (*r, *p)).collect();
    for (region, before) in labels {
        let after = shift.shift_point(before);
        if !after.coincident(before) {
            layout.region_labels_mut().insert(region, after);
            changes.push(LayoutChange::RegionLabel { region, before, after });
        }
    }

    checkpoint(monitor, range.at(0.6))?;
    let notes: Vec<_> = layout.notes().iter().map(|(n, p)| (*n, *p)).collect();
    for (note, before) in notes {
        let after = shift.shift_point(before);
        if !after.coincident(before) {
            layout.notes_mut().insert(note, after);
            changes.push(LayoutChange::NoteLocation { note, before, after });
        }
    }

    checkpoint(monitor, range.at(0.8))?;
    let modules: Vec<_> = layout.modules().iter().map(|(m, s)| (*m, *s)).collect();
    for (module, shape) in modules {
        let before = shape.bounds();
        let after = shift.shift_rect(before);
        let name_point = shift.shift_point(shape.name_point());
        if after != before || !name_point.coincident(shape.name_point()) {
            let entry = layout.modules_mut().get_mut(&module).expect("module exists");
            entry.set_bounds(after);
            entry.set_name_point(name_point);
            changes.push(LayoutChange::ModuleShape { module, before, after });
        }
    }

    checkpoint(monitor, range.at(1.0))?;
    Ok(changes)
}

/// Rows and columns that compression may remove: empty bands within the layout
/// bounds, minus the rows/columns overlay-module boundaries sit on.
pub fn compression_candidates(
    layout: &Layout,
    shapes: &dyn ShapeFacts,
) -> (Vec<i32>, Vec<i32>) {
    let Some(bounds) = layout.bounds(shapes) else {
        return (Vec::new(), Vec::new());
    };
    let grid = layout.occupancy_grid(shapes, GridStrictness::Strict, None);
    let (excluded_rows, excluded_cols) = layout.module_exclusions();
    (
        grid.empty_rows(bounds, &excluded_rows),
        grid.empty_columns(bounds, &excluded_cols),
    )
}

/// Removes the given rows and columns, shifting everything beyond them up and
/// left by one grid unit per removed index.
///
/// Callers pass rows/columns from [`compression_candidates`]; passing an
/// occupied index would fold distinct elements onto each other, so that is on
/// the caller.
///
/// Cancellable between element classes; classes already shifted when the
/// monitor stops remain shifted.
pub fn compress_layout(
    layout: &mut Layout,
    rows: &[i32],
    cols: &[i32],
    monitor: &mut dyn ProgressMonitor,
    range: ProgressRange,
) -> Result<Vec<LayoutChange>, Cancelled> {
    apply_shift(layout, &GridShift::new(rows, cols, -GRID_UNIT), monitor, range)
}

/// Everything needed to undo an expansion: which indices were expanded, by how
/// much, and what the grid looked like immediately afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionReversal {
    rows: Vec<i32>,
    cols: Vec<i32>,
    multiplier: u32,
    occupied_after: BTreeSet<GridCell>,
}

impl ExpansionReversal {
    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    /// Grid rows the expansion inserted, in post-expansion indices: the
    /// `i`-th expanded row `r` contributes the band
    /// `r + i·m + 1 ..= r + i·m + m`.
    pub fn inserted_rows(&self) -> Vec<i32> {
        Self::inserted(&self.rows, self.multiplier)
    }

    pub fn inserted_cols(&self) -> Vec<i32> {
        Self::inserted(&self.cols, self.multiplier)
    }

    fn inserted(indices: &[i32], multiplier: u32) -> Vec<i32> {
        let m = multiplier as i32;
        indices
            .iter()
            .enumerate()
            .flat_map(|(i, r)| (1..=m).map(move |k| r + i as i32 * m + k))
            .collect()
    }
}

/// Inserts `multiplier` empty rows after each row in `rows` (and likewise for
/// columns), shifting everything beyond down and right.
///
/// With `capture` set, the result carries an [`ExpansionReversal`] whose grid
/// snapshot is taken after the shift, so [`reverse_expansion`] can tell later
/// occupation of the inserted bands apart from pre-existing content.
///
/// Cancellable between element classes. The snapshot is taken only once the
/// whole shift has gone through, so a cancelled expansion never hands out a
/// reversal for a partially shifted layout.
pub fn expand_layout(
    layout: &mut Layout,
    shapes: &dyn ShapeFacts,
    rows: &[i32],
    cols: &[i32],
    multiplier: u32,
    capture: bool,
    monitor: &mut dyn ProgressMonitor,
    range: ProgressRange,
) -> Result<(Vec<LayoutChange>, Option<ExpansionReversal>), Cancelled> {
    assert!(multiplier > 0, "expansion multiplier must be positive");
    let shift = GridShift::new(rows, cols, multiplier as f64 * GRID_UNIT);
    let changes = apply_shift(layout, &shift, monitor, range)?;
    let reversal = capture.then(|| ExpansionReversal {
        rows: shift.rows.clone(),
        cols: shift.cols.clone(),
        multiplier,
        occupied_after: layout
            .occupancy_grid(shapes, GridStrictness::Strict, None)
            .occupied_snapshot(),
    });
    Ok((changes, reversal))
}

/// Undoes an expansion by compressing the inserted bands away again.
///
/// Inserted rows/columns that have gained content since the snapshot are left
/// in place; only still-removable indices are compressed. Returns the applied
/// changes (empty when every inserted band has been claimed). Cancellable the
/// same way [`compress_layout`] is.
pub fn reverse_expansion(
    layout: &mut Layout,
    shapes: &dyn ShapeFacts,
    reversal: &ExpansionReversal,
    monitor: &mut dyn ProgressMonitor,
    range: ProgressRange,
) -> Result<Vec<LayoutChange>, Cancelled> {
    checkpoint(monitor, range.at(0.0))?;
    let grid = layout.occupancy_grid(shapes, GridStrictness::Strict, None);
    let vetoed_rows = grid.added_corner_rows(&reversal.occupied_after);
    let vetoed_cols = grid.added_corner_columns(&reversal.occupied_after);

    let rows: Vec<i32> = reversal
        .inserted_rows()
        .into_iter()
        .filter(|row| !vetoed_rows.contains(row))
        .collect();
    let cols: Vec<i32> = reversal
        .inserted_cols()
        .into_iter()
        .filter(|col| !vetoed_cols.contains(col))
        .collect();
    compress_layout(layout, &rows, &cols, monitor, range.sub(0.2, 1.0))
}
