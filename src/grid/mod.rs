// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The occupancy grid: which cells of the layout grid are covered by what.
//!
//! The grid is rebuilt on demand from the current layout before each repair,
//! compression or placement operation and never persisted. Queries never
//! fail: absent data simply yields empty candidate sets.


use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::geom::{GridCell, Rect};
use crate::tree::BusTree;

/// What occupies one cell. Flags accumulate: a cell can hold both a node
/// footprint and a link trace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellContent(u8);

impl CellContent {
    pub const EMPTY: CellContent = CellContent(0);
    pub const NODE: CellContent = CellContent(1);
    pub const LINK: CellContent = CellContent(1 << 1);
    pub const MODULE: CellContent = CellContent(1 << 2);

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn has(&self, flag: CellContent) -> bool {
        self.0 & flag.0 != 0
    }

    fn add(&mut self, flag: CellContent) {
        self.0 |= flag.0;
    }
}

/// How much clearance module geometry demands.
///
/// Overlay-module boundaries need a padding ring that plain node/link
/// occupancy does not, so strictness is a parameter of grid construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridStrictness {
    Strict,
    ModulePadded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyGrid {
    cells: BTreeMap<GridCell, CellContent>,
    strictness: GridStrictness,
}

impl OccupancyGrid {
    pub fn new(strictness: GridStrictness) -> Self {
        Self { cells: BTreeMap::new(), strictness }
    }

    pub fn strictness(&self) -> GridStrictness {
        self.strictness
    }

    pub fn content(&self, cell: GridCell) -> CellContent {
        self.cells.get(&cell).copied().unwrap_or(CellContent::EMPTY)
    }

    pub fn is_occupied(&self, cell: GridCell) -> bool {
        !self.content(cell).is_empty()
    }

    pub fn occupied_cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        self.cells.keys().copied()
    }

    /// Cells currently occupied, as an owned snapshot for reversal records.
    pub fn occupied_snapshot(&self) -> BTreeSet<GridCell> {
        self.cells.keys().copied().collect()
    }

    pub fn mark(&mut self, cell: GridCell, content: CellContent) {
        self.cells.entry(cell).or_default().add(content);
    }

    /// Marks a node footprint.
    pub fn render_node(&mut self, bounds: Rect) {
        for cell in bounds.grid_cells() {
            self.mark(cell, CellContent::NODE);
        }
    }

    /// Marks the full trace of a bus tree (segments and drops).
    pub fn render_tree(&mut self, tree: &BusTree) {
        for cell in tree.trace_cells() {
            self.mark(cell, CellContent::LINK);
        }
    }

    /// Marks an overlay-module boundary; under `ModulePadded` strictness the
    /// boundary ring grows by one cell outward.
    pub fn render_module(&mut self, bounds: Rect) {
        let cols = bounds.grid_cols();
        let rows = bounds.grid_rows();
        let (col_lo, col_hi) = (*cols.start(), *cols.end());
        let (row_lo, row_hi) = (*rows.start(), *rows.end());
        let pad = match self.strictness {
            GridStrictness::Strict => 0,
            GridStrictness::ModulePadded => 1,
        };
        for col in (col_lo - pad)..=(col_hi + pad) {
            for row in (row_lo - pad)..=(row_hi + pad) {
                let on_ring = col <= col_lo || col >= col_hi || row <= row_lo || row >= row_hi;
                if on_ring {
                    self.mark(GridCell::new(col, row), CellContent::MODULE);
                }
            }
        }
    }

    fn row_is_empty(&self, row: i32, bounds: &Rect, ignore: &BTreeSet<i32>) -> bool {
        if ignore.contains(&row) {
            return false;
        }
        self.cells
            .iter()
            .all(|(cell, content)| cell.row() != row || content.is_empty() || !bounds_contains_col(bounds, cell.col()))
    }

    fn col_is_empty(&self, col: i32, bounds: &Rect, ignore: &BTreeSet<i32>) -> bool {
        if ignore.contains(&col) {
            return false;
        }
        self.cells
            .iter()
            .all(|(cell, content)| cell.col() != col || content.is_empty() || !bounds_contains_row(bounds, cell.row()))
    }

    /// Rows inside `bounds` with no occupied cell, sorted ascending.
    ///
    /// `ignore` removes rows some collaborator requires kept (overlay-module
    /// exclusions) even though nothing occupies them.
    pub fn empty_rows(&self, bounds: Rect, ignore: &BTreeSet<i32>) -> Vec<i32> {
        bounds
            .grid_rows()
            .filter(|row| self.row_is_empty(*row, &bounds, ignore))
            .collect()
    }

    /// Columns inside `bounds` with no occupied cell, sorted ascending.
    pub fn empty_columns(&self, bounds: Rect, ignore: &BTreeSet<i32>) -> Vec<i32> {
        bounds
            .grid_cols()
            .filter(|col| self.col_is_empty(*col, &bounds, ignore))
            .collect()
    }

    /// Rows where new space can be inserted below without tearing a node
    /// footprint apart. With `reversible` set, rows carrying any node content
    /// are refused as well, so the inserted space stays recognizably empty
    /// and the expansion can later be undone. Only cells within `bounds` are
    /// consulted, matching [`OccupancyGrid::empty_rows`].
    pub fn expandable_rows(&self, bounds: Rect, reversible: bool) -> Vec<i32> {
        bounds
            .grid_rows()
            .filter(|row| {
                let mut has_node = false;
                for (cell, content) in &self.cells {
                    if cell.row() != *row
                        || !content.has(CellContent::NODE)
                        || !bounds_contains_col(&bounds, cell.col())
                    {
                        continue;
                    }
                    has_node = true;
                    if self.content(cell.offset(0, 1)).has(CellContent::NODE) {
                        return false;
                    }
                }
                !(reversible && has_node)
            })
            .collect()
    }

    /// Column counterpart of [`OccupancyGrid::expandable_rows`].
    pub fn expandable_columns(&self, bounds: Rect, reversible: bool) -> Vec<i32> {
        bounds
            .grid_cols()
            .filter(|col| {
                let mut has_node = false;
                for (cell, content) in &self.cells {
                    if cell.col() != *col
                        || !content.has(CellContent::NODE)
                        || !bounds_contains_row(&bounds, cell.row())
                    {
                        continue;
                    }
                    has_node = true;
                    if self.content(cell.offset(1, 0)).has(CellContent::NODE) {
                        return false;
                    }
                }
                !(reversible && has_node)
            })
            .collect()
    }

    /// Rows occupied now that were empty in `before`.
    ///
    /// Used to refuse reversing an expansion whose inserted space has since
    /// been filled in.
    pub fn added_corner_rows(&self, before: &BTreeSet<GridCell>) -> BTreeSet<i32> {
        self.cells
            .keys()
            .filter(|cell| !before.contains(cell))
            .map(|cell| cell.row())
            .collect()
    }

    /// Column counterpart of [`OccupancyGrid::added_corner_rows`].
    pub fn added_corner_columns(&self, before: &BTreeSet<GridCell>) -> BTreeSet<i32> {
        self.cells
            .keys()
            .filter(|cell| !before.contains(cell))
            .map(|cell| cell.col())
            .collect()
    }

    fn footprint_free(&self, origin: GridCell, cols: u32, rows: u32) -> bool {
        for dcol in 0..cols as i32 {
            for drow in 0..rows as i32 {
                if self.is_occupied(origin.offset(dcol, drow)) {
                    return false;
                }
            }
        }
        true
    }

    /// Outward spiral search for a free `cols × rows` placement near
    /// `origin`. Candidates within a ring are scanned in sorted order, so
    /// repeated searches are deterministic. Gives up after `max_ring` rings.
    pub fn find_free_cell(
        &self,
        origin: GridCell,
        cols: u32,
        rows: u32,
        max_ring: u32,
    ) -> Option<GridCell> {
        if self.footprint_free(origin, cols, rows) {
            return Some(origin);
        }
        for ring in 1..=max_ring as i32 {
            let mut candidates = Vec::with_capacity((ring as usize) * 8);
            for dcol in -ring..=ring {
                candidates.push(origin.offset(dcol, -ring));
                candidates.push(origin.offset(dcol, ring));
            }
            for drow in (-ring + 1)..ring {
                candidates.push(origin.offset(-ring, drow));
                candidates.push(origin.offset(ring, drow));
            }
            candidates.sort();
            for candidate in candidates {
                if self.footprint_free(candidate, cols, rows) {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

fn bounds_contains_col(bounds: &Rect, col: i32) -> bool {
    bounds.grid_cols().contains(&col)
}

fn bounds_contains_row(bounds: &Rect, row: i32) -> bool {
    bounds.grid_rows().contains(&row)
}
