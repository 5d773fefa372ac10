// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Geometry primitives shared by every layout component.
//!
//! World coordinates are `f64` points that (for laid-out elements) sit on
//! multiples of [`GRID_UNIT`]. Grid coordinates are integer cells obtained by
//! rounding world coordinates down to the grid.

use serde::{Deserialize, Serialize};

/// Side length of one grid cell in world units.
pub const GRID_UNIT: f64 = 10.0;

/// Tolerance for coordinate comparisons on world points.
pub const COORD_EPS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub const fn x(&self) -> f64 {
        self.x
    }

    pub const fn y(&self) -> f64 {
        self.y
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }

    pub fn coincident(self, other: Point) -> bool {
        (self.x - other.x).abs() <= COORD_EPS && (self.y - other.y).abs() <= COORD_EPS
    }

    /// Affine midpoint of `self` and `other`.
    pub fn midpoint(self, other: Point) -> Self {
        Self { x: (self.x + other.x) / 2.0, y: (self.y + other.y) / 2.0 }
    }

    /// Axis of the run from `self` to `other`.
    ///
    /// `None` for diagonal runs and for coincident endpoints.
    pub fn axis_to(self, other: Point) -> Option<Axis> {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        if dx <= COORD_EPS && dy <= COORD_EPS {
            return None;
        }
        if dy <= COORD_EPS {
            return Some(Axis::Horizontal);
        }
        if dx <= COORD_EPS {
            return Some(Axis::Vertical);
        }
        None
    }

    pub fn distance(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Distance from this point to the closed segment `a..b`.
    pub fn distance_to_segment(self, a: Point, b: Point) -> f64 {
        let len2 = (b.x - a.x).powi(2) + (b.y - a.y).powi(2);
        if len2 <= COORD_EPS * COORD_EPS {
            return self.distance(a);
        }
        let t = ((self.x - a.x) * (b.x - a.x) + (self.y - a.y) * (b.y - a.y)) / len2;
        let t = t.clamp(0.0, 1.0);
        self.distance(Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y)))
    }

    /// The grid cell this point falls in.
    pub fn grid_cell(self) -> GridCell {
        GridCell::new(
            (self.x / GRID_UNIT).round() as i32,
            (self.y / GRID_UNIT).round() as i32,
        )
    }
}

/// An integer cell of the layout grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct GridCell {
    col: i32,
    row: i32,
}

impl GridCell {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub const fn col(&self) -> i32 {
        self.col
    }

    pub const fn row(&self) -> i32 {
        self.row
    }

    pub fn offset(self, dcol: i32, drow: i32) -> Self {
        Self { col: self.col + dcol, row: self.row + drow }
    }

    /// World-space center of the cell.
    pub fn center(self) -> Point {
        Point::new(self.col as f64 * GRID_UNIT, self.row as f64 * GRID_UNIT)
    }
}

/// Every cell touched by the axis-aligned or diagonal run `a..b`.
///
/// Diagonal runs are rasterized conservatively (the bounding staircase), which
/// is what occupancy queries want: a diagonal segment blocks everything it
/// could be pushed through during orthogonalization.
pub fn run_cells(a: Point, b: Point) -> Vec<GridCell> {
    let start = a.grid_cell();
    let end = b.grid_cell();

    let mut cells = Vec::new();
    let col_lo = start.col().min(end.col());
    let col_hi = start.col().max(end.col());
    let row_lo = start.row().min(end.row());
    let row_hi = start.row().max(end.row());

    if col_lo == col_hi || row_lo == row_hi {
        for col in col_lo..=col_hi {
            for row in row_lo..=row_hi {
                cells.push(GridCell::new(col, row));
            }
        }
        return cells;
    }

    // Diagonal: walk the dominant axis and cover the rows the ideal line
    // passes through for each column.
    let dx = (end.col() - start.col()) as f64;
    let dy = (end.row() - start.row()) as f64;
    for col in col_lo..=col_hi {
        let t0 = ((col as f64 - 0.5) - start.col() as f64) / dx;
        let t1 = ((col as f64 + 0.5) - start.col() as f64) / dx;
        let (t0, t1) = (t0.clamp(0.0, 1.0), t1.clamp(0.0, 1.0));
        let y0 = start.row() as f64 + dy * t0.min(t1);
        let y1 = start.row() as f64 + dy * t0.max(t1);
        let r0 = (y0.round() as i32).clamp(row_lo, row_hi);
        let r1 = (y1.round() as i32).clamp(row_lo, row_hi);
        for row in r0.min(r1)..=r0.max(r1) {
            cells.push(GridCell::new(col, row));
        }
    }
    cells.sort();
    cells.dedup();
    cells
}

/// Axis-aligned rectangle in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Rect {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        assert!(
            min_x <= max_x && min_y <= max_y,
            "rect must be normalized (got {min_x},{min_y}..{max_x},{max_y})"
        );
        Self { min_x, min_y, max_x, max_y }
    }

    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x().min(b.x()),
            min_y: a.y().min(b.y()),
            max_x: a.x().max(b.x()),
            max_y: a.y().max(b.y()),
        }
    }

    pub const fn min_x(&self) -> f64 {
        self.min_x
    }

    pub const fn min_y(&self) -> f64 {
        self.min_y
    }

    pub const fn max_x(&self) -> f64 {
        self.max_x
    }

    pub const fn max_y(&self) -> f64 {
        self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x() >= self.min_x - COORD_EPS
            && p.x() <= self.max_x + COORD_EPS
            && p.y() >= self.min_y - COORD_EPS
            && p.y() <= self.max_y + COORD_EPS
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.contains(Point::new(other.min_x, other.min_y))
            && self.contains(Point::new(other.max_x, other.max_y))
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    pub fn union(&self, other: &Rect) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// True when `p` lies within `tolerance` of the rectangle boundary.
    pub fn on_boundary(&self, p: Point, tolerance: f64) -> bool {
        if !self.expand(tolerance).contains(p) {
            return false;
        }
        let inner_min_x = self.min_x + tolerance;
        let inner_max_x = self.max_x - tolerance;
        let inner_min_y = self.min_y + tolerance;
        let inner_max_y = self.max_y - tolerance;
        if inner_min_x > inner_max_x || inner_min_y > inner_max_y {
            return true;
        }
        !(p.x() > inner_min_x && p.x() < inner_max_x && p.y() > inner_min_y && p.y() < inner_max_y)
    }

    /// Grid columns spanned by the rectangle (inclusive).
    pub fn grid_cols(&self) -> std::ops::RangeInclusive<i32> {
        let lo = Point::new(self.min_x, self.min_y).grid_cell().col();
        let hi = Point::new(self.max_x, self.max_y).grid_cell().col();
        lo..=hi
    }

    /// Grid rows spanned by the rectangle (inclusive).
    pub fn grid_rows(&self) -> std::ops::RangeInclusive<i32> {
        let lo = Point::new(self.min_x, self.min_y).grid_cell().row();
        let hi = Point::new(self.max_x, self.max_y).grid_cell().row();
        lo..=hi
    }

    pub fn grid_cells(&self) -> Vec<GridCell> {
        let mut cells = Vec::new();
        for col in self.grid_cols() {
            for row in self.grid_rows() {
                cells.push(GridCell::new(col, row));
            }
        }
        cells
    }
}
