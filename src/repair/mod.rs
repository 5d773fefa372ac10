// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Topology and orthogonality repair.
//!
//! Topology repair runs in three phases per tree: drop degenerate segments,
//! remove corners that do not turn, then resolve branches that occupy the
//! same trace. Orthogonalization then fixes diagonal runs deepest-first,
//! re-running the topology phases after every local fix. Across a layout,
//! trees are processed worst-first by non-orthogonal area with a stable id
//! tie-break, so identical inputs repair identically.


use std::collections::BTreeSet;

use crate::grid::{CellContent, GridStrictness, OccupancyGrid};
use crate::model::facts::ShapeFacts;
use crate::model::geom::{run_cells, Axis, Point, COORD_EPS};
use crate::model::ids::{LinkId, TreeId};
use crate::model::layout::Layout;
use crate::progress::{checkpoint, Cancelled, ProgressMonitor, ProgressRange};
use crate::tree::segment::{SegmentId, SegmentIx};
use crate::tree::BusTree;

/// The three-state result of one topology pass.
///
/// `SomeRepaired` is success-with-warning: the layout stays structurally
/// valid and batch processing continues. Only `Unrepairable` stops further
/// optimization of that tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyOutcome {
    AllRepaired,
    SomeRepaired,
    Unrepairable,
}

/// What one orthogonalization pass achieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrthoReport {
    pub fixed: usize,
    /// Runs that still refuse an axis-aligned form after the direct-split
    /// fallback; reported, never fatal.
    pub failed: usize,
}

/// Whole-layout repair summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub trees_processed: usize,
    pub all_repaired: usize,
    pub some_repaired: usize,
    pub unrepairable: usize,
    pub ortho_failed: usize,
}

/// Sum of the rectangular areas spanned by non-orthogonal runs; the
/// worst-first ordering key.
pub fn non_ortho_area(tree: &BusTree) -> f64 {
    tree.geometry()
        .iter()
        .filter(|run| !run.start.coincident(run.end) && run.start.axis_to(run.end).is_none())
        .map(|run| {
            let dx = (run.end.x() - run.start.x()).abs();
            let dy = (run.end.y() - run.start.y()).abs();
            dx * dy
        })
        .sum()
}

fn drop_degenerate_segments(tree: &mut BusTree) -> usize {
    let mut dropped = 0;
    loop {
        // The last segment of a multi-link tree is its only junction;
        // splicing it out would leave several drops claiming the direct form.
        if tree.segments().len() == 1 && tree.link_count() > 1 {
            break;
        }
        let candidate = tree
            .segments()
            .iter()
            .find_map(|(ix, seg)| seg.is_zero_length().then_some(*ix));
        let Some(ix) = candidate else {
            break;
        };
        tree.splice_out_segment(ix);
        dropped += 1;
    }
    dropped
}

/// Whether the straight run `a..b` would cross a node footprint.
fn run_blocked_by_node(grid: &OccupancyGrid, a: Point, b: Point) -> bool {
    run_cells(a, b)
        .into_iter()
        .any(|cell| grid.content(cell).has(CellContent::NODE))
}

fn remove_useless_corners(tree: &mut BusTree, grid: &OccupancyGrid) -> usize {
    let mut removed = 0;
    loop {
        let mut candidate = None;
        for (ix, seg) in tree.segments() {
            let children = tree.children_of(Some(*ix));
            if children.len() != 1 || !tree.drops_on(Some(*ix)).is_empty() {
                continue;
            }
            let child = children[0];
            let child_seg = tree.segment(child).expect("child exists");
            let (Some(axis), Some(child_axis)) = (seg.axis(), child_seg.axis()) else {
                continue;
            };
            if axis != child_axis {
                continue;
            }
            // Doubling back is a turn in disguise; fusing would shorten the
            // trace, which is phase 3's business, not ours.
            let forward = match axis {
                Axis::Horizontal => {
                    (seg.end().x() - seg.start().x()) * (child_seg.end().x() - child_seg.start().x())
                        > 0.0
                }
                Axis::Vertical => {
                    (seg.end().y() - seg.start().y()) * (child_seg.end().y() - child_seg.start().y())
                        > 0.0
                }
            };
            if !forward {
                continue;
            }
            // The fused run keeps the same trace; the grid check guards the
            // contract that corner removal never introduces a new overlap.
            if run_blocked_by_node(grid, seg.start(), child_seg.end()) {
                continue;
            }
            candidate = Some(*ix);
            break;
        }
        let Some(ix) = candidate else {
            break;
        };
        if tree.remove_corner(ix) {
            removed += 1;
        } else {
            break;
        }
    }
    removed
}

/// Collinear same-axis run pairs whose extents overlap with positive length.
///
/// Interior segment pairs are reported wherever they overlap, so phase 3 can
/// flag the unreachable ones. Pairs involving an end drop are only reported
/// when both runs leave the same junction; a drop doubling back over a run
/// from the far end is not a shape this pass repairs.
fn overlapping_pairs(tree: &BusTree) -> Vec<(SegmentId, SegmentId)> {
    let runs: Vec<(SegmentId, Point, Point)> = tree
        .geometry()
        .into_iter()
        .filter(|run| !matches!(run.id, SegmentId::StartDrop | SegmentId::Direct))
        .filter(|run| !run.start.coincident(run.end))
        .map(|run| (run.id, run.start, run.end))
        .collect();
    let mut pairs = Vec::new();
    for (pos, (a_id, a_start, a_end)) in runs.iter().enumerate() {
        for (b_id, b_start, b_end) in runs.iter().skip(pos + 1) {
            let (Some(a_axis), Some(b_axis)) = (a_start.axis_to(*a_end), b_start.axis_to(*b_end))
            else {
                continue;
            };
            if a_axis != b_axis {
                continue;
            }
            let (a_fixed, a_lo, a_hi, b_fixed, b_lo, b_hi) = match a_axis {
                Axis::Horizontal => (
                    a_start.y(),
                    a_start.x().min(a_end.x()),
                    a_start.x().max(a_end.x()),
                    b_start.y(),
                    b_start.x().min(b_end.x()),
                    b_start.x().max(b_end.x()),
                ),
                Axis::Vertical => (
                    a_start.x(),
                    a_start.y().min(a_end.y()),
                    a_start.y().max(a_end.y()),
                    b_start.x(),
                    b_start.y().min(b_end.y()),
                    b_start.y().max(b_end.y()),
                ),
            };
            if (a_fixed - b_fixed).abs() > COORD_EPS {
                continue;
            }
            let overlap = a_hi.min(b_hi) - a_lo.max(b_lo);
            if overlap <= COORD_EPS {
                continue;
            }
            let involves_drop = matches!(a_id, SegmentId::EndDrop(_))
                || matches!(b_id, SegmentId::EndDrop(_));
            if involves_drop && !a_start.coincident(*b_start) {
                continue;
            }
            pairs.push((*a_id, *b_id));
        }
    }
    pairs
}

/// Resolves one shared-trace pair by reattaching the shorter branch where the
/// two runs diverge. Handles the common fan shape (both runs leaving the same
/// corner in the same direction); anything else is left for the report.
fn resolve_overlap(tree: &mut BusTree, a: SegmentIx, b: SegmentIx) -> bool {
    let (Some(seg_a), Some(seg_b)) = (tree.segment(a).copied(), tree.segment(b).copied()) else {
        return false;
    };
    if !seg_a.start().coincident(seg_b.start()) {
        return false;
    }
    // Keeper is the longer run; the shorter one dissolves into it.
    let (keeper, gone) = if seg_a.length() >= seg_b.length() { (a, b) } else { (b, a) };
    let keeper_seg = *tree.segment(keeper).expect("keeper exists");
    let gone_seg = *tree.segment(gone).expect("gone exists");

    if keeper_seg.end().coincident(gone_seg.end()) {
        // Identical runs: move everything over.
        for child in tree.children_of(Some(gone)) {
            let child_seg = tree.segment_mut(child).expect("child exists");
            child_seg.set_parent(Some(keeper));
        }
        for link in tree.drops_on(Some(gone)) {
            tree.drop_mut(link).expect("drop exists").set_attach(Some(keeper));
        }
        tree.remove_segment_raw(gone);
        return true;
    }

    // The shorter run ends midway along the keeper: split the keeper there
    // and hang the shorter run's subtree off the first half.
    let Some(_tail) = tree.split_segment_at_point(keeper, gone_seg.end()) else {
        return false;
    };
    for child in tree.children_of(Some(gone)) {
        let child_seg = tree.segment_mut(child).expect("child exists");
        child_seg.set_parent(Some(keeper));
    }
    for link in tree.drops_on(Some(gone)) {
        tree.drop_mut(link).expect("drop exists").set_attach(Some(keeper));
    }
    tree.remove_segment_raw(gone);
    true
}

/// A drop retracing a sibling segment from the same junction rides the
/// segment instead: the drop reattaches where the two runs diverge.
fn resolve_drop_onto_segment(tree: &mut BusTree, seg_ix: SegmentIx, link: LinkId) -> bool {
    let Some(seg) = tree.segment(seg_ix).copied() else {
        return false;
    };
    let Some(drop) = tree.drop_for(link).copied() else {
        return false;
    };
    let Some(start) = tree.attach_point(SegmentId::EndDrop(link)) else {
        return false;
    };
    if !start.coincident(seg.start()) {
        return false;
    }

    let drop_len = start.distance(drop.end_point());
    if drop_len + COORD_EPS < seg.length() {
        // The drop lands midway along the segment: split there first.
        if tree.split_segment_at_point(seg_ix, drop.end_point()).is_none() {
            return false;
        }
    }
    tree.drop_mut(link).expect("drop exists").set_attach(Some(seg_ix));
    true
}

/// Two drops retracing the same trace from one junction get a shared segment
/// up to the nearer landing; both drops hang off it.
fn resolve_shared_drop_trace(tree: &mut BusTree, a: LinkId, b: LinkId) -> bool {
    let (Some(drop_a), Some(drop_b)) =
        (tree.drop_for(a).copied(), tree.drop_for(b).copied())
    else {
        return false;
    };
    if drop_a.attach() != drop_b.attach() {
        return false;
    }
    let Some(start) = tree.attach_point(SegmentId::EndDrop(a)) else {
        return false;
    };

    let len_a = start.distance(drop_a.end_point());
    let len_b = start.distance(drop_b.end_point());
    let near_end = if len_a <= len_b { drop_a.end_point() } else { drop_b.end_point() };

    let shared = tree.add_segment(drop_a.attach(), start, near_end);
    tree.drop_mut(a).expect("drop exists").set_attach(Some(shared));
    tree.drop_mut(b).expect("drop exists").set_attach(Some(shared));
    true
}

fn resolve_overlap_runs(tree: &mut BusTree, a: SegmentId, b: SegmentId) -> bool {
    match (a, b) {
        (SegmentId::Interior(x), SegmentId::Interior(y)) => resolve_overlap(tree, x, y),
        (SegmentId::Interior(seg), SegmentId::EndDrop(link))
        | (SegmentId::EndDrop(link), SegmentId::Interior(seg)) => {
            resolve_drop_onto_segment(tree, seg, link)
        }
        (SegmentId::EndDrop(x), SegmentId::EndDrop(y)) => resolve_shared_drop_trace(tree, x, y),
        _ => false,
    }
}

/// The three-phase topology pass. Progress is reported proportionally inside
/// `range`; cancellation unwinds with already-applied phases kept.
pub fn repair_tree_topology(
    tree: &mut BusTree,
    grid: &OccupancyGrid,
    monitor: &mut dyn ProgressMonitor,
    range: ProgressRange,
) -> Result<TopologyOutcome, Cancelled> {
    drop_degenerate_segments(tree);
    checkpoint(monitor, range.at(1.0 / 3.0))?;

    remove_useless_corners(tree, grid);
    checkpoint(monitor, range.at(2.0 / 3.0))?;

    let mut resolved = 0;
    loop {
        let pairs = overlapping_pairs(tree);
        let Some((a, b)) = pairs.first().copied() else {
            break;
        };
        if !resolve_overlap_runs(tree, a, b) {
            // First unresolvable pair: scan the rest for anything fixable
            // before giving a verdict.
            let fixable = pairs
                .iter()
                .skip(1)
                .any(|(a, b)| resolve_overlap_runs(tree, *a, *b));
            if fixable {
                resolved += 1;
                continue;
            }
            checkpoint(monitor, range.at(1.0))?;
            return Ok(if resolved > 0 {
                TopologyOutcome::SomeRepaired
            } else {
                TopologyOutcome::Unrepairable
            });
        }
        resolved += 1;
        // Fusing runs can produce fresh degenerate pieces and straight-through
        // corners; fold them away before the next scan.
        drop_degenerate_segments(tree);
        remove_useless_corners(tree, grid);
    }
    checkpoint(monitor, range.at(1.0))?;
    debug_assert!(tree.validate().is_ok(), "topology repair left the tree malformed");
    Ok(TopologyOutcome::AllRepaired)
}

fn run_depth(tree: &BusTree, id: SegmentId) -> usize {
    match id {
        SegmentId::Interior(ix) => tree.depth_of(ix),
        SegmentId::EndDrop(link) => tree
            .drop_for(link)
            .and_then(|drop| drop.attach())
            .map(|attach| tree.depth_of(attach) + 1)
            .unwrap_or(0),
        SegmentId::StartDrop | SegmentId::Direct => 0,
    }
}

/// Deepest non-orthogonal run not yet given up on; children before parents so
/// a parent fix cannot invalidate an already-fixed child.
fn deepest_non_ortho(tree: &BusTree, skip: &BTreeSet<SegmentId>) -> Option<SegmentId> {
    tree.geometry()
        .iter()
        .filter(|run| !run.start.coincident(run.end) && run.start.axis_to(run.end).is_none())
        .filter(|run| !skip.contains(&run.id))
        .map(|run| (run_depth(tree, run.id), run.id))
        .max_by(|(depth_a, id_a), (depth_b, id_b)| {
            depth_a.cmp(depth_b).then(id_b.cmp(id_a))
        })
        .map(|(_, id)| id)
}

/// Elbow corner for the diagonal `a..b`. A candidate corner sitting on a node
/// footprint is rejected (the run itself may enter the cells of its own
/// endpoints' nodes, so only the corner cell is tested). Vertical-first wins
/// when both candidates are clear.
fn pick_elbow(grid: &OccupancyGrid, a: Point, b: Point) -> Option<Point> {
    let vertical_first = Point::new(a.x(), b.y());
    let horizontal_first = Point::new(b.x(), a.y());
    [vertical_first, horizontal_first]
        .into_iter()
        .find(|elbow| !grid.content(elbow.grid_cell()).has(CellContent::NODE))
}

fn fix_one_run(tree: &mut BusTree, grid: &OccupancyGrid, id: SegmentId) -> bool {
    match id {
        SegmentId::Interior(ix) => {
            let seg = *tree.segment(ix).expect("segment exists");
            let Some(elbow) = pick_elbow(grid, seg.start(), seg.end()) else {
                return false;
            };
            tree.split_segment_at_point(ix, elbow).is_some()
        }
        SegmentId::EndDrop(link) => {
            let drop = *tree.drop_for(link).expect("drop exists");
            let start = tree
                .attach_point(SegmentId::EndDrop(link))
                .expect("drop has an attach point");
            let Some(elbow) = pick_elbow(grid, start, drop.end_point()) else {
                return false;
            };
            let new_ix = tree.add_segment(drop.attach(), start, elbow);
            tree.drop_mut(link).expect("drop exists").set_attach(Some(new_ix));
            true
        }
        // A direct link with no in-place fix: split at the midpoint and let
        // the halves be fixed as segment + drop.
        SegmentId::Direct => tree.split_no_segment_bus().is_some(),
        SegmentId::StartDrop => false,
    }
}

/// Fixes every non-orthogonal run of one tree, deepest first.
///
/// After each local fix the topology phases re-run, since a fix can introduce
/// fresh overlaps. Runs that cannot be fixed go into a skip-set (no retries
/// within a pass) and are counted in the report.
pub fn fix_all_non_ortho_for_tree(
    tree: &mut BusTree,
    grid: &OccupancyGrid,
    monitor: &mut dyn ProgressMonitor,
    range: ProgressRange,
) -> Result<OrthoReport, Cancelled> {
    let mut skip: BTreeSet<SegmentId> = BTreeSet::new();
    let mut fixed = 0usize;
    // A direct split replaces one run by two, hence the slack in the estimate.
    let estimate = tree
        .geometry()
        .iter()
        .filter(|run| run.start.axis_to(run.end).is_none() && !run.start.coincident(run.end))
        .count()
        * 2
        + 1;
    let mut reported = range.start();

    while let Some(id) = deepest_non_ortho(tree, &skip) {
        let frac = (((fixed + skip.len()) as f64) / estimate as f64).min(1.0);
        reported = reported.max(range.at(frac));
        checkpoint(monitor, reported)?;

        if fix_one_run(tree, grid, id) {
            fixed += 1;
            // The nested topology pass reports at the current point so the
            // overall fraction never runs ahead of the work.
            repair_tree_topology(tree, grid, monitor, range.sub(frac, frac))?;
        } else {
            skip.insert(id);
        }
    }
    checkpoint(monitor, range.at(1.0))?;
    debug_assert!(tree.validate().is_ok(), "orthogonalization left the tree malformed");
    Ok(OrthoReport { fixed, failed: skip.len() })
}

/// Worst-first tree order: largest non-orthogonal area first, ids ascending
/// on ties.
pub fn worst_first_order(layout: &Layout) -> Vec<TreeId> {
    let mut keyed: Vec<(f64, TreeId)> = layout
        .trees()
        .iter()
        .map(|(id, tree)| (non_ortho_area(tree), id))
        .collect();
    keyed.sort_by(|(area_a, id_a), (area_b, id_b)| {
        area_b.total_cmp(area_a).then(id_a.cmp(id_b))
    });
    keyed.into_iter().map(|(_, id)| id).collect()
}

/// Repairs every tree of the layout: topology first, then orthogonalization,
/// in worst-first order. The grid is rebuilt per tree from everything else in
/// the layout, so each tree is repaired against current ground truth.
pub fn repair_layout(
    layout: &mut Layout,
    shapes: &dyn ShapeFacts,
    monitor: &mut dyn ProgressMonitor,
    range: ProgressRange,
) -> Result<RepairReport, Cancelled> {
    let order = worst_first_order(layout);
    let slices = range.slices(order.len());
    let mut report = RepairReport::default();

    for (tree_id, slice) in order.into_iter().zip(slices) {
        checkpoint(monitor, slice.start())?;
        let grid = layout.occupancy_grid(shapes, GridStrictness::Strict, Some(tree_id));
        let tree = layout
            .trees_mut()
            .tree_mut(tree_id)
            .expect("ordered tree exists");

        let outcome = repair_tree_topology(tree, &grid, monitor, slice.sub(0.0, 0.5))?;
        report.trees_processed += 1;
        match outcome {
            TopologyOutcome::AllRepaired => report.all_repaired += 1,
            TopologyOutcome::SomeRepaired => report.some_repaired += 1,
            TopologyOutcome::Unrepairable => {
                // Per-tree optimization stops here for this tree.
                report.unrepairable += 1;
                continue;
            }
        }

        let ortho = fix_all_non_ortho_for_tree(tree, &grid, monitor, slice.sub(0.5, 1.0))?;
        report.ortho_failed += ortho.failed;
    }
    checkpoint(monitor, range.at(1.0))?;
    Ok(report)
}
