// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use rstest::rstest;

use crate::model::fixtures::{fan_out_fixture, module_fixture};
use crate::model::geom::{Point, Rect};
use crate::model::ids::NodeId;
use crate::progress::{Progress, ProgressMonitor, ProgressRange, SilentMonitor};

use super::{
    compress_layout, compression_candidates, expand_layout, reverse_expansion,
    ExpansionReversal,
};

struct StopAfter(usize);

impl ProgressMonitor for StopAfter {
    fn report(&mut self, _fraction: f64) -> Progress {
        if self.0 == 0 {
            Progress::Stop
        } else {
            self.0 -= 1;
            Progress::Continue
        }
    }
}

#[test]
fn candidates_skip_module_boundary_rows() {
    let (layout, facts, _) = module_fixture();
    let (rows, _cols) = compression_candidates(&layout, &facts);

    // The gap between the pathway and the module is removable...
    assert!(rows.contains(&6));
    assert!(rows.contains(&7));
    // ...but module boundary rows are not, even though the module has no
    // members rendered inside it, and its edge columns keep interior rows
    // occupied.
    assert!(!rows.contains(&8));
    assert!(!rows.contains(&10));
    assert!(!rows.contains(&16));
}

#[test]
fn compression_shifts_only_elements_beyond_removed_rows() {
    let mut layout = crate::model::layout::Layout::new();
    layout.set_node_position(NodeId::new(1), Point::new(0.0, 0.0));
    layout.set_node_position(NodeId::new(2), Point::new(0.0, 100.0));

    let changes =
        compress_layout(&mut layout, &[4, 5], &[], &mut SilentMonitor, ProgressRange::full())
            .expect("not cancelled");

    assert_eq!(changes.len(), 1);
    assert!(layout
        .node_positions()
        .get(&NodeId::new(1))
        .expect("node")
        .coincident(Point::new(0.0, 0.0)));
    assert!(layout
        .node_positions()
        .get(&NodeId::new(2))
        .expect("node")
        .coincident(Point::new(0.0, 80.0)));
}

#[test]
fn compression_carries_tree_geometry_along() {
    let (mut layout, _, tree_id) = fan_out_fixture();

    // Everything sits beyond the removed column band, so the whole layout
    // shifts left as one piece.
    let changes =
        compress_layout(&mut layout, &[], &[-3, -2], &mut SilentMonitor, ProgressRange::full())
            .expect("not cancelled");

    assert!(changes
        .iter()
        .any(|change| matches!(change, crate::model::change::LayoutChange::Tree { .. })));
    let tree = layout.trees().tree(tree_id).expect("tree");
    assert!(tree.root_point().coincident(Point::new(-20.0, 0.0)));
    assert!(tree
        .drop_for(crate::model::ids::LinkId::new(11))
        .expect("drop")
        .end_point()
        .coincident(Point::new(100.0, 40.0)));
    assert!(tree.validate().is_ok());
    assert!(layout
        .node_positions()
        .get(&NodeId::new(1))
        .expect("node")
        .coincident(Point::new(-20.0, 0.0)));
}

#[test]
fn module_shapes_shrink_across_removed_rows() {
    let (mut layout, _, module) = module_fixture();

    compress_layout(&mut layout, &[10, 11], &[], &mut SilentMonitor, ProgressRange::full())
        .expect("not cancelled");

    let shape = layout.modules().get(&module).expect("module");
    assert_eq!(shape.bounds(), Rect::new(-40.0, 80.0, 160.0, 140.0));
    assert!(shape.name_point().coincident(Point::new(-40.0, 80.0)));
}

#[test]
fn cancellation_keeps_already_shifted_classes_committed() {
    let (mut layout, _, tree_id) = fan_out_fixture();
    let root_before = layout.trees().tree(tree_id).expect("tree").root_point();

    // One report allowed: the node class gets shifted, then the checkpoint
    // before the tree class stops the run.
    let result = compress_layout(
        &mut layout,
        &[],
        &[-3, -2],
        &mut StopAfter(1),
        ProgressRange::full(),
    );

    assert!(result.is_err());
    assert!(layout
        .node_positions()
        .get(&NodeId::new(1))
        .expect("node")
        .coincident(Point::new(-20.0, 0.0)));
    let tree = layout.trees().tree(tree_id).expect("tree");
    assert!(tree.root_point().coincident(root_before));
}

#[rstest]
#[case(&[2], 1, vec![3])]
#[case(&[2, 5], 2, vec![3, 4, 8, 9])]
#[case(&[0, 1], 1, vec![1, 3])]
fn inserted_indices_account_for_earlier_blocks(
    #[case] rows: &[i32],
    #[case] multiplier: u32,
    #[case] expected: Vec<i32>,
) {
    let (mut layout, facts, _) = fan_out_fixture();
    let (_, reversal) = expand_layout(
        &mut layout,
        &facts,
        rows,
        &[],
        multiplier,
        true,
        &mut SilentMonitor,
        ProgressRange::full(),
    )
    .expect("not cancelled");
    assert_eq!(reversal.expect("captured").inserted_rows(), expected);
}

#[test]
fn expansion_then_reversal_round_trips() {
    let (mut layout, facts, _) = fan_out_fixture();
    let snapshot = layout.clone();

    let (changes, reversal) = expand_layout(
        &mut layout,
        &facts,
        &[0],
        &[5],
        2,
        true,
        &mut SilentMonitor,
        ProgressRange::full(),
    )
    .expect("not cancelled");
    assert!(!changes.is_empty());
    assert_ne!(layout, snapshot);

    reverse_expansion(
        &mut layout,
        &facts,
        &reversal.expect("captured"),
        &mut SilentMonitor,
        ProgressRange::full(),
    )
    .expect("not cancelled");
    assert_eq!(layout, snapshot);
}

#[test]
fn reversal_skips_bands_claimed_since_expansion() {
    let (mut layout, mut facts, _) = fan_out_fixture();

    let (_, reversal) = expand_layout(
        &mut layout,
        &facts,
        &[0],
        &[],
        1,
        true,
        &mut SilentMonitor,
        ProgressRange::full(),
    )
    .expect("not cancelled");
    let reversal = reversal.expect("captured");
    let shifted = *layout.node_positions().get(&NodeId::new(3)).expect("node");
    assert!(shifted.coincident(Point::new(120.0, 50.0)));

    // A new node lands inside the inserted band.
    let squatter = NodeId::new(9);
    facts.node_points.insert(squatter, Point::new(40.0, 10.0));
    layout.set_node_position(squatter, Point::new(40.0, 10.0));

    let changes =
        reverse_expansion(&mut layout, &facts, &reversal, &mut SilentMonitor, ProgressRange::full())
            .expect("not cancelled");

    assert!(changes.is_empty(), "a claimed band must not be compressed away");
    assert_eq!(
        *layout.node_positions().get(&NodeId::new(3)).expect("node"),
        shifted
    );
}

#[test]
fn reversal_record_round_trips_through_serde() {
    let (mut layout, facts, _) = fan_out_fixture();
    let (_, reversal) = expand_layout(
        &mut layout,
        &facts,
        &[0],
        &[],
        2,
        true,
        &mut SilentMonitor,
        ProgressRange::full(),
    )
    .expect("not cancelled");
    let reversal = reversal.expect("captured");

    let json = serde_json::to_string(&reversal).expect("serialize");
    let back: ExpansionReversal = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, reversal);
}
