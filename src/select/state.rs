// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Selection state.
//!
//! At most one [`Intersection`] per object; for mergeable objects (trees),
//! repeated additive selection accumulates a segment set instead of adding
//! entries. The decision table lives in [`SelectionSet::apply`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::layout::Layout;
use crate::tree::SegmentSet;

use super::{Intersection, ObjectKey, SubIdentity};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionSet {
    entries: BTreeMap<ObjectKey, Intersection>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &ObjectKey) -> Option<&Intersection> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObjectKey, &Intersection)> {
        self.entries.iter()
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.entries.is_empty();
        self.entries.clear();
        changed
    }

    /// Applies one hit to the selection. `additive` is the shift-click
    /// modifier; without it a hit replaces the selection. Returns whether the
    /// selection changed.
    ///
    /// Mergeable hits on an already-selected tree combine by symmetric
    /// difference: an exact re-hit deselects, a disjoint hit accumulates, a
    /// partial overlap toggles the shared portion off. Label hits bypass
    /// merging entirely.
    pub fn apply(&mut self, hit: Option<Intersection>, additive: bool) -> bool {
        let Some(hit) = hit else {
            return if additive { false } else { self.clear() };
        };

        if hit.is_label() {
            if !additive {
                self.entries.clear();
            }
            self.entries.insert(hit.object, hit);
            return true;
        }

        if additive {
            let merged = match (self.entries.get(&hit.object), hit.segment_set()) {
                (Some(existing), Some(new_set)) if hit.can_merge => {
                    existing.segment_set().map(|current| current.intersect_complement(new_set))
                }
                _ => None,
            };
            match merged {
                Some(toggled) if toggled.is_empty() => {
                    self.entries.remove(&hit.object);
                }
                Some(toggled) => {
                    let mut entry = hit;
                    entry.sub = Some(SubIdentity::Segments(toggled));
                    self.entries.insert(entry.object, entry);
                }
                None => {
                    // Exact re-hit of a non-mergeable entry deselects it.
                    if self.entries.remove(&hit.object).is_none() {
                        self.entries.insert(hit.object, hit);
                    }
                }
            }
            return true;
        }

        // Replace mode: re-hitting an entry with the identical segment set is
        // a no-op; anything else replaces the whole selection.
        if let Some(existing) = self.entries.get(&hit.object) {
            let same = match (existing.segment_set(), hit.segment_set()) {
                (Some(current), Some(new_set)) => current == new_set,
                (None, None) => true,
                _ => false,
            };
            if same {
                return false;
            }
        }
        self.entries.clear();
        self.entries.insert(hit.object, hit);
        true
    }

    /// Selects every node and every distinct tree (not raw links).
    pub fn select_all(&mut self, layout: &Layout) {
        self.entries.clear();
        for node in layout.node_positions().keys() {
            self.entries
                .insert(ObjectKey::Node(*node), Intersection::plain(ObjectKey::Node(*node), 0.0));
        }
        for (tree_id, tree) in layout.trees().iter() {
            let set = SegmentSet::full_intersection(tree_id, tree, false);
            self.entries.insert(ObjectKey::Tree(tree_id), Intersection::segments(set, 0.0));
        }
    }

    /// Drops references that no longer resolve after repair or compression
    /// rewrote tree structure: stale segment members are pruned, entries for
    /// vanished trees removed.
    pub fn revalidate(&mut self, layout: &Layout) {
        self.entries.retain(|key, entry| {
            let ObjectKey::Tree(tree_id) = key else {
                return true;
            };
            let Some(tree) = layout.trees().tree(*tree_id) else {
                return false;
            };
            if let Some(SubIdentity::Segments(set)) = &mut entry.sub {
                set.retain_valid(tree);
                return !set.is_empty();
            }
            true
        });
    }
}
