// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A stable, typed identifier for a layout object.
///
/// Layout object keys are dense integers handed out by the owning model, so
/// the tag wraps `u32` rather than a string. The phantom tag keeps a `NodeId`
/// from ever being passed where a `LinkId` is expected.
pub struct Id<T> {
    value: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub const fn new(value: u32) -> Self {
        Self { value, _marker: PhantomData }
    }

    pub const fn value(&self) -> u32 {
        self.value
    }
}

// Manual impls: derives would demand bounds on the phantom tag.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.value)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(Self::new)
    }
}

pub enum NodeIdTag {}
pub type NodeId = Id<NodeIdTag>;

pub enum LinkIdTag {}
pub type LinkId = Id<LinkIdTag>;

pub enum TreeIdTag {}
pub type TreeId = Id<TreeIdTag>;

pub enum RegionIdTag {}
pub type RegionId = Id<RegionIdTag>;

pub enum ModuleIdTag {}
pub type ModuleId = Id<ModuleIdTag>;

pub enum NoteIdTag {}
pub type NoteId = Id<NoteIdTag>;

/// A connection-point index on a node boundary.
///
/// Pad numbering comes from the external shape collaborator; negative values
/// are legal (some shapes number launch pads below zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PadId(i32);

impl PadId {
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for PadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Typed identifier generation, injected into the operations that mint ids.
///
/// Replaces ambient per-type key pools: the source is owned by the model that
/// owns the layout, and snapshots/clones travel with undo state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSource {
    next_tree: u32,
    next_note: u32,
}

impl IdSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts counting above ids already present in a loaded layout.
    pub fn starting_after(max_tree: Option<TreeId>, max_note: Option<NoteId>) -> Self {
        Self {
            next_tree: max_tree.map(|id| id.value() + 1).unwrap_or(0),
            next_note: max_note.map(|id| id.value() + 1).unwrap_or(0),
        }
    }

    pub fn next_tree(&mut self) -> TreeId {
        let id = TreeId::new(self.next_tree);
        self.next_tree += 1;
        id
    }

    pub fn next_note(&mut self) -> NoteId {
        let id = NoteId::new(self.next_note);
        self.next_note += 1;
        id
    }
}
