// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by [`DynamicTree::validate`](crate::DynamicTree::validate).

/// A broken structural or metric invariant.
///
/// Node numbers are arena slots, the same numbers [`ProxyId::index`](crate::ProxyId::index)
/// reports for leaves.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The root has a parent link.
    #[error("root node {node} has a parent")]
    RootHasParent {
        /// The root slot.
        node: usize,
    },
    /// A child does not point back at the node that owns it.
    #[error("node {node} should have parent {expected} but has {found:?}")]
    ParentMismatch {
        /// The child slot.
        node: usize,
        /// The owning internal node.
        expected: usize,
        /// The parent link actually stored.
        found: Option<usize>,
    },
    /// An internal node has exactly one child, or both children are the same node.
    #[error("internal node {node} does not have two distinct children")]
    MalformedChildren {
        /// The internal node.
        node: usize,
    },
    /// A child index lies outside the arena or names a free slot.
    #[error("node {node} links to slot {child} which is out of range or free")]
    DanglingChild {
        /// The internal node.
        node: usize,
        /// The bad child slot.
        child: usize,
    },
    /// A stored height disagrees with the children's heights.
    #[error("node {node} stores height {stored} but its children imply {expected}")]
    HeightMismatch {
        /// The node.
        node: usize,
        /// Height stored in the arena.
        stored: i32,
        /// Height implied by the children (zero for leaves).
        expected: i32,
    },
    /// An internal node's box is not exactly the union of its children's boxes.
    #[error("node {node} box is not the union of its children")]
    BoundsMismatch {
        /// The internal node.
        node: usize,
    },
    /// The maintained root height differs from a full recomputation.
    #[error("root height is {stored} but recomputes to {computed}")]
    RootHeightMismatch {
        /// Maintained height.
        stored: usize,
        /// Recomputed height.
        computed: usize,
    },
    /// Live and free slots do not add up to the arena capacity.
    #[error("{live} live + {free} free slots do not add up to capacity {capacity}")]
    FreeListMismatch {
        /// Live node count.
        live: usize,
        /// Slots reachable through the free list.
        free: usize,
        /// Arena capacity.
        capacity: usize,
    },
}
