// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with an intrusive free list.
//!
//! Every node is a slot index shared by six parallel vectors. Free slots are
//! chained through `parent` and carry a height of `-1`. When the free list runs
//! dry all vectors double in length; nothing else ever reallocates.

use alloc::vec::Vec;

use kurbo::Rect;

/// Index of a slot in the arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct NodeIdx(u32);

impl NodeIdx {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Node indices are intentionally 32-bit; the arena never grows past u32::MAX slots."
    )]
    pub(crate) const fn new(i: usize) -> Self {
        Self(i as u32)
    }

    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub(crate) const fn raw(self) -> u32 {
        self.0
    }

    pub(crate) const fn get(self) -> usize {
        self.0 as usize
    }
}

/// Which child slot of an internal node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    First,
    Second,
}

pub(crate) struct NodeArena<U> {
    pub(crate) aabb: Vec<Rect>,
    pub(crate) user_data: Vec<Option<U>>,
    pub(crate) parent: Vec<Option<NodeIdx>>,
    pub(crate) child1: Vec<Option<NodeIdx>>,
    pub(crate) child2: Vec<Option<NodeIdx>>,
    pub(crate) height: Vec<i32>,
    free_list: Option<NodeIdx>,
    node_count: usize,
}

impl<U> NodeArena<U> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let mut arena = Self {
            aabb: Vec::new(),
            user_data: Vec::new(),
            parent: Vec::new(),
            child1: Vec::new(),
            child2: Vec::new(),
            height: Vec::new(),
            free_list: None,
            node_count: 0,
        };
        arena.grow(capacity.max(1));
        arena
    }

    /// Number of slots, live or free.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.height.len()
    }

    /// Number of live nodes (leaves and internal).
    #[inline]
    pub(crate) fn node_count(&self) -> usize {
        self.node_count
    }

    #[inline]
    pub(crate) fn is_leaf(&self, node: NodeIdx) -> bool {
        self.child1[node.get()].is_none()
    }

    #[inline]
    pub(crate) fn is_free(&self, node: NodeIdx) -> bool {
        self.height[node.get()] < 0
    }

    #[inline]
    pub(crate) fn children(&self, node: NodeIdx) -> Option<(NodeIdx, NodeIdx)> {
        Some((self.child1[node.get()]?, self.child2[node.get()]?))
    }

    #[inline]
    pub(crate) fn child(&self, node: NodeIdx, side: Side) -> Option<NodeIdx> {
        match side {
            Side::First => self.child1[node.get()],
            Side::Second => self.child2[node.get()],
        }
    }

    #[inline]
    pub(crate) fn set_child(&mut self, node: NodeIdx, side: Side, child: NodeIdx) {
        match side {
            Side::First => self.child1[node.get()] = Some(child),
            Side::Second => self.child2[node.get()] = Some(child),
        }
    }

    /// Point whichever child slot of `parent` holds `old` at `new`.
    pub(crate) fn replace_child(&mut self, parent: NodeIdx, old: NodeIdx, new: NodeIdx) {
        if self.child1[parent.get()] == Some(old) {
            self.child1[parent.get()] = Some(new);
        } else {
            debug_assert_eq!(
                self.child2[parent.get()],
                Some(old),
                "node {} is not a child of {}",
                old.get(),
                parent.get()
            );
            self.child2[parent.get()] = Some(new);
        }
    }

    /// Take a slot off the free list, doubling capacity when none is left.
    pub(crate) fn allocate(&mut self) -> NodeIdx {
        let node = match self.free_list {
            Some(node) => node,
            None => {
                debug_assert_eq!(
                    self.node_count,
                    self.capacity(),
                    "free list is empty but the arena has unused slots"
                );
                let old = self.capacity();
                self.grow(old * 2);
                tracing::trace!(old, new = self.capacity(), "grew node arena");
                NodeIdx::new(old)
            }
        };
        let i = node.get();
        self.free_list = self.parent[i];
        self.parent[i] = None;
        self.child1[i] = None;
        self.child2[i] = None;
        self.height[i] = 0;
        self.user_data[i] = None;
        self.node_count += 1;
        node
    }

    /// Return a slot to the free list, handing back whatever payload it held.
    pub(crate) fn free(&mut self, node: NodeIdx) -> Option<U> {
        let i = node.get();
        debug_assert!(i < self.capacity(), "node {i} is out of range");
        debug_assert!(!self.is_free(node), "node {i} is already free");
        debug_assert!(self.node_count > 0, "freeing from an empty arena");
        self.parent[i] = self.free_list;
        self.child1[i] = None;
        self.child2[i] = None;
        self.height[i] = -1;
        self.free_list = Some(node);
        self.node_count -= 1;
        self.user_data[i].take()
    }

    /// Number of slots reachable through the free list.
    pub(crate) fn free_count(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.free_list;
        while let Some(node) = cursor {
            if node.get() >= self.capacity() || count > self.capacity() {
                // Corrupt chain; report something that cannot balance.
                return usize::MAX;
            }
            count += 1;
            cursor = self.parent[node.get()];
        }
        count
    }

    /// Drop every node and shrink back to `capacity` slots.
    pub(crate) fn reset(&mut self, capacity: usize) {
        self.aabb.clear();
        self.user_data.clear();
        self.parent.clear();
        self.child1.clear();
        self.child2.clear();
        self.height.clear();
        self.free_list = None;
        self.node_count = 0;
        self.grow(capacity.max(1));
    }

    /// Extend every array to `new_len` and chain the new slots into the free list.
    ///
    /// Only called when the free list is empty, so the new chain becomes the whole list.
    fn grow(&mut self, new_len: usize) {
        let old_len = self.capacity();
        debug_assert!(new_len > old_len, "arena can only grow");
        debug_assert!(self.free_list.is_none(), "growing with free slots left");
        self.aabb.resize(new_len, Rect::ZERO);
        self.user_data.resize_with(new_len, || None);
        self.parent.extend(
            (old_len + 1..=new_len).map(|next| (next < new_len).then_some(NodeIdx::new(next))),
        );
        self.child1.resize(new_len, None);
        self.child2.resize(new_len, None);
        self.height.resize(new_len, -1);
        self.free_list = Some(NodeIdx::new(old_len));
    }
}

impl<U> core::fmt::Debug for NodeArena<U> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeArena")
            .field("capacity", &self.capacity())
            .field("node_count", &self.node_count)
            .field("free_head", &self.free_list)
            .finish_non_exhaustive()
    }
}
