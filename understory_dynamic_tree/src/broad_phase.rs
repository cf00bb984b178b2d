// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pair finding on top of a [`DynamicTree`].
//!
//! A physics step creates, moves and destroys proxies, then calls
//! [`BroadPhase::update_pairs`] once. Only proxies that were created, re-inserted
//! or explicitly touched since the previous update are queried, so resting
//! bodies cost nothing.

use alloc::vec::Vec;

use kurbo::{Rect, Vec2};

use crate::aabb::overlaps;
use crate::config::TreeConfig;
use crate::query::{QueryControl, RayCastControl, RayCastInput};
use crate::tree::{DynamicTree, ProxyId};

/// Broad phase: a dynamic tree plus a buffer of proxies that need pair updates.
pub struct BroadPhase<U> {
    tree: DynamicTree<U>,
    move_buffer: Vec<ProxyId>,
    pair_buffer: Vec<(ProxyId, ProxyId)>,
}

impl<U> Default for BroadPhase<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> core::fmt::Debug for BroadPhase<U> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BroadPhase")
            .field("tree", &self.tree)
            .field("pending_moves", &self.move_buffer.len())
            .finish_non_exhaustive()
    }
}

impl<U> BroadPhase<U> {
    /// Create an empty broad phase with the default [`TreeConfig`].
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Create an empty broad phase with an explicit tree configuration.
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            tree: DynamicTree::with_config(config),
            move_buffer: Vec::new(),
            pair_buffer: Vec::new(),
        }
    }

    /// The underlying tree.
    pub fn tree(&self) -> &DynamicTree<U> {
        &self.tree
    }

    /// Add a proxy. It takes part in the next [`BroadPhase::update_pairs`].
    pub fn create_proxy(&mut self, aabb: Rect, user_data: U) -> ProxyId {
        let id = self.tree.create_proxy(aabb, user_data);
        self.buffer_move(id);
        id
    }

    /// Remove a proxy and return its user data.
    pub fn destroy_proxy(&mut self, id: ProxyId) -> Option<U> {
        self.unbuffer_move(id);
        self.tree.destroy_proxy(id)
    }

    /// Move a proxy. Returns `true` when the tree had to re-insert it, in which
    /// case it takes part in the next pair update.
    pub fn move_proxy(&mut self, id: ProxyId, aabb: Rect, displacement: Vec2) -> bool {
        let moved = self.tree.move_proxy(id, aabb, displacement);
        if moved {
            self.buffer_move(id);
        }
        moved
    }

    /// Force a proxy into the next pair update without moving it, for example
    /// after its collision filter changed.
    pub fn touch_proxy(&mut self, id: ProxyId) {
        self.buffer_move(id);
    }

    /// The fat box stored for `id`.
    pub fn fat_aabb(&self, id: ProxyId) -> Rect {
        self.tree.fat_aabb(id)
    }

    /// The user data stored for `id`.
    pub fn user_data(&self, id: ProxyId) -> Option<&U> {
        self.tree.user_data(id)
    }

    /// Whether the fat boxes of two proxies overlap.
    pub fn test_overlap(&self, a: ProxyId, b: ProxyId) -> bool {
        overlaps(&self.tree.fat_aabb(a), &self.tree.fat_aabb(b))
    }

    /// Number of live proxies.
    pub fn proxy_count(&self) -> usize {
        self.tree.len()
    }

    /// Height of the underlying tree.
    pub fn tree_height(&self) -> usize {
        self.tree.height()
    }

    /// Worst child height difference in the underlying tree.
    pub fn tree_balance(&self) -> usize {
        self.tree.max_balance()
    }

    /// Area ratio of the underlying tree; see [`DynamicTree::area_ratio`].
    pub fn tree_quality(&self) -> f64 {
        self.tree.area_ratio()
    }

    /// See [`DynamicTree::query`].
    pub fn query<F>(&self, aabb: Rect, callback: F)
    where
        F: FnMut(ProxyId) -> QueryControl,
    {
        self.tree.query(aabb, callback);
    }

    /// See [`DynamicTree::ray_cast`].
    pub fn ray_cast<F>(&self, input: &RayCastInput, callback: F)
    where
        F: FnMut(&RayCastInput, ProxyId) -> RayCastControl,
    {
        self.tree.ray_cast(input, callback);
    }

    /// Report every new candidate pair to `add_pair` and clear the move buffer.
    ///
    /// Each buffered proxy is queried with its fat box. Pairs are reported once,
    /// in ascending id order, with the user data of the lower id first.
    pub fn update_pairs<F>(&mut self, mut add_pair: F)
    where
        F: FnMut(&U, &U),
    {
        let Self {
            tree,
            move_buffer,
            pair_buffer,
        } = self;

        pair_buffer.clear();
        for &query_id in move_buffer.iter() {
            let fat = tree.fat_aabb(query_id);
            tree.query(fat, |other| {
                if other != query_id {
                    pair_buffer.push((query_id.min(other), query_id.max(other)));
                }
                QueryControl::Continue
            });
        }
        move_buffer.clear();

        pair_buffer.sort_unstable();
        pair_buffer.dedup();
        tracing::trace!(pairs = pair_buffer.len(), "updated broad-phase pairs");

        for &(a, b) in pair_buffer.iter() {
            if let (Some(ua), Some(ub)) = (tree.user_data(a), tree.user_data(b)) {
                add_pair(ua, ub);
            }
        }
    }

    fn buffer_move(&mut self, id: ProxyId) {
        self.move_buffer.push(id);
    }

    fn unbuffer_move(&mut self, id: ProxyId) {
        self.move_buffer.retain(|&m| m != id);
    }
}
