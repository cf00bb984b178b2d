// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: proxy lifecycle, leaf insertion and removal, rotations.

use alloc::vec::Vec;

use kurbo::{Rect, Vec2};

use crate::aabb::{contains, extend_toward, fatten, perimeter, union};
use crate::arena::{NodeArena, NodeIdx, Side};
use crate::config::TreeConfig;

/// Handle for a proxy stored in a [`DynamicTree`].
///
/// A proxy id is the arena slot of its leaf. It stays valid until the proxy is
/// destroyed, after which the slot (and so the id) may be handed out again.
/// Ids are not generational: holding on to a destroyed id is a caller bug.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProxyId(u32);

impl ProxyId {
    /// The arena slot backing this proxy.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn from_node(node: NodeIdx) -> Self {
        Self(node.raw())
    }

    pub(crate) const fn node(self) -> NodeIdx {
        NodeIdx::from_raw(self.0)
    }
}

/// A dynamic AABB tree.
///
/// Leaves hold proxies: a fat AABB paired with user data `U`. Internal nodes hold
/// the union of their two children. The tree is kept height balanced with local
/// rotations after every insertion and removal, so queries stay logarithmic while
/// proxies move.
pub struct DynamicTree<U> {
    pub(crate) arena: NodeArena<U>,
    pub(crate) root: Option<NodeIdx>,
    config: TreeConfig,
    proxy_count: usize,
    insertion_count: usize,
}

impl<U> Default for DynamicTree<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> core::fmt::Debug for DynamicTree<U> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DynamicTree")
            .field("proxies", &self.proxy_count)
            .field("nodes", &self.arena.node_count())
            .field("capacity", &self.arena.capacity())
            .field("height", &self.height())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<U> DynamicTree<U> {
    /// Create an empty tree with the default [`TreeConfig`].
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Create an empty tree with an explicit configuration.
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            arena: NodeArena::with_capacity(config.initial_capacity),
            root: None,
            config,
            proxy_count: 0,
            insertion_count: 0,
        }
    }

    /// The configuration this tree was built with.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Number of live proxies.
    pub fn len(&self) -> usize {
        self.proxy_count
    }

    /// True if the tree holds no proxies.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of live nodes, leaves and internal nodes together.
    pub fn node_count(&self) -> usize {
        self.arena.node_count()
    }

    /// Number of node slots currently allocated.
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Total number of leaf insertions, including re-insertions caused by moves.
    pub fn insertion_count(&self) -> usize {
        self.insertion_count
    }

    /// Height of the root as maintained incrementally; zero for an empty tree.
    pub fn height(&self) -> usize {
        self.root
            .map(|r| usize::try_from(self.arena.height[r.get()]).unwrap_or(0))
            .unwrap_or(0)
    }

    /// Insert a proxy for the tight box `aabb` and return its id.
    ///
    /// The stored box is `aabb` fattened by [`TreeConfig::aabb_extension`].
    pub fn create_proxy(&mut self, aabb: Rect, user_data: U) -> ProxyId {
        let node = self.arena.allocate();
        self.arena.aabb[node.get()] = fatten(aabb, self.config.aabb_extension);
        self.arena.user_data[node.get()] = Some(user_data);
        self.insert_leaf(node);
        self.proxy_count += 1;
        tracing::trace!(proxy = node.get(), "created proxy");
        ProxyId::from_node(node)
    }

    /// Remove a proxy and return its user data.
    ///
    /// `id` must refer to a live proxy. Destroying the same id twice is a caller
    /// bug; debug builds assert, release builds may corrupt the tree.
    pub fn destroy_proxy(&mut self, id: ProxyId) -> Option<U> {
        let node = id.node();
        debug_assert!(node.get() < self.arena.capacity(), "proxy {id:?} is out of range");
        debug_assert!(!self.arena.is_free(node), "proxy {id:?} was already destroyed");
        debug_assert!(self.arena.is_leaf(node), "proxy {id:?} is not a leaf");
        self.remove_leaf(node);
        self.proxy_count -= 1;
        tracing::trace!(proxy = node.get(), "destroyed proxy");
        self.arena.free(node)
    }

    /// Update a proxy after its tight box changed.
    ///
    /// When the stored fat box still contains `aabb` nothing happens and `false` is
    /// returned. Otherwise the leaf is re-inserted with a fresh fat box, stretched
    /// along `displacement` scaled by [`TreeConfig::aabb_multiplier`], and `true` is
    /// returned.
    pub fn move_proxy(&mut self, id: ProxyId, aabb: Rect, displacement: Vec2) -> bool {
        let node = id.node();
        debug_assert!(node.get() < self.arena.capacity(), "proxy {id:?} is out of range");
        debug_assert!(self.arena.is_leaf(node), "proxy {id:?} is not a leaf");

        if contains(&self.arena.aabb[node.get()], &aabb) {
            return false;
        }

        self.remove_leaf(node);
        let fat = fatten(aabb, self.config.aabb_extension);
        self.arena.aabb[node.get()] =
            extend_toward(fat, displacement * self.config.aabb_multiplier);
        self.insert_leaf(node);
        tracing::trace!(proxy = node.get(), "reinserted moved proxy");
        true
    }

    /// The fat box stored for `id`.
    pub fn fat_aabb(&self, id: ProxyId) -> Rect {
        debug_assert!(self.arena.is_leaf(id.node()), "proxy {id:?} is not a leaf");
        self.arena.aabb[id.index()]
    }

    /// The user data stored for `id`, or `None` if `id` does not name a proxy.
    pub fn user_data(&self, id: ProxyId) -> Option<&U> {
        self.arena.user_data.get(id.index())?.as_ref()
    }

    /// Mutable access to the user data stored for `id`.
    pub fn user_data_mut(&mut self, id: ProxyId) -> Option<&mut U> {
        self.arena.user_data.get_mut(id.index())?.as_mut()
    }

    /// Iterate over live proxies with their fat boxes and user data, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ProxyId, Rect, &U)> + '_ {
        self.arena
            .user_data
            .iter()
            .enumerate()
            .filter_map(|(i, data)| {
                let data = data.as_ref()?;
                Some((ProxyId::from_node(NodeIdx::new(i)), self.arena.aabb[i], data))
            })
    }

    /// Drop every proxy and release all but the initial node slots.
    pub fn clear(&mut self) {
        tracing::debug!(proxies = self.proxy_count, "clearing dynamic tree");
        self.arena.reset(self.config.initial_capacity);
        self.root = None;
        self.proxy_count = 0;
    }

    /// Throw away every internal node and rebuild the hierarchy bottom up.
    ///
    /// Repeatedly pairs the two subtrees whose union has the smallest perimeter.
    /// This is cubic in the number of proxies and meant for tools and tests. The
    /// result is usually tighter than the incremental tree but is not guaranteed to
    /// satisfy the AVL balance bound. Proxy ids are unchanged.
    pub fn rebuild_bottom_up(&mut self) {
        let mut nodes: Vec<NodeIdx> = Vec::with_capacity(self.proxy_count);
        for i in 0..self.arena.capacity() {
            let node = NodeIdx::new(i);
            if self.arena.is_free(node) {
                continue;
            }
            if self.arena.is_leaf(node) {
                self.arena.parent[i] = None;
                nodes.push(node);
            } else {
                let _ = self.arena.free(node);
            }
        }

        while nodes.len() > 1 {
            let mut min_cost = f64::INFINITY;
            let (mut i_min, mut j_min) = (0, 1);
            for i in 0..nodes.len() {
                let aabb_i = self.arena.aabb[nodes[i].get()];
                for j in i + 1..nodes.len() {
                    let cost = perimeter(&union(&aabb_i, &self.arena.aabb[nodes[j].get()]));
                    if cost < min_cost {
                        (i_min, j_min, min_cost) = (i, j, cost);
                    }
                }
            }

            let (c1, c2) = (nodes[i_min], nodes[j_min]);
            let parent = self.arena.allocate();
            let p = parent.get();
            self.arena.child1[p] = Some(c1);
            self.arena.child2[p] = Some(c2);
            self.arena.height[p] =
                1 + self.arena.height[c1.get()].max(self.arena.height[c2.get()]);
            self.arena.aabb[p] = union(&self.arena.aabb[c1.get()], &self.arena.aabb[c2.get()]);
            self.arena.parent[c1.get()] = Some(parent);
            self.arena.parent[c2.get()] = Some(parent);

            nodes.swap_remove(j_min);
            nodes[i_min] = parent;
        }

        self.root = nodes.first().copied();
        tracing::debug!(
            proxies = self.proxy_count,
            height = self.height(),
            "rebuilt dynamic tree bottom up"
        );
        debug_assert_eq!(self.validate(), Ok(()), "bottom-up rebuild produced a corrupt tree");
    }

    fn insert_leaf(&mut self, leaf: NodeIdx) {
        self.insertion_count += 1;

        let Some(root) = self.root else {
            self.root = Some(leaf);
            self.arena.parent[leaf.get()] = None;
            return;
        };

        // Find the best sibling.
        let leaf_aabb = self.arena.aabb[leaf.get()];
        let mut index = root;
        while let Some((child1, child2)) = self.arena.children(index) {
            let node_aabb = self.arena.aabb[index.get()];
            let area = perimeter(&node_aabb);
            let combined_area = perimeter(&union(&node_aabb, &leaf_aabb));

            // Cost of pairing the leaf with this node under a new parent.
            let cost = 2.0 * combined_area;
            // Minimum cost of pushing the leaf further down.
            let inheritance_cost = 2.0 * (combined_area - area);

            let cost1 = self.descend_cost(child1, &leaf_aabb) + inheritance_cost;
            let cost2 = self.descend_cost(child2, &leaf_aabb) + inheritance_cost;

            if cost < cost1 && cost < cost2 {
                break;
            }
            index = if cost1 <= cost2 { child1 } else { child2 };
        }

        let sibling = index;
        let old_parent = self.arena.parent[sibling.get()];
        let new_parent = self.arena.allocate();
        let np = new_parent.get();
        self.arena.parent[np] = old_parent;
        self.arena.aabb[np] = union(&leaf_aabb, &self.arena.aabb[sibling.get()]);
        self.arena.height[np] = self.arena.height[sibling.get()] + 1;
        self.arena.child1[np] = Some(sibling);
        self.arena.child2[np] = Some(leaf);
        self.arena.parent[sibling.get()] = Some(new_parent);
        self.arena.parent[leaf.get()] = Some(new_parent);
        match old_parent {
            Some(op) => self.arena.replace_child(op, sibling, new_parent),
            None => self.root = Some(new_parent),
        }

        self.refit_ancestors(Some(new_parent));
    }

    /// Cost of descending into `child` to place a leaf with box `leaf_aabb`.
    fn descend_cost(&self, child: NodeIdx, leaf_aabb: &Rect) -> f64 {
        let child_aabb = &self.arena.aabb[child.get()];
        let combined = perimeter(&union(leaf_aabb, child_aabb));
        if self.arena.is_leaf(child) {
            combined
        } else {
            combined - perimeter(child_aabb)
        }
    }

    fn remove_leaf(&mut self, leaf: NodeIdx) {
        if self.root == Some(leaf) {
            self.root = None;
            return;
        }

        let parent = self.arena.parent[leaf.get()];
        debug_assert!(parent.is_some(), "non-root leaf {} has no parent", leaf.get());
        let Some(parent) = parent else {
            return;
        };
        let grand_parent = self.arena.parent[parent.get()];
        let sibling = if self.arena.child1[parent.get()] == Some(leaf) {
            self.arena.child2[parent.get()]
        } else {
            self.arena.child1[parent.get()]
        };
        debug_assert!(sibling.is_some(), "internal node {} has one child", parent.get());
        let Some(sibling) = sibling else {
            return;
        };

        match grand_parent {
            Some(gp) => {
                // Destroy the parent and connect the sibling to the grandparent.
                self.arena.replace_child(gp, parent, sibling);
                self.arena.parent[sibling.get()] = Some(gp);
                let _ = self.arena.free(parent);
                self.refit_ancestors(Some(gp));
            }
            None => {
                self.root = Some(sibling);
                self.arena.parent[sibling.get()] = None;
                let _ = self.arena.free(parent);
            }
        }
    }

    /// Walk from `start` to the root, rebalancing and refreshing height and bounds.
    fn refit_ancestors(&mut self, start: Option<NodeIdx>) {
        let mut cursor = start;
        while let Some(node) = cursor {
            let node = self.balance(node);
            debug_assert!(!self.arena.is_leaf(node), "ancestor {} is a leaf", node.get());
            if let Some((c1, c2)) = self.arena.children(node) {
                let i = node.get();
                self.arena.height[i] =
                    1 + self.arena.height[c1.get()].max(self.arena.height[c2.get()]);
                self.arena.aabb[i] = union(&self.arena.aabb[c1.get()], &self.arena.aabb[c2.get()]);
            }
            cursor = self.arena.parent[node.get()];
        }
    }

    /// Rotate `a` if its children's heights differ by more than one.
    ///
    /// Returns the node now occupying `a`'s position in the tree.
    fn balance(&mut self, a: NodeIdx) -> NodeIdx {
        if self.arena.height[a.get()] < 2 {
            return a;
        }
        let Some((b, c)) = self.arena.children(a) else {
            return a;
        };

        let balance = self.arena.height[c.get()] - self.arena.height[b.get()];
        if balance > 1 {
            self.rotate_up(a, Side::Second, b)
        } else if balance < -1 {
            self.rotate_up(a, Side::First, c)
        } else {
            a
        }
    }

    /// Promote the child of `a` on `side` into `a`'s place.
    ///
    /// The promoted node `p` adopts `a` as its first child and keeps the taller of
    /// its own children as its second. The shorter one moves under `a`, taking the
    /// slot `p` vacated, next to `a`'s other child `keep`.
    fn rotate_up(&mut self, a: NodeIdx, side: Side, keep: NodeIdx) -> NodeIdx {
        let Some(p) = self.arena.child(a, side) else {
            return a;
        };
        let Some((f, g)) = self.arena.children(p) else {
            debug_assert!(false, "rotating a leaf {} up", p.get());
            return a;
        };

        // Swap a and p.
        self.arena.child1[p.get()] = Some(a);
        let old_parent = self.arena.parent[a.get()];
        self.arena.parent[p.get()] = old_parent;
        self.arena.parent[a.get()] = Some(p);
        match old_parent {
            Some(op) => self.arena.replace_child(op, a, p),
            None => self.root = Some(p),
        }

        let h = &self.arena.height;
        let (taller, shorter) = if h[f.get()] > h[g.get()] { (f, g) } else { (g, f) };

        self.arena.child2[p.get()] = Some(taller);
        self.arena.set_child(a, side, shorter);
        self.arena.parent[shorter.get()] = Some(a);

        self.arena.aabb[a.get()] =
            union(&self.arena.aabb[keep.get()], &self.arena.aabb[shorter.get()]);
        self.arena.aabb[p.get()] = union(&self.arena.aabb[a.get()], &self.arena.aabb[taller.get()]);

        self.arena.height[a.get()] =
            1 + self.arena.height[keep.get()].max(self.arena.height[shorter.get()]);
        self.arena.height[p.get()] =
            1 + self.arena.height[a.get()].max(self.arena.height[taller.get()]);

        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(x: f64, y: f64) -> Rect {
        Rect::new(x, y, x + 1.0, y + 1.0)
    }

    #[test]
    fn first_proxy_becomes_root() {
        let mut t: DynamicTree<u32> = DynamicTree::new();
        let id = t.create_proxy(unit(0.0, 0.0), 1);
        assert_eq!(t.root, Some(id.node()));
        assert_eq!(t.height(), 0);
        assert_eq!(t.len(), 1);
        assert_eq!(t.node_count(), 1);
        assert_eq!(t.fat_aabb(id), Rect::new(-0.1, -0.1, 1.1, 1.1));
    }

    #[test]
    fn second_proxy_creates_internal_parent() {
        let mut t: DynamicTree<u32> = DynamicTree::new();
        let a = t.create_proxy(unit(0.0, 0.0), 1);
        let b = t.create_proxy(unit(5.0, 0.0), 2);
        let root = t.root.expect("root exists");
        assert_eq!(t.arena.children(root), Some((a.node(), b.node())));
        assert_eq!(t.height(), 1);
        assert_eq!(t.node_count(), 3);
        assert_eq!(
            t.arena.aabb[root.get()],
            union(&t.fat_aabb(a), &t.fat_aabb(b))
        );
    }

    #[test]
    fn removing_a_child_of_the_root_promotes_its_sibling() {
        let mut t: DynamicTree<u32> = DynamicTree::new();
        let a = t.create_proxy(unit(0.0, 0.0), 1);
        let b = t.create_proxy(unit(5.0, 0.0), 2);
        assert_eq!(t.destroy_proxy(a), Some(1));
        assert_eq!(t.root, Some(b.node()));
        assert_eq!(t.arena.parent[b.index()], None);
        assert_eq!(t.node_count(), 1);
        assert_eq!(t.destroy_proxy(b), Some(2));
        assert!(t.is_empty());
        assert_eq!(t.node_count(), 0);
    }

    #[test]
    fn ids_are_reused_after_destroy() {
        let mut t: DynamicTree<u32> = DynamicTree::new();
        let a = t.create_proxy(unit(0.0, 0.0), 1);
        let _b = t.create_proxy(unit(3.0, 0.0), 2);
        let _ = t.destroy_proxy(a);
        // The freed leaf and the freed parent are both on the free list; one of
        // them is handed out again.
        let c = t.create_proxy(unit(6.0, 0.0), 3);
        assert!(c.index() < 3);
        assert_eq!(t.user_data(c), Some(&3));
    }

    #[test]
    fn small_move_is_absorbed_by_the_fat_box() {
        let mut t: DynamicTree<u32> = DynamicTree::new();
        let id = t.create_proxy(unit(0.0, 0.0), 1);
        let before = t.insertion_count();
        assert!(!t.move_proxy(id, unit(0.05, 0.05), Vec2::new(0.05, 0.05)));
        assert_eq!(t.insertion_count(), before);
        assert_eq!(t.fat_aabb(id), Rect::new(-0.1, -0.1, 1.1, 1.1));
    }

    #[test]
    fn large_move_reinserts_with_predicted_margin() {
        let mut t: DynamicTree<u32> = DynamicTree::new();
        let id = t.create_proxy(unit(0.0, 0.0), 1);
        assert!(t.move_proxy(id, unit(2.0, 0.0), Vec2::new(2.0, -1.0)));
        let fat = t.fat_aabb(id);
        assert!((fat.x0 - 1.9).abs() < 1e-12);
        assert!((fat.x1 - 7.1).abs() < 1e-12);
        assert!((fat.y0 - -2.1).abs() < 1e-12);
        assert!((fat.y1 - 1.1).abs() < 1e-12);
        assert_eq!(t.insertion_count(), 2);
    }

    #[test]
    fn sequential_inserts_stay_balanced() {
        let mut t: DynamicTree<usize> = DynamicTree::new();
        for i in 0..64 {
            let _ = t.create_proxy(unit(i as f64 * 2.0, 0.0), i);
        }
        assert_eq!(t.validate(), Ok(()));
        assert!(t.max_balance() <= 1);
        // 64 leaves in an AVL-balanced tree fit well under 2*log2(64).
        assert!(t.height() <= 12, "height {}", t.height());
    }

    #[test]
    fn capacity_grows_past_initial() {
        let mut t: DynamicTree<usize> =
            DynamicTree::with_config(TreeConfig::default().with_initial_capacity(1));
        for i in 0..10 {
            let _ = t.create_proxy(unit(i as f64, i as f64), i);
        }
        assert_eq!(t.node_count(), 19);
        assert!(t.capacity() >= 19);
        assert!(t.capacity().is_power_of_two());
        assert_eq!(t.validate(), Ok(()));
    }

    #[test]
    fn rebuild_keeps_ids_and_data() {
        let mut t: DynamicTree<usize> = DynamicTree::new();
        let ids: Vec<_> = (0..20)
            .map(|i| t.create_proxy(unit((i % 5) as f64 * 3.0, (i / 5) as f64 * 3.0), i))
            .collect();
        t.rebuild_bottom_up();
        assert_eq!(t.validate(), Ok(()));
        assert_eq!(t.node_count(), 39);
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(t.user_data(*id), Some(&i));
        }
    }

    #[test]
    fn clear_resets_everything() {
        let mut t: DynamicTree<usize> = DynamicTree::new();
        for i in 0..40 {
            let _ = t.create_proxy(unit(i as f64, 0.0), i);
        }
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.len(), 0);
        assert_eq!(t.capacity(), TreeConfig::DEFAULT_CAPACITY);
        assert_eq!(t.iter().count(), 0);
        assert_eq!(t.validate(), Ok(()));
    }

    #[test]
    fn user_data_can_be_updated_in_place() {
        let mut t: DynamicTree<usize> = DynamicTree::new();
        let id = t.create_proxy(unit(0.0, 0.0), 1);
        if let Some(data) = t.user_data_mut(id) {
            *data += 41;
        }
        assert_eq!(t.destroy_proxy(id), Some(42));
        assert_eq!(t.user_data(id), None);
    }
}
