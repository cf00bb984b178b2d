// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree quality metrics and invariant checks for tests and debug builds.

use crate::aabb::{perimeter, union};
use crate::arena::NodeIdx;
use crate::error::ValidationError;
use crate::tree::DynamicTree;

impl<U> DynamicTree<U> {
    /// Recompute the height of the tree from scratch.
    ///
    /// Should always equal [`DynamicTree::height`]; a mismatch means the
    /// incremental bookkeeping is broken.
    pub fn compute_height(&self) -> usize {
        self.root.map_or(0, |root| self.compute_height_from(root))
    }

    fn compute_height_from(&self, node: NodeIdx) -> usize {
        match self.arena.children(node) {
            None => 0,
            Some((c1, c2)) => 1 + self.compute_height_from(c1).max(self.compute_height_from(c2)),
        }
    }

    /// The largest height difference between the two children of any internal node.
    pub fn max_balance(&self) -> usize {
        let mut max_balance = 0;
        for i in 0..self.arena.capacity() {
            if self.arena.height[i] <= 1 {
                continue;
            }
            let Some((c1, c2)) = self.arena.children(NodeIdx::new(i)) else {
                continue;
            };
            let balance = self.arena.height[c2.get()].abs_diff(self.arena.height[c1.get()]);
            max_balance = max_balance.max(balance as usize);
        }
        max_balance
    }

    /// Sum of all node perimeters divided by the root perimeter.
    ///
    /// A rough measure of tree quality: lower means tighter internal boxes.
    /// Zero for an empty tree.
    pub fn area_ratio(&self) -> f64 {
        let Some(root) = self.root else {
            return 0.0;
        };
        let root_area = perimeter(&self.arena.aabb[root.get()]);
        let total_area: f64 = (0..self.arena.capacity())
            .filter(|&i| self.arena.height[i] >= 0)
            .map(|i| perimeter(&self.arena.aabb[i]))
            .sum();
        total_area / root_area
    }

    /// Check every structural and metric invariant of the tree.
    ///
    /// Walks the whole tree; intended for tests and debug assertions rather than
    /// per-step use.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(root) = self.root {
            if self.arena.parent[root.get()].is_some() {
                return Err(ValidationError::RootHasParent { node: root.get() });
            }
            self.validate_structure(root)?;
            self.validate_metrics(root)?;
        }

        let live = self.arena.node_count();
        let free = self.arena.free_count();
        let capacity = self.arena.capacity();
        if live.checked_add(free) != Some(capacity) {
            return Err(ValidationError::FreeListMismatch {
                live,
                free,
                capacity,
            });
        }

        let (stored, computed) = (self.height(), self.compute_height());
        if stored != computed {
            return Err(ValidationError::RootHeightMismatch { stored, computed });
        }
        Ok(())
    }

    fn validate_structure(&self, node: NodeIdx) -> Result<(), ValidationError> {
        let i = node.get();
        let (c1, c2) = match (self.arena.child1[i], self.arena.child2[i]) {
            (None, None) => return Ok(()),
            (Some(c1), Some(c2)) if c1 != c2 => (c1, c2),
            _ => return Err(ValidationError::MalformedChildren { node: i }),
        };
        for child in [c1, c2] {
            if child.get() >= self.arena.capacity() || self.arena.is_free(child) {
                return Err(ValidationError::DanglingChild {
                    node: i,
                    child: child.get(),
                });
            }
            let found = self.arena.parent[child.get()];
            if found != Some(node) {
                return Err(ValidationError::ParentMismatch {
                    node: child.get(),
                    expected: i,
                    found: found.map(NodeIdx::get),
                });
            }
        }
        self.validate_structure(c1)?;
        self.validate_structure(c2)
    }

    fn validate_metrics(&self, node: NodeIdx) -> Result<(), ValidationError> {
        let i = node.get();
        let stored = self.arena.height[i];
        let Some((c1, c2)) = self.arena.children(node) else {
            if stored != 0 {
                return Err(ValidationError::HeightMismatch {
                    node: i,
                    stored,
                    expected: 0,
                });
            }
            return Ok(());
        };

        let expected = 1 + self.arena.height[c1.get()].max(self.arena.height[c2.get()]);
        if stored != expected {
            return Err(ValidationError::HeightMismatch {
                node: i,
                stored,
                expected,
            });
        }
        if union(&self.arena.aabb[c1.get()], &self.arena.aabb[c2.get()]) != self.arena.aabb[i] {
            return Err(ValidationError::BoundsMismatch { node: i });
        }
        self.validate_metrics(c1)?;
        self.validate_metrics(c2)
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use crate::DynamicTree;
    use crate::arena::NodeIdx;
    use crate::error::ValidationError;

    fn populated() -> DynamicTree<usize> {
        let mut t = DynamicTree::new();
        for i in 0..16 {
            let x = (i % 4) as f64 * 4.0;
            let y = (i / 4) as f64 * 4.0;
            let _ = t.create_proxy(Rect::new(x, y, x + 1.0, y + 1.0), i);
        }
        t
    }

    #[test]
    fn metrics_on_empty_tree() {
        let t: DynamicTree<()> = DynamicTree::new();
        assert_eq!(t.compute_height(), 0);
        assert_eq!(t.max_balance(), 0);
        assert_eq!(t.area_ratio(), 0.0);
        assert_eq!(t.validate(), Ok(()));
    }

    #[test]
    fn metrics_on_populated_tree() {
        let t = populated();
        assert_eq!(t.validate(), Ok(()));
        assert_eq!(t.compute_height(), t.height());
        assert!(t.max_balance() <= 1);
        // The root alone contributes 1.0; every other node adds a positive share.
        assert!(t.area_ratio() > 1.0);
    }

    #[test]
    fn detects_corrupt_height() {
        let mut t = populated();
        let root = t.root.expect("root exists");
        t.arena.height[root.get()] += 1;
        assert!(matches!(
            t.validate(),
            Err(ValidationError::HeightMismatch { .. })
        ));
    }

    #[test]
    fn detects_corrupt_bounds() {
        let mut t = populated();
        let root = t.root.expect("root exists");
        t.arena.aabb[root.get()].x1 += 1.0;
        assert_eq!(
            t.validate(),
            Err(ValidationError::BoundsMismatch { node: root.get() })
        );
    }

    #[test]
    fn detects_broken_parent_link() {
        let mut t = populated();
        let root = t.root.expect("root exists");
        let (c1, _) = t.arena.children(root).expect("root is internal");
        t.arena.parent[c1.get()] = Some(c1);
        assert_eq!(
            t.validate(),
            Err(ValidationError::ParentMismatch {
                node: c1.get(),
                expected: root.get(),
                found: Some(c1.get()),
            })
        );
    }

    #[test]
    fn detects_child_on_free_list() {
        let mut t = populated();
        let root = t.root.expect("root exists");
        let (c1, _): (NodeIdx, NodeIdx) = t.arena.children(root).expect("root is internal");
        let _ = t.arena.free(c1);
        assert_eq!(
            t.validate(),
            Err(ValidationError::DanglingChild {
                node: root.get(),
                child: c1.get(),
            })
        );
    }
}
