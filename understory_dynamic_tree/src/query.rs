// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlap and ray-cast traversal.
//!
//! Both traversals walk the arena depth first with an explicit stack, so tree
//! depth never touches the call stack. Callbacks receive `&self` data only; the
//! borrow checker keeps the tree quiescent for the whole query.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Vec2};

use crate::aabb::{abs, overlaps};
use crate::arena::NodeIdx;
use crate::tree::{DynamicTree, ProxyId};

/// Initial traversal stack size; deeper trees grow it.
const STACK_CAPACITY: usize = 64;

/// What an overlap-query callback wants to happen next.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QueryControl {
    /// Keep reporting overlapping proxies.
    Continue,
    /// Abort the query immediately.
    Stop,
}

impl From<bool> for QueryControl {
    /// `true` continues, `false` stops.
    fn from(proceed: bool) -> Self {
        if proceed { Self::Continue } else { Self::Stop }
    }
}

/// What a ray-cast callback wants to happen next.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RayCastControl {
    /// Ignore this proxy and keep casting against the same segment.
    Continue,
    /// Terminate the ray cast.
    Stop,
    /// Clip the ray to this fraction of `p1 → p2` and keep going.
    ///
    /// Used when searching for the closest hit. The fraction should be positive;
    /// non-positive values are ignored.
    Tighten(f64),
}

impl RayCastControl {
    /// Map the classic raw-fraction convention onto a control value.
    ///
    /// `0` stops, a positive value tightens, anything else continues.
    pub fn from_fraction(value: f64) -> Self {
        if value == 0.0 {
            Self::Stop
        } else if value > 0.0 {
            Self::Tighten(value)
        } else {
            Self::Continue
        }
    }
}

/// A segment to cast through the tree.
///
/// The ray runs from `p1` toward `p2` and ends at `p1 + max_fraction * (p2 - p1)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayCastInput {
    /// Start of the segment.
    pub p1: Point,
    /// Point defining the direction and unit length of the segment.
    pub p2: Point,
    /// Portion of `p1 → p2` still under consideration.
    pub max_fraction: f64,
}

impl RayCastInput {
    /// Cast the full segment from `p1` to `p2`.
    pub const fn new(p1: Point, p2: Point) -> Self {
        Self {
            p1,
            p2,
            max_fraction: 1.0,
        }
    }

    /// The point at `fraction` along `p1 → p2`.
    pub fn point_at(&self, fraction: f64) -> Point {
        self.p1 + (self.p2 - self.p1) * fraction
    }

    /// Bounding box of the segment from `p1` to its current end.
    fn bounds(&self) -> Rect {
        Rect::from_points(self.p1, self.point_at(self.max_fraction))
    }
}

impl<U> DynamicTree<U> {
    /// Report every proxy whose fat box overlaps `aabb`.
    ///
    /// Proxies are reported in traversal order, which is unspecified. Returning
    /// [`QueryControl::Stop`] from `callback` ends the query.
    pub fn query<F>(&self, aabb: Rect, mut callback: F)
    where
        F: FnMut(ProxyId) -> QueryControl,
    {
        let Some(root) = self.root else {
            return;
        };
        let mut stack: Vec<NodeIdx> = Vec::with_capacity(STACK_CAPACITY);
        stack.push(root);
        while let Some(node) = stack.pop() {
            if !overlaps(&self.arena.aabb[node.get()], &aabb) {
                continue;
            }
            match self.arena.children(node) {
                None => {
                    if callback(ProxyId::from_node(node)) == QueryControl::Stop {
                        return;
                    }
                }
                Some((child1, child2)) => {
                    stack.push(child1);
                    stack.push(child2);
                }
            }
        }
    }

    /// Report every proxy whose fat box contains `point`.
    pub fn query_point<F>(&self, point: Point, callback: F)
    where
        F: FnMut(ProxyId) -> QueryControl,
    {
        self.query(Rect::from_points(point, point), callback);
    }

    /// Cast a segment through the tree.
    ///
    /// `callback` is invoked for every proxy whose fat box the segment may cross,
    /// with the input clipped to the current `max_fraction`. It is expected to do
    /// the exact shape test and report back:
    ///
    /// - [`RayCastControl::Stop`] ends the cast,
    /// - [`RayCastControl::Tighten`] shortens the segment (closest-hit search),
    /// - [`RayCastControl::Continue`] leaves it unchanged.
    ///
    /// `p1` and `p2` must differ.
    pub fn ray_cast<F>(&self, input: &RayCastInput, mut callback: F)
    where
        F: FnMut(&RayCastInput, ProxyId) -> RayCastControl,
    {
        let Some(root) = self.root else {
            return;
        };

        let r = input.p2 - input.p1;
        debug_assert!(r.hypot2() > 0.0, "ray cast with a degenerate segment");

        // `v` is perpendicular to the segment. Its length does not matter for the
        // separating-axis sign test below.
        let v = Vec2::new(-r.y, r.x);
        let abs_v = Vec2::new(abs(v.x), abs(v.y));

        let mut sub_input = *input;
        let mut segment = sub_input.bounds();

        let mut stack: Vec<NodeIdx> = Vec::with_capacity(STACK_CAPACITY);
        stack.push(root);
        while let Some(node) = stack.pop() {
            let node_aabb = &self.arena.aabb[node.get()];
            if !overlaps(node_aabb, &segment) {
                continue;
            }

            // Separating axis for the segment: |dot(v, p1 - c)| > dot(|v|, h).
            let c = node_aabb.center();
            let h = Vec2::new(node_aabb.width() * 0.5, node_aabb.height() * 0.5);
            let separation = abs(v.dot(input.p1 - c)) - abs_v.dot(h);
            if separation > 0.0 {
                continue;
            }

            match self.arena.children(node) {
                None => match callback(&sub_input, ProxyId::from_node(node)) {
                    RayCastControl::Stop => return,
                    RayCastControl::Tighten(fraction) if fraction > 0.0 => {
                        sub_input.max_fraction = fraction;
                        segment = sub_input.bounds();
                    }
                    RayCastControl::Tighten(_) | RayCastControl::Continue => {}
                },
                Some((child1, child2)) => {
                    stack.push(child1);
                    stack.push(child2);
                }
            }
        }
    }
}
