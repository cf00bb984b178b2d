// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Debug visualization of the node hierarchy.

use alloc::format;
use alloc::vec::Vec;

use kurbo::Point;

use crate::arena::NodeIdx;
use crate::tree::DynamicTree;

/// An RGB color with components in `0.0..=1.0`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
}

impl Color {
    /// Build a color from its components.
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

bitflags::bitflags! {
    /// What [`DynamicTree::draw_tree`] emits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DrawFlags: u8 {
        /// Outline leaf (proxy) boxes.
        const LEAVES   = 0b0000_0001;
        /// Outline internal node boxes.
        const INTERNAL = 0b0000_0010;
        /// Label every outlined node with `id-depth/height`.
        const LABELS   = 0b0000_0100;
    }
}

impl Default for DrawFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// Sink for debug geometry. Coordinates are in world space.
pub trait DebugDraw {
    /// Draw a closed polygon outline.
    fn draw_polygon(&mut self, vertices: &[Point], color: Color);

    /// Draw `text` anchored at `position`.
    fn draw_string(&mut self, position: Point, text: &str, color: Color);
}

impl<U> DynamicTree<U> {
    /// Emit every node box to `drawer`, tinted from white at the root toward red
    /// at the deepest level.
    pub fn draw_tree<D: DebugDraw + ?Sized>(&self, drawer: &mut D, flags: DrawFlags) {
        let Some(root) = self.root else {
            return;
        };
        let height = self.compute_height();
        let mut stack: Vec<(NodeIdx, usize)> = Vec::with_capacity(height + 1);
        stack.push((root, 0));
        while let Some((node, depth)) = stack.pop() {
            let children = self.arena.children(node);
            let wanted = if children.is_some() {
                DrawFlags::INTERNAL
            } else {
                DrawFlags::LEAVES
            };
            if flags.contains(wanted) {
                let aabb = self.arena.aabb[node.get()];
                let color = depth_color(depth, height);
                let vertices = [
                    Point::new(aabb.x0, aabb.y0),
                    Point::new(aabb.x1, aabb.y0),
                    Point::new(aabb.x1, aabb.y1),
                    Point::new(aabb.x0, aabb.y1),
                ];
                drawer.draw_polygon(&vertices, color);
                if flags.contains(DrawFlags::LABELS) {
                    let label = format!("{}-{}/{}", node.get(), depth + 1, height);
                    drawer.draw_string(Point::new(aabb.x1, aabb.y1), &label, color);
                }
            }
            if let Some((c1, c2)) = children {
                stack.push((c2, depth + 1));
                stack.push((c1, depth + 1));
            }
        }
    }
}

#[allow(
    clippy::cast_precision_loss,
    reason = "Tree depths are tiny; f32 is plenty for a tint."
)]
fn depth_color(depth: usize, height: usize) -> Color {
    let shade = if height == 0 {
        1.0
    } else {
        (height - depth) as f32 / height as f32
    };
    Color::new(1.0, shade, shade)
}
