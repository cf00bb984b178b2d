// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dump the node hierarchy through a text [`DebugDraw`] sink.
//!
//! Run:
//! - `cargo run -p understory_demos --example dynamic_tree_draw`

use kurbo::{Point, Rect};
use understory_dynamic_tree::{Color, DebugDraw, DrawFlags, DynamicTree};

struct TextDraw;

impl DebugDraw for TextDraw {
    fn draw_polygon(&mut self, vertices: &[Point], color: Color) {
        let (lo, hi) = (vertices[0], vertices[2]);
        println!(
            "box ({:.1}, {:.1})..({:.1}, {:.1}) shade {:.2}",
            lo.x, lo.y, hi.x, hi.y, color.g
        );
    }

    fn draw_string(&mut self, position: Point, text: &str, _color: Color) {
        println!("  label {text} at ({:.1}, {:.1})", position.x, position.y);
    }
}

fn main() {
    let mut tree = DynamicTree::new();
    for i in 0..6_u8 {
        let x = f64::from(i % 3) * 4.0;
        let y = f64::from(i / 3) * 4.0;
        let _ = tree.create_proxy(Rect::new(x, y, x + 2.0, y + 2.0), i);
    }
    tree.draw_tree(&mut TextDraw, DrawFlags::default());

    println!("-- after bottom-up rebuild --");
    tree.rebuild_bottom_up();
    tree.draw_tree(&mut TextDraw, DrawFlags::LEAVES | DrawFlags::INTERNAL);
}
