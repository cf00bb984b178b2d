// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dynamic tree basics.
//!
//! Create proxies, move them, query a region, and cast a ray for the closest hit.
//!
//! Run:
//! - `cargo run -p understory_demos --example dynamic_tree_basics`

use kurbo::{Point, Rect, Vec2};
use understory_dynamic_tree::{DynamicTree, QueryControl, RayCastControl, RayCastInput};

fn main() {
    let mut tree: DynamicTree<&str> = DynamicTree::new();
    let ball = tree.create_proxy(Rect::new(0.0, 0.0, 1.0, 1.0), "ball");
    let _wall = tree.create_proxy(Rect::new(8.0, -5.0, 9.0, 5.0), "wall");
    let _crate = tree.create_proxy(Rect::new(3.0, 3.0, 5.0, 5.0), "crate");
    println!(
        "{} proxies, {} nodes, height {}",
        tree.len(),
        tree.node_count(),
        tree.height()
    );

    // Roll the ball to the right a little at a time.
    let mut pos = 0.0;
    for step in 0..10 {
        pos += 0.3;
        let moved = tree.move_proxy(ball, Rect::new(pos, 0.0, pos + 1.0, 1.0), Vec2::new(0.3, 0.0));
        println!("step {step}: reinserted = {moved}, fat box = {:?}", tree.fat_aabb(ball));
    }

    // Who is near the wall?
    let mut near = Vec::new();
    tree.query(Rect::new(7.0, -1.0, 10.0, 2.0), |id| {
        near.push(tree.user_data(id).copied().unwrap_or_default());
        QueryControl::Continue
    });
    println!("near the wall: {near:?}");

    // Closest hit along +x from the origin, against the fat boxes.
    let input = RayCastInput::new(Point::new(-2.0, 0.5), Point::new(20.0, 0.5));
    let mut closest = None;
    tree.ray_cast(&input, |sub, id| {
        let fat = tree.fat_aabb(id);
        let fraction = (fat.x0 - sub.p1.x) / (sub.p2.x - sub.p1.x);
        if fraction <= 0.0 {
            return RayCastControl::Continue;
        }
        closest = Some((tree.user_data(id).copied().unwrap_or_default(), fraction));
        RayCastControl::Tighten(fraction)
    });
    if let Some((name, fraction)) = closest {
        println!("ray hits {name} at {:?}", input.point_at(fraction));
    }

    println!(
        "max balance {}, area ratio {:.2}, valid = {:?}",
        tree.max_balance(),
        tree.area_ratio(),
        tree.validate()
    );
}
