// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Broad phase pairs.
//!
//! Load a tree configuration from JSON, drop a few falling bodies onto a floor,
//! and print the candidate pairs found each step. Raise the subscriber level to
//! `TRACE` to see every proxy the tree creates and re-inserts.
//!
//! Run:
//! - `cargo run -p understory_demos --example broad_phase_pairs`

use kurbo::{Rect, Vec2};
use understory_dynamic_tree::{BroadPhase, TreeConfig};

const CONFIG: &str = r#"{ "aabb_extension": 0.05, "aabb_multiplier": 1.5 }"#;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config: TreeConfig = match serde_json::from_str(CONFIG) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("bad config: {err}");
            return;
        }
    };
    tracing::info!(?config, "loaded broad-phase config");

    let mut bp = BroadPhase::with_config(config);
    let _floor = bp.create_proxy(Rect::new(-10.0, -1.0, 10.0, 0.0), "floor");
    let mut bodies = Vec::new();
    for i in 0..4_u8 {
        let x = f64::from(i) * 2.5 - 4.0;
        let y = 2.0 + f64::from(i);
        let aabb = Rect::new(x, y, x + 1.0, y + 1.0);
        let id = bp.create_proxy(aabb, ["a", "b", "c", "d"][usize::from(i)]);
        bodies.push((id, aabb));
    }

    let fall = Vec2::new(0.0, -0.5);
    for step in 0..10 {
        for (id, aabb) in &mut bodies {
            if aabb.y0 > 0.0 {
                *aabb = *aabb + fall;
                let _ = bp.move_proxy(*id, *aabb, fall);
            }
        }
        let mut pairs = Vec::new();
        bp.update_pairs(|a, b| pairs.push((*a, *b)));
        if !pairs.is_empty() {
            println!("step {step}: {pairs:?}");
        }
    }

    println!(
        "{} proxies, height {}, balance {}, quality {:.2}",
        bp.proxy_count(),
        bp.tree_height(),
        bp.tree_balance(),
        bp.tree_quality()
    );
}
