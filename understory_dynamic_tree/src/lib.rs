// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_dynamic_tree --heading-base-level=0

//! Understory Dynamic Tree: an incrementally balanced AABB tree for broad-phase collision detection.
//!
//! - Create, move and destroy proxies: a fat AABB paired with your own user data.
//! - Query by rectangle or point, and cast segments for closest-hit searches.
//! - Find candidate pairs for the narrow phase with [`BroadPhase`].
//!
//! Nodes live in flat parallel arrays addressed by index, with a free list threaded
//! through the unused `parent` slots. There are no per-node allocations and no
//! pointers to invalidate when the arena grows. Every insertion and removal walks
//! back to the root applying AVL-style rotations, so the height stays logarithmic
//! however proxies come and go.
//!
//! Geometry is expressed with [`kurbo`]: AABBs are [`kurbo::Rect`]s, displacements are
//! [`kurbo::Vec2`]s and ray endpoints are [`kurbo::Point`]s.
//!
//! # Example
//!
//! ```rust
//! use kurbo::{Point, Rect, Vec2};
//! use understory_dynamic_tree::{DynamicTree, QueryControl, RayCastControl, RayCastInput};
//!
//! let mut tree: DynamicTree<&str> = DynamicTree::new();
//! let crate_box = tree.create_proxy(Rect::new(0.0, 0.0, 1.0, 1.0), "crate");
//! let barrel = tree.create_proxy(Rect::new(10.0, 0.0, 11.0, 1.0), "barrel");
//!
//! // Small motion stays inside the fat box and costs nothing.
//! assert!(!tree.move_proxy(crate_box, Rect::new(0.05, 0.0, 1.05, 1.0), Vec2::new(0.05, 0.0)));
//!
//! // Large motion re-inserts the leaf with room to keep moving.
//! assert!(tree.move_proxy(barrel, Rect::new(20.0, 0.0, 21.0, 1.0), Vec2::new(10.0, 0.0)));
//!
//! let mut hits = Vec::new();
//! tree.query(Rect::new(19.0, 0.0, 22.0, 1.0), |id| {
//!     hits.push(*tree.user_data(id).unwrap());
//!     QueryControl::Continue
//! });
//! assert_eq!(hits, ["barrel"]);
//!
//! // Cast a ray and keep the first proxy it reaches.
//! let input = RayCastInput::new(Point::new(-5.0, 0.5), Point::new(30.0, 0.5));
//! let mut first = None;
//! tree.ray_cast(&input, |sub, id| {
//!     let fraction = (tree.fat_aabb(id).x0 - sub.p1.x) / (sub.p2.x - sub.p1.x);
//!     first = Some(id);
//!     RayCastControl::Tighten(fraction)
//! });
//! assert_eq!(first, Some(crate_box));
//! ```
//!
//! ## Fat AABBs
//!
//! Every proxy stores its tight box grown by [`TreeConfig::aabb_extension`]. A move
//! whose new tight box still fits inside the stored one is a no-op. Otherwise the
//! leaf is re-inserted and the new fat box is also stretched along the displacement,
//! scaled by [`TreeConfig::aabb_multiplier`], so steady motion keeps fitting for a
//! few more steps. Queries therefore report proxies whose *fat* box overlaps.
//!
//! ## Diagnostics
//!
//! [`DynamicTree::validate`], [`DynamicTree::compute_height`],
//! [`DynamicTree::max_balance`] and [`DynamicTree::area_ratio`] inspect the whole tree
//! and are meant for tests and debug builds. [`DynamicTree::draw_tree`] feeds node
//! boxes to any [`DebugDraw`] sink.
//!
//! ### Preconditions
//!
//! Proxy ids are plain arena slots. Passing an id that was never returned by
//! `create_proxy`, or one that was already destroyed, is a caller bug: debug builds
//! assert, release builds do not check. Inputs are assumed finite (no NaNs).

#![no_std]

extern crate alloc;

pub mod aabb;
pub mod broad_phase;
pub mod config;
pub mod draw;
pub mod error;
pub mod query;
pub mod tree;

mod arena;
mod diagnostics;

pub use broad_phase::BroadPhase;
pub use config::TreeConfig;
pub use draw::{Color, DebugDraw, DrawFlags};
pub use error::ValidationError;
pub use query::{QueryControl, RayCastControl, RayCastInput};
pub use tree::{DynamicTree, ProxyId};
