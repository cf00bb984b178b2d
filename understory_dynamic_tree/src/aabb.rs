// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! AABB helpers over [`kurbo::Rect`].
//!
//! The tree stores every bounding box as a `Rect` with `(x0, y0)` as the lower
//! bound and `(x1, y1)` as the upper bound. Rectangles are assumed to be
//! normalized (`x0 <= x1`, `y0 <= y1`) and finite.

use kurbo::{Rect, Vec2};

/// Sum of the edge lengths of `r`.
///
/// This is the tree's cost metric. It orders boxes the same way surface area
/// would for the purposes of the insertion heuristic and is cheaper to compute.
#[inline]
pub fn perimeter(r: &Rect) -> f64 {
    2.0 * ((r.x1 - r.x0) + (r.y1 - r.y0))
}

/// Whether `a` and `b` overlap. Touching edges count as overlapping.
#[inline]
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    !(b.x0 > a.x1 || b.y0 > a.y1 || a.x0 > b.x1 || a.y0 > b.y1)
}

/// Whether `outer` fully contains `inner` (closed bounds).
#[inline]
pub fn contains(outer: &Rect, inner: &Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && inner.x1 <= outer.x1 && inner.y1 <= outer.y1
}

/// Grow `r` by `margin` on all four sides.
#[inline]
pub fn fatten(r: Rect, margin: f64) -> Rect {
    Rect::new(r.x0 - margin, r.y0 - margin, r.x1 + margin, r.y1 + margin)
}

/// Stretch `r` along `d`, moving only the side that faces the direction of travel.
#[inline]
pub fn extend_toward(r: Rect, d: Vec2) -> Rect {
    let mut out = r;
    if d.x < 0.0 {
        out.x0 += d.x;
    } else {
        out.x1 += d.x;
    }
    if d.y < 0.0 {
        out.y0 += d.y;
    } else {
        out.y1 += d.y;
    }
    out
}

/// Smallest box containing both `a` and `b`.
#[inline]
pub fn union(a: &Rect, b: &Rect) -> Rect {
    Rect::new(
        a.x0.min(b.x0),
        a.y0.min(b.y0),
        a.x1.max(b.x1),
        a.y1.max(b.y1),
    )
}

#[inline]
pub(crate) fn abs(v: f64) -> f64 {
    if v < 0.0 { -v } else { v }
}
