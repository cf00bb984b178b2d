// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tuning knobs for proxy fattening and arena sizing.

/// Per-tree configuration.
///
/// The defaults are the classic broad-phase constants: a `0.1` margin around
/// every proxy and a `2×` look-ahead along the displacement passed to
/// [`DynamicTree::move_proxy`](crate::DynamicTree::move_proxy).
///
/// Worlds whose units are far from meters, or whose bodies move much faster than
/// their own size per step, should scale these accordingly.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TreeConfig {
    /// Margin added to all four sides of a proxy's tight AABB.
    pub aabb_extension: f64,
    /// Scale applied to a moved proxy's displacement before extending its fat AABB.
    pub aabb_multiplier: f64,
    /// Number of node slots allocated up front. Clamped to at least one.
    pub initial_capacity: usize,
}

impl TreeConfig {
    /// Margin used by [`TreeConfig::default`].
    pub const DEFAULT_EXTENSION: f64 = 0.1;
    /// Displacement multiplier used by [`TreeConfig::default`].
    pub const DEFAULT_MULTIPLIER: f64 = 2.0;
    /// Initial capacity used by [`TreeConfig::default`].
    pub const DEFAULT_CAPACITY: usize = 16;

    /// Replace the fattening margin.
    #[must_use]
    pub const fn with_aabb_extension(mut self, extension: f64) -> Self {
        self.aabb_extension = extension;
        self
    }

    /// Replace the displacement multiplier.
    #[must_use]
    pub const fn with_aabb_multiplier(mut self, multiplier: f64) -> Self {
        self.aabb_multiplier = multiplier;
        self
    }

    /// Replace the initial arena capacity.
    #[must_use]
    pub const fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            aabb_extension: Self::DEFAULT_EXTENSION,
            aabb_multiplier: Self::DEFAULT_MULTIPLIER,
            initial_capacity: Self::DEFAULT_CAPACITY,
        }
    }
}
