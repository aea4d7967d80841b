// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use kurbo::Rect;
use thiserror::Error;

/// Rejected tree configuration.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A split threshold of zero would subdivide on the first insert, forever.
    #[error("element limit per quad must be at least 1")]
    ZeroElementLimit,

    /// The merge watermark must sit strictly below the split threshold.
    #[error("merge watermark {watermark} must be below element limit {limit}")]
    WatermarkNotBelowLimit {
        /// Configured merge watermark.
        watermark: usize,
        /// Configured element limit per quad.
        limit: usize,
    },

    /// Past this depth, halving an `f64` extent no longer yields distinct child bounds.
    #[error("max depth {depth} exceeds the supported maximum of {max}")]
    MaxDepthTooLarge {
        /// Configured maximum depth.
        depth: usize,
        /// Largest accepted maximum depth.
        max: usize,
    },

    /// Root bounds must be finite with a positive width and height.
    #[error("invalid root bounds {0:?}")]
    InvalidBounds(Rect),
}

/// A structural invariant found broken by
/// [`QuadTree::check_invariants`](crate::QuadTree::check_invariants).
#[derive(Clone, Debug, PartialEq, Error)]
pub enum InvariantError {
    /// A node's cached subtree count disagrees with a recount.
    #[error("node {bounds:?} caches {cached} elements but holds {actual}")]
    CountMismatch {
        /// Bounds of the offending node.
        bounds: Rect,
        /// Cached subtree count.
        cached: usize,
        /// Recounted subtree size.
        actual: usize,
    },

    /// The tree-wide element counter disagrees with a recount.
    #[error("tree reports {reported} elements but holds {actual}")]
    ElementTotalMismatch {
        /// Value of the tree-wide counter.
        reported: usize,
        /// Recounted total.
        actual: usize,
    },

    /// The tree-wide leaf counter disagrees with a recount.
    #[error("tree reports {reported} leaves but has {actual}")]
    LeafTotalMismatch {
        /// Value of the tree-wide counter.
        reported: usize,
        /// Recounted leaves.
        actual: usize,
    },

    /// An element is stored on a node its placement policy would not choose.
    #[error("element stored on node {bounds:?} belongs elsewhere")]
    Misplaced {
        /// Bounds of the node holding the element.
        bounds: Rect,
    },
}
