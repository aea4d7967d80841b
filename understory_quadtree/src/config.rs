// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree-wide configuration.

use kurbo::Rect;

use crate::error::ConfigError;
use crate::types::is_valid_bounds;

/// Largest accepted [`QuadTreeConfig::max_depth`].
///
/// Each level halves the quad extent; an `f64` carries 52 fraction bits, so deeper
/// quads around a point stop shrinking and subdivision would never separate it.
pub const MAX_SUPPORTED_DEPTH: usize = 48;

/// Split and merge thresholds shared by every node of a tree.
///
/// ```
/// use understory_quadtree::QuadTreeConfig;
///
/// let config = QuadTreeConfig::default()
///     .with_element_limit(16)
///     .with_merge_watermark(4);
/// assert_eq!(config.element_limit, 16);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QuadTreeConfig {
    /// A leaf subdivides when an insert would push it past this many elements.
    pub element_limit: usize,
    /// A subtree collapses into one leaf once a removal leaves it with this many
    /// elements or fewer. Must be below `element_limit`.
    pub merge_watermark: usize,
    /// Leaves at this depth (the root is depth 0) never subdivide and accept
    /// elements past `element_limit`. At most [`MAX_SUPPORTED_DEPTH`].
    pub max_depth: usize,
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self {
            element_limit: 8,
            merge_watermark: 0,
            max_depth: 16,
        }
    }
}

impl QuadTreeConfig {
    /// Set the split threshold.
    #[must_use]
    pub const fn with_element_limit(mut self, limit: usize) -> Self {
        self.element_limit = limit;
        self
    }

    /// Set the merge threshold.
    #[must_use]
    pub const fn with_merge_watermark(mut self, watermark: usize) -> Self {
        self.merge_watermark = watermark;
        self
    }

    /// Set the maximum subdivision depth.
    #[must_use]
    pub const fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Check the thresholds and the root bounds they will be used with.
    ///
    /// # Errors
    ///
    /// See [`ConfigError`] for the rejected combinations.
    pub fn validate(&self, bounds: &Rect) -> Result<(), ConfigError> {
        if self.element_limit == 0 {
            return Err(ConfigError::ZeroElementLimit);
        }
        if self.merge_watermark >= self.element_limit {
            return Err(ConfigError::WatermarkNotBelowLimit {
                watermark: self.merge_watermark,
                limit: self.element_limit,
            });
        }
        if self.max_depth > MAX_SUPPORTED_DEPTH {
            return Err(ConfigError::MaxDepthTooLarge {
                depth: self.max_depth,
                max: MAX_SUPPORTED_DEPTH,
            });
        }
        if !is_valid_bounds(bounds) {
            return Err(ConfigError::InvalidBounds(*bounds));
        }
        Ok(())
    }
}
