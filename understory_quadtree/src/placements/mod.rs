// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placement policies for the two quadtree variants.
//!
//! - `point`: elements are single coordinates; every element resolves to exactly one
//!   quadrant, so internal nodes never hold elements.
//! - `region`: elements are axis-aligned rectangles; an element that no single child
//!   fully contains stays on the lowest node that does contain it.

pub mod point;
pub mod region;

pub use point::PointPlacement;
pub use region::RegionPlacement;
