// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placement policy abstraction used by [`QuadTree`](crate::QuadTree).

use core::fmt::Debug;

use kurbo::{Line, Point, Rect};

use crate::types::Quadrant;

/// Decides where an element lives in the tree and how its shape matches queries.
///
/// Policies are stateless; a tree only names one as a type parameter.
/// See [`PointPlacement`](crate::PointPlacement) and
/// [`RegionPlacement`](crate::RegionPlacement).
pub trait Placement: Debug + Send + Sync + 'static {
    /// Shape of the elements this policy places.
    type Shape: Copy + Debug;

    /// Whether a tree with `root` bounds accepts this shape at all.
    fn admits(root: &Rect, shape: &Self::Shape) -> bool;

    /// The child of a node with `bounds` that must hold the shape.
    ///
    /// `None` keeps the shape on the node itself.
    fn quadrant(bounds: &Rect, shape: &Self::Shape) -> Option<Quadrant>;

    /// Whether the shape intersects `rect`.
    fn intersects_rect(shape: &Self::Shape, rect: &Rect) -> bool;

    /// Whether the shape intersects the segment.
    fn intersects_segment(shape: &Self::Shape, seg: &Line) -> bool;

    /// Whether the shape contains `p`.
    fn contains_point(shape: &Self::Shape, p: Point) -> bool;
}
