// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placement for point-shaped elements.

use kurbo::{Line, Point, Rect};

use crate::placement::Placement;
use crate::types::{Quadrant, rect_contains_point, segment_touches_point};

/// Places single coordinates by comparing them against each node's center.
#[derive(Copy, Clone, Debug, Default)]
pub struct PointPlacement;

impl Placement for PointPlacement {
    type Shape = Point;

    fn admits(root: &Rect, shape: &Point) -> bool {
        rect_contains_point(root, *shape)
    }

    fn quadrant(bounds: &Rect, shape: &Point) -> Option<Quadrant> {
        Some(Quadrant::of_point(bounds, *shape))
    }

    fn intersects_rect(shape: &Point, rect: &Rect) -> bool {
        rect_contains_point(rect, *shape)
    }

    fn intersects_segment(shape: &Point, seg: &Line) -> bool {
        segment_touches_point(seg, *shape)
    }

    fn contains_point(shape: &Point, p: Point) -> bool {
        *shape == p
    }
}
