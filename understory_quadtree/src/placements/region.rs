// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placement for rectangle-shaped elements.

use kurbo::{Line, Point, Rect};

use crate::placement::Placement;
use crate::types::{
    Quadrant, rect_contains_point, rect_contains_rect, rects_overlap, segment_intersects_rect,
};

/// Places rectangles in the single child that fully contains them.
///
/// A rectangle straddling a split line (or contained by more than one child, which
/// only happens for zero-width or zero-height rectangles on a center line) stays on
/// the node itself.
#[derive(Copy, Clone, Debug, Default)]
pub struct RegionPlacement;

impl Placement for RegionPlacement {
    type Shape = Rect;

    fn admits(root: &Rect, shape: &Rect) -> bool {
        rect_contains_rect(root, shape)
    }

    fn quadrant(bounds: &Rect, shape: &Rect) -> Option<Quadrant> {
        let mut fits = Quadrant::ALL
            .into_iter()
            .filter(|q| rect_contains_rect(&q.rect(bounds), shape));
        match (fits.next(), fits.next()) {
            (Some(q), None) => Some(q),
            _ => None,
        }
    }

    fn intersects_rect(shape: &Rect, rect: &Rect) -> bool {
        rects_overlap(shape, rect)
    }

    fn intersects_segment(shape: &Rect, seg: &Line) -> bool {
        segment_intersects_rect(seg, shape)
    }

    fn contains_point(shape: &Rect, p: Point) -> bool {
        rect_contains_point(shape, p)
    }
}
