// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry helpers and quadrant types.
//!
//! All predicates here treat rectangles as closed: a point on an edge is inside,
//! and two rectangles that share an edge overlap. Kurbo's own `Rect::contains`
//! is half-open, which would drop elements sitting on the far edge of the root.

use kurbo::{Line, ParamCurveNearest, Point, Rect};

/// Distance under which a point counts as lying on a segment.
pub const SEGMENT_TOLERANCE: f64 = 1e-9;

/// Whether `rect` contains `p`, edges included.
#[inline]
pub fn rect_contains_point(rect: &Rect, p: Point) -> bool {
    rect.x0 <= p.x && p.x <= rect.x1 && rect.y0 <= p.y && p.y <= rect.y1
}

/// Whether `outer` fully contains `inner`, edges included.
#[inline]
pub fn rect_contains_rect(outer: &Rect, inner: &Rect) -> bool {
    outer.x0 <= inner.x0 && inner.x1 <= outer.x1 && outer.y0 <= inner.y0 && inner.y1 <= outer.y1
}

/// Whether two rectangles overlap, touching edges included.
#[inline]
pub fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Whether the segment crosses or touches `rect`.
///
/// Liang–Barsky clipping of the parametric segment against the four slabs.
/// A zero-length segment reduces to a point containment test.
pub fn segment_intersects_rect(seg: &Line, rect: &Rect) -> bool {
    let dx = seg.p1.x - seg.p0.x;
    let dy = seg.p1.y - seg.p0.y;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    let slabs = [
        (-dx, seg.p0.x - rect.x0),
        (dx, rect.x1 - seg.p0.x),
        (-dy, seg.p0.y - rect.y0),
        (dy, rect.y1 - seg.p0.y),
    ];
    for (p, q) in slabs {
        if p == 0.0 {
            // Parallel to this slab: reject if outside it.
            if q < 0.0 {
                return false;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return false;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return false;
            }
            t1 = t1.min(r);
        }
    }
    true
}

/// Whether `p` lies on the segment, within [`SEGMENT_TOLERANCE`].
pub fn segment_touches_point(seg: &Line, p: Point) -> bool {
    seg.nearest(p, SEGMENT_TOLERANCE).distance_sq <= SEGMENT_TOLERANCE * SEGMENT_TOLERANCE
}

/// Whether `rect` is usable as node bounds: finite with positive extent.
pub fn is_valid_bounds(rect: &Rect) -> bool {
    rect.is_finite() && rect.width() > 0.0 && rect.height() > 0.0
}

/// One of the four children of a subdivided node.
///
/// The y axis grows downward, so the north half is the top half.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Quadrant {
    /// Top-left child.
    NorthWest = 0,
    /// Top-right child.
    NorthEast = 1,
    /// Bottom-left child.
    SouthWest = 2,
    /// Bottom-right child.
    SouthEast = 3,
}

impl Quadrant {
    /// All quadrants, in child storage order.
    pub const ALL: [Self; 4] = [
        Self::NorthWest,
        Self::NorthEast,
        Self::SouthWest,
        Self::SouthEast,
    ];

    /// Index of this quadrant in a node's child array.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Quadrant of `bounds` that a point falls into when split at the center.
    ///
    /// Points on a center line go east/south.
    #[inline]
    pub fn of_point(bounds: &Rect, p: Point) -> Self {
        let c = bounds.center();
        match (p.x < c.x, p.y < c.y) {
            (true, true) => Self::NorthWest,
            (false, true) => Self::NorthEast,
            (true, false) => Self::SouthWest,
            (false, false) => Self::SouthEast,
        }
    }

    /// The child rectangle this quadrant covers within `bounds`.
    pub fn rect(self, bounds: &Rect) -> Rect {
        let c = bounds.center();
        match self {
            Self::NorthWest => Rect::new(bounds.x0, bounds.y0, c.x, c.y),
            Self::NorthEast => Rect::new(c.x, bounds.y0, bounds.x1, c.y),
            Self::SouthWest => Rect::new(bounds.x0, c.y, c.x, bounds.y1),
            Self::SouthEast => Rect::new(c.x, c.y, bounds.x1, bounds.y1),
        }
    }

    /// Single-bit mask for this quadrant.
    #[inline]
    pub const fn flag(self) -> Quadrants {
        match self {
            Self::NorthWest => Quadrants::NORTH_WEST,
            Self::NorthEast => Quadrants::NORTH_EAST,
            Self::SouthWest => Quadrants::SOUTH_WEST,
            Self::SouthEast => Quadrants::SOUTH_EAST,
        }
    }
}

bitflags::bitflags! {
    /// Set of child quadrants a query shape can reach.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Quadrants: u8 {
        /// Top-left child.
        const NORTH_WEST = 0b0001;
        /// Top-right child.
        const NORTH_EAST = 0b0010;
        /// Bottom-left child.
        const SOUTH_WEST = 0b0100;
        /// Bottom-right child.
        const SOUTH_EAST = 0b1000;
    }
}

impl Quadrants {
    /// Children of `bounds` whose closed rectangles overlap `rect`.
    ///
    /// Assumes `rect` already overlaps `bounds`.
    pub fn overlapping(bounds: &Rect, rect: &Rect) -> Self {
        let c = bounds.center();
        Self::from_halves(rect.x0 <= c.x, rect.x1 >= c.x, rect.y0 <= c.y, rect.y1 >= c.y)
    }

    /// Children of `bounds` whose closed rectangles contain `p`.
    ///
    /// A point on a center line reaches both neighbours.
    pub fn containing(bounds: &Rect, p: Point) -> Self {
        let c = bounds.center();
        Self::from_halves(p.x <= c.x, p.x >= c.x, p.y <= c.y, p.y >= c.y)
    }

    /// Children of `bounds` whose rectangles the segment crosses or touches.
    pub fn crossed_by(bounds: &Rect, seg: &Line) -> Self {
        Quadrant::ALL
            .into_iter()
            .filter(|q| segment_intersects_rect(seg, &q.rect(bounds)))
            .fold(Self::empty(), |acc, q| acc | q.flag())
    }

    /// Iterate the quadrants in this set, in child storage order.
    pub fn quadrants(self) -> impl Iterator<Item = Quadrant> {
        Quadrant::ALL
            .into_iter()
            .filter(move |q| self.contains(q.flag()))
    }

    fn from_halves(west: bool, east: bool, north: bool, south: bool) -> Self {
        let mut out = Self::empty();
        out.set(Self::NORTH_WEST, west && north);
        out.set(Self::NORTH_EAST, east && north);
        out.set(Self::SOUTH_WEST, west && south);
        out.set(Self::SOUTH_EAST, east && south);
        out
    }
}
