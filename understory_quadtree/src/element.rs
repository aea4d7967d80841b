// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! What a tree stores: shaped values with an identity.

use core::fmt::Debug;
use std::sync::Arc;

/// A value with a shape the tree can place and match against queries.
///
/// The shape is read on insert, on remove, and during every query. It must not
/// change while the value is stored in a tree.
pub trait Shaped {
    /// Geometry used for placement, typically [`kurbo::Point`] or [`kurbo::Rect`].
    type Shape: Copy + Debug;

    /// Current shape of this value.
    fn shape(&self) -> Self::Shape;
}

/// A handle stored in a quadtree.
///
/// Trees hand out clones of stored handles from queries, so a handle should be
/// cheap to clone. Removal compares handles with [`Element::same_as`], not by
/// shape: two distinct elements may share a shape.
///
/// Any `Arc<U>` where `U: Shaped` is an element with pointer identity:
///
/// ```
/// use std::sync::Arc;
/// use kurbo::Point;
/// use understory_quadtree::{Element, Shaped};
///
/// struct Particle(Point);
///
/// impl Shaped for Particle {
///     type Shape = Point;
///     fn shape(&self) -> Point {
///         self.0
///     }
/// }
///
/// let a = Arc::new(Particle(Point::new(1.0, 1.0)));
/// let b = Arc::new(Particle(Point::new(1.0, 1.0)));
/// assert!(a.same_as(&Arc::clone(&a)));
/// assert!(!a.same_as(&b));
/// ```
pub trait Element: Clone {
    /// Geometry used for placement.
    type Shape: Copy + Debug;

    /// Current shape of this element.
    fn shape(&self) -> Self::Shape;

    /// Whether `self` and `other` are the same stored element.
    fn same_as(&self, other: &Self) -> bool;
}

impl<U: Shaped + ?Sized> Element for Arc<U> {
    type Shape = U::Shape;

    #[inline]
    fn shape(&self) -> Self::Shape {
        (**self).shape()
    }

    #[inline]
    fn same_as(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}
