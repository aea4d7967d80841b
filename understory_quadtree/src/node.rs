// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree nodes: element storage, subdivision, collapse, and query traversal.

use core::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use kurbo::{Line, Point, Rect};

use crate::element::Element;
use crate::error::InvariantError;
use crate::guard::{NodeRef, WriteGuard, share};
use crate::placement::Placement;
use crate::types::{Quadrant, Quadrants};

/// A quad of the tree.
///
/// A leaf holds every element in its bounds. An internal node has exactly four
/// children and, for region placement, holds the elements no single child fully
/// contains.
pub(crate) struct QuadNode<E> {
    pub(crate) bounds: Rect,
    pub(crate) depth: usize,
    pub(crate) elements: Vec<E>,
    pub(crate) children: Option<[NodeRef<E>; 4]>,
    /// Elements in this subtree.
    ///
    /// Only the holder of this node's upgradable or write lock changes it, with
    /// wrapping arithmetic: a remove may take a count early and hand it back later.
    pub(crate) total: AtomicUsize,
}

impl<E> QuadNode<E> {
    pub(crate) fn new(bounds: Rect, depth: usize) -> Self {
        Self::with_elements(bounds, depth, Vec::new())
    }

    fn with_elements(bounds: Rect, depth: usize, elements: Vec<E>) -> Self {
        let total = AtomicUsize::new(elements.len());
        Self {
            bounds,
            depth,
            elements,
            children: None,
            total,
        }
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    #[inline]
    pub(crate) fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Handle of the child in quadrant `q`, if this node is internal.
    #[inline]
    pub(crate) fn child(&self, q: Quadrant) -> Option<NodeRef<E>> {
        self.children.as_ref().map(|c| Arc::clone(&c[q.index()]))
    }
}

impl<E: Element> QuadNode<E> {
    /// Index of `element` in this node's own list.
    pub(crate) fn position(&self, element: &E) -> Option<usize> {
        self.elements.iter().position(|e| e.same_as(element))
    }

    /// Turn this leaf into an internal node with four fresh leaves.
    ///
    /// Each element moves to the child the policy picks; elements that fit no
    /// single child stay. The subtree count is unchanged. Returns how many
    /// elements moved down.
    pub(crate) fn subdivide<P: Placement<Shape = E::Shape>>(&mut self) -> usize {
        debug_assert!(self.is_leaf(), "only leaves subdivide");
        let bounds = self.bounds;
        let mut buckets: [Vec<E>; 4] = core::array::from_fn(|_| Vec::new());
        let mut stay = Vec::new();
        for e in mem::take(&mut self.elements) {
            match P::quadrant(&bounds, &e.shape()) {
                Some(q) => buckets[q.index()].push(e),
                None => stay.push(e),
            }
        }
        let moved = buckets.iter().map(Vec::len).sum();
        let depth = self.depth + 1;
        self.elements = stay;
        self.children = Some(Quadrant::ALL.map(|q| {
            share(Self::with_elements(
                q.rect(&bounds),
                depth,
                mem::take(&mut buckets[q.index()]),
            ))
        }));
        moved
    }

    /// Fold the locked subtree `below` into this node, which becomes a leaf.
    ///
    /// `below` must be the guards produced by
    /// [`lock_subtree`](crate::guard::lock_subtree) for this node. Returns the
    /// number of internal nodes collapsed, this one included. The subtree count
    /// is left alone.
    pub(crate) fn collapse(&mut self, below: &mut [WriteGuard<E>]) -> usize {
        if self.is_leaf() {
            return 0;
        }
        let collapsed = 1 + below.iter().filter(|g| !g.is_leaf()).count();
        for guard in below.iter_mut() {
            self.elements.append(&mut guard.elements);
            guard.children = None;
        }
        self.children = None;
        collapsed
    }

    /// Every element in this subtree.
    pub(crate) fn collect_all(&self, out: &mut Vec<E>) {
        out.extend(self.elements.iter().cloned());
        if let Some(children) = self.children.as_ref() {
            for child in children {
                child.read().collect_all(out);
            }
        }
    }

    /// Elements whose shape intersects `rect`. `rect` must overlap this node.
    pub(crate) fn collect_in_rect<P: Placement<Shape = E::Shape>>(
        &self,
        rect: &Rect,
        out: &mut Vec<E>,
    ) {
        out.extend(
            self.elements
                .iter()
                .filter(|e| P::intersects_rect(&e.shape(), rect))
                .cloned(),
        );
        if let Some(children) = self.children.as_ref() {
            for q in Quadrants::overlapping(&self.bounds, rect).quadrants() {
                children[q.index()].read().collect_in_rect::<P>(rect, out);
            }
        }
    }

    /// Elements whose shape intersects the segment. The segment must touch this node.
    pub(crate) fn collect_on_segment<P: Placement<Shape = E::Shape>>(
        &self,
        seg: &Line,
        out: &mut Vec<E>,
    ) {
        out.extend(
            self.elements
                .iter()
                .filter(|e| P::intersects_segment(&e.shape(), seg))
                .cloned(),
        );
        if let Some(children) = self.children.as_ref() {
            for q in Quadrants::crossed_by(&self.bounds, seg).quadrants() {
                children[q.index()].read().collect_on_segment::<P>(seg, out);
            }
        }
    }

    /// Elements whose shape contains `p`. This node must contain `p`.
    pub(crate) fn collect_at_point<P: Placement<Shape = E::Shape>>(
        &self,
        p: Point,
        out: &mut Vec<E>,
    ) {
        out.extend(
            self.elements
                .iter()
                .filter(|e| P::contains_point(&e.shape(), p))
                .cloned(),
        );
        if let Some(children) = self.children.as_ref() {
            for q in Quadrants::containing(&self.bounds, p).quadrants() {
                children[q.index()].read().collect_at_point::<P>(p, out);
            }
        }
    }

    /// Deepest level below and including this node.
    pub(crate) fn max_depth(&self) -> usize {
        match self.children.as_ref() {
            None => self.depth,
            Some(children) => children
                .iter()
                .map(|c| c.read().max_depth())
                .max()
                .unwrap_or(self.depth),
        }
    }

    /// Recount this subtree and check it against cached counts and placement.
    ///
    /// `route` holds the bounds and chosen quadrant of every ancestor.
    pub(crate) fn audit<P: Placement<Shape = E::Shape>>(
        &self,
        route: &mut Vec<(Rect, Quadrant)>,
        leaves: &mut usize,
    ) -> Result<usize, InvariantError> {
        for e in &self.elements {
            let shape = e.shape();
            let on_route = route
                .iter()
                .all(|(bounds, q)| P::quadrant(bounds, &shape) == Some(*q));
            let stays = self.is_leaf() || P::quadrant(&self.bounds, &shape).is_none();
            if !on_route || !stays {
                return Err(InvariantError::Misplaced {
                    bounds: self.bounds,
                });
            }
        }
        let mut actual = self.elements.len();
        match self.children.as_ref() {
            None => *leaves += 1,
            Some(children) => {
                for q in Quadrant::ALL {
                    route.push((self.bounds, q));
                    let below = children[q.index()].read().audit::<P>(route, leaves);
                    route.pop();
                    actual += below?;
                }
            }
        }
        let cached = self.total();
        if cached != actual {
            return Err(InvariantError::CountMismatch {
                bounds: self.bounds,
                cached,
                actual,
            });
        }
        Ok(actual)
    }
}
