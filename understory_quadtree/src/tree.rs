// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public `QuadTree` API, generic over a placement policy.

use core::fmt::Debug;
use core::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use kurbo::{Line, Point, Rect};
use tracing::{debug, trace};

use crate::config::QuadTreeConfig;
use crate::element::Element;
use crate::error::{ConfigError, InvariantError};
use crate::guard::{NodeRef, WriteGuard, lock_subtree, restore_counts, share, upgrade};
use crate::node::QuadNode;
use crate::placement::Placement;
use crate::placements::{PointPlacement, RegionPlacement};
use crate::types::{rect_contains_point, rects_overlap, segment_intersects_rect};

/// Point-snapshot of the tree-wide counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct QuadTreeStats {
    /// Elements stored.
    pub elements: usize,
    /// Leaf quads.
    pub leaves: usize,
    /// Subdivisions performed since construction.
    pub subdivisions: u64,
    /// Internal nodes collapsed by merges since construction.
    pub merges: u64,
}

#[derive(Debug)]
struct Counters {
    elements: AtomicUsize,
    leaves: AtomicUsize,
    subdivisions: AtomicU64,
    merges: AtomicU64,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            elements: AtomicUsize::new(0),
            leaves: AtomicUsize::new(1),
            subdivisions: AtomicU64::new(0),
            merges: AtomicU64::new(0),
        }
    }
}

/// A concurrent quadtree that subdivides on overflow and merges on underflow.
///
/// All operations take `&self`; share the tree between threads with an `Arc` or
/// scoped threads. See the [crate docs](crate#concurrency) for the locking rules.
pub struct QuadTree<E, P>
where
    E: Element,
    P: Placement<Shape = E::Shape>,
{
    root: NodeRef<E>,
    bounds: Rect,
    config: QuadTreeConfig,
    counters: Counters,
    _placement: PhantomData<fn() -> P>,
}

/// Quadtree over point-shaped elements.
pub type PointQuadTree<E> = QuadTree<E, PointPlacement>;

/// Quadtree over rectangle-shaped elements.
pub type RegionQuadTree<E> = QuadTree<E, RegionPlacement>;

impl<E, P> QuadTree<E, P>
where
    E: Element,
    P: Placement<Shape = E::Shape>,
{
    /// Create a tree over `(x, y, width, height)` that splits a quad holding more
    /// than `element_limit` elements and never merges ahead of empty.
    ///
    /// # Errors
    ///
    /// See [`QuadTreeConfig::validate`].
    pub fn new(
        element_limit: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<Self, ConfigError> {
        Self::with_merge_watermark(element_limit, 0, x, y, width, height)
    }

    /// Like [`QuadTree::new`], merging any subtree left with `merge_watermark`
    /// elements or fewer after a removal.
    ///
    /// # Errors
    ///
    /// See [`QuadTreeConfig::validate`].
    pub fn with_merge_watermark(
        element_limit: usize,
        merge_watermark: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<Self, ConfigError> {
        let config = QuadTreeConfig::default()
            .with_element_limit(element_limit)
            .with_merge_watermark(merge_watermark);
        // `Rect::from_origin_size` would flip a negative extent into a valid rect.
        Self::with_config(config, Rect::new(x, y, x + width, y + height))
    }

    /// Create a tree from a full configuration.
    ///
    /// # Errors
    ///
    /// See [`QuadTreeConfig::validate`].
    pub fn with_config(config: QuadTreeConfig, bounds: Rect) -> Result<Self, ConfigError> {
        config.validate(&bounds)?;
        Ok(Self {
            root: share(QuadNode::new(bounds, 0)),
            bounds,
            config,
            counters: Counters::default(),
            _placement: PhantomData,
        })
    }

    /// Root bounds.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Thresholds this tree was built with.
    pub fn config(&self) -> &QuadTreeConfig {
        &self.config
    }

    /// Insert an element.
    ///
    /// Returns `false` and stores nothing when the element's shape lies outside
    /// the root bounds (for regions: not fully inside). Inserting an element that
    /// is already stored adds a second, independent entry.
    pub fn add(&self, element: E) -> bool {
        let shape = element.shape();
        if !P::admits(&self.bounds, &shape) {
            trace!(?shape, "rejected insert outside root bounds");
            return false;
        }
        let mut node = self.root.upgradable_read_arc();
        loop {
            let route = P::quadrant(&node.bounds, &shape);
            if let Some(child) = route.and_then(|q| node.child(q)) {
                node.total.fetch_add(1, Ordering::Relaxed);
                node = child.upgradable_read_arc();
                continue;
            }
            let mut here = upgrade(node);
            bump(&mut *here, 1);
            if here.is_leaf()
                && here.elements.len() >= self.config.element_limit
                && here.depth < self.config.max_depth
            {
                self.subdivide(&mut *here);
                if let Some(child) = route.and_then(|q| here.child(q)) {
                    node = child.upgradable_read_arc();
                    continue;
                }
            }
            here.elements.push(element);
            self.counters.elements.fetch_add(1, Ordering::Relaxed);
            return true;
        }
    }

    /// Insert every element; returns how many were accepted.
    pub fn add_all<I: IntoIterator<Item = E>>(&self, elements: I) -> usize {
        elements.into_iter().map(|e| self.add(e)).filter(|&ok| ok).count()
    }

    /// Remove one entry of `element`, compared by identity.
    ///
    /// Returns whether an entry was found. A removal that leaves a subtree with
    /// no more than the merge watermark collapses that subtree into one leaf.
    pub fn remove(&self, element: &E) -> bool {
        let shape = element.shape();
        if !P::admits(&self.bounds, &shape) {
            return false;
        }
        // Nodes released on the way down, each holding a count taken early.
        let mut path: Vec<NodeRef<E>> = Vec::new();
        let mut current = Arc::clone(&self.root);
        let mut node = current.upgradable_read_arc();
        loop {
            let remaining = node.total.fetch_sub(1, Ordering::Relaxed).wrapping_sub(1);

            if !node.is_leaf() && remaining <= self.config.merge_watermark {
                let here = upgrade(node);
                return if self.merge_removing(here, element) {
                    true
                } else {
                    restore_counts(&path);
                    trace!(?shape, "remove missed");
                    false
                };
            }

            if let Some(i) = node.position(element) {
                let mut here = upgrade(node);
                here.elements.swap_remove(i);
                self.counters.elements.fetch_sub(1, Ordering::Relaxed);
                return true;
            }

            let next = P::quadrant(&node.bounds, &shape).and_then(|q| node.child(q));
            let Some(child) = next else {
                node.total.fetch_add(1, Ordering::Relaxed);
                drop(node);
                restore_counts(&path);
                trace!(?shape, "remove missed");
                return false;
            };
            let next_guard = child.upgradable_read_arc();
            path.push(core::mem::replace(&mut current, child));
            node = next_guard;
        }
    }

    /// Remove every element; returns how many entries were removed.
    pub fn remove_all<'a, I>(&self, elements: I) -> usize
    where
        I: IntoIterator<Item = &'a E>,
        E: 'a,
    {
        elements.into_iter().filter(|e| self.remove(e)).count()
    }

    /// Drop every element and collapse the tree back to a single leaf.
    ///
    /// The collapse is not counted as a merge.
    pub fn clear(&self) {
        let mut root = self.root.write();
        let mut below = Vec::new();
        lock_subtree(&*root, &mut below);
        let collapsed = root.collapse(&mut below);
        drop(below);
        let dropped = root.elements.len();
        root.elements.clear();
        root.total.fetch_sub(dropped, Ordering::Relaxed);
        self.counters.elements.fetch_sub(dropped, Ordering::Relaxed);
        self.counters.leaves.fetch_sub(3 * collapsed, Ordering::Relaxed);
        debug!(dropped, collapsed, "cleared tree");
    }

    /// Snapshot of every stored element.
    ///
    /// The result is a fresh collection and does not follow later mutation.
    pub fn elements(&self) -> Vec<E> {
        let mut out = Vec::with_capacity(self.len());
        self.elements_into(&mut out);
        out
    }

    /// Append every stored element to `out`.
    pub fn elements_into(&self, out: &mut Vec<E>) {
        self.root.read().collect_all(out);
    }

    /// Number of stored elements. O(1).
    pub fn total_elements(&self) -> usize {
        self.counters.elements.load(Ordering::Relaxed)
    }

    /// Alias of [`QuadTree::total_elements`].
    pub fn len(&self) -> usize {
        self.total_elements()
    }

    /// Whether the tree stores no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of leaf quads. O(1).
    pub fn total_quads(&self) -> usize {
        self.counters.leaves.load(Ordering::Relaxed)
    }

    /// Internal nodes collapsed by merges since construction.
    pub fn total_merge_operations(&self) -> u64 {
        self.counters.merges.load(Ordering::Relaxed)
    }

    /// Subdivisions performed since construction.
    pub fn total_subdivisions(&self) -> u64 {
        self.counters.subdivisions.load(Ordering::Relaxed)
    }

    /// Snapshot of all counters.
    pub fn stats(&self) -> QuadTreeStats {
        QuadTreeStats {
            elements: self.total_elements(),
            leaves: self.total_quads(),
            subdivisions: self.total_subdivisions(),
            merges: self.total_merge_operations(),
        }
    }

    /// Depth of the deepest leaf; a lone root is depth 0.
    pub fn depth(&self) -> usize {
        self.root.read().max_depth()
    }

    /// Elements whose shape intersects `rect`.
    pub fn elements_within_region(&self, rect: Rect) -> Vec<E> {
        let mut out = Vec::new();
        self.elements_within_region_into(rect, &mut out);
        out
    }

    /// Append elements whose shape intersects `rect` to `out`.
    pub fn elements_within_region_into(&self, rect: Rect, out: &mut Vec<E>) {
        if !rects_overlap(&self.bounds, &rect) {
            return;
        }
        self.root.read().collect_in_rect::<P>(&rect, out);
    }

    /// Elements whose shape intersects the segment.
    pub fn elements_intersecting_segment(&self, seg: Line) -> Vec<E> {
        let mut out = Vec::new();
        self.elements_intersecting_segment_into(seg, &mut out);
        out
    }

    /// Append elements whose shape intersects the segment to `out`.
    pub fn elements_intersecting_segment_into(&self, seg: Line, out: &mut Vec<E>) {
        if !segment_intersects_rect(&seg, &self.bounds) {
            return;
        }
        self.root.read().collect_on_segment::<P>(&seg, out);
    }

    /// Elements whose shape contains `p`.
    pub fn elements_containing_point(&self, p: Point) -> Vec<E> {
        let mut out = Vec::new();
        self.elements_containing_point_into(p, &mut out);
        out
    }

    /// Append elements whose shape contains `p` to `out`.
    pub fn elements_containing_point_into(&self, p: Point, out: &mut Vec<E>) {
        if !rect_contains_point(&self.bounds, p) {
            return;
        }
        self.root.read().collect_at_point::<P>(p, out);
    }

    /// Recount the whole tree and verify its structural invariants.
    ///
    /// Meant for tests and debugging. Only meaningful while no insert or remove
    /// is in flight; concurrent mutation can make counts disagree transiently.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantError`] found.
    pub fn check_invariants(&self) -> Result<QuadTreeStats, InvariantError> {
        let mut leaves = 0;
        let actual = self.root.read().audit::<P>(&mut Vec::new(), &mut leaves)?;
        let stats = self.stats();
        if stats.elements != actual {
            return Err(InvariantError::ElementTotalMismatch {
                reported: stats.elements,
                actual,
            });
        }
        if stats.leaves != leaves {
            return Err(InvariantError::LeafTotalMismatch {
                reported: stats.leaves,
                actual: leaves,
            });
        }
        Ok(stats)
    }

    fn subdivide(&self, node: &mut QuadNode<E>) {
        let moved = node.subdivide::<P>();
        self.counters.leaves.fetch_add(3, Ordering::Relaxed);
        self.counters.subdivisions.fetch_add(1, Ordering::Relaxed);
        debug!(bounds = ?node.bounds, depth = node.depth, moved, "subdivided quad");
    }

    /// Collapse the subtree under `here` if it holds `element`, then remove it.
    ///
    /// The caller has already taken `element`'s count from `here`.
    fn merge_removing(&self, mut here: WriteGuard<E>, element: &E) -> bool {
        let mut below = Vec::new();
        lock_subtree(&*here, &mut below);
        let present = here.position(element).is_some()
            || below.iter().any(|g| g.position(element).is_some());
        if !present {
            bump(&mut *here, 1);
            return false;
        }
        let collapsed = here.collapse(&mut below);
        drop(below);
        if let Some(i) = here.position(element) {
            here.elements.swap_remove(i);
        }
        self.counters.elements.fetch_sub(1, Ordering::Relaxed);
        self.counters.leaves.fetch_sub(3 * collapsed, Ordering::Relaxed);
        self.counters
            .merges
            .fetch_add(collapsed as u64, Ordering::Relaxed);
        debug!(
            bounds = ?here.bounds,
            depth = here.depth,
            collapsed,
            kept = here.elements.len(),
            "merged quad"
        );
        true
    }
}

/// Adjust a write-locked node's subtree count.
#[inline]
fn bump<E>(node: &mut QuadNode<E>, by: usize) {
    let total = node.total.get_mut();
    *total = total.wrapping_add(by);
}

impl<E, P> Debug for QuadTree<E, P>
where
    E: Element,
    P: Placement<Shape = E::Shape>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QuadTree")
            .field("bounds", &self.bounds)
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Shaped;

    #[derive(Debug)]
    struct Dot(Point);

    impl Shaped for Dot {
        type Shape = Point;
        fn shape(&self) -> Point {
            self.0
        }
    }

    #[derive(Debug)]
    struct Tile(Rect);

    impl Shaped for Tile {
        type Shape = Rect;
        fn shape(&self) -> Rect {
            self.0
        }
    }

    fn dot(x: f64, y: f64) -> Arc<Dot> {
        Arc::new(Dot(Point::new(x, y)))
    }

    fn tile(x: f64, y: f64, w: f64, h: f64) -> Arc<Tile> {
        Arc::new(Tile(Rect::from_origin_size((x, y), (w, h))))
    }

    fn quads_match_history<E: Element, P: Placement<Shape = E::Shape>>(t: &QuadTree<E, P>) {
        let s = t.stats();
        assert_eq!(
            s.leaves as u64,
            1 + 3 * (s.subdivisions - s.merges),
            "leaf count follows subdivide/merge history"
        );
    }

    #[test]
    fn point_scenario_splits_on_third_insert() {
        let t = PointQuadTree::new(2, 0.0, 0.0, 128.0, 128.0).unwrap();
        assert!(t.add(dot(0.0, 0.0)));
        assert!(t.add(dot(127.0, 0.0)));
        assert_eq!(t.total_quads(), 1);
        assert_eq!(t.elements().len(), 2);
        assert!(t.add(dot(0.0, 127.0)));
        assert_eq!(t.total_quads(), 4);
        assert_eq!(t.elements().len(), 3);
        assert_eq!(t.total_elements(), 3);
        t.check_invariants().unwrap();
        quads_match_history(&t);
    }

    #[test]
    fn region_scenario_merges_below_watermark() {
        let t = RegionQuadTree::with_merge_watermark(4, 3, 0.0, 0.0, 128.0, 128.0).unwrap();
        let boxes = [
            tile(0.0, 0.0, 32.0, 32.0),
            tile(96.0, 0.0, 32.0, 32.0),
            tile(0.0, 96.0, 32.0, 32.0),
            tile(96.0, 96.0, 32.0, 32.0),
            tile(48.0, 48.0, 32.0, 32.0),
        ];
        assert!(t.add(boxes[0].clone()));
        assert_eq!(t.total_quads(), 1);
        for b in &boxes[1..] {
            assert!(t.add(b.clone()));
        }
        assert_eq!(t.total_quads(), 4);
        t.check_invariants().unwrap();

        for b in &boxes[..3] {
            assert!(t.remove(b));
        }
        assert_eq!(t.total_quads(), 1);
        assert_eq!(t.total_elements(), 2);
        assert_eq!(t.total_merge_operations(), 1);
        t.check_invariants().unwrap();
        quads_match_history(&t);
    }

    #[test]
    fn line_scenario_hits_opposite_corners() {
        let t = RegionQuadTree::new(4, 0.0, 0.0, 128.0, 128.0).unwrap();
        let tl = tile(0.0, 0.0, 32.0, 32.0);
        let tr = tile(96.0, 0.0, 32.0, 32.0);
        let bl = tile(0.0, 96.0, 32.0, 32.0);
        let br = tile(96.0, 96.0, 32.0, 32.0);
        t.add_all([tl.clone(), tr.clone(), bl.clone(), br.clone()]);
        let hits = t.elements_intersecting_segment(Line::new((0.0, 0.0), (128.0, 128.0)));
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().any(|h| h.same_as(&tl)));
        assert!(hits.iter().any(|h| h.same_as(&br)));
        assert!(!hits.iter().any(|h| h.same_as(&tr) || h.same_as(&bl)));
    }

    #[test]
    fn line_query_after_split_descends() {
        let t = RegionQuadTree::new(1, 0.0, 0.0, 128.0, 128.0).unwrap();
        let tl = tile(0.0, 0.0, 16.0, 16.0);
        let tr = tile(100.0, 4.0, 16.0, 16.0);
        let br = tile(100.0, 100.0, 16.0, 16.0);
        t.add_all([tl.clone(), tr.clone(), br.clone()]);
        assert!(t.total_quads() > 1);
        let hits = t.elements_intersecting_segment(Line::new((0.0, 0.0), (128.0, 128.0)));
        assert_eq!(hits.len(), 2);
        assert!(!hits.iter().any(|h| h.same_as(&tr)));
    }

    #[test]
    fn remove_every_element_returns_to_one_quad() {
        let t = PointQuadTree::new(2, 0.0, 0.0, 128.0, 128.0).unwrap();
        let dots: Vec<_> = (0..40)
            .map(|i| dot(f64::from(i * 3 % 128), f64::from(i * 7 % 128)))
            .collect();
        assert_eq!(t.add_all(dots.iter().cloned()), 40);
        assert!(t.total_quads() > 1);
        t.check_invariants().unwrap();
        assert_eq!(t.remove_all(&dots), 40);
        assert_eq!(t.total_quads(), 1);
        assert_eq!(t.total_elements(), 0);
        assert!(t.elements().is_empty());
        assert!(t.total_merge_operations() > 0);
        t.check_invariants().unwrap();
        quads_match_history(&t);
    }

    #[test]
    fn totals_track_snapshot_through_churn() {
        let t = RegionQuadTree::with_merge_watermark(3, 1, 0.0, 0.0, 256.0, 256.0).unwrap();
        let mut live = Vec::new();
        for i in 0..60_i32 {
            let x = f64::from((i * 37) % 220);
            let y = f64::from((i * 53) % 240);
            let b = tile(x, y, 4.0 + f64::from(i % 5) * 6.0, 6.0);
            assert!(t.add(b.clone()));
            live.push(b);
            if i % 3 == 2 {
                let gone = live.remove(live.len() / 2);
                assert!(t.remove(&gone));
            }
            assert_eq!(t.total_elements(), t.elements().len());
            assert_eq!(t.total_elements(), live.len());
        }
        t.check_invariants().unwrap();
        quads_match_history(&t);
    }

    #[test]
    fn remove_is_by_identity() {
        let t = PointQuadTree::new(4, 0.0, 0.0, 10.0, 10.0).unwrap();
        let a = dot(1.0, 1.0);
        let twin = dot(1.0, 1.0);
        assert!(t.add(a.clone()));
        assert!(!t.remove(&twin));
        assert_eq!(t.total_elements(), 1);
        assert!(t.remove(&a));
        assert!(!t.remove(&a));
        assert!(t.is_empty());
        t.check_invariants().unwrap();
    }

    #[test]
    fn missing_remove_restores_counts_in_deep_tree() {
        let t = PointQuadTree::new(1, 0.0, 0.0, 64.0, 64.0).unwrap();
        for i in 0..16 {
            t.add(dot(f64::from(i) * 4.0, f64::from(i) * 4.0));
        }
        let stranger = dot(60.0, 61.0);
        assert!(!t.remove(&stranger));
        t.check_invariants().unwrap();
    }

    #[test]
    fn duplicate_insert_is_a_second_entry() {
        let t = PointQuadTree::new(4, 0.0, 0.0, 10.0, 10.0).unwrap();
        let a = dot(2.0, 2.0);
        assert!(t.add(a.clone()));
        assert!(t.add(a.clone()));
        assert_eq!(t.total_elements(), 2);
        assert!(t.remove(&a));
        assert_eq!(t.total_elements(), 1);
        assert!(t.remove(&a));
        assert!(t.is_empty());
    }

    #[test]
    fn out_of_bounds_insert_is_rejected() {
        let t = RegionQuadTree::new(4, 0.0, 0.0, 128.0, 128.0).unwrap();
        assert!(!t.add(tile(200.0, 200.0, 10.0, 10.0)));
        assert!(!t.add(tile(120.0, 120.0, 20.0, 20.0)));
        assert!(t.is_empty());
        let p = PointQuadTree::new(4, 0.0, 0.0, 128.0, 128.0).unwrap();
        assert!(!p.add(dot(-1.0, 5.0)));
        assert!(p.add(dot(128.0, 128.0)));
        assert_eq!(p.elements_containing_point(Point::new(128.0, 128.0)).len(), 1);
    }

    #[test]
    fn queries_on_empty_or_outside_return_empty() {
        let t = RegionQuadTree::new(4, 0.0, 0.0, 128.0, 128.0).unwrap();
        assert!(t.elements_within_region(Rect::new(0.0, 0.0, 128.0, 128.0)).is_empty());
        t.add(tile(10.0, 10.0, 10.0, 10.0));
        assert!(t.elements_within_region(Rect::new(300.0, 300.0, 400.0, 400.0)).is_empty());
        assert!(t
            .elements_intersecting_segment(Line::new((200.0, 0.0), (300.0, 50.0)))
            .is_empty());
        assert!(t.elements_containing_point(Point::new(-5.0, -5.0)).is_empty());
    }

    #[test]
    fn region_queries_find_straddlers_and_nested() {
        let t = RegionQuadTree::new(2, 0.0, 0.0, 128.0, 128.0).unwrap();
        let big = tile(40.0, 40.0, 48.0, 48.0);
        let small = tile(50.0, 50.0, 4.0, 4.0);
        let far = tile(100.0, 100.0, 8.0, 8.0);
        let corner = tile(2.0, 2.0, 4.0, 4.0);
        t.add_all([big.clone(), small.clone(), far.clone(), corner.clone()]);
        assert!(t.total_quads() > 1);

        let at = t.elements_containing_point(Point::new(52.0, 52.0));
        assert_eq!(at.len(), 2);
        assert!(at.iter().any(|e| e.same_as(&big)) && at.iter().any(|e| e.same_as(&small)));

        let hits = t.elements_within_region(Rect::new(0.0, 0.0, 45.0, 45.0));
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().any(|e| e.same_as(&corner)));

        let mut buf = Vec::new();
        t.elements_within_region_into(Rect::new(90.0, 90.0, 128.0, 128.0), &mut buf);
        t.elements_within_region_into(Rect::new(0.0, 0.0, 8.0, 8.0), &mut buf);
        assert_eq!(buf.len(), 2);
        t.check_invariants().unwrap();
    }

    #[test]
    fn point_queries_use_exact_matches() {
        let t = PointQuadTree::new(1, 0.0, 0.0, 128.0, 128.0).unwrap();
        let on_line = dot(32.0, 32.0);
        let off_line = dot(32.0, 90.0);
        let center = dot(64.0, 64.0);
        t.add_all([on_line.clone(), off_line.clone(), center.clone()]);
        let seg = t.elements_intersecting_segment(Line::new((0.0, 0.0), (128.0, 128.0)));
        assert_eq!(seg.len(), 2);
        assert!(!seg.iter().any(|e| e.same_as(&off_line)));
        let at = t.elements_containing_point(Point::new(64.0, 64.0));
        assert_eq!(at.len(), 1);
        assert!(at[0].same_as(&center));
        let area = t.elements_within_region(Rect::new(30.0, 30.0, 34.0, 95.0));
        assert_eq!(area.len(), 2);
    }

    #[test]
    fn max_depth_stops_subdivision() {
        let config = QuadTreeConfig::default()
            .with_element_limit(1)
            .with_max_depth(3);
        let t: PointQuadTree<Arc<Dot>> =
            QuadTree::with_config(config, Rect::new(0.0, 0.0, 64.0, 64.0)).unwrap();
        for _ in 0..10 {
            t.add(dot(5.0, 5.0));
        }
        assert_eq!(t.depth(), 3);
        assert_eq!(t.total_elements(), 10);
        assert_eq!(t.elements_containing_point(Point::new(5.0, 5.0)).len(), 10);
        t.check_invariants().unwrap();
        quads_match_history(&t);
    }

    #[test]
    fn clear_collapses_to_single_leaf() {
        let t = PointQuadTree::new(1, 0.0, 0.0, 64.0, 64.0).unwrap();
        for i in 0..10 {
            t.add(dot(f64::from(i) * 6.0, 3.0));
        }
        assert!(t.total_quads() > 1);
        let merges = t.total_merge_operations();
        t.clear();
        assert_eq!(t.total_quads(), 1);
        assert!(t.is_empty());
        assert_eq!(t.total_merge_operations(), merges);
        t.check_invariants().unwrap();
        assert!(t.add(dot(1.0, 1.0)));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        assert!(matches!(
            PointQuadTree::<Arc<Dot>>::with_merge_watermark(2, 2, 0.0, 0.0, 1.0, 1.0),
            Err(ConfigError::WatermarkNotBelowLimit { .. })
        ));
        assert!(matches!(
            PointQuadTree::<Arc<Dot>>::new(2, 0.0, 0.0, -1.0, 1.0),
            Err(ConfigError::InvalidBounds(_))
        ));
        assert!(matches!(
            PointQuadTree::<Arc<Dot>>::new(2, 0.0, 0.0, 1.0, -1.0),
            Err(ConfigError::InvalidBounds(_))
        ));
        assert!(matches!(
            RegionQuadTree::<Arc<Tile>>::with_merge_watermark(4, 1, 5.0, 5.0, -10.0, -10.0),
            Err(ConfigError::InvalidBounds(_))
        ));
        assert!(matches!(
            PointQuadTree::<Arc<Dot>>::new(2, 0.0, 0.0, 0.0, 1.0),
            Err(ConfigError::InvalidBounds(_))
        ));
        let t = PointQuadTree::<Arc<Dot>>::new(2, -8.0, -4.0, 16.0, 8.0).unwrap();
        assert_eq!(t.bounds(), Rect::new(-8.0, -4.0, 8.0, 4.0));
    }

    #[test]
    fn excessive_max_depth_is_rejected() {
        let config = QuadTreeConfig::default().with_max_depth(usize::MAX);
        assert!(matches!(
            PointQuadTree::<Arc<Dot>>::with_config(config, Rect::new(0.0, 0.0, 1.0, 1.0)),
            Err(ConfigError::MaxDepthTooLarge { .. })
        ));
    }

    #[test]
    fn removing_straddler_from_internal_node_merges_parent() {
        let t = RegionQuadTree::with_merge_watermark(2, 1, 0.0, 0.0, 128.0, 128.0).unwrap();
        let west = tile(0.0, 0.0, 16.0, 16.0);
        let east = tile(100.0, 0.0, 16.0, 16.0);
        let straddler = tile(48.0, 48.0, 32.0, 32.0);
        t.add_all([west.clone(), east.clone(), straddler.clone()]);
        assert_eq!(t.total_quads(), 4);
        // The straddler fits no child, so it sits on the internal root.
        assert!(t.root.read().position(&straddler).is_some());
        assert_eq!(t.elements_containing_point(Point::new(64.0, 64.0)).len(), 1);

        assert!(t.remove(&west));
        assert_eq!(t.total_quads(), 4, "two left, above the watermark");
        assert!(t.remove(&straddler));
        assert_eq!(t.total_quads(), 1);
        assert_eq!(t.total_merge_operations(), 1);
        assert!(t.elements_containing_point(Point::new(64.0, 64.0)).is_empty());
        let left = t.elements();
        assert_eq!(left.len(), 1);
        assert!(left[0].same_as(&east));
        t.check_invariants().unwrap();
        quads_match_history(&t);
    }

    #[test]
    fn removing_straddler_without_merge_keeps_children() {
        let t = RegionQuadTree::with_merge_watermark(2, 1, 0.0, 0.0, 128.0, 128.0).unwrap();
        let west = tile(0.0, 0.0, 16.0, 16.0);
        let east = tile(100.0, 0.0, 16.0, 16.0);
        let straddler = tile(60.0, 0.0, 10.0, 10.0);
        t.add_all([west.clone(), east.clone(), straddler.clone()]);
        assert!(t.remove(&straddler));
        assert_eq!(t.total_quads(), 4);
        assert!(t.root.read().elements.is_empty());
        t.check_invariants().unwrap();
        assert!(t.remove(&west));
        assert_eq!(t.total_quads(), 1);
        t.check_invariants().unwrap();
    }

    #[test]
    fn merge_under_in_flight_miss_leaves_oversized_leaf_until_next_insert() {
        let t = PointQuadTree::with_merge_watermark(2, 1, 0.0, 0.0, 128.0, 128.0).unwrap();
        let dots = [dot(1.0, 1.0), dot(100.0, 1.0), dot(1.0, 100.0), dot(100.0, 100.0)];
        t.add_all(dots.iter().cloned());
        assert_eq!(t.total_quads(), 4);

        // Stand in for a concurrent remove that has taken two counts from the
        // root and has not yet found out its elements are absent.
        t.root.read().total.fetch_sub(2, Ordering::Relaxed);
        assert!(t.remove(&dots[0]));
        assert_eq!(t.total_quads(), 1, "root merged on the low count");
        assert_eq!(t.root.read().elements.len(), 3, "above the element limit");
        t.root.read().total.fetch_add(2, Ordering::Relaxed);
        t.check_invariants().unwrap();

        assert!(t.add(dot(2.0, 2.0)));
        assert_eq!(t.total_quads(), 4, "next insert splits the oversized leaf");
        assert_eq!(t.total_elements(), 4);
        t.check_invariants().unwrap();
        quads_match_history(&t);
    }
}
