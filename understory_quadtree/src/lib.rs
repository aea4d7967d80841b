// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Quadtree: a concurrent, self-rebalancing 2D quadtree.
//!
//! A [`QuadTree`] covers a fixed rectangle and stores cheap-to-clone element
//! handles. It is meant as a broad-phase index for simulations where many threads
//! insert, remove, and query at the same time.
//!
//! - A leaf holding `element_limit` elements subdivides into four equal quads on
//!   the next insert that lands there.
//! - A removal that leaves a subtree with `merge_watermark` elements or fewer
//!   collapses that subtree back into a single leaf.
//! - Queries by rectangle, segment, and point visit only the quads they touch.
//!
//! Two placement policies are provided:
//!
//! - [`PointQuadTree`] stores point-shaped elements in leaves.
//! - [`RegionQuadTree`] stores rectangle-shaped elements in the deepest quad that
//!   fully contains them, so a rectangle straddling a split line stays on an
//!   internal node.
//!
//! Geometry comes from [`kurbo`]. All predicates treat rectangles as closed.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use kurbo::{Line, Point, Rect};
//! use understory_quadtree::{RegionQuadTree, Shaped};
//!
//! #[derive(Debug)]
//! struct Body(Rect);
//!
//! impl Shaped for Body {
//!     type Shape = Rect;
//!     fn shape(&self) -> Rect {
//!         self.0
//!     }
//! }
//!
//! let tree = RegionQuadTree::new(4, 0.0, 0.0, 128.0, 128.0).unwrap();
//! let a = Arc::new(Body(Rect::new(0.0, 0.0, 32.0, 32.0)));
//! let b = Arc::new(Body(Rect::new(96.0, 0.0, 128.0, 32.0)));
//! assert!(tree.add(a.clone()));
//! assert!(tree.add(b.clone()));
//!
//! let hits = tree.elements_intersecting_segment(Line::new((0.0, 0.0), (128.0, 128.0)));
//! assert_eq!(hits.len(), 1);
//! assert_eq!(tree.elements_containing_point(Point::new(100.0, 10.0)).len(), 1);
//!
//! assert!(tree.remove(&a));
//! assert_eq!(tree.total_elements(), 1);
//! ```
//!
//! # Concurrency
//!
//! Every operation takes `&self`. Each quad sits behind its own
//! [`parking_lot::RwLock`]:
//!
//! - Queries read-lock quads top-down and run in parallel with each other.
//! - Inserts and removes walk down holding at most a parent and a child, so
//!   writers in disjoint parts of the tree do not contend below their common
//!   ancestor.
//! - A merge write-locks the whole subtree it collapses.
//!
//! A remove takes its element out of each quad's count on the way down, before it
//! knows the element is stored. While a remove that will miss is in flight, counts
//! on its path read low, so a concurrent remove can merge a subtree that still
//! holds more than `merge_watermark` elements. The merged leaf may then exceed
//! `element_limit`; it subdivides on the next insert that reaches it. The tree
//! stays well-formed and counts are exact again once the miss has restored them.
//!
//! A query returns a snapshot that reflects every insert or remove that finished
//! before it started. Counters such as [`QuadTree::total_elements`] are exact once
//! no mutation is in flight.
//!
//! ## Elements
//!
//! Anything implementing [`Element`] can be stored; `Arc<T>` for any
//! `T:` [`Shaped`] does so with pointer identity. Removal is by identity, never
//! by shape.
//!
//! ## Logging
//!
//! Subdivisions, merges, and clears are reported at `debug` level through
//! [`tracing`]; rejected inserts and missed removals at `trace` level.

pub mod config;
pub mod element;
pub mod error;
mod guard;
mod node;
pub mod placement;
pub mod placements;
pub mod tree;
pub mod types;

pub use config::{MAX_SUPPORTED_DEPTH, QuadTreeConfig};
pub use element::{Element, Shaped};
pub use error::{ConfigError, InvariantError};
pub use placement::Placement;
pub use placements::{PointPlacement, RegionPlacement};
pub use tree::{PointQuadTree, QuadTree, QuadTreeStats, RegionQuadTree};
pub use types::{Quadrant, Quadrants};
