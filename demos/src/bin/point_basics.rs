// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of a point quadtree: insert, query, remove, and watch it rebalance.
//!
//! Run with `RUST_LOG=debug` to see subdivisions and merges.

use std::sync::Arc;

use kurbo::{Line, Point, Rect};
use tracing::info;
use understory_quadtree::{ConfigError, PointQuadTree, Shaped};

#[derive(Debug)]
struct Marker {
    name: &'static str,
    at: Point,
}

impl Shaped for Marker {
    type Shape = Point;
    fn shape(&self) -> Point {
        self.at
    }
}

fn main() -> Result<(), ConfigError> {
    understory_quadtree_demos::init_logging("info");

    let tree = PointQuadTree::with_merge_watermark(2, 1, 0.0, 0.0, 128.0, 128.0)?;
    let markers: Vec<_> = [
        ("home", (8.0, 8.0)),
        ("well", (120.0, 4.0)),
        ("mill", (10.0, 110.0)),
        ("gate", (64.0, 64.0)),
        ("tower", (100.0, 100.0)),
    ]
    .into_iter()
    .map(|(name, (x, y))| {
        Arc::new(Marker {
            name,
            at: Point::new(x, y),
        })
    })
    .collect();

    let added = tree.add_all(markers.iter().cloned());
    info!(added, quads = tree.total_quads(), "inserted markers");

    let names = |hits: Vec<Arc<Marker>>| hits.iter().map(|m| m.name).collect::<Vec<_>>();
    let diagonal = tree.elements_intersecting_segment(Line::new((0.0, 0.0), (128.0, 128.0)));
    info!(hits = ?names(diagonal), "on the diagonal");
    let west = tree.elements_within_region(Rect::new(0.0, 0.0, 32.0, 128.0));
    info!(hits = ?names(west), "west strip");
    let gate = tree.elements_containing_point(Point::new(64.0, 64.0));
    info!(hits = ?names(gate), "at the gate");

    let outside = Arc::new(Marker {
        name: "ship",
        at: Point::new(200.0, 10.0),
    });
    info!(accepted = tree.add(outside), "outside the map");

    for m in &markers[..4] {
        tree.remove(m);
    }
    let stats = tree.stats();
    info!(
        elements = stats.elements,
        quads = stats.leaves,
        merges = stats.merges,
        "after removals"
    );
    Ok(())
}
