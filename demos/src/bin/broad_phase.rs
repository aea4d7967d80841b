// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A multi-threaded broad phase: movers relocate bodies while scanners look for
//! candidate pairs, all against one shared region quadtree.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use kurbo::Rect;
use rand::Rng;
use tracing::info;
use understory_quadtree::{ConfigError, QuadTreeConfig, RegionQuadTree, Shaped};

const WORLD: f64 = 1024.0;
const BODIES_PER_MOVER: usize = 500;
const MOVERS: usize = 4;
const SCANNERS: usize = 2;
const STEPS: usize = 20;

#[derive(Debug)]
struct Body {
    id: usize,
    aabb: Rect,
}

impl Shaped for Body {
    type Shape = Rect;
    fn shape(&self) -> Rect {
        self.aabb
    }
}

fn random_body(rng: &mut impl Rng, id: usize) -> Arc<Body> {
    let w = rng.random_range(2.0..24.0);
    let h = rng.random_range(2.0..24.0);
    let x = rng.random_range(0.0..WORLD - w);
    let y = rng.random_range(0.0..WORLD - h);
    Arc::new(Body {
        id,
        aabb: Rect::from_origin_size((x, y), (w, h)),
    })
}

fn main() -> Result<(), ConfigError> {
    understory_quadtree_demos::init_logging("info,understory_quadtree=warn");

    let config = QuadTreeConfig::default()
        .with_element_limit(12)
        .with_merge_watermark(3)
        .with_max_depth(10);
    let tree: RegionQuadTree<Arc<Body>> =
        RegionQuadTree::with_config(config, Rect::new(0.0, 0.0, WORLD, WORLD))?;
    let pairs = AtomicUsize::new(0);

    thread::scope(|s| {
        for mover in 0..MOVERS {
            let tree = &tree;
            s.spawn(move || {
                let mut rng = rand::rng();
                let base = mover * BODIES_PER_MOVER;
                let mut mine: Vec<_> = (0..BODIES_PER_MOVER)
                    .map(|i| random_body(&mut rng, base + i))
                    .collect();
                tree.add_all(mine.iter().cloned());
                for _ in 0..STEPS {
                    for slot in &mut mine {
                        tree.remove(slot);
                        *slot = random_body(&mut rng, slot.id);
                        tree.add(slot.clone());
                    }
                }
            });
        }
        for _ in 0..SCANNERS {
            let (tree, pairs) = (&tree, &pairs);
            s.spawn(move || {
                let mut candidates = Vec::new();
                for _ in 0..STEPS {
                    for body in tree.elements() {
                        candidates.clear();
                        tree.elements_within_region_into(body.aabb, &mut candidates);
                        let found = candidates.iter().filter(|o| o.id > body.id).count();
                        pairs.fetch_add(found, Ordering::Relaxed);
                    }
                }
            });
        }
    });

    let stats = tree.stats();
    info!(
        bodies = stats.elements,
        quads = stats.leaves,
        depth = tree.depth(),
        subdivisions = stats.subdivisions,
        merges = stats.merges,
        candidate_pairs = pairs.load(Ordering::Relaxed),
        "broad phase finished"
    );
    match tree.check_invariants() {
        Ok(_) => info!("tree invariants hold"),
        Err(err) => tracing::error!(%err, "tree invariants broken"),
    }
    Ok(())
}
