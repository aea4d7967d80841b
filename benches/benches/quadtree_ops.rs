// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Line, Point, Rect};
use understory_quadtree::{PointQuadTree, RegionQuadTree, Shaped};

const WORLD: f64 = 2048.0;

#[derive(Debug)]
struct Body(Rect);

impl Shaped for Body {
    type Shape = Rect;
    fn shape(&self) -> Rect {
        self.0
    }
}

#[derive(Debug)]
struct Particle(Point);

impl Shaped for Particle {
    type Shape = Point;
    fn shape(&self) -> Point {
        self.0
    }
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_bodies(count: usize, size: f64) -> Vec<Arc<Body>> {
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|_| {
            let x0 = rng.next_f64() * (WORLD - size);
            let y0 = rng.next_f64() * (WORLD - size);
            Arc::new(Body(Rect::from_origin_size((x0, y0), (size, size))))
        })
        .collect()
}

fn gen_particles(count: usize) -> Vec<Arc<Particle>> {
    let mut rng = Rng::new(0xBADC_F00D_1234_5678);
    (0..count)
        .map(|_| Arc::new(Particle(Point::new(rng.next_f64() * WORLD, rng.next_f64() * WORLD))))
        .collect()
}

fn filled_regions(bodies: &[Arc<Body>]) -> RegionQuadTree<Arc<Body>> {
    let tree = RegionQuadTree::with_merge_watermark(16, 4, 0.0, 0.0, WORLD, WORLD).unwrap();
    tree.add_all(bodies.iter().cloned());
    tree
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for &n in &[1_000usize, 10_000, 50_000] {
        let bodies = gen_bodies(n, 8.0);
        let particles = gen_particles(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("region_n{}", n), |b| {
            b.iter_batched(
                || RegionQuadTree::new(16, 0.0, 0.0, WORLD, WORLD).unwrap(),
                |tree| {
                    tree.add_all(bodies.iter().cloned());
                    black_box(tree.total_quads())
                },
                BatchSize::LargeInput,
            );
        });
        group.bench_function(format!("point_n{}", n), |b| {
            b.iter_batched(
                || PointQuadTree::new(16, 0.0, 0.0, WORLD, WORLD).unwrap(),
                |tree| {
                    tree.add_all(particles.iter().cloned());
                    black_box(tree.total_quads())
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    let bodies = gen_bodies(20_000, 8.0);
    let tree = filled_regions(&bodies);
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let windows: Vec<Rect> = (0..256)
        .map(|_| {
            let x0 = rng.next_f64() * (WORLD - 64.0);
            let y0 = rng.next_f64() * (WORLD - 64.0);
            Rect::from_origin_size((x0, y0), (64.0, 64.0))
        })
        .collect();
    let rays: Vec<Line> = (0..256)
        .map(|_| {
            Line::new(
                (rng.next_f64() * WORLD, rng.next_f64() * WORLD),
                (rng.next_f64() * WORLD, rng.next_f64() * WORLD),
            )
        })
        .collect();

    group.throughput(Throughput::Elements(windows.len() as u64));
    group.bench_function("region_64x64", |b| {
        let mut buf = Vec::new();
        b.iter(|| {
            let mut hits = 0;
            for w in &windows {
                buf.clear();
                tree.elements_within_region_into(*w, &mut buf);
                hits += buf.len();
            }
            black_box(hits)
        });
    });
    group.bench_function("segment_random", |b| {
        let mut buf = Vec::new();
        b.iter(|| {
            let mut hits = 0;
            for r in &rays {
                buf.clear();
                tree.elements_intersecting_segment_into(*r, &mut buf);
                hits += buf.len();
            }
            black_box(hits)
        });
    });
    group.bench_function("point", |b| {
        b.iter(|| {
            let mut hits = 0;
            for w in &windows {
                hits += tree.elements_containing_point(w.center()).len();
            }
            black_box(hits)
        });
    });
    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("churn");
    let bodies = gen_bodies(10_000, 8.0);
    group.throughput(Throughput::Elements(bodies.len() as u64));
    group.bench_function("remove_all_then_refill", |b| {
        b.iter_batched(
            || filled_regions(&bodies),
            |tree| {
                tree.remove_all(&bodies);
                tree.add_all(bodies.iter().cloned());
                black_box(tree.total_merge_operations())
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_queries, bench_churn);
criterion_main!(benches);
