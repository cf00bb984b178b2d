// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect, Vec2};
use understory_dynamic_tree::{
    BroadPhase, DynamicTree, ProxyId, QueryControl, RayCastControl, RayCastInput,
};

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

fn gen_grid_rects(n: usize, cell: f64) -> Vec<Rect> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * cell;
            let y0 = y as f64 * cell;
            out.push(Rect::new(x0, y0, x0 + cell * 0.8, y0 + cell * 0.8));
        }
    }
    out
}

fn gen_random_rects(count: usize, world: f64, size: f64, seed: u64) -> Vec<Rect> {
    let mut rng = Rng::new(seed);
    (0..count)
        .map(|_| {
            let x0 = rng.next_f64() * (world - size);
            let y0 = rng.next_f64() * (world - size);
            Rect::new(x0, y0, x0 + size, y0 + size)
        })
        .collect()
}

fn build(rects: &[Rect]) -> (DynamicTree<u32>, Vec<ProxyId>) {
    let mut tree = DynamicTree::new();
    let ids = rects
        .iter()
        .zip(0_u32..)
        .map(|(r, i)| tree.create_proxy(*r, i))
        .collect();
    (tree, ids)
}

fn bench_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("create");
    for &n in &[32usize, 64, 128] {
        let rects = gen_grid_rects(n, 10.0);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("grid_n{}", n), |b| {
            b.iter(|| black_box(build(&rects).0.height()));
        });
    }
    let rects = gen_random_rects(10_000, 2000.0, 12.0, 0xCAFE_F00D_DEAD_BEEF);
    group.throughput(Throughput::Elements(rects.len() as u64));
    group.bench_function("random_10k", |b| {
        b.iter(|| black_box(build(&rects).0.height()));
    });
    group.finish();
}

fn bench_move(c: &mut Criterion) {
    let mut group = c.benchmark_group("move");
    let rects = gen_random_rects(4096, 2000.0, 12.0, 0xBADC_F00D_1234_5678);
    group.throughput(Throughput::Elements(rects.len() as u64));
    for &(name, step) in &[("jitter", 0.02), ("drift", 1.0), ("teleport", 400.0)] {
        group.bench_function(name, |b| {
            b.iter_batched(
                || (build(&rects), Rng::new(0xFACE_FEED_CAFE_BABE)),
                |((mut tree, ids), mut rng)| {
                    let mut reinserted = 0;
                    for (id, r) in ids.iter().zip(&rects) {
                        let d = Vec2::new(
                            (rng.next_f64() - 0.5) * step,
                            (rng.next_f64() - 0.5) * step,
                        );
                        if tree.move_proxy(*id, *r + d, d) {
                            reinserted += 1;
                        }
                    }
                    black_box(reinserted);
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    let rects = gen_random_rects(10_000, 2000.0, 12.0, 0xC1A5_7E55_9999_ABCD);
    let (tree, _) = build(&rects);
    let mut rng = Rng::new(0x1234_5678_9ABC_DEF0);
    let probes: Vec<Rect> = (0..256)
        .map(|_| {
            let x = rng.next_f64() * 1900.0;
            let y = rng.next_f64() * 1900.0;
            Rect::new(x, y, x + 100.0, y + 100.0)
        })
        .collect();
    group.throughput(Throughput::Elements(probes.len() as u64));
    group.bench_function("rect_100", |b| {
        b.iter(|| {
            let mut hits = 0_usize;
            for p in &probes {
                tree.query(*p, |_| {
                    hits += 1;
                    QueryControl::Continue
                });
            }
            black_box(hits);
        });
    });
    group.bench_function("point", |b| {
        b.iter(|| {
            let mut hits = 0_usize;
            for p in &probes {
                tree.query_point(p.center(), |_| {
                    hits += 1;
                    QueryControl::Continue
                });
            }
            black_box(hits);
        });
    });
    group.finish();
}

fn bench_ray_cast(c: &mut Criterion) {
    let mut group = c.benchmark_group("ray_cast");
    let rects = gen_random_rects(10_000, 2000.0, 12.0, 0xDEAD_BEEF_0BAD_F00D);
    let (tree, _) = build(&rects);
    let mut rng = Rng::new(0x0F0F_1E1E_2D2D_3C3C);
    let rays: Vec<RayCastInput> = (0..256)
        .map(|_| {
            let p1 = Point::new(rng.next_f64() * 2000.0, rng.next_f64() * 2000.0);
            let p2 = Point::new(rng.next_f64() * 2000.0, rng.next_f64() * 2000.0);
            RayCastInput::new(p1, p2)
        })
        .collect();
    group.throughput(Throughput::Elements(rays.len() as u64));
    group.bench_function("all_hits", |b| {
        b.iter(|| {
            let mut hits = 0_usize;
            for r in &rays {
                tree.ray_cast(r, |_, _| {
                    hits += 1;
                    RayCastControl::Continue
                });
            }
            black_box(hits);
        });
    });
    group.bench_function("closest_hit", |b| {
        b.iter(|| {
            let mut hits = 0_usize;
            for r in &rays {
                tree.ray_cast(r, |sub, _| {
                    hits += 1;
                    RayCastControl::Tighten(sub.max_fraction * 0.5)
                });
            }
            black_box(hits);
        });
    });
    group.finish();
}

fn bench_update_pairs(c: &mut Criterion) {
    let mut group = c.benchmark_group("broad_phase");
    let rects = gen_random_rects(4096, 1000.0, 12.0, 0xABCD_EF01_2345_6789);
    group.throughput(Throughput::Elements(rects.len() as u64));
    group.bench_function("step_4k", |b| {
        b.iter_batched(
            || {
                let mut bp = BroadPhase::new();
                let ids: Vec<_> = rects
                    .iter()
                    .zip(0_u32..)
                    .map(|(r, i)| bp.create_proxy(*r, i))
                    .collect();
                bp.update_pairs(|_, _| {});
                (bp, ids, Rng::new(0x5EED_5EED_5EED_5EED))
            },
            |(mut bp, ids, mut rng)| {
                for (id, r) in ids.iter().zip(&rects) {
                    let d = Vec2::new(rng.next_f64() - 0.5, rng.next_f64() - 0.5);
                    let _ = bp.move_proxy(*id, *r + d, d);
                }
                let mut pairs = 0_usize;
                bp.update_pairs(|_, _| pairs += 1);
                black_box(pairs);
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_create,
    bench_move,
    bench_query,
    bench_ray_cast,
    bench_update_pairs
);
criterion_main!(benches);
