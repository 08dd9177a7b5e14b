use bonk_sap::*;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use glam::Vec2;
use std::hint::black_box;

fn prepare_world(body_count: usize) -> World {
    let mut world = World::new();
    let side = (body_count as f32).sqrt().ceil() as usize;
    for i in 0..body_count {
        let x = (i % side) as f32 * 1.5;
        let y = (i / side) as f32 * 1.5;
        world
            .add_body(Body { position: Vec2::new(x, y), bounding_radius: 1.0 })
            .expect("fresh world has ids left");
    }
    world
}

fn bench_collision_pairs(c: &mut Criterion) {
    let mut group = c.benchmark_group("sap_collision_pairs");
    for &count in &[128usize, 1024, 8192] {
        for (name, sort) in [("full", SortStrategy::Full), ("insertion", SortStrategy::Insertion)] {
            group.bench_with_input(BenchmarkId::new(name, count), &count, |b, &count| {
                let mut world = prepare_world(count);
                let mut sap = SapBroadphase::new(SapConfig { sort, ..Default::default() });
                sap.bind(&mut world);
                b.iter(|| black_box(sap.get_collision_pairs(&world).len()));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_collision_pairs);
criterion_main!(benches);
