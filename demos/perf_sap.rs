use bonk_sap::*;
use glam::Vec2;

fn lcg(seed: &mut u32) -> u32 {
    *seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
    *seed
}

fn unit(seed: &mut u32) -> f32 {
    lcg(seed) as f32 / u32::MAX as f32
}

/// Bodies spread over a `width` x `height` box.
fn build_world(n: usize, width: f32, height: f32, seed0: u32) -> (World, Vec<Vec2>) {
    let mut world = World::new();
    let mut vels = Vec::with_capacity(n);
    let mut seed = seed0;
    for _ in 0..n {
        let x = unit(&mut seed) * width - width * 0.5;
        let y = unit(&mut seed) * height - height * 0.5;
        let r = 0.25 + unit(&mut seed) * 0.5;
        world
            .add_body(Body { position: Vec2::new(x, y), bounding_radius: r })
            .expect("fresh world has ids left");
        vels.push(Vec2::new(unit(&mut seed) * 2.0 - 1.0, unit(&mut seed) * 2.0 - 1.0));
    }
    (world, vels)
}

fn main() {
    let n_vals = [1_000usize, 5_000, 20_000];
    let axes = [Axis::X, Axis::Y];
    let sorts = [SortStrategy::Full, SortStrategy::Insertion];
    let ticks = 10;
    let dt = 1.0 / 60.0;

    println!("n,axis,sort,avg_total_ms,avg_sort_ms,avg_sweep_ms,bound_tests,exact_tests,pairs");
    for &n in &n_vals {
        for &axis in &axes {
            for &sort in &sorts {
                // Wide along x, narrow along y: the y rows show the cost of a poor axis choice.
                let (mut world, vels) = build_world(n, 400.0, 40.0, 1);
                let mut sap = SapBroadphase::new(SapConfig { axis, sort, enable_timing: true });
                sap.bind(&mut world);

                let mut total = SapTiming::default();
                for _ in 0..ticks {
                    for (id, v) in world.body_ids().into_iter().zip(&vels) {
                        if let Some(p) = world.body(id).map(|b| b.position) {
                            let _ = world.set_position(id, p + *v * dt);
                        }
                    }
                    sap.get_collision_pairs(&world);
                    let t = sap.timing().unwrap_or_default();
                    total.total_ms += t.total_ms;
                    total.sort_ms += t.sort_ms;
                    total.sweep_ms += t.sweep_ms;
                }
                let stats = sap.stats();
                println!(
                    "{},{:?},{:?},{:.3},{:.3},{:.3},{},{},{}",
                    n,
                    axis,
                    sort,
                    total.total_ms / ticks as f64,
                    total.sort_ms / ticks as f64,
                    total.sweep_ms / ticks as f64,
                    stats.bound_tests,
                    stats.exact_tests,
                    stats.candidate_pairs
                );
            }
        }
    }
}
