use bonk_sap::*;
use glam::Vec2;

fn print_pairs(label: &str, sap: &mut SapBroadphase, world: &World) {
    let pairs: Vec<_> = iter_pairs(sap.get_collision_pairs(world)).collect();
    let stats = sap.stats();
    println!(
        "{label}: pairs={:?} (bound_tests={} exact_tests={})",
        pairs, stats.bound_tests, stats.exact_tests
    );
}

fn main() -> Result<()> {
    env_logger::init();

    let mut world = World::new();
    let a = world.add_circle(Vec2::new(0.0, 0.0), 1.0)?;
    let b = world.add_circle(Vec2::new(1.5, 0.0), 1.0)?;
    let c = world.add_circle(Vec2::new(5.0, 0.0), 1.0)?;
    println!("Inserted a={:?} b={:?} c={:?}", a, b, c);

    let axis = Axis::widest_spread(world.bodies().map(|(_, body)| body));
    let mut sap = SapBroadphase::new(SapConfig {
        axis,
        enable_timing: true,
        ..Default::default()
    });
    sap.bind(&mut world);
    print_pairs("initial", &mut sap, &world);

    // c drifts towards b; the next query picks it up without rebinding.
    world.set_position(c, Vec2::new(3.0, 0.0))?;
    print_pairs("after move", &mut sap, &world);

    let d = world.add_circle(Vec2::new(-1.0, 0.5), 0.75)?;
    println!("Added d={:?}", d);
    print_pairs("after add", &mut sap, &world);

    world.remove_body(b);
    println!("Removed b={:?}", b);
    print_pairs("after remove", &mut sap, &world);

    if let Some(t) = sap.timing() {
        println!(
            "timing: total={:.3}ms (sort={:.3}ms sweep={:.3}ms)",
            t.total_ms, t.sort_ms, t.sweep_ms
        );
    }
    Ok(())
}
