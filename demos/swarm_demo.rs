//! Swarm demonstration: a horde closing in on a pair of survivors.
//!
//! Run with: cargo run --example swarm_demo
//! Set RUST_LOG=swarm_sim=debug to see every tick.

use glam::Vec3;
use swarm_sim::{AttractionMode, EcsStore, Entity, Obstacle, SwarmController};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    println!("=== Swarm Demo ===\n");

    let mut store = EcsStore::with_cell_size(3.0);
    let agents = store.spawn_mass_agents(Vec3::ZERO, 150, 40.0);
    let survivors = vec![
        store.spawn_target(Vec3::new(60.0, 0.0, 10.0)),
        store.spawn_target(Vec3::new(55.0, 0.0, -15.0)),
    ];
    let obstacles = [
        Obstacle::new(Vec3::new(30.0, 0.0, 0.0), 4.0),
        Obstacle::new(Vec3::new(40.0, 0.0, 20.0), 3.0),
    ];

    let mut swarm = SwarmController::new(store);
    swarm.set_attraction_mode(AttractionMode::NearestOnly);

    let dt = 1.0 / 30.0;
    println!("Running 600 ticks (20 seconds at 30 ticks/sec)...\n");
    for step in 0..600 {
        let report = swarm.update(dt, &agents, &survivors, &obstacles);
        swarm.store_mut().advance_positions(dt);

        // One survivor goes down halfway through
        if step == 300 {
            println!("--- Survivor lost ---\n");
            swarm.store_mut().set_active(survivors[1], false);
        }

        if (step + 1) % 100 == 0 {
            println!(
                "--- Tick {} (t={:.1}s) tactic={} agents={} targets={} ---",
                report.tick,
                swarm.current_time(),
                report.tactic.map_or("none", |t| t.name()),
                report.census.active_agents,
                report.census.active_targets,
            );
            print_summary(&swarm, &agents);
        }
    }

    println!("\n=== Forcing ambush ===\n");
    if let Err(err) = swarm.force_tactic_named("ambush") {
        eprintln!("{err}");
    }
    for _ in 0..30 {
        swarm.update(dt, &agents, &survivors, &obstacles);
        swarm.store_mut().advance_positions(dt);
    }
    print_summary(&swarm, &agents);

    println!("\n=== Final State (JSON, first 3 agents) ===\n");
    match swarm.snapshot(&agents[..3]).to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("failed to serialize snapshot: {err}"),
    }
}

fn print_summary(swarm: &SwarmController<EcsStore>, agents: &[Entity]) {
    let snapshot = swarm.snapshot(agents);
    let count = snapshot.agents.len().max(1) as f32;
    let centroid = snapshot
        .agents
        .iter()
        .fold(Vec3::ZERO, |acc, a| acc + Vec3::new(a.x, a.y, a.z))
        / count;
    let mean_speed = snapshot
        .agents
        .iter()
        .map(|a| Vec3::new(a.vx, a.vy, a.vz).length())
        .sum::<f32>()
        / count;

    println!(
        "  centroid=({:.1}, {:.1}) mean speed={:.2}",
        centroid.x, centroid.z, mean_speed
    );
}
