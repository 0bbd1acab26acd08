//! Headless label demo -- a title and a box mounted under `#app`, the box
//! wandering a little every tick, the title destroyed after five simulated
//! seconds.
//!
//! Run with:
//!   cargo run --example label_demo -p orrery-engine [-- tick_config.json]
//!
//! The optional argument is a JSON `TickConfig`, e.g.
//! `{"fixed_dt": 0.05, "max_ticks": 200}`; without `max_ticks` the demo
//! stops after 600 ticks. Set `RUST_LOG=debug` to watch the
//! entity and node lifecycle.

use anyhow::Context;
use orrery_engine::prelude::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

const LABEL_LIFETIME_SECS: f64 = 5.0;
const DEFAULT_TICKS: u64 = 600;

fn load_config() -> Result<TickConfig, anyhow::Error> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(TickConfig {
            max_ticks: Some(DEFAULT_TICKS),
            ..Default::default()
        });
    };
    let json = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let mut config = TickConfig::from_json(&json)?;
    config.max_ticks.get_or_insert(DEFAULT_TICKS);
    Ok(config)
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    let fixed_dt = config.fixed_dt;

    let mut scene = Scene::new();
    scene.add_mount("#app", "div")?;

    let mut world = World::new();
    let renderer = SceneRenderer::new(&mut world, scene, "#app")?;

    // -- entities -----------------------------------------------------------

    let label = world.create_entity();
    world.add_component(label, Position::new(10.0, 10.0))?;
    world.add_component(label, Renderable::new("h1", "title-class"))?;
    world.add_component(label, Text::new("Hello, orrery!"))?;

    let boxed = world.create_entity();
    world.add_component(boxed, Position::new(150.0, 80.0))?;
    world.add_component(boxed, Renderable::new("div", "box-class"))?;

    // -- systems ------------------------------------------------------------

    let mut rng = Pcg32::seed_from_u64(0x0DDB_A11);
    world.add_named_system("wander", move |world| {
        if let Some(pos) = world.get_component_mut::<Position>(boxed) {
            pos.x = (pos.x + rng.gen_range(-1.0f64..1.0)).clamp(0.0, 300.0);
            pos.y = (pos.y + rng.gen_range(-1.0f64..1.0)).clamp(0.0, 200.0);
        }
    });

    let mut elapsed = 0.0;
    world.add_named_system("label_timer", move |world| {
        elapsed += fixed_dt;
        if elapsed >= LABEL_LIFETIME_SECS && world.is_alive(label) {
            tracing::info!(%label, elapsed, "label expired");
            if let Err(err) = world.destroy_entity(label) {
                tracing::warn!(%err, "could not destroy label");
            }
        }
    });

    renderer.install(&mut world);

    // -- main loop ----------------------------------------------------------

    let mut tick_loop = TickLoop::new(world, config)?;
    tick_loop.tick();
    println!("after first tick:\n  {}", renderer.markup());

    while tick_loop.tick() {}

    let diagnostics = tick_loop.last_diagnostics();
    tracing::info!(
        ticks = tick_loop.tick_count(),
        sim_time = tick_loop.sim_time(),
        entities = diagnostics.entity_count,
        last_tick_us = diagnostics.total_time.as_micros() as u64,
        "simulation finished"
    );
    println!("final scene:\n  {}", renderer.markup());
    Ok(())
}
