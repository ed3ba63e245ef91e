//! Night Patrol headless runner
//!
//! Loads settings and a scene, drives a scripted patrol through the fixed
//! timestep loop and logs what happened. Rendering front-ends embed the
//! library directly.
//!
//! Usage: `night-patrol [scene.json] [ticks]`
//!
//! `NIGHT_PATROL_QUALITY=low|medium|high` overrides the settings file preset.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::path::Path;

    use night_patrol::sim::{GameEvent, Scene, TickInput, frame_lights, tick};
    use night_patrol::{QualityPreset, Settings};

    env_logger::init();
    log::info!("Night Patrol (native) starting...");

    let mut settings = Settings::load_or_default(Path::new("settings.json"));
    if let Ok(name) = std::env::var("NIGHT_PATROL_QUALITY") {
        match QualityPreset::parse(&name) {
            Some(preset) => settings.quality = preset,
            None => log::warn!(
                "Unknown quality preset {name:?}, keeping {}",
                settings.quality.as_str()
            ),
        }
    }
    log::info!("Quality preset: {}", settings.quality.as_str());
    let mut args = std::env::args().skip(1);
    let scene = match args.next() {
        Some(path) => match Scene::load(Path::new(&path)) {
            Ok(scene) => scene,
            Err(err) => {
                log::error!("{err}");
                std::process::exit(1);
            }
        },
        None => Scene::demo(),
    };
    let ticks: u64 = args.next().and_then(|t| t.parse().ok()).unwrap_or(600);

    let seed = 0x5eed_u64;
    let mut world = scene.build_world(seed, settings);
    log::info!("World seeded with {seed:#x}, running {ticks} ticks");

    let (mut strikes, mut hard_hits, mut glances, mut contacts) = (0, 0, 0, 0);
    for t in 0..ticks {
        // Lights on, accelerate, weave a little every few seconds
        let input = TickInput {
            throttle: t % 240 < 180,
            brake: t % 240 >= 210,
            steer: if t % 300 < 25 { 1.0 } else { 0.0 },
            toggle_light_bar: t == 30,
            ..Default::default()
        };
        tick(&mut world, &input);

        for event in &world.events {
            match event {
                GameEvent::ObjectStruck { .. } => strikes += 1,
                GameEvent::HardHit { .. } => hard_hits += 1,
                GameEvent::GlancingBlow { .. } => glances += 1,
                GameEvent::VehicleContact { .. } => contacts += 1,
            }
        }
    }

    let aim = world.player().map(|p| p.pos + p.heading() * 300.0);
    let lights = frame_lights(&world, aim);
    let glints: usize = lights.iter().map(|l| l.cone.glint_segments().len()).sum();

    if let Some(player) = world.player() {
        log::info!(
            "Player at ({:.1}, {:.1}) heading {:.2} rad, speed {:.2}",
            player.pos.x,
            player.pos.y,
            player.angle,
            player.speed
        );
    }
    log::info!(
        "{strikes} objects struck, {hard_hits} hard hits, {glances} glancing blows, \
         {contacts} car contacts"
    );
    log::info!(
        "{} debris particles, {} light cones, {} glints in the final frame",
        world.debris.len(),
        lights.len(),
        glints
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Web front-ends drive the library directly
}
