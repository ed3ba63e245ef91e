//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. Every vehicle
//! is fully stepped before the tick returns, so light cones built afterwards
//! always see settled positions.

use super::ai::pursue;
use super::debris::update_debris;
use super::physics::step_vehicle;
use super::signals::Side;
use super::state::World;
use super::vehicle::{Controls, Pedal, VehicleKind};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Accelerate forward (W)
    pub throttle: bool,
    /// Brake, then reverse (S)
    pub brake: bool,
    /// -1 (left, A) ..= 1 (right, D)
    pub steer: f32,
    /// Boost (Shift)
    pub boost: bool,
    /// Headlights on/off (H)
    pub toggle_headlights: bool,
    /// Narrow/wide beams (B)
    pub toggle_brights: bool,
    /// Light bar and siren (L)
    pub toggle_light_bar: bool,
}

impl TickInput {
    /// Player controls for this tick
    pub fn controls(&self) -> Controls {
        let pedal = match (self.throttle, self.brake) {
            (true, false) => Pedal::Throttle,
            (false, true) => Pedal::Brake,
            _ => Pedal::Coast,
        };
        Controls {
            pedal,
            steer: self.steer.clamp(-1.0, 1.0),
            boost: self.boost,
        }
    }

    fn steer_side(&self) -> Option<Side> {
        if self.steer < 0.0 {
            Some(Side::Left)
        } else if self.steer > 0.0 {
            Some(Side::Right)
        } else {
            None
        }
    }
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, input: &TickInput) {
    world.events.clear();
    let now = world.time_ticks;

    if input.toggle_headlights {
        world.headlights_on = !world.headlights_on;
    }
    if input.toggle_brights {
        world.brights_on = !world.brights_on;
    }
    if let Some(player) = world.vehicles.get_mut(World::PLAYER.0) {
        if input.toggle_light_bar {
            let on = !player.siren.is_on();
            player.siren.set(on);
            log::info!("Light bar {}", if on { "on" } else { "off" });
        }
        player.signals.update(input.steer_side(), now);
    }

    // Followers mirror their target's siren
    for i in 0..world.vehicles.len() {
        let car = &world.vehicles[i];
        if car.kind != VehicleKind::Police {
            continue;
        }
        let Some(target) = car.follow.and_then(|id| world.vehicle(id)) else {
            continue;
        };
        let target_on = target.siren.is_on();
        world.vehicles[i].siren.follow(target_on, now, &mut world.rng);
    }

    for i in 0..world.vehicles.len() {
        let (controls, lane_assist) = if i == World::PLAYER.0 {
            (input.controls(), world.settings.player_lane_assist)
        } else {
            let target = world.vehicles[i]
                .follow
                .and_then(|id| world.vehicle(id))
                .map(|v| v.pos);
            let controls = match target {
                Some(pos) => pursue(&mut world.vehicles[i], pos),
                None => Controls::default(),
            };
            (controls, true)
        };
        step_vehicle(world, i, &controls, lane_assist);
    }

    update_debris(&mut world.debris);

    if let Some(pos) = world.player().map(|p| p.pos) {
        world.camera.center_on(pos);
    }
    world.time_ticks += 1;
}
