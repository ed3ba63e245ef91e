//! Debris particles from object strikes and collision sparks
//!
//! Pure integration: particles never collide with anything.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::ContainerShape;
use crate::consts::*;
use crate::polar_to_cartesian;

/// Visual finish of a scene's interactive objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finish {
    #[default]
    Pristine,
    /// Burnt-out objects in the rough-neighbourhood preset
    Scorched,
}

const IMPACT_PALETTE: &[u32] = &[0xff8c00, 0xffd700, 0x1a1a1a];
const SPARK_PALETTE: &[u32] = &[0xffcc00, 0xff8800, 0xfff4c0];

const MAILBOX_PRISTINE: &[u32] = &[0xffffff, 0xff6b6b, 0x4ecdc4, 0xffe66d];
const MAILBOX_SCORCHED: &[u32] = &[0x3a3a3a, 0x5c4033, 0x2b2b2b, 0x7a2e1f];
const TRASHCAN_PRISTINE: &[u32] = &[0x8b4513, 0xa0522d, 0xcd853f, 0xdaa520, 0xb8860b];
const TRASHCAN_SCORCHED: &[u32] = &[0x1c1c1c, 0x3b2f2f, 0x4a3c31, 0x2f2f2f, 0x5a4a3a];

/// A single debris particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debris {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub color: u32,
    pub rotation: f32,
    pub spin: f32,
    /// Remaining ticks; `None` persists forever
    pub lifetime: Option<u32>,
    pub glow: bool,
    /// Set on the thrown remnant of a knocked-over container
    pub container: Option<ContainerShape>,
}

impl Debris {
    /// Advance one tick; returns false once the particle has expired
    pub fn update(&mut self) -> bool {
        self.pos += self.vel;
        self.vel *= DEBRIS_VELOCITY_DECAY;
        self.rotation += self.spin;
        self.spin *= DEBRIS_SPIN_DECAY;
        match self.lifetime.as_mut() {
            Some(ticks) => {
                *ticks = ticks.saturating_sub(1);
                *ticks > 0
            }
            None => true,
        }
    }
}

fn pick<R: Rng>(rng: &mut R, palette: &[u32]) -> u32 {
    palette[rng.random_range(0..palette.len())]
}

/// Burst of particles flung around `angle`
struct BurstSpec<'a> {
    count: usize,
    palette: &'a [u32],
    angle_spread: f32,
    base_speed: f32,
    speed_jitter: f32,
    size: (f32, f32),
    spin: f32,
    lifetime: Option<u32>,
    glow: bool,
}

fn burst<R: Rng>(rng: &mut R, at: Vec2, angle: f32, spec: &BurstSpec<'_>) -> Vec<Debris> {
    (0..spec.count)
        .map(|_| {
            let dir = angle + (rng.random::<f32>() - 0.5) * spec.angle_spread;
            let speed = spec.base_speed + rng.random::<f32>() * spec.speed_jitter;
            Debris {
                pos: at,
                vel: polar_to_cartesian(speed, dir),
                size: spec.size.0 + rng.random::<f32>() * (spec.size.1 - spec.size.0),
                color: pick(rng, spec.palette),
                rotation: rng.random::<f32>() * TAU,
                spin: (rng.random::<f32>() - 0.5) * spec.spin,
                lifetime: spec.lifetime,
                glow: spec.glow,
                container: None,
            }
        })
        .collect()
}

/// Small short-lived burst that accompanies every object strike
pub fn impact_burst<R: Rng>(rng: &mut R, at: Vec2, angle: f32, car_speed: f32) -> Vec<Debris> {
    burst(
        rng,
        at,
        angle,
        &BurstSpec {
            count: 5,
            palette: IMPACT_PALETTE,
            angle_spread: 2.0,
            base_speed: car_speed * 0.4,
            speed_jitter: 1.0,
            size: (2.0, 4.0),
            spin: 0.4,
            lifetime: Some(SPARK_LIFETIME),
            glow: true,
        },
    )
}

/// Glowing sparks scattered in every direction
pub fn spark_burst<R: Rng>(rng: &mut R, at: Vec2, intensity: f32) -> Vec<Debris> {
    burst(
        rng,
        at,
        0.0,
        &BurstSpec {
            count: 6,
            palette: SPARK_PALETTE,
            angle_spread: TAU,
            base_speed: 0.5 + intensity * 0.3,
            speed_jitter: 1.5,
            size: (1.5, 3.0),
            spin: 0.3,
            lifetime: Some(SPARK_LIFETIME),
            glow: true,
        },
    )
}

pub fn mailbox_burst<R: Rng>(
    rng: &mut R,
    at: Vec2,
    angle: f32,
    car_speed: f32,
    finish: Finish,
) -> Vec<Debris> {
    let palette = match finish {
        Finish::Pristine => MAILBOX_PRISTINE,
        Finish::Scorched => MAILBOX_SCORCHED,
    };
    burst(
        rng,
        at,
        angle,
        &BurstSpec {
            count: 8,
            palette,
            angle_spread: 1.5,
            base_speed: car_speed * 0.5,
            speed_jitter: 0.5,
            size: (4.0, 8.0),
            spin: 0.3,
            lifetime: None,
            glow: false,
        },
    )
}

/// Trash plus the can itself, thrown along the strike direction
pub fn trashcan_burst<R: Rng>(
    rng: &mut R,
    at: Vec2,
    angle: f32,
    car_speed: f32,
    finish: Finish,
    can_color: u32,
    shape: ContainerShape,
) -> Vec<Debris> {
    let palette = match finish {
        Finish::Pristine => TRASHCAN_PRISTINE,
        Finish::Scorched => TRASHCAN_SCORCHED,
    };
    let mut particles = burst(
        rng,
        at,
        angle,
        &BurstSpec {
            count: 12,
            palette,
            angle_spread: 2.0,
            base_speed: car_speed * 0.6,
            speed_jitter: 0.8,
            size: (3.0, 8.0),
            spin: 0.4,
            lifetime: None,
            glow: false,
        },
    );
    particles.push(Debris {
        pos: at,
        vel: polar_to_cartesian(car_speed * 0.8, angle),
        size: 18.0,
        color: can_color,
        rotation: 0.0,
        spin: (rng.random::<f32>() - 0.5) * 0.2,
        lifetime: None,
        glow: false,
        container: Some(shape),
    });
    particles
}

/// Advance every particle and drop the expired ones
pub fn update_debris(debris: &mut Vec<Debris>) {
    debris.retain_mut(Debris::update);
}

/// Drop the oldest particles beyond `max`
pub fn cap_debris(debris: &mut Vec<Debris>, max: usize) {
    if debris.len() > max {
        let excess = debris.len() - max;
        debris.drain(..excess);
    }
}
