//! Vehicle entity and per-tick kinematics
//!
//! Speed is a scalar along the heading; collisions add a separate slide
//! velocity that decays on its own. The collision response pipeline in
//! `physics` drives these methods in a fixed order.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::road_network::LaneDwell;
use super::signals::{LightBar, Siren, TurnSignals};
use crate::consts::*;
use crate::{heading_vector, left_normal, normalize_angle};

/// Stable index of a vehicle in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleKind {
    Police,
    Civilian,
}

/// Longitudinal input for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pedal {
    #[default]
    Coast,
    Throttle,
    /// Brake, then reverse
    Brake,
    /// Brake down to zero without reversing
    BrakeToStop,
}

/// Driver or AI controls for one tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Controls {
    pub pedal: Pedal,
    /// -1 (left) ..= 1 (right); 0 means not steering
    pub steer: f32,
    pub boost: bool,
}

impl Controls {
    pub fn is_steering(&self) -> bool {
        self.steer != 0.0
    }
}

/// A car in the world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub kind: VehicleKind,
    /// Packed 0xRRGGBB body color
    pub color: u32,
    /// Center position
    pub pos: Vec2,
    /// Heading in radians, 0 = +x
    pub angle: f32,
    /// Lateral size
    pub width: f32,
    /// Length along the heading
    pub height: f32,
    pub speed: f32,
    /// Slide velocity from collisions
    pub slide: Vec2,
    pub max_speed: f32,
    pub acceleration: f32,
    pub friction: f32,
    pub turn_rate: f32,
    pub prev_pos: Vec2,
    pub prev_speed: f32,
    /// Consecutive ticks of steering input
    pub steer_hold: u32,
    pub follow: Option<VehicleId>,
    pub lane_dwell: LaneDwell,
    pub signals: TurnSignals,
    pub siren: Siren,
    pub light_bar: LightBar,
    /// Tick of the last spark burst this car caused
    pub last_spark_tick: Option<u64>,
}

impl Vehicle {
    /// Police interceptor
    pub fn police(id: VehicleId, pos: Vec2) -> Self {
        Self {
            id,
            kind: VehicleKind::Police,
            color: 0xffffff,
            pos,
            angle: 0.0,
            width: 30.0,
            height: 80.0,
            speed: 0.0,
            slide: Vec2::ZERO,
            max_speed: 5.0,
            acceleration: 0.3,
            friction: 0.98,
            turn_rate: 0.05,
            prev_pos: pos,
            prev_speed: 0.0,
            steer_hold: 0,
            follow: None,
            lane_dwell: LaneDwell::default(),
            signals: TurnSignals::default(),
            siren: Siren::default(),
            light_bar: LightBar::default(),
            last_spark_tick: None,
        }
    }

    /// Civilian sedan: same body, more drag
    pub fn civilian(id: VehicleId, pos: Vec2, color: u32) -> Self {
        Self {
            kind: VehicleKind::Civilian,
            color,
            friction: 0.95,
            ..Self::police(id, pos)
        }
    }

    pub fn with_follow(mut self, target: VehicleId) -> Self {
        self.follow = Some(target);
        self
    }

    pub fn heading(&self) -> Vec2 {
        heading_vector(self.angle)
    }

    /// Total velocity: heading speed plus slide
    pub fn velocity(&self) -> Vec2 {
        self.heading() * self.speed + self.slide
    }

    /// Step 1: remember where this tick started
    pub fn begin_tick(&mut self) {
        self.prev_pos = self.pos;
        self.prev_speed = self.speed;
    }

    /// Step 2: pedal (friction only while coasting), then clamp and snap
    pub fn apply_pedal(&mut self, pedal: Pedal, boost: bool) {
        match pedal {
            Pedal::Coast => self.speed *= self.friction,
            Pedal::Throttle => {
                let gain = if boost { BOOST_MULTIPLIER } else { 1.0 };
                self.speed += self.acceleration * gain;
            }
            Pedal::Brake => self.speed -= self.acceleration,
            Pedal::BrakeToStop => {
                if self.speed > 0.0 {
                    self.speed = (self.speed - self.acceleration).max(0.0);
                } else {
                    self.speed = (self.speed + self.acceleration).min(0.0);
                }
            }
        }

        self.speed = self.speed.clamp(self.min_speed(), self.speed_cap(boost));
        if self.speed.abs() < SPEED_EPSILON {
            self.speed = 0.0;
        }
    }

    pub fn min_speed(&self) -> f32 {
        -self.max_speed / 2.0
    }

    pub fn speed_cap(&self, boost: bool) -> f32 {
        if boost {
            self.max_speed * BOOST_MULTIPLIER
        } else {
            self.max_speed
        }
    }

    /// Step 3: speed-scaled steering with a short dampening window
    pub fn apply_steering(&mut self, steer: f32) {
        if steer == 0.0 {
            self.steer_hold = 0;
            return;
        }
        self.steer_hold = self.steer_hold.saturating_add(1);

        let speed_ratio = self.speed.abs() / self.max_speed;
        let direction = if self.speed < 0.0 { -1.0 } else { 1.0 };
        let dampening =
            if speed_ratio > STEER_DAMPEN_SPEED_RATIO && self.steer_hold < STEER_DAMPEN_TICKS {
                STEER_DAMPEN_FACTOR
            } else {
                1.0
            };
        self.angle += self.turn_rate * speed_ratio * direction * dampening * steer.clamp(-1.0, 1.0);
    }

    /// Step 4: move along the heading and by the slide velocity
    pub fn integrate(&mut self) {
        self.pos += self.velocity();
    }

    /// Turn toward `target` by a fraction of the wrapped difference
    pub fn blend_heading(&mut self, target: f32, gain: f32) {
        self.angle += normalize_angle(target - self.angle) * gain;
    }

    /// Step 6: exponential slide decay with snap
    pub fn decay_slide(&mut self) {
        self.slide *= SLIDE_DECAY;
        if self.slide.x.abs() < SLIDE_EPSILON {
            self.slide.x = 0.0;
        }
        if self.slide.y.abs() < SLIDE_EPSILON {
            self.slide.y = 0.0;
        }
    }

    /// Undo this tick's movement and stop dead
    pub fn revert_and_stop(&mut self) {
        self.pos = self.prev_pos;
        self.speed = 0.0;
        self.slide = Vec2::ZERO;
    }

    /// Corners of the raw body, front-left first, counter-clockwise
    pub fn silhouette(&self) -> [Vec2; 4] {
        oriented_corners(self.pos, self.angle, self.width, self.height)
    }

    /// Corners of the buffered collision box
    pub fn collision_corners(&self) -> [Vec2; 4] {
        self.collision_corners_at(self.pos)
    }

    /// Buffered collision box as if the car stood at `pos`
    pub fn collision_corners_at(&self, pos: Vec2) -> [Vec2; 4] {
        oriented_corners(
            pos,
            self.angle,
            self.width + COLLISION_WIDTH_BUFFER,
            self.height + COLLISION_HEIGHT_BUFFER,
        )
    }

    /// Brake lights: slowing down while moving forward
    pub fn is_braking(&self) -> bool {
        self.speed > 0.1 && self.prev_speed - self.speed > 0.01
    }

    /// Reverse lights
    pub fn is_reversing(&self) -> bool {
        self.speed < -0.1
    }
}

/// Corners of a rectangle of `width` (lateral) by `height` (along heading)
pub fn oriented_corners(center: Vec2, angle: f32, width: f32, height: f32) -> [Vec2; 4] {
    let forward = heading_vector(angle) * (height / 2.0);
    let left = left_normal(angle) * (width / 2.0);
    [
        center + forward + left,
        center - forward + left,
        center - forward - left,
        center + forward - left,
    ]
}
