//! World state and core scene types
//!
//! One owned `World` holds everything the tick mutates. Collaborators get
//! it passed in explicitly; there is no ambient scene state.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::debris::{Debris, Finish};
use super::road_network::RoadNetwork;
use super::vehicle::{Vehicle, VehicleId};
use crate::consts::*;
use crate::settings::Settings;

/// Static axis-aligned building or wall
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Obstacle {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Vec2 {
        (self.min() + self.max()) * 0.5
    }

    /// Inclusive containment
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    /// Corners in winding order
    pub fn corners(&self) -> [Vec2; 4] {
        let (min, max) = (self.min(), self.max());
        [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Mailbox,
    Trashcan,
}

/// Shape drawn for a container and its thrown remnant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerShape {
    #[default]
    Round,
    Square,
}

/// Knock-over-able street furniture
///
/// Struck objects stay in the list with `hit` set; use [`present`] to
/// iterate only the ones still standing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractiveObject {
    pub kind: ObjectKind,
    pub pos: Vec2,
    pub color: u32,
    #[serde(default)]
    pub shape: ContainerShape,
    /// Mailbox footprint rotation
    #[serde(default)]
    pub angle: f32,
    #[serde(default)]
    pub hit: bool,
}

impl InteractiveObject {
    pub fn new(kind: ObjectKind, pos: Vec2, color: u32, shape: ContainerShape) -> Self {
        Self {
            kind,
            pos,
            color,
            shape,
            angle: 0.0,
            hit: false,
        }
    }

    /// Footprint polygon used for strike tests and light blocking
    pub fn footprint(&self) -> [Vec2; 4] {
        match self.kind {
            ObjectKind::Mailbox => {
                let (sin, cos) = self.angle.sin_cos();
                let rotate =
                    |v: Vec2| self.pos + Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos);
                [
                    rotate(Vec2::new(-MAILBOX_HALF_WIDTH, MAILBOX_TOP)),
                    rotate(Vec2::new(MAILBOX_HALF_WIDTH, MAILBOX_TOP)),
                    rotate(Vec2::new(MAILBOX_HALF_WIDTH, MAILBOX_BOTTOM)),
                    rotate(Vec2::new(-MAILBOX_HALF_WIDTH, MAILBOX_BOTTOM)),
                ]
            }
            ObjectKind::Trashcan => {
                let r = TRASHCAN_RADIUS;
                [
                    self.pos + Vec2::new(-r, -r),
                    self.pos + Vec2::new(r, -r),
                    self.pos + Vec2::new(r, r),
                    self.pos + Vec2::new(-r, r),
                ]
            }
        }
    }
}

/// Objects that have not been struck, with their indices
pub fn present(objects: &[InteractiveObject]) -> impl Iterator<Item = (usize, &InteractiveObject)> {
    objects.iter().enumerate().filter(|(_, o)| !o.hit)
}

/// Street lamp; light comes from the top of the pole
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Streetlight {
    pub pos: Vec2,
    pub pole_height: f32,
}

impl Streetlight {
    pub fn lamp(&self) -> Vec2 {
        self.pos - Vec2::new(0.0, self.pole_height)
    }
}

/// Visible world rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            origin: Vec2::new(-640.0, -360.0),
            size: Vec2::new(1280.0, 720.0),
        }
    }
}

impl Camera {
    pub fn center_on(&mut self, target: Vec2) {
        self.origin = target - self.size * 0.5;
    }

    /// Whether a point lies within `margin` of the visible area
    pub fn near(&self, p: Vec2, margin: f32) -> bool {
        let min = self.origin - Vec2::splat(margin);
        let max = self.origin + self.size + Vec2::splat(margin);
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
    }
}

/// Gameplay events emitted during a tick (for audio/effects)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ObjectStruck {
        vehicle: VehicleId,
        object: usize,
        kind: ObjectKind,
    },
    HardHit {
        vehicle: VehicleId,
        obstacle: usize,
    },
    GlancingBlow {
        vehicle: VehicleId,
        obstacle: usize,
    },
    VehicleContact {
        a: VehicleId,
        b: VehicleId,
    },
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct World {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub settings: Settings,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Index 0 is the player
    pub vehicles: Vec<Vehicle>,
    pub obstacles: Vec<Obstacle>,
    pub objects: Vec<InteractiveObject>,
    pub streetlights: Vec<Streetlight>,
    pub roads: RoadNetwork,
    pub debris: Vec<Debris>,
    pub finish: Finish,
    pub camera: Camera,
    pub headlights_on: bool,
    pub brights_on: bool,
    /// Events from the most recent tick
    pub events: Vec<GameEvent>,
}

impl World {
    /// Empty world with the given seed
    pub fn new(seed: u64, settings: Settings) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            brights_on: settings.wide_headlights,
            settings,
            time_ticks: 0,
            vehicles: Vec::new(),
            obstacles: Vec::new(),
            objects: Vec::new(),
            streetlights: Vec::new(),
            roads: RoadNetwork::new(),
            debris: Vec::new(),
            finish: Finish::default(),
            camera: Camera::default(),
            headlights_on: true,
            events: Vec::new(),
        }
    }

    pub const PLAYER: VehicleId = VehicleId(0);

    pub fn player(&self) -> Option<&Vehicle> {
        self.vehicles.get(Self::PLAYER.0)
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id.0)
    }

    /// Append a vehicle, assigning its id
    pub fn spawn_vehicle(&mut self, mut vehicle: Vehicle) -> VehicleId {
        let id = VehicleId(self.vehicles.len());
        vehicle.id = id;
        self.vehicles.push(vehicle);
        id
    }

    /// Push debris, respecting the settings cap
    pub fn add_debris(&mut self, particles: Vec<Debris>) {
        let max = self.settings.max_debris();
        if max == 0 {
            return;
        }
        self.debris.extend(particles);
        super::debris::cap_debris(&mut self.debris, max);
    }

    pub fn headlight_spread(&self) -> f32 {
        if self.brights_on {
            HEADLIGHT_SPREAD_WIDE
        } else {
            HEADLIGHT_SPREAD_NARROW
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_skips_struck() {
        let mut objects = vec![
            InteractiveObject::new(
                ObjectKind::Mailbox,
                Vec2::ZERO,
                0x2255aa,
                ContainerShape::Square,
            ),
            InteractiveObject::new(
                ObjectKind::Trashcan,
                Vec2::ONE,
                0x444444,
                ContainerShape::Round,
            ),
        ];
        objects[0].hit = true;
        let ids: Vec<usize> = present(&objects).map(|(i, _)| i).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_mailbox_footprint() {
        let mailbox = InteractiveObject::new(
            ObjectKind::Mailbox,
            Vec2::new(100.0, 50.0),
            0,
            ContainerShape::Square,
        );
        let f = mailbox.footprint();
        assert_eq!(f[0], Vec2::new(96.0, 40.0));
        assert_eq!(f[2], Vec2::new(104.0, 52.0));
    }

    #[test]
    fn test_camera_near() {
        let mut camera = Camera::default();
        camera.center_on(Vec2::new(1000.0, 0.0));
        assert_eq!(camera.origin, Vec2::new(360.0, -360.0));
        assert!(camera.near(Vec2::new(1000.0, 0.0), 0.0));
        assert!(camera.near(Vec2::new(-200.0, 0.0), 600.0));
        assert!(!camera.near(Vec2::new(-300.0, 0.0), 600.0));
    }

    #[test]
    fn test_debris_cap_from_settings() {
        let mut world = World::new(1, Settings { debris: false, ..Settings::default() });
        let mut rng = Pcg32::seed_from_u64(1);
        world.add_debris(super::super::debris::spark_burst(&mut rng, Vec2::ZERO, 1.0));
        assert!(world.debris.is_empty());
    }

    #[test]
    fn test_spawn_assigns_ids() {
        let mut world = World::new(1, Settings::default());
        let a = world.spawn_vehicle(Vehicle::police(VehicleId(99), Vec2::ZERO));
        let b = world.spawn_vehicle(Vehicle::civilian(VehicleId(99), Vec2::ONE, 0x1a4d8f));
        assert_eq!(a, World::PLAYER);
        assert_eq!(b, VehicleId(1));
        assert_eq!(world.vehicle(b).map(|v| v.id), Some(b));
    }
}
