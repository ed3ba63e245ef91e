//! Scene description
//!
//! A scene is the static layout a world starts from: roads, buildings,
//! street furniture, lamps and the starting cars. Scenes load from JSON;
//! the demo scene is the downtown grid the game boots into.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::debris::Finish;
use super::road::{PathPoint, RoadKind};
use super::signals::LightBar;
use super::state::{ContainerShape, InteractiveObject, ObjectKind, Obstacle, Streetlight, World};
use super::vehicle::{Vehicle, VehicleId, VehicleKind};
use crate::error::LoadError;
use crate::settings::Settings;

/// One road as authored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoadDef {
    Straight {
        start: Vec2,
        end: Vec2,
        #[serde(default)]
        kind: RoadKind,
    },
    Curved {
        center: Vec2,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        #[serde(default)]
        kind: RoadKind,
    },
    Path {
        points: Vec<PathPoint>,
        #[serde(default)]
        kind: RoadKind,
    },
    Merge {
        start: Vec2,
        end: Vec2,
        from: RoadKind,
        to: RoadKind,
    },
}

/// A starting car; index 0 is the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleDef {
    pub kind: VehicleKind,
    pub pos: Vec2,
    #[serde(default)]
    pub angle: f32,
    /// Body color for civilian cars
    #[serde(default)]
    pub color: Option<u32>,
    /// Index of the car to pursue
    #[serde(default)]
    pub follow: Option<usize>,
    #[serde(default)]
    pub light_bar_phase: u64,
}

/// Static scene layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub roads: Vec<RoadDef>,
    pub obstacles: Vec<Obstacle>,
    pub objects: Vec<InteractiveObject>,
    pub streetlights: Vec<Streetlight>,
    pub vehicles: Vec<VehicleDef>,
    pub finish: Finish,
}

impl Scene {
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let scene: Scene = serde_json::from_str(json)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn to_json(&self) -> Result<String, LoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read and validate a scene file
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let json = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scene = Self::from_json(&json)?;
        log::info!(
            "Loaded scene {} ({} roads, {} vehicles)",
            path.display(),
            scene.roads.len(),
            scene.vehicles.len()
        );
        Ok(scene)
    }

    /// Check references that serde cannot
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.vehicles.is_empty() {
            return Err(LoadError::InvalidScene("scene has no player vehicle".into()));
        }
        for (i, v) in self.vehicles.iter().enumerate() {
            if let Some(target) = v.follow
                && (target >= self.vehicles.len() || target == i)
            {
                return Err(LoadError::InvalidScene(format!(
                    "vehicle {i} follows invalid vehicle {target}"
                )));
            }
        }
        for (i, road) in self.roads.iter().enumerate() {
            let bad = match road {
                RoadDef::Straight { start, end, .. } | RoadDef::Merge { start, end, .. } => {
                    start == end
                }
                RoadDef::Curved {
                    radius,
                    start_angle,
                    end_angle,
                    ..
                } => *radius <= 0.0 || start_angle == end_angle,
                RoadDef::Path { points, .. } => points.len() < 2,
            };
            if bad {
                return Err(LoadError::InvalidScene(format!("road {i} is degenerate")));
            }
        }
        Ok(())
    }

    /// Build a fresh world from this scene
    pub fn build_world(&self, seed: u64, settings: Settings) -> World {
        let mut world = World::new(seed, settings);

        for road in &self.roads {
            match road {
                RoadDef::Straight { start, end, kind } => {
                    world.roads.add_road(*start, *end, *kind);
                }
                RoadDef::Curved {
                    center,
                    radius,
                    start_angle,
                    end_angle,
                    kind,
                } => {
                    world
                        .roads
                        .add_curved_road(*center, *radius, *start_angle, *end_angle, *kind);
                }
                RoadDef::Path { points, kind } => {
                    world.roads.add_path(points, *kind);
                }
                RoadDef::Merge {
                    start,
                    end,
                    from,
                    to,
                } => {
                    world.roads.add_merge(*start, *end, *from, *to);
                }
            }
        }
        world.roads.build_intersections();

        world.obstacles = self.obstacles.clone();
        world.objects = self.objects.clone();
        world.streetlights = self.streetlights.clone();
        world.finish = self.finish;

        for def in &self.vehicles {
            let mut car = match def.kind {
                VehicleKind::Police => Vehicle::police(VehicleId(0), def.pos),
                VehicleKind::Civilian => {
                    Vehicle::civilian(VehicleId(0), def.pos, def.color.unwrap_or(0x1a4d8f))
                }
            };
            car.angle = def.angle;
            car.follow = def.follow.map(VehicleId);
            car.light_bar = LightBar::new(def.light_bar_phase);
            world.spawn_vehicle(car);
        }

        if let Some(player) = world.player() {
            let origin = player.pos;
            world.camera.center_on(origin);
        }

        log::info!(
            "Built world: {} roads, {} intersections, {} obstacles, {} objects, {} vehicles",
            world.roads.roads().len(),
            world.roads.intersections().len(),
            world.obstacles.len(),
            world.objects.len(),
            world.vehicles.len()
        );
        world
    }

    /// Downtown grid with a handful of buildings, street furniture and cars
    pub fn demo() -> Self {
        let mut roads = Vec::new();
        for c in [-1200.0, 0.0, 1200.0] {
            roads.push(RoadDef::Straight {
                start: Vec2::new(-2400.0, c),
                end: Vec2::new(2400.0, c),
                kind: RoadKind::FourLane,
            });
        }
        for c in [-1200.0, 0.0, 1200.0] {
            roads.push(RoadDef::Straight {
                start: Vec2::new(c, -2400.0),
                end: Vec2::new(c, 2400.0),
                kind: RoadKind::FourLane,
            });
        }

        let trashcan = |x, y, color, shape| {
            InteractiveObject::new(ObjectKind::Trashcan, Vec2::new(x, y), color, shape)
        };

        Self {
            roads,
            obstacles: vec![
                Obstacle::new(200.0, -100.0, 100.0, 80.0),
                Obstacle::new(-250.0, 50.0, 120.0, 60.0),
            ],
            objects: vec![
                InteractiveObject::new(
                    ObjectKind::Mailbox,
                    Vec2::new(-100.0, -200.0),
                    0x2255aa,
                    ContainerShape::Square,
                ),
                trashcan(300.0, 100.0, 0x4a4a4a, ContainerShape::Round),
                trashcan(-200.0, 200.0, 0x2a5a2a, ContainerShape::Square),
                trashcan(100.0, -150.0, 0x5a2a2a, ContainerShape::Round),
                trashcan(-300.0, -50.0, 0x2a2a5a, ContainerShape::Square),
            ],
            streetlights: vec![Streetlight {
                pos: Vec2::new(150.0, 150.0),
                pole_height: 60.0,
            }],
            vehicles: vec![
                VehicleDef {
                    kind: VehicleKind::Police,
                    pos: Vec2::ZERO,
                    angle: 0.0,
                    color: None,
                    follow: None,
                    light_bar_phase: 0,
                },
                VehicleDef {
                    kind: VehicleKind::Police,
                    pos: Vec2::new(-150.0, 0.0),
                    angle: 0.0,
                    color: None,
                    follow: None,
                    light_bar_phase: 4,
                },
                VehicleDef {
                    kind: VehicleKind::Police,
                    pos: Vec2::new(150.0, 150.0),
                    angle: 0.0,
                    color: None,
                    follow: Some(0),
                    light_bar_phase: 8,
                },
                VehicleDef {
                    kind: VehicleKind::Civilian,
                    pos: Vec2::new(-400.0, -300.0),
                    angle: 0.0,
                    color: Some(0x1a4d8f),
                    follow: Some(2),
                    light_bar_phase: 0,
                },
            ],
            finish: Finish::Pristine,
        }
    }
}
