//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by vehicle id)
//! - No rendering or platform dependencies

pub mod ai;
pub mod collision;
pub mod debris;
pub mod geometry;
pub mod lighting;
pub mod physics;
pub mod road;
pub mod road_network;
pub mod scene;
pub mod signals;
pub mod state;
pub mod tick;
pub mod vehicle;

pub use collision::{CollisionResult, Impact, sat_overlap};
pub use debris::{Debris, Finish};
pub use lighting::{
    Edge, FrameLight, LightCone, LightSource, RayHit, cast_light_cone, collect_edges, frame_lights,
    is_point_lit, raycast,
};
pub use physics::{resolve_car_contact, step_vehicle};
pub use road::{PathPoint, Road, RoadKind};
pub use road_network::{Intersection, IntersectionKind, LaneAssist, LaneDwell, RoadNetwork};
pub use scene::{RoadDef, Scene, VehicleDef};
pub use signals::{LightBar, Side, SignalState, Siren, TurnSignals};
pub use state::{
    Camera, ContainerShape, GameEvent, InteractiveObject, ObjectKind, Obstacle, Streetlight, World,
};
pub use tick::{TickInput, tick};
pub use vehicle::{Controls, Pedal, Vehicle, VehicleId, VehicleKind};
