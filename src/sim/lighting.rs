//! Raycast lighting
//!
//! Every light is a fan of rays cast against scene edges. The resulting
//! cone polygon is what the renderer fills; the first-hit points are used
//! to draw bright glints where light meets a surface.
//!
//! Edges are rebuilt for each call from whatever lies near the camera.
//! There is no persistent spatial index.

use glam::Vec2;

use super::signals::LightBarLamps;
use super::state::{Camera, InteractiveObject, Obstacle, World, present};
use super::vehicle::{Vehicle, VehicleId, VehicleKind};
use crate::consts::*;
use crate::{heading_vector, left_normal, normalize_angle};

/// A light-blocking segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: Vec2,
    pub b: Vec2,
}

impl Edge {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }
}

fn push_polygon(edges: &mut Vec<Edge>, corners: &[Vec2; 4]) {
    for i in 0..4 {
        edges.push(Edge::new(corners[i], corners[(i + 1) % 4]));
    }
}

/// Gather light-blocking edges near the camera
///
/// Obstacles and standing objects are culled to `EDGE_MARGIN` around the
/// viewport; every car silhouette passed in is always included.
pub fn collect_edges(
    camera: &Camera,
    obstacles: &[Obstacle],
    objects: &[InteractiveObject],
    cars: &[[Vec2; 4]],
) -> Vec<Edge> {
    let min = camera.origin - Vec2::splat(EDGE_MARGIN);
    let max = camera.origin + camera.size + Vec2::splat(EDGE_MARGIN);
    let mut edges = Vec::new();

    for obs in obstacles {
        let (lo, hi) = (obs.min(), obs.max());
        if hi.x < min.x || lo.x > max.x || hi.y < min.y || lo.y > max.y {
            continue;
        }
        push_polygon(&mut edges, &obs.corners());
    }

    for (_, obj) in present(objects) {
        if !camera.near(obj.pos, EDGE_MARGIN) {
            continue;
        }
        push_polygon(&mut edges, &obj.footprint());
    }

    for corners in cars {
        push_polygon(&mut edges, corners);
    }

    edges
}

/// Result of a single ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance travelled, `max_dist` when nothing was struck
    pub distance: f32,
    /// Surface point, if one was struck
    pub point: Option<Vec2>,
}

/// Cast one ray and return the nearest surface closer than `max_dist`
pub fn raycast(origin: Vec2, angle: f32, max_dist: f32, edges: &[Edge]) -> RayHit {
    let dir = heading_vector(angle);
    let mut best = max_dist;
    let mut point = None;

    for edge in edges {
        let p1 = edge.a - origin;
        let p2 = edge.b - origin;
        let seg = p2 - p1;

        let den = seg.x * dir.y - seg.y * dir.x;
        if den.abs() < RAY_PARALLEL_EPSILON {
            continue;
        }

        let t = (seg.x * p1.y - seg.y * p1.x) / den;
        let u = (dir.x * p1.y - dir.y * p1.x) / den;

        if t > 0.0 && (0.0..=1.0).contains(&u) && t < best {
            best = t;
            point = Some(origin + dir * t);
        }
    }

    RayHit {
        distance: best,
        point,
    }
}

/// Polygon and surface hits of one light
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightCone {
    /// Origin followed by each ray's end point (triangle fan)
    pub points: Vec<Vec2>,
    /// Ray end points that landed on a surface, in ray order
    pub hit_points: Vec<Vec2>,
}

impl LightCone {
    /// Line segments between consecutive hits close enough to be one surface
    pub fn glint_segments(&self) -> Vec<(Vec2, Vec2)> {
        self.hit_points
            .windows(2)
            .filter(|w| w[0].distance(w[1]) < GLINT_MAX_GAP)
            .map(|w| (w[0], w[1]))
            .collect()
    }
}

/// Cast `ray_count` rays evenly over `[angle - spread/2, angle + spread/2]`
///
/// `ray_count` must be at least 2.
pub fn cast_light_cone(
    origin: Vec2,
    angle: f32,
    spread: f32,
    ray_count: usize,
    max_dist: f32,
    edges: &[Edge],
) -> LightCone {
    debug_assert!(ray_count >= 2, "light cone needs at least two rays");
    let mut points = Vec::with_capacity(ray_count + 1);
    let mut hit_points = Vec::new();
    points.push(origin);

    let step = spread / (ray_count - 1) as f32;
    for i in 0..ray_count {
        let a = angle - spread / 2.0 + step * i as f32;
        let hit = raycast(origin, a, max_dist, edges);
        points.push(origin + heading_vector(a) * hit.distance);
        if let Some(p) = hit.point {
            hit_points.push(p);
        }
    }

    LightCone { points, hit_points }
}

/// Left and right headlight positions
pub fn headlight_mounts(car: &Vehicle) -> [Vec2; 2] {
    let forward = car.heading() * HEADLIGHT_FORWARD;
    let side = left_normal(car.angle) * HEADLIGHT_LATERAL;
    [car.pos + forward + side, car.pos + forward - side]
}

/// Spotlight lamp on the driver's side
pub fn spotlight_mount(car: &Vehicle) -> Vec2 {
    car.pos + car.heading() * SPOTLIGHT_FORWARD - left_normal(car.angle) * (car.width / 2.0 + 5.0)
}

/// Red and blue roof lamp positions
pub fn siren_mounts(car: &Vehicle) -> (Vec2, Vec2) {
    let forward = car.heading() * (car.height / 2.0 - 33.0);
    let side = left_normal(car.angle) * (car.width / 4.0 - 1.0);
    (car.pos + forward - side, car.pos + forward + side)
}

fn within_cone(from: Vec2, to: Vec2, facing: f32, reach: f32, half_angle: f32) -> bool {
    let d = to - from;
    d.length() < reach && normalize_angle(d.y.atan2(d.x) - facing).abs() < half_angle
}

/// Whether a world point receives light from the player's lamps or a streetlight
///
/// `spotlight_target` is the aim point while the spotlight is held.
pub fn is_point_lit(world: &World, point: Vec2, spotlight_target: Option<Vec2>) -> bool {
    let player = world.player();

    if world.headlights_on
        && let Some(car) = player
        && headlight_mounts(car)
            .iter()
            .any(|&m| within_cone(m, point, car.angle, HEADLIGHT_REACH, HEADLIGHT_HALF_ANGLE))
    {
        return true;
    }

    if world
        .streetlights
        .iter()
        .any(|s| s.lamp().distance(point) < STREETLIGHT_REACH)
    {
        return true;
    }

    if let (Some(car), Some(target)) = (player, spotlight_target) {
        let mount = spotlight_mount(car);
        let aim = target - mount;
        return within_cone(mount, point, aim.y.atan2(aim.x), SPOTLIGHT_REACH, SPOTLIGHT_HALF_ANGLE);
    }

    false
}

/// What emitted a frame light
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightSource {
    Headlight { vehicle: VehicleId, left: bool },
    SirenRed { vehicle: VehicleId },
    SirenBlue { vehicle: VehicleId },
    Streetlight { index: usize },
    Spotlight,
}

/// One cone to paint this frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLight {
    pub source: LightSource,
    pub cone: LightCone,
}

/// Every light cone for the current (already settled) world state
pub fn frame_lights(world: &World, spotlight_target: Option<Vec2>) -> Vec<FrameLight> {
    let silhouettes: Vec<(VehicleId, [Vec2; 4])> =
        world.vehicles.iter().map(|v| (v.id, v.silhouette())).collect();
    let edges_without = |exclude: Option<VehicleId>| {
        let cars: Vec<[Vec2; 4]> = silhouettes
            .iter()
            .filter(|(id, _)| Some(*id) != exclude)
            .map(|(_, c)| *c)
            .collect();
        collect_edges(&world.camera, &world.obstacles, &world.objects, &cars)
    };

    let mut lights = Vec::new();
    let static_edges = edges_without(None);
    let spread = world.headlight_spread();
    let rays = world.settings.quality.headlight_rays();

    for (index, light) in world.streetlights.iter().enumerate() {
        lights.push(FrameLight {
            source: LightSource::Streetlight { index },
            cone: cast_light_cone(
                light.lamp(),
                0.0,
                std::f32::consts::TAU,
                world.settings.quality.streetlight_rays(),
                STREETLIGHT_REACH,
                &static_edges,
            ),
        });
    }

    for car in &world.vehicles {
        let own_excluded = edges_without(Some(car.id));
        let lit = car.id != World::PLAYER || world.headlights_on;
        if lit {
            for (mount, left) in headlight_mounts(car).into_iter().zip([true, false]) {
                lights.push(FrameLight {
                    source: LightSource::Headlight {
                        vehicle: car.id,
                        left,
                    },
                    cone: cast_light_cone(
                        mount,
                        car.angle,
                        spread,
                        rays,
                        RAY_MAX_DISTANCE,
                        &own_excluded,
                    ),
                });
            }
        }

        if car.kind == VehicleKind::Police && car.siren.is_on() {
            let LightBarLamps { red, blue } = car.light_bar.lamps(world.time_ticks);
            let (red_mount, blue_mount) = siren_mounts(car);
            let siren_cone = |origin| {
                cast_light_cone(
                    origin,
                    0.0,
                    std::f32::consts::TAU,
                    SIREN_RAYS,
                    RAY_MAX_DISTANCE,
                    &own_excluded,
                )
            };
            if red {
                lights.push(FrameLight {
                    source: LightSource::SirenRed { vehicle: car.id },
                    cone: siren_cone(red_mount),
                });
            }
            if blue {
                lights.push(FrameLight {
                    source: LightSource::SirenBlue { vehicle: car.id },
                    cone: siren_cone(blue_mount),
                });
            }
        }
    }

    if let (Some(car), Some(target)) = (world.player(), spotlight_target) {
        let mount = spotlight_mount(car);
        let aim = target - mount;
        let angle = aim.y.atan2(aim.x);
        let origin = mount - heading_vector(angle) * SPOTLIGHT_CONE_BACKSET;
        lights.push(FrameLight {
            source: LightSource::Spotlight,
            cone: cast_light_cone(
                origin,
                angle,
                SPOTLIGHT_SPREAD,
                SPOTLIGHT_RAYS,
                RAY_MAX_DISTANCE,
                &static_edges,
            ),
        });
    }

    lights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::state::{ContainerShape, ObjectKind, Streetlight};
    use std::f32::consts::{FRAC_PI_2, PI};

    fn wall_edges() -> Vec<Edge> {
        // Vertical wall at x = 100 spanning y in [-50, 50]
        vec![Edge::new(Vec2::new(100.0, -50.0), Vec2::new(100.0, 50.0))]
    }

    #[test]
    fn test_raycast_analytic_distance() {
        let hit = raycast(Vec2::ZERO, 0.0, 1000.0, &wall_edges());
        assert!((hit.distance - 100.0).abs() < 1e-6);
        assert!((hit.point.unwrap() - Vec2::new(100.0, 0.0)).length() < 1e-5);

        // 20° ray: distance 100 / cos 20°
        let angle = PI / 9.0;
        let hit = raycast(Vec2::ZERO, angle, 1000.0, &wall_edges());
        assert!((hit.distance - 100.0 / angle.cos()).abs() < 1e-4);
        assert!(hit.distance < 1000.0);
    }

    #[test]
    fn test_raycast_misses_and_clamps() {
        let edges = wall_edges();
        let away = raycast(Vec2::ZERO, PI, 1000.0, &edges);
        assert_eq!(away.distance, 1000.0);
        assert!(away.point.is_none());
        // Wall beyond reach
        let short = raycast(Vec2::ZERO, 0.0, 80.0, &edges);
        assert_eq!(short.distance, 80.0);
        assert!(short.point.is_none());
        // Parallel to the wall
        let parallel = raycast(Vec2::new(100.0, -100.0), FRAC_PI_2, 1000.0, &edges);
        assert!(parallel.point.is_none());
    }

    #[test]
    fn test_raycast_keeps_nearest() {
        let mut edges = wall_edges();
        edges.push(Edge::new(Vec2::new(60.0, -50.0), Vec2::new(60.0, 50.0)));
        let hit = raycast(Vec2::ZERO, 0.0, 1000.0, &edges);
        assert!((hit.distance - 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_cone_point_counts() {
        let edges = wall_edges();
        for n in [2, 7, 50] {
            let cone = cast_light_cone(Vec2::ZERO, 0.0, FRAC_PI_2, n, 1000.0, &edges);
            assert_eq!(cone.points.len(), n + 1);
            assert!(cone.hit_points.len() <= n);
            assert_eq!(cone.points[0], Vec2::ZERO);
        }
        // Unobstructed fan reaches max distance everywhere
        let open = cast_light_cone(Vec2::ZERO, PI, 0.5, 10, 250.0, &edges);
        assert!(open.hit_points.is_empty());
        assert!(open.points[1..].iter().all(|p| (p.length() - 250.0).abs() < 1e-3));
    }

    #[test]
    fn test_cone_spans_spread_inclusive() {
        let cone = cast_light_cone(Vec2::ZERO, 0.0, FRAC_PI_2, 3, 10.0, &[]);
        let first = cone.points[1];
        let last = cone.points[3];
        assert!((first.y.atan2(first.x) + PI / 4.0).abs() < 1e-5);
        assert!((last.y.atan2(last.x) - PI / 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_glints_skip_large_gaps() {
        let cone = LightCone {
            points: vec![],
            hit_points: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(5.0, 0.0),
                Vec2::new(100.0, 0.0),
                Vec2::new(110.0, 0.0),
            ],
        };
        let glints = cone.glint_segments();
        assert_eq!(glints.len(), 2);
        assert_eq!(glints[1], (Vec2::new(100.0, 0.0), Vec2::new(110.0, 0.0)));
    }

    #[test]
    fn test_collect_edges_culls_and_skips_struck() {
        let camera = Camera {
            origin: Vec2::ZERO,
            size: Vec2::new(100.0, 100.0),
        };
        let obstacles = vec![
            Obstacle::new(10.0, 10.0, 20.0, 20.0),
            Obstacle::new(5000.0, 5000.0, 20.0, 20.0),
        ];
        let mut objects = vec![
            InteractiveObject::new(
                ObjectKind::Mailbox,
                Vec2::new(50.0, 50.0),
                0,
                ContainerShape::Square,
            ),
            InteractiveObject::new(
                ObjectKind::Trashcan,
                Vec2::new(60.0, 60.0),
                0,
                ContainerShape::Round,
            ),
        ];
        objects[1].hit = true;
        let car = crate::sim::vehicle::oriented_corners(Vec2::new(9000.0, 0.0), 0.0, 30.0, 80.0);
        let edges = collect_edges(&camera, &obstacles, &objects, &[car]);
        // One obstacle, one standing mailbox, one car
        assert_eq!(edges.len(), 12);
    }

    #[test]
    fn test_point_lit_sources() {
        let mut world = World::new(1, Settings::default());
        world.spawn_vehicle(Vehicle::police(VehicleId(0), Vec2::ZERO));
        world.headlights_on = true;

        assert!(is_point_lit(&world, Vec2::new(300.0, 0.0), None));
        // Behind the car
        assert!(!is_point_lit(&world, Vec2::new(-300.0, 0.0), None));
        world.headlights_on = false;
        assert!(!is_point_lit(&world, Vec2::new(300.0, 0.0), None));

        world.streetlights.push(Streetlight {
            pos: Vec2::new(-300.0, 60.0),
            pole_height: 60.0,
        });
        assert!(is_point_lit(&world, Vec2::new(-300.0, 100.0), None));

        // Spotlight aimed straight down the +y axis from the driver side
        let mount = spotlight_mount(world.player().unwrap());
        let target = mount + Vec2::new(0.0, 500.0);
        assert!(is_point_lit(&world, mount + Vec2::new(0.0, 400.0), Some(target)));
        assert!(!is_point_lit(&world, mount + Vec2::new(200.0, 400.0), Some(target)));
    }

    #[test]
    fn test_point_lit_wraps_heading() {
        let mut world = World::new(1, Settings::default());
        let mut car = Vehicle::police(VehicleId(0), Vec2::ZERO);
        car.angle = 3.0 * PI;
        world.spawn_vehicle(car);
        assert!(is_point_lit(&world, Vec2::new(-300.0, 0.0), None));
    }

    #[test]
    fn test_frame_lights_sources() {
        let mut world = World::new(1, Settings::default());
        let player = world.spawn_vehicle(Vehicle::police(VehicleId(0), Vec2::ZERO));
        world.spawn_vehicle(Vehicle::civilian(VehicleId(0), Vec2::new(0.0, 300.0), 0x1a4d8f));
        world.streetlights.push(Streetlight {
            pos: Vec2::new(150.0, 150.0),
            pole_height: 60.0,
        });
        world.vehicles[0].siren.set(true);

        let lights = frame_lights(&world, Some(Vec2::new(500.0, 0.0)));
        let headlights = lights
            .iter()
            .filter(|l| matches!(l.source, LightSource::Headlight { .. }))
            .count();
        assert_eq!(headlights, 4);
        assert!(lights.iter().any(|l| l.source == LightSource::Streetlight { index: 0 }));
        assert!(lights.iter().any(|l| l.source == LightSource::Spotlight));
        // Tick 0 with phase 0 is a red phase
        assert!(lights.iter().any(|l| l.source == LightSource::SirenRed { vehicle: player }));
        assert!(!lights.iter().any(|l| matches!(l.source, LightSource::SirenBlue { .. })));

        let spot = lights.iter().find(|l| l.source == LightSource::Spotlight).unwrap();
        assert_eq!(spot.cone.points.len(), SPOTLIGHT_RAYS + 1);
    }
}
