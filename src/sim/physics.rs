//! Per-vehicle physics step and collision response
//!
//! The step runs in a fixed order: kinematics, lane assist, slide decay,
//! obstacle response, car contact, object strikes. Car contact mutates
//! the other car speculatively and reverts when the result would put it
//! inside an obstacle, so it needs exclusive ordered access to the world.

use glam::Vec2;
use rand::Rng;

use super::collision::{
    Impact, check_obstacle_collision, classify_impact, object_struck, reflect_velocity, sat_overlap,
};
use super::debris::{impact_burst, mailbox_burst, spark_burst, trashcan_burst};
use super::road_network::RoadNetwork;
use super::state::{GameEvent, ObjectKind, Obstacle, World, present};
use super::vehicle::{Controls, Vehicle};
use crate::consts::*;

/// Advance one vehicle by a tick
///
/// `lane_assist` enables the steering hint for this car.
pub fn step_vehicle(world: &mut World, index: usize, controls: &Controls, lane_assist: bool) {
    let Some(car) = world.vehicles.get_mut(index) else {
        return;
    };

    car.begin_tick();
    car.apply_pedal(controls.pedal, controls.boost);
    car.apply_steering(controls.steer);
    car.integrate();
    if lane_assist {
        apply_lane_assist(car, &world.roads, controls.is_steering());
    } else {
        car.lane_dwell.reset();
    }
    car.decay_slide();

    resolve_obstacle_hit(world, index);

    for other in 0..world.vehicles.len() {
        if other == index {
            continue;
        }
        let touching = sat_overlap(
            &world.vehicles[index].collision_corners(),
            &world.vehicles[other].collision_corners(),
        );
        if touching {
            resolve_car_contact(world, index, other);
        }
    }

    check_object_strikes(world, index);
}

/// Blend the lane hint into the heading when the driver is hands-off
///
/// The dwell timer advances whether or not the hint is applied.
pub fn apply_lane_assist(car: &mut Vehicle, roads: &RoadNetwork, steering: bool) {
    let assist = roads.lane_assist(car.pos, car.angle, &mut car.lane_dwell);
    if let Some(assist) = assist
        && car.speed.abs() > LANE_ASSIST_MIN_SPEED
        && !steering
    {
        car.blend_heading(
            assist.road_angle + assist.correction_angle,
            LANE_ASSIST_GAIN * assist.strength,
        );
    }
}

/// Respond to an obstacle overlap after this tick's move
///
/// Returns the kind of impact, or `None` if the car is clear.
pub fn resolve_obstacle_hit(world: &mut World, index: usize) -> Option<Impact> {
    let now = world.time_ticks;
    let car = world.vehicles.get_mut(index)?;
    let result = check_obstacle_collision(car.pos, &car.collision_corners(), &world.obstacles);
    if !result.hit {
        return None;
    }

    let obstacle = world.obstacles[result.obstacle];
    let velocity = car.pos - car.prev_pos;
    let impact = classify_impact(velocity, result.normal);
    let id = car.id;

    match impact {
        Impact::Hard => {
            car.revert_and_stop();
            log::debug!("Vehicle {} hit obstacle {} head-on", id.0, result.obstacle);
            world.events.push(GameEvent::HardHit {
                vehicle: id,
                obstacle: result.obstacle,
            });
        }
        Impact::Glancing => {
            glance(car, velocity, result.normal, obstacle.center());
            let contact = car.pos.clamp(obstacle.min(), obstacle.max());
            world.events.push(GameEvent::GlancingBlow {
                vehicle: id,
                obstacle: result.obstacle,
            });
            emit_sparks(world, index, contact, velocity.length(), now);
        }
    }

    Some(impact)
}

/// Scrape along a surface instead of stopping
fn glance(car: &mut Vehicle, velocity: Vec2, normal: Vec2, away_from: Vec2) {
    let into_surface = velocity.dot(normal);
    let bounced = if into_surface < 0.0 {
        reflect_velocity(velocity, normal)
    } else {
        velocity
    };
    let reflected = bounced * GLANCING_VELOCITY_DAMPING;
    let tangential = velocity - into_surface * normal;

    car.speed *= GLANCING_SPEED_DAMPING;
    car.angle += GLANCING_NUDGE * car.heading().perp_dot(tangential);
    // Slide carries whatever the heading speed no longer covers
    car.slide = reflected - car.heading() * car.speed;
    car.pos += (car.pos - away_from).normalize_or_zero() * GLANCING_PUSH;
}

/// Spark burst at most once per cooldown per vehicle
fn emit_sparks(world: &mut World, index: usize, at: Vec2, intensity: f32, now: u64) {
    if !world.settings.sparks {
        return;
    }
    let Some(car) = world.vehicles.get_mut(index) else {
        return;
    };
    let ready = car
        .last_spark_tick
        .is_none_or(|t| now.saturating_sub(t) >= SPARK_COOLDOWN_TICKS);
    if !ready {
        return;
    }
    car.last_spark_tick = Some(now);
    let sparks = spark_burst(&mut world.rng, at, intensity);
    world.add_debris(sparks);
}

/// Whether `car` standing at `pos` would be clear of every obstacle
fn clear_at(car: &Vehicle, pos: Vec2, obstacles: &[Obstacle]) -> bool {
    !check_obstacle_collision(pos, &car.collision_corners_at(pos), obstacles).hit
}

/// Resolve overlap between car `a` (the one being stepped) and car `b`
///
/// Applies the impulse when the cars approach each other, then pushes them
/// to the minimum separation. Changes to `b` that would land it in an
/// obstacle are rejected. Cars with coincident centers are left alone.
pub fn resolve_car_contact(world: &mut World, a: usize, b: usize) {
    if a == b || a >= world.vehicles.len() || b >= world.vehicles.len() {
        return;
    }
    let now = world.time_ticks;
    let delta = world.vehicles[a].pos - world.vehicles[b].pos;
    let dist = delta.length();
    if dist <= 0.0 {
        return;
    }
    let normal = delta / dist;

    let approach = (world.vehicles[a].velocity() - world.vehicles[b].velocity()).dot(normal);
    if approach < 0.0 {
        let impulse = -(1.0 + CAR_RESTITUTION) * approach / 2.0;
        world.vehicles[a].slide += normal * impulse;

        let other = &world.vehicles[b];
        let candidate = other.slide - normal * impulse;
        if clear_at(other, other.pos + candidate, &world.obstacles) {
            let jitter = (world.rng.random::<f32>() - 0.5) * CAR_HEADING_JITTER;
            let other = &mut world.vehicles[b];
            other.slide = candidate;
            other.angle += jitter;
        }

        world.vehicles[a].speed *= CAR_IMPACT_SPEED_FACTOR;
        world.vehicles[b].speed *= CAR_IMPACT_SPEED_FACTOR;
    }

    let overlap = CAR_MIN_SEPARATION - dist;
    if overlap > 0.0 {
        let push = normal * overlap * 0.5;
        world.vehicles[a].pos += push;
        let other = &world.vehicles[b];
        let pushed = other.pos - push;
        if clear_at(other, pushed, &world.obstacles) {
            world.vehicles[b].pos = pushed;
        } else {
            world.vehicles[b].slide = Vec2::ZERO;
        }
    }

    let (id_a, id_b) = (world.vehicles[a].id, world.vehicles[b].id);
    world.events.push(GameEvent::VehicleContact { a: id_a, b: id_b });
    let midpoint = (world.vehicles[a].pos + world.vehicles[b].pos) * 0.5;
    emit_sparks(world, a, midpoint, approach.abs(), now);
}

/// Knock over any standing object the car runs into
pub fn check_object_strikes(world: &mut World, index: usize) {
    let Some(car) = world.vehicles.get(index) else {
        return;
    };
    let combined_speed = car.speed.abs() + car.slide.length();
    if combined_speed <= STRIKE_MIN_SPEED {
        return;
    }
    let (id, pos) = (car.id, car.pos);
    let corners = car.collision_corners();

    let struck: Vec<usize> = present(&world.objects)
        .filter(|(_, o)| o.pos.distance(pos) < STRIKE_PROXIMITY && object_struck(&corners, o))
        .map(|(i, _)| i)
        .collect();

    for i in struck {
        world.objects[i].hit = true;
        let object = world.objects[i];
        let away = object.pos - pos;
        let angle = away.y.atan2(away.x);

        let mut particles = impact_burst(&mut world.rng, object.pos, angle, combined_speed);
        particles.extend(match object.kind {
            ObjectKind::Mailbox => {
                mailbox_burst(&mut world.rng, object.pos, angle, combined_speed, world.finish)
            }
            ObjectKind::Trashcan => trashcan_burst(
                &mut world.rng,
                object.pos,
                angle,
                combined_speed,
                world.finish,
                object.color,
                object.shape,
            ),
        });
        world.add_debris(particles);

        log::debug!("Vehicle {} knocked over {:?} {}", id.0, object.kind, i);
        world.events.push(GameEvent::ObjectStruck {
            vehicle: id,
            object: i,
            kind: object.kind,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::state::{ContainerShape, InteractiveObject};
    use crate::sim::vehicle::{Pedal, VehicleId};
    use std::f32::consts::PI;

    fn world_with(cars: Vec<Vehicle>) -> World {
        let mut world = World::new(7, Settings::default());
        for car in cars {
            world.spawn_vehicle(car);
        }
        world
    }

    fn moving(pos: Vec2, angle: f32, speed: f32) -> Vehicle {
        let mut car = Vehicle::police(VehicleId(0), pos);
        car.angle = angle;
        car.speed = speed;
        car
    }

    #[test]
    fn test_head_on_obstacle_reverts() {
        let mut world = world_with(vec![moving(Vec2::new(63.0, 40.0), 0.0, 3.0)]);
        world.obstacles.push(Obstacle::new(100.0, 0.0, 100.0, 80.0));

        step_vehicle(&mut world, 0, &Controls::default(), false);

        let car = &world.vehicles[0];
        assert_eq!(car.pos, Vec2::new(63.0, 40.0));
        assert_eq!(car.speed, 0.0);
        assert_eq!(car.slide, Vec2::ZERO);
        assert!(matches!(world.events[0], GameEvent::HardHit { obstacle: 0, .. }));
    }

    #[test]
    fn test_hard_hit_under_throttle_stays_put() {
        let mut world = world_with(vec![moving(Vec2::new(63.0, 40.0), 0.0, 3.0)]);
        world.obstacles.push(Obstacle::new(100.0, 0.0, 100.0, 80.0));
        let throttle = Controls {
            pedal: Pedal::Throttle,
            ..Controls::default()
        };
        step_vehicle(&mut world, 0, &throttle, false);
        let before = world.vehicles[0].pos;
        world.vehicles[0].speed = 4.0;
        step_vehicle(&mut world, 0, &throttle, false);
        assert_eq!(world.vehicles[0].pos, before);
        assert_eq!(world.vehicles[0].speed, 0.0);
    }

    #[test]
    fn test_glancing_blow_loses_energy() {
        // Long wall whose top face is at y = 40, car angled 0.1 rad into it
        let mut world = world_with(vec![moving(Vec2::new(0.0, 19.49), 0.1, 3.0)]);
        world.obstacles.push(Obstacle::new(-500.0, 40.0, 1000.0, 100.0));
        let start = world.vehicles[0].clone();
        let corners = start.collision_corners();
        assert!(!check_obstacle_collision(start.pos, &corners, &world.obstacles).hit);

        step_vehicle(&mut world, 0, &Controls::default(), false);

        let car = &world.vehicles[0];
        let pre_impact = start.heading() * start.speed * start.friction;
        assert!(car.speed < start.speed * start.friction);
        assert!(car.velocity().length() < pre_impact.length());
        // Leaves the wall instead of driving through it
        assert!(car.velocity().y <= 0.0);
        assert_ne!(car.pos, start.pos);
        assert!(matches!(world.events[0], GameEvent::GlancingBlow { .. }));
        assert_eq!(world.debris.len(), 6);
    }

    #[test]
    fn test_glancing_sparks_rate_limited() {
        let mut world = world_with(vec![moving(Vec2::new(0.0, 19.49), 0.1, 3.0)]);
        world.obstacles.push(Obstacle::new(-500.0, 40.0, 1000.0, 100.0));
        step_vehicle(&mut world, 0, &Controls::default(), false);
        assert_eq!(world.vehicles[0].last_spark_tick, Some(0));

        emit_sparks(&mut world, 0, Vec2::ZERO, 1.0, 5);
        assert_eq!(world.debris.len(), 6);
        emit_sparks(&mut world, 0, Vec2::ZERO, 1.0, SPARK_COOLDOWN_TICKS);
        assert_eq!(world.debris.len(), 12);
    }

    #[test]
    fn test_head_on_cars_share_impulse() {
        let mut world = world_with(vec![
            moving(Vec2::new(-30.0, 0.0), 0.0, 3.0),
            moving(Vec2::new(30.0, 0.0), PI, 3.0),
        ]);
        assert!(sat_overlap(
            &world.vehicles[0].collision_corners(),
            &world.vehicles[1].collision_corners()
        ));

        resolve_car_contact(&mut world, 0, 1);

        let (a, b) = (&world.vehicles[0], &world.vehicles[1]);
        assert!((a.speed - 1.5).abs() < 1e-5);
        assert!((b.speed - 1.5).abs() < 1e-5);
        assert!((a.slide.x + 3.9).abs() < 1e-4);
        assert!((b.slide.x - 3.9).abs() < 1e-4);
        assert!((a.slide + b.slide).length() < 1e-4);
        // Pushed apart to the minimum separation
        assert!((b.pos.x - a.pos.x - CAR_MIN_SEPARATION).abs() < 1e-4);
        assert_eq!(
            world.events,
            vec![GameEvent::VehicleContact {
                a: VehicleId(0),
                b: VehicleId(1)
            }]
        );
    }

    #[test]
    fn test_blocked_car_keeps_still() {
        let mut world = world_with(vec![
            moving(Vec2::new(-30.0, 0.0), 0.0, 3.0),
            moving(Vec2::new(30.0, 0.0), PI, 3.0),
        ]);
        // Wall just behind the second car
        world.obstacles.push(Obstacle::new(66.0, -50.0, 34.0, 100.0));

        resolve_car_contact(&mut world, 0, 1);

        let b = &world.vehicles[1];
        assert_eq!(b.slide, Vec2::ZERO);
        assert_eq!(b.angle, PI);
        assert_eq!(b.pos, Vec2::new(30.0, 0.0));
        assert!((b.speed - 1.5).abs() < 1e-5);
        assert!((world.vehicles[0].pos.x + 45.0).abs() < 1e-4);
    }

    #[test]
    fn test_receding_cars_only_separate() {
        let mut world = world_with(vec![
            moving(Vec2::new(-30.0, 0.0), PI, 2.0),
            moving(Vec2::new(30.0, 0.0), 0.0, 2.0),
        ]);
        resolve_car_contact(&mut world, 0, 1);
        assert_eq!(world.vehicles[0].speed, 2.0);
        assert_eq!(world.vehicles[0].slide, Vec2::ZERO);
        assert!((world.vehicles[1].pos.x - 45.0).abs() < 1e-4);
    }

    #[test]
    fn test_coincident_cars_skipped() {
        let mut world = world_with(vec![
            moving(Vec2::ZERO, 0.0, 3.0),
            moving(Vec2::ZERO, PI, 3.0),
        ]);
        resolve_car_contact(&mut world, 0, 1);
        assert_eq!(world.vehicles[0].speed, 3.0);
        assert!(world.events.is_empty());
    }

    #[test]
    fn test_contact_sparks_once_per_cooldown() {
        let mut world = world_with(vec![
            moving(Vec2::new(-30.0, 0.0), 0.0, 3.0),
            moving(Vec2::new(30.0, 0.0), PI, 3.0),
        ]);
        resolve_car_contact(&mut world, 0, 1);
        resolve_car_contact(&mut world, 0, 1);
        assert_eq!(world.debris.len(), 6);
        assert_eq!(world.events.len(), 2);
    }

    #[test]
    fn test_object_strike_is_one_shot() {
        let mut world = world_with(vec![moving(Vec2::ZERO, 0.0, 3.0)]);
        world.objects.push(InteractiveObject::new(
            ObjectKind::Mailbox,
            Vec2::new(30.0, 0.0),
            0x2255aa,
            ContainerShape::Square,
        ));

        step_vehicle(&mut world, 0, &Controls::default(), false);
        assert!(world.objects[0].hit);
        assert_eq!(world.debris.len(), 13);
        assert_eq!(world.events.len(), 1);

        for _ in 0..5 {
            world.vehicles[0].speed = 4.0;
            world.vehicles[0].pos = Vec2::new(30.0, 0.0);
            check_object_strikes(&mut world, 0);
        }
        assert_eq!(world.debris.len(), 13);
        assert_eq!(world.events.len(), 1);
    }

    #[test]
    fn test_trashcan_throws_container() {
        let mut world = world_with(vec![moving(Vec2::ZERO, 0.0, 3.0)]);
        world.objects.push(InteractiveObject::new(
            ObjectKind::Trashcan,
            Vec2::new(40.0, 12.0),
            0x556b2f,
            ContainerShape::Round,
        ));
        check_object_strikes(&mut world, 0);
        assert!(world.objects[0].hit);
        assert_eq!(world.debris.len(), 5 + 13);
        assert_eq!(world.debris.last().and_then(|d| d.container), Some(ContainerShape::Round));
    }

    #[test]
    fn test_slow_car_does_not_strike() {
        let mut world = world_with(vec![moving(Vec2::ZERO, 0.0, 0.4)]);
        world.objects.push(InteractiveObject::new(
            ObjectKind::Mailbox,
            Vec2::new(30.0, 0.0),
            0,
            ContainerShape::Square,
        ));
        check_object_strikes(&mut world, 0);
        assert!(!world.objects[0].hit);
        assert!(world.events.is_empty());
    }

    #[test]
    fn test_step_resolves_overlapping_pair() {
        let mut world = world_with(vec![
            moving(Vec2::new(-30.0, 0.0), 0.0, 3.0),
            moving(Vec2::new(30.0, 0.0), PI, 3.0),
        ]);
        step_vehicle(&mut world, 0, &Controls::default(), false);
        assert!(world
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::VehicleContact { .. })));
        assert!(world.vehicles[0].speed < 3.0 * 0.98);
    }
}
