//! Collision detection for oriented car boxes
//!
//! Cars are oriented rectangles; obstacles are axis-aligned rectangles;
//! interactive objects have small footprints of their own. Responses
//! live in `physics`; this module only answers geometric questions.

use glam::Vec2;

use super::geometry::point_in_convex_polygon;
use super::state::{InteractiveObject, ObjectKind, Obstacle};
use crate::consts::{GLANCING_THRESHOLD, TRASHCAN_RADIUS};

/// Result of a car-vs-obstacle check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Index of the first obstacle hit
    pub obstacle: usize,
    /// Outward surface normal of the obstacle facing the car
    pub normal: Vec2,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            obstacle: 0,
            normal: Vec2::ZERO,
        }
    }
}

/// How hard a car struck a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
    /// Stop dead
    Hard,
    /// Scrape past
    Glancing,
}

/// Whether any car corner is inside the obstacle, or any obstacle corner inside the car
pub fn corners_hit_obstacle(corners: &[Vec2; 4], obstacle: &Obstacle) -> bool {
    corners.iter().any(|&c| obstacle.contains(c))
        || obstacle
            .corners()
            .iter()
            .any(|&c| point_in_convex_polygon(c, corners))
}

/// First obstacle overlapping the car box
pub fn check_obstacle_collision(
    center: Vec2,
    corners: &[Vec2; 4],
    obstacles: &[Obstacle],
) -> CollisionResult {
    obstacles
        .iter()
        .position(|o| corners_hit_obstacle(corners, o))
        .map_or_else(CollisionResult::miss, |index| CollisionResult {
            hit: true,
            obstacle: index,
            normal: obstacle_normal(&obstacles[index], center),
        })
}

/// Outward normal of the obstacle face nearest to `point`
pub fn obstacle_normal(obstacle: &Obstacle, point: Vec2) -> Vec2 {
    let min = obstacle.min();
    let max = obstacle.max();
    let closest = point.clamp(min, max);
    let outside = point - closest;
    if outside.length_squared() > f32::EPSILON {
        return outside.normalize();
    }

    // Center is inside: use the face with the least penetration
    let faces = [
        (point.x - min.x, Vec2::NEG_X),
        (max.x - point.x, Vec2::X),
        (point.y - min.y, Vec2::NEG_Y),
        (max.y - point.y, Vec2::Y),
    ];
    faces
        .into_iter()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map_or(Vec2::NEG_X, |(_, n)| n)
}

/// Angle between the velocity and the surface it strikes
///
/// 0 for a scrape along the surface, π/2 head-on. Velocities leaving
/// the surface report 0.
pub fn impact_angle(velocity: Vec2, normal: Vec2) -> f32 {
    let Some(dir) = velocity.try_normalize() else {
        return 0.0;
    };
    (-dir.dot(normal)).clamp(0.0, 1.0).asin()
}

/// Classify a hit; a car with no velocity into the surface counts as hard
pub fn classify_impact(velocity: Vec2, normal: Vec2) -> Impact {
    if velocity.length_squared() <= f32::EPSILON {
        return Impact::Hard;
    }
    if impact_angle(velocity, normal) > GLANCING_THRESHOLD {
        Impact::Hard
    } else {
        Impact::Glancing
    }
}

/// Reflect velocity off a surface with the given normal
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Separating axis test over the two boxes' local axes
///
/// Touching boxes (projections sharing only an endpoint) do not collide.
pub fn sat_overlap(a: &[Vec2; 4], b: &[Vec2; 4]) -> bool {
    let axes = [a[1] - a[0], a[2] - a[1], b[1] - b[0], b[2] - b[1]];
    axes.iter().all(|&axis| {
        let (min_a, max_a) = project(a, axis);
        let (min_b, max_b) = project(b, axis);
        !(max_a <= min_b || max_b <= min_a)
    })
}

fn project(corners: &[Vec2; 4], axis: Vec2) -> (f32, f32) {
    corners
        .iter()
        .map(|c| c.dot(axis))
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p), hi.max(p))
        })
}

/// Whether the car box strikes an object's footprint
pub fn object_struck(corners: &[Vec2; 4], object: &InteractiveObject) -> bool {
    let corner_inside = match object.kind {
        ObjectKind::Mailbox => {
            let footprint = object.footprint();
            corners
                .iter()
                .any(|&c| point_in_convex_polygon(c, &footprint))
        }
        ObjectKind::Trashcan => corners
            .iter()
            .any(|c| c.distance(object.pos) <= TRASHCAN_RADIUS),
    };
    corner_inside || point_in_convex_polygon(object.pos, corners)
}
