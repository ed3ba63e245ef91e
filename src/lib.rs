//! Night Patrol - top-down night police driving game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (roads, lighting, vehicle physics, debris)
//! - `settings`: Quality presets and gameplay toggles
//! - `error`: Load errors for settings and scene files

pub mod error;
pub mod settings;
pub mod sim;

pub use error::LoadError;
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Game configuration constants
///
/// Everything per-tick assumes the fixed 60 Hz update rate.
pub mod consts {
    use std::f32::consts::{FRAC_PI_6, PI};

    /// Fixed simulation rate
    pub const TICKS_PER_SECOND: u32 = 60;

    /// Speed magnitude below which speed snaps to exactly zero
    pub const SPEED_EPSILON: f32 = 0.01;
    /// Slide velocity decay per tick
    pub const SLIDE_DECAY: f32 = 0.9;
    /// Slide component magnitude below which it snaps to zero
    pub const SLIDE_EPSILON: f32 = 0.01;
    /// Forward cap multiplier while boosting
    pub const BOOST_MULTIPLIER: f32 = 2.5;

    /// Steering dampening window after a high-speed steer input begins
    pub const STEER_DAMPEN_SPEED_RATIO: f32 = 0.7;
    pub const STEER_DAMPEN_TICKS: u32 = 8;
    pub const STEER_DAMPEN_FACTOR: f32 = 0.3;

    /// Collision box growth sideways (added to width)
    pub const COLLISION_WIDTH_BUFFER: f32 = 4.0;
    /// Collision box change lengthwise (added to height, shrinks it)
    pub const COLLISION_HEIGHT_BUFFER: f32 = -10.0;

    /// Impact angle (measured from the surface) above which a hit is hard
    pub const GLANCING_THRESHOLD: f32 = FRAC_PI_6;
    /// Reflected velocity keeps this fraction
    pub const GLANCING_VELOCITY_DAMPING: f32 = 0.8;
    /// Scalar speed keeps this fraction after a glancing blow
    pub const GLANCING_SPEED_DAMPING: f32 = 0.85;
    /// Push away from the obstacle center after a glancing blow
    pub const GLANCING_PUSH: f32 = 2.0;
    /// Heading nudge per unit of tangential impact velocity
    pub const GLANCING_NUDGE: f32 = 0.02;
    /// Spark bursts at most once per 200 ms
    pub const SPARK_COOLDOWN_TICKS: u64 = 12;

    /// Car-to-car restitution
    pub const CAR_RESTITUTION: f32 = 0.3;
    /// Minimum center distance enforced between touching cars
    pub const CAR_MIN_SEPARATION: f32 = 90.0;
    /// Scalar speed keeps this fraction after a car impact
    pub const CAR_IMPACT_SPEED_FACTOR: f32 = 0.5;
    /// Full range of the random heading jitter on a struck car
    pub const CAR_HEADING_JITTER: f32 = 0.4;

    /// Combined speed required to knock over an interactive object
    pub const STRIKE_MIN_SPEED: f32 = 0.5;
    /// Objects further than this from the car center are not tested
    pub const STRIKE_PROXIMITY: f32 = 80.0;
    /// Mailbox footprint (post plus box), relative to its anchor
    pub const MAILBOX_HALF_WIDTH: f32 = 4.0;
    pub const MAILBOX_TOP: f32 = -10.0;
    pub const MAILBOX_BOTTOM: f32 = 2.0;
    /// Trashcan footprint radius
    pub const TRASHCAN_RADIUS: f32 = 9.0;

    /// Lane assist capture radius around a lane center
    pub const LANE_CAPTURE_RADIUS: f32 = 40.0;
    /// Ticks a car must dwell in a lane before assist engages
    pub const LANE_DWELL_TICKS: u32 = 60;
    /// Lookahead used to turn lateral offset into a correction angle
    pub const LANE_LOOKAHEAD: f32 = 100.0;
    /// Max heading deviation from the road (either direction) for assist
    pub const LANE_ALIGNMENT: f32 = FRAC_PI_6;
    /// Blend gain applied to the assist correction each tick
    pub const LANE_ASSIST_GAIN: f32 = 0.08;
    /// Assist only acts on cars moving faster than this
    pub const LANE_ASSIST_MIN_SPEED: f32 = 0.5;

    /// AI pursuit heading blend per tick
    pub const PURSUIT_GAIN: f32 = 0.05;
    /// AI throttles while further than this from its target
    pub const PURSUIT_FAR: f32 = 150.0;
    /// AI brakes toward zero while closer than this
    pub const PURSUIT_NEAR: f32 = 120.0;

    /// Debris decay per tick
    pub const DEBRIS_VELOCITY_DECAY: f32 = 0.98;
    pub const DEBRIS_SPIN_DECAY: f32 = 0.99;
    /// Spark lifetime in ticks
    pub const SPARK_LIFETIME: u32 = 20;

    /// Edge extraction margin around the viewport
    pub const EDGE_MARGIN: f32 = 600.0;
    /// Default ray reach
    pub const RAY_MAX_DISTANCE: f32 = 1000.0;
    /// Near-parallel tolerance for ray/segment tests
    pub const RAY_PARALLEL_EPSILON: f32 = 1e-4;
    /// Near-parallel tolerance for segment/segment tests
    pub const SEGMENT_PARALLEL_EPSILON: f32 = 1e-3;
    /// Consecutive hit points further apart than this get no glint line
    pub const GLINT_MAX_GAP: f32 = 20.0;

    /// Light sources
    pub const HEADLIGHT_FORWARD: f32 = 35.0;
    pub const HEADLIGHT_LATERAL: f32 = 10.0;
    pub const HEADLIGHT_REACH: f32 = 400.0;
    pub const HEADLIGHT_HALF_ANGLE: f32 = PI / 2.5;
    pub const HEADLIGHT_SPREAD_NARROW: f32 = PI / 3.0;
    pub const HEADLIGHT_SPREAD_WIDE: f32 = PI / 1.5;
    pub const STREETLIGHT_REACH: f32 = 250.0;
    pub const SPOTLIGHT_REACH: f32 = 600.0;
    pub const SPOTLIGHT_HALF_ANGLE: f32 = PI / 18.0;
    pub const SPOTLIGHT_SPREAD: f32 = PI / 10.0;
    pub const SPOTLIGHT_RAYS: usize = 50;
    /// Spotlight mount sits this far forward of the car center
    pub const SPOTLIGHT_FORWARD: f32 = 10.0;
    /// Cone origin sits this far behind the spotlight mount
    pub const SPOTLIGHT_CONE_BACKSET: f32 = 10.0;
    pub const SIREN_RAYS: usize = 100;

    /// Intersection proximity used for path meetings and "at intersection"
    pub const INTERSECTION_PROXIMITY: f32 = 150.0;
    /// Samples per bezier segment for path scans and closest-point queries
    pub const BEZIER_SAMPLES: usize = 20;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Unit vector pointing along a heading angle
#[inline]
pub fn heading_vector(angle: f32) -> Vec2 {
    polar_to_cartesian(1.0, angle)
}

/// Left-hand normal of a heading angle, i.e. the heading rotated +90°
#[inline]
pub fn left_normal(angle: f32) -> Vec2 {
    Vec2::new(-angle.sin(), angle.cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_wraps() {
        // An odd multiple of π lands on either side of the cut depending on rounding
        assert!((normalize_angle(3.0 * PI).abs() - PI).abs() < 1e-5);
        assert!((normalize_angle(-2.75 * PI) + 0.75 * PI).abs() < 1e-5);
        assert!((normalize_angle(7.0) - (7.0 - 2.0 * PI)).abs() < 1e-5);
        assert!((normalize_angle(-PI / 2.0) + PI / 2.0).abs() < 1e-6);
        assert!((normalize_angle(2.5 * PI) - PI / 2.0).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn test_normalize_angle_range(angle in -100.0f32..100.0) {
            let wrapped = normalize_angle(angle);
            prop_assert!((-PI..=PI).contains(&wrapped));
            // Same direction as the input
            prop_assert!((heading_vector(wrapped) - heading_vector(angle)).length() < 1e-3);
        }
    }

    #[test]
    fn test_left_normal_is_perpendicular() {
        let a = 0.7;
        assert!(heading_vector(a).dot(left_normal(a)).abs() < 1e-6);
        // Heading 0 → left normal +y
        assert!((left_normal(0.0) - Vec2::Y).length() < 1e-6);
    }
}
