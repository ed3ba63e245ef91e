//! Pursuit steering for AI cars
//!
//! AI cars turn toward their target with a fixed gain and pick a pedal
//! from a distance dead-band. Everything else (lane assist, collisions)
//! goes through the same physics step as the player.

use glam::Vec2;

use super::vehicle::{Controls, Pedal, Vehicle};
use crate::consts::{PURSUIT_FAR, PURSUIT_GAIN, PURSUIT_NEAR};

/// Turn `car` toward `target` and return the controls for this tick
pub fn pursue(car: &mut Vehicle, target: Vec2) -> Controls {
    let to_target = target - car.pos;
    let dist = to_target.length();
    if dist > 0.0 {
        car.blend_heading(to_target.y.atan2(to_target.x), PURSUIT_GAIN);
    }

    let pedal = if dist > PURSUIT_FAR {
        Pedal::Throttle
    } else if dist < PURSUIT_NEAR {
        Pedal::BrakeToStop
    } else {
        Pedal::Coast
    };

    Controls {
        pedal,
        steer: 0.0,
        boost: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::vehicle::VehicleId;
    use std::f32::consts::PI;

    #[test]
    fn test_pedal_dead_band() {
        let mut car = Vehicle::police(VehicleId(1), Vec2::ZERO);
        assert_eq!(pursue(&mut car, Vec2::new(300.0, 0.0)).pedal, Pedal::Throttle);
        assert_eq!(pursue(&mut car, Vec2::new(135.0, 0.0)).pedal, Pedal::Coast);
        assert_eq!(pursue(&mut car, Vec2::new(100.0, 0.0)).pedal, Pedal::BrakeToStop);
    }

    #[test]
    fn test_turns_by_fixed_fraction() {
        let mut car = Vehicle::police(VehicleId(1), Vec2::ZERO);
        pursue(&mut car, Vec2::new(0.0, 500.0));
        assert!((car.angle - PI / 2.0 * PURSUIT_GAIN).abs() < 1e-6);
    }

    #[test]
    fn test_turns_the_short_way() {
        let mut car = Vehicle::police(VehicleId(1), Vec2::ZERO);
        car.angle = PI - 0.1;
        // Target just below the -x axis: shortest turn is through π
        pursue(&mut car, Vec2::new(-500.0, -10.0));
        assert!(car.angle > PI - 0.1);
    }

    #[test]
    fn test_target_on_top_keeps_heading() {
        let mut car = Vehicle::police(VehicleId(1), Vec2::new(5.0, 5.0));
        car.angle = 1.0;
        let controls = pursue(&mut car, Vec2::new(5.0, 5.0));
        assert_eq!(car.angle, 1.0);
        assert_eq!(controls.pedal, Pedal::BrakeToStop);
        assert!(!controls.is_steering());
    }
}
