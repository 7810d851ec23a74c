// src/motion/controller.rs - Motion controller contract and the shared tracking law
use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Something that tracks a moving target with a physical end effector.
pub trait MotionController: Send {
    /// Advance the controller by `dt` seconds toward `target`, which is itself
    /// moving at `target_velocity`.
    fn update(&mut self, target: Vec2, target_velocity: Vec2, dt: f64);

    fn end_effector_position(&self) -> Vec2;

    /// Geometry for whoever draws the robot.
    fn pose(&self) -> Pose;
}

/// Renderable snapshot of a controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Pose {
    Point { position: Vec2 },
    Linkage {
        roots: [Vec2; 2],
        elbows: [Vec2; 2],
        end_effector: Vec2,
    },
}

/// Gains of the acceleration-limited tracking law:
///
/// ```text
/// desired = target_velocity + (target - position) * homing_factor
/// accel   = (desired - velocity) * acceleration_multiplier, clamped to max_acceleration
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingGains {
    pub homing_factor: f64,
    pub acceleration_multiplier: f64,
    pub max_acceleration: f64,
}

impl TrackingGains {
    /// Feed-forward velocity plus a proportional correction of the position error.
    pub fn desired_velocity(&self, target: Vec2, position: Vec2, target_velocity: Vec2) -> Vec2 {
        target_velocity + (target - position).scaled(self.homing_factor)
    }

    /// Acceleration toward `desired`, limited in magnitude.
    pub fn acceleration(&self, desired: Vec2, velocity: Vec2) -> Vec2 {
        (desired - velocity)
            .scaled(self.acceleration_multiplier)
            .clamp_len(self.max_acceleration)
    }
}
