// src/motion/cartesian.rs - Direct Cartesian actuator
use crate::math::Vec2;
use crate::motion::controller::{MotionController, Pose, TrackingGains};

/// End effector driven directly in workspace coordinates.
#[derive(Debug, Clone)]
pub struct CartesianActuator {
    position: Vec2,
    velocity: Vec2,
    gains: TrackingGains,
}

impl CartesianActuator {
    pub fn new(start: Vec2, gains: TrackingGains) -> Self {
        Self {
            position: start,
            velocity: Vec2::ZERO,
            gains,
        }
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }
}

impl MotionController for CartesianActuator {
    fn update(&mut self, target: Vec2, target_velocity: Vec2, dt: f64) {
        let desired = self.gains.desired_velocity(target, self.position, target_velocity);
        let accel = self.gains.acceleration(desired, self.velocity);
        self.velocity += accel.scaled(dt);
        self.position += self.velocity.scaled(dt);
    }

    fn end_effector_position(&self) -> Vec2 {
        self.position
    }

    fn pose(&self) -> Pose {
        Pose::Point { position: self.position }
    }
}
