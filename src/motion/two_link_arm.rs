// src/motion/two_link_arm.rs - Two-link arm controlled through differential IK
use std::f64::consts::FRAC_PI_4;

use crate::math::{clamps, Vec2};
use crate::motion::controller::{MotionController, Pose, TrackingGains};
use crate::motion::kinematics::TwoLinkGeometry;

/// Joint angles used when the start point has no IK solution
pub const REST_ANGLES: (f64, f64) = (FRAC_PI_4, -FRAC_PI_4);

#[derive(Debug, Clone)]
pub struct TwoLinkArm {
    geometry: TwoLinkGeometry,
    gains: TrackingGains,
    /// Per-joint angular speed limit (rad/s)
    max_speed: f64,
    left_angle: f64,
    right_angle: f64,
    left_speed: f64,
    right_speed: f64,
}

impl TwoLinkArm {
    /// Arm at rest with its end effector on `start` when reachable, otherwise
    /// in the `REST_ANGLES` pose.
    pub fn new(geometry: TwoLinkGeometry, gains: TrackingGains, max_speed: f64, start: Vec2) -> Self {
        let (left, right) = geometry.ik(start);
        let (left_angle, right_angle) = if left.is_finite() && right.is_finite() {
            (left, right)
        } else {
            tracing::warn!(?start, "Start point unreachable, using rest pose");
            REST_ANGLES
        };
        Self {
            geometry,
            gains,
            max_speed,
            left_angle,
            right_angle,
            left_speed: 0.0,
            right_speed: 0.0,
        }
    }

    pub fn geometry(&self) -> &TwoLinkGeometry {
        &self.geometry
    }

    pub fn angles(&self) -> (f64, f64) {
        (self.left_angle, self.right_angle)
    }

    pub fn angular_speeds(&self) -> (f64, f64) {
        (self.left_speed, self.right_speed)
    }

    /// Integrate one joint: limit acceleration, then speed.
    fn step_joint(&self, angle: &mut f64, speed: &mut f64, desired: f64, dt: f64) {
        let accel = clamps(
            (desired - *speed) * self.gains.acceleration_multiplier,
            self.gains.max_acceleration,
        );
        *speed = clamps(*speed + accel * dt, self.max_speed);
        *angle += *speed * dt;
    }
}

impl MotionController for TwoLinkArm {
    fn update(&mut self, target: Vec2, target_velocity: Vec2, dt: f64) {
        let position = self.end_effector_position();
        let desired = self.gains.desired_velocity(target, position, target_velocity);

        let (mut left_desired, mut right_desired) = self.geometry.ikv(position, desired);
        if left_desired.is_nan() || right_desired.is_nan() {
            tracing::trace!(?target, "No IK solution, holding joint velocity at zero");
            left_desired = 0.0;
            right_desired = 0.0;
        }

        let (mut left_angle, mut left_speed) = (self.left_angle, self.left_speed);
        let (mut right_angle, mut right_speed) = (self.right_angle, self.right_speed);
        self.step_joint(&mut left_angle, &mut left_speed, left_desired, dt);
        self.step_joint(&mut right_angle, &mut right_speed, right_desired, dt);
        self.left_angle = left_angle;
        self.left_speed = left_speed;
        self.right_angle = right_angle;
        self.right_speed = right_speed;
    }

    fn end_effector_position(&self) -> Vec2 {
        self.geometry.joints(self.left_angle, self.right_angle).end_effector
    }

    fn pose(&self) -> Pose {
        let joints = self.geometry.joints(self.left_angle, self.right_angle);
        Pose::Linkage {
            roots: joints.roots,
            elbows: joints.elbows,
            end_effector: joints.end_effector,
        }
    }
}
