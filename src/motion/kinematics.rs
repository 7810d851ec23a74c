// src/motion/kinematics.rs
use std::f64::consts::FRAC_PI_2;

use crate::math::Vec2;

/// Forward step used to estimate joint velocities from Cartesian ones.
pub const IKV_EPSILON: f64 = 0.02;

/// Mapping between joint space and the Cartesian workspace
pub trait Kinematics {
    /// End effector position for the given joint angles.
    fn joints_to_cartesian(&self, joints: [f64; 2]) -> Vec2;

    /// Joint angles placing the end effector at `cartesian`. NaN when unreachable.
    fn cartesian_to_joints(&self, cartesian: Vec2) -> [f64; 2];

    /// Check if position is valid for this kinematics
    fn is_valid_position(&self, cartesian: Vec2) -> bool;
}

/// Joint positions of the two-link linkage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joints {
    pub roots: [Vec2; 2],
    pub elbows: [Vec2; 2],
    pub end_effector: Vec2,
}

/// Closed five-bar linkage: two shoulder motors `spread` apart, each with an
/// inner link to an elbow, and two outer links meeting at the end effector.
///
/// A joint angle of zero points the inner link straight up; positive angles
/// rotate counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoLinkGeometry {
    pub inner_length: f64,
    pub outer_length: f64,
    pub spread: f64,
}

impl TwoLinkGeometry {
    pub fn roots(&self) -> [Vec2; 2] {
        let half = Vec2::new(self.spread / 2.0, 0.0);
        [-half, half]
    }

    /// Forward kinematics. The end effector is NaN when the elbows are more
    /// than two outer lengths apart.
    pub fn joints(&self, left_angle: f64, right_angle: f64) -> Joints {
        let [left_root, right_root] = self.roots();
        let left = Vec2::UP.rotated(left_angle).scaled(self.inner_length) + left_root;
        let right = Vec2::UP.rotated(right_angle).scaled(self.inner_length) + right_root;

        let mid = (left + right).scaled(0.5);
        let half_separation = (left - mid).len();
        let height = (self.outer_length.powi(2) - half_separation.powi(2)).sqrt();
        let end_effector = mid + (left - right).rotated(-FRAC_PI_2).unit().scaled(height);

        Joints {
            roots: [left_root, right_root],
            elbows: [left, right],
            end_effector,
        }
    }

    /// Inverse kinematics via the law of cosines on each side.
    pub fn ik(&self, to: Vec2) -> (f64, f64) {
        let [left_root, right_root] = self.roots();
        let left_dist = (to - left_root).len();
        let right_dist = (to - right_root).len();
        let left_inner = cosine_angle(self.outer_length, left_dist, self.inner_length);
        let right_inner = -cosine_angle(self.outer_length, right_dist, self.inner_length);
        let left = left_inner - (FRAC_PI_2 - left_root.to(to).angle());
        let right = right_inner - (FRAC_PI_2 - right_root.to(to).angle());
        (left, right)
    }

    /// Joint angular velocities for moving the end effector at `velocity`
    /// from `at`, by forward difference over `IKV_EPSILON`.
    pub fn ikv(&self, at: Vec2, velocity: Vec2) -> (f64, f64) {
        let (left, right) = self.ik(at);
        let (left_ahead, right_ahead) = self.ik(at + velocity.scaled(IKV_EPSILON));
        (
            (left_ahead - left) / IKV_EPSILON,
            (right_ahead - right) / IKV_EPSILON,
        )
    }
}

impl Kinematics for TwoLinkGeometry {
    fn joints_to_cartesian(&self, joints: [f64; 2]) -> Vec2 {
        self.joints(joints[0], joints[1]).end_effector
    }

    fn cartesian_to_joints(&self, cartesian: Vec2) -> [f64; 2] {
        let (left, right) = self.ik(cartesian);
        [left, right]
    }

    fn is_valid_position(&self, cartesian: Vec2) -> bool {
        let min = (self.outer_length - self.inner_length).abs();
        let max = self.outer_length + self.inner_length;
        self.roots().iter().all(|root| {
            let d = (cartesian - *root).len();
            d >= min && d <= max
        })
    }
}

/// Angle opposite side `a` in a triangle with sides `a`, `b`, `c`.
fn cosine_angle(a: f64, b: f64, c: f64) -> f64 {
    ((b * b + c * c - a * a) / (2.0 * b * c)).acos()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEOMETRY: TwoLinkGeometry = TwoLinkGeometry {
        inner_length: 7.0,
        outer_length: 8.0,
        spread: 2.0,
    };

    #[test]
    fn test_symmetric_pose_is_centered() {
        let joints = GEOMETRY.joints(0.3, -0.3);
        assert!(joints.end_effector.x.abs() < 1e-12);
        assert!(joints.end_effector.y > joints.elbows[0].y);
    }

    #[test]
    fn test_ik_of_centerline_is_symmetric() {
        let (left, right) = GEOMETRY.ik(Vec2::new(0.0, 10.0));
        assert!((left + right).abs() < 1e-12);
        assert!(left > 0.0);
    }

    #[test]
    fn test_cosine_angle_right_triangle() {
        let angle = cosine_angle(5.0, 3.0, 4.0);
        assert!((angle - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_unreachable_target_is_nan() {
        let (left, right) = GEOMETRY.ik(Vec2::new(0.0, 100.0));
        assert!(left.is_nan() && right.is_nan());
        assert!(!GEOMETRY.is_valid_position(Vec2::new(0.0, 100.0)));
        assert!(GEOMETRY.is_valid_position(Vec2::new(0.0, 10.0)));
    }
}
