// src/math.rs - Small numeric helpers shared by the state machine and controllers
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Clamp `x` into `[min, max]`.
pub fn clamp(x: f64, min: f64, max: f64) -> f64 {
    if x < min {
        min
    } else if x > max {
        max
    } else {
        x
    }
}

/// Symmetric clamp into `[-bound, bound]`.
pub fn clamps(x: f64, bound: f64) -> f64 {
    clamp(x, -bound, bound)
}

/// Linear interpolation. `t` is not clamped.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// 2D vector in workspace units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const UP: Vec2 = Vec2 { x: 0.0, y: 1.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn len(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn scaled(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k)
    }

    /// Unit vector in the same direction; the zero vector stays zero.
    pub fn unit(self) -> Self {
        let len = self.len();
        if len == 0.0 {
            return Self::ZERO;
        }
        self.scaled(1.0 / len)
    }

    /// Counter-clockwise rotation by `angle` radians.
    pub fn rotated(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Polar angle in radians.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Vector from `self` to `other`.
    pub fn to(self, other: Vec2) -> Self {
        other - self
    }

    pub fn lerp(self, other: Vec2, t: f64) -> Self {
        Self::new(lerp(self.x, other.x, t), lerp(self.y, other.y, t))
    }

    /// Rescale to `max` length if longer, keeping the direction.
    pub fn clamp_len(self, max: f64) -> Self {
        if self.len() > max {
            self.unit().scaled(max)
        } else {
            self
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        self.scaled(rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_clamps_is_symmetric() {
        assert_eq!(clamps(5.0, 2.0), 2.0);
        assert_eq!(clamps(-5.0, 2.0), -2.0);
        assert_eq!(clamps(1.5, 2.0), 1.5);
    }

    #[test]
    fn test_lerp_extrapolates() {
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
        assert_eq!(lerp(0.0, 10.0, 1.5), 15.0);
    }

    #[test]
    fn test_rotate_up_vector() {
        let v = Vec2::UP.rotated(PI / 2.0);
        assert!((v.x + 1.0).abs() < 1e-12);
        assert!(v.y.abs() < 1e-12);
    }

    #[test]
    fn test_clamp_len_keeps_direction() {
        let v = Vec2::new(30.0, 40.0).clamp_len(5.0);
        assert!((v.x - 3.0).abs() < 1e-12);
        assert!((v.y - 4.0).abs() < 1e-12);
        assert_eq!(Vec2::new(1.0, 0.0).clamp_len(5.0), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_unit_of_zero_is_zero() {
        assert_eq!(Vec2::ZERO.unit(), Vec2::ZERO);
    }
}
