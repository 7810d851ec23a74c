// src/instruction/mod.rs - Motion instruction model
pub mod parser;

use crate::math::Vec2;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use parser::{JCodeError, JCodeParser, JCodeSpan};

/// Speed applied by `AutoHome`, in units/second.
pub const HOME_SPEED: Speed = Speed(1.0);

/// Target of `AutoHome`.
pub const HOME: Waypoint = Waypoint { x: 0.0, y: 10.0 };

/// A point in the workspace. Equality is exact.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
}

impl Waypoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Waypoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl From<Waypoint> for Vec2 {
    fn from(w: Waypoint) -> Self {
        Vec2::new(w.x, w.y)
    }
}

impl From<Vec2> for Waypoint {
    fn from(v: Vec2) -> Self {
        Waypoint::new(v.x, v.y)
    }
}

/// Traversal speed in units/second, never negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Speed(pub f64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PenMode {
    #[default]
    Up,
    Down,
}

/// One instruction from the instruction stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    /// Move to a point at the current speed.
    Waypoint(Waypoint),
    /// Change the traversal speed. Instant.
    Speed(Speed),
    /// Hold position for a fixed time.
    Delay(Duration),
    /// Raise or lower the pen. Instant.
    Pen(PenMode),
    /// Set `HOME_SPEED` and move to `HOME`.
    AutoHome,
}

impl Instruction {
    /// Timed instructions occupy a segment and are acknowledged when it completes.
    pub fn is_timed(&self) -> bool {
        matches!(
            self,
            Instruction::Waypoint(_) | Instruction::Delay(_) | Instruction::AutoHome
        )
    }
}

/// Whether `next` can be reached from `last` at `speed`.
pub fn possible(last: Waypoint, next: Waypoint, speed: Speed) -> bool {
    next == last || speed.0 > 0.0
}

/// Time to travel `last -> next` at `speed`. Zero when the points are equal.
///
/// Callers must check [`possible`] first.
pub fn travel_time(last: Waypoint, next: Waypoint, speed: Speed) -> Duration {
    if next == last {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(last.distance(&next) / speed.0).unwrap_or(Duration::MAX)
}
