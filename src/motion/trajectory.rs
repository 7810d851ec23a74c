// src/motion/trajectory.rs
/// Trajectory state machine
///
/// Consumes instructions from a non-blocking source and turns them into a
/// time-parameterized target position and velocity. Instant instructions
/// (speed, pen) are acknowledged as soon as they are applied; timed ones
/// (waypoint, delay, auto-home) are acknowledged when their segment ends.
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::comms::{AckSink, CommsError, InstructionSource, Pull};
use crate::instruction::{self, Instruction, PenMode, Speed, Waypoint, HOME, HOME_SPEED};
use crate::math::Vec2;

#[derive(Debug, Error)]
pub enum TrajectoryError {
    #[error("Cannot move from {from:?} to {to:?} while speed is 0")]
    Feasibility { from: Waypoint, to: Waypoint },
    #[error(transparent)]
    Comms(#[from] CommsError),
}

/// Whether the instruction source can still produce instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Open,
    Closed,
}

#[derive(Debug, Clone)]
pub struct TrajectoryStateMachine {
    /// Start of the current segment
    last: Waypoint,

    /// End of the current segment
    next: Waypoint,

    /// When the current segment started
    segment_start: Instant,

    /// Zero means holding at `last`
    segment_duration: Duration,

    /// Current traversal speed
    speed: Speed,

    pen_mode: PenMode,

    /// A timed instruction is in flight and still owes an acknowledgement
    has_active_instruction: bool,

    /// Time of the latest `update`, used by the queries
    current_time: Instant,
}

impl TrajectoryStateMachine {
    pub fn new(at: Waypoint, now: Instant) -> Self {
        Self {
            last: at,
            next: at,
            segment_start: now,
            segment_duration: Duration::ZERO,
            speed: Speed(0.0),
            pen_mode: PenMode::Up,
            has_active_instruction: false,
            current_time: now,
        }
    }

    /// Hold at `to` with zero speed, pen up and nothing in flight.
    pub fn reset(&mut self, to: Waypoint, now: Instant) {
        *self = Self::new(to, now);
    }

    /// Advance the machine to `now`, pulling instructions as needed.
    pub fn update<S, A>(
        &mut self,
        now: Instant,
        source: &mut S,
        sink: &mut A,
    ) -> Result<SourceState, TrajectoryError>
    where
        S: InstructionSource + ?Sized,
        A: AckSink,
    {
        self.current_time = now;
        let elapsed = now.saturating_duration_since(self.segment_start);
        if elapsed < self.segment_duration && !self.segment_duration.is_zero() {
            return Ok(SourceState::Open);
        }

        if self.has_active_instruction {
            self.has_active_instruction = false;
            sink.acknowledge()?;
        }
        self.last = self.next;
        self.segment_start = now;
        self.segment_duration = Duration::ZERO;

        loop {
            let ins = match source.try_pull() {
                Pull::Instruction(ins) => ins,
                Pull::Empty => return Ok(SourceState::Open),
                Pull::Closed => {
                    tracing::debug!("Instruction source closed");
                    return Ok(SourceState::Closed);
                }
            };
            tracing::debug!(?ins, "Consumed instruction");

            match ins {
                Instruction::Waypoint(target) => {
                    self.begin_move(target, sink)?;
                    return Ok(SourceState::Open);
                }
                Instruction::Delay(duration) => {
                    self.next = self.last;
                    self.segment_duration = duration;
                    self.has_active_instruction = true;
                    return Ok(SourceState::Open);
                }
                Instruction::AutoHome => {
                    self.speed = HOME_SPEED;
                    self.begin_move(HOME, sink)?;
                    return Ok(SourceState::Open);
                }
                Instruction::Speed(speed) => {
                    self.speed = speed;
                    sink.acknowledge()?;
                }
                Instruction::Pen(mode) => {
                    self.pen_mode = mode;
                    sink.acknowledge()?;
                }
            }
        }
    }

    fn begin_move<A: AckSink>(&mut self, target: Waypoint, sink: &mut A) -> Result<(), TrajectoryError> {
        if !instruction::possible(self.last, target, self.speed) {
            let err = TrajectoryError::Feasibility { from: self.last, to: target };
            tracing::error!("{}", err);
            sink.log(format!("Error: {}", err))?;
            return Err(err);
        }
        self.next = target;
        self.segment_duration = instruction::travel_time(self.last, self.next, self.speed);
        self.has_active_instruction = true;
        Ok(())
    }

    fn elapsed(&self) -> Duration {
        self.current_time.saturating_duration_since(self.segment_start)
    }

    /// Interpolated target. The parameter is not clamped, so it can run past
    /// `next` until the following `update` re-anchors the segment.
    pub fn target_position(&self) -> Waypoint {
        if self.segment_duration.is_zero() {
            return self.last;
        }
        let t = self.elapsed().as_secs_f64() / self.segment_duration.as_secs_f64();
        Vec2::from(self.last).lerp(Vec2::from(self.next), t).into()
    }

    pub fn target_velocity(&self) -> Vec2 {
        if self.segment_duration.is_zero()
            || self.elapsed() > self.segment_duration
            || self.last == self.next
        {
            return Vec2::ZERO;
        }
        Vec2::from(self.last)
            .to(Vec2::from(self.next))
            .unit()
            .scaled(self.speed.0)
    }

    pub fn pen_mode(&self) -> PenMode {
        self.pen_mode
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn last(&self) -> Waypoint {
        self.last
    }

    pub fn next(&self) -> Waypoint {
        self.next
    }

    pub fn segment_duration(&self) -> Duration {
        self.segment_duration
    }

    pub fn has_active_instruction(&self) -> bool {
        self.has_active_instruction
    }

    /// True while a segment is being interpolated.
    pub fn is_interpolating(&self) -> bool {
        !self.segment_duration.is_zero() && self.elapsed() < self.segment_duration
    }
}
