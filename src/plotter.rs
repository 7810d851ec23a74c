// src/plotter.rs - Control loop tying the state machine to a motion controller
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

use crate::comms::{AckSink, InstructionSource};
use crate::instruction::{Instruction, PenMode, Waypoint};
use crate::math::Vec2;
use crate::motion::{MotionController, Pose, SourceState, TrajectoryError, TrajectoryStateMachine};
use crate::scheduler::TimeInterface;

#[derive(Debug, Error)]
pub enum PlotterError {
    #[error("Trajectory error: {0}")]
    Trajectory(#[from] TrajectoryError),
}

/// Everything a renderer or path recorder needs from one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    pub tick: u64,
    /// Seconds since the plotter was created
    pub time: f64,
    pub target_position: Waypoint,
    pub target_velocity: Vec2,
    pub end_effector: Vec2,
    pub pen_mode: PenMode,
    pub pose: Pose,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub report: TickReport,
    pub source: SourceState,
}

pub struct Plotter<T: TimeInterface> {
    state_machine: TrajectoryStateMachine,
    controller: Box<dyn MotionController>,
    clock: Arc<T>,
    tick_interval: Duration,
    started: Instant,
    last_tick: Instant,
    ticks: u64,
}

impl<T: TimeInterface> Plotter<T> {
    pub fn new(
        start: Waypoint,
        controller: Box<dyn MotionController>,
        clock: Arc<T>,
        tick_interval: Duration,
    ) -> Self {
        let now = clock.now_monotonic();
        Self {
            state_machine: TrajectoryStateMachine::new(start, now),
            controller,
            clock,
            tick_interval,
            started: now,
            last_tick: now,
            ticks: 0,
        }
    }

    pub fn state_machine(&self) -> &TrajectoryStateMachine {
        &self.state_machine
    }

    pub fn controller(&self) -> &dyn MotionController {
        self.controller.as_ref()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// One control step: update the target, then let the controller chase it.
    pub fn tick<S, A>(&mut self, source: &mut S, sink: &mut A) -> Result<Tick, PlotterError>
    where
        S: InstructionSource + ?Sized,
        A: AckSink,
    {
        let now = self.clock.now_monotonic();
        let dt = now.saturating_duration_since(self.last_tick).as_secs_f64();
        self.last_tick = now;

        let source_state = self.state_machine.update(now, source, sink)?;
        let target = self.state_machine.target_position();
        let target_velocity = self.state_machine.target_velocity();
        self.controller.update(target.into(), target_velocity, dt);

        self.ticks += 1;
        let report = TickReport {
            tick: self.ticks,
            time: now.saturating_duration_since(self.started).as_secs_f64(),
            target_position: target,
            target_velocity,
            end_effector: self.controller.end_effector_position(),
            pen_mode: self.state_machine.pen_mode(),
            pose: self.controller.pose(),
        };
        tracing::trace!(?report, "Tick");
        Ok(Tick { report, source: source_state })
    }

    /// Tick at the configured rate until the source closes or a fatal error occurs.
    pub fn run<S, A, F>(&mut self, source: &mut S, sink: &mut A, mut on_tick: F) -> Result<(), PlotterError>
    where
        S: InstructionSource + ?Sized,
        A: AckSink,
        F: FnMut(&TickReport),
    {
        tracing::info!("Control loop running at {:?} per tick", self.tick_interval);
        loop {
            let started = self.clock.now_monotonic();
            let tick = self.tick(source, sink)?;
            on_tick(&tick.report);
            if tick.source == SourceState::Closed {
                tracing::info!("Instruction source closed after {} ticks", self.ticks);
                return Ok(());
            }
            let spent = self.clock.now_monotonic().saturating_duration_since(started);
            self.clock.sleep(self.tick_interval.saturating_sub(spent));
        }
    }

    /// Keep ticking with no new instructions so the controller can finish tracking.
    pub fn settle<A, F>(&mut self, ticks: u64, sink: &mut A, mut on_tick: F) -> Result<(), PlotterError>
    where
        A: AckSink,
        F: FnMut(&TickReport),
    {
        let mut idle: VecDeque<Instruction> = VecDeque::new();
        for _ in 0..ticks {
            self.clock.sleep(self.tick_interval);
            let tick = self.tick(&mut idle, sink)?;
            on_tick(&tick.report);
        }
        Ok(())
    }
}
