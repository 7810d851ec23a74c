// src/lib.rs - Simulated pen plotter: instruction-driven trajectories and motion control
pub mod comms;
pub mod config;
pub mod instruction;
pub mod math;
pub mod motion;
pub mod plotter;
pub mod scheduler;

pub use comms::{AckSink, InstructionSource, Pull, Telemetry};
pub use config::{ConfigError, RobotConfig, RobotLibrary};
pub use instruction::{Instruction, PenMode, Speed, Waypoint};
pub use math::Vec2;
pub use motion::{MotionController, TrajectoryStateMachine};
pub use plotter::{Plotter, PlotterError, TickReport};
