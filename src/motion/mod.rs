// src/motion/mod.rs - Trajectory generation and motion controllers
pub mod cartesian;
pub mod controller;
pub mod kinematics;
pub mod trajectory;
pub mod two_link_arm;

pub use cartesian::CartesianActuator;
pub use controller::{MotionController, Pose, TrackingGains};
pub use kinematics::{Joints, Kinematics, TwoLinkGeometry};
pub use trajectory::{SourceState, TrajectoryError, TrajectoryStateMachine};
pub use two_link_arm::TwoLinkArm;
