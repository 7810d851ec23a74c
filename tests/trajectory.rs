// Integration tests for the trajectory state machine

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use plotter_sim::comms::Telemetry;
use plotter_sim::instruction::{possible, travel_time};
use plotter_sim::motion::{SourceState, TrajectoryError};
use plotter_sim::{Instruction, PenMode, Speed, TrajectoryStateMachine, Vec2, Waypoint};
use proptest::prelude::*;
use tokio::sync::mpsc;

fn consumed(acks: &[Telemetry]) -> usize {
    acks.iter().filter(|t| **t == Telemetry::Consumed).count()
}

#[test]
fn test_instant_instructions_ack_in_one_update() {
    let t0 = Instant::now();
    let start = Waypoint::new(0.0, 8.0);
    let mut sm = TrajectoryStateMachine::new(start, t0);
    let mut src: VecDeque<Instruction> = VecDeque::from(vec![
        Instruction::Speed(Speed(3.0)),
        Instruction::Pen(PenMode::Down),
        Instruction::Speed(Speed(4.0)),
        Instruction::Pen(PenMode::Up),
    ]);
    let mut acks = Vec::new();

    let state = sm.update(t0, &mut src, &mut acks).unwrap();
    assert_eq!(state, SourceState::Open);
    assert_eq!(acks, vec![Telemetry::Consumed; 4]);
    assert_eq!(sm.last(), sm.next());
    assert_eq!(sm.target_position(), start);
    assert_eq!(sm.speed(), Speed(4.0));
    assert_eq!(sm.pen_mode(), PenMode::Up);
    assert!(!sm.has_active_instruction());
}

#[test]
fn test_single_waypoint_segment() {
    let t0 = Instant::now();
    let mut sm = TrajectoryStateMachine::new(Waypoint::new(0.0, 0.0), t0);
    let mut src: VecDeque<Instruction> = VecDeque::from(vec![
        Instruction::Speed(Speed(2.0)),
        Instruction::Waypoint(Waypoint::new(3.0, 4.0)),
    ]);
    let mut acks = Vec::new();

    sm.update(t0, &mut src, &mut acks).unwrap();
    assert_eq!(sm.segment_duration(), Duration::from_millis(2500));
    assert_eq!(consumed(&acks), 1);

    sm.update(t0 + Duration::from_millis(1250), &mut src, &mut acks).unwrap();
    let mid = sm.target_position();
    assert!((mid.x - 1.5).abs() < 1e-9 && (mid.y - 2.0).abs() < 1e-9);
    let v = sm.target_velocity();
    assert!((v.x - 1.2).abs() < 1e-9 && (v.y - 1.6).abs() < 1e-9);
    assert_eq!(consumed(&acks), 1);

    sm.update(t0 + Duration::from_millis(2500), &mut src, &mut acks).unwrap();
    assert_eq!(consumed(&acks), 2);
    assert_eq!(sm.target_position(), Waypoint::new(3.0, 4.0));
    assert_eq!(sm.target_velocity(), Vec2::ZERO);
}

#[test]
fn test_every_consumed_instruction_is_acked_once() {
    let program = vec![
        Instruction::Speed(Speed(5.0)),
        Instruction::Pen(PenMode::Down),
        Instruction::Waypoint(Waypoint::new(1.0, 8.0)),
        Instruction::Delay(Duration::from_millis(100)),
        Instruction::Waypoint(Waypoint::new(1.0, 9.0)),
        Instruction::Pen(PenMode::Up),
        Instruction::AutoHome,
        Instruction::Speed(Speed(1.0)),
    ];
    let total = program.len();
    let t0 = Instant::now();
    let mut sm = TrajectoryStateMachine::new(Waypoint::new(0.0, 8.0), t0);
    let mut src: VecDeque<Instruction> = program.into();
    let mut acks = Vec::new();

    let tick = Duration::from_millis(10);
    for i in 0..2000u32 {
        sm.update(t0 + tick * i, &mut src, &mut acks).unwrap();
        let pulled = total - src.len();
        let in_flight = usize::from(sm.has_active_instruction());
        assert_eq!(consumed(&acks) + in_flight, pulled);
    }
    assert!(src.is_empty());
    assert_eq!(consumed(&acks), total);
    assert_eq!(sm.last(), Waypoint::new(0.0, 10.0));
}

#[test]
fn test_closed_channel_reports_closed() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send(Instruction::Pen(PenMode::Down)).unwrap();
    drop(tx);

    let t0 = Instant::now();
    let mut sm = TrajectoryStateMachine::new(Waypoint::new(0.0, 8.0), t0);
    let mut acks = Vec::new();
    let state = sm.update(t0, &mut rx, &mut acks).unwrap();
    assert_eq!(state, SourceState::Closed);
    assert_eq!(acks, vec![Telemetry::Consumed]);
}

#[test]
fn test_acks_flow_through_bounded_channel() {
    let (ins_tx, mut ins_rx) = mpsc::channel(4);
    let (mut ack_tx, mut ack_rx) = mpsc::channel(4);
    ins_tx.try_send(Instruction::Speed(Speed(1.0))).unwrap();
    ins_tx.try_send(Instruction::Pen(PenMode::Down)).unwrap();

    let t0 = Instant::now();
    let mut sm = TrajectoryStateMachine::new(Waypoint::new(0.0, 8.0), t0);
    let state = sm.update(t0, &mut ins_rx, &mut ack_tx).unwrap();
    assert_eq!(state, SourceState::Open);
    assert_eq!(ack_rx.try_recv().unwrap(), Telemetry::Consumed);
    assert_eq!(ack_rx.try_recv().unwrap(), Telemetry::Consumed);
    assert!(ack_rx.try_recv().is_err());
}

#[test]
fn test_sink_closed_is_an_error() {
    let (mut ack_tx, ack_rx) = mpsc::channel::<Telemetry>(1);
    drop(ack_rx);
    let t0 = Instant::now();
    let mut sm = TrajectoryStateMachine::new(Waypoint::new(0.0, 8.0), t0);
    let mut src = VecDeque::from(vec![Instruction::Pen(PenMode::Down)]);
    let err = sm.update(t0, &mut src, &mut ack_tx).unwrap_err();
    assert!(matches!(err, TrajectoryError::Comms(_)));
}

#[test]
fn test_infeasible_move_logs_before_failing() {
    let t0 = Instant::now();
    let mut sm = TrajectoryStateMachine::new(Waypoint::new(0.0, 8.0), t0);
    let mut src = VecDeque::from(vec![
        Instruction::Pen(PenMode::Down),
        Instruction::Waypoint(Waypoint::new(1.0, 8.0)),
    ]);
    let mut acks = Vec::new();
    let err = sm.update(t0, &mut src, &mut acks).unwrap_err();
    assert!(matches!(err, TrajectoryError::Feasibility { .. }));
    assert_eq!(acks.len(), 2);
    assert_eq!(acks[0], Telemetry::Consumed);
    match &acks[1] {
        Telemetry::Log { message } => assert!(message.starts_with("Error:")),
        other => panic!("unexpected {:?}", other),
    }
}

proptest! {
    #[test]
    fn prop_possible_needs_speed_unless_stationary(
        x0 in -10.0f64..10.0, y0 in -10.0f64..10.0,
        x1 in -10.0f64..10.0, y1 in -10.0f64..10.0,
        speed in 0.0f64..10.0,
    ) {
        let a = Waypoint::new(x0, y0);
        let b = Waypoint::new(x1, y1);
        prop_assert_eq!(possible(a, b, Speed(speed)), a == b || speed > 0.0);
        prop_assert!(possible(a, a, Speed(0.0)));
    }

    #[test]
    fn prop_travel_time_covers_distance(
        x0 in -10.0f64..10.0, y0 in -10.0f64..10.0,
        x1 in -10.0f64..10.0, y1 in -10.0f64..10.0,
        speed in 0.1f64..10.0,
    ) {
        let a = Waypoint::new(x0, y0);
        let b = Waypoint::new(x1, y1);
        let covered = travel_time(a, b, Speed(speed)).as_secs_f64() * speed;
        prop_assert!((covered - a.distance(&b)).abs() < 1e-6);
    }
}
