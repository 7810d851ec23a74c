// Benchmarks for inverse kinematics and jcode parsing
// Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};
use plotter_sim::Vec2;
use plotter_sim::instruction::JCodeParser;
use plotter_sim::motion::{MotionController, TrackingGains, TwoLinkArm, TwoLinkGeometry};
use std::f64::consts::PI;
use std::hint::black_box;

const GEOMETRY: TwoLinkGeometry = TwoLinkGeometry {
    inner_length: 7.0,
    outer_length: 8.0,
    spread: 2.0,
};

fn bench_ik(c: &mut Criterion) {
    c.bench_function("ik 1k points", |b| {
        b.iter(|| {
            for i in 0..1000 {
                let x = (i as f64 / 1000.0) * 4.0 - 2.0;
                black_box(GEOMETRY.ik(Vec2::new(x, 10.0)));
            }
        });
    });
    c.bench_function("ikv", |b| {
        b.iter(|| GEOMETRY.ikv(black_box(Vec2::new(0.5, 10.0)), black_box(Vec2::new(1.0, -0.5))));
    });
}

fn bench_arm_update(c: &mut Criterion) {
    let gains = TrackingGains {
        homing_factor: 2.0,
        acceleration_multiplier: 20.0,
        max_acceleration: PI,
    };
    let mut arm = TwoLinkArm::new(GEOMETRY, gains, 2.0 * PI, Vec2::new(0.0, 10.0));
    c.bench_function("arm update", |b| {
        b.iter(|| arm.update(black_box(Vec2::new(1.0, 10.5)), Vec2::ZERO, 1.0 / 60.0));
    });
}

fn bench_jcode_parser(c: &mut Criterion) {
    let mut src = String::new();
    for i in 0..10_000 {
        src.push_str(&format!("W {} {}; P D\n", i % 4, 8 + i % 4));
    }
    c.bench_function("parse 10k jcode lines", |b| {
        b.iter(|| {
            let count = JCodeParser::new(&src).filter(|r| r.is_ok()).count();
            assert_eq!(count, 20_000);
        });
    });
}

criterion_group!(benches, bench_ik, bench_arm_update, bench_jcode_parser);
criterion_main!(benches);
