// src/sim/harness.rs - Deterministic replay of a jcode file
//! Headless replay harness: runs a jcode file on a virtual clock at a fixed
//! tick and writes one JSON object per tick.

use clap::Parser;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use plotter_sim::comms::Telemetry;
use plotter_sim::instruction::JCodeParser;
use plotter_sim::scheduler::ManualTime;
use plotter_sim::{Plotter, RobotLibrary, TickReport, Waypoint};

/// Simulation Harness CLI
#[derive(Parser, Debug)]
#[command(name = "sim-harness", about = "Replay a jcode file deterministically and record every tick.")]
pub struct Cli {
    /// jcode file to replay
    #[arg(short, long)]
    input: PathBuf,

    /// Output file for JSON lines (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Robot to build from the library
    #[arg(long, default_value = "two-link-arm")]
    robot: String,

    /// Robot library file (built-in defaults when omitted)
    #[arg(long)]
    robot_lib: Option<PathBuf>,

    /// Workspace size in units; the robot starts at (0, dim/2)
    #[arg(long, default_value_t = 16.0)]
    dim: f64,

    /// Ticks per simulated second
    #[arg(long, default_value_t = 60.0)]
    tick_hz: f64,

    /// Extra ticks after the last instruction
    #[arg(long, default_value_t = 0)]
    settle_ticks: u64,

    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    if !(cli.tick_hz.is_finite() && cli.tick_hz > 0.0) {
        return Err(format!("--tick-hz must be > 0, got {}", cli.tick_hz).into());
    }

    let src = std::fs::read_to_string(&cli.input).inspect_err(|e| {
        tracing::error!("Failed to read {}: {}", cli.input.display(), e);
    })?;
    let instructions = JCodeParser::new(&src).parse_all()?;
    tracing::info!("Loaded {} instructions from {}", instructions.len(), cli.input.display());

    let library = match &cli.robot_lib {
        Some(path) => RobotLibrary::load(path)?,
        None => RobotLibrary::default(),
    };
    let start = Waypoint::new(0.0, cli.dim / 2.0);
    let controller = library.build(&cli.robot, start)?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    for ins in &instructions {
        tx.send(*ins)?;
    }
    drop(tx);

    let clock = Arc::new(ManualTime::new());
    let interval = Duration::from_secs_f64(1.0 / cli.tick_hz);
    let mut plotter = Plotter::new(start, controller, clock, interval);
    let mut telemetry: Vec<Telemetry> = Vec::new();
    let mut reports: Vec<TickReport> = Vec::new();

    let outcome = plotter.run(&mut rx, &mut telemetry, |r| reports.push(r.clone()));
    if outcome.is_ok() && cli.settle_ticks > 0 {
        plotter.settle(cli.settle_ticks, &mut telemetry, |r| reports.push(r.clone()))?;
    }

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    for report in &reports {
        serde_json::to_writer(&mut out, report)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    let consumed = telemetry.iter().filter(|t| **t == Telemetry::Consumed).count();
    tracing::info!(
        "{} ticks, {} of {} instructions acknowledged",
        plotter.ticks(),
        consumed,
        instructions.len()
    );

    if let Err(e) = outcome {
        tracing::error!("Replay stopped: {}", e);
        return Err(e.into());
    }
    Ok(())
}
