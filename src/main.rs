// src/main.rs - Real-time plotter: jcode on stdin, telemetry on stdout
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use plotter_sim::comms::{read_instructions, write_telemetry};
use plotter_sim::scheduler::StdTimeSync;
use plotter_sim::{Instruction, Plotter, RobotLibrary, Telemetry, Waypoint};

#[derive(Parser, Debug)]
#[command(name = "plotter-sim", version, about = "Simulated pen plotter driven by jcode on stdin.")]
struct Args {
    /// Workspace size in units; the robot starts at (0, dim/2)
    #[arg(long, default_value_t = 16.0)]
    dim: f64,

    /// Robot to build from the library
    #[arg(long, default_value = "two-link-arm")]
    robot: String,

    /// Robot library file, created with defaults when missing
    #[arg(long, default_value = "robots.json")]
    robot_lib: PathBuf,

    /// Instruction queue capacity
    #[arg(long, default_value_t = 10)]
    queue: usize,

    /// Control loop rate
    #[arg(long, default_value_t = 60.0)]
    tick_hz: f64,

    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let args = Args::parse();

    // stdout carries telemetry
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting plotter-sim {}", env!("CARGO_PKG_VERSION"));

    if args.queue == 0 {
        return Err("queue capacity must be at least 1".into());
    }
    if !(args.tick_hz.is_finite() && args.tick_hz > 0.0) {
        return Err(format!("tick rate must be positive, got {}", args.tick_hz).into());
    }

    let library = RobotLibrary::load_or_create(&args.robot_lib).map_err(|e| {
        tracing::error!("Failed to load robot library '{}': {}", args.robot_lib.display(), e);
        e
    })?;
    let start = Waypoint::new(0.0, args.dim / 2.0);
    let controller = library.build(&args.robot, start).map_err(|e| {
        tracing::error!("Available robots: {}", library.names().collect::<Vec<_>>().join(", "));
        e
    })?;

    let (instruction_tx, mut instruction_rx) = mpsc::channel::<Instruction>(args.queue);
    let (telemetry_tx, telemetry_rx) = mpsc::channel::<Telemetry>(args.queue);

    let reader = tokio::spawn(read_instructions(tokio::io::stdin(), instruction_tx));
    let writer = tokio::spawn(write_telemetry(tokio::io::stdout(), telemetry_rx));

    let tick_interval = Duration::from_secs_f64(1.0 / args.tick_hz);
    // Acks use blocking sends, so the loop gets its own thread.
    let control = tokio::task::spawn_blocking(move || {
        let mut telemetry_tx = telemetry_tx;
        let mut plotter = Plotter::new(start, controller, Arc::new(StdTimeSync), tick_interval);
        plotter.run(&mut instruction_rx, &mut telemetry_tx, |_| {})
    });

    let result = control.await?;
    // The loop owned the last telemetry sender, so the writer drains and stops.
    if let Err(e) = writer.await? {
        tracing::error!("Telemetry writer failed: {}", e);
    }

    match result {
        Ok(()) => {
            if let Err(e) = reader.await? {
                tracing::error!("Instruction reader failed: {}", e);
            }
            tracing::info!("Plotter stopped");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Control loop aborted: {}", e);
            // A pending stdin read cannot be cancelled; exit instead of waiting on it.
            std::process::exit(1);
        }
    }
}
