use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use servo_pid_loop::config::{load_config, DEFAULT_CONFIG_PATH};
use servo_pid_loop::telemetry::{TelemetryLog, TracingTelemetry};
use servo_pid_loop::visualization::render_tracking_chart;
use servo_pid_loop::{ControlLoop, MonotonicClock, SimulatedServo};

/// Environment variable names
mod env_vars {
    pub const CONFIG: &str = "SERVO_CONFIG";
    pub const LOG_LEVEL: &str = "SERVO_LOG_LEVEL";
}

const TELEMETRY_CAPACITY: usize = 100_000;

fn init_logging() {
    let level = env::var(env_vars::LOG_LEVEL).unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("servo_pid_loop={level},telemetry={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let config_path = env::args()
        .nth(1)
        .or_else(|| env::var(env_vars::CONFIG).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&config_path).with_context(|| format!("loading {config_path}"))?;

    let sim = &config.simulation;
    info!(
        kp = config.kp,
        ki = config.ki,
        kd = config.kd,
        mode = %config.target.mode,
        run_seconds = sim.run_seconds,
        "starting simulated servo"
    );

    let servo = SimulatedServo::new(sim.seed, sim.initial_position);
    let trace = TelemetryLog::new(TELEMETRY_CAPACITY);
    let mut control = ControlLoop::new(
        &config,
        servo.clone(),
        servo.clone(),
        MonotonicClock::new(),
        Box::new((TracingTelemetry, trace.clone())),
    )?;

    // Stop after the configured run time, or never when it is not positive
    let shutdown = Arc::new(AtomicBool::new(false));
    if sim.run_seconds > 0.0 {
        let flag = shutdown.clone();
        let run_for = Duration::from_secs_f64(sim.run_seconds);
        std::thread::spawn(move || {
            std::thread::sleep(run_for);
            flag.store(true, Ordering::Relaxed);
        });
    }

    let summary = control.run(&shutdown)?;

    println!("===========================================");
    println!("SERVO LOOP RESULTS");
    println!("===========================================");
    println!("Ticks: {}", summary.ticks);
    println!("Telemetry samples: {}", summary.telemetry_emitted);
    println!("Retargets: {}", summary.retargets);
    println!("Final set-point: {:.1}, position: {:.1}", summary.final_set_point, servo.position());
    println!("Tick P50: {:?}, P99: {:?}, max: {:?}", summary.metrics.tick_p50, summary.metrics.tick_p99, summary.metrics.tick_max);
    println!("Jitter P50: {:?}, P99: {:?}", summary.metrics.jitter_p50, summary.metrics.jitter_p99);

    if let Some(path) = &sim.chart_path {
        match render_tracking_chart(&trace.read_all(), path) {
            Ok(()) => info!(path = %path, "tracking chart written"),
            Err(e) => warn!(path = %path, error = %e, "failed to render tracking chart"),
        }
    }

    Ok(())
}
