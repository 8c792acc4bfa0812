//! Configuration loading and validation

use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{info, warn};

use crate::actuator::{OutputMapper, PIDController, PID_RANGE};
use crate::error::ConfigError;
use crate::target::TargetGenerator;

pub const DEFAULT_CONFIG_PATH: &str = "config/controller.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMode {
    RandomHold,
    Sinusoid,
    SteppedCycle,
}

impl std::fmt::Display for TargetMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetMode::RandomHold => write!(f, "RandomHold"),
            TargetMode::Sinusoid => write!(f, "Sinusoid"),
            TargetMode::SteppedCycle => write!(f, "SteppedCycle"),
        }
    }
}

// ============================================================================
// TARGET CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub mode: TargetMode,

    // RandomHold: pause after each new target, then converge
    pub hold_duration: f64,
    pub convergence_window: f64,
    pub random_min: i64,
    pub random_max: i64,
    pub seed: Option<u64>,

    // Sinusoid
    pub value_min: f64,
    pub value_max: f64,
    pub cycles: f64,

    // SteppedCycle
    pub step_values: Vec<f64>,
    pub step_period: f64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            mode: TargetMode::Sinusoid,
            hold_duration: 5.0,
            convergence_window: 5.0,
            random_min: 200,
            random_max: 823,
            seed: None,
            value_min: 100.0,
            value_max: 923.0,
            cycles: 1.0,
            step_values: vec![100.0, 500.0, 900.0, 500.0],
            step_period: 1.0,
        }
    }
}

// ============================================================================
// SIMULATION CONFIGURATION - Host binary only
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    pub initial_position: f64,
    pub run_seconds: f64,
    pub chart_path: Option<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            initial_position: 512.0,
            run_seconds: 10.0,
            chart_path: None,
        }
    }
}

// ============================================================================
// CONTROLLER CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Optional clamp on the accumulated integral. Off unless set.
    pub integral_limit: Option<f64>,
    pub set_point_initial: f64,

    pub pid_range: f64,
    pub output_range: (f64, f64),
    pub invert: bool,
    pub deadband: f64,

    pub telemetry_period: f64,
    pub target_regen_period: f64,
    /// Wait between ticks; 0 busy-polls.
    pub tick_delay: f64,

    pub target: TargetConfig,
    pub simulation: SimulationConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            kp: 21.0,
            ki: 1.6,
            kd: 0.195,
            integral_limit: None,
            set_point_initial: 200.0,
            pid_range: PID_RANGE,
            output_range: (-1.0, 1.0),
            invert: true,
            deadband: 0.0,
            telemetry_period: 0.01,
            target_regen_period: 0.005,
            tick_delay: 0.001,
            target: TargetConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Threshold controller expressed as a degenerate PID: any non-zero
    /// error saturates to a fixed ±0.6 throttle, zero error idles.
    pub fn bang_bang() -> Self {
        Self {
            kp: PID_RANGE,
            ki: 0.0,
            kd: 0.0,
            output_range: (-0.6, 0.6),
            deadband: 0.5,
            target: TargetConfig {
                mode: TargetMode::RandomHold,
                ..TargetConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("kp", self.kp),
            ("ki", self.ki),
            ("kd", self.kd),
            ("set_point_initial", self.set_point_initial),
        ] {
            require_finite(name, value)?;
        }

        require_positive("pid_range", self.pid_range)?;
        require_positive("telemetry_period", self.telemetry_period)?;
        require_positive("target_regen_period", self.target_regen_period)?;
        if let Some(limit) = self.integral_limit {
            require_positive("integral_limit", limit)?;
        }

        require_finite("tick_delay", self.tick_delay)?;
        if self.tick_delay < 0.0 {
            return Err(ConfigError::Negative { name: "tick_delay", value: self.tick_delay });
        }
        require_finite("deadband", self.deadband)?;
        if self.deadband < 0.0 {
            return Err(ConfigError::Negative { name: "deadband", value: self.deadband });
        }

        let (out_min, out_max) = self.output_range;
        require_finite("output_range", out_min)?;
        require_finite("output_range", out_max)?;
        if out_min > out_max {
            return Err(ConfigError::InvertedRange { name: "output_range", min: out_min, max: out_max });
        }

        require_positive("hold_duration", self.target.hold_duration)?;
        require_positive("convergence_window", self.target.convergence_window)?;
        TargetGenerator::from_config(&self.target, 0.0)?;

        Ok(())
    }

    pub fn build_pid(&self, started_at: f64) -> PIDController {
        let pid = PIDController::new(self.kp, self.ki, self.kd, started_at);
        match self.integral_limit {
            Some(limit) => pid.with_integral_limit(limit),
            None => pid,
        }
    }

    pub fn mapper(&self) -> OutputMapper {
        OutputMapper {
            input_range: (-self.pid_range, self.pid_range),
            output_range: self.output_range,
            invert: self.invert,
            deadband: self.deadband,
        }
    }
}

fn require_finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite { name, value });
    }
    Ok(())
}

fn require_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    require_finite(name, value)?;
    if value <= 0.0 {
        return Err(ConfigError::NonPositive { name, value });
    }
    Ok(())
}

pub fn parse_config(text: &str, origin: &str) -> Result<ControllerConfig, ConfigError> {
    let config: ControllerConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: origin.to_string(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Load and validate a TOML config. A missing file yields the defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<ControllerConfig, ConfigError> {
    let path = path.as_ref();
    let shown = path.display().to_string();

    match std::fs::read_to_string(path) {
        Ok(text) => {
            let config = parse_config(&text, &shown)?;
            info!(path = %shown, mode = %config.target.mode, "loaded controller config");
            Ok(config)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %shown, "config file not found, using defaults");
            let config = ControllerConfig::default();
            config.validate()?;
            Ok(config)
        }
        Err(source) => Err(ConfigError::Io { path: shown, source }),
    }
}
