//! Single-axis closed-loop servo control.
//!
//! A PID controller fed by a decimated analog sensor drives one
//! bidirectional actuator. Telemetry and set-point generation run at their
//! own periods through a cooperative scheduler on the loop's thread.

pub mod actuator;
pub mod clock;
pub mod config;
pub mod control_loop;
pub mod error;
pub mod metrics;
pub mod scheduler;
pub mod sensor;
pub mod target;
pub mod telemetry;
pub mod visualization;

pub use actuator::{ActuatorSink, OutputMapper, PIDController, RecordingActuator, PID_RANGE};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{load_config, ControllerConfig, TargetConfig, TargetMode};
pub use control_loop::{ControlLoop, LoopSummary, TickReport};
pub use error::{ConfigError, ControlError, HardwareError};
pub use scheduler::RateScheduler;
pub use sensor::{decimate, ConstantSensor, SensorSampler, SensorSource, SimulatedServo};
pub use target::{TargetGenerator, TargetUpdate};
pub use telemetry::{TelemetryLog, TelemetrySample, TelemetrySink, TracingTelemetry};
