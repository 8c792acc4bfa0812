//! Actuator module - PID control, output mapping and the drive sink

pub mod controller;
pub mod mapper;

pub use controller::PIDController;
pub use mapper::{map, OutputMapper, PID_RANGE};

use crate::error::HardwareError;
use parking_lot::Mutex;
use std::sync::Arc;

// ============================================================================
// ACTUATOR SINK - Motor driver collaborator
// ============================================================================

/// Accepts a throttle in `[-1, 1]`. Must accept `0` at all times.
pub trait ActuatorSink {
    fn write(&mut self, throttle: f64) -> Result<(), HardwareError>;
}

impl<A: ActuatorSink + ?Sized> ActuatorSink for Box<A> {
    fn write(&mut self, throttle: f64) -> Result<(), HardwareError> {
        (**self).write(throttle)
    }
}

// ============================================================================
// RECORDING ACTUATOR - Keeps every command for dry runs and inspection
// ============================================================================

/// Sink that records commands. Clones share the same history.
#[derive(Clone, Default)]
pub struct RecordingActuator {
    commands: Arc<Mutex<Vec<f64>>>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<f64> {
        self.commands.lock().clone()
    }

    pub fn last(&self) -> Option<f64> {
        self.commands.lock().last().copied()
    }
}

impl ActuatorSink for RecordingActuator {
    fn write(&mut self, throttle: f64) -> Result<(), HardwareError> {
        self.commands.lock().push(throttle);
        Ok(())
    }
}
