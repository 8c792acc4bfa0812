//! Simulated plant - servo model and fixed-reading sensor

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

use super::{SensorSource, DECIMATION_FACTOR};
use crate::actuator::ActuatorSink;
use crate::error::HardwareError;

const POSITION_MAX: f64 = 1023.0;

struct PlantState {
    rng: StdRng,
    position: f64,
    throttle: f64,
    reads: u64,
}

/// Simulated servo: a motor whose feedback potentiometer moves with the
/// applied throttle. Positive throttle drives the reading down, matching
/// the inverted wiring of the default output mapping.
///
/// Clones share the same plant, so one handle can be given to the sampler
/// and another to the loop as its actuator.
#[derive(Clone)]
pub struct SimulatedServo {
    state: Arc<Mutex<PlantState>>,
    /// Counts moved per read at full throttle.
    pub slew_per_read: f64,
    /// Peak noise added to each reading, in counts.
    pub noise_amplitude: f64,
}

impl SimulatedServo {
    pub fn new(seed: u64, initial_position: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(PlantState {
                rng: StdRng::seed_from_u64(seed),
                position: initial_position.clamp(0.0, POSITION_MAX),
                throttle: 0.0,
                reads: 0,
            })),
            slew_per_read: 4.0,
            noise_amplitude: 0.5,
        }
    }

    pub fn position(&self) -> f64 {
        self.state.lock().position
    }

    pub fn throttle(&self) -> f64 {
        self.state.lock().throttle
    }

    pub fn reads(&self) -> u64 {
        self.state.lock().reads
    }

    pub fn inject_disturbance(&self, counts: f64) {
        let mut state = self.state.lock();
        state.position = (state.position + counts).clamp(0.0, POSITION_MAX);
    }
}

impl SensorSource for SimulatedServo {
    fn read(&mut self) -> Result<u16, HardwareError> {
        let mut state = self.state.lock();
        state.reads += 1;
        state.position = (state.position - state.throttle * self.slew_per_read).clamp(0.0, POSITION_MAX);

        let noise = if self.noise_amplitude > 0.0 {
            state.rng.gen_range(-self.noise_amplitude..self.noise_amplitude)
        } else {
            0.0
        };
        let raw = ((state.position + noise) * DECIMATION_FACTOR as f64).clamp(0.0, u16::MAX as f64);
        Ok(raw as u16)
    }
}

impl ActuatorSink for SimulatedServo {
    fn write(&mut self, throttle: f64) -> Result<(), HardwareError> {
        if !throttle.is_finite() {
            return Err(HardwareError::Write(format!("non-finite throttle {throttle}")));
        }
        self.state.lock().throttle = throttle.clamp(-1.0, 1.0);
        Ok(())
    }
}

/// Sensor that always returns the same raw sample.
#[derive(Debug, Clone, Copy)]
pub struct ConstantSensor {
    raw: u16,
}

impl ConstantSensor {
    pub fn new(raw: u16) -> Self {
        Self { raw }
    }
}

impl SensorSource for ConstantSensor {
    fn read(&mut self) -> Result<u16, HardwareError> {
        Ok(self.raw)
    }
}
