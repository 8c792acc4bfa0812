//! Sensor module - Raw sampling and decimation to the working resolution

pub mod simulated;

pub use simulated::{ConstantSensor, SimulatedServo};

use crate::error::HardwareError;

/// Raw samples are 16-bit; the controller works at 10 bits.
pub const DECIMATION_FACTOR: u32 = 64;

// ============================================================================
// SENSOR SOURCE - Analog-to-digital collaborator
// ============================================================================

/// Source of raw samples in `0..=65535`.
pub trait SensorSource {
    fn read(&mut self) -> Result<u16, HardwareError>;
}

impl<S: SensorSource + ?Sized> SensorSource for Box<S> {
    fn read(&mut self) -> Result<u16, HardwareError> {
        (**self).read()
    }
}

/// `ceil(raw / 64)`. Exact multiples of 64 share a bucket with the value
/// just below them: 64 -> 1, 65 -> 2, 65535 -> 1024.
pub fn decimate(raw: u16) -> u16 {
    ((raw as u32 + DECIMATION_FACTOR - 1) / DECIMATION_FACTOR) as u16
}

// ============================================================================
// SENSOR SAMPLER
// ============================================================================

pub struct SensorSampler<S> {
    source: S,
    last: Option<u16>,
}

impl<S: SensorSource> SensorSampler<S> {
    pub fn new(source: S) -> Self {
        Self { source, last: None }
    }

    /// Read one raw sample and decimate it.
    pub fn sample(&mut self) -> Result<u16, HardwareError> {
        let raw = self.source.read()?;
        let value = decimate(raw);
        self.last = Some(value);
        Ok(value)
    }

    /// Most recent decimated value, if any sample has been taken.
    pub fn last(&self) -> Option<u16> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimation_uses_ceiling() {
        assert_eq!(decimate(0), 0);
        assert_eq!(decimate(1), 1);
        assert_eq!(decimate(64), 1);
        assert_eq!(decimate(65), 2);
        assert_eq!(decimate(12800), 200);
        assert_eq!(decimate(65535), 1024);
    }

    #[test]
    fn every_multiple_of_64_shares_bucket_with_predecessor() {
        for k in 1..1024u32 {
            let boundary = (k * 64) as u16;
            assert_eq!(decimate(boundary), k as u16);
            assert_eq!(decimate(boundary - 1), k as u16);
            assert_eq!(decimate(boundary + 1), k as u16 + 1);
        }
    }

    #[test]
    fn sampler_remembers_last_value() {
        let mut sampler = SensorSampler::new(ConstantSensor::new(130));
        assert_eq!(sampler.last(), None);
        assert_eq!(sampler.sample(), Ok(3));
        assert_eq!(sampler.last(), Some(3));
    }

    #[test]
    fn sampler_propagates_read_failures() {
        struct Offline;
        impl SensorSource for Offline {
            fn read(&mut self) -> Result<u16, HardwareError> {
                Err(HardwareError::Read("adc offline".into()))
            }
        }

        let mut sampler = SensorSampler::new(Offline);
        assert!(sampler.sample().is_err());
        assert_eq!(sampler.last(), None);
    }
}
